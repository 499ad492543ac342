use crate::errors::{Result, SimulationError};
use crate::sweep::RunSummary;

/// Write one CSV row per sweep job.
pub fn write_summaries<W: std::io::Write>(summaries: &[RunSummary], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for summary in summaries {
        writer.serialize(summary).map_err(SimulationError::write)?;
    }
    writer.flush().map_err(SimulationError::write)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_csv() {
        let summaries = vec![
            RunSummary {
                id: 1,
                alpha: 0.1,
                beta: 0.5,
                final_fraction_programmers: 0.25,
                mean_group_fraction_programmers: 0.2,
                final_cumulative_departure_cost: 12,
            },
            RunSummary {
                id: 2,
                alpha: 0.1,
                beta: 1.,
                final_fraction_programmers: 0.5,
                mean_group_fraction_programmers: 0.4,
                final_cumulative_departure_cost: 3,
            },
        ];
        let mut buffer = Vec::new();
        write_summaries(&summaries, &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines[0],
            "id,alpha,beta,final_fraction_programmers,mean_group_fraction_programmers,final_cumulative_departure_cost"
        );
        assert_eq!(lines[1], "1,0.1,0.5,0.25,0.2,12");
        assert_eq!(lines[2], "2,0.1,1.0,0.5,0.4,3");
    }
}
