use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

use crate::core::Snapshot;
use crate::errors::{Result, SimulationError};

pub trait SnapshotWriter {
    fn write(&mut self, snapshot: &Snapshot) -> Result<()>;

    fn finish(&mut self) -> Result<()>;

    fn write_all(&mut self, snapshots: &[Snapshot]) -> Result<()> {
        for snapshot in snapshots {
            self.write(snapshot)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct TrajectoryRecord {
    time: f64,
    fraction_programmers: f64,
    total_population: usize,
}

#[derive(Debug, Serialize)]
struct HistogramRecord {
    time: f64,
    p: usize,
    n: usize,
    count: u64,
}

/// Writes the trajectory of the population and the occupied histogram cells of every snapshot
/// to two CSV tables.
pub struct CsvSnapshotWriter<W: io::Write> {
    trajectory: csv::Writer<W>,
    histograms: csv::Writer<W>,
}

impl CsvSnapshotWriter<fs::File> {
    /// Create `trajectory.csv` and `histograms.csv` in `outdir`.
    pub fn new(outdir: &Path) -> Result<Self> {
        fs::create_dir_all(outdir).map_err(SimulationError::write)?;
        let trajectory = csv::Writer::from_path(outdir.join("trajectory.csv"))
            .map_err(SimulationError::write)?;
        let histograms = csv::Writer::from_path(outdir.join("histograms.csv"))
            .map_err(SimulationError::write)?;
        Ok(Self {
            trajectory,
            histograms,
        })
    }
}

impl<W: io::Write> CsvSnapshotWriter<W> {
    pub fn from_writers(trajectory: W, histograms: W) -> Self {
        Self {
            trajectory: csv::Writer::from_writer(trajectory),
            histograms: csv::Writer::from_writer(histograms),
        }
    }

    pub fn into_inner(self) -> Result<(W, W)> {
        let trajectory = self
            .trajectory
            .into_inner()
            .map_err(SimulationError::write)?;
        let histograms = self
            .histograms
            .into_inner()
            .map_err(SimulationError::write)?;
        Ok((trajectory, histograms))
    }
}

impl<W: io::Write> SnapshotWriter for CsvSnapshotWriter<W> {
    fn write(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.trajectory
            .serialize(TrajectoryRecord {
                time: snapshot.time,
                fraction_programmers: snapshot.fraction_programmers,
                total_population: snapshot.total_population,
            })
            .map_err(SimulationError::write)?;
        for (counts, count) in snapshot.histogram.occupied() {
            self.histograms
                .serialize(HistogramRecord {
                    time: snapshot.time,
                    p: counts.p,
                    n: counts.n,
                    count,
                })
                .map_err(SimulationError::write)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.trajectory.flush().map_err(SimulationError::write)?;
        self.histograms.flush().map_err(SimulationError::write)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Histogram;
    use serial_test::serial;

    fn snapshots() -> Vec<Snapshot> {
        let store = population![(1, 2), (0, 1)];
        let histogram = Histogram::from_store(&store, 2);
        vec![
            Snapshot {
                time: 0.,
                fraction_programmers: 0.25,
                total_population: 4,
                histogram: histogram.clone(),
            },
            Snapshot {
                time: 1.,
                fraction_programmers: 0.25,
                total_population: 4,
                histogram,
            },
        ]
    }

    #[test]
    fn write_tables() {
        let mut writer = CsvSnapshotWriter::from_writers(Vec::new(), Vec::new());
        writer.write_all(&snapshots()).unwrap();
        writer.finish().unwrap();
        let (trajectory, histograms) = writer.into_inner().unwrap();

        let trajectory = String::from_utf8(trajectory).unwrap();
        assert_eq!(
            trajectory.lines().collect::<Vec<_>>(),
            vec![
                "time,fraction_programmers,total_population",
                "0.0,0.25,4",
                "1.0,0.25,4"
            ]
        );

        let histograms = String::from_utf8(histograms).unwrap();
        assert_eq!(
            histograms.lines().collect::<Vec<_>>(),
            vec![
                "time,p,n,count",
                "0.0,0,1,1",
                "0.0,1,2,1",
                "1.0,0,1,1",
                "1.0,1,2,1"
            ]
        );
    }

    #[test]
    #[serial]
    fn write_to_directory() {
        let outdir = std::env::temp_dir().join("groupdyn_snapshot_writer");
        let mut writer = CsvSnapshotWriter::new(&outdir).unwrap();
        writer.write_all(&snapshots()).unwrap();
        writer.finish().unwrap();

        let trajectory = fs::read_to_string(outdir.join("trajectory.csv")).unwrap();
        assert_eq!(trajectory.lines().count(), 3);
        let histograms = fs::read_to_string(outdir.join("histograms.csv")).unwrap();
        assert_eq!(histograms.lines().count(), 5);
        fs::remove_dir_all(outdir).unwrap();
    }
}
