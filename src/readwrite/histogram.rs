use npyz::WriterBuilder;

use crate::core::Histogram;
use crate::errors::{Result, SimulationError};

/// Write the histogram counts as a two dimensional `.npy` array indexed by `[p, n]`.
pub fn write_histogram_npy(histogram: &Histogram, writer: &mut impl std::io::Write) -> Result<()> {
    let (rows, cols) = histogram.dims();
    let shape = &[rows as u64, cols as u64];
    let mut npy_writer = npyz::WriteOptions::new()
        .default_dtype()
        .shape(shape)
        .writer(writer)
        .begin_nd()
        .map_err(SimulationError::write)?;
    npy_writer
        .extend(histogram.counts().iter().copied())
        .map_err(SimulationError::write)?;
    npy_writer.finish().map_err(SimulationError::write)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_npy() {
        let store = population![(0, 1), (2, 1), (0, 1)];
        let histogram = Histogram::from_store(&store, 2);
        let mut buffer = Vec::new();
        write_histogram_npy(&histogram, &mut buffer).unwrap();

        let npy_data = npyz::NpyFile::new(buffer.as_slice()).unwrap();
        assert_eq!(npy_data.shape(), &[3, 3]);
        let data: Vec<u64> = npy_data
            .data::<u64>()
            .unwrap()
            .map(|el| el.unwrap())
            .collect();
        assert_eq!(data, vec![0, 2, 0, 0, 0, 0, 0, 1, 0]);
    }
}
