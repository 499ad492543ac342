//! Writers for snapshots, run summaries and histograms.

mod histogram;
mod snapshot_writer;
mod summary;

pub use histogram::write_histogram_npy;
pub use snapshot_writer::{CsvSnapshotWriter, SnapshotWriter};
pub use summary::write_summaries;
