//! Joint occupancy histogram `Ig[p][n]`: the number of groups with `p` programmers and `n`
//! non-programmers.
//!
//! Groups are conserved, so the histogram total never changes; events only move one group from
//! one cell to another. The grid grows when a group reaches an occupancy outside of it.

use ndarray::{Array2, s};

use super::population::{GroupCounts, PopulationStore};
use crate::errors::{Result, SimulationError};
use crate::stats::normalize;

#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    counts: Array2<u64>,
}

impl Histogram {
    /// Construct an empty histogram covering occupancies up to `max_size` of each type.
    pub fn new(max_size: usize) -> Self {
        Self {
            counts: Array2::zeros((max_size + 1, max_size + 1)),
        }
    }

    /// Tally the groups of a store.
    pub fn from_store(store: &PopulationStore, max_size: usize) -> Self {
        let mut histogram = Self::new(max_size);
        for group in store.groups() {
            histogram.increment(group.counts());
        }
        histogram
    }

    /// Number of groups in state `(p, n)`; zero outside of the grid.
    pub fn count(&self, p: usize, n: usize) -> u64 {
        self.counts.get((p, n)).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.sum()
    }

    /// Grid dimensions `(programmers + 1, non-programmers + 1)`.
    pub fn dims(&self) -> (usize, usize) {
        self.counts.dim()
    }

    pub fn counts(&self) -> &Array2<u64> {
        &self.counts
    }

    /// Iterate over occupied cells as `(counts, number of groups)`.
    pub fn occupied(&self) -> impl Iterator<Item = (GroupCounts, u64)> + '_ {
        self.counts
            .indexed_iter()
            .filter(|(_, count)| **count > 0)
            .map(|((p, n), count)| (GroupCounts::new(p, n), *count))
    }

    /// Move one group from cell `from` to cell `to`.
    ///
    /// Fails without touching the histogram if no group is in `from`.
    pub fn transfer(&mut self, from: GroupCounts, to: GroupCounts) -> Result<()> {
        self.decrement(from)?;
        self.increment(to);
        Ok(())
    }

    /// Check that the histogram accounts for exactly `total_groups` groups.
    pub fn assert_conserved(&self, total_groups: usize) -> Result<()> {
        let total = self.total();
        if total != total_groups as u64 {
            return Err(SimulationError::HistogramMismatch {
                invariant: format!("histogram sums to {total} instead of {total_groups} groups"),
            });
        }
        Ok(())
    }

    /// Distribution of groups over `(p, n)`.
    pub fn normalized(&self) -> Array2<f64> {
        normalize(&self.counts.mapv(|count| count as f64))
    }

    fn increment(&mut self, cell: GroupCounts) {
        self.grow_to(cell);
        self.counts[(cell.p, cell.n)] += 1;
    }

    fn decrement(&mut self, cell: GroupCounts) -> Result<()> {
        match self.counts.get_mut((cell.p, cell.n)) {
            Some(count) if *count > 0 => {
                *count -= 1;
                Ok(())
            }
            _ => Err(SimulationError::HistogramMismatch {
                invariant: format!(
                    "histogram cell ({}, {}) would become negative",
                    cell.p, cell.n
                ),
            }),
        }
    }

    fn grow_to(&mut self, cell: GroupCounts) {
        let (rows, cols) = self.counts.dim();
        if cell.p < rows && cell.n < cols {
            return;
        }
        let new_rows = if cell.p < rows {
            rows
        } else {
            (cell.p + 1).max(2 * rows)
        };
        let new_cols = if cell.n < cols {
            cols
        } else {
            (cell.n + 1).max(2 * cols)
        };
        let mut grown = Array2::zeros((new_rows, new_cols));
        grown.slice_mut(s![..rows, ..cols]).assign(&self.counts);
        log::debug!("Growing histogram from {rows}x{cols} to {new_rows}x{new_cols}.");
        self.counts = grown;
    }
}
