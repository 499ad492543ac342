//! Snapshot cadence.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SimulationError};

/// Snapshots are taken at every multiple of `interval` in simulated time, starting at zero.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SamplingPolicy {
    pub interval: f64,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self { interval: 1. }
    }
}

impl SamplingPolicy {
    pub fn new(interval: f64) -> Result<Self> {
        let policy = Self { interval };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.interval.is_finite() || self.interval <= 0. {
            return Err(SimulationError::invalid(format!(
                "sampling interval must be positive, got {}",
                self.interval
            )));
        }
        Ok(())
    }

    /// Time of the `index`-th sampling boundary.
    pub fn boundary(&self, index: u64) -> f64 {
        index as f64 * self.interval
    }

    /// Number of snapshots a run up to `t_max` produces.
    pub fn n_samples(&self, t_max: f64) -> u64 {
        (t_max / self.interval).floor() as u64 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        let policy = SamplingPolicy::new(0.5).unwrap();
        assert_eq!(policy.boundary(0), 0.);
        assert_eq!(policy.boundary(3), 1.5);
        assert_eq!(policy.n_samples(10.), 21);
        assert_eq!(SamplingPolicy::default().n_samples(500.), 501);
        assert_eq!(SamplingPolicy::default().n_samples(2.5), 3);
    }

    #[test]
    fn reject_non_positive_interval() {
        assert!(SamplingPolicy::new(0.).is_err());
        assert!(SamplingPolicy::new(-1.).is_err());
        assert!(SamplingPolicy::new(f64::INFINITY).is_err());
    }
}
