//! Batch runs over a grid of conversion exponents.
//!
//! Every job is an independent simulation with its own seed, so jobs can be distributed over
//! threads with the `parallel` feature. Only a summary of the final state is kept per job.

use itertools::Itertools;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SimulationParameters;
use crate::core::Simulation;
use crate::errors::Result;
use crate::stats::HistogramAggregates;

/// Values of `alpha` and `beta` to combine into jobs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    pub alpha: Vec<f64>,
    pub beta: Vec<f64>,
}

impl ParameterGrid {
    /// Expand a base parameter set into one job per `(alpha, beta)` pair, numbered from 1.
    pub fn jobs(&self, base: &SimulationParameters) -> Vec<SweepJob> {
        self.alpha
            .iter()
            .cartesian_product(self.beta.iter())
            .enumerate()
            .map(|(index, (&alpha, &beta))| SweepJob {
                id: index as u64 + 1,
                parameters: SimulationParameters {
                    alpha,
                    beta,
                    ..base.clone()
                },
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.alpha.len() * self.beta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepJob {
    pub id: u64,
    pub parameters: SimulationParameters,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub id: u64,
    pub alpha: f64,
    pub beta: f64,
    /// Share of programmers among all nodes at `t_max`.
    pub final_fraction_programmers: f64,
    /// Average programmer share of the non-empty groups, weighted over all groups.
    pub mean_group_fraction_programmers: f64,
    /// Non-programmers that left after a failed conversion attempt.
    pub final_cumulative_departure_cost: u64,
}

/// Run a single job to `t_max` with the seed `seed + id`.
pub fn run_one(job: &SweepJob, seed: u64) -> Result<RunSummary> {
    log::debug!("Starting job {} with parameters\n{}", job.id, job.parameters);
    let mut simulation = Simulation::new(job.parameters.clone(), seed.wrapping_add(job.id))?;
    for snapshot in simulation.snapshot_stream() {
        snapshot?;
    }
    log::info!(
        "Finished job {} (alpha={}, beta={}) after {} events.",
        job.id,
        job.parameters.alpha,
        job.parameters.beta,
        simulation.n_events()
    );
    Ok(RunSummary {
        id: job.id,
        alpha: job.parameters.alpha,
        beta: job.parameters.beta,
        final_fraction_programmers: simulation.fraction_programmers(),
        mean_group_fraction_programmers: simulation.histogram().mean_programmer_fraction(),
        final_cumulative_departure_cost: simulation.cost_departures(),
    })
}

/// Run all jobs. Summaries are returned in the order of `jobs`.
pub fn run_sweep(jobs: &[SweepJob], seed: u64) -> Result<Vec<RunSummary>> {
    run_sweep_with_progress(jobs, seed, || {})
}

/// Run all jobs, calling `progress` whenever one of them finishes.
#[cfg(feature = "parallel")]
pub fn run_sweep_with_progress<F>(
    jobs: &[SweepJob],
    seed: u64,
    progress: F,
) -> Result<Vec<RunSummary>>
where
    F: Fn() + Sync,
{
    jobs.par_iter()
        .map(|job| {
            let summary = run_one(job, seed);
            progress();
            summary
        })
        .collect()
}

/// Run all jobs, calling `progress` whenever one of them finishes.
#[cfg(not(feature = "parallel"))]
pub fn run_sweep_with_progress<F>(
    jobs: &[SweepJob],
    seed: u64,
    progress: F,
) -> Result<Vec<RunSummary>>
where
    F: Fn() + Sync,
{
    jobs.iter()
        .map(|job| {
            let summary = run_one(job, seed);
            progress();
            summary
        })
        .collect()
}
