//! Per-group rate model.
//!
//! Every group carries four competing exponential clocks: departure of a non-programmer,
//! departure of a programmer, an attempt to convert a non-programmer, and the arrival of a new
//! non-programmer. The rates depend on the occupancy of the group and, for density dependent
//! growth, on the global population.

use rand::prelude::*;
use rand_distr::{Exp, weighted::WeightedIndex};

use super::population::{GroupCounts, GroupId};
use super::scheduler::{EventKind, PendingEvent};
use crate::config::{ConversionRule, GrowthMode, SimulationParameters};
use crate::errors::{Result, SimulationError};

/// Steepness `a` of the conversion cost in the programmer to non-programmer ratio.
pub const COST_SHAPE: f64 = 3.;

/// Cost of a conversion in a group with `n` non-programmers and `p` programmers.
///
/// Decays exponentially with the ratio `p / n`. Without non-programmers the ratio is unbounded
/// and the cost vanishes, except for the empty group, which pays the full cost `b`.
pub fn cost(n: usize, p: usize, a: f64, b: f64) -> f64 {
    match (n, p) {
        (0, 0) => b,
        (0, _) => 0.,
        _ => b * (-a * p as f64 / n as f64).exp(),
    }
}

/// Net benefit of a conversion attempt.
pub fn tau(n: usize, p: usize, alpha: f64, beta: f64, b: f64) -> f64 {
    let c = cost(n, p, COST_SHAPE, b);
    let (n, p) = (n as f64, p as f64);
    let half_n = n.powf(alpha) / 2.;
    -((n + 1.).powf(alpha) / 2.) * (p + 1.).powf(beta) / 2.
        + (1. - c) * half_n * (p + 2.).powf(beta) / 2.
        + c * half_n * (p + 1.).powf(beta) / 2.
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rates {
    pub non_programmer_departure: f64,
    pub programmer_departure: f64,
    pub conversion_attempt: f64,
    pub arrival: f64,
}

impl Rates {
    pub fn total(&self) -> f64 {
        self.non_programmer_departure
            + self.programmer_departure
            + self.conversion_attempt
            + self.arrival
    }

    fn weights(&self) -> [f64; 4] {
        [
            self.non_programmer_departure,
            self.programmer_departure,
            self.conversion_attempt,
            self.arrival,
        ]
    }
}

/// Global totals that enter the density dependent arrival rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PopulationTotals {
    pub nodes: usize,
    pub groups: usize,
}

pub struct RateModel<'a> {
    parameters: &'a SimulationParameters,
}

impl<'a> RateModel<'a> {
    pub fn new(parameters: &'a SimulationParameters) -> Self {
        Self { parameters }
    }

    pub fn cost(&self, counts: GroupCounts) -> f64 {
        cost(counts.n, counts.p, COST_SHAPE, self.parameters.b)
    }

    pub fn rates(&self, counts: GroupCounts, totals: PopulationTotals) -> Rates {
        let parameters = self.parameters;
        let arrival = match parameters.growth_mode {
            GrowthMode::Constant => parameters.mu,
            GrowthMode::DensityDependent => {
                let size = (counts.size() + 1) as f64;
                let dilution = (totals.nodes + totals.groups) as f64;
                f64::max(
                    0.,
                    parameters.mu * size * (1. - size / parameters.carrying_capacity) / dilution,
                )
            }
        };
        let conversion_attempt = if counts.n > 0 {
            f64::max(
                0.,
                tau(
                    counts.n,
                    counts.p,
                    parameters.alpha,
                    parameters.beta,
                    parameters.b,
                ),
            )
        } else {
            0.
        };

        Rates {
            non_programmer_departure: parameters.nu_n * counts.n as f64,
            programmer_departure: parameters.nu_p * counts.p as f64,
            conversion_attempt,
            arrival,
        }
    }

    /// Draw the next event of `group`, scheduled after `now`.
    ///
    /// The holding time is exponential in the total rate and the kind is chosen proportionally to
    /// the individual rates. A conversion attempt is resolved into its outcome right away.
    pub fn draw_event<R: Rng + ?Sized>(
        &self,
        group: GroupId,
        counts: GroupCounts,
        totals: PopulationTotals,
        now: f64,
        rng: &mut R,
    ) -> Result<PendingEvent> {
        let rates = self.rates(counts, totals);
        let total_rate = rates.total();
        let degenerate = || SimulationError::DegenerateRate {
            group,
            p: counts.p,
            n: counts.n,
            total_rate,
        };
        if !total_rate.is_finite() || total_rate <= 0. {
            return Err(degenerate());
        }

        let holding_time = Exp::new(total_rate).map_err(|_| degenerate())?.sample(rng);
        let kind = match WeightedIndex::new(rates.weights())
            .map_err(|_| degenerate())?
            .sample(rng)
        {
            0 => EventKind::NonProgrammerDeparts,
            1 => EventKind::ProgrammerDeparts,
            2 => self.resolve_conversion(&rates, total_rate, counts, rng),
            _ => EventKind::NonProgrammerArrives,
        };

        Ok(PendingEvent::new(now + holding_time, group, kind, counts))
    }

    fn resolve_conversion<R: Rng + ?Sized>(
        &self,
        rates: &Rates,
        total_rate: f64,
        counts: GroupCounts,
        rng: &mut R,
    ) -> EventKind {
        let success = 1. - self.cost(counts);
        let converts = match self.parameters.conversion_rule {
            ConversionRule::RateRatio => rates.conversion_attempt / total_rate < success,
            ConversionRule::CostWeighted => rng.random::<f64>() < success,
        };
        if converts {
            EventKind::NewProgrammer
        } else {
            EventKind::NonProgrammerLeaves
        }
    }
}
