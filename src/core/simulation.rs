//! Event loop of a single run.
//!
//! The loop pops the earliest pending event, moves the affected group in the store and in the
//! histogram, and draws the next event of that group only. Snapshots are emitted whenever the
//! clock passes a boundary of the sampling policy.

use derive_more::Display;
use rand::prelude::*;
use std::collections::VecDeque;

use super::histogram::Histogram;
use super::historian::Historian;
use super::population::{GroupCounts, GroupId, NodeType, PopulationStore};
use super::rates::{PopulationTotals, RateModel};
use super::scheduler::{EventKind, EventScheduler, PendingEvent};
use crate::config::{SamplingPolicy, SimulationParameters};
use crate::errors::{Result, SimulationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum SimulationState {
    Running,
    Completed,
}

/// State of the population at a sampling boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub time: f64,
    /// Share of programmers among all nodes, zero for an empty population.
    pub fraction_programmers: f64,
    pub total_population: usize,
    pub histogram: Histogram,
}

pub struct Simulation {
    parameters: SimulationParameters,
    sampling: SamplingPolicy,
    rng: StdRng,
    store: PopulationStore,
    histogram: Histogram,
    scheduler: EventScheduler,
    time: f64,
    state: SimulationState,
    next_sample: u64,
    snapshots: VecDeque<Snapshot>,
    cost_departures: u64,
    n_events: u64,
    last_applied: Option<(GroupId, GroupCounts)>,
    historian: Option<Historian>,
}

impl Simulation {
    /// Draw an initial population and schedule the first event of every group.
    pub fn new(parameters: SimulationParameters, seed: u64) -> Result<Self> {
        parameters.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let store = PopulationStore::initialize(&parameters, &mut rng)?;
        Self::assemble(parameters, store, rng)
    }

    /// Start from a given population instead of a random one.
    pub fn with_population(
        parameters: SimulationParameters,
        store: PopulationStore,
        seed: u64,
    ) -> Result<Self> {
        parameters.validate()?;
        if store.total_groups() != parameters.total_groups {
            return Err(SimulationError::invalid(format!(
                "population has {} groups, parameters expect {}",
                store.total_groups(),
                parameters.total_groups
            )));
        }
        Self::assemble(parameters, store, StdRng::seed_from_u64(seed))
    }

    fn assemble(
        parameters: SimulationParameters,
        store: PopulationStore,
        rng: StdRng,
    ) -> Result<Self> {
        let histogram = Histogram::from_store(&store, parameters.max_group_size);
        histogram.assert_conserved(store.total_groups())?;

        let mut simulation = Self {
            scheduler: EventScheduler::new(store.total_groups()),
            sampling: SamplingPolicy::default(),
            rng,
            store,
            histogram,
            time: 0.,
            state: SimulationState::Running,
            next_sample: 1,
            snapshots: VecDeque::new(),
            cost_departures: 0,
            n_events: 0,
            last_applied: None,
            historian: None,
            parameters,
        };

        for group in 0..simulation.store.total_groups() {
            simulation.schedule(group)?;
        }
        simulation.snapshots.push_back(simulation.snapshot(0.));

        log::info!(
            "Initialized {} groups with {} nodes ({} programmers), {} groups scheduled.",
            simulation.store.total_groups(),
            simulation.store.total_nodes(),
            simulation.store.total_programmers(),
            simulation.scheduler.len()
        );
        Ok(simulation)
    }

    /// Replace the sampling policy. Fails once the run has advanced past `t = 0`.
    pub fn with_sampling(mut self, sampling: SamplingPolicy) -> Result<Self> {
        sampling.validate()?;
        if self.n_events > 0 || self.next_sample != 1 || self.state == SimulationState::Completed
        {
            return Err(SimulationError::invalid(format!(
                "sampling policy cannot change after the run started (t={})",
                self.time
            )));
        }
        self.sampling = sampling;
        Ok(self)
    }

    /// Record every fired event.
    pub fn with_history(mut self) -> Self {
        self.historian = Some(Historian::new());
        self
    }

    pub fn parameters(&self) -> &SimulationParameters {
        &self.parameters
    }

    pub fn store(&self) -> &PopulationStore {
        &self.store
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn history(&self) -> Option<&Historian> {
        self.historian.as_ref()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Number of non-programmers that left after a failed conversion attempt.
    pub fn cost_departures(&self) -> u64 {
        self.cost_departures
    }

    pub fn n_events(&self) -> u64 {
        self.n_events
    }

    /// Whether `group` has no pending event because its total rate vanished.
    pub fn is_absorbed(&self, group: GroupId) -> bool {
        group < self.store.total_groups() && !self.scheduler.has_pending(group)
    }

    pub fn fraction_programmers(&self) -> f64 {
        match self.store.total_nodes() {
            0 => 0.,
            total => self.store.total_programmers() as f64 / total as f64,
        }
    }

    /// Apply the earliest pending event, or complete the run if it lies beyond `t_max`.
    pub fn step(&mut self) -> Result<SimulationState> {
        if self.state == SimulationState::Completed {
            return Ok(self.state);
        }

        let event = match self.scheduler.pop_earliest() {
            Some(event) if event.time <= self.parameters.t_max => event,
            Some(_) => {
                self.complete()?;
                return Ok(self.state);
            }
            None => {
                log::debug!("No pending events left at t={}.", self.time);
                self.complete()?;
                return Ok(self.state);
            }
        };

        self.record_snapshots(event.time, false)?;
        self.time = event.time;
        self.apply(&event)?;
        self.schedule(event.group)?;
        Ok(self.state)
    }

    /// Step until the next snapshot is available. Returns `None` once the run is completed and
    /// all snapshots have been handed out.
    pub fn next_snapshot(&mut self) -> Result<Option<Snapshot>> {
        loop {
            if let Some(snapshot) = self.snapshots.pop_front() {
                return Ok(Some(snapshot));
            }
            if self.state == SimulationState::Completed {
                return Ok(None);
            }
            self.step()?;
        }
    }

    /// Lazily drive the run, yielding snapshots in order.
    pub fn snapshot_stream(&mut self) -> SnapshotStream<'_> {
        SnapshotStream {
            simulation: self,
            failed: false,
        }
    }

    /// Run to completion and collect all remaining snapshots.
    pub fn run(&mut self) -> Result<Vec<Snapshot>> {
        self.snapshot_stream().collect()
    }

    fn complete(&mut self) -> Result<()> {
        self.record_snapshots(self.parameters.t_max, true)?;
        self.time = self.parameters.t_max;
        self.state = SimulationState::Completed;
        log::info!(
            "Simulation completed at t={} after {} events: {} nodes, fraction of programmers {:.4}.",
            self.time,
            self.n_events,
            self.store.total_nodes(),
            self.fraction_programmers()
        );
        Ok(())
    }

    fn schedule(&mut self, group: GroupId) -> Result<()> {
        let counts = self.store.counts(group)?;
        let totals = PopulationTotals {
            nodes: self.store.total_nodes(),
            groups: self.store.total_groups(),
        };
        match RateModel::new(&self.parameters).draw_event(
            group,
            counts,
            totals,
            self.time,
            &mut self.rng,
        ) {
            Ok(event) => self.scheduler.push(event),
            // the sign of every rate only depends on the group itself, so it stays at zero
            Err(SimulationError::DegenerateRate { total_rate, .. }) => {
                log::debug!(
                    "Group {group} with p={}, n={} is absorbed at t={} (total rate {total_rate}).",
                    counts.p,
                    counts.n,
                    self.time
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn apply(&mut self, event: &PendingEvent) -> Result<()> {
        let group = event.group;
        let before = self.store.counts(group)?;
        if before != event.snapshot {
            log::debug!(
                "Stale event for group {group}: drawn for {:?}, applied to {:?}.",
                event.snapshot,
                before
            );
        }

        let mutation = match event.kind {
            EventKind::NonProgrammerDeparts | EventKind::NonProgrammerLeaves => {
                self.store.remove_node(group, NodeType::NonProgrammer)
            }
            EventKind::ProgrammerDeparts => self.store.remove_node(group, NodeType::Programmer),
            EventKind::NonProgrammerArrives => self.store.add_node(group, NodeType::NonProgrammer),
            EventKind::NewProgrammer => self.store.convert_node(group),
        };
        mutation.map_err(|err| self.violation(err, group, before))?;

        let after = self.store.counts(group)?;
        self.histogram
            .transfer(before, after)
            .map_err(|err| self.violation(err, group, before))?;
        #[cfg(debug_assertions)]
        self.histogram
            .assert_conserved(self.store.total_groups())
            .map_err(|err| self.violation(err, group, after))?;

        if event.kind == EventKind::NonProgrammerLeaves {
            self.cost_departures += 1;
        }
        self.n_events += 1;
        self.last_applied = Some((group, after));
        if let Some(historian) = self.historian.as_mut() {
            historian.record(self.time, group, event.kind);
        }
        log::trace!(
            "t={:.6} group={group} {} ({}, {}) -> ({}, {})",
            self.time,
            event.kind,
            before.p,
            before.n,
            after.p,
            after.n
        );
        Ok(())
    }

    /// Emit snapshots for all boundaries before `until` (or up to and including it).
    fn record_snapshots(&mut self, until: f64, inclusive: bool) -> Result<()> {
        loop {
            let boundary = self.sampling.boundary(self.next_sample);
            let crossed = if inclusive {
                boundary <= until
            } else {
                boundary < until
            };
            if !crossed || boundary > self.parameters.t_max {
                return Ok(());
            }
            if let Err(err) = self.histogram.assert_conserved(self.store.total_groups()) {
                return Err(match self.last_applied {
                    Some((group, counts)) => self.violation(err, group, counts),
                    None => err,
                });
            }
            self.snapshots.push_back(self.snapshot(boundary));
            self.next_sample += 1;
        }
    }

    fn snapshot(&self, time: f64) -> Snapshot {
        Snapshot {
            time,
            fraction_programmers: self.fraction_programmers(),
            total_population: self.store.total_nodes(),
            histogram: self.histogram.clone(),
        }
    }

    fn violation(
        &self,
        error: SimulationError,
        group: GroupId,
        counts: GroupCounts,
    ) -> SimulationError {
        let invariant = match error {
            SimulationError::InvariantViolation { invariant, .. }
            | SimulationError::HistogramMismatch { invariant } => invariant,
            other => other.to_string(),
        };
        SimulationError::InvariantViolation {
            invariant,
            time: self.time,
            group,
            p: counts.p,
            n: counts.n,
        }
    }
}

/// Iterator over the snapshots of a run. Stops after the first error.
pub struct SnapshotStream<'a> {
    simulation: &'a mut Simulation,
    failed: bool,
}

impl Iterator for SnapshotStream<'_> {
    type Item = Result<Snapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.simulation.next_snapshot() {
            Ok(snapshot) => snapshot.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
