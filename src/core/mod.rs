//! This module contains the core datatypes of the library.

#[macro_use]
pub mod population;
pub mod histogram;
mod historian;
pub mod rates;
pub mod scheduler;
pub mod simulation;

pub use histogram::Histogram;
pub use historian::{FiredEvent, Historian};
pub use population::{GroupCounts, GroupId, NodeId, NodeType, PopulationStore};
pub use rates::{PopulationTotals, RateModel, Rates};
pub use scheduler::{EventKind, EventScheduler, PendingEvent};
pub use simulation::{Simulation, SimulationState, Snapshot, SnapshotStream};
