//! All errors that can occur in the groupdyn library.

use derive_more::{Display, Error};

use crate::core::population::{GroupId, NodeType};

pub type Result<T> = std::result::Result<T, SimulationError>;

#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum SimulationError {
    /// Parameters were rejected before any event was scheduled.
    #[display("InvalidParameters: {message}")]
    InvalidParameters { message: String },

    /// A store mutation asked for a member that does not exist.
    #[display("PreconditionViolation: group {group} has no member of type {node_type}")]
    PreconditionViolation { group: GroupId, node_type: NodeType },

    /// Bookkeeping of the store, histogram or scheduler went out of sync.
    #[display("InvariantViolation: {invariant} (t={time}, group={group}, p={p}, n={n})")]
    InvariantViolation {
        invariant: String,
        time: f64,
        group: GroupId,
        p: usize,
        n: usize,
    },

    /// The total event rate of a group is not positive.
    #[display("DegenerateRate: group {group} with p={p}, n={n} has total rate {total_rate}")]
    DegenerateRate {
        group: GroupId,
        p: usize,
        n: usize,
        total_rate: f64,
    },

    #[display("UnknownGroup: no group with id {group}")]
    UnknownGroup { group: GroupId },

    /// The occupancy histogram lost track of a group, outside of any event context.
    #[display("HistogramMismatch: {invariant}")]
    HistogramMismatch { invariant: String },

    #[display("WriteError: {message}")]
    WriteError { message: String },
}

impl SimulationError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SimulationError::InvalidParameters {
            message: message.into(),
        }
    }

    pub(crate) fn write(message: impl std::fmt::Display) -> Self {
        SimulationError::WriteError {
            message: message.to_string(),
        }
    }
}
