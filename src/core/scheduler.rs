//! Event scheduler: a min-heap of pending per-group events.
//!
//! Each group has at most one pending event. Events are popped in order of their scheduled time;
//! events scheduled for the same time are popped in insertion order.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::population::{GroupCounts, GroupId};
use crate::errors::{Result, SimulationError};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum EventKind {
    /// A non-programmer leaves the group.
    NonProgrammerDeparts,
    /// A programmer leaves the group.
    ProgrammerDeparts,
    /// A new non-programmer joins the group.
    NonProgrammerArrives,
    /// A conversion attempt succeeded: a non-programmer becomes a programmer.
    NewProgrammer,
    /// A conversion attempt failed and the non-programmer leaves the group.
    NonProgrammerLeaves,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingEvent {
    /// Absolute time at which the event fires.
    pub time: f64,
    pub group: GroupId,
    pub kind: EventKind,
    /// Occupancy of the group when the event was drawn.
    pub snapshot: GroupCounts,
}

impl PendingEvent {
    pub fn new(time: f64, group: GroupId, kind: EventKind, snapshot: GroupCounts) -> Self {
        Self {
            time,
            group,
            kind,
            snapshot,
        }
    }
}

#[derive(Debug)]
struct QueueEntry {
    event: PendingEvent,
    sequence: u64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.event
            .time
            .total_cmp(&other.event.time)
            .then(self.sequence.cmp(&other.sequence))
    }
}

#[derive(Debug, Default)]
pub struct EventScheduler {
    queue: BinaryHeap<Reverse<QueueEntry>>,
    pending: Vec<bool>,
    sequence: u64,
}

impl EventScheduler {
    pub fn new(total_groups: usize) -> Self {
        Self {
            queue: BinaryHeap::with_capacity(total_groups),
            pending: vec![false; total_groups],
            sequence: 0,
        }
    }

    /// Schedule the next event of a group.
    ///
    /// Fails if the group already has a pending event.
    pub fn push(&mut self, event: PendingEvent) -> Result<()> {
        let violation = |invariant: String| SimulationError::InvariantViolation {
            invariant,
            time: event.time,
            group: event.group,
            p: event.snapshot.p,
            n: event.snapshot.n,
        };
        let pending = self
            .pending
            .get_mut(event.group)
            .ok_or_else(|| violation(format!("group {} is not scheduled", event.group)))?;
        if *pending {
            return Err(violation(format!(
                "group {} already has a pending event",
                event.group
            )));
        }
        *pending = true;

        self.queue.push(Reverse(QueueEntry {
            event,
            sequence: self.sequence,
        }));
        self.sequence += 1;
        Ok(())
    }

    /// Remove and return the earliest pending event.
    pub fn pop_earliest(&mut self) -> Option<PendingEvent> {
        let Reverse(entry) = self.queue.pop()?;
        self.pending[entry.event.group] = false;
        Some(entry.event)
    }

    pub fn has_pending(&self, group: GroupId) -> bool {
        self.pending.get(group).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
