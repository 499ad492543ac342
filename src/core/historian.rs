//! Historian --- stores fired events in memory
//!
//! The historian keeps the sequence of events a run has applied. It is opt-in, since a long run
//! fires many events, and is primarily used to compare runs with each other, e.g. to check that
//! a seed reproduces the same trajectory.
//!

use std::fmt;

use super::population::GroupId;
use super::scheduler::EventKind;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FiredEvent {
    pub time: f64,
    pub group: GroupId,
    pub kind: EventKind,
}

impl fmt::Display for FiredEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FiredEvent(time={},group={},kind={})",
            self.time, self.group, self.kind
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Historian {
    history: Vec<FiredEvent>,
}

impl Historian {
    pub fn new() -> Self {
        Self { history: vec![] }
    }

    pub fn record(&mut self, time: f64, group: GroupId, kind: EventKind) {
        self.history.push(FiredEvent { time, group, kind });
    }

    pub fn events(&self) -> &[FiredEvent] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Number of recorded events of a kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.history.iter().filter(|event| event.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_count() {
        let mut historian = Historian::new();
        assert!(historian.is_empty());
        historian.record(0.5, 1, EventKind::NewProgrammer);
        historian.record(0.7, 0, EventKind::NonProgrammerArrives);
        historian.record(0.9, 1, EventKind::NewProgrammer);
        assert_eq!(historian.len(), 3);
        assert_eq!(historian.count(EventKind::NewProgrammer), 2);
        assert_eq!(historian.count(EventKind::ProgrammerDeparts), 0);
        assert_eq!(historian.events()[1].group, 0);
        assert_eq!(
            historian.events()[0].to_string(),
            "FiredEvent(time=0.5,group=1,kind=NewProgrammer)"
        );
    }
}
