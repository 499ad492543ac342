//! Population module
//!
//! The population module contains the `PopulationStore`, the single owner of all groups and their
//! members. Groups live in an arena indexed by a stable `GroupId`; a group keeps one member list
//! per node type, so that removing "some member of a type" is a pop from the end of that list.
//! Nodes are additionally registered by their `NodeId`, which is never reused.
//!
//! The store does not know about the occupancy histogram. Whoever mutates the store is
//! responsible for moving the group between histogram cells in the same step.
//!

use derive_more::Display;
use rand::distr::Bernoulli;
use rand::prelude::*;
use rand_distr::Binomial;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

use crate::config::SimulationParameters;
use crate::errors::{Result, SimulationError};

pub type GroupId = usize;
pub type NodeId = usize;

type Members = SmallVec<[NodeId; 8]>;

#[macro_export]
macro_rules! population {
    () => {
        $crate::core::PopulationStore::new(0)
    };
    ($( ($p:expr, $n:expr) ),+ $(,)?) => {
        $crate::core::PopulationStore::with_groups(&[$( $crate::core::GroupCounts::new($p, $n) ),+])
    };
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum NodeType {
    NonProgrammer,
    Programmer,
}

/// Occupancy of a group: `p` programmers and `n` non-programmers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GroupCounts {
    pub p: usize,
    pub n: usize,
}

impl GroupCounts {
    pub const fn new(p: usize, n: usize) -> Self {
        Self { p, n }
    }

    pub const fn size(&self) -> usize {
        self.p + self.n
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    id: NodeId,
    node_type: NodeType,
    group: GroupId,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn group(&self) -> GroupId {
        self.group
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Group {
    id: GroupId,
    programmers: Members,
    non_programmers: Members,
}

impl Group {
    fn new(id: GroupId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn counts(&self) -> GroupCounts {
        GroupCounts::new(self.programmers.len(), self.non_programmers.len())
    }

    pub fn is_empty(&self) -> bool {
        self.programmers.is_empty() && self.non_programmers.is_empty()
    }

    /// Iterate over all member ids, programmers first.
    pub fn members(&self) -> impl Iterator<Item = &NodeId> {
        self.programmers.iter().chain(self.non_programmers.iter())
    }

    fn members_mut(&mut self, node_type: NodeType) -> &mut Members {
        match node_type {
            NodeType::Programmer => &mut self.programmers,
            NodeType::NonProgrammer => &mut self.non_programmers,
        }
    }
}

/// Owner of all groups and nodes of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PopulationStore {
    groups: Vec<Group>,
    nodes: HashMap<NodeId, Node>,
    next_node_id: NodeId,
    total_programmers: usize,
}

impl PopulationStore {
    /// Construct a store with `total_groups` empty groups.
    pub fn new(total_groups: usize) -> Self {
        Self {
            groups: (0..total_groups).map(Group::new).collect(),
            ..Default::default()
        }
    }

    /// Construct a store with one group per entry of `counts`.
    pub fn with_groups(counts: &[GroupCounts]) -> Self {
        let mut store = Self::new(counts.len());
        for (group, group_counts) in counts.iter().enumerate() {
            for _ in 0..group_counts.p {
                store.push_node(group, NodeType::Programmer);
            }
            for _ in 0..group_counts.n {
                store.push_node(group, NodeType::NonProgrammer);
            }
        }
        store
    }

    /// Draw the initial population.
    ///
    /// Group sizes follow `Binomial(max_group_size, initial_occupancy)`, redrawn until positive.
    /// Each member is a programmer with probability `initial_programmer_fraction`.
    pub fn initialize<R: Rng + ?Sized>(
        parameters: &SimulationParameters,
        rng: &mut R,
    ) -> Result<Self> {
        let size_distribution = Binomial::new(
            parameters.max_group_size as u64,
            parameters.initial_occupancy,
        )
        .map_err(|err| SimulationError::invalid(format!("initial group size: {err}")))?;
        let type_distribution = Bernoulli::new(parameters.initial_programmer_fraction)
            .map_err(|err| SimulationError::invalid(format!("initial node type: {err}")))?;

        let mut store = Self::new(parameters.total_groups);
        for group in 0..parameters.total_groups {
            let mut size = 0;
            while size == 0 {
                size = size_distribution.sample(rng);
            }
            for _ in 0..size {
                let node_type = if type_distribution.sample(rng) {
                    NodeType::Programmer
                } else {
                    NodeType::NonProgrammer
                };
                store.push_node(group, node_type);
            }
        }
        Ok(store)
    }

    pub fn total_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn total_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn total_programmers(&self) -> usize {
        self.total_programmers
    }

    pub fn group(&self, group: GroupId) -> Option<&Group> {
        self.groups.get(group)
    }

    pub fn node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(&node)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn counts(&self, group: GroupId) -> Result<GroupCounts> {
        self.group(group)
            .map(Group::counts)
            .ok_or(SimulationError::UnknownGroup { group })
    }

    /// Add a new member of `node_type` to `group` and return its id.
    pub fn add_node(&mut self, group: GroupId, node_type: NodeType) -> Result<NodeId> {
        if group >= self.groups.len() {
            return Err(SimulationError::UnknownGroup { group });
        }
        Ok(self.push_node(group, node_type))
    }

    /// Remove one member of `node_type` from `group` and return its id.
    pub fn remove_node(&mut self, group: GroupId, node_type: NodeType) -> Result<NodeId> {
        let members = self
            .groups
            .get_mut(group)
            .ok_or(SimulationError::UnknownGroup { group })?
            .members_mut(node_type);
        let node = members
            .pop()
            .ok_or(SimulationError::PreconditionViolation { group, node_type })?;
        self.nodes.remove(&node);
        if node_type == NodeType::Programmer {
            self.total_programmers -= 1;
        }
        Ok(node)
    }

    /// Turn one non-programmer of `group` into a programmer and return its id.
    pub fn convert_node(&mut self, group: GroupId) -> Result<NodeId> {
        let group_ref = self
            .groups
            .get_mut(group)
            .ok_or(SimulationError::UnknownGroup { group })?;
        let node = group_ref.non_programmers.pop().ok_or(
            SimulationError::PreconditionViolation {
                group,
                node_type: NodeType::NonProgrammer,
            },
        )?;
        group_ref.programmers.push(node);
        if let Some(record) = self.nodes.get_mut(&node) {
            record.node_type = NodeType::Programmer;
        }
        self.total_programmers += 1;
        Ok(node)
    }

    fn push_node(&mut self, group: GroupId, node_type: NodeType) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        self.groups[group].members_mut(node_type).push(id);
        self.nodes.insert(
            id,
            Node {
                id,
                node_type,
                group,
            },
        );
        if node_type == NodeType::Programmer {
            self.total_programmers += 1;
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_empty_groups() {
        let store = PopulationStore::new(3);
        assert_eq!(store.total_groups(), 3);
        assert_eq!(store.total_nodes(), 0);
        assert!(store.groups().all(Group::is_empty));
    }

    #[test]
    fn add_and_remove() {
        let mut store = PopulationStore::new(2);
        let first = store.add_node(0, NodeType::NonProgrammer).unwrap();
        let second = store.add_node(0, NodeType::Programmer).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.counts(0).unwrap(), GroupCounts::new(1, 1));
        assert_eq!(store.total_programmers(), 1);
        assert_eq!(store.node(second).unwrap().group(), 0);

        let removed = store.remove_node(0, NodeType::Programmer).unwrap();
        assert_eq!(removed, second);
        assert!(store.node(second).is_none());
        assert_eq!(store.counts(0).unwrap(), GroupCounts::new(0, 1));
        assert_eq!(store.total_programmers(), 0);
        assert_eq!(store.total_nodes(), 1);
    }

    #[test]
    fn remove_from_empty_category() {
        let mut store = population![(0, 2)];
        assert_eq!(
            store.remove_node(0, NodeType::Programmer),
            Err(SimulationError::PreconditionViolation {
                group: 0,
                node_type: NodeType::Programmer
            })
        );
        assert_eq!(store.counts(0).unwrap(), GroupCounts::new(0, 2));
    }

    #[test]
    fn unknown_group() {
        let mut store = PopulationStore::new(1);
        assert_eq!(
            store.add_node(1, NodeType::Programmer),
            Err(SimulationError::UnknownGroup { group: 1 })
        );
        assert!(store.counts(5).is_err());
    }

    #[test]
    fn convert() {
        let mut store = population![(1, 1), (0, 0)];
        let node = store.convert_node(0).unwrap();
        assert_eq!(store.counts(0).unwrap(), GroupCounts::new(2, 0));
        assert_eq!(store.node(node).unwrap().node_type(), NodeType::Programmer);
        assert_eq!(store.total_programmers(), 2);
        assert!(store.convert_node(0).is_err());
        assert!(store.convert_node(1).is_err());
    }

    #[test]
    fn node_ids_are_not_reused() {
        let mut store = PopulationStore::new(1);
        let first = store.add_node(0, NodeType::NonProgrammer).unwrap();
        store.remove_node(0, NodeType::NonProgrammer).unwrap();
        let second = store.add_node(0, NodeType::NonProgrammer).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn empty_group_can_be_repopulated() {
        let mut store = population![(0, 1)];
        store.remove_node(0, NodeType::NonProgrammer).unwrap();
        assert!(store.group(0).unwrap().is_empty());
        store.add_node(0, NodeType::NonProgrammer).unwrap();
        assert_eq!(store.counts(0).unwrap(), GroupCounts::new(0, 1));
    }

    #[test]
    fn macro_with_groups() {
        let store = population![(1, 2), (0, 0), (3, 0)];
        assert_eq!(store.total_groups(), 3);
        assert_eq!(store.total_nodes(), 6);
        assert_eq!(store.total_programmers(), 4);
        assert_eq!(store.group(2).unwrap().members().count(), 3);
        assert_eq!(population![].total_groups(), 0);
    }

    #[test]
    fn initialize_groups_are_not_empty() {
        let parameters = SimulationParameters {
            total_groups: 200,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let store = PopulationStore::initialize(&parameters, &mut rng).unwrap();
        assert_eq!(store.total_groups(), 200);
        assert!(store.groups().all(|group| !group.is_empty()));
        assert!(
            store
                .groups()
                .all(|group| group.counts().size() <= parameters.max_group_size)
        );
        let programmers: usize = store.groups().map(|group| group.counts().p).sum();
        assert_eq!(programmers, store.total_programmers());
    }

    #[test]
    fn initialize_without_programmers() {
        let parameters = SimulationParameters {
            total_groups: 50,
            initial_programmer_fraction: 0.,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let store = PopulationStore::initialize(&parameters, &mut rng).unwrap();
        assert_eq!(store.total_programmers(), 0);
        assert!(store.total_nodes() >= 50);
    }
}
