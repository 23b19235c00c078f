//! Search algorithms on road graphs and contraction hierarchies.
//!
//! Every algorithm object answers exactly one query. Its search state is not reset,
//! so a second call fails with `SearchError::AlreadyRun`; create a new instance per query.

use crate::datastr::{graph::*, shortest_path_tree::*};
use crate::error::SearchError;
use rustc_hash::FxHashMap;

pub mod a_star;
pub mod contraction_hierarchy;
pub mod core_ch;
pub mod dijkstra;
pub mod path;
pub mod rphast;
pub mod search_base;

pub use self::path::Path;
pub use self::search_base::{EdgeAcceptor, RunState, SearchBase, SearchStats};

/// How search tree entries are identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    /// One entry per node.
    NodeBased,
    /// One entry per traveled edge and direction, needed when the cost of an edge depends on the previous one.
    EdgeBased,
}

// roots of edge-based searches have no incoming edge, keep them apart from edge keys
const ROOT_ID_BIT: TraversalId = 1 << 40;

impl TraversalMode {
    pub fn is_edge_based(self) -> bool {
        self == TraversalMode::EdgeBased
    }

    /// Key of the entry reached over `edge` (as explored, i.e. ending at `edge.adj`).
    #[inline]
    pub fn create_traversal_id(self, edge: &EdgeState, reverse: bool) -> TraversalId {
        match self {
            TraversalMode::NodeBased => edge.adj as TraversalId,
            TraversalMode::EdgeBased => {
                let travel = edge.in_travel_direction(reverse);
                ((edge.edge as TraversalId) << 1) | (travel.base > travel.adj) as TraversalId
            }
        }
    }

    #[inline]
    pub fn root_id(self, node: NodeId) -> TraversalId {
        match self {
            TraversalMode::NodeBased => node as TraversalId,
            TraversalMode::EdgeBased => ROOT_ID_BIT | node as TraversalId,
        }
    }
}

/// Point to point queries.
pub trait RoutingAlgorithm {
    fn calc_path(&mut self, from: NodeId, to: NodeId) -> Result<Path, SearchError>;

    fn visited_nodes(&self) -> usize;

    fn set_max_visited_nodes(&mut self, max_visited_nodes: usize);

    fn name(&self) -> &'static str;
}

/// The entries of the targets reached by a one-to-many search.
#[derive(Debug, Clone, Default)]
pub struct TargetEntries {
    entries: FxHashMap<NodeId, EntryId>,
    budget_exceeded: bool,
}

impl TargetEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: NodeId, entry: EntryId) {
        self.entries.entry(target).or_insert(entry);
    }

    pub fn get(&self, target: NodeId) -> Option<EntryId> {
        self.entries.get(&target).copied()
    }

    pub fn contains(&self, target: NodeId) -> bool {
        self.entries.contains_key(&target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_budget_exceeded(&mut self) {
        self.budget_exceeded = true;
    }

    /// Was the search aborted because it settled more nodes than allowed?
    /// Targets missing from the result may then still be reachable.
    pub fn budget_exceeded(&self) -> bool {
        self.budget_exceeded
    }
}

/// One source to many targets, exposing the search tree for metric extraction.
pub trait OneToMany {
    fn calc_targets(&mut self, from: NodeId, targets: &[NodeId]) -> Result<TargetEntries, SearchError>;

    fn tree(&self) -> &ShortestPathTree;

    /// The search explored edges backward, i.e. the tree's root is the end of all its paths.
    fn is_reverse(&self) -> bool {
        false
    }
}

pub(crate) fn check_node<G: Graph + ?Sized>(graph: &G, node: NodeId) -> Result<(), SearchError> {
    if (node as usize) < graph.num_nodes() {
        Ok(())
    } else {
        Err(SearchError::NodeOutOfRange {
            node,
            num_nodes: graph.num_nodes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_based_ids_distinguish_directions() {
        let mut builder = RoadGraphBuilder::new(2);
        builder.two_way(0, 1, 1.0, 1.0);
        let graph = builder.build();
        let out_of_zero = graph.edge_iter(0).next().unwrap();
        let out_of_one = graph.edge_iter(1).next().unwrap();

        let mode = TraversalMode::EdgeBased;
        assert_ne!(mode.create_traversal_id(&out_of_zero, false), mode.create_traversal_id(&out_of_one, false));
        // exploring 0 -> 1 backward means traveling 1 -> 0
        assert_eq!(mode.create_traversal_id(&out_of_zero, true), mode.create_traversal_id(&out_of_one, false));
        assert_ne!(mode.root_id(0), mode.create_traversal_id(&out_of_zero, false));
        assert_eq!(TraversalMode::NodeBased.create_traversal_id(&out_of_zero, false), 1);
    }
}
