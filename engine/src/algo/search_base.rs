//! State shared by all searches: the one-shot guard, the node budget and edge acceptance.

use super::*;

/// Lifecycle of a search instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Ready,
    Running,
    Done,
}

/// Counters of a single search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub visited_nodes: usize,
    pub relaxed_arcs: usize,
    pub queue_pushes: usize,
}

/// Decides whether an edge may be relaxed after arriving over `prev_edge`.
pub trait EdgeAcceptor {
    fn accept(&self, edge: &EdgeState, prev_edge: EdgeId) -> bool;
}

pub struct SearchBase<'a> {
    state: RunState,
    traversal_mode: TraversalMode,
    max_visited_nodes: usize,
    stats: SearchStats,
    additional_filter: Option<&'a (dyn EdgeFilter + Sync)>,
}

impl<'a> std::fmt::Debug for SearchBase<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchBase")
            .field("state", &self.state)
            .field("traversal_mode", &self.traversal_mode)
            .field("max_visited_nodes", &self.max_visited_nodes)
            .field("stats", &self.stats)
            .field("has_additional_filter", &self.additional_filter.is_some())
            .finish()
    }
}

impl<'a> SearchBase<'a> {
    pub fn new(traversal_mode: TraversalMode) -> Self {
        SearchBase {
            state: RunState::Ready,
            traversal_mode,
            max_visited_nodes: usize::MAX,
            stats: SearchStats::default(),
            additional_filter: None,
        }
    }

    /// Has to be called first by every query entry point.
    pub fn check_already_run(&mut self) -> Result<(), SearchError> {
        match self.state {
            RunState::Ready => {
                self.state = RunState::Running;
                Ok(())
            }
            RunState::Running | RunState::Done => Err(SearchError::AlreadyRun),
        }
    }

    pub fn finish(&mut self) {
        self.state = RunState::Done;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn traversal_mode(&self) -> TraversalMode {
        self.traversal_mode
    }

    pub fn set_max_visited_nodes(&mut self, max_visited_nodes: usize) {
        self.max_visited_nodes = max_visited_nodes;
    }

    pub fn max_visited_nodes(&self) -> usize {
        self.max_visited_nodes
    }

    /// Filter applied in addition to the structural checks.
    pub fn set_edge_filter(&mut self, filter: &'a (dyn EdgeFilter + Sync)) {
        self.additional_filter = Some(filter);
    }

    pub fn additional_filter(&self) -> Option<&'a (dyn EdgeFilter + Sync)> {
        self.additional_filter
    }

    #[inline]
    pub fn count_visited_node(&mut self) {
        self.stats.visited_nodes += 1;
    }

    #[inline]
    pub fn count_relaxed_arc(&mut self) {
        self.stats.relaxed_arcs += 1;
    }

    #[inline]
    pub fn count_queue_push(&mut self) {
        self.stats.queue_pushes += 1;
    }

    #[inline]
    pub fn is_max_visited_nodes_exceeded(&self) -> bool {
        self.stats.visited_nodes > self.max_visited_nodes
    }

    pub fn visited_nodes(&self) -> usize {
        self.stats.visited_nodes
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn create_empty_path(&self) -> Path {
        Path::not_found()
    }
}

impl<'a> EdgeAcceptor for SearchBase<'a> {
    /// U-turns over the same edge are rejected in node-based mode.
    /// Edge-based searches leave u-turns to the weighting.
    #[inline]
    fn accept(&self, edge: &EdgeState, prev_edge: EdgeId) -> bool {
        if !self.traversal_mode.is_edge_based() && prev_edge != NO_EDGE && edge.edge == prev_edge {
            return false;
        }
        self.additional_filter.map_or(true, |filter| filter.accept(edge))
    }
}
