//! Graph adapter traits and the edge records the searches work on.
//!
//! Graphs are stored with undirected edges which carry access flags per direction.
//! Iterating the edges of a node yields `EdgeState`s oriented away from that node,
//! the searches decide through filters and weightings in which direction an edge may be used.

pub mod ch_graph;
pub mod edge_filter;
pub mod road_graph;

pub use self::ch_graph::{ChGraph, Level, ShortcutData};
pub use self::edge_filter::*;
pub use self::road_graph::{RoadGraph, RoadGraphBuilder};

/// Node ids are 32bit unsigned ints
pub type NodeId = u32;
/// Edge ids are 32bit unsigned ints. Shortcut ids follow after the ids of the base edges.
pub type EdgeId = u32;
/// Weights are floats, unreachable is `INFINITY`.
pub type Weight = f64;
/// Travel times and points in time in milliseconds.
pub type Millis = i64;

pub const INFINITY: Weight = f64::INFINITY;
/// Marker for "no edge", e.g. the incoming edge of a tree root.
pub const NO_EDGE: EdgeId = EdgeId::MAX;

/// An edge as seen from `base`.
/// `forward` means the edge may be traveled from `base` to `adj`, `backward` from `adj` to `base`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeState {
    pub edge: EdgeId,
    pub base: NodeId,
    pub adj: NodeId,
    /// Length in meters. Shortcuts carry the summed length of the edges they skip.
    pub distance: f64,
    /// Speed in km/h
    pub speed: f64,
    pub forward: bool,
    pub backward: bool,
    /// First and last original edge when traveling from `base` to `adj`.
    /// Equal to `edge` for non-shortcut edges.
    pub orig_edge_first: EdgeId,
    pub orig_edge_last: EdgeId,
    pub shortcut: Option<ShortcutData>,
}

impl EdgeState {
    /// The same edge seen from the other end.
    pub fn reversed(&self) -> EdgeState {
        EdgeState {
            base: self.adj,
            adj: self.base,
            forward: self.backward,
            backward: self.forward,
            orig_edge_first: self.orig_edge_last,
            orig_edge_last: self.orig_edge_first,
            ..*self
        }
    }

    /// Orient the state so that it is traveled from `base` to `adj`.
    /// States explored by a reverse search are traveled from `adj` to `base`.
    pub fn in_travel_direction(&self, reverse: bool) -> EdgeState {
        if reverse {
            self.reversed()
        } else {
            *self
        }
    }

    pub fn is_shortcut(&self) -> bool {
        self.shortcut.is_some()
    }

    /// Is the edge usable in the given search direction from `base`?
    #[inline]
    pub fn accessible(&self, reverse: bool) -> bool {
        if reverse {
            self.backward
        } else {
            self.forward
        }
    }
}

/// Base trait for graphs.
pub trait Graph {
    fn num_nodes(&self) -> usize;
    /// Number of edge ids, including shortcuts.
    fn num_edges(&self) -> usize;
}

/// Graphs which allow exploring the edges of a node and random access to edges by id.
pub trait EdgeIterable: Graph {
    type Iter<'a>: Iterator<Item = EdgeState>
    where
        Self: 'a;

    /// All edges incident to `node`, oriented away from it.
    fn edge_iter(&self, node: NodeId) -> Self::Iter<'_>;

    /// The edge with the given id, oriented such that it ends at `adj`.
    fn edge_state(&self, edge: EdgeId, adj: NodeId) -> EdgeState;

    /// Coordinates (lat, lng) of a node if the graph has any.
    fn coordinate(&self, _node: NodeId) -> Option<(f64, f64)> {
        None
    }

    /// Append the original edges an edge (given in travel direction) consists of, in travel order.
    fn unpack_edge(&self, edge: &EdgeState, out: &mut Vec<EdgeState>) {
        out.push(*edge);
    }
}

/// Contracted graphs: every node has a level, higher levels were contracted later.
pub trait CHGraph: EdgeIterable {
    fn level(&self, node: NodeId) -> Level;

    /// Nodes with at least this level were not contracted. `None` for fully contracted graphs.
    fn core_level(&self) -> Option<Level>;

    fn is_core(&self, node: NodeId) -> bool {
        self.core_level().map_or(false, |core| self.level(node) >= core)
    }

    /// Name of the weighting the hierarchy was prepared for.
    fn weighting_name(&self) -> &str;
}

/// Simply a source-target pair
#[derive(Debug, Clone, Copy)]
pub struct Query {
    pub from: NodeId,
    pub to: NodeId,
}

/// A source-target pair with a departure time (or arrival time for reverse searches).
#[derive(Debug, Clone, Copy)]
pub struct TDQuery {
    pub from: NodeId,
    pub to: NodeId,
    pub at: Millis,
}
