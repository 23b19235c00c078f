//! A road graph augmented with node levels and shortcut edges.

use super::*;
use std::sync::Arc;

/// Position of a node in the hierarchy. Unique per node, higher means contracted later.
pub type Level = u32;

/// A directed shortcut `from -> via -> to` replacing the two skipped edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortcutData {
    pub from: NodeId,
    pub to: NodeId,
    pub via: NodeId,
    /// Edge from `from` to `via`
    pub skip_first: EdgeId,
    /// Edge from `via` to `to`
    pub skip_second: EdgeId,
    pub weight: Weight,
    pub millis: Millis,
    pub distance: f64,
    /// First and last original edge when traveling from `from` to `to`
    pub orig_first: EdgeId,
    pub orig_last: EdgeId,
}

/// Contracted graph. Edge ids `0..base.num_edges()` are the base edges, shortcut ids follow.
#[derive(Debug, Clone)]
pub struct ChGraph {
    base: Arc<RoadGraph>,
    levels: Vec<Level>,
    shortcuts: Vec<ShortcutData>,
    // incidence lists of shortcuts at both their ends, indices into `shortcuts`
    shortcut_first_out: Vec<u32>,
    incident_shortcut: Vec<u32>,
    core_level: Option<Level>,
    weighting_name: String,
}

impl ChGraph {
    pub fn new(base: Arc<RoadGraph>, levels: Vec<Level>, shortcuts: Vec<ShortcutData>, core_level: Option<Level>, weighting_name: impl Into<String>) -> ChGraph {
        let n = base.num_nodes();
        assert_eq!(levels.len(), n);
        assert!(base.num_edges() + shortcuts.len() < EdgeId::MAX as usize);

        let mut degrees = vec![0u32; n + 1];
        for shortcut in &shortcuts {
            degrees[shortcut.from as usize + 1] += 1;
            degrees[shortcut.to as usize + 1] += 1;
        }
        for i in 1..=n {
            degrees[i] += degrees[i - 1];
        }
        let shortcut_first_out = degrees;
        let mut next = shortcut_first_out.clone();
        let mut incident_shortcut = vec![0; shortcuts.len() * 2];
        for (idx, shortcut) in shortcuts.iter().enumerate() {
            for end in [shortcut.from, shortcut.to] {
                incident_shortcut[next[end as usize] as usize] = idx as u32;
                next[end as usize] += 1;
            }
        }

        ChGraph {
            base,
            levels,
            shortcuts,
            shortcut_first_out,
            incident_shortcut,
            core_level,
            weighting_name: weighting_name.into(),
        }
    }

    pub fn base_graph(&self) -> &RoadGraph {
        &self.base
    }

    pub fn shared_base_graph(&self) -> Arc<RoadGraph> {
        self.base.clone()
    }

    pub fn num_shortcuts(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn shortcuts(&self) -> &[ShortcutData] {
        &self.shortcuts
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn shortcut(&self, edge: EdgeId) -> Option<&ShortcutData> {
        (edge as usize).checked_sub(self.base.num_edges()).and_then(|idx| self.shortcuts.get(idx))
    }

    fn shortcut_id(&self, idx: u32) -> EdgeId {
        (self.base.num_edges() + idx as usize) as EdgeId
    }

    fn shortcut_state(&self, idx: u32, base: NodeId) -> EdgeState {
        let shortcut = self.shortcuts[idx as usize];
        let state = EdgeState {
            edge: self.shortcut_id(idx),
            base: shortcut.from,
            adj: shortcut.to,
            distance: shortcut.distance,
            // not meaningful for shortcuts, weightings use the stored weight and millis
            speed: 0.0,
            forward: true,
            backward: false,
            orig_edge_first: shortcut.orig_first,
            orig_edge_last: shortcut.orig_last,
            shortcut: Some(shortcut),
        };
        if base == shortcut.from {
            state
        } else {
            debug_assert_eq!(base, shortcut.to);
            state.reversed()
        }
    }
}

impl Graph for ChGraph {
    fn num_nodes(&self) -> usize {
        self.base.num_nodes()
    }

    fn num_edges(&self) -> usize {
        self.base.num_edges() + self.shortcuts.len()
    }
}

/// Base edges followed by the shortcuts incident to a node.
#[derive(Debug, Clone)]
pub struct ChEdgeIter<'a> {
    graph: &'a ChGraph,
    base_edges: road_graph::RoadEdgeIter<'a>,
    shortcuts: std::slice::Iter<'a, u32>,
    node: NodeId,
}

impl<'a> Iterator for ChEdgeIter<'a> {
    type Item = EdgeState;

    #[inline]
    fn next(&mut self) -> Option<EdgeState> {
        self.base_edges
            .next()
            .or_else(|| self.shortcuts.next().map(|&idx| self.graph.shortcut_state(idx, self.node)))
    }
}

impl EdgeIterable for ChGraph {
    type Iter<'a> = ChEdgeIter<'a>;

    fn edge_iter(&self, node: NodeId) -> ChEdgeIter<'_> {
        let n = node as usize;
        let range = self.shortcut_first_out[n] as usize..self.shortcut_first_out[n + 1] as usize;
        ChEdgeIter {
            graph: self,
            base_edges: self.base.edge_iter(node),
            shortcuts: self.incident_shortcut[range].iter(),
            node,
        }
    }

    fn edge_state(&self, edge: EdgeId, adj: NodeId) -> EdgeState {
        match (edge as usize).checked_sub(self.base.num_edges()) {
            Some(idx) => {
                let shortcut = &self.shortcuts[idx];
                let base = if shortcut.to == adj { shortcut.from } else { shortcut.to };
                self.shortcut_state(idx as u32, base)
            }
            None => self.base.edge_state(edge, adj),
        }
    }

    fn coordinate(&self, node: NodeId) -> Option<(f64, f64)> {
        self.base.coordinate(node)
    }

    fn unpack_edge(&self, edge: &EdgeState, out: &mut Vec<EdgeState>) {
        match &edge.shortcut {
            Some(shortcut) => {
                self.unpack_edge(&self.edge_state(shortcut.skip_first, shortcut.via), out);
                self.unpack_edge(&self.edge_state(shortcut.skip_second, shortcut.to), out);
            }
            None => out.push(*edge),
        }
    }
}

impl CHGraph for ChGraph {
    #[inline]
    fn level(&self, node: NodeId) -> Level {
        self.levels[node as usize]
    }

    fn core_level(&self) -> Option<Level> {
        self.core_level
    }

    fn weighting_name(&self) -> &str {
        &self.weighting_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0 - 1 - 2 path, 1 contracted first
    fn graph() -> ChGraph {
        let mut builder = RoadGraphBuilder::new(3);
        builder.two_way(0, 1, 10.0, 36.0);
        builder.one_way(1, 2, 20.0, 36.0);
        let base = Arc::new(builder.build());
        let shortcut = ShortcutData {
            from: 0,
            to: 2,
            via: 1,
            skip_first: 0,
            skip_second: 1,
            weight: 3.0,
            millis: 3000,
            distance: 30.0,
            orig_first: 0,
            orig_last: 1,
        };
        ChGraph::new(base, vec![1, 0, 2], vec![shortcut], None, "fastest")
    }

    #[test]
    fn shortcuts_appear_at_both_ends() {
        let graph = graph();
        assert_eq!(graph.num_edges(), 3);
        let at_zero: Vec<_> = graph.edge_iter(0).map(|e| (e.edge, e.adj, e.forward, e.backward)).collect();
        assert_eq!(at_zero, vec![(0, 1, true, true), (2, 2, true, false)]);
        let at_two: Vec<_> = graph.edge_iter(2).map(|e| (e.edge, e.adj, e.forward, e.backward, e.orig_edge_first)).collect();
        assert_eq!(at_two, vec![(1, 1, false, true, 1), (2, 0, false, true, 1)]);
        assert!(!graph.is_core(2));
    }

    #[test]
    fn unpacks_to_original_edges_in_travel_order() {
        let graph = graph();
        let shortcut = graph.edge_state(2, 2);
        assert_eq!((shortcut.base, shortcut.adj), (0, 2));
        let mut unpacked = Vec::new();
        graph.unpack_edge(&shortcut, &mut unpacked);
        let hops: Vec<_> = unpacked.iter().map(|e| (e.edge, e.base, e.adj)).collect();
        assert_eq!(hops, vec![(0, 0, 1), (1, 1, 2)]);
        assert_eq!(unpacked.iter().map(|e| e.distance).sum::<f64>(), 30.0);
    }
}
