//! Node contraction for small and medium graphs.
//!
//! Nodes are contracted in the given order. For every pair of remaining neighbors `u -> v -> w`
//! of the contracted node `v`, a local witness search decides whether `u -> w` needs a shortcut.
//! Partial contraction leaves the most important nodes uncontracted as core. Witness paths then neither
//! pass through core nodes nor use edges between two core nodes, so shortcuts never depend on core edges.

use super::*;
use crate::datastr::{index_heap::*, node_order::NodeOrder, timestamped_vector::TimestampedVector};
use crate::util::NonNan;
use crate::weighting::Weighting;
use std::sync::Arc;

pub mod query;

pub use self::query::ChBidirectional;

/// Witness searches give up after settling this many nodes and insert the shortcut.
const WITNESS_SETTLE_LIMIT: usize = 500;

/// A directed arc of the remaining graph, `node` is the other end.
#[derive(Debug, Clone, Copy)]
struct Link {
    node: NodeId,
    edge: EdgeId,
    weight: Weight,
    millis: Millis,
    distance: f64,
    orig_first: EdgeId,
    orig_last: EdgeId,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, PartialOrd, Ord)]
struct WitnessState {
    key: NonNan,
    node: NodeId,
}

impl Indexing for WitnessState {
    #[inline]
    fn as_index(&self) -> usize {
        self.node as usize
    }
}

#[derive(Debug, Default)]
struct Node {
    outgoing: Vec<Link>,
    incoming: Vec<Link>,
}

fn insert_or_decrease(links: &mut Vec<Link>, link: Link) {
    match links.iter_mut().find(|other| other.node == link.node) {
        Some(other) if link.weight < other.weight => *other = link,
        Some(_) => (),
        None => links.push(link),
    }
}

struct ContractionGraph<'w, W: ?Sized> {
    nodes: Vec<Node>,
    ranks: Vec<u32>,
    core_level: Option<Level>,
    contracted: Vec<bool>,
    num_base_edges: usize,
    shortcuts: Vec<ShortcutData>,
    weighting: &'w W,
    distances: TimestampedVector<Weight>,
    queue: IndexdMinHeap<WitnessState>,
}

impl<'w, W: Weighting + ?Sized> ContractionGraph<'w, W> {
    fn new(graph: &RoadGraph, weighting: &'w W, order: &NodeOrder, core_level: Option<Level>) -> Self {
        let n = graph.num_nodes();
        let mut nodes: Vec<Node> = (0..n).map(|_| Node::default()).collect();

        for node in 0..n as NodeId {
            for edge in graph.edge_iter(node) {
                if edge.adj == node {
                    continue;
                }
                let weight = weighting.calc_weight(&edge, false, NO_EDGE);
                if weight == INFINITY {
                    continue;
                }
                let link = Link {
                    node: edge.adj,
                    edge: edge.edge,
                    weight,
                    millis: weighting.calc_millis(&edge, false, NO_EDGE),
                    distance: edge.distance,
                    orig_first: edge.edge,
                    orig_last: edge.edge,
                };
                insert_or_decrease(&mut nodes[node as usize].outgoing, link);
                insert_or_decrease(&mut nodes[edge.adj as usize].incoming, Link { node, ..link });
            }
        }

        ContractionGraph {
            nodes,
            ranks: order.ranks().to_vec(),
            core_level,
            contracted: vec![false; n],
            num_base_edges: graph.num_edges(),
            shortcuts: Vec::new(),
            weighting,
            distances: TimestampedVector::new(n, INFINITY),
            queue: IndexdMinHeap::new(n),
        }
    }

    fn is_core(&self, node: NodeId) -> bool {
        self.core_level.map_or(false, |core| self.ranks[node as usize] >= core)
    }

    fn contract(&mut self, node: NodeId) {
        let incoming: Vec<Link> = self.nodes[node as usize].incoming.iter().filter(|l| !self.contracted[l.node as usize]).copied().collect();
        let outgoing: Vec<Link> = self.nodes[node as usize].outgoing.iter().filter(|l| !self.contracted[l.node as usize]).copied().collect();
        self.contracted[node as usize] = true;

        for from in &incoming {
            let max_shortcut_weight = match outgoing
                .iter()
                .filter(|to| to.node != from.node)
                .map(|to| from.weight + to.weight)
                .max_by(|a, b| a.total_cmp(b))
            {
                Some(weight) => weight,
                None => continue,
            };
            self.witness_search(from.node, max_shortcut_weight);

            for to in &outgoing {
                if to.node == from.node {
                    continue;
                }
                let shortcut_weight = from.weight + to.weight;
                if self.distances[to.node as usize] <= shortcut_weight {
                    continue;
                }
                self.insert_shortcut(node, from, to);
            }
        }
    }

    /// Distances from `source` in the remaining graph, up to `max_weight`.
    fn witness_search(&mut self, source: NodeId, max_weight: Weight) {
        self.distances.reset();
        self.queue.clear();
        self.distances.set(source as usize, 0.0);
        self.queue.push(WitnessState {
            key: NonNan::key(0.0),
            node: source,
        });

        let mut settled = 0;
        while let Some(WitnessState { key, node }) = self.queue.pop() {
            settled += 1;
            if key.value() > max_weight || settled > WITNESS_SETTLE_LIMIT {
                break;
            }
            if node != source && self.is_core(node) {
                continue;
            }
            for link in &self.nodes[node as usize].outgoing {
                if self.contracted[link.node as usize] || (self.is_core(node) && self.is_core(link.node)) {
                    continue;
                }
                let dist = key.value() + link.weight;
                if dist < self.distances[link.node as usize] {
                    self.distances.set(link.node as usize, dist);
                    self.queue.push_or_update(WitnessState {
                        key: NonNan::key(dist),
                        node: link.node,
                    });
                }
            }
        }
    }

    fn insert_shortcut(&mut self, via: NodeId, from: &Link, to: &Link) {
        let id = (self.num_base_edges + self.shortcuts.len()) as EdgeId;
        let shortcut = ShortcutData {
            from: from.node,
            to: to.node,
            via,
            skip_first: from.edge,
            skip_second: to.edge,
            weight: from.weight + to.weight,
            millis: from.millis.saturating_add(to.millis),
            distance: from.distance + to.distance,
            orig_first: from.orig_first,
            orig_last: to.orig_last,
        };
        self.shortcuts.push(shortcut);

        let link = Link {
            node: to.node,
            edge: id,
            weight: shortcut.weight,
            millis: shortcut.millis,
            distance: shortcut.distance,
            orig_first: shortcut.orig_first,
            orig_last: shortcut.orig_last,
        };
        insert_or_decrease(&mut self.nodes[from.node as usize].outgoing, link);
        insert_or_decrease(&mut self.nodes[to.node as usize].incoming, Link { node: from.node, ..link });
    }
}

/// Contract all nodes of `graph` in the given order. Levels are the ranks of the order.
pub fn contract<W: Weighting + ?Sized>(graph: Arc<RoadGraph>, weighting: &W, order: &NodeOrder) -> ChGraph {
    contract_partially(graph, weighting, order, 0)
}

/// Contract all but the `core_size` most important nodes.
pub fn contract_partially<W: Weighting + ?Sized>(graph: Arc<RoadGraph>, weighting: &W, order: &NodeOrder, core_size: usize) -> ChGraph {
    let n = graph.num_nodes();
    assert_eq!(order.len(), n);
    let core_size = core_size.min(n);
    let core_level = if core_size > 0 { Some((n - core_size) as Level) } else { None };

    let mut contraction = ContractionGraph::new(&graph, weighting, order, core_level);
    for &node in &order.order()[..n - core_size] {
        contraction.contract(node);
    }

    let shortcuts = contraction.shortcuts;
    ChGraph::new(graph, order.ranks().to_vec(), shortcuts, core_level, weighting.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighting::ShortestWeighting;

    // star with center 0
    fn star() -> Arc<RoadGraph> {
        let mut builder = RoadGraphBuilder::new(4);
        builder.two_way(0, 1, 1.0, 10.0);
        builder.two_way(0, 2, 2.0, 10.0);
        builder.one_way(3, 0, 3.0, 10.0);
        Arc::new(builder.build())
    }

    #[test]
    fn contracting_the_center_creates_shortcuts() {
        let ch = contract(star(), &ShortestWeighting, &NodeOrder::from_node_order(vec![0, 1, 2, 3]));
        let mut pairs: Vec<_> = ch.shortcuts().iter().map(|s| (s.from, s.to, s.weight)).collect();
        pairs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(pairs, vec![(1, 2, 3.0), (2, 1, 3.0), (3, 1, 4.0), (3, 2, 5.0)]);
        assert_eq!(ch.level(0), 0);
        assert_eq!(ch.core_level(), None);
        assert_eq!(ch.weighting_name(), "shortest");
    }

    #[test]
    fn witnesses_prevent_shortcuts() {
        let mut builder = RoadGraphBuilder::new(3);
        builder.two_way(0, 1, 1.0, 10.0);
        builder.two_way(1, 2, 1.0, 10.0);
        builder.two_way(0, 2, 1.5, 10.0);
        let ch = contract(Arc::new(builder.build()), &ShortestWeighting, &NodeOrder::identity(3));
        assert_eq!(ch.num_shortcuts(), 0);
    }

    #[test]
    fn core_nodes_are_not_contracted() {
        let ch = contract_partially(star(), &ShortestWeighting, &NodeOrder::from_node_order(vec![1, 2, 3, 0]), 2);
        assert_eq!(ch.core_level(), Some(2));
        assert!(ch.is_core(3) && ch.is_core(0));
        assert!(!ch.is_core(1));
        // contracting the leaves 1 and 2 never needs shortcuts
        assert_eq!(ch.num_shortcuts(), 0);
    }
}
