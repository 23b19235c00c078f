//! Distance, travel time and weight of single matrix cells.
//!
//! All metrics are summed over original edges, shortcuts are unpacked first.
//! Weights are evaluated again with the profile weighting, passing the previous original edge along.

use crate::algo::path::{tree_edges, Path};
use crate::datastr::{graph::*, shortest_path_tree::*};
use crate::weighting::Weighting;

/// Metrics of one source destination pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairMetrics {
    /// meters
    pub distance: f64,
    pub millis: Millis,
    pub weight: Weight,
}

impl PairMetrics {
    pub fn seconds(&self) -> f64 {
        self.millis as f64 / 1000.0
    }
}

/// Sum up original edges given in travel order.
pub fn accumulate<W: Weighting + ?Sized>(weighting: &W, edges: impl IntoIterator<Item = EdgeState>) -> PairMetrics {
    let mut metrics = PairMetrics::default();
    let mut prev_edge = NO_EDGE;
    for edge in edges {
        metrics.distance += edge.distance;
        metrics.millis += weighting.calc_millis(&edge, false, prev_edge);
        metrics.weight += weighting.calc_weight(&edge, false, prev_edge);
        prev_edge = edge.edge;
    }
    metrics
}

/// Metrics of the tree path between the root and `entry`.
/// For reverse trees, the path leads from `entry` to the root.
pub fn from_tree<G: EdgeIterable, W: Weighting + ?Sized>(graph: &G, weighting: &W, tree: &ShortestPathTree, entry: EntryId, reverse: bool) -> PairMetrics {
    let mut states = tree_edges(graph, tree, entry, reverse);
    if !reverse {
        states.reverse();
    }
    let mut original = Vec::with_capacity(states.len());
    for state in &states {
        graph.unpack_edge(state, &mut original);
    }
    accumulate(weighting, original)
}

/// Metrics of an already unpacked path on `graph`.
pub fn from_path<G: EdgeIterable, W: Weighting + ?Sized>(graph: &G, weighting: &W, path: &Path) -> PairMetrics {
    let states = path.edges().iter().zip(&path.nodes()[1..]).map(|(&edge, &adj)| graph.edge_state(edge, adj));
    accumulate(weighting, states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{dijkstra::Dijkstra, OneToMany, RoutingAlgorithm, TraversalMode};
    use crate::algo::{contraction_hierarchy::contract, rphast::*};
    use crate::datastr::node_order::NodeOrder;
    use crate::weighting::{ChWeighting, FastestWeighting};
    use std::sync::Arc;

    // 0 -> 1 -> 2 -> 3, 100m each at 36 km/h
    fn line() -> Arc<RoadGraph> {
        let mut builder = RoadGraphBuilder::new(4);
        builder.one_way(0, 1, 100.0, 36.0);
        builder.one_way(1, 2, 100.0, 36.0);
        builder.one_way(2, 3, 100.0, 36.0);
        Arc::new(builder.build())
    }

    #[test]
    fn sums_up_tree_paths() {
        let graph = line();
        let weighting = FastestWeighting::new(130.0);
        let mut dijkstra = Dijkstra::new(&*graph, &weighting, TraversalMode::NodeBased).unwrap();
        let entries = dijkstra.calc_targets(0, &[3]).unwrap();
        let metrics = from_tree(&*graph, &weighting, dijkstra.tree(), entries.get(3).unwrap(), false);
        assert_eq!(metrics.distance, 300.0);
        assert_eq!(metrics.millis, 30_000);
        assert_eq!(metrics.seconds(), 30.0);
        assert!((metrics.weight - 30.0).abs() < 1e-9);
    }

    #[test]
    fn reverse_trees_lead_to_the_root() {
        let graph = line();
        let weighting = FastestWeighting::new(130.0);
        let mut dijkstra = Dijkstra::new(&*graph, &weighting, TraversalMode::NodeBased).unwrap().reverse();
        let entries = dijkstra.calc_targets(3, &[1]).unwrap();
        let metrics = from_tree(&*graph, &weighting, dijkstra.tree(), entries.get(1).unwrap(), true);
        assert_eq!(metrics.distance, 200.0);
        assert_eq!(metrics.millis, 20_000);
    }

    #[test]
    fn unpacks_shortcuts_of_rphast_trees() {
        let graph = line();
        let weighting = FastestWeighting::new(130.0);
        let ch = contract(graph.clone(), &weighting, &NodeOrder::from_node_order(vec![1, 2, 0, 3]));
        assert!(ch.num_shortcuts() > 0);
        let ch_weighting = ChWeighting::new(weighting.clone());
        let target_tree = RphastTargetTree::new(&ch, &ch_weighting, &[3]).unwrap();
        let mut rphast = Rphast::new(&ch, &ch_weighting, &target_tree).unwrap();
        let entries = rphast.calc_targets(0, &[3]).unwrap();
        let metrics = from_tree(&ch, &weighting, rphast.tree(), entries.get(3).unwrap(), false);
        assert_eq!(metrics.distance, 300.0);
        assert_eq!(metrics.millis, 30_000);

        let mut plain = Dijkstra::new(&*graph, &weighting, TraversalMode::NodeBased).unwrap();
        let path = plain.calc_path(0, 3).unwrap();
        assert_eq!(from_path(&*graph, &weighting, &path), metrics);
    }
}
