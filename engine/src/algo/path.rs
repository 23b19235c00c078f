//! Routes extracted from search trees.

use super::*;

/// Result of a point to point query.
/// A path which was not found has weight 0 and no edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    found: bool,
    /// Original edges in travel order, shortcuts unpacked.
    edges: Vec<EdgeId>,
    nodes: Vec<NodeId>,
    distance: f64,
    time: Millis,
    weight: Weight,
}

impl Path {
    pub fn not_found() -> Path {
        Path {
            found: false,
            edges: Vec::new(),
            nodes: Vec::new(),
            distance: 0.0,
            time: 0,
            weight: 0.0,
        }
    }

    pub fn is_found(&self) -> bool {
        self.found
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Meters
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn time(&self) -> Millis {
        self.time
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    /// Fill this path from the parent chain of `entry`.
    /// The chain is walked towards the root and reversed, unless the tree was grown backward from the target.
    pub fn extract<G: EdgeIterable>(&mut self, graph: &G, tree: &ShortestPathTree, entry: EntryId, reverse: bool) -> Result<(), SearchError> {
        if self.found {
            return Err(SearchError::PathAlreadyExtracted);
        }
        let terminal = tree.get(entry);
        let root = tree.path_to_root(entry).last().map_or(terminal, |(_, root)| root);

        let mut states = tree_edges(graph, tree, entry, reverse);
        if !reverse {
            states.reverse();
        }
        let start = if reverse { terminal.adj_node } else { root.adj_node };
        self.append_states(graph, start, &states);

        self.weight = terminal.weight;
        self.time = (terminal.time - root.time).abs();
        self.found = true;
        Ok(())
    }

    /// Fill this path from a forward tree entry and a backward tree entry at the same meeting node.
    pub fn extract_bidirectional<G: EdgeIterable>(
        &mut self,
        graph: &G,
        (forward_tree, forward_entry): (&ShortestPathTree, EntryId),
        (backward_tree, backward_entry): (&ShortestPathTree, EntryId),
    ) -> Result<(), SearchError> {
        if self.found {
            return Err(SearchError::PathAlreadyExtracted);
        }
        let forward = forward_tree.get(forward_entry);
        let backward = backward_tree.get(backward_entry);
        debug_assert_eq!(forward.adj_node, backward.adj_node);

        let mut states = tree_edges(graph, forward_tree, forward_entry, false);
        states.reverse();
        states.extend(tree_edges(graph, backward_tree, backward_entry, true));
        let start = forward_tree.path_to_root(forward_entry).last().map_or(forward.adj_node, |(_, root)| root.adj_node);
        self.append_states(graph, start, &states);

        let forward_root_time = forward_tree.path_to_root(forward_entry).last().map_or(forward.time, |(_, root)| root.time);
        let backward_root_time = backward_tree.path_to_root(backward_entry).last().map_or(backward.time, |(_, root)| root.time);
        self.weight = forward.weight + backward.weight;
        self.time = (forward.time - forward_root_time).abs() + (backward.time - backward_root_time).abs();
        self.found = true;
        Ok(())
    }

    fn append_states<G: EdgeIterable>(&mut self, graph: &G, start: NodeId, states: &[EdgeState]) {
        let mut unpacked = Vec::new();
        for state in states {
            graph.unpack_edge(state, &mut unpacked);
        }
        self.nodes.push(start);
        for edge in unpacked {
            debug_assert_eq!(Some(&edge.base), self.nodes.last());
            self.edges.push(edge.edge);
            self.nodes.push(edge.adj);
            self.distance += edge.distance;
        }
    }
}

/// Edges of the parent chain of `entry`, starting at `entry`, each in travel direction.
pub(crate) fn tree_edges<G: EdgeIterable>(graph: &G, tree: &ShortestPathTree, entry: EntryId, reverse: bool) -> Vec<EdgeState> {
    tree.path_to_root(entry)
        .filter(|(_, e)| !e.is_root())
        .map(|(_, e)| graph.edge_state(e.edge, e.adj_node).in_travel_direction(reverse))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::in_range_option::InRangeOption;

    fn line() -> RoadGraph {
        let mut builder = RoadGraphBuilder::new(3);
        builder.two_way(0, 1, 10.0, 36.0);
        builder.two_way(1, 2, 20.0, 36.0);
        builder.build()
    }

    fn chain(tree: &mut ShortestPathTree, nodes: &[(NodeId, EdgeId)], step: Weight) -> EntryId {
        let mut id = tree.insert(nodes[0].0 as TraversalId, SptEntry::root(nodes[0].0, 0.0, 0));
        for (i, &(node, edge)) in nodes.iter().enumerate().skip(1) {
            id = tree.insert(
                node as TraversalId,
                SptEntry {
                    edge,
                    original_edge: edge,
                    adj_node: node,
                    weight: step * i as f64,
                    time: 1000 * i as Millis,
                    parent: InRangeOption::some(id),
                    visited: false,
                },
            );
        }
        id
    }

    #[test]
    fn forward_tree_is_reversed() {
        let graph = line();
        let mut tree = ShortestPathTree::new();
        let target = chain(&mut tree, &[(0, NO_EDGE), (1, 0), (2, 1)], 1.5);
        let mut path = Path::not_found();
        path.extract(&graph, &tree, target, false).unwrap();
        assert!(path.is_found());
        assert_eq!(path.nodes(), &[0, 1, 2]);
        assert_eq!(path.edges(), &[0, 1]);
        assert_eq!(path.distance(), 30.0);
        assert_eq!(path.weight(), 3.0);
        assert_eq!(path.time(), 2000);
        assert_eq!(path.extract(&graph, &tree, target, false), Err(SearchError::PathAlreadyExtracted));
    }

    #[test]
    fn backward_tree_is_in_travel_order() {
        let graph = line();
        let mut tree = ShortestPathTree::new();
        let source = chain(&mut tree, &[(2, NO_EDGE), (1, 1), (0, 0)], 1.0);
        let mut path = Path::not_found();
        path.extract(&graph, &tree, source, true).unwrap();
        assert_eq!(path.nodes(), &[0, 1, 2]);
        assert_eq!(path.edges(), &[0, 1]);
    }

    #[test]
    fn bidirectional_paths_are_joined_at_the_meeting_node() {
        let graph = line();
        let mut forward = ShortestPathTree::new();
        let meet_fw = chain(&mut forward, &[(0, NO_EDGE), (1, 0)], 1.0);
        let mut backward = ShortestPathTree::new();
        let meet_bw = chain(&mut backward, &[(2, NO_EDGE), (1, 1)], 2.0);
        let mut path = Path::not_found();
        path.extract_bidirectional(&graph, (&forward, meet_fw), (&backward, meet_bw)).unwrap();
        assert_eq!(path.nodes(), &[0, 1, 2]);
        assert_eq!(path.weight(), 3.0);
        assert_eq!(path.time(), 2000);
    }
}
