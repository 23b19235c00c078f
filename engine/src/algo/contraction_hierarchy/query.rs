//! Contraction Hierarchy point to point query.
//!
//! A bidirectional Dijkstra where both directions only relax edges leading up in the hierarchy.
//! Each direction stops on its own, once its smallest queue key reaches the best meeting weight.
//! The sum of both progresses can not be used: upward searches do not settle nodes along a shortest path in order.

use super::*;
use crate::algo::dijkstra::State;
use crate::util::in_range_option::InRangeOption;

/// One of the two upward searches.
#[derive(Debug)]
pub(crate) struct UpwardSearch {
    pub(crate) tree: ShortestPathTree,
    queue: IndexdMinHeap<State>,
    reverse: bool,
}

impl UpwardSearch {
    pub(crate) fn new(reverse: bool) -> Self {
        UpwardSearch {
            tree: ShortestPathTree::new(),
            queue: IndexdMinHeap::new(0),
            reverse,
        }
    }

    pub(crate) fn init(&mut self, node: NodeId, base: &mut SearchBase) {
        let root = self.tree.insert(node as TraversalId, SptEntry::root(node, 0.0, 0));
        self.queue.push(State { key: NonNan::key(0.0), entry: root });
        base.count_queue_push();
    }

    pub(crate) fn min_key(&self) -> Option<Weight> {
        self.queue.peek().map(|state| state.key.value())
    }

    pub(crate) fn pop(&mut self) -> Option<EntryId> {
        self.queue.pop().map(|state| state.entry)
    }

    /// Relax all upward edges of the settled entry `id`, calling `on_update` with every improved entry.
    pub(crate) fn relax<G: CHGraph, W: Weighting + ?Sized>(
        &mut self,
        graph: &G,
        weighting: &W,
        base: &mut SearchBase,
        id: EntryId,
        mut on_update: impl FnMut(EntryId, &SptEntry),
    ) {
        let entry = *self.tree.get(id);
        let level_filter = LevelFilter::new(graph);
        for edge in graph.edge_iter(entry.adj_node) {
            if !level_filter.accept(&edge) || !base.accept(&edge, entry.edge) {
                continue;
            }
            let weight = weighting.calc_weight(&edge, self.reverse, entry.original_edge);
            if weight == INFINITY {
                continue;
            }
            base.count_relaxed_arc();
            let weight = entry.weight + weight;
            let time = entry.time.saturating_add(weighting.calc_millis(&edge, self.reverse, entry.original_edge));

            let updated = match self.tree.lookup(edge.adj as TraversalId) {
                Some(existing) => {
                    let current = self.tree.get_mut(existing);
                    if weight >= current.weight {
                        continue;
                    }
                    current.weight = weight;
                    current.time = time;
                    current.edge = edge.edge;
                    current.original_edge = edge.orig_edge_last;
                    current.parent = InRangeOption::some(id);
                    if !self.queue.contains_index(existing as usize) {
                        base.count_queue_push();
                    }
                    self.queue.push_or_update(State {
                        key: NonNan::key(weight),
                        entry: existing,
                    });
                    existing
                }
                None => {
                    let new_entry = self.tree.insert(
                        edge.adj as TraversalId,
                        SptEntry {
                            edge: edge.edge,
                            original_edge: edge.orig_edge_last,
                            adj_node: edge.adj,
                            weight,
                            time,
                            parent: InRangeOption::some(id),
                            visited: false,
                        },
                    );
                    self.queue.push(State {
                        key: NonNan::key(weight),
                        entry: new_entry,
                    });
                    base.count_queue_push();
                    new_entry
                }
            };
            on_update(updated, self.tree.get(updated));
        }
    }
}

/// Point to point query on a fully contracted graph.
pub struct ChBidirectional<'a, G, W: ?Sized> {
    graph: &'a G,
    weighting: &'a W,
    base: SearchBase<'a>,
    forward: UpwardSearch,
    backward: UpwardSearch,
    best_weight: Weight,
    meeting: Option<(EntryId, EntryId)>,
}

impl<'a, G: CHGraph, W: Weighting + ?Sized> ChBidirectional<'a, G, W> {
    pub fn new(graph: &'a G, weighting: &'a W, traversal_mode: TraversalMode) -> Result<Self, SearchError> {
        if traversal_mode.is_edge_based() {
            return Err(SearchError::EdgeBasedChUnsupported);
        }
        if weighting.has_turn_costs() {
            return Err(SearchError::TurnCostsRequireEdgeBased {
                weighting: weighting.name().to_string(),
            });
        }
        Ok(ChBidirectional {
            graph,
            weighting,
            base: SearchBase::new(traversal_mode),
            forward: UpwardSearch::new(false),
            backward: UpwardSearch::new(true),
            best_weight: INFINITY,
            meeting: None,
        })
    }

    pub fn set_edge_filter(&mut self, filter: &'a (dyn EdgeFilter + Sync)) {
        self.base.set_edge_filter(filter);
    }

    pub fn stats(&self) -> SearchStats {
        self.base.stats()
    }

    pub fn is_max_visited_nodes_exceeded(&self) -> bool {
        self.base.is_max_visited_nodes_exceeded()
    }

    /// The direction is done once its queue is empty or cannot improve the best meeting weight anymore.
    fn direction_done(&self, search: &UpwardSearch) -> bool {
        search.min_key().map_or(true, |key| key >= self.best_weight)
    }

    fn update_meeting(&mut self, forward_entry: EntryId, backward_entry: EntryId) {
        let weight = self.forward.tree.get(forward_entry).weight + self.backward.tree.get(backward_entry).weight;
        if weight < self.best_weight {
            self.best_weight = weight;
            self.meeting = Some((forward_entry, backward_entry));
        }
    }

    /// Settle one entry of the given direction. Returns false if the node budget is exceeded.
    fn step(&mut self, reverse: bool) -> bool {
        let (search, other) = if reverse {
            (&mut self.backward, &self.forward)
        } else {
            (&mut self.forward, &self.backward)
        };
        let id = match search.pop() {
            Some(id) => id,
            None => return true,
        };
        self.base.count_visited_node();
        if self.base.is_max_visited_nodes_exceeded() {
            return false;
        }

        let mut candidates = Vec::new();
        let node = search.tree.get(id).adj_node;
        if let Some(other_entry) = other.tree.lookup(node as TraversalId) {
            candidates.push((id, other_entry));
        }
        search.relax(self.graph, self.weighting, &mut self.base, id, |updated, entry| {
            if let Some(other_entry) = other.tree.lookup(entry.adj_node as TraversalId) {
                candidates.push((updated, other_entry));
            }
        });

        for (own, other_entry) in candidates {
            if reverse {
                self.update_meeting(other_entry, own);
            } else {
                self.update_meeting(own, other_entry);
            }
        }
        true
    }
}

impl<'a, G: CHGraph, W: Weighting + ?Sized> RoutingAlgorithm for ChBidirectional<'a, G, W> {
    fn calc_path(&mut self, from: NodeId, to: NodeId) -> Result<Path, SearchError> {
        self.base.check_already_run()?;
        check_node(self.graph, from)?;
        check_node(self.graph, to)?;

        self.forward.init(from, &mut self.base);
        self.backward.init(to, &mut self.base);
        if from == to {
            self.best_weight = 0.0;
            self.meeting = Some((0, 0));
        }

        loop {
            let forward_done = self.direction_done(&self.forward);
            let backward_done = self.direction_done(&self.backward);
            let reverse = match (forward_done, backward_done) {
                (true, true) => break,
                (true, false) => true,
                (false, true) => false,
                (false, false) => self.backward.min_key() < self.forward.min_key(),
            };
            if !self.step(reverse) {
                self.base.finish();
                return Ok(self.base.create_empty_path());
            }
        }
        self.base.finish();

        match self.meeting {
            Some((forward_entry, backward_entry)) => {
                let mut path = Path::not_found();
                path.extract_bidirectional(self.graph, (&self.forward.tree, forward_entry), (&self.backward.tree, backward_entry))?;
                Ok(path)
            }
            None => Ok(self.base.create_empty_path()),
        }
    }

    fn visited_nodes(&self) -> usize {
        self.base.visited_nodes()
    }

    fn set_max_visited_nodes(&mut self, max_visited_nodes: usize) {
        self.base.set_max_visited_nodes(max_visited_nodes);
    }

    fn name(&self) -> &'static str {
        "ch_bidirectional"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::dijkstra::Dijkstra;
    use crate::weighting::{ChWeighting, ShortestWeighting};

    //  0 - 1 - 2 - 3
    //      |       |
    //      4 ----- 5
    fn graph() -> Arc<RoadGraph> {
        let mut builder = RoadGraphBuilder::new(6);
        builder.two_way(0, 1, 1.0, 10.0);
        builder.two_way(1, 2, 2.0, 10.0);
        builder.two_way(2, 3, 2.0, 10.0);
        builder.two_way(1, 4, 1.0, 10.0);
        builder.two_way(4, 5, 1.0, 10.0);
        builder.one_way(5, 3, 1.0, 10.0);
        Arc::new(builder.build())
    }

    #[test]
    fn matches_dijkstra_for_all_pairs() {
        let graph = graph();
        let ch = contract(graph.clone(), &ShortestWeighting, &NodeOrder::from_node_order(vec![4, 0, 2, 5, 1, 3]));
        let weighting = ChWeighting::new(ShortestWeighting);
        for from in 0..6 {
            for to in 0..6 {
                let mut dijkstra = Dijkstra::new(&*graph, &ShortestWeighting, TraversalMode::NodeBased).unwrap();
                let expected = dijkstra.calc_path(from, to).unwrap();
                let mut query = ChBidirectional::new(&ch, &weighting, TraversalMode::NodeBased).unwrap();
                let path = query.calc_path(from, to).unwrap();
                assert_eq!(path.is_found(), expected.is_found(), "{} -> {}", from, to);
                assert_eq!(path.weight(), expected.weight(), "{} -> {}", from, to);
                if path.is_found() {
                    assert_eq!(path.distance(), expected.distance());
                    assert_eq!(path.nodes().first(), Some(&from));
                    assert_eq!(path.nodes().last(), Some(&to));
                }
            }
        }
    }

    #[test]
    fn unpacks_shortcuts() {
        let graph = graph();
        let ch = contract(graph, &ShortestWeighting, &NodeOrder::from_node_order(vec![1, 4, 5, 2, 0, 3]));
        let weighting = ChWeighting::new(ShortestWeighting);
        let mut query = ChBidirectional::new(&ch, &weighting, TraversalMode::NodeBased).unwrap();
        let path = query.calc_path(0, 3).unwrap();
        assert_eq!(path.nodes(), &[0, 1, 4, 5, 3]);
        assert_eq!(path.edges(), &[0, 3, 4, 5]);
        assert_eq!(path.weight(), 4.0);
        assert_eq!(query.calc_path(0, 3), Err(SearchError::AlreadyRun));
    }

    #[test]
    fn rejects_edge_based_traversal() {
        let ch = contract(graph(), &ShortestWeighting, &NodeOrder::identity(6));
        let weighting = ChWeighting::new(ShortestWeighting);
        assert!(matches!(
            ChBidirectional::new(&ch, &weighting, TraversalMode::EdgeBased),
            Err(SearchError::EdgeBasedChUnsupported)
        ));
    }
}
