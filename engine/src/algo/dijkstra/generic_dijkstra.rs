use super::*;
use crate::algo::a_star::{Potential, ZeroPotential};
use crate::util::in_range_option::InRangeOption;
use crate::weighting::Weighting;
use rustc_hash::FxHashSet;
use std::marker::PhantomData;

/// Tentative label of an entry: accumulated weight and time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Label {
    pub weight: Weight,
    pub time: Millis,
}

/// How edge weights are evaluated. The search loop is the same for all variants.
pub trait DijkstraOps {
    const NAME: &'static str;
    const GOAL_DIRECTED_NAME: &'static str;

    /// Fails if the weighting can not be used with these ops.
    fn check<W: Weighting + ?Sized>(weighting: &W) -> Result<(), SearchError>;

    /// Label at the end of `edge` when extending `parent`. `None` if the edge can not be used.
    fn link<W: Weighting + ?Sized>(weighting: &W, edge: &EdgeState, reverse: bool, parent: &SptEntry) -> Option<Label>;

    /// Apply `linked` to `entry` if it improves it.
    #[inline(always)]
    fn merge(entry: &mut SptEntry, linked: Label) -> bool {
        if linked.weight < entry.weight {
            entry.weight = linked.weight;
            entry.time = linked.time;
            return true;
        }
        false
    }
}

/// Static weights, `time` accumulates travel time.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticOps;

impl DijkstraOps for StaticOps {
    const NAME: &'static str = "dijkstra";
    const GOAL_DIRECTED_NAME: &'static str = "astar";

    fn check<W: Weighting + ?Sized>(_weighting: &W) -> Result<(), SearchError> {
        Ok(())
    }

    #[inline(always)]
    fn link<W: Weighting + ?Sized>(weighting: &W, edge: &EdgeState, reverse: bool, parent: &SptEntry) -> Option<Label> {
        let weight = weighting.calc_weight(edge, reverse, parent.original_edge);
        if weight == INFINITY {
            return None;
        }
        Some(Label {
            weight: parent.weight + weight,
            time: parent.time.saturating_add(weighting.calc_millis(edge, reverse, parent.original_edge)),
        })
    }
}

/// A single query Dijkstra search, optionally goal directed with a potential.
///
/// Forward searches explore from the source along edges in travel direction, reverse searches
/// explore from the target against the travel direction (arrive-by for time-dependent ops).
pub struct GenericDijkstra<'a, G, W: ?Sized, Ops = StaticOps, P = ZeroPotential> {
    graph: &'a G,
    weighting: &'a W,
    base: SearchBase<'a>,
    tree: ShortestPathTree,
    queue: IndexdMinHeap<State>,
    potential: P,
    use_potential: bool,
    reverse: bool,
    _ops: PhantomData<Ops>,
}

impl<'a, G: EdgeIterable, W: Weighting + ?Sized, Ops: DijkstraOps> GenericDijkstra<'a, G, W, Ops, ZeroPotential> {
    pub fn new(graph: &'a G, weighting: &'a W, traversal_mode: TraversalMode) -> Result<Self, SearchError> {
        Self::with_potential(graph, weighting, traversal_mode, ZeroPotential)
    }
}

impl<'a, G: EdgeIterable, W: Weighting + ?Sized, Ops: DijkstraOps, P: Potential> GenericDijkstra<'a, G, W, Ops, P> {
    pub fn with_potential(graph: &'a G, weighting: &'a W, traversal_mode: TraversalMode, potential: P) -> Result<Self, SearchError> {
        if weighting.has_turn_costs() && !traversal_mode.is_edge_based() {
            return Err(SearchError::TurnCostsRequireEdgeBased {
                weighting: weighting.name().to_string(),
            });
        }
        Ops::check(weighting)?;

        Ok(GenericDijkstra {
            graph,
            weighting,
            base: SearchBase::new(traversal_mode),
            tree: ShortestPathTree::new(),
            queue: IndexdMinHeap::new(0),
            potential,
            use_potential: P::GOAL_DIRECTED,
            reverse: false,
            _ops: PhantomData,
        })
    }

    /// Explore backward from the target.
    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.reverse = reverse;
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn set_edge_filter(&mut self, filter: &'a (dyn EdgeFilter + Sync)) {
        self.base.set_edge_filter(filter);
    }

    pub fn is_max_visited_nodes_exceeded(&self) -> bool {
        self.base.is_max_visited_nodes_exceeded()
    }

    pub fn stats(&self) -> SearchStats {
        self.base.stats()
    }

    pub fn tree(&self) -> &ShortestPathTree {
        &self.tree
    }

    pub fn graph(&self) -> &'a G {
        self.graph
    }

    /// Point to point query departing (or for reverse searches arriving) at `at`.
    /// The start time only matters for time-dependent ops.
    pub fn calc_path_at(&mut self, from: NodeId, to: NodeId, at: Millis) -> Result<Path, SearchError> {
        self.base.check_already_run()?;
        check_node(self.graph, from)?;
        check_node(self.graph, to)?;

        // reverse queries start at the target, so the potential has to aim at the source
        let (start, goal) = if self.reverse { (to, from) } else { (from, to) };
        if self.use_potential {
            self.potential.init(goal);
        }
        let result = self.run(start, at, |_, entry| entry.adj_node == goal);
        self.base.finish();

        match result {
            Some(entry) => {
                let mut path = Path::not_found();
                path.extract(self.graph, &self.tree, entry, self.reverse)?;
                Ok(path)
            }
            None => Ok(self.base.create_empty_path()),
        }
    }

    /// Settle `targets` from a single root, stopping as soon as all of them are settled.
    /// For reverse searches `from` is the common end of all paths.
    /// Potentials are not used, they can only aim at a single target.
    pub fn calc_targets_at(&mut self, from: NodeId, targets: &[NodeId], at: Millis) -> Result<TargetEntries, SearchError> {
        self.base.check_already_run()?;
        check_node(self.graph, from)?;
        for &target in targets {
            check_node(self.graph, target)?;
        }
        self.use_potential = false;

        let mut remaining: FxHashSet<NodeId> = targets.iter().copied().collect();
        let mut result = TargetEntries::new();
        if !remaining.is_empty() {
            let done = self.run(from, at, |id, entry| {
                if remaining.remove(&entry.adj_node) {
                    result.insert(entry.adj_node, id);
                }
                remaining.is_empty()
            });
            if done.is_none() && self.base.is_max_visited_nodes_exceeded() {
                result.set_budget_exceeded();
            }
        }
        self.base.finish();
        Ok(result)
    }

    /// One path per target, in the order of `targets`. Unreachable targets get a not found path.
    pub fn calc_paths(&mut self, from: NodeId, targets: &[NodeId]) -> Result<Vec<Path>, SearchError> {
        let entries = self.calc_targets_at(from, targets, 0)?;
        let mut paths = Vec::with_capacity(targets.len());
        for &target in targets {
            let mut path = Path::not_found();
            if let Some(entry) = entries.get(target) {
                path.extract(self.graph, &self.tree, entry, self.reverse)?;
            }
            paths.push(path);
        }
        Ok(paths)
    }

    #[inline]
    fn key(&mut self, weight: Weight, node: NodeId) -> Option<NonNan> {
        if self.use_potential {
            self.potential.potential(node).map(|pot| NonNan::key(weight + pot))
        } else {
            Some(NonNan::key(weight))
        }
    }

    /// Settle entries in queue order until `finished` holds for a settled entry, which is then returned.
    /// Returns `None` if the queue runs empty or the node budget is exceeded.
    fn run(&mut self, start: NodeId, at: Millis, mut finished: impl FnMut(EntryId, &SptEntry) -> bool) -> Option<EntryId> {
        let root_id = self.base.traversal_mode().root_id(start);
        let root = self.tree.insert(root_id, SptEntry::root(start, 0.0, at));
        let key = self.key(0.0, start)?;
        self.queue.push(State { key, entry: root });
        self.base.count_queue_push();

        while let Some(State { entry: id, .. }) = self.queue.pop() {
            self.base.count_visited_node();
            if self.base.is_max_visited_nodes_exceeded() {
                return None;
            }
            let entry = *self.tree.get(id);
            if finished(id, &entry) {
                return Some(id);
            }
            self.relax(id, &entry);
        }

        None
    }

    fn relax(&mut self, id: EntryId, entry: &SptEntry) {
        let graph = self.graph;
        for edge in graph.edge_iter(entry.adj_node) {
            if !self.base.accept(&edge, entry.edge) {
                continue;
            }
            let linked = match Ops::link(self.weighting, &edge, self.reverse, entry) {
                Some(linked) => linked,
                None => continue,
            };
            self.base.count_relaxed_arc();

            let traversal_id = self.base.traversal_mode().create_traversal_id(&edge, self.reverse);
            match self.tree.lookup(traversal_id) {
                Some(existing) => {
                    let current = self.tree.get_mut(existing);
                    if !Ops::merge(current, linked) {
                        continue;
                    }
                    current.edge = edge.edge;
                    current.original_edge = edge.orig_edge_last;
                    current.parent = InRangeOption::some(id);
                    if let Some(key) = self.key(linked.weight, edge.adj) {
                        if !self.queue.contains_index(existing as usize) {
                            self.base.count_queue_push();
                        }
                        self.queue.push_or_update(State { key, entry: existing });
                    }
                }
                None => {
                    let key = match self.key(linked.weight, edge.adj) {
                        Some(key) => key,
                        None => continue,
                    };
                    let new_entry = self.tree.insert(
                        traversal_id,
                        SptEntry {
                            edge: edge.edge,
                            original_edge: edge.orig_edge_last,
                            adj_node: edge.adj,
                            weight: linked.weight,
                            time: linked.time,
                            parent: InRangeOption::some(id),
                            visited: false,
                        },
                    );
                    self.queue.push(State { key, entry: new_entry });
                    self.base.count_queue_push();
                }
            }
        }
    }
}

impl<'a, G: EdgeIterable, W: Weighting + ?Sized, Ops: DijkstraOps, P: Potential> RoutingAlgorithm for GenericDijkstra<'a, G, W, Ops, P> {
    fn calc_path(&mut self, from: NodeId, to: NodeId) -> Result<Path, SearchError> {
        self.calc_path_at(from, to, 0)
    }

    fn visited_nodes(&self) -> usize {
        self.base.visited_nodes()
    }

    fn set_max_visited_nodes(&mut self, max_visited_nodes: usize) {
        self.base.set_max_visited_nodes(max_visited_nodes);
    }

    fn name(&self) -> &'static str {
        if P::GOAL_DIRECTED {
            Ops::GOAL_DIRECTED_NAME
        } else {
            Ops::NAME
        }
    }
}

impl<'a, G: EdgeIterable, W: Weighting + ?Sized, Ops: DijkstraOps, P: Potential> OneToMany for GenericDijkstra<'a, G, W, Ops, P> {
    fn calc_targets(&mut self, from: NodeId, targets: &[NodeId]) -> Result<TargetEntries, SearchError> {
        self.calc_targets_at(from, targets, 0)
    }

    fn tree(&self) -> &ShortestPathTree {
        &self.tree
    }

    fn is_reverse(&self) -> bool {
        self.reverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighting::{FastestWeighting, ShortestWeighting, TurnCostWeighting};

    //   0 --1-- 1 --1-- 2
    //   |               |
    //   +------5--------+
    fn graph() -> RoadGraph {
        let mut builder = RoadGraphBuilder::new(4);
        builder.two_way(0, 1, 1.0, 10.0);
        builder.two_way(1, 2, 1.0, 10.0);
        builder.two_way(0, 2, 5.0, 10.0);
        builder.one_way(3, 0, 1.0, 10.0);
        builder.build()
    }

    #[test]
    fn finds_shortest_path() {
        let graph = graph();
        let mut dijkstra = Dijkstra::new(&graph, &ShortestWeighting, TraversalMode::NodeBased).unwrap();
        let path = dijkstra.calc_path(0, 2).unwrap();
        assert!(path.is_found());
        assert_eq!(path.weight(), 2.0);
        assert_eq!(path.nodes(), &[0, 1, 2]);
        assert_eq!(dijkstra.name(), "dijkstra");
        assert_eq!(dijkstra.calc_path(0, 2), Err(SearchError::AlreadyRun));
    }

    #[test]
    fn respects_one_ways_in_both_directions() {
        let graph = graph();
        let mut dijkstra = Dijkstra::new(&graph, &ShortestWeighting, TraversalMode::NodeBased).unwrap();
        assert!(!dijkstra.calc_path(0, 3).unwrap().is_found());

        let mut reverse = Dijkstra::new(&graph, &ShortestWeighting, TraversalMode::NodeBased).unwrap().reverse();
        let path = reverse.calc_path(3, 2).unwrap();
        assert_eq!(path.nodes(), &[3, 0, 1, 2]);
        assert_eq!(path.weight(), 3.0);
        assert!(reverse.is_reverse());
    }

    #[test]
    fn one_to_many_settles_all_targets() {
        let graph = graph();
        let mut dijkstra = Dijkstra::new(&graph, &ShortestWeighting, TraversalMode::NodeBased).unwrap();
        let paths = dijkstra.calc_paths(1, &[2, 3, 0]).unwrap();
        assert_eq!(paths.iter().map(|p| p.is_found()).collect::<Vec<_>>(), vec![true, false, true]);
        assert_eq!(paths[2].weight(), 1.0);
    }

    #[test]
    fn turn_costs_need_edge_based_traversal() {
        let graph = graph();
        let weighting = TurnCostWeighting::new(FastestWeighting::new(10.0));
        assert!(matches!(
            Dijkstra::new(&graph, &weighting, TraversalMode::NodeBased),
            Err(SearchError::TurnCostsRequireEdgeBased { .. })
        ));
        assert!(Dijkstra::new(&graph, &weighting, TraversalMode::EdgeBased).is_ok());
    }

    #[test]
    fn forbidden_turn_is_avoided_edge_based() {
        let graph = graph();
        let mut weighting = TurnCostWeighting::new(ShortestWeighting);
        // 0 -> 1 -> 2 is not allowed, the detour over the long edge is taken
        weighting.forbid_turn(0, 1, 1);
        let mut dijkstra = Dijkstra::new(&graph, &weighting, TraversalMode::EdgeBased).unwrap();
        let path = dijkstra.calc_path(0, 2).unwrap();
        assert_eq!(path.edges(), &[2]);
        assert_eq!(path.weight(), 5.0);
    }

    #[test]
    fn invalid_nodes_are_rejected() {
        let graph = graph();
        let mut dijkstra = Dijkstra::new(&graph, &ShortestWeighting, TraversalMode::NodeBased).unwrap();
        assert_eq!(dijkstra.calc_path(0, 9), Err(SearchError::NodeOutOfRange { node: 9, num_nodes: 4 }));
    }
}
