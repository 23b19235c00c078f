//! Restricted PHAST: one source to many targets on a contraction hierarchy.
//!
//! The targets are selected once, `RphastTargetTree` holds every node from which some target can be reached
//! by going down the hierarchy, together with these down edges, sorted by descending level.
//! Every query is an upward Dijkstra from the source over the full graph, followed by a linear downward sweep
//! over the selection only. The target tree is immutable and can be shared by parallel queries.

use super::*;
use crate::algo::contraction_hierarchy::query::UpwardSearch;
use crate::datastr::index_heap::*;
use crate::util::in_range_option::InRangeOption;
use crate::weighting::Weighting;

#[derive(Copy, Clone, Eq, PartialEq, Debug, PartialOrd, Ord)]
struct SelectionState {
    level: Level,
    node: NodeId,
}

impl Indexing for SelectionState {
    #[inline]
    fn as_index(&self) -> usize {
        self.node as usize
    }
}

/// The part of the hierarchy relevant for a fixed set of targets.
#[derive(Debug, Clone)]
pub struct RphastTargetTree {
    targets: Vec<NodeId>,
    // selected nodes, highest level first
    nodes: Vec<NodeId>,
    local_ids: FxHashMap<NodeId, NodeId>,
    first_down: Vec<EdgeId>,
    // down edges in travel direction
    down: Vec<EdgeState>,
}

impl RphastTargetTree {
    /// Select all nodes reachable from `targets` by upward edges in the reverse graph.
    pub fn new<G: CHGraph, W: Weighting + ?Sized>(graph: &G, weighting: &W, targets: &[NodeId]) -> Result<Self, SearchError> {
        for &target in targets {
            check_node(graph, target)?;
        }
        let mut queue = IndexdMinHeap::new(graph.num_nodes());
        for &node in targets {
            queue.push_unless_contained(SelectionState { level: graph.level(node), node });
        }

        let mut nodes = Vec::new();
        let mut down = Vec::new();
        while let Some(SelectionState { node, level }) = queue.pop() {
            nodes.push(node);
            for edge in graph.edge_iter(node) {
                // strictly up, even between core nodes, so the selection order is a topological order
                if graph.level(edge.adj) <= level || weighting.calc_weight(&edge, true, NO_EDGE) == INFINITY {
                    continue;
                }
                queue.push_unless_contained(SelectionState {
                    level: graph.level(edge.adj),
                    node: edge.adj,
                });
                down.push(edge.in_travel_direction(true));
            }
        }

        // levels grow along the selection order, turn it around so the sweep goes top down
        nodes.reverse();
        let local_ids: FxHashMap<NodeId, NodeId> = nodes.iter().enumerate().map(|(local, &node)| (node, local as NodeId)).collect();
        down.sort_by_key(|edge| local_ids[&edge.base]);
        let mut first_down = vec![0; nodes.len() + 1];
        for edge in &down {
            first_down[local_ids[&edge.base] as usize + 1] += 1;
        }
        for local in 1..first_down.len() {
            first_down[local] += first_down[local - 1];
        }

        Ok(RphastTargetTree {
            targets: targets.to_vec(),
            nodes,
            local_ids,
            first_down,
            down,
        })
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    pub fn num_selected_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.local_ids.contains_key(&node)
    }

    fn down_edges(&self, local: usize) -> &[EdgeState] {
        &self.down[self.first_down[local] as usize..self.first_down[local + 1] as usize]
    }
}

/// One query against a shared `RphastTargetTree`. The graph has to be fully contracted.
pub struct Rphast<'a, G, W: ?Sized> {
    graph: &'a G,
    weighting: &'a W,
    target_tree: &'a RphastTargetTree,
    base: SearchBase<'a>,
    upward: UpwardSearch,
    highest_node: Option<NodeId>,
}

impl<'a, G: CHGraph, W: Weighting + ?Sized> Rphast<'a, G, W> {
    pub fn new(graph: &'a G, weighting: &'a W, target_tree: &'a RphastTargetTree) -> Result<Self, SearchError> {
        if weighting.has_turn_costs() {
            return Err(SearchError::TurnCostsRequireEdgeBased {
                weighting: weighting.name().to_string(),
            });
        }
        Ok(Rphast {
            graph,
            weighting,
            target_tree,
            base: SearchBase::new(TraversalMode::NodeBased),
            upward: UpwardSearch::new(false),
            highest_node: None,
        })
    }

    /// The node of highest level settled by the upward sweep.
    pub fn highest_node(&self) -> Option<NodeId> {
        self.highest_node
    }

    pub fn stats(&self) -> SearchStats {
        self.base.stats()
    }

    /// Returns false if the node budget was exceeded.
    fn upward_sweep(&mut self, from: NodeId) -> bool {
        self.upward.init(from, &mut self.base);
        while let Some(id) = self.upward.pop() {
            self.base.count_visited_node();
            if self.base.is_max_visited_nodes_exceeded() {
                return false;
            }
            let node = self.upward.tree.get(id).adj_node;
            if self.highest_node.map_or(true, |highest| self.graph.level(node) > self.graph.level(highest)) {
                self.highest_node = Some(node);
            }
            self.upward.relax(self.graph, self.weighting, &mut self.base, id, |_, _| ());
        }
        true
    }

    /// Returns false if the node budget was exceeded.
    fn downward_sweep(&mut self) -> bool {
        let tree = &mut self.upward.tree;
        for (local, &node) in self.target_tree.nodes.iter().enumerate() {
            // selected nodes neither touched by the upward sweep nor by a higher selected node stay unreached
            let id = match tree.lookup(node as TraversalId) {
                Some(id) => id,
                None => continue,
            };
            self.base.count_visited_node();
            if self.base.is_max_visited_nodes_exceeded() {
                return false;
            }
            let entry = {
                let entry = tree.get_mut(id);
                entry.visited = true;
                *entry
            };

            for down in self.target_tree.down_edges(local) {
                if !self.base.accept(down, entry.edge) {
                    continue;
                }
                let weight = self.weighting.calc_weight(down, false, entry.original_edge);
                if weight == INFINITY {
                    continue;
                }
                self.base.count_relaxed_arc();
                let weight = entry.weight + weight;
                let time = entry.time.saturating_add(self.weighting.calc_millis(down, false, entry.original_edge));
                match tree.lookup(down.adj as TraversalId) {
                    Some(existing) => {
                        let current = tree.get_mut(existing);
                        debug_assert!(!current.visited);
                        if weight < current.weight {
                            current.weight = weight;
                            current.time = time;
                            current.edge = down.edge;
                            current.original_edge = down.orig_edge_last;
                            current.parent = InRangeOption::some(id);
                        }
                    }
                    None => {
                        tree.insert(
                            down.adj as TraversalId,
                            SptEntry {
                                edge: down.edge,
                                original_edge: down.orig_edge_last,
                                adj_node: down.adj,
                                weight,
                                time,
                                parent: InRangeOption::some(id),
                                visited: false,
                            },
                        );
                    }
                }
            }
        }
        true
    }
}

impl<'a, G: CHGraph, W: Weighting + ?Sized> OneToMany for Rphast<'a, G, W> {
    fn calc_targets(&mut self, from: NodeId, targets: &[NodeId]) -> Result<TargetEntries, SearchError> {
        self.base.check_already_run()?;
        check_node(self.graph, from)?;
        if let Some(&node) = targets.iter().find(|&&node| !self.target_tree.contains(node)) {
            return Err(SearchError::TargetNotSelected { node });
        }

        let mut result = TargetEntries::new();
        let completed = self.upward_sweep(from) && self.downward_sweep();
        self.base.finish();
        if !completed {
            result.set_budget_exceeded();
            return Ok(result);
        }

        for &target in targets {
            if let Some(id) = self.upward.tree.lookup(target as TraversalId) {
                result.insert(target, id);
            }
        }
        Ok(result)
    }

    fn tree(&self) -> &ShortestPathTree {
        &self.upward.tree
    }
}

impl<'a, G: CHGraph, W: Weighting + ?Sized> RoutingAlgorithm for Rphast<'a, G, W> {
    fn calc_path(&mut self, _from: NodeId, _to: NodeId) -> Result<Path, SearchError> {
        Err(SearchError::NoSinglePath)
    }

    fn visited_nodes(&self) -> usize {
        self.base.visited_nodes()
    }

    fn set_max_visited_nodes(&mut self, max_visited_nodes: usize) {
        self.base.set_max_visited_nodes(max_visited_nodes);
    }

    fn name(&self) -> &'static str {
        "rphast"
    }
}
