//! Many-to-many queries on a partially contracted graph with per-request edge filters.
//!
//! Below the core, searches only go up the hierarchy. Inside the core every edge is usable in both searches,
//! so the core part of a query is a plain bidirectional Dijkstra on which additional filters stay exact,
//! as long as they only reject edges between core nodes.
//! The backward search spaces of all targets are computed once and shared by all sources.
//! Each source then runs one forward search and looks up the settled nodes in the buckets of the target spaces.

use super::*;
use crate::algo::contraction_hierarchy::query::UpwardSearch;
use crate::weighting::Weighting;

/// The complete backward search spaces of a fixed set of targets.
#[derive(Debug)]
pub struct CoreTargetSpaces {
    targets: Vec<NodeId>,
    trees: Vec<ShortestPathTree>,
    // node -> (target index, entry in the targets tree)
    buckets: FxHashMap<NodeId, Vec<(usize, EntryId)>>,
    visited_nodes: usize,
    budget_exceeded_at: Option<NodeId>,
}

impl CoreTargetSpaces {
    /// Every backward search may settle at most `max_visited_nodes` nodes.
    /// Construction stops at the first target whose search exceeds it, see `budget_exceeded_at`.
    pub fn new<G: CHGraph, W: Weighting + ?Sized>(
        graph: &G,
        weighting: &W,
        targets: &[NodeId],
        filter: Option<&(dyn EdgeFilter + Sync)>,
        max_visited_nodes: usize,
    ) -> Result<Self, SearchError> {
        if weighting.has_turn_costs() {
            return Err(SearchError::TurnCostsRequireEdgeBased {
                weighting: weighting.name().to_string(),
            });
        }
        let mut trees = Vec::with_capacity(targets.len());
        let mut buckets: FxHashMap<NodeId, Vec<(usize, EntryId)>> = FxHashMap::default();
        let mut visited_nodes = 0;
        for &target in targets {
            check_node(graph, target)?;
        }

        for (target_idx, &target) in targets.iter().enumerate() {
            let mut base = SearchBase::new(TraversalMode::NodeBased);
            base.set_max_visited_nodes(max_visited_nodes);
            if let Some(filter) = filter {
                base.set_edge_filter(filter);
            }
            let mut backward = UpwardSearch::new(true);
            backward.init(target, &mut base);
            while let Some(id) = backward.pop() {
                base.count_visited_node();
                if base.is_max_visited_nodes_exceeded() {
                    return Ok(CoreTargetSpaces {
                        targets: targets.to_vec(),
                        trees,
                        buckets,
                        visited_nodes: visited_nodes + base.visited_nodes(),
                        budget_exceeded_at: Some(target),
                    });
                }
                buckets.entry(backward.tree.get(id).adj_node).or_default().push((target_idx, id));
                backward.relax(graph, weighting, &mut base, id, |_, _| ());
            }
            visited_nodes += base.visited_nodes();
            trees.push(backward.tree);
        }

        Ok(CoreTargetSpaces {
            targets: targets.to_vec(),
            trees,
            buckets,
            visited_nodes,
            budget_exceeded_at: None,
        })
    }

    /// The target whose backward search exceeded the node budget. The spaces are incomplete then
    /// and every query against them finds nothing.
    pub fn budget_exceeded_at(&self) -> Option<NodeId> {
        self.budget_exceeded_at
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    /// Nodes settled by all backward searches together.
    pub fn visited_nodes(&self) -> usize {
        self.visited_nodes
    }

    fn bucket(&self, node: NodeId) -> &[(usize, EntryId)] {
        self.buckets.get(&node).map_or(&[], |bucket| &bucket[..])
    }
}

/// One forward search against shared `CoreTargetSpaces`.
pub struct CoreCh<'a, G, W: ?Sized> {
    graph: &'a G,
    weighting: &'a W,
    spaces: &'a CoreTargetSpaces,
    base: SearchBase<'a>,
    forward: UpwardSearch,
    // per target: best weight and meeting entries
    best: Vec<(Weight, Option<(EntryId, EntryId)>)>,
}

impl<'a, G: CHGraph, W: Weighting + ?Sized> CoreCh<'a, G, W> {
    pub fn new(graph: &'a G, weighting: &'a W, spaces: &'a CoreTargetSpaces) -> Result<Self, SearchError> {
        if weighting.has_turn_costs() {
            return Err(SearchError::TurnCostsRequireEdgeBased {
                weighting: weighting.name().to_string(),
            });
        }
        Ok(CoreCh {
            graph,
            weighting,
            spaces,
            base: SearchBase::new(TraversalMode::NodeBased),
            forward: UpwardSearch::new(false),
            best: vec![(INFINITY, None); spaces.targets.len()],
        })
    }

    /// Has to be the same filter the target spaces were built with.
    pub fn set_edge_filter(&mut self, filter: &'a (dyn EdgeFilter + Sync)) {
        self.base.set_edge_filter(filter);
    }

    pub fn set_max_visited_nodes(&mut self, max_visited_nodes: usize) {
        self.base.set_max_visited_nodes(max_visited_nodes);
    }

    pub fn is_max_visited_nodes_exceeded(&self) -> bool {
        self.base.is_max_visited_nodes_exceeded() || self.spaces.budget_exceeded_at.is_some()
    }

    pub fn visited_nodes(&self) -> usize {
        self.base.visited_nodes()
    }

    pub fn stats(&self) -> SearchStats {
        self.base.stats()
    }

    /// One path per target of the shared spaces, in the same order.
    /// If the node budget is exceeded, all paths are not found.
    pub fn calc_paths(&mut self, from: NodeId) -> Result<Vec<Path>, SearchError> {
        self.base.check_already_run()?;
        check_node(self.graph, from)?;
        if self.spaces.budget_exceeded_at.is_some() {
            self.base.finish();
            return Ok(self.spaces.targets.iter().map(|_| self.base.create_empty_path()).collect());
        }

        self.forward.init(from, &mut self.base);
        let mut worst_best = if self.best.is_empty() { 0.0 } else { INFINITY };
        while let Some(key) = self.forward.min_key() {
            if key >= worst_best {
                break;
            }
            let id = match self.forward.pop() {
                Some(id) => id,
                None => break,
            };
            self.base.count_visited_node();
            if self.base.is_max_visited_nodes_exceeded() {
                self.base.finish();
                return Ok(self.spaces.targets.iter().map(|_| self.base.create_empty_path()).collect());
            }

            let entry = *self.forward.tree.get(id);
            let mut improved = false;
            for &(target_idx, backward_entry) in self.spaces.bucket(entry.adj_node) {
                let weight = entry.weight + self.spaces.trees[target_idx].get(backward_entry).weight;
                let best = &mut self.best[target_idx];
                if weight < best.0 {
                    *best = (weight, Some((id, backward_entry)));
                    improved = true;
                }
            }
            if improved {
                worst_best = self.best.iter().map(|&(weight, _)| weight).fold(0.0, f64::max);
            }

            self.forward.relax(self.graph, self.weighting, &mut self.base, id, |_, _| ());
        }
        self.base.finish();

        let mut paths = Vec::with_capacity(self.best.len());
        for (target_idx, &(_, meeting)) in self.best.iter().enumerate() {
            let mut path = self.base.create_empty_path();
            if let Some((forward_entry, backward_entry)) = meeting {
                path.extract_bidirectional(
                    self.graph,
                    (&self.forward.tree, forward_entry),
                    (&self.spaces.trees[target_idx], backward_entry),
                )?;
            }
            paths.push(path);
        }
        Ok(paths)
    }
}
