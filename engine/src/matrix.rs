//! Many-to-many matrices of durations, distances and weights.
//!
//! Every request is answered with one of three strategies, chosen in this order:
//!
//! 1. RPHAST, if the request has no dynamic filters and the profile has a fully contracted hierarchy.
//! 2. Core-CH, if the request avoids edges which all lie in the core of the profile's partially contracted graph.
//! 3. Plain Dijkstra, for flexible requests or as fallback (if enabled in the `EngineConfig`).
//!
//! Structures derived from the destinations (RPHAST target tree, core target spaces) are built once per request
//! and shared by all rows. Each row gets its own search instance, rows can be computed in parallel.

use crate::algo::{
    check_node,
    core_ch::{CoreCh, CoreTargetSpaces},
    dijkstra::Dijkstra,
    rphast::{Rphast, RphastTargetTree},
    OneToMany, RoutingAlgorithm, TraversalMode,
};
use crate::config::EngineConfig;
use crate::datastr::graph::*;
use crate::error::MatrixError;
use crate::weighting::{ChWeighting, Weighting};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod extraction;

use self::extraction::PairMetrics;

/// Value of cells for unreachable pairs.
pub const UNREACHABLE: f32 = -1.0;

// metrics of one source to all destinations, `None` if unreachable
struct Row {
    cells: Vec<Option<PairMetrics>>,
    visited_nodes: usize,
}

/// Set of requested metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixMetrics(u8);

impl MatrixMetrics {
    pub const DURATION: u8 = 1;
    pub const DISTANCE: u8 = 2;
    pub const WEIGHT: u8 = 4;
    const ALL: u8 = Self::DURATION | Self::DISTANCE | Self::WEIGHT;

    pub fn from_bits(bits: u8) -> Result<Self, MatrixError> {
        if bits == 0 || bits & !Self::ALL != 0 {
            return Err(MatrixError::UnsupportedMetrics(bits));
        }
        Ok(MatrixMetrics(bits))
    }

    pub fn all() -> Self {
        MatrixMetrics(Self::ALL)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, metric: u8) -> bool {
        self.0 & metric != 0
    }
}

#[derive(Debug, Clone)]
pub struct MatrixRequest {
    pub profile: String,
    pub sources: Vec<NodeId>,
    pub destinations: Vec<NodeId>,
    pub metrics: MatrixMetrics,
    /// Do not use any preprocessing.
    pub flexible_mode: bool,
    pub avoid_edges: Option<AvoidEdgesFilter>,
    /// Overrides the budget of the `EngineConfig`.
    pub max_visited_nodes: Option<usize>,
}

impl MatrixRequest {
    pub fn new(profile: impl Into<String>, sources: Vec<NodeId>, destinations: Vec<NodeId>, metrics: MatrixMetrics) -> Self {
        MatrixRequest {
            profile: profile.into(),
            sources,
            destinations,
            metrics,
            flexible_mode: false,
            avoid_edges: None,
            max_visited_nodes: None,
        }
    }

    fn dynamic_filter(&self) -> Option<&AvoidEdgesFilter> {
        self.avoid_edges.as_ref().filter(|filter| !filter.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Rphast,
    CoreCh,
    Dijkstra,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Rphast => "rphast",
            Strategy::CoreCh => "core_ch",
            Strategy::Dijkstra => "dijkstra",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub node: NodeId,
    /// (lat, lng)
    pub coordinate: Option<(f64, f64)>,
}

/// Search effort of one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixStats {
    /// Nodes settled by all row searches together.
    pub visited_nodes: usize,
    /// Size of the RPHAST target tree.
    pub num_selected_nodes: Option<usize>,
    /// Nodes settled while building the core target spaces.
    pub target_space_visited_nodes: Option<usize>,
}

/// Row major matrices, only the requested metrics are present.
/// Durations are in seconds, distances in meters. Unreachable cells are `-1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixResult {
    pub durations: Option<Vec<f32>>,
    pub distances: Option<Vec<f32>>,
    pub weights: Option<Vec<f32>>,
    pub sources: Vec<ResolvedLocation>,
    pub destinations: Vec<ResolvedLocation>,
    pub strategy: Strategy,
    #[serde(default)]
    pub stats: MatrixStats,
}

impl MatrixResult {
    fn cell(&self, values: &Option<Vec<f32>>, row: usize, col: usize) -> Option<f32> {
        values.as_ref().map(|values| values[row * self.destinations.len() + col])
    }

    pub fn duration(&self, row: usize, col: usize) -> Option<f32> {
        self.cell(&self.durations, row, col)
    }

    pub fn distance(&self, row: usize, col: usize) -> Option<f32> {
        self.cell(&self.distances, row, col)
    }

    pub fn weight(&self, row: usize, col: usize) -> Option<f32> {
        self.cell(&self.weights, row, col)
    }
}

/// A weighting together with the hierarchies prepared for it.
#[derive(Clone)]
pub struct MatrixProfile {
    pub name: String,
    pub weighting: Arc<dyn Weighting>,
    /// Fully contracted
    pub ch: Option<Arc<ChGraph>>,
    /// Partially contracted, for requests with dynamic filters
    pub core: Option<Arc<ChGraph>>,
}

impl MatrixProfile {
    pub fn new(name: impl Into<String>, weighting: Arc<dyn Weighting>) -> Self {
        MatrixProfile {
            name: name.into(),
            weighting,
            ch: None,
            core: None,
        }
    }

    pub fn with_ch(mut self, ch: Arc<ChGraph>) -> Self {
        self.ch = Some(ch);
        self
    }

    pub fn with_core(mut self, core: Arc<ChGraph>) -> Self {
        self.core = Some(core);
        self
    }

    fn usable<'g>(&self, graph: &'g Option<Arc<ChGraph>>) -> Option<&'g ChGraph> {
        graph
            .as_deref()
            .filter(|graph| graph.weighting_name() == self.weighting.name() && !self.weighting.has_turn_costs() && !self.weighting.is_time_dependent())
    }
}

impl std::fmt::Debug for MatrixProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixProfile")
            .field("name", &self.name)
            .field("weighting", &self.weighting.name())
            .field("ch", &self.ch.is_some())
            .field("core", &self.core.is_some())
            .finish()
    }
}

/// Graph, profiles and config for answering matrix requests.
#[derive(Debug)]
pub struct MatrixContext {
    graph: Arc<RoadGraph>,
    profiles: FxHashMap<String, MatrixProfile>,
    config: EngineConfig,
}

impl MatrixContext {
    pub fn new(graph: Arc<RoadGraph>, config: EngineConfig) -> Self {
        MatrixContext {
            graph,
            profiles: FxHashMap::default(),
            config,
        }
    }

    pub fn add_profile(&mut self, profile: MatrixProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn profile(&self, name: &str) -> Option<&MatrixProfile> {
        self.profiles.get(name)
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pick the fastest strategy which answers the request correctly.
    pub fn select_strategy(&self, request: &MatrixRequest) -> Result<Strategy, MatrixError> {
        let profile = self.profile(&request.profile).ok_or_else(|| MatrixError::UnknownProfile(request.profile.clone()))?;
        if request.flexible_mode {
            return Ok(Strategy::Dijkstra);
        }
        match request.dynamic_filter() {
            None if profile.usable(&profile.ch).is_some() => return Ok(Strategy::Rphast),
            Some(filter) => {
                if let Some(core) = profile.usable(&profile.core) {
                    if self.filters_core_only(core, filter) {
                        return Ok(Strategy::CoreCh);
                    }
                }
            }
            None => (),
        }
        if self.config.dijkstra_fallback {
            Ok(Strategy::Dijkstra)
        } else {
            Err(MatrixError::MissingChProfile(profile.name.clone()))
        }
    }

    // Shortcuts never contain edges between two core nodes, so only filters on those are exact.
    fn filters_core_only(&self, core: &ChGraph, filter: &AvoidEdgesFilter) -> bool {
        filter.edges().all(|edge| {
            (edge as usize) >= self.graph.num_edges() || (core.is_core(self.graph.tail(edge)) && core.is_core(self.graph.head(edge)))
        })
    }

    /// Reports nothing, callers report `MatrixResult::stats` in their own context.
    pub fn compute(&self, request: &MatrixRequest) -> Result<MatrixResult, MatrixError> {
        let profile = self.profile(&request.profile).ok_or_else(|| MatrixError::UnknownProfile(request.profile.clone()))?;
        if request.sources.is_empty() || request.destinations.is_empty() {
            return Err(MatrixError::EmptyLocations);
        }
        let max = self.config.max_matrix_locations;
        let requested = request.sources.len().max(request.destinations.len());
        if requested > max {
            return Err(MatrixError::TooManyLocations { requested, max });
        }
        for &node in request.sources.iter().chain(&request.destinations) {
            check_node(&*self.graph, node)?;
        }

        let strategy = self.select_strategy(request)?;
        let mut stats = MatrixStats::default();
        let rows = match strategy {
            Strategy::Rphast => self.rphast_rows(request, profile, &mut stats),
            Strategy::CoreCh => self.core_rows(request, profile, &mut stats),
            Strategy::Dijkstra => self.dijkstra_rows(request, profile),
        }?;
        stats.visited_nodes = rows.iter().map(|row| row.visited_nodes).sum();

        Ok(self.assemble(request, strategy, stats, rows))
    }

    fn max_visited_nodes(&self, request: &MatrixRequest) -> usize {
        request.max_visited_nodes.unwrap_or(self.config.max_visited_nodes)
    }

    fn rows<F>(&self, sources: &[NodeId], row: F) -> Result<Vec<Row>, MatrixError>
    where
        F: Fn(NodeId) -> Result<Row, MatrixError> + Sync + Send,
    {
        if self.config.parallel {
            sources.par_iter().map(|&source| row(source)).collect()
        } else {
            sources.iter().map(|&source| row(source)).collect()
        }
    }

    fn rphast_rows(&self, request: &MatrixRequest, profile: &MatrixProfile, stats: &mut MatrixStats) -> Result<Vec<Row>, MatrixError> {
        let ch = profile.usable(&profile.ch).ok_or_else(|| MatrixError::MissingChProfile(profile.name.clone()))?;
        let weighting = ChWeighting::new(profile.weighting.clone());
        let target_tree = RphastTargetTree::new(ch, &weighting, &request.destinations)?;
        stats.num_selected_nodes = Some(target_tree.num_selected_nodes());
        let max_visited_nodes = self.max_visited_nodes(request);

        self.rows(&request.sources, |source| {
            let mut rphast = Rphast::new(ch, &weighting, &target_tree)?;
            rphast.set_max_visited_nodes(max_visited_nodes);
            let entries = rphast.calc_targets(source, &request.destinations)?;
            if entries.budget_exceeded() {
                return Err(MatrixError::MaxVisitedNodesExceeded { from: source });
            }
            Ok(Row {
                cells: request
                    .destinations
                    .iter()
                    .map(|&target| entries.get(target).map(|entry| extraction::from_tree(ch, &*profile.weighting, rphast.tree(), entry, false)))
                    .collect(),
                visited_nodes: rphast.visited_nodes(),
            })
        })
    }

    fn core_rows(&self, request: &MatrixRequest, profile: &MatrixProfile, stats: &mut MatrixStats) -> Result<Vec<Row>, MatrixError> {
        let core = profile.usable(&profile.core).ok_or_else(|| MatrixError::MissingChProfile(profile.name.clone()))?;
        let weighting = ChWeighting::new(profile.weighting.clone());
        let filter = request.dynamic_filter();
        let max_visited_nodes = self.max_visited_nodes(request);
        let spaces = CoreTargetSpaces::new(
            core,
            &weighting,
            &request.destinations,
            filter.map(|f| f as &(dyn EdgeFilter + Sync)),
            max_visited_nodes,
        )?;
        if let Some(to) = spaces.budget_exceeded_at() {
            return Err(MatrixError::TargetSpaceExceeded { to });
        }
        stats.target_space_visited_nodes = Some(spaces.visited_nodes());

        self.rows(&request.sources, |source| {
            let mut query = CoreCh::new(core, &weighting, &spaces)?;
            if let Some(filter) = filter {
                query.set_edge_filter(filter);
            }
            query.set_max_visited_nodes(max_visited_nodes);
            let paths = query.calc_paths(source)?;
            if query.is_max_visited_nodes_exceeded() {
                return Err(MatrixError::MaxVisitedNodesExceeded { from: source });
            }
            Ok(Row {
                cells: paths
                    .iter()
                    .map(|path| {
                        if path.is_found() {
                            Some(extraction::from_path(&*self.graph, &*profile.weighting, path))
                        } else {
                            None
                        }
                    })
                    .collect(),
                visited_nodes: query.visited_nodes(),
            })
        })
    }

    fn dijkstra_rows(&self, request: &MatrixRequest, profile: &MatrixProfile) -> Result<Vec<Row>, MatrixError> {
        let weighting = &*profile.weighting;
        let traversal_mode = if weighting.has_turn_costs() {
            TraversalMode::EdgeBased
        } else {
            TraversalMode::NodeBased
        };
        let filter = request.dynamic_filter();
        let max_visited_nodes = self.max_visited_nodes(request);
        let graph = &*self.graph;

        self.rows(&request.sources, |source| {
            let mut dijkstra = Dijkstra::new(graph, weighting, traversal_mode)?;
            if let Some(filter) = filter {
                dijkstra.set_edge_filter(filter);
            }
            dijkstra.set_max_visited_nodes(max_visited_nodes);
            let entries = dijkstra.calc_targets(source, &request.destinations)?;
            if entries.budget_exceeded() {
                return Err(MatrixError::MaxVisitedNodesExceeded { from: source });
            }
            Ok(Row {
                cells: request
                    .destinations
                    .iter()
                    .map(|&target| entries.get(target).map(|entry| extraction::from_tree(graph, weighting, dijkstra.tree(), entry, false)))
                    .collect(),
                visited_nodes: dijkstra.visited_nodes(),
            })
        })
    }

    fn assemble(&self, request: &MatrixRequest, strategy: Strategy, stats: MatrixStats, rows: Vec<Row>) -> MatrixResult {
        let metric = |requested: u8, value: fn(&PairMetrics) -> f64| -> Option<Vec<f32>> {
            if !request.metrics.contains(requested) {
                return None;
            }
            Some(rows.iter().flat_map(|row| &row.cells).map(|cell| cell.as_ref().map_or(UNREACHABLE, |metrics| value(metrics) as f32)).collect())
        };
        let resolve = |nodes: &[NodeId]| -> Vec<ResolvedLocation> {
            nodes
                .iter()
                .map(|&node| ResolvedLocation {
                    node,
                    coordinate: self.graph.coordinate(node),
                })
                .collect()
        };

        MatrixResult {
            durations: metric(MatrixMetrics::DURATION, PairMetrics::seconds),
            distances: metric(MatrixMetrics::DISTANCE, |metrics: &PairMetrics| metrics.distance),
            weights: metric(MatrixMetrics::WEIGHT, |metrics: &PairMetrics| metrics.weight),
            sources: resolve(&request.sources),
            destinations: resolve(&request.destinations),
            strategy,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::contraction_hierarchy::{contract, contract_partially};
    use crate::datastr::node_order::NodeOrder;
    use crate::weighting::ShortestWeighting;

    //  0 - 1
    //  |   |
    //  3 - 2
    fn square() -> Arc<RoadGraph> {
        let mut builder = RoadGraphBuilder::new(4);
        builder.two_way(0, 1, 1.0, 10.0);
        builder.two_way(1, 2, 1.0, 10.0);
        builder.two_way(2, 3, 1.0, 10.0);
        builder.two_way(3, 0, 1.0, 10.0);
        Arc::new(builder.build())
    }

    fn context(config: EngineConfig) -> MatrixContext {
        let graph = square();
        let ch = contract(graph.clone(), &ShortestWeighting, &NodeOrder::identity(4));
        let core = contract_partially(graph.clone(), &ShortestWeighting, &NodeOrder::identity(4), 2);
        let mut context = MatrixContext::new(graph, config);
        context.add_profile(MatrixProfile::new("car", Arc::new(ShortestWeighting)).with_ch(Arc::new(ch)).with_core(Arc::new(core)));
        context.add_profile(MatrixProfile::new("bike", Arc::new(ShortestWeighting)));
        context
    }

    #[test]
    fn metric_bits() {
        assert!(MatrixMetrics::from_bits(0).is_err());
        assert!(MatrixMetrics::from_bits(8).is_err());
        let metrics = MatrixMetrics::from_bits(MatrixMetrics::DISTANCE | MatrixMetrics::WEIGHT).unwrap();
        assert!(metrics.contains(MatrixMetrics::WEIGHT));
        assert!(!metrics.contains(MatrixMetrics::DURATION));
    }

    #[test]
    fn strategy_selection() {
        let context = context(EngineConfig::default());
        let mut request = MatrixRequest::new("car", vec![0], vec![1], MatrixMetrics::all());
        assert_eq!(context.select_strategy(&request).unwrap(), Strategy::Rphast);

        // edge 2 - 3 connects the two core nodes
        request.avoid_edges = Some(AvoidEdgesFilter::new(vec![2]));
        assert_eq!(context.select_strategy(&request).unwrap(), Strategy::CoreCh);

        request.avoid_edges = Some(AvoidEdgesFilter::new(vec![0]));
        assert_eq!(context.select_strategy(&request).unwrap(), Strategy::Dijkstra);

        request.avoid_edges = None;
        request.flexible_mode = true;
        assert_eq!(context.select_strategy(&request).unwrap(), Strategy::Dijkstra);

        request.profile = "bike".to_string();
        request.flexible_mode = false;
        assert_eq!(context.select_strategy(&request).unwrap(), Strategy::Dijkstra);
        request.profile = "walk".to_string();
        assert!(matches!(context.select_strategy(&request), Err(MatrixError::UnknownProfile(_))));
    }

    #[test]
    fn missing_ch_without_fallback() {
        let context = context(EngineConfig {
            dijkstra_fallback: false,
            ..EngineConfig::default()
        });
        let request = MatrixRequest::new("bike", vec![0], vec![1], MatrixMetrics::all());
        assert!(matches!(context.compute(&request), Err(MatrixError::MissingChProfile(name)) if name == "bike"));
    }

    #[test]
    fn validates_locations() {
        let context = context(EngineConfig {
            max_matrix_locations: 2,
            ..EngineConfig::default()
        });
        let empty = MatrixRequest::new("car", vec![], vec![1], MatrixMetrics::all());
        assert!(matches!(context.compute(&empty), Err(MatrixError::EmptyLocations)));
        let many = MatrixRequest::new("car", vec![0, 1, 2], vec![1], MatrixMetrics::all());
        assert!(matches!(context.compute(&many), Err(MatrixError::TooManyLocations { requested: 3, max: 2 })));
        let invalid = MatrixRequest::new("car", vec![0], vec![7], MatrixMetrics::all());
        assert!(matches!(context.compute(&invalid), Err(MatrixError::Search(_))));
    }

    #[test]
    fn only_requested_metrics() {
        let context = context(EngineConfig::default());
        let request = MatrixRequest::new("car", vec![0, 1], vec![1, 2], MatrixMetrics::from_bits(MatrixMetrics::DISTANCE).unwrap());
        let result = context.compute(&request).unwrap();
        assert_eq!(result.strategy, Strategy::Rphast);
        assert!(result.durations.is_none() && result.weights.is_none());
        assert_eq!(result.distances, Some(vec![1.0, 2.0, 0.0, 1.0]));
        assert_eq!(result.distance(1, 1), Some(1.0));
        assert_eq!(result.sources[1].node, 1);
        assert!(matches!(result.stats.num_selected_nodes, Some(selected) if selected >= 2));
        assert!(result.stats.visited_nodes > 0);
        assert_eq!(result.stats.target_space_visited_nodes, None);
    }

    #[test]
    fn repeated_requests_with_reporting_enabled() {
        let _reporter = crate::report::enable_reporting("matrix_test");
        let context = context(EngineConfig::default());
        let request = MatrixRequest::new("car", vec![0], vec![2], MatrixMetrics::all());
        let first = context.compute(&request).unwrap();
        let second = context.compute(&request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn core_target_spaces_over_budget() {
        let context = context(EngineConfig::default());
        // the rows alone would fit into the budget, the backward search from 1 does not
        let mut request = MatrixRequest::new("car", vec![2], vec![1], MatrixMetrics::all());
        request.avoid_edges = Some(AvoidEdgesFilter::new(vec![2]));
        assert_eq!(context.select_strategy(&request).unwrap(), Strategy::CoreCh);
        let unbounded = context.compute(&request).unwrap();
        assert!(unbounded.stats.target_space_visited_nodes.unwrap() > 1);

        request.max_visited_nodes = Some(1);
        assert!(matches!(context.compute(&request), Err(MatrixError::TargetSpaceExceeded { to: 1 })));
    }
}
