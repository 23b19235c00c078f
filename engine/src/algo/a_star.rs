//! Goal directed search: Dijkstra with the queue keyed by `weight + potential(node)`.

use super::*;
use crate::algo::dijkstra::{GenericDijkstra, StaticOps, TDOps};
use crate::util::haversine_distance;

/// Lower bound of the remaining weight to the target of a query.
/// Potentials have to be consistent, otherwise the first settled target entry is not optimal.
pub trait Potential {
    /// Whether the potential changes the search order at all.
    const GOAL_DIRECTED: bool = true;

    /// Aim at a new target.
    fn init(&mut self, target: NodeId);

    /// `None` if the target can not be reached from `node`.
    fn potential(&mut self, node: NodeId) -> Option<Weight>;
}

/// Plain Dijkstra
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroPotential;

impl Potential for ZeroPotential {
    const GOAL_DIRECTED: bool = false;

    fn init(&mut self, _target: NodeId) {}

    #[inline(always)]
    fn potential(&mut self, _node: NodeId) -> Option<Weight> {
        Some(0.0)
    }
}

/// Great circle distance to the target times the minimal weight per meter.
/// Nodes without coordinates get potential 0.
#[derive(Debug)]
pub struct BeelinePotential<'a, G> {
    graph: &'a G,
    weight_per_meter: f64,
    target: Option<(f64, f64)>,
}

impl<'a, G: EdgeIterable> BeelinePotential<'a, G> {
    pub fn new(graph: &'a G, weighting: &dyn crate::weighting::Weighting) -> Self {
        BeelinePotential {
            graph,
            weight_per_meter: weighting.min_weight_per_meter(),
            target: None,
        }
    }
}

impl<'a, G: EdgeIterable> Potential for BeelinePotential<'a, G> {
    fn init(&mut self, target: NodeId) {
        self.target = self.graph.coordinate(target);
    }

    #[inline]
    fn potential(&mut self, node: NodeId) -> Option<Weight> {
        match (self.target, self.graph.coordinate(node)) {
            (Some(target), Some(coord)) => Some(haversine_distance(coord, target) * self.weight_per_meter),
            _ => Some(0.0),
        }
    }
}

pub type AStar<'a, G, W, P> = GenericDijkstra<'a, G, W, StaticOps, P>;
pub type TDAStar<'a, G, W, P> = GenericDijkstra<'a, G, W, TDOps, P>;
