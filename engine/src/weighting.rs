//! Edge cost models.
//!
//! A weighting turns an `EdgeState` as explored by a search into a weight and a travel time.
//! `reverse` tells whether the search runs backward: the edge is then traveled from `adj` to `base`.
//! `prev_or_next_edge` is the original edge traveled before `base` (forward searches) or after `base`
//! (backward searches), `NO_EDGE` at the search root.

use crate::datastr::graph::*;

mod time_dependent;
mod turn_costs;

pub use self::time_dependent::{SpeedProfile, TimeDependentWeighting, DAY_MILLIS};
pub use self::turn_costs::TurnCostWeighting;

pub trait Weighting: Send + Sync {
    fn calc_weight(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId) -> Weight;

    /// Weight when entering the edge at `time` (forward) or leaving it at `time` (reverse).
    fn calc_td_weight(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId, _time: Millis) -> Weight {
        self.calc_weight(edge, reverse, prev_or_next_edge)
    }

    /// Travel time of an accessible edge.
    fn calc_millis(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId) -> Millis;

    fn calc_td_millis(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId, _time: Millis) -> Millis {
        self.calc_millis(edge, reverse, prev_or_next_edge)
    }

    /// Lower bound of the weight of one meter on any edge, used by goal directed searches.
    fn min_weight_per_meter(&self) -> f64;

    fn is_time_dependent(&self) -> bool {
        false
    }

    fn has_turn_costs(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}

fn travel_millis(edge: &EdgeState) -> Millis {
    if edge.speed <= 0.0 {
        return Millis::MAX;
    }
    (edge.distance / (edge.speed / 3.6) * 1000.0).round() as Millis
}

/// Weight is the travel time in seconds at the edge's speed.
#[derive(Debug, Clone, Copy)]
pub struct FastestWeighting {
    max_speed: f64,
}

impl FastestWeighting {
    /// `max_speed` in km/h has to be at least the speed of every edge.
    pub fn new(max_speed: f64) -> Self {
        assert!(max_speed > 0.0);
        FastestWeighting { max_speed }
    }
}

impl Weighting for FastestWeighting {
    #[inline]
    fn calc_weight(&self, edge: &EdgeState, reverse: bool, _prev_or_next_edge: EdgeId) -> Weight {
        if !edge.accessible(reverse) || edge.speed <= 0.0 {
            return INFINITY;
        }
        edge.distance / (edge.speed / 3.6)
    }

    fn calc_millis(&self, edge: &EdgeState, _reverse: bool, _prev_or_next_edge: EdgeId) -> Millis {
        travel_millis(edge)
    }

    fn min_weight_per_meter(&self) -> f64 {
        3.6 / self.max_speed
    }

    fn name(&self) -> &str {
        "fastest"
    }
}

/// Weight is the length in meters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestWeighting;

impl Weighting for ShortestWeighting {
    #[inline]
    fn calc_weight(&self, edge: &EdgeState, reverse: bool, _prev_or_next_edge: EdgeId) -> Weight {
        if !edge.accessible(reverse) {
            return INFINITY;
        }
        edge.distance
    }

    fn calc_millis(&self, edge: &EdgeState, _reverse: bool, _prev_or_next_edge: EdgeId) -> Millis {
        travel_millis(edge)
    }

    fn min_weight_per_meter(&self) -> f64 {
        1.0
    }

    fn name(&self) -> &str {
        "shortest"
    }
}

/// Weighting of contracted graphs: shortcuts carry the weight and time computed during contraction,
/// all other edges are evaluated by the weighting the hierarchy was built with.
#[derive(Debug, Clone)]
pub struct ChWeighting<W> {
    inner: W,
}

impl<W: Weighting> ChWeighting<W> {
    pub fn new(inner: W) -> Self {
        ChWeighting { inner }
    }

    pub fn inner(&self) -> &W {
        &self.inner
    }
}

impl<W: Weighting> Weighting for ChWeighting<W> {
    #[inline]
    fn calc_weight(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId) -> Weight {
        match &edge.shortcut {
            Some(shortcut) if edge.accessible(reverse) => shortcut.weight,
            Some(_) => INFINITY,
            None => self.inner.calc_weight(edge, reverse, prev_or_next_edge),
        }
    }

    fn calc_millis(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId) -> Millis {
        match &edge.shortcut {
            Some(shortcut) => shortcut.millis,
            None => self.inner.calc_millis(edge, reverse, prev_or_next_edge),
        }
    }

    fn min_weight_per_meter(&self) -> f64 {
        self.inner.min_weight_per_meter()
    }

    fn has_turn_costs(&self) -> bool {
        self.inner.has_turn_costs()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

impl<W: Weighting + ?Sized> Weighting for std::sync::Arc<W> {
    fn calc_weight(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId) -> Weight {
        (**self).calc_weight(edge, reverse, prev_or_next_edge)
    }

    fn calc_td_weight(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId, time: Millis) -> Weight {
        (**self).calc_td_weight(edge, reverse, prev_or_next_edge, time)
    }

    fn calc_millis(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId) -> Millis {
        (**self).calc_millis(edge, reverse, prev_or_next_edge)
    }

    fn calc_td_millis(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId, time: Millis) -> Millis {
        (**self).calc_td_millis(edge, reverse, prev_or_next_edge, time)
    }

    fn min_weight_per_meter(&self) -> f64 {
        (**self).min_weight_per_meter()
    }

    fn is_time_dependent(&self) -> bool {
        (**self).is_time_dependent()
    }

    fn has_turn_costs(&self) -> bool {
        (**self).has_turn_costs()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
