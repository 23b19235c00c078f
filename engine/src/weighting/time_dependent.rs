use super::*;
use rustc_hash::FxHashMap;

/// Length of the period of all travel time profiles.
pub const DAY_MILLIS: Millis = 24 * 60 * 60 * 1000;

/// Periodic piecewise linear travel time factor over a day.
/// A factor of 2.0 means the edge takes twice as long as at its free flow speed.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedProfile {
    // sorted by time, all times in [0, DAY_MILLIS)
    points: Vec<(Millis, f64)>,
}

impl SpeedProfile {
    pub fn new(mut points: Vec<(Millis, f64)>) -> Self {
        assert!(!points.is_empty());
        assert!(points.iter().all(|&(at, factor)| (0..DAY_MILLIS).contains(&at) && factor > 0.0));
        points.sort_by_key(|&(at, _)| at);
        points.dedup_by_key(|&mut (at, _)| at);
        SpeedProfile { points }
    }

    pub fn constant(factor: f64) -> Self {
        Self::new(vec![(0, factor)])
    }

    /// Factor at `time`, interpolated between the neighboring points, wrapping around at midnight.
    pub fn factor(&self, time: Millis) -> f64 {
        let t = time.rem_euclid(DAY_MILLIS);
        let next = self.points.partition_point(|&(at, _)| at <= t);
        let (prev_at, prev_factor) = if next == 0 {
            let (at, f) = self.points[self.points.len() - 1];
            (at - DAY_MILLIS, f)
        } else {
            self.points[next - 1]
        };
        let (next_at, next_factor) = if next == self.points.len() {
            let (at, f) = self.points[0];
            (at + DAY_MILLIS, f)
        } else {
            self.points[next]
        };
        if next_at == prev_at {
            return prev_factor;
        }
        let frac = (t - prev_at) as f64 / (next_at - prev_at) as f64;
        prev_factor + frac * (next_factor - prev_factor)
    }

    pub fn min_factor(&self) -> f64 {
        self.points.iter().map(|&(_, f)| f).fold(f64::INFINITY, f64::min)
    }
}

/// Travel times scaled by per edge profiles (or a default profile) at the time the edge is entered.
/// Reverse searches evaluate the profile at the time the edge is left.
#[derive(Debug, Clone)]
pub struct TimeDependentWeighting {
    base: FastestWeighting,
    default_profile: Option<SpeedProfile>,
    edge_profiles: FxHashMap<EdgeId, SpeedProfile>,
}

impl TimeDependentWeighting {
    pub fn new(base: FastestWeighting) -> Self {
        TimeDependentWeighting {
            base,
            default_profile: None,
            edge_profiles: FxHashMap::default(),
        }
    }

    /// Profile for all edges without an own profile.
    pub fn with_default_profile(mut self, profile: SpeedProfile) -> Self {
        self.default_profile = Some(profile);
        self
    }

    pub fn with_profile(mut self, edges: impl IntoIterator<Item = EdgeId>, profile: SpeedProfile) -> Self {
        for edge in edges {
            self.edge_profiles.insert(edge, profile.clone());
        }
        self
    }

    fn factor(&self, edge: EdgeId, time: Millis) -> f64 {
        self.edge_profiles
            .get(&edge)
            .or(self.default_profile.as_ref())
            .map_or(1.0, |profile| profile.factor(time))
    }
}

impl Weighting for TimeDependentWeighting {
    fn calc_weight(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId) -> Weight {
        self.base.calc_weight(edge, reverse, prev_or_next_edge)
    }

    fn calc_td_weight(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId, time: Millis) -> Weight {
        let weight = self.base.calc_weight(edge, reverse, prev_or_next_edge);
        if weight == INFINITY {
            return INFINITY;
        }
        weight * self.factor(edge.edge, time)
    }

    fn calc_millis(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId) -> Millis {
        self.base.calc_millis(edge, reverse, prev_or_next_edge)
    }

    fn calc_td_millis(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId, time: Millis) -> Millis {
        let millis = self.base.calc_millis(edge, reverse, prev_or_next_edge);
        if millis == Millis::MAX {
            return millis;
        }
        (millis as f64 * self.factor(edge.edge, time)).round() as Millis
    }

    fn min_weight_per_meter(&self) -> f64 {
        let min_factor = self
            .edge_profiles
            .values()
            .chain(self.default_profile.iter())
            .map(SpeedProfile::min_factor)
            .fold(1.0, f64::min);
        self.base.min_weight_per_meter() * min_factor
    }

    fn is_time_dependent(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "td_fastest"
    }
}
