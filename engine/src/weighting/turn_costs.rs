use super::*;
use rustc_hash::FxHashMap;

/// Adds costs (in weight units, i.e. seconds for `FastestWeighting`) for turning from one original
/// edge into another at a via node. Infinite costs forbid the turn.
/// Searches using this weighting must run edge-based.
#[derive(Debug, Clone)]
pub struct TurnCostWeighting<W> {
    inner: W,
    turn_costs: FxHashMap<(EdgeId, NodeId, EdgeId), Weight>,
    u_turn_cost: Weight,
    name: String,
}

impl<W: Weighting> TurnCostWeighting<W> {
    /// U-turns are forbidden unless a cost is set with `with_u_turn_cost`.
    pub fn new(inner: W) -> Self {
        let name = format!("{}|turn_costs", inner.name());
        TurnCostWeighting {
            inner,
            turn_costs: FxHashMap::default(),
            u_turn_cost: INFINITY,
            name,
        }
    }

    pub fn with_u_turn_cost(mut self, cost: Weight) -> Self {
        self.u_turn_cost = cost;
        self
    }

    pub fn set_turn_cost(&mut self, from_edge: EdgeId, via: NodeId, to_edge: EdgeId, cost: Weight) {
        self.turn_costs.insert((from_edge, via, to_edge), cost);
    }

    pub fn forbid_turn(&mut self, from_edge: EdgeId, via: NodeId, to_edge: EdgeId) {
        self.set_turn_cost(from_edge, via, to_edge, INFINITY);
    }

    pub fn turn_cost(&self, from_edge: EdgeId, via: NodeId, to_edge: EdgeId) -> Weight {
        if from_edge == NO_EDGE || to_edge == NO_EDGE {
            return 0.0;
        }
        if from_edge == to_edge {
            return self.u_turn_cost;
        }
        self.turn_costs.get(&(from_edge, via, to_edge)).copied().unwrap_or(0.0)
    }

    fn turn_cost_at_base(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId) -> Weight {
        if reverse {
            self.turn_cost(edge.orig_edge_first, edge.base, prev_or_next_edge)
        } else {
            self.turn_cost(prev_or_next_edge, edge.base, edge.orig_edge_first)
        }
    }
}

impl<W: Weighting> Weighting for TurnCostWeighting<W> {
    fn calc_weight(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId) -> Weight {
        let weight = self.inner.calc_weight(edge, reverse, prev_or_next_edge);
        if weight == INFINITY {
            return INFINITY;
        }
        weight + self.turn_cost_at_base(edge, reverse, prev_or_next_edge)
    }

    fn calc_td_weight(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId, time: Millis) -> Weight {
        let weight = self.inner.calc_td_weight(edge, reverse, prev_or_next_edge, time);
        if weight == INFINITY {
            return INFINITY;
        }
        weight + self.turn_cost_at_base(edge, reverse, prev_or_next_edge)
    }

    fn calc_millis(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId) -> Millis {
        let millis = self.inner.calc_millis(edge, reverse, prev_or_next_edge);
        let turn = self.turn_cost_at_base(edge, reverse, prev_or_next_edge);
        if turn.is_finite() {
            millis.saturating_add((turn * 1000.0).round() as Millis)
        } else {
            millis
        }
    }

    fn calc_td_millis(&self, edge: &EdgeState, reverse: bool, prev_or_next_edge: EdgeId, time: Millis) -> Millis {
        let millis = self.inner.calc_td_millis(edge, reverse, prev_or_next_edge, time);
        let turn = self.turn_cost_at_base(edge, reverse, prev_or_next_edge);
        if turn.is_finite() {
            millis.saturating_add((turn * 1000.0).round() as Millis)
        } else {
            millis
        }
    }

    fn min_weight_per_meter(&self) -> f64 {
        self.inner.min_weight_per_meter()
    }

    fn is_time_dependent(&self) -> bool {
        self.inner.is_time_dependent()
    }

    fn has_turn_costs(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(edge: EdgeId, base: NodeId, adj: NodeId) -> EdgeState {
        EdgeState {
            edge,
            base,
            adj,
            distance: 10.0,
            speed: 36.0,
            forward: true,
            backward: true,
            orig_edge_first: edge,
            orig_edge_last: edge,
            shortcut: None,
        }
    }

    #[test]
    fn turn_costs_are_added_at_the_base_node() {
        let mut weighting = TurnCostWeighting::new(FastestWeighting::new(100.0));
        weighting.set_turn_cost(0, 1, 1, 5.0);
        weighting.forbid_turn(0, 1, 2);

        assert_eq!(weighting.calc_weight(&state(1, 1, 2), false, 0), 6.0);
        assert_eq!(weighting.calc_millis(&state(1, 1, 2), false, 0), 6000);
        assert_eq!(weighting.calc_weight(&state(2, 1, 3), false, 0), INFINITY);
        // backward search: traveling edge 0 into node 1, then edge 1
        assert_eq!(weighting.calc_weight(&state(0, 1, 0), true, 1), 6.0);
        assert_eq!(weighting.calc_weight(&state(0, 1, 0), false, 0), INFINITY);
        assert_eq!(weighting.calc_weight(&state(1, 1, 2), false, NO_EDGE), 1.0);
        assert!(weighting.has_turn_costs());
        assert_eq!(weighting.name(), "fastest|turn_costs");
    }
}
