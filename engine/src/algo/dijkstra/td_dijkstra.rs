use super::*;
use crate::weighting::Weighting;

/// Time-dependent weights: edges are evaluated at the time the search reaches their base node.
/// Forward searches move forward in time from the departure, reverse searches backward from the arrival.
#[derive(Debug, Clone, Copy, Default)]
pub struct TDOps;

impl DijkstraOps for TDOps {
    const NAME: &'static str = "td_dijkstra";
    const GOAL_DIRECTED_NAME: &'static str = "td_astar";

    fn check<W: Weighting + ?Sized>(weighting: &W) -> Result<(), SearchError> {
        if weighting.is_time_dependent() {
            Ok(())
        } else {
            Err(SearchError::NotTimeDependent {
                weighting: weighting.name().to_string(),
            })
        }
    }

    #[inline(always)]
    fn link<W: Weighting + ?Sized>(weighting: &W, edge: &EdgeState, reverse: bool, parent: &SptEntry) -> Option<Label> {
        let weight = weighting.calc_td_weight(edge, reverse, parent.original_edge, parent.time);
        if weight == INFINITY {
            return None;
        }
        let millis = weighting.calc_td_millis(edge, reverse, parent.original_edge, parent.time);
        let time = if reverse {
            parent.time.saturating_sub(millis)
        } else {
            parent.time.saturating_add(millis)
        };
        Some(Label {
            weight: parent.weight + weight,
            time,
        })
    }
}

impl<'a, G: EdgeIterable, W: Weighting + ?Sized, P: crate::algo::a_star::Potential> GenericDijkstra<'a, G, W, TDOps, P> {
    /// Route departing at `query.at`, or arriving at `query.at` for reverse searches.
    pub fn calc_td_path(&mut self, query: TDQuery) -> Result<Path, SearchError> {
        self.calc_path_at(query.from, query.to, query.at)
    }
}
