//! Dijkstra's algorithm over `EdgeIterable` graphs, static and time-dependent.

use super::*;
use crate::datastr::index_heap::*;
use crate::util::NonNan;

pub mod generic_dijkstra;
pub mod td_dijkstra;

pub use self::generic_dijkstra::*;
pub use self::td_dijkstra::TDOps;

/// Priority queue entries. Equal keys are ordered by entry id, i.e. discovery order.
#[derive(Copy, Clone, Eq, PartialEq, Debug, PartialOrd, Ord)]
pub struct State {
    pub key: NonNan,
    pub entry: EntryId,
}

impl Indexing for State {
    #[inline]
    fn as_index(&self) -> usize {
        self.entry as usize
    }
}

/// Plain Dijkstra with static weights.
pub type Dijkstra<'a, G, W> = GenericDijkstra<'a, G, W, StaticOps>;
/// Dijkstra evaluating edge weights at the time the search reaches them.
pub type TDDijkstra<'a, G, W> = GenericDijkstra<'a, G, W, TDOps>;
