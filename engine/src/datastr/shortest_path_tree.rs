//! Shortest path tree entries and the arena which owns them.
//!
//! Entries reference their parent by index into the same arena,
//! so trees can neither dangle nor outlive the search which created them.

use crate::datastr::graph::*;
use crate::util::in_range_option::InRangeOption;
use rustc_hash::FxHashMap;

/// Index of an entry in its `ShortestPathTree`
pub type EntryId = u32;
/// Key to deduplicate tree entries. The node id for node-based searches,
/// a combination of node and incoming edge for edge-based searches.
pub type TraversalId = u64;

/// A node (or node + incoming edge) reached by a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SptEntry {
    /// Edge over which `adj_node` was reached, `NO_EDGE` for roots.
    pub edge: EdgeId,
    /// The last original edge of `edge` in search direction. Equal to `edge` for non shortcuts.
    pub original_edge: EdgeId,
    pub adj_node: NodeId,
    pub weight: Weight,
    /// Absolute point in time for time-dependent searches, accumulated travel time otherwise.
    pub time: Millis,
    pub parent: InRangeOption<EntryId>,
    /// Settled by the downward sweep of RPHAST.
    pub visited: bool,
}

impl SptEntry {
    pub fn root(node: NodeId, weight: Weight, time: Millis) -> SptEntry {
        SptEntry {
            edge: NO_EDGE,
            original_edge: NO_EDGE,
            adj_node: node,
            weight,
            time,
            parent: InRangeOption::NONE,
            visited: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.value().is_none()
    }
}

/// Arena of `SptEntry`s with a lookup by traversal id.
#[derive(Debug, Clone, Default)]
pub struct ShortestPathTree {
    entries: Vec<SptEntry>,
    index: FxHashMap<TraversalId, EntryId>,
}

impl ShortestPathTree {
    pub fn new() -> ShortestPathTree {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, traversal_id: TraversalId) -> Option<EntryId> {
        self.index.get(&traversal_id).copied()
    }

    pub fn entry_for(&self, traversal_id: TraversalId) -> Option<&SptEntry> {
        self.lookup(traversal_id).map(|id| self.get(id))
    }

    /// Add a new entry. The traversal id must not be known yet.
    pub fn insert(&mut self, traversal_id: TraversalId, entry: SptEntry) -> EntryId {
        let id = self.entries.len() as EntryId;
        let prev = self.index.insert(traversal_id, id);
        debug_assert!(prev.is_none(), "duplicate tree entry for {}", traversal_id);
        if let Some(parent) = entry.parent.value() {
            debug_assert!(self.entries[parent as usize].weight <= entry.weight);
        }
        self.entries.push(entry);
        id
    }

    pub fn get(&self, id: EntryId) -> &SptEntry {
        &self.entries[id as usize]
    }

    pub fn get_mut(&mut self, id: EntryId) -> &mut SptEntry {
        &mut self.entries[id as usize]
    }

    pub fn parent(&self, id: EntryId) -> Option<EntryId> {
        self.get(id).parent.value()
    }

    /// Entries from `id` up to the root of its tree, `id` first.
    pub fn path_to_root(&self, id: EntryId) -> PathToRoot<'_> {
        PathToRoot { tree: self, next: Some(id) }
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &SptEntry)> {
        self.entries.iter().enumerate().map(|(id, entry)| (id as EntryId, entry))
    }
}

/// Iterator over the parent chain of an entry.
#[derive(Debug, Clone)]
pub struct PathToRoot<'a> {
    tree: &'a ShortestPathTree,
    next: Option<EntryId>,
}

impl<'a> Iterator for PathToRoot<'a> {
    type Item = (EntryId, &'a SptEntry);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let entry = self.tree.get(id);
        self.next = entry.parent.value();
        Some((id, entry))
    }
}
