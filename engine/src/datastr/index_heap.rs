//! An addressable 4-ary min heap.
//!
//! Elements are identified through the `Indexing` trait so their keys can be decreased
//! after insertion. The position table grows on demand, which allows using it with
//! index spaces that are only discovered during a search (e.g. shortest path tree entries).
//!
//! # Examples
//!
//! ```
//! use ch_matrix::datastr::index_heap::{Indexing, IndexdMinHeap};
//!
//! #[derive(Copy, Clone, Eq, PartialEq, Debug, Ord, PartialOrd)]
//! pub struct State {
//!     pub distance: usize,
//!     pub node: usize,
//! }
//!
//! impl Indexing for State {
//!     fn as_index(&self) -> usize {
//!         self.node
//!     }
//! }
//!
//! let mut heap = IndexdMinHeap::new(0);
//! heap.push(State { node: 0, distance: 42 });
//! heap.push(State { node: 7, distance: 23 });
//! assert_eq!(heap.peek().cloned(), Some(State { node: 7, distance: 23 }));
//! heap.decrease_key(State { node: 0, distance: 1 });
//! assert_eq!(heap.pop(), Some(State { node: 0, distance: 1 }));
//! ```

use std::{cmp::min, mem::swap};

/// Maps heap elements to a unique index.
pub trait Indexing {
    fn as_index(&self) -> usize;
}

/// Priority queue over elements with unique indices, smallest element first.
/// Besides `push` and `pop`, keys of contained elements can be changed.
#[derive(Debug, Clone)]
pub struct IndexdMinHeap<T> {
    positions: Vec<usize>,
    data: Vec<T>,
}

const TREE_ARITY: usize = 4;
const INVALID_POSITION: usize = usize::MAX;

impl<T: Ord + Indexing> IndexdMinHeap<T> {
    /// Create an empty heap with room for indices in `[0, expected_ids)`.
    /// Larger indices are accepted as well, the position table is extended as needed.
    pub fn new(expected_ids: usize) -> IndexdMinHeap<T> {
        IndexdMinHeap {
            positions: vec![INVALID_POSITION; expected_ids],
            data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_index(&self, id: usize) -> bool {
        self.positions.get(id).map_or(false, |&pos| pos != INVALID_POSITION)
    }

    pub fn get(&self, id: usize) -> Option<&T> {
        self.positions.get(id).and_then(|&pos| self.data.get(pos))
    }

    /// All elements in no particular order.
    pub fn elements(&self) -> &[T] {
        &self.data
    }

    pub fn clear(&mut self) {
        for element in &self.data {
            self.positions[element.as_index()] = INVALID_POSITION;
        }
        self.data.clear();
    }

    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    pub fn pop(&mut self) -> Option<T> {
        self.data.pop().map(|mut item| {
            self.positions[item.as_index()] = INVALID_POSITION;
            if !self.is_empty() {
                self.positions[item.as_index()] = 0;
                self.positions[self.data[0].as_index()] = INVALID_POSITION;
                swap(&mut item, &mut self.data[0]);
                self.move_down_in_tree(0);
            }
            item
        })
    }

    pub fn push_unless_contained(&mut self, element: T) {
        if !self.contains_index(element.as_index()) {
            self.push(element)
        }
    }

    /// Panics if an element with the same index is already contained.
    pub fn push(&mut self, element: T) {
        let id = element.as_index();
        assert!(!self.contains_index(id));
        if id >= self.positions.len() {
            self.positions.resize(id + 1, INVALID_POSITION);
        }
        let insert_position = self.len();
        self.positions[id] = insert_position;
        self.data.push(element);
        self.move_up_in_tree(insert_position);
    }

    /// Push the element or move it to its new position if it is already contained.
    pub fn push_or_update(&mut self, element: T) {
        if self.contains_index(element.as_index()) {
            self.update_key(element)
        } else {
            self.push(element)
        }
    }

    pub fn update_key(&mut self, element: T) {
        match element.cmp(&self.data[self.positions[element.as_index()]]) {
            std::cmp::Ordering::Less => self.decrease_key(element),
            std::cmp::Ordering::Greater => self.increase_key(element),
            _ => (),
        }
    }

    /// The new key must not be larger than the old one.
    pub fn decrease_key(&mut self, element: T) {
        let position = self.positions[element.as_index()];
        self.data[position] = element;
        self.move_up_in_tree(position);
    }

    /// The new key must not be smaller than the old one.
    pub fn increase_key(&mut self, element: T) {
        let position = self.positions[element.as_index()];
        self.data[position] = element;
        self.move_down_in_tree(position);
    }

    fn move_up_in_tree(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / TREE_ARITY;
            if self.data[parent] < self.data[position] {
                break;
            }
            self.swap_elements(parent, position);
            position = parent;
        }
    }

    fn move_down_in_tree(&mut self, mut position: usize) {
        let heap_size = self.len();
        while let Some(smallest_child) = Self::children_index_range(position, heap_size).min_by(|&a, &b| self.data[a].cmp(&self.data[b])) {
            if self.data[smallest_child] >= self.data[position] {
                return;
            }
            self.swap_elements(smallest_child, position);
            position = smallest_child;
        }
    }

    fn swap_elements(&mut self, a: usize, b: usize) {
        self.positions.swap(self.data[a].as_index(), self.data[b].as_index());
        self.data.swap(a, b);
    }

    fn children_index_range(parent_index: usize, heap_size: usize) -> std::ops::Range<usize> {
        let first_child = min(TREE_ARITY * parent_index + 1, heap_size);
        let last_child = min(TREE_ARITY * parent_index + TREE_ARITY + 1, heap_size);
        first_child..last_child
    }
}
