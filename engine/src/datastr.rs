//! Data structures: graph adapters, priority queue, search tree arena.

pub mod graph;
pub mod index_heap;
pub mod node_order;
pub mod shortest_path_tree;
pub mod timestamped_vector;
