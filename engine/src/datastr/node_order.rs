//! Bidirectional mapping between nodes and their contraction rank.

use crate::datastr::graph::*;
use crate::io::*;

pub type Rank = NodeId;

/// Node order for contraction: rank 0 is contracted first (least important),
/// rank n-1 last. Keeps both directions of the mapping so it is always clear which one is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOrder {
    node_order: Vec<NodeId>,
    ranks: Vec<Rank>,
}

impl NodeOrder {
    /// Order where the id is equal to the rank
    pub fn identity(n: usize) -> NodeOrder {
        NodeOrder {
            node_order: (0..n as NodeId).collect(),
            ranks: (0..n as Rank).collect(),
        }
    }

    /// From a vector containing the node ids sorted by rank.
    pub fn from_node_order(node_order: Vec<NodeId>) -> NodeOrder {
        let n = node_order.len();
        assert!(n < NodeId::MAX as usize);
        let mut ranks = vec![n as Rank; n];

        for (i, &node) in node_order.iter().enumerate() {
            ranks[node as usize] = i as Rank;
        }

        debug_assert_eq!(ranks.iter().position(|&rank| rank == n as Rank), None);

        NodeOrder { node_order, ranks }
    }

    /// From a vector where `ranks[node]` is the rank of `node`.
    pub fn from_ranks(ranks: Vec<Rank>) -> NodeOrder {
        let n = ranks.len();
        assert!(n < NodeId::MAX as usize);
        let mut node_order = vec![n as NodeId; n];

        for (node, &rank) in ranks.iter().enumerate() {
            node_order[rank as usize] = node as NodeId;
        }

        debug_assert_eq!(node_order.iter().position(|&node| node == n as NodeId), None);

        NodeOrder { node_order, ranks }
    }

    /// Order nodes by ascending degree, ties by id. A cheap order which keeps
    /// low degree nodes (dead ends, chain nodes) at the bottom of the hierarchy.
    pub fn by_degree<G: EdgeIterable>(graph: &G) -> NodeOrder {
        let mut nodes: Vec<NodeId> = (0..graph.num_nodes() as NodeId).collect();
        nodes.sort_by_key(|&node| (graph.edge_iter(node).count(), node));
        Self::from_node_order(nodes)
    }

    /// rank -> node
    pub fn order(&self) -> &[NodeId] {
        &self.node_order
    }

    /// node -> rank
    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    pub fn rank(&self, node: NodeId) -> Rank {
        self.ranks[node as usize]
    }

    pub fn node(&self, rank: Rank) -> NodeId {
        self.node_order[rank as usize]
    }

    pub fn len(&self) -> usize {
        self.node_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Deconstruct for NodeOrder {
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> std::io::Result<()>) -> std::io::Result<()> {
        store("ranks", &self.ranks)
    }
}

impl Reconstruct for NodeOrder {
    fn reconstruct_with(loader: Loader) -> std::io::Result<Self> {
        loader.load("ranks").map(Self::from_ranks)
    }
}
