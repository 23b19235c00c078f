//! Static road network with per-direction access flags.
//!
//! Every edge is stored once with a `tail` and a `head`. An incidence array in `first_out` style
//! lists for each node all edges touching it, so a node's edges can be explored in both directions.
//! The access flags decide in which direction an edge may be traveled.

use super::*;
use crate::io::*;
use std::io::{Error, ErrorKind};

const ACCESS_FORWARD: u8 = 1;
const ACCESS_BACKWARD: u8 = 2;

#[derive(Debug, Clone)]
pub struct RoadGraph {
    // index into `incident_edge` for each node, n+1 entries
    first_out: Vec<u32>,
    incident_edge: Vec<EdgeId>,
    tail: Vec<NodeId>,
    head: Vec<NodeId>,
    distance: Vec<f64>,
    speed: Vec<f64>,
    access: Vec<u8>,
    // empty if the graph has no coordinates
    latitude: Vec<f64>,
    longitude: Vec<f64>,
}

impl RoadGraph {
    fn from_edges(num_nodes: usize, edges: Vec<RawEdge>, latitude: Vec<f64>, longitude: Vec<f64>) -> RoadGraph {
        assert!(num_nodes < NodeId::MAX as usize);
        assert!(edges.len() < EdgeId::MAX as usize);

        let mut degrees = vec![0u32; num_nodes];
        for edge in &edges {
            degrees[edge.tail as usize] += 1;
            if edge.head != edge.tail {
                degrees[edge.head as usize] += 1;
            }
        }
        let first_out = degrees_to_first_out(&degrees);
        let mut next = first_out.clone();
        let mut incident_edge = vec![NO_EDGE; first_out[num_nodes] as usize];
        for (id, edge) in edges.iter().enumerate() {
            incident_edge[next[edge.tail as usize] as usize] = id as EdgeId;
            next[edge.tail as usize] += 1;
            if edge.head != edge.tail {
                incident_edge[next[edge.head as usize] as usize] = id as EdgeId;
                next[edge.head as usize] += 1;
            }
        }

        RoadGraph {
            first_out,
            incident_edge,
            tail: edges.iter().map(|e| e.tail).collect(),
            head: edges.iter().map(|e| e.head).collect(),
            distance: edges.iter().map(|e| e.distance).collect(),
            speed: edges.iter().map(|e| e.speed).collect(),
            access: edges.iter().map(|e| e.access).collect(),
            latitude,
            longitude,
        }
    }

    pub fn tail(&self, edge: EdgeId) -> NodeId {
        self.tail[edge as usize]
    }

    pub fn head(&self, edge: EdgeId) -> NodeId {
        self.head[edge as usize]
    }

    pub fn distance(&self, edge: EdgeId) -> f64 {
        self.distance[edge as usize]
    }

    pub fn has_coordinates(&self) -> bool {
        !self.latitude.is_empty()
    }

    /// The edge as seen from `base`, which has to be one of its ends.
    fn state_from(&self, edge: EdgeId, base: NodeId) -> EdgeState {
        let e = edge as usize;
        let access = self.access[e];
        let forward = access & ACCESS_FORWARD != 0;
        let backward = access & ACCESS_BACKWARD != 0;
        let (adj, forward, backward) = if self.tail[e] == base {
            (self.head[e], forward, backward)
        } else {
            debug_assert_eq!(self.head[e], base);
            (self.tail[e], backward, forward)
        };
        EdgeState {
            edge,
            base,
            adj,
            distance: self.distance[e],
            speed: self.speed[e],
            forward,
            backward,
            orig_edge_first: edge,
            orig_edge_last: edge,
            shortcut: None,
        }
    }
}

fn degrees_to_first_out(degrees: &[u32]) -> Vec<u32> {
    let mut first_out = Vec::with_capacity(degrees.len() + 1);
    first_out.push(0);
    let mut sum = 0;
    for &degree in degrees {
        sum += degree;
        first_out.push(sum);
    }
    first_out
}

impl Graph for RoadGraph {
    fn num_nodes(&self) -> usize {
        self.first_out.len() - 1
    }

    fn num_edges(&self) -> usize {
        self.tail.len()
    }
}

/// Explores the edges incident to a node of a `RoadGraph`.
#[derive(Debug, Clone)]
pub struct RoadEdgeIter<'a> {
    graph: &'a RoadGraph,
    base: NodeId,
    edges: std::slice::Iter<'a, EdgeId>,
}

impl<'a> Iterator for RoadEdgeIter<'a> {
    type Item = EdgeState;

    #[inline]
    fn next(&mut self) -> Option<EdgeState> {
        self.edges.next().map(|&edge| self.graph.state_from(edge, self.base))
    }
}

impl EdgeIterable for RoadGraph {
    type Iter<'a> = RoadEdgeIter<'a>;

    fn edge_iter(&self, node: NodeId) -> RoadEdgeIter<'_> {
        let n = node as usize;
        let range = self.first_out[n] as usize..self.first_out[n + 1] as usize;
        RoadEdgeIter {
            graph: self,
            base: node,
            edges: self.incident_edge[range].iter(),
        }
    }

    fn edge_state(&self, edge: EdgeId, adj: NodeId) -> EdgeState {
        let e = edge as usize;
        let base = if self.head[e] == adj { self.tail[e] } else { self.head[e] };
        self.state_from(edge, base)
    }

    fn coordinate(&self, node: NodeId) -> Option<(f64, f64)> {
        if self.has_coordinates() {
            Some((self.latitude[node as usize], self.longitude[node as usize]))
        } else {
            None
        }
    }
}

impl Deconstruct for RoadGraph {
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> std::io::Result<()>) -> std::io::Result<()> {
        store("first_out", &self.first_out)?;
        store("incident_edge", &self.incident_edge)?;
        store("tail", &self.tail)?;
        store("head", &self.head)?;
        store("distance", &self.distance)?;
        store("speed", &self.speed)?;
        store("access", &self.access)?;
        store("latitude", &self.latitude)?;
        store("longitude", &self.longitude)?;
        Ok(())
    }
}

impl Reconstruct for RoadGraph {
    fn reconstruct_with(loader: Loader) -> std::io::Result<Self> {
        let graph = RoadGraph {
            first_out: loader.load("first_out")?,
            incident_edge: loader.load("incident_edge")?,
            tail: loader.load("tail")?,
            head: loader.load("head")?,
            distance: loader.load("distance")?,
            speed: loader.load("speed")?,
            access: loader.load("access")?,
            latitude: if loader.exists("latitude") { loader.load("latitude")? } else { Vec::new() },
            longitude: if loader.exists("longitude") { loader.load("longitude")? } else { Vec::new() },
        };
        graph.validate()?;
        Ok(graph)
    }
}

impl RoadGraph {
    fn validate(&self) -> std::io::Result<()> {
        let invalid = |msg: &str| Err(Error::new(ErrorKind::InvalidData, msg.to_string()));
        let m = self.tail.len();
        if self.first_out.is_empty() || self.first_out[0] != 0 {
            return invalid("first_out has to start with 0");
        }
        if self.first_out.last().map(|&last| last as usize) != Some(self.incident_edge.len()) {
            return invalid("first_out does not match incident_edge");
        }
        if [self.head.len(), self.distance.len(), self.speed.len(), self.access.len()].iter().any(|&len| len != m) {
            return invalid("edge attribute lengths differ");
        }
        let n = self.num_nodes();
        if self.latitude.len() != self.longitude.len() || (self.has_coordinates() && self.latitude.len() != n) {
            return invalid("coordinates do not match the number of nodes");
        }
        if self.tail.iter().chain(self.head.iter()).any(|&node| node as usize >= n) || self.incident_edge.iter().any(|&e| e as usize >= m) {
            return invalid("node or edge id out of range");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct RawEdge {
    tail: NodeId,
    head: NodeId,
    distance: f64,
    speed: f64,
    access: u8,
}

/// Collects edges and coordinates to create a `RoadGraph`.
#[derive(Debug, Clone)]
pub struct RoadGraphBuilder {
    num_nodes: usize,
    edges: Vec<RawEdge>,
    coordinates: Vec<(f64, f64)>,
}

impl RoadGraphBuilder {
    pub fn new(num_nodes: usize) -> RoadGraphBuilder {
        RoadGraphBuilder {
            num_nodes,
            edges: Vec::new(),
            coordinates: Vec::new(),
        }
    }

    /// Add an edge and return its id. Edges get consecutive ids in insertion order.
    pub fn add_edge(&mut self, tail: NodeId, head: NodeId, distance: f64, speed: f64, forward: bool, backward: bool) -> EdgeId {
        assert!((tail as usize) < self.num_nodes && (head as usize) < self.num_nodes);
        assert!(distance >= 0.0 && speed >= 0.0);
        let mut access = 0;
        if forward {
            access |= ACCESS_FORWARD;
        }
        if backward {
            access |= ACCESS_BACKWARD;
        }
        self.edges.push(RawEdge {
            tail,
            head,
            distance,
            speed,
            access,
        });
        (self.edges.len() - 1) as EdgeId
    }

    pub fn two_way(&mut self, tail: NodeId, head: NodeId, distance: f64, speed: f64) -> EdgeId {
        self.add_edge(tail, head, distance, speed, true, true)
    }

    pub fn one_way(&mut self, tail: NodeId, head: NodeId, distance: f64, speed: f64) -> EdgeId {
        self.add_edge(tail, head, distance, speed, true, false)
    }

    /// (lat, lng) for every node, in node order.
    pub fn coordinates(&mut self, coordinates: Vec<(f64, f64)>) -> &mut Self {
        assert_eq!(coordinates.len(), self.num_nodes);
        self.coordinates = coordinates;
        self
    }

    pub fn build(self) -> RoadGraph {
        let (latitude, longitude) = self.coordinates.into_iter().unzip();
        RoadGraph::from_edges(self.num_nodes, self.edges, latitude, longitude)
    }
}
