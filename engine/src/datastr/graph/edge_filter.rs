//! Predicates deciding which edges a search may relax.

use super::*;
use rustc_hash::FxHashSet;

pub trait EdgeFilter {
    fn accept(&self, edge: &EdgeState) -> bool;

    /// Accept only edges accepted by both filters. `self` is asked first.
    fn and<F: EdgeFilter>(self, other: F) -> AndFilter<Self, F>
    where
        Self: Sized,
    {
        AndFilter(self, other)
    }
}

impl<F: Fn(&EdgeState) -> bool> EdgeFilter for F {
    #[inline]
    fn accept(&self, edge: &EdgeState) -> bool {
        self(edge)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AndFilter<A, B>(A, B);

impl<A: EdgeFilter, B: EdgeFilter> EdgeFilter for AndFilter<A, B> {
    #[inline]
    fn accept(&self, edge: &EdgeState) -> bool {
        self.0.accept(edge) && self.1.accept(edge)
    }
}

/// Edges which may be traveled away from their base node (out edges),
/// or towards it (in edges, for backward searches).
#[derive(Debug, Clone, Copy)]
pub struct AccessFilter {
    reverse: bool,
}

impl AccessFilter {
    pub fn out_edges() -> Self {
        AccessFilter { reverse: false }
    }

    pub fn in_edges() -> Self {
        AccessFilter { reverse: true }
    }

    pub fn for_direction(reverse: bool) -> Self {
        AccessFilter { reverse }
    }
}

impl EdgeFilter for AccessFilter {
    #[inline]
    fn accept(&self, edge: &EdgeState) -> bool {
        edge.accessible(self.reverse)
    }
}

/// Edges leading up in the hierarchy. With a core, edges between two core nodes are accepted as well.
#[derive(Debug)]
pub struct LevelFilter<'a, G> {
    graph: &'a G,
}

impl<'a, G: CHGraph> LevelFilter<'a, G> {
    pub fn new(graph: &'a G) -> Self {
        LevelFilter { graph }
    }
}

impl<'a, G> Clone for LevelFilter<'a, G> {
    fn clone(&self) -> Self {
        LevelFilter { graph: self.graph }
    }
}

impl<'a, G: CHGraph> EdgeFilter for LevelFilter<'a, G> {
    #[inline]
    fn accept(&self, edge: &EdgeState) -> bool {
        self.graph.level(edge.adj) > self.graph.level(edge.base) || (self.graph.is_core(edge.base) && self.graph.is_core(edge.adj))
    }
}

/// Lat/lng box, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BBox {
    pub fn contains(&self, (lat, lng): (f64, f64)) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

/// Per request filter rejecting a set of original edges.
/// Shortcuts are accepted, contracted graphs only support filters on core edges.
#[derive(Debug, Clone, Default)]
pub struct AvoidEdgesFilter {
    edges: FxHashSet<EdgeId>,
}

impl AvoidEdgesFilter {
    pub fn new(edges: impl IntoIterator<Item = EdgeId>) -> Self {
        AvoidEdgesFilter {
            edges: edges.into_iter().collect(),
        }
    }

    /// Avoid every edge with at least one end inside `area`.
    /// Graphs without coordinates yield an empty filter.
    pub fn in_area<G: EdgeIterable>(graph: &G, area: BBox) -> Self {
        let mut edges = FxHashSet::default();
        for node in 0..graph.num_nodes() as NodeId {
            if graph.coordinate(node).map_or(false, |coord| area.contains(coord)) {
                edges.extend(graph.edge_iter(node).filter(|e| !e.is_shortcut()).map(|e| e.edge));
            }
        }
        AvoidEdgesFilter { edges }
    }

    pub fn avoids(&self, edge: EdgeId) -> bool {
        self.edges.contains(&edge)
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }
}

impl EdgeFilter for AvoidEdgesFilter {
    #[inline]
    fn accept(&self, edge: &EdgeState) -> bool {
        edge.is_shortcut() || !self.edges.contains(&edge.edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> RoadGraph {
        let mut builder = RoadGraphBuilder::new(3);
        builder.two_way(0, 1, 10.0, 50.0);
        builder.one_way(1, 2, 10.0, 50.0);
        builder.coordinates(vec![(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        builder.build()
    }

    #[test]
    fn access_depends_on_direction() {
        let graph = graph();
        let to_two = graph.edge_iter(1).find(|e| e.adj == 2).unwrap();
        assert!(AccessFilter::out_edges().accept(&to_two));
        assert!(!AccessFilter::in_edges().accept(&to_two));
    }

    #[test]
    fn composition_requires_both() {
        let graph = graph();
        let avoid = AvoidEdgesFilter::new(vec![0]);
        let filter = AccessFilter::out_edges().and(|e: &EdgeState| avoid.accept(e));
        let accepted: Vec<EdgeId> = graph.edge_iter(1).filter(|e| filter.accept(e)).map(|e| e.edge).collect();
        assert_eq!(accepted, vec![1]);
        let closure = |e: &EdgeState| e.distance > 5.0;
        assert!(closure.and(AccessFilter::out_edges()).accept(&graph.edge_iter(0).next().unwrap()));
    }

    #[test]
    fn area_covers_incident_edges() {
        let graph = graph();
        let area = BBox {
            min_lat: 2.5,
            min_lng: 2.5,
            max_lat: 3.5,
            max_lng: 3.5,
        };
        let avoid = AvoidEdgesFilter::in_area(&graph, area);
        assert!(avoid.avoids(1));
        assert!(!avoid.avoids(0));
        assert_eq!(avoid.len(), 1);
    }
}
