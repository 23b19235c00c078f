use ch_matrix::{
    algo::{
        a_star::{AStar, BeelinePotential},
        contraction_hierarchy::{contract, contract_partially, ChBidirectional},
        core_ch::{CoreCh, CoreTargetSpaces},
        dijkstra::{Dijkstra, TDDijkstra},
        rphast::{Rphast, RphastTargetTree},
        OneToMany, RoutingAlgorithm, TargetEntries, TraversalMode,
    },
    datastr::{graph::*, node_order::NodeOrder},
    util::haversine_distance,
    weighting::*,
    SearchError,
};
use rand::prelude::*;
use std::sync::Arc;

const NUM_NODES: usize = 40;
const NUM_EDGES: usize = 90;
const CORE_SIZE: usize = 6;

fn random_graph(rng: &mut StdRng) -> RoadGraph {
    let coordinates: Vec<(f64, f64)> = (0..NUM_NODES).map(|_| (49.0 + rng.gen::<f64>() * 0.05, 8.4 + rng.gen::<f64>() * 0.05)).collect();
    let mut builder = RoadGraphBuilder::new(NUM_NODES);
    for _ in 0..NUM_EDGES {
        let tail = rng.gen_range(0..NUM_NODES);
        let head = rng.gen_range(0..NUM_NODES);
        if tail == head {
            continue;
        }
        // never shorter than the beeline, so beeline potentials stay admissible
        let distance = haversine_distance(coordinates[tail], coordinates[head]) * rng.gen_range(1.0..1.5) + 1.0;
        let speed = [20.0, 50.0, 80.0][rng.gen_range(0..3)];
        let (forward, backward) = match rng.gen_range(0..4) {
            0 => (true, false),
            1 => (false, true),
            _ => (true, true),
        };
        builder.add_edge(tail as NodeId, head as NodeId, distance, speed, forward, backward);
    }
    builder.coordinates(coordinates);
    builder.build()
}

fn bellman_ford<W: Weighting>(graph: &RoadGraph, weighting: &W, from: NodeId) -> Vec<Weight> {
    let mut distances = vec![INFINITY; graph.num_nodes()];
    distances[from as usize] = 0.0;
    for _ in 0..graph.num_nodes() {
        let mut changed = false;
        for node in 0..graph.num_nodes() as NodeId {
            if distances[node as usize] == INFINITY {
                continue;
            }
            for edge in graph.edge_iter(node) {
                let weight = weighting.calc_weight(&edge, false, NO_EDGE);
                if distances[node as usize] + weight < distances[edge.adj as usize] {
                    distances[edge.adj as usize] = distances[node as usize] + weight;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    distances
}

fn assert_close(actual: Weight, expected: Weight, what: &str) {
    if expected == INFINITY {
        assert_eq!(actual, INFINITY, "{}", what);
    } else {
        assert!((actual - expected).abs() <= 1e-6 * expected.max(1.0), "{}: {} != {}", what, actual, expected);
    }
}

fn path_weight(path: &ch_matrix::algo::Path) -> Weight {
    if path.is_found() {
        path.weight()
    } else {
        INFINITY
    }
}

fn check_all_strategies<W: Weighting + Clone>(graph: Arc<RoadGraph>, weighting: W, order: &NodeOrder) {
    let ch = contract(graph.clone(), &weighting, order);
    let core = contract_partially(graph.clone(), &weighting, order, CORE_SIZE);
    let ch_weighting = ChWeighting::new(weighting.clone());
    let targets: Vec<NodeId> = (0..NUM_NODES as NodeId).collect();
    let target_tree = RphastTargetTree::new(&ch, &ch_weighting, &targets).unwrap();
    let core_spaces = CoreTargetSpaces::new(&core, &ch_weighting, &targets, None, usize::MAX).unwrap();

    for from in 0..NUM_NODES as NodeId {
        let expected = bellman_ford(&graph, &weighting, from);

        let mut rphast = Rphast::new(&ch, &ch_weighting, &target_tree).unwrap();
        let rphast_entries = rphast.calc_targets(from, &targets).unwrap();
        let core_paths = CoreCh::new(&core, &ch_weighting, &core_spaces).unwrap().calc_paths(from).unwrap();

        for to in 0..NUM_NODES as NodeId {
            let what = format!("{} {} -> {}", weighting.name(), from, to);
            let reference = expected[to as usize];

            let path = Dijkstra::new(&*graph, &weighting, TraversalMode::NodeBased).unwrap().calc_path(from, to).unwrap();
            assert_close(path_weight(&path), reference, &format!("dijkstra {}", what));

            let path = Dijkstra::new(&*graph, &weighting, TraversalMode::NodeBased)
                .unwrap()
                .reverse()
                .calc_path(from, to)
                .unwrap();
            assert_close(path_weight(&path), reference, &format!("reverse dijkstra {}", what));

            let path = AStar::with_potential(&*graph, &weighting, TraversalMode::NodeBased, BeelinePotential::new(&*graph, &weighting))
                .unwrap()
                .calc_path(from, to)
                .unwrap();
            assert_close(path_weight(&path), reference, &format!("astar {}", what));

            let path = ChBidirectional::new(&ch, &ch_weighting, TraversalMode::NodeBased).unwrap().calc_path(from, to).unwrap();
            assert_close(path_weight(&path), reference, &format!("ch {}", what));
            if path.is_found() {
                assert_eq!(path.nodes().first(), Some(&from));
                assert_eq!(path.nodes().last(), Some(&to));
                assert_eq!(path.edges().len() + 1, path.nodes().len());
            }

            let rphast_weight = rphast_entries.get(to).map_or(INFINITY, |entry| rphast.tree().get(entry).weight);
            assert_close(rphast_weight, reference, &format!("rphast {}", what));

            assert_close(path_weight(&core_paths[to as usize]), reference, &format!("core ch {}", what));
        }
    }
}

#[test]
fn all_strategies_find_optimal_weights() {
    for seed in 0..4 {
        let mut rng = StdRng::seed_from_u64(seed);
        let graph = Arc::new(random_graph(&mut rng));
        let order = NodeOrder::by_degree(&*graph);
        check_all_strategies(graph.clone(), FastestWeighting::new(80.0), &order);
        check_all_strategies(graph.clone(), ShortestWeighting, &order);

        let mut random_order: Vec<NodeId> = (0..NUM_NODES as NodeId).collect();
        random_order.shuffle(&mut rng);
        check_all_strategies(graph, ShortestWeighting, &NodeOrder::from_node_order(random_order));
    }
}

#[test]
fn search_instances_are_one_shot() {
    let mut rng = StdRng::seed_from_u64(42);
    let graph = Arc::new(random_graph(&mut rng));
    let weighting = ShortestWeighting;

    let mut dijkstra = Dijkstra::new(&*graph, &weighting, TraversalMode::NodeBased).unwrap();
    let mut path = dijkstra.calc_path(0, 1).unwrap();
    assert_eq!(dijkstra.calc_path(0, 1), Err(SearchError::AlreadyRun));
    assert_eq!(dijkstra.calc_targets(0, &[1]).err(), Some(SearchError::AlreadyRun));
    // a fresh instance works
    assert!(Dijkstra::new(&*graph, &weighting, TraversalMode::NodeBased).unwrap().calc_path(0, 1).is_ok());

    if path.is_found() {
        let entries = Dijkstra::new(&*graph, &weighting, TraversalMode::NodeBased).unwrap().calc_targets(0, &[1]).unwrap();
        assert!(entries.contains(1));
        assert_eq!(path.extract(&*graph, dijkstra.tree(), 0, false), Err(SearchError::PathAlreadyExtracted));
    }

    let ch = contract(graph, &weighting, &NodeOrder::identity(NUM_NODES));
    let ch_weighting = ChWeighting::new(weighting);
    let mut query = ChBidirectional::new(&ch, &ch_weighting, TraversalMode::NodeBased).unwrap();
    query.calc_path(3, 4).unwrap();
    assert_eq!(query.calc_path(3, 4), Err(SearchError::AlreadyRun));
}

#[test]
fn budget_limits_visited_nodes() {
    let mut rng = StdRng::seed_from_u64(7);
    let graph = random_graph(&mut rng);
    let weighting = FastestWeighting::new(80.0);

    for to in 1..NUM_NODES as NodeId {
        let mut unbounded = Dijkstra::new(&graph, &weighting, TraversalMode::NodeBased).unwrap();
        let expected = unbounded.calc_path(0, to).unwrap();
        if !expected.is_found() {
            continue;
        }
        let needed = unbounded.visited_nodes();

        let mut enough = Dijkstra::new(&graph, &weighting, TraversalMode::NodeBased).unwrap();
        enough.set_max_visited_nodes(needed);
        assert_eq!(enough.calc_path(0, to).unwrap(), expected);

        let mut too_few = Dijkstra::new(&graph, &weighting, TraversalMode::NodeBased).unwrap();
        too_few.set_max_visited_nodes(needed - 1);
        assert!(!too_few.calc_path(0, to).unwrap().is_found());
        assert!(too_few.is_max_visited_nodes_exceeded());
    }
}

fn rphast_weights<G: CHGraph, W: Weighting + ?Sized>(rphast: &Rphast<G, W>, targets: &[NodeId], entries: &TargetEntries) -> Vec<Weight> {
    targets.iter().map(|&to| entries.get(to).map_or(INFINITY, |entry| rphast.tree().get(entry).weight)).collect()
}

#[test]
fn hierarchy_budgets_match_unbounded_results() {
    let mut rng = StdRng::seed_from_u64(11);
    let graph = Arc::new(random_graph(&mut rng));
    let weighting = FastestWeighting::new(80.0);
    let order = NodeOrder::by_degree(&*graph);
    let ch = contract(graph.clone(), &weighting, &order);
    let core = contract_partially(graph.clone(), &weighting, &order, CORE_SIZE);
    let ch_weighting = ChWeighting::new(weighting);
    let targets: Vec<NodeId> = (0..NUM_NODES as NodeId).collect();
    let target_tree = RphastTargetTree::new(&ch, &ch_weighting, &targets).unwrap();
    let core_spaces = CoreTargetSpaces::new(&core, &ch_weighting, &targets, None, usize::MAX).unwrap();

    for from in 0..NUM_NODES as NodeId {
        let mut unbounded = Rphast::new(&ch, &ch_weighting, &target_tree).unwrap();
        let expected = unbounded.calc_targets(from, &targets).unwrap();
        let needed = unbounded.visited_nodes();

        let mut enough = Rphast::new(&ch, &ch_weighting, &target_tree).unwrap();
        enough.set_max_visited_nodes(needed);
        let found = enough.calc_targets(from, &targets).unwrap();
        assert!(!found.budget_exceeded());
        assert_eq!(rphast_weights(&enough, &targets, &found), rphast_weights(&unbounded, &targets, &expected));

        let mut too_few = Rphast::new(&ch, &ch_weighting, &target_tree).unwrap();
        too_few.set_max_visited_nodes(needed - 1);
        let found = too_few.calc_targets(from, &targets).unwrap();
        assert!(found.budget_exceeded());
        assert!(found.is_empty());

        let mut unbounded = CoreCh::new(&core, &ch_weighting, &core_spaces).unwrap();
        let expected = unbounded.calc_paths(from).unwrap();
        let needed = unbounded.visited_nodes();
        let mut enough = CoreCh::new(&core, &ch_weighting, &core_spaces).unwrap();
        enough.set_max_visited_nodes(needed);
        assert_eq!(enough.calc_paths(from).unwrap(), expected);
        assert!(!enough.is_max_visited_nodes_exceeded());
        if needed > 0 {
            let mut too_few = CoreCh::new(&core, &ch_weighting, &core_spaces).unwrap();
            too_few.set_max_visited_nodes(needed - 1);
            assert!(too_few.calc_paths(from).unwrap().iter().all(|path| !path.is_found()));
            assert!(too_few.is_max_visited_nodes_exceeded());
        }

        for to in 0..NUM_NODES as NodeId {
            let mut unbounded = ChBidirectional::new(&ch, &ch_weighting, TraversalMode::NodeBased).unwrap();
            let expected = unbounded.calc_path(from, to).unwrap();
            let needed = unbounded.visited_nodes();

            let mut enough = ChBidirectional::new(&ch, &ch_weighting, TraversalMode::NodeBased).unwrap();
            enough.set_max_visited_nodes(needed);
            assert_eq!(enough.calc_path(from, to).unwrap(), expected);
            assert!(!enough.is_max_visited_nodes_exceeded());
            if needed == 0 {
                continue;
            }

            let mut too_few = ChBidirectional::new(&ch, &ch_weighting, TraversalMode::NodeBased).unwrap();
            too_few.set_max_visited_nodes(needed - 1);
            assert!(!too_few.calc_path(from, to).unwrap().is_found());
            assert!(too_few.is_max_visited_nodes_exceeded());
        }
    }
}

#[test]
fn node_based_trees_contain_no_u_turns() {
    let mut rng = StdRng::seed_from_u64(3);
    let graph = random_graph(&mut rng);
    let weighting = ShortestWeighting;
    let targets: Vec<NodeId> = (0..NUM_NODES as NodeId).collect();

    let mut dijkstra = Dijkstra::new(&graph, &weighting, TraversalMode::NodeBased).unwrap();
    dijkstra.calc_targets(0, &targets).unwrap();
    let tree = dijkstra.tree();
    for (_, entry) in tree.iter() {
        if let Some(parent) = entry.parent.value() {
            let parent = tree.get(parent);
            assert!(parent.is_root() || parent.edge != entry.edge);
        }
    }
}

#[test]
fn forbidden_u_turns_with_edge_based_traversal() {
    //  0 - 1 - 2
    //      |
    //      3
    let mut builder = RoadGraphBuilder::new(4);
    let left = builder.two_way(0, 1, 10.0, 50.0);
    let right = builder.two_way(1, 2, 10.0, 50.0);
    let down = builder.two_way(1, 3, 10.0, 50.0);
    let graph = builder.build();

    let mut weighting = TurnCostWeighting::new(ShortestWeighting);
    weighting.forbid_turn(left, 1, down);
    assert!(Dijkstra::new(&graph, &weighting, TraversalMode::NodeBased).is_err());

    // the only way left is going to 2 and turning there, which is forbidden as well
    let path = Dijkstra::new(&graph, &weighting, TraversalMode::EdgeBased).unwrap().calc_path(0, 3).unwrap();
    assert!(!path.is_found());

    let mut weighting = TurnCostWeighting::new(ShortestWeighting).with_u_turn_cost(100.0);
    weighting.forbid_turn(left, 1, down);
    let path = Dijkstra::new(&graph, &weighting, TraversalMode::EdgeBased).unwrap().calc_path(0, 3).unwrap();
    assert!(path.is_found());
    assert_eq!(path.edges(), &[left, right, right, down]);
    assert_eq!(path.weight(), 140.0);
}

#[test]
fn arrival_is_monotone_in_departure() {
    let mut rng = StdRng::seed_from_u64(11);
    let graph = random_graph(&mut rng);
    let rush_hour = SpeedProfile::new(vec![(0, 1.0), (7 * 3_600_000, 1.0), (8 * 3_600_000, 2.5), (10 * 3_600_000, 1.2), (17 * 3_600_000, 2.0), (19 * 3_600_000, 1.0)]);
    let weighting = TimeDependentWeighting::new(FastestWeighting::new(80.0)).with_default_profile(rush_hour);

    for to in 1..10 {
        let mut last_arrival = Millis::MIN;
        for step in 0..96 {
            let at = step * 15 * 60 * 1000;
            let path = TDDijkstra::new(&graph, &weighting, TraversalMode::NodeBased)
                .unwrap()
                .calc_td_path(TDQuery { from: 0, to, at })
                .unwrap();
            if !path.is_found() {
                break;
            }
            let arrival = at + path.time();
            assert!(arrival >= last_arrival, "departure {} to {}", at, to);
            last_arrival = arrival;
        }
    }
}
