#[macro_use]
extern crate ch_matrix;
use ch_matrix::{
    algo::contraction_hierarchy::{contract, contract_partially},
    config::EngineConfig,
    datastr::{graph::*, node_order::NodeOrder},
    error::CliErr,
    io::*,
    matrix::*,
    report::*,
    weighting::{FastestWeighting, Weighting},
};
use std::{env, error::Error, path::Path, sync::Arc};

use rand::prelude::*;

const MATRIX_SIZE: usize = 10;

fn num_requests() -> Result<usize, CliErr> {
    match env::var("CH_MATRIX_NUM_REQUESTS") {
        Ok(num) => num.parse().map_err(|_| CliErr("CH_MATRIX_NUM_REQUESTS has to be a non negative integer")),
        Err(_) => Ok(10),
    }
}

// one timed request, reported into the current collection item
fn run(context: &MatrixContext, request: &MatrixRequest) -> Result<MatrixResult, Box<dyn Error>> {
    let result = report_time("matrix", || context.compute(request))?;
    report!("strategy", result.strategy.name());
    report!("num_sources", request.sources.len());
    report!("num_destinations", request.destinations.len());
    report!("stats", serde_json::to_value(&result.stats)?);
    Ok(result)
}

fn main() -> Result<(), Box<dyn Error>> {
    let _reporter = enable_reporting("matrix");
    let num_requests = num_requests()?;

    let mut args = env::args();
    args.next();
    let arg = &args.next().ok_or(CliErr("No graph directory arg given"))?;
    let path = Path::new(arg);
    let config = args.next().map(EngineConfig::load_from).transpose()?.unwrap_or_default().with_env_overrides()?;
    report!("config", serde_json::to_value(&config)?);

    let graph = Arc::new(RoadGraph::reconstruct_from(&path)?);
    report!("graph", { "num_nodes": graph.num_nodes(), "num_edges": graph.num_edges() });
    if graph.num_nodes() == 0 {
        return Err(Box::new(CliErr("Graph has no nodes")));
    }

    let max_speed = (0..graph.num_nodes() as NodeId)
        .flat_map(|node| graph.edge_iter(node))
        .map(|edge| edge.speed)
        .fold(1.0, f64::max);
    let weighting = FastestWeighting::new(max_speed);
    let order = NodeOrder::by_degree(&*graph);

    let preprocessing_ctxt = push_context("preprocessing");
    let ch = report_time_with_key("CH contraction", "ch_contraction_ms", || contract(graph.clone(), &weighting, &order));
    report!("num_shortcuts", ch.num_shortcuts());
    let core_size = (graph.num_nodes() / 20).max(1);
    let core = report_time_with_key("partial CH contraction", "core_contraction_ms", || {
        contract_partially(graph.clone(), &weighting, &order, core_size)
    });
    report!("core_size", core_size);
    drop(preprocessing_ctxt);

    // an edge between two core nodes for the avoid edges requests
    let core_edge = (0..graph.num_nodes() as NodeId)
        .flat_map(|node| graph.edge_iter(node))
        .find(|edge| core.is_core(edge.base) && core.is_core(edge.adj))
        .map(|edge| edge.edge);

    let mut context = MatrixContext::new(graph.clone(), config);
    context.add_profile(MatrixProfile::new(weighting.name(), Arc::new(weighting)).with_ch(Arc::new(ch)).with_core(Arc::new(core)));

    let seed = Default::default();
    report!("seed", seed);
    let mut rng = StdRng::from_seed(seed);

    let mut requests_ctxt = push_collection_context("requests");
    let mut max_deviation: f32 = 0.0;
    for _ in 0..num_requests {
        let _request_ctxt = requests_ctxt.push_collection_item();

        let sources: Vec<NodeId> = (0..MATRIX_SIZE).map(|_| rng.gen_range(0..graph.num_nodes() as NodeId)).collect();
        let destinations: Vec<NodeId> = (0..MATRIX_SIZE).map(|_| rng.gen_range(0..graph.num_nodes() as NodeId)).collect();
        let request = MatrixRequest::new(weighting.name(), sources, destinations, MatrixMetrics::all());
        let mut flexible = request.clone();
        flexible.flexible_mode = true;

        let mut runs_ctxt = push_collection_context("runs");
        let rphast = {
            let _run_ctxt = runs_ctxt.push_collection_item();
            run(&context, &request)?
        };
        let dijkstra = {
            let _run_ctxt = runs_ctxt.push_collection_item();
            run(&context, &flexible)?
        };
        if let Some(edge) = core_edge {
            let mut avoiding = request.clone();
            avoiding.avoid_edges = Some(AvoidEdgesFilter::new(vec![edge]));
            let mut avoiding_flexible = avoiding.clone();
            avoiding_flexible.flexible_mode = true;

            let core_ch = {
                let _run_ctxt = runs_ctxt.push_collection_item();
                run(&context, &avoiding)?
            };
            // reference only, not part of the reported runs
            let reference = {
                let _blocked = block_reporting();
                run(&context, &avoiding_flexible)?
            };
            max_deviation = max_deviation.max(deviation(&core_ch, &reference));
        }
        drop(runs_ctxt);

        let request_deviation = deviation(&rphast, &dijkstra);
        report!("max_weight_deviation", request_deviation);
        max_deviation = max_deviation.max(request_deviation);
    }
    drop(requests_ctxt);
    report!("max_weight_deviation", max_deviation);

    Ok(())
}

fn deviation(a: &MatrixResult, b: &MatrixResult) -> f32 {
    match (&a.weights, &b.weights) {
        (Some(a), Some(b)) => a.iter().zip(b).map(|(a, b)| (a - b).abs()).fold(0.0, f32::max),
        _ => 0.0,
    }
}
