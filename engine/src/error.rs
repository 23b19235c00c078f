//! Error types of the search layer, the matrix orchestration and the binaries.

use crate::datastr::graph::NodeId;
use thiserror::Error;

/// Misuse of a search instance or an incompatible algorithm setup.
///
/// "No route" and "node budget exceeded" are not errors, they yield a not found `Path`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("search instance was already run, create a new instance for every query")]
    AlreadyRun,
    #[error("path was already extracted")]
    PathAlreadyExtracted,
    #[error("no single path defined for RPHAST, use calc_targets")]
    NoSinglePath,
    #[error("time-dependent search requires a time-dependent weighting, got {weighting}")]
    NotTimeDependent { weighting: String },
    #[error("weighting {weighting} has turn costs which require edge-based traversal")]
    TurnCostsRequireEdgeBased { weighting: String },
    #[error("edge-based traversal is not supported on contracted graphs")]
    EdgeBasedChUnsupported,
    #[error("node {node} is not part of the graph with {num_nodes} nodes")]
    NodeOutOfRange { node: NodeId, num_nodes: usize },
    #[error("node {node} was not selected as target when building the target tree")]
    TargetNotSelected { node: NodeId },
}

/// Request level failures of a matrix computation.
/// Unreachable pairs are not errors, they are encoded as `-1` cells.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("unsupported metric combination {0:#b}")]
    UnsupportedMetrics(u8),
    #[error("matrix request needs at least one source and one destination")]
    EmptyLocations,
    #[error("{requested} locations requested but at most {max} are allowed")]
    TooManyLocations { requested: usize, max: usize },
    #[error("unknown profile {0}")]
    UnknownProfile(String),
    #[error("profile {0} has no usable contraction hierarchy and flexible mode is disabled")]
    MissingChProfile(String),
    #[error("search from node {from} exceeded the maximum number of visited nodes")]
    MaxVisitedNodesExceeded { from: NodeId },
    #[error("backward search from destination {to} exceeded the maximum number of visited nodes")]
    TargetSpaceExceeded { to: NodeId },
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Failures while reading the engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value {value:?} for env var {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Simple static error messages for command line tools.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CliErr(pub &'static str);
