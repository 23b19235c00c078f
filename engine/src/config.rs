//! Engine configuration, read from a JSON file with environment overrides on top.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAX_VISITED_NODES_ENV: &str = "CH_MATRIX_MAX_VISITED_NODES";
pub const PARALLEL_ENV: &str = "CH_MATRIX_PARALLEL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Node budget of every single search, unbounded by default.
    pub max_visited_nodes: usize,
    /// Maximum number of sources and of destinations per matrix request.
    pub max_matrix_locations: usize,
    /// Use plain Dijkstra if a request can not be answered with a contraction hierarchy.
    /// Otherwise such requests fail with `MatrixError::MissingChProfile`.
    pub dijkstra_fallback: bool,
    /// Compute matrix rows in parallel.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_visited_nodes: usize::MAX,
            max_matrix_locations: 2500,
            dijkstra_fallback: true,
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(MAX_VISITED_NODES_ENV) {
            self.max_visited_nodes = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: MAX_VISITED_NODES_ENV,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(PARALLEL_ENV) {
            self.parallel = match value.as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => return Err(ConfigError::InvalidEnv { var: PARALLEL_ENV, value }),
            };
        }
        Ok(self)
    }
}
