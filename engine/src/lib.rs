//! Shortest path trees, time-dependent routes and many-to-many cost matrices
//! on top of Contraction Hierarchies.
//!
//! The graph storage, the CH preparation and the weightings are consumed through
//! the traits in `datastr::graph` and `weighting`. The search algorithms live in `algo`,
//! the strategy selection and metric extraction for matrices in `matrix`.

#[macro_use]
pub mod report;
pub mod algo;
pub mod config;
pub mod datastr;
pub mod error;
pub mod io;
pub mod matrix;
pub mod util;
pub mod weighting;

pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use crate::error::{MatrixError, SearchError};
