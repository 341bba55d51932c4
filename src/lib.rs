//! Parallel execution of dependency graphs with cycle detection and
//! cooperative cancellation.
//!
//! This crate runs a callback for every vertex of a directed graph on a
//! caller-supplied worker pool. It:
//! - Never runs a vertex before all of its predecessors have completed, and
//!   hands it their outputs.
//! - Runs every callback at most once, even when several predecessors finish
//!   at the same time, using one atomic countdown per vertex.
//! - Detects cycles while executing: when no submitted work is left but some
//!   vertices never became ready, they sit on a cycle.
//! - Keeps going after a failing vertex, reporting it instead of aborting
//!   unrelated branches.
//!
//! Key modules:
//! - `graph`: the generic `Graph` builder with its `Vertex` and `Edge` model.
//! - `adjacency`: the read-only snapshot every sort works on.
//! - `sort`: Kahn's algorithm on the calling thread, the sequential reference.
//! - `executor`: the parallel engine.
//! - `result`: the `AsyncResult` handle returned by the engine.
//! - `task`: what callbacks receive, `Inputs` and `Coordinator`.
//! - `pool` and `config`: the worker pool seam and the default rayon pool.
//!
//! Quick start:
//! 1. Build a `Graph` with `add_vertex`/`add_edge` (or `Graph::from_edges`).
//! 2. Call `Graph::sort` for a linear order, or `Graph::sort_async` with a
//!    pool and a callback `|value, inputs, coordinator| -> anyhow::Result<O>`.
//! 3. Wait on the returned `AsyncResult` and read the outputs of the ending
//!    vertices (those nothing depends on).
//!
//! ```
//! use cdg::{config::PoolConfig, graph::Graph};
//! use std::sync::Arc;
//!
//! let mut graph = Graph::from_values([1u64, 2, 3, 4, 5]);
//! graph.add_edge(1, 2).add_edge(2, 3).add_edge(3, 4).add_edge(4, 5);
//! assert_eq!(graph.sort().unwrap(), [1, 2, 3, 4, 5]);
//!
//! let pool = Arc::new(PoolConfig::default().build().unwrap());
//! let result = graph
//!     .sort_async(pool, |value, inputs, _| {
//!         Ok(inputs.first().copied().unwrap_or(0) + value)
//!     })
//!     .unwrap();
//! assert!(result.wait_for_completion());
//! assert_eq!(result.result_for(&5), Some(15));
//! ```

/// Read-only adjacency snapshot of a graph.
///
/// Maps every vertex to a positional index and its out-neighbors, and
/// computes in-degrees and ending vertices on demand.
pub mod adjacency;
/// Settings for the default worker pool.
pub mod config;
/// Crate error type.
pub mod error;
/// The parallel execution engine.
///
/// Contains unit setup (countdowns, input aggregates, the remaining set) and
/// the per-unit step run on pool workers, including finalization and cycle
/// detection.
pub mod executor;
/// Vertices, edges and the `Graph` builder.
pub mod graph;
/// The worker pool interface consumed by the executor.
pub mod pool;
/// The future-like handle of a run.
pub mod result;
/// Kahn's algorithm.
pub mod sort;
mod sync;
/// Types handed to callbacks.
pub mod task;
/// Common aliases and value bounds.
pub mod types;

pub use crate::{
    error::{Error, Result},
    executor::Executor,
    graph::Graph,
    result::AsyncResult,
};
