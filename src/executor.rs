mod execute;
mod setup;

use crate::{
    adjacency::AdjacencyList,
    error::Error,
    executor::setup::RunParts,
    pool::WorkerPool,
    result::AsyncResult,
    sync::{Arc, AtomicBool, AtomicUsize, Mutex, Ordering},
    task::{Coordinator, ErrorFn, Inputs, VertexFn},
    types::{HashSet, IndexMap, Output, Value},
};
use core::fmt;
use std::collections::VecDeque;
use tracing::debug;

/// Parallel dependency-graph executor over a caller-supplied worker pool.
///
/// Each run:
/// - turns every vertex into a unit with an atomic countdown of
///   `max(in_degree, 1)` and submits the roots,
/// - runs a unit's callback on whichever worker drives its countdown to zero,
///   so the callback runs exactly once and only after all predecessors,
/// - submits a dependent once per completed predecessor, counting every
///   submission in a global outstanding counter,
/// - finalizes on the worker that drains that counter: vertices that never
///   became ready at that point sit on a cycle.
///
/// Starting a run never blocks; waiting happens on the returned
/// [`AsyncResult`].
#[must_use]
pub struct Executor<P: ?Sized> {
    pool: Arc<P>,
}

impl<P: ?Sized> fmt::Debug for Executor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}

impl<P: ?Sized> Clone for Executor<P> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
        }
    }
}

/// Per-vertex execution record.
pub(crate) struct Unit<V, O> {
    /// Predecessors that haven't submitted this unit yet, plus one for a
    /// root's initial submission.
    parents_left: AtomicUsize,
    /// Outputs of completed predecessors, written before they submit this
    /// unit.
    inputs: Mutex<IndexMap<V, Option<O>>>,
    /// Positional indices of the dependents to submit on completion.
    children: Vec<usize>,
    is_start: bool,
}

/// Shared state of one run, owned jointly by every submitted job.
pub(crate) struct Run<V, O, P: ?Sized> {
    adjacency: AdjacencyList<V>,
    units: Vec<Unit<V, O>>,
    /// Indices of units whose callback hasn't run.
    remaining: Mutex<HashSet<usize>>,
    /// Jobs submitted to the pool and not yet finished.
    outstanding: AtomicUsize,
    /// Steps a pool ran inline while this run was already being driven
    /// further up the same thread's stack.
    deferred: Mutex<VecDeque<usize>>,
    results: Mutex<IndexMap<V, O>>,
    failed: AtomicBool,
    rejected: AtomicBool,
    pool: Arc<P>,
    on_vertex: Box<VertexFn<V, O>>,
    on_error: Box<ErrorFn<V>>,
    coordinator: Coordinator,
    handle: AsyncResult<V, O>,
}

impl<P: WorkerPool + ?Sized + 'static> Executor<P> {
    /// Executor submitting every run to `pool`.
    pub fn new(pool: Arc<P>) -> Self {
        Self { pool }
    }

    /// The pool runs are submitted to.
    pub fn pool(&self) -> &Arc<P> {
        &self.pool
    }

    /// Start executing `adjacency`, calling `on_vertex` once per vertex.
    ///
    /// Failures are only visible through the returned handle. Use
    /// [`Executor::execute_async_with_errors`] to observe them one by one.
    pub fn execute_async<V, O, F>(&self, adjacency: AdjacencyList<V>, on_vertex: F) -> AsyncResult<V, O>
    where
        V: Value,
        O: Output,
        F: Fn(&V, &Inputs<V, O>, &Coordinator) -> anyhow::Result<O> + Send + Sync + 'static,
    {
        self.start(adjacency, Box::new(on_vertex), Box::new(ignore_error::<V>))
    }

    /// Start executing `adjacency`, calling `on_vertex` once per vertex and
    /// `on_error` for every failed vertex, rejected submission and detected
    /// cycle.
    ///
    /// `on_error` receives `None` as the vertex for cycles. Panics inside it
    /// are swallowed.
    pub fn execute_async_with_errors<V, O, F, E>(
        &self,
        adjacency: AdjacencyList<V>,
        on_vertex: F,
        on_error: E,
    ) -> AsyncResult<V, O>
    where
        V: Value,
        O: Output,
        F: Fn(&V, &Inputs<V, O>, &Coordinator) -> anyhow::Result<O> + Send + Sync + 'static,
        E: Fn(Option<&V>, &Error, &Coordinator) + Send + Sync + 'static,
    {
        self.start(adjacency, Box::new(on_vertex), Box::new(on_error))
    }

    fn start<V: Value, O: Output>(
        &self,
        adjacency: AdjacencyList<V>,
        on_vertex: Box<VertexFn<V, O>>,
        on_error: Box<ErrorFn<V>>,
    ) -> AsyncResult<V, O> {
        let handle = AsyncResult::new();
        if adjacency.is_empty() {
            debug!("empty graph, nothing to schedule");
            handle.complete(IndexMap::default(), true);
            return handle;
        }

        let parts = RunParts {
            pool: Arc::clone(&self.pool),
            on_vertex,
            on_error,
            handle: handle.clone(),
        };
        let (run, roots) = Run::setup(adjacency, parts);
        let run = Arc::new(run);

        // No vertex with in-degree zero: every vertex sits on or behind a
        // cycle, so nothing is ever submitted.
        if roots.is_empty() {
            run.report(None, &Error::CyclicGraph);
            handle.complete(IndexMap::default(), false);
            return handle;
        }

        debug!(
            vertices = run.units.len(),
            roots = roots.len(),
            "scheduling graph"
        );
        // Cover every root before the first submission so an early finisher
        // cannot drain the counter while roots are still being handed out.
        run.outstanding.store(roots.len(), Ordering::Release);
        for (submitted, &root) in roots.iter().enumerate() {
            if let Err(rejected) = run.submit(root) {
                run.reject(root, rejected);
                run.coordinator.discontinue_scheduling();
                for _ in submitted..roots.len() {
                    run.release();
                }
                break;
            }
        }
        handle
    }
}

fn ignore_error<V>(_: Option<&V>, _: &Error, _: &Coordinator) {}
