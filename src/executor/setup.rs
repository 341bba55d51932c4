use crate::{
    adjacency::AdjacencyList,
    executor::{Run, Unit},
    pool::WorkerPool,
    result::AsyncResult,
    sync::{Arc, AtomicBool, AtomicUsize, Mutex},
    task::{ErrorFn, VertexFn},
    types::{HashSet, IndexMap, Output, Value},
};
use rustc_hash::FxBuildHasher;
use std::collections::VecDeque;
use unzip3::Unzip3;

/// Everything the run needs besides the adjacency list itself.
pub(super) struct RunParts<V, O, P: ?Sized> {
    pub(super) pool: Arc<P>,
    pub(super) on_vertex: Box<VertexFn<V, O>>,
    pub(super) on_error: Box<ErrorFn<V>>,
    pub(super) handle: AsyncResult<V, O>,
}

impl<V: Value, O: Output, P: WorkerPool + ?Sized> Run<V, O, P> {
    /// Materialize one unit per vertex, positionally aligned with
    /// `adjacency`, and return the run together with the root indices.
    ///
    /// Example for the diamond below (in-degrees 0, 1, 1, 2):
    ///
    /// ```text
    ///     A
    ///    / \
    ///   B   C
    ///    \ /
    ///     D
    /// ```
    ///
    /// - `parents_left` is `max(in_degree, 1)`: A=1, B=1, C=1, D=2. A root's
    ///   single count is consumed by its initial submission, so roots need no
    ///   special casing inside the step.
    /// - `children` holds positional indices: A -> [1, 2], B -> [3],
    ///   C -> [3], D -> [].
    /// - Every unit starts in `remaining`; whatever is still there when the
    ///   outstanding counter drains never became ready.
    pub(super) fn setup(adjacency: AdjacencyList<V>, parts: RunParts<V, O, P>) -> (Self, Vec<usize>) {
        let in_degrees = adjacency.calculate_in_degrees();
        let (units, remaining, roots): (Vec<_>, HashSet<_>, Vec<_>) = in_degrees
            .iter()
            .enumerate()
            .map(|(idx, &in_degree)| {
                let unit = Unit {
                    parents_left: AtomicUsize::new(in_degree.max(1)),
                    inputs: Mutex::new(IndexMap::with_capacity_and_hasher(
                        in_degree,
                        FxBuildHasher,
                    )),
                    children: adjacency.out_neighbor_indices(idx),
                    is_start: in_degree == 0,
                };
                (unit, idx, (in_degree == 0).then_some(idx))
            })
            .unzip3();
        let roots: Vec<usize> = roots.into_iter().flatten().collect();

        let ending = adjacency.ending_vertices().len();
        let RunParts {
            pool,
            on_vertex,
            on_error,
            handle,
        } = parts;
        let run = Self {
            coordinator: handle.coordinator(),
            adjacency,
            units,
            remaining: Mutex::new(remaining),
            outstanding: AtomicUsize::new(0),
            deferred: Mutex::new(VecDeque::new()),
            results: Mutex::new(IndexMap::with_capacity_and_hasher(ending, FxBuildHasher)),
            failed: AtomicBool::new(false),
            rejected: AtomicBool::new(false),
            pool,
            on_vertex,
            on_error,
            handle,
        };
        assert_eq!(run.units.len(), run.adjacency.len(), "Run::setup: [1]");
        (run, roots)
    }
}
