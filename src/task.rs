use crate::{
    error::Error,
    sync::{Arc, AtomicBool, Ordering},
    types::IndexMap,
};
use core::hash::Hash;

/// Callback invoked once per vertex, after all of its predecessors.
pub(crate) type VertexFn<V, O> =
    dyn Fn(&V, &Inputs<V, O>, &Coordinator) -> anyhow::Result<O> + Send + Sync;
/// Callback notified of failed vertices, rejected submissions and cycles.
pub(crate) type ErrorFn<V> = dyn Fn(Option<&V>, &Error, &Coordinator) + Send + Sync;

#[derive(Debug)]
pub(crate) struct Control {
    discontinued: AtomicBool,
}

impl Control {
    pub(crate) fn new() -> Self {
        Self {
            discontinued: AtomicBool::new(false),
        }
    }

    pub(crate) fn discontinue(&self) -> bool {
        self.discontinued.store(true, Ordering::Release);
        true
    }

    pub(crate) fn is_discontinued(&self) -> bool {
        self.discontinued.load(Ordering::Acquire)
    }
}

/// Handle given to every callback invocation so callback code can stop the
/// run.
///
/// Stopping is cooperative: units already handed to the pool still run, but
/// no new dependents are submitted.
#[derive(Debug, Clone)]
pub struct Coordinator {
    control: Arc<Control>,
}

impl Coordinator {
    pub(crate) fn new(control: Arc<Control>) -> Self {
        Self { control }
    }

    /// Ask the executor to stop submitting work. Always returns `true`.
    pub fn discontinue_scheduling(&self) -> bool {
        self.control.discontinue()
    }

    /// Whether scheduling has been discontinued.
    pub fn is_processing_discontinued(&self) -> bool {
        self.control.is_discontinued()
    }
}

/// Outputs of a vertex's direct predecessors, keyed by predecessor value.
///
/// A predecessor whose callback failed is present with no output.
#[derive(Debug, Clone)]
pub struct Inputs<V, O> {
    start: bool,
    outputs: IndexMap<V, Option<O>>,
}

impl<V: Eq + Hash, O> Inputs<V, O> {
    pub(crate) fn new(start: bool, outputs: IndexMap<V, Option<O>>) -> Self {
        Self { start, outputs }
    }

    /// `true` for a vertex without predecessors.
    pub fn is_start(&self) -> bool {
        self.start
    }

    /// `true` when the vertex has no predecessors.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Number of predecessors.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Output of `predecessor`, if it is one and its callback succeeded.
    pub fn get(&self, predecessor: &V) -> Option<&O> {
        self.outputs.get(predecessor)?.as_ref()
    }

    /// Output of the first predecessor to complete.
    pub fn first(&self) -> Option<&O> {
        self.outputs.first()?.1.as_ref()
    }

    /// Whether `predecessor` is a direct predecessor.
    pub fn contains(&self, predecessor: &V) -> bool {
        self.outputs.contains_key(predecessor)
    }

    /// Every predecessor in completion order, with its output if it has one.
    pub fn iter(&self) -> impl Iterator<Item = (&V, Option<&O>)> {
        self.outputs
            .iter()
            .map(|(value, output)| (value, output.as_ref()))
    }

    /// Outputs of the predecessors whose callbacks succeeded.
    pub fn outputs(&self) -> impl Iterator<Item = &O> {
        self.outputs.values().flatten()
    }
}
