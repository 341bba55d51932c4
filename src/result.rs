use crate::{
    sync::{Arc, Condvar, Mutex, MutexGuard, lock},
    task::{Control, Coordinator},
    types::IndexMap,
};
use core::{hash::Hash, time::Duration};
use derive_more::Debug;
use std::{sync::PoisonError, time::Instant};
use thiserror::Error;

/// Returned by the interruptible waits when the completion lock was
/// poisoned by a panicking thread.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WaitError {
    #[error("completion state was poisoned by a panicking thread")]
    Poisoned,
}

#[derive(Debug)]
struct State<V, O> {
    done: bool,
    successful: bool,
    results: IndexMap<V, O>,
}

#[derive(Debug)]
struct Completion<V, O> {
    state: Mutex<State<V, O>>,
    #[debug(skip)]
    completed: Condvar,
}

/// Handle to a run started by the executor.
///
/// Pending until the executor finalizes the run, then frozen. Clones share
/// the same run. Result accessors return empty/absent values until
/// [`AsyncResult::is_done`] is `true`; gate on it or on one of the waits.
#[derive(Debug)]
pub struct AsyncResult<V, O> {
    completion: Arc<Completion<V, O>>,
    control: Arc<Control>,
}

impl<V, O> Clone for AsyncResult<V, O> {
    fn clone(&self) -> Self {
        Self {
            completion: Arc::clone(&self.completion),
            control: Arc::clone(&self.control),
        }
    }
}

impl<V: Clone + Eq + Hash, O: Clone> AsyncResult<V, O> {
    pub(crate) fn new() -> Self {
        Self {
            completion: Arc::new(Completion {
                state: Mutex::new(State {
                    done: false,
                    successful: false,
                    results: IndexMap::default(),
                }),
                completed: Condvar::new(),
            }),
            control: Arc::new(Control::new()),
        }
    }

    pub(crate) fn coordinator(&self) -> Coordinator {
        Coordinator::new(Arc::clone(&self.control))
    }

    /// Freeze the run. Only the first call has any effect.
    pub(crate) fn complete(&self, results: IndexMap<V, O>, successful: bool) -> bool {
        let mut state = lock(&self.completion.state);
        if state.done {
            return false;
        }
        state.results = results;
        state.successful = successful;
        state.done = true;
        drop(state);
        self.completion.completed.notify_all();
        true
    }

    fn state(&self) -> MutexGuard<'_, State<V, O>> {
        lock(&self.completion.state)
    }

    /// Read the results map if the run is done.
    fn with_results<R>(&self, f: impl FnOnce(&IndexMap<V, O>) -> R) -> Option<R> {
        let state = self.state();
        state.done.then(|| f(&state.results))
    }

    /// `true` once the run has been finalized.
    pub fn is_done(&self) -> bool {
        self.state().done
    }

    /// Whether the run succeeded. Meaningful only once done.
    pub fn is_successful(&self) -> bool {
        let state = self.state();
        state.done && state.successful
    }

    /// Whether scheduling was discontinued, by a callback or through this handle.
    pub fn is_processing_discontinued(&self) -> bool {
        self.control.is_discontinued()
    }

    /// Stop submitting new work. Units already submitted still run, and the
    /// run completes unsuccessful. Always returns `true`.
    pub fn discontinue_scheduling(&self) -> bool {
        self.control.discontinue()
    }

    /// Block until done; `true` if the run succeeded.
    pub fn wait_for_completion(&self) -> bool {
        self.wait_uninterruptibly() && self.is_successful()
    }

    /// Block until done or until `timeout` elapses; `true` only if the run is
    /// done and succeeded. Timing out does not stop the run.
    pub fn wait_for_completion_timeout(&self, timeout: Duration) -> bool {
        self.wait_uninterruptibly_timeout(timeout) && self.is_successful()
    }

    /// Block until done.
    ///
    /// # Errors
    /// [`WaitError::Poisoned`] if a thread panicked while holding the
    /// completion lock.
    pub fn wait(&self) -> Result<(), WaitError> {
        let mut state = self
            .completion
            .state
            .lock()
            .map_err(|_| WaitError::Poisoned)?;
        while !state.done {
            state = self
                .completion
                .completed
                .wait(state)
                .map_err(|_| WaitError::Poisoned)?;
        }
        Ok(())
    }

    /// Block until done or until `timeout` elapses. `Ok(true)` if done.
    ///
    /// # Errors
    /// [`WaitError::Poisoned`], as for [`AsyncResult::wait`].
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool, WaitError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait().map(|()| true);
        };
        let mut state = self
            .completion
            .state
            .lock()
            .map_err(|_| WaitError::Poisoned)?;
        while !state.done {
            let Some(left) = deadline.checked_duration_since(Instant::now()) else {
                return Ok(false);
            };
            state = self
                .completion
                .completed
                .wait_timeout(state, left)
                .map_err(|_| WaitError::Poisoned)?
                .0;
        }
        Ok(true)
    }

    /// Like [`AsyncResult::wait`], recovering from a poisoned lock. Returns
    /// `true` once done.
    pub fn wait_uninterruptibly(&self) -> bool {
        let mut state = self.state();
        while !state.done {
            state = self
                .completion
                .completed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        true
    }

    /// Like [`AsyncResult::wait_timeout`], recovering from a poisoned lock.
    /// Returns `true` if done.
    pub fn wait_uninterruptibly_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait_uninterruptibly();
        };
        let mut state = self.state();
        while !state.done {
            let Some(left) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            state = self
                .completion
                .completed
                .wait_timeout(state, left)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    /// Outputs of the ending vertices, in completion order.
    pub fn results(&self) -> Vec<O> {
        self.with_results(|results| results.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Output recorded for the ending vertex `value`.
    pub fn result_for(&self, value: &V) -> Option<O> {
        self.with_results(|results| results.get(value).cloned())
            .flatten()
    }

    /// Output of the first ending vertex to complete.
    pub fn first(&self) -> Option<O> {
        self.with_results(|results| results.first().map(|(_, output)| output.clone()))
            .flatten()
    }

    /// Whether the ending vertex `value` recorded an output.
    pub fn contains(&self, value: &V) -> bool {
        self.with_results(|results| results.contains_key(value))
            .unwrap_or(false)
    }

    /// Number of recorded ending-vertex outputs.
    pub fn len(&self) -> usize {
        self.with_results(IndexMap::len).unwrap_or(0)
    }

    /// `true` when no ending vertex recorded an output.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ending vertices that recorded an output, in completion order.
    pub fn ending_values(&self) -> Vec<V> {
        self.with_results(|results| results.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Copy of the whole results map.
    pub fn to_map(&self) -> IndexMap<V, O> {
        self.with_results(Clone::clone).unwrap_or_default()
    }
}
