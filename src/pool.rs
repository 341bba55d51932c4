use crate::error::RejectedSubmission;
use std::sync::Arc;

/// A unit of work handed to a [`WorkerPool`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// The only interface the executor needs from a worker pool.
///
/// Implementations run each accepted job exactly once, on any thread. Running
/// it inline on the submitting thread is allowed; the executor then drains the
/// run in a loop on that thread, so stack depth does not grow with the graph.
pub trait WorkerPool: Send + Sync {
    /// Queue `job` for execution.
    ///
    /// # Errors
    /// [`RejectedSubmission`] if the pool no longer accepts work. The job is
    /// dropped without running.
    fn submit(&self, job: Job) -> Result<(), RejectedSubmission>;
}

impl WorkerPool for rayon::ThreadPool {
    fn submit(&self, job: Job) -> Result<(), RejectedSubmission> {
        self.spawn(job);
        Ok(())
    }
}

impl<P: WorkerPool + ?Sized> WorkerPool for Arc<P> {
    fn submit(&self, job: Job) -> Result<(), RejectedSubmission> {
        (**self).submit(job)
    }
}
