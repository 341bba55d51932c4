use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Everything that can go wrong while validating, sorting or executing a
/// dependency graph.
///
/// The sequential sort and graph validation return these directly. The
/// parallel executor never returns them; it hands them to the error callback
/// and records the outcome on the [`AsyncResult`](crate::result::AsyncResult).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The graph (or part of it) cannot be linearized.
    #[error("graph contains cycle(s)")]
    CyclicGraph,
    /// An edge names a vertex that is not part of the graph.
    #[error("edge {edge} references a vertex missing from the graph")]
    InvalidGraph {
        /// Rendering of the offending edge.
        edge: String,
    },
    /// The vertex callback returned an error.
    #[error("vertex callback failed: {0:#}")]
    Callback(anyhow::Error),
    /// The vertex callback panicked.
    #[error("vertex callback panicked: {0}")]
    CallbackPanicked(String),
    /// The worker pool refused a job.
    #[error(transparent)]
    SubmissionRejected(#[from] RejectedSubmission),
    /// The default worker pool could not be built.
    #[error("failed to build worker pool")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Returns `true` for [`Error::CyclicGraph`].
    #[must_use]
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CyclicGraph)
    }
}

/// Returned by a [`WorkerPool`](crate::pool::WorkerPool) that refuses new
/// work, e.g. because it is shutting down.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("worker pool rejected a job: {reason}")]
pub struct RejectedSubmission {
    reason: String,
}

impl RejectedSubmission {
    /// Rejection carrying a human-readable `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    #[must_use]
    /// Why the pool refused the job.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}
