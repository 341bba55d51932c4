use crate::error::Result;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{num::NonZeroUsize, thread};

/// Minimum number of workers in a pool built from [`PoolConfig`].
pub const MIN_WORKERS: usize = 2;

/// Settings for the default rayon worker pool.
///
/// Callers that already own a pool hand it to the executor directly; this is
/// only the convenience path used by [`Graph::sort_async_default`].
///
/// [`Graph::sort_async_default`]: crate::graph::Graph::sort_async_default
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    num_threads: Option<usize>,
    thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "cdg-worker".to_owned(),
        }
    }
}

impl PoolConfig {
    /// Fix the number of workers. Values below [`MIN_WORKERS`] are raised to
    /// it.
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Prefix of worker thread names; workers are numbered from 0.
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Worker count this config resolves to: the explicit value, or the
    /// available hardware parallelism, never less than [`MIN_WORKERS`].
    pub fn resolved_threads(&self) -> usize {
        self.num_threads
            .unwrap_or_else(|| {
                thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(MIN_WORKERS)
            })
            .max(MIN_WORKERS)
    }

    /// Build the pool.
    ///
    /// # Errors
    /// [`Error::PoolBuild`](crate::error::Error::PoolBuild) if rayon cannot
    /// spawn the workers.
    pub fn build(&self) -> Result<ThreadPool> {
        let prefix = self.thread_name_prefix.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.resolved_threads())
            .thread_name(move |idx| format!("{prefix}-{idx}"))
            .build()?;
        tracing::debug!(threads = pool.current_num_threads(), "built worker pool");
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_fewer_than_two_workers() {
        assert_eq!(PoolConfig::default().num_threads(1).resolved_threads(), 2);
        assert_eq!(PoolConfig::default().num_threads(0).resolved_threads(), 2);
        assert!(PoolConfig::default().resolved_threads() >= MIN_WORKERS);
    }

    #[test]
    fn builds_named_workers() {
        let pool = PoolConfig::default()
            .num_threads(3)
            .thread_name_prefix("unit")
            .build()
            .unwrap();
        assert_eq!(pool.current_num_threads(), 3);
        let name = pool.install(|| thread::current().name().map(str::to_owned));
        assert!(name.unwrap().starts_with("unit-"));
    }
}
