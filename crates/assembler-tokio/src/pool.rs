//! Worker pool running blocking lookups

use std::future::Future;

use once_cell::sync::OnceCell;
use tokio::runtime::{Builder, Handle, Runtime};

use crate::config::{PoolError, WorkerPoolConfig};

static SHARED: OnceCell<WorkerPool> = OnceCell::new();

/// A multi-thread tokio runtime whose blocking pool runs lookups.
///
/// Adapters only need its [`Handle`]; the pool itself must outlive every
/// pass dispatched to it.
pub struct WorkerPool {
    runtime: Option<Runtime>,
    handle: Handle,
}

impl WorkerPool {
    /// Start a pool from `config`
    pub fn new(config: &WorkerPoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let mut builder = Builder::new_multi_thread();
        builder
            .max_blocking_threads(config.max_blocking_threads)
            .thread_name(config.thread_name.clone())
            .enable_time();
        if let Some(worker_threads) = config.worker_threads {
            builder.worker_threads(worker_threads);
        }
        let runtime = builder.build().map_err(PoolError::Build)?;

        tracing::debug!(
            worker_threads = ?config.worker_threads,
            max_blocking_threads = config.max_blocking_threads,
            thread_name = %config.thread_name,
            "worker pool started"
        );
        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    /// Process-wide pool with the default configuration, started on first use
    pub fn shared() -> Result<&'static WorkerPool, PoolError> {
        SHARED.get_or_try_init(|| WorkerPool::new(&WorkerPoolConfig::default()))
    }

    /// Handle for dispatching work onto this pool
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Drive `future` to completion on this pool from a synchronous context.
    ///
    /// Panics when called from within an async context, like
    /// [`Runtime::block_on`].
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.handle.block_on(future)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Runtime::drop blocks, which is forbidden inside another runtime
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
