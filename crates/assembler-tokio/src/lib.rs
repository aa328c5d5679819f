//! # Assembler Tokio - concurrent execution adapters
//!
//! Adapters that run the lookups of an assembly pass concurrently on the
//! blocking pool of a tokio runtime:
//!
//! - [`FutureAdapter`]: submits every lookup as soon as the pass starts and
//!   resolves to the aggregates collected into any `FromIterator` container
//! - [`StreamAdapter`]: lazy; hands the lookups to a [`Scheduler`] when the
//!   stream is first polled and emits the aggregates one by one
//! - [`WorkerPool`] / [`WorkerPoolConfig`]: the runtime used when the caller
//!   is not already inside one
//!
//! Both adapters fail fast: the first failing lookup fails the pass.

#![forbid(unsafe_code)]

pub mod config;
pub mod future;
pub mod pool;
pub mod prelude;
pub mod scheduler;
pub mod stream;

pub use config::{PoolError, WorkerPoolConfig};
pub use future::FutureAdapter;
pub use pool::WorkerPool;
pub use scheduler::{BlockingScheduler, ImmediateScheduler, Scheduler};
pub use stream::StreamAdapter;
