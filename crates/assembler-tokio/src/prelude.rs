//! Assembler tokio prelude.
//!
//! Curated re-exports of the concurrent adapters alongside the core prelude.

pub use assembler_core::prelude::*;

pub use crate::{
    BlockingScheduler, FutureAdapter, ImmediateScheduler, Scheduler, StreamAdapter, WorkerPool,
    WorkerPoolConfig,
};
