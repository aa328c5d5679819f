//! # Assembler Testkit
//!
//! Customer / billing / order fixtures shared by the assembler test suites,
//! retrieval functions over them (including failing and call-counting
//! ones), and tracing initialisation for tests.

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

mod fixtures;
mod queries;
mod sync;

pub use fixtures::*;
pub use queries::*;
pub use sync::Rendezvous;

/// Install a test-friendly tracing subscriber, honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
