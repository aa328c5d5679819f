//! Error taxonomy for lookups and assembly passes
//!
//! Retrieval functions fail with caller-defined errors. Those are captured at
//! the lookup boundary as [`RetrievalFailure`], tagged with the lookup that
//! raised them as an [`AggregationFailure`], and finally handed to the
//! assembler's error converter before reaching the caller.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error produced by a caller-supplied retrieval function.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Converts an [`AggregationFailure`] into the caller's error type.
pub type ErrorConverter<E> = Arc<dyn Fn(AggregationFailure) -> E + Send + Sync>;

/// A retrieval function (or entity supplier) failed.
///
/// Carries the original cause untouched; lookups perform no translation.
#[derive(Debug, Error)]
#[error("retrieval failed: {source}")]
pub struct RetrievalFailure {
    #[source]
    source: BoxError,
}

impl RetrievalFailure {
    /// Wrap the cause raised by a retrieval function
    pub fn new(cause: impl Into<BoxError>) -> Self {
        Self {
            source: cause.into(),
        }
    }

    /// The original cause
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.source.as_ref()
    }

    /// Downcast the original cause to a concrete error type
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }

    /// Take back ownership of the original cause
    pub fn into_cause(self) -> BoxError {
        self.source
    }
}

/// The lookups, combiner and adapter of one pass do not fit together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The adapter handed back a different number of result maps than lookups were dispatched
    #[error("expected {expected} lookup results, adapter produced {actual}")]
    ResultCountMismatch {
        /// Lookups dispatched
        expected: usize,
        /// Result maps handed back
        actual: usize,
    },

    /// A result map did not have the type its lookup declares
    #[error("lookup {lookup} produced results of an unexpected type")]
    ResultTypeMismatch {
        /// Position of the lookup in the mapper set
        lookup: usize,
    },
}

/// An assembly pass failed; no aggregate of the pass is returned.
#[derive(Debug, Error)]
pub enum AggregationFailure {
    /// The retrieval function of a lookup failed
    #[error("lookup {lookup} failed")]
    Retrieval {
        /// Position of the failing lookup in the mapper set
        lookup: usize,
        /// Cause raised by the retrieval function
        #[source]
        source: RetrievalFailure,
    },

    /// The deferred entity supplier failed
    #[error("entity source failed")]
    EntitySource(#[source] RetrievalFailure),

    /// A lookup returned no entry for an id of the batch
    #[error("lookup {lookup} returned no entry for an id of the batch")]
    MissingResult {
        /// Position of the lookup in the mapper set
        lookup: usize,
    },

    /// Lookups, combiner and adapter disagree
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The execution substrate could not run a lookup to completion
    #[error("lookup execution failed: {reason}")]
    Execution {
        /// What went wrong
        reason: String,
    },
}

impl AggregationFailure {
    /// Create an execution failure
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// The retrieval failure behind this error, if any
    pub fn retrieval(&self) -> Option<&RetrievalFailure> {
        match self {
            Self::Retrieval { source, .. } | Self::EntitySource(source) => Some(source),
            _ => None,
        }
    }
}

/// The error converter used when the caller does not supply one.
pub fn identity_converter() -> ErrorConverter<AggregationFailure> {
    Arc::new(|failure| failure)
}
