//! Error types for request dispatch.
//!
//! # Design
//! `NotFound` and `ValidationFailed` are the recognized domain errors: they
//! pass through the pipeline untouched and map to 404 / 400 at the HTTP
//! boundary. Everything else is an internal fault that the outermost
//! pipeline stage converts into `Unhandled`, which carries only the request
//! name so internal detail never leaves the process.

use thiserror::Error;

use crate::validation::ValidationFailures;

/// Errors produced while dispatching a request.
#[derive(Debug, Error)]
pub enum ToDoError {
    /// The entity targeted by a command does not exist.
    #[error("Entity \"{entity}\" ({key}) was not found.")]
    NotFound { entity: &'static str, key: u64 },

    /// One or more validation rules failed; the handler did not run.
    #[error("One or more validation failures have occurred.")]
    ValidationFailed(ValidationFailures),

    /// An internal fault was caught and normalized by the pipeline.
    #[error("unhandled error while processing {request}")]
    Unhandled { request: &'static str },

    /// No pipeline is registered for the request type. A wiring error.
    #[error("no handler registered for {0}")]
    NoHandlerFound(&'static str),

    /// Raw internal fault. Never escapes a pipeline un-translated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ToDoError {
    /// Whether the error is part of the domain vocabulary and may cross the
    /// exception-translation stage as-is.
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ValidationFailed(_))
    }
}

pub type Result<T> = std::result::Result<T, ToDoError>;
