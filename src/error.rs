#![forbid(unsafe_code)]

//! Error taxonomy shared by every layer of the crate.
//!
//! Precondition violations ([`GraphError::MissingLabel`],
//! [`GraphError::InvalidArgument`]) are raised before a statement is
//! dispatched. Resource errors cover the import staging area. Anything the
//! database reports arrives as [`GraphError::Session`] and is propagated
//! untouched.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::profile::ProfileError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while building, dispatching or interpreting statements.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Entity descriptor has no non-blank label left after trimming.
    #[error("{kind} descriptor has no usable label")]
    MissingLabel {
        /// Either `"node"` or `"edge"`.
        kind: &'static str,
    },
    /// Caller supplied an argument the statement cannot be built from.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Source file for a staging or load operation does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    /// I/O error while touching the import directory or a local file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// CSV header or row could not be read.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Error reported by the database session, passed through unchanged.
    #[error("session error: {0}")]
    Session(String),
    /// Statement ran but the returned records lack the expected shape.
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),
    /// Connection profile could not be resolved.
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl GraphError {
    /// Wraps any driver error into [`GraphError::Session`].
    pub fn session(err: impl std::fmt::Display) -> Self {
        GraphError::Session(err.to_string())
    }

    pub(crate) fn unexpected(what: impl Into<String>) -> Self {
        GraphError::UnexpectedResult(what.into())
    }
}
