#![forbid(unsafe_code)]

//! Boundary to the database driver.
//!
//! The transport, authentication and transaction machinery live behind
//! [`GraphSession`]. Every statement the crate builds is dispatched through
//! [`GraphSession::run`] and nowhere else.

use serde_json::{Map, Value};

use crate::error::Result;

/// One result row: column name to driver-native value, in column order.
///
/// Nodes and relationships arrive as nested maps of their properties.
pub type RawRecord = Map<String, Value>;

/// A long-lived session able to run statement text.
///
/// Statements without a `RETURN` clause (DDL, plain deletes) yield an empty
/// vector. Implementations report driver failures as
/// [`GraphError::Session`](crate::GraphError::Session) and never retry.
pub trait GraphSession {
    /// Runs `statement` in an auto-commit transaction and collects all rows.
    fn run(&mut self, statement: &str) -> Result<Vec<RawRecord>>;

    /// Releases the session. Further calls to `run` are undefined.
    fn close(&mut self) -> Result<()>;
}

impl<S: GraphSession + ?Sized> GraphSession for Box<S> {
    fn run(&mut self, statement: &str) -> Result<Vec<RawRecord>> {
        (**self).run(statement)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<S: GraphSession + ?Sized> GraphSession for &mut S {
    fn run(&mut self, statement: &str) -> Result<Vec<RawRecord>> {
        (**self).run(statement)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
