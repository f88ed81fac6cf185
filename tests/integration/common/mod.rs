#![allow(dead_code)]

use std::collections::VecDeque;

use cypher_tools::{GraphError, GraphSession, RawRecord, Result};
use serde_json::Value;

enum Reply {
    Rows(Vec<RawRecord>),
    Fail(String),
}

/// Session double that records statements and replays canned results.
///
/// Statements beyond the scripted replies return no rows.
#[derive(Default)]
pub struct ScriptedSession {
    replies: VecDeque<Reply>,
    pub statements: Vec<String>,
    pub closed: bool,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply; `rows` must be a JSON array of objects.
    pub fn reply(mut self, rows: Value) -> Self {
        self.replies.push_back(Reply::Rows(records(rows)));
        self
    }

    /// Queues a driver failure.
    pub fn fail(mut self, message: &str) -> Self {
        self.replies.push_back(Reply::Fail(message.to_string()));
        self
    }
}

impl GraphSession for ScriptedSession {
    fn run(&mut self, statement: &str) -> Result<Vec<RawRecord>> {
        self.statements.push(statement.to_string());
        match self.replies.pop_front() {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(message)) => Err(GraphError::session(message)),
            None => Ok(Vec::new()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

pub fn records(rows: Value) -> Vec<RawRecord> {
    match rows {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => map,
                other => panic!("scripted row must be an object, got {other}"),
            })
            .collect(),
        other => panic!("scripted reply must be an array, got {other}"),
    }
}
