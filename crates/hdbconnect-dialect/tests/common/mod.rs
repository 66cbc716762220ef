//! In-memory executor that answers catalog queries from a script.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;

use hdbconnect_dialect::constants::HAS_TABLE;
use hdbconnect_dialect::types::LobStream;
use hdbconnect_dialect::{DriverError, Executor, Row, SessionControl, WireValue};

/// One scripted cell, turned into a fresh [`WireValue`] on every reply.
#[derive(Debug, Clone, Copy)]
pub enum Cell {
    Null,
    Int(i64),
    Text(&'static str),
    /// Character LOB handed out as a stream.
    Lob(&'static str),
}

impl Cell {
    fn to_wire(self) -> WireValue {
        match self {
            Self::Null => WireValue::Null,
            Self::Int(i) => WireValue::Int(i),
            Self::Text(s) => WireValue::from(s),
            Self::Lob(s) => WireValue::Lob(LobStream::new(Cursor::new(s.as_bytes().to_vec()))),
        }
    }
}

#[derive(Debug)]
enum Reply {
    Rows(Vec<Vec<Cell>>),
    Fail(DriverError),
}

/// Answers by exact SQL text. Unscripted queries return no rows, and a
/// scripted reply is repeated for every call with that SQL.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    replies: HashMap<String, Reply>,
    pub log: Vec<(String, Vec<Option<String>>)>,
    pub autocommit: Option<bool>,
    pub connected: bool,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub fn reply(mut self, sql: &str, rows: Vec<Vec<Cell>>) -> Self {
        self.replies.insert(sql.to_string(), Reply::Rows(rows));
        self
    }

    /// Make the table existence check succeed.
    pub fn with_table(self) -> Self {
        self.reply(HAS_TABLE, vec![vec![Cell::Int(1)]])
    }

    pub fn fail(mut self, sql: &str, error: DriverError) -> Self {
        self.replies.insert(sql.to_string(), Reply::Fail(error));
        self
    }

    pub fn count(&self, sql: &str) -> usize {
        self.log.iter().filter(|(s, _)| s == sql).count()
    }

    /// String parameters of the first call with `sql`.
    pub fn params_of(&self, sql: &str) -> Option<&[Option<String>]> {
        self.log
            .iter()
            .find(|(s, _)| s == sql)
            .map(|(_, params)| params.as_slice())
    }
}

impl Executor for ScriptedExecutor {
    fn query(&mut self, sql: &str, params: &[WireValue]) -> Result<Vec<Row>, DriverError> {
        let seen = params.iter().map(|p| p.as_str().map(String::from)).collect();
        self.log.push((sql.to_string(), seen));
        match self.replies.get(sql) {
            Some(Reply::Rows(rows)) => Ok(rows
                .iter()
                .map(|row| row.iter().copied().map(Cell::to_wire).collect())
                .collect()),
            Some(Reply::Fail(error)) => Err(error.clone()),
            None => Ok(Vec::new()),
        }
    }

    fn execute(&mut self, sql: &str, params: &[WireValue]) -> Result<usize, DriverError> {
        self.query(sql, params).map(|rows| rows.len())
    }
}

impl SessionControl for ScriptedExecutor {
    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.autocommit = Some(enabled);
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.connected
    }
}
