//! Test-only doubles and mapping fixtures shared across unit tests.

pub mod fixtures;

use crate::context::PersistenceContext;
use crate::query::{RetrievalEngine, RetrievalError, RetrievalRequest};
use crate::types::{TypeError, ValueType};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::VecDeque;

///
/// ScriptedResponse
///

#[derive(Clone, Debug)]
pub enum ScriptedResponse {
    Rows(Vec<Value>),
    Fail(String),
}

///
/// ScriptedEngine
///
/// Engine double: replays scripted responses in order and records every
/// request it sees. An exhausted script answers with no rows.
///

#[derive(Debug, Default)]
pub struct ScriptedEngine {
    responses: RefCell<VecDeque<ScriptedResponse>>,
    requests: RefCell<Vec<RetrievalRequest>>,
}

impl ScriptedEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rows(rows: Vec<Value>) -> Self {
        let engine = Self::default();
        engine.push_response(ScriptedResponse::Rows(rows));

        engine
    }

    pub fn push_response(&self, response: ScriptedResponse) {
        self.responses.borrow_mut().push_back(response);
    }

    /// Requests seen so far, in execution order.
    #[must_use]
    pub fn requests(&self) -> Vec<RetrievalRequest> {
        self.requests.borrow().clone()
    }
}

impl RetrievalEngine for ScriptedEngine {
    fn execute(&self, request: &RetrievalRequest) -> Result<Vec<Value>, RetrievalError> {
        self.requests.borrow_mut().push(request.clone());

        match self.responses.borrow_mut().pop_front() {
            Some(ScriptedResponse::Rows(rows)) => Ok(rows),
            Some(ScriptedResponse::Fail(message)) => Err(RetrievalError::Execution {
                query: request.query().name().to_string(),
                message,
            }),
            None => Ok(Vec::new()),
        }
    }
}

///
/// ReversedText
///
/// Descriptor whose snapshot form stores text reversed, so tests can tell
/// the live form and the disassembled form apart.
///

#[derive(Debug)]
pub struct ReversedText;

impl ReversedText {
    fn flip(value: &Value) -> Result<Value, TypeError> {
        match value {
            Value::Text(s) => Ok(Value::Text(s.chars().rev().collect())),
            other => Err(TypeError::Incompatible {
                expected: "reversed-text".to_string(),
                found: other.kind_name(),
            }),
        }
    }
}

impl ValueType for ReversedText {
    fn name(&self) -> &str {
        "reversed-text"
    }

    fn coerce(&self, value: &Value) -> Result<Value, TypeError> {
        match value {
            Value::Text(_) => Ok(value.clone()),
            other => Err(TypeError::Incompatible {
                expected: "reversed-text".to_string(),
                found: other.kind_name(),
            }),
        }
    }

    fn disassemble(
        &self,
        value: &Value,
        _context: &PersistenceContext,
        _owner: Option<&Value>,
    ) -> Result<Value, TypeError> {
        Self::flip(value)
    }

    fn assemble(
        &self,
        snapshot: &Value,
        _context: &PersistenceContext,
        _owner: Option<&Value>,
    ) -> Result<Value, TypeError> {
        Self::flip(snapshot)
    }
}
