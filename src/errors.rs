// ABOUTME: Error types for syntax and runtime failures in the CheckerLang interpreter

use crate::lexer::SourcePos;
use crate::values::Value;
use thiserror::Error;

fn format_pos(pos: &Option<SourcePos>) -> String {
    match pos {
        Some(pos) => format!(" ({})", pos),
        None => String::new(),
    }
}

fn value_tag(value: &Value) -> String {
    value.as_string().unwrap_or_else(|_| value.to_string())
}

/// Raised by the lexer and parser. Not catchable from the language.
#[derive(Error, Debug, Clone)]
#[error("{}{}", .msg, format_pos(.pos))]
pub struct SyntaxError {
    pub msg: String,
    pub pos: Option<SourcePos>,
}

impl SyntaxError {
    pub fn new(msg: impl Into<String>, pos: SourcePos) -> Self {
        SyntaxError {
            msg: msg.into(),
            pos: Some(pos),
        }
    }

    pub fn without_pos(msg: impl Into<String>) -> Self {
        SyntaxError {
            msg: msg.into(),
            pos: None,
        }
    }
}

/// Raised by the evaluator and builtins. Carries the error value used by
/// `catch` clauses and accumulates one stack-trace line per unwound call.
#[derive(Error, Debug, Clone)]
#[error("{}: {}{}", value_tag(.value), .msg, format_pos(.pos))]
pub struct RuntimeError {
    pub value: Value,
    pub msg: String,
    pub pos: Option<SourcePos>,
    pub stacktrace: Vec<String>,
}

impl RuntimeError {
    /// Create a plain error with the default "ERROR" value tag.
    pub fn new(msg: impl Into<String>, pos: &SourcePos) -> Self {
        RuntimeError {
            value: Value::string("ERROR"),
            msg: msg.into(),
            pos: Some(pos.clone()),
            stacktrace: Vec::new(),
        }
    }

    /// Create an error without a known source position; the caller attaches
    /// one via `at`.
    pub fn without_pos(msg: impl Into<String>) -> Self {
        RuntimeError {
            value: Value::string("ERROR"),
            msg: msg.into(),
            pos: None,
            stacktrace: Vec::new(),
        }
    }

    /// Create an error carrying an explicit value, as raised by `error expr`.
    pub fn with_value(value: Value, msg: impl Into<String>, pos: &SourcePos) -> Self {
        RuntimeError {
            value,
            msg: msg.into(),
            pos: Some(pos.clone()),
            stacktrace: Vec::new(),
        }
    }

    pub fn at(mut self, pos: &SourcePos) -> Self {
        if self.pos.is_none() {
            self.pos = Some(pos.clone());
        }
        self
    }
}

#[derive(Error, Debug, Clone)]
pub enum CklError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
