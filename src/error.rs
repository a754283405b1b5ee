use std::path::PathBuf;
use thiserror::Error;

/// Source location: line and column (both 1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

impl Span {
    #[must_use]
    pub fn new(line: usize, col: usize) -> Self {
        Span { line, col }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Every way a conversion can fail. Any of these aborts the whole run.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to read {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("syntax error at {span}: {message}")]
    Syntax { span: Span, message: String },
    #[error("invalid argument count for macro '{name}': expected {expected}, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("unknown macro '{0}'")]
    UnknownMacro(String),
    #[error("unsupported annotation on '{target}': only Array((lo, hi)) bounds are allowed")]
    UnsupportedAnnotation { target: String },
    #[error("unsupported literal: {0}")]
    UnsupportedLiteral(String),
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
    #[error("malformed {name}() call: {reason}")]
    MalformedConstructor { name: String, reason: String },
    #[error("malformed statement: {0}")]
    MalformedStatement(String),
    #[error("unbalanced block markers at output line {line}")]
    UnbalancedBlocks { line: usize },
}

impl ConvertError {
    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        ConvertError::Syntax {
            span,
            message: message.into(),
        }
    }

    pub fn constructor(name: &str, reason: impl Into<String>) -> Self {
        ConvertError::MalformedConstructor {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
