//! Public API types - external contracts of the engine facade

use serde::{Deserialize, Serialize};

use crate::parser::ParseError;
use crate::runtime::manager::GameState;
use crate::types::directive::Directive;

/// Result of one engine tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Global state derived after the tick
    pub state: GameState,
    /// Directives emitted during the tick, in order
    pub directives: Vec<Directive>,
}

/// Errors returned by the public API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Script parse error with location information
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    /// Invalid operation or state
    #[error("invalid operation: {0}")]
    Invalid(String),
    /// Asset loading error
    #[error("asset error: {0}")]
    Asset(String),
}

impl ApiError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn asset(message: impl Into<String>) -> Self {
        Self::Asset(message.into())
    }
}

impl From<ParseError> for ApiError {
    fn from(error: ParseError) -> Self {
        let line = match &error {
            ParseError::MissingParameter { line, .. }
            | ParseError::InvalidValue { line, .. }
            | ParseError::UndefinedLabel { line, .. }
            | ParseError::DuplicateLabel { line, .. }
            | ParseError::InvalidSyntax { line, .. } => *line,
            ParseError::Validation { .. } => 0,
        };
        ApiError::parse(line, error.to_string())
    }
}
