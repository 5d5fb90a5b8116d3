//! Scanner and parser errors. Both are collected, never fatal (§4.3, §7).

use thiserror::Error;

use crate::tokens::Location;

/// A syntax error raised during parsing, with best-effort recovery
/// continuing past it: a message plus the span it refers to, nothing
/// more.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SqlSyntaxError {
    pub location: Location,
    pub message: String,
}

impl SqlSyntaxError {
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        SqlSyntaxError {
            location,
            message: message.into(),
        }
    }
}
