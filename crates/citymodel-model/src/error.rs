// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for document reading and writing

use thiserror::Error;

/// Result type alias for reader and writer operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors raised by document readers and writers
#[derive(Error, Debug)]
pub enum ParseError {
    /// Invalid document format
    #[error("Invalid document format: {0}")]
    InvalidFormat(String),

    /// Malformed item at a given line
    #[error("Malformed item at line {line}: {message}")]
    Line { line: usize, message: String },

    /// Writer used out of order
    #[error("Invalid writer state: {0}")]
    InvalidState(String),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ParseError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }

    /// Create a line-addressed error
    pub fn line(line: usize, msg: impl Into<String>) -> Self {
        ParseError::Line {
            line,
            message: msg.into(),
        }
    }

    /// Create an invalid state error
    pub fn state(msg: impl Into<String>) -> Self {
        ParseError::InvalidState(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        ParseError::Other(msg.into())
    }
}
