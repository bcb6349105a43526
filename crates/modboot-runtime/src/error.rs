// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module loader

use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Why a transport could not produce a module's code
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RetrievalError {
    /// Nothing exists at the location
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} for {location}")]
    Status {
        /// Status code
        status: u16,
        /// Requested location
        location: String,
    },

    /// Network-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// File system failure other than not-found
    #[error("I/O error: {0}")]
    Io(String),

    /// The transport gave up waiting
    #[error("Timed out retrieving {0}")]
    Timeout(String),
}

impl From<std::io::Error> for RetrievalError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => RetrievalError::NotFound(err.to_string()),
            _ => RetrievalError::Io(err.to_string()),
        }
    }
}

/// A module body raised while being evaluated
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct EvaluationError {
    /// Module that failed
    pub module: String,
    /// Engine message, including the error category
    pub message: String,
    /// Line in the original (unwrapped) module source
    pub line: Option<usize>,
    /// Column in the original module source
    pub column: Option<usize>,
}

impl EvaluationError {
    /// `line:column` suffix for diagnostics, empty when unknown
    pub fn position(&self) -> String {
        match (self.line, self.column) {
            (Some(line), Some(column)) => format!("{}:{}", line, column),
            (Some(line), None) => line.to_string(),
            _ => String::new(),
        }
    }
}

/// Errors that can occur while loading modules
#[derive(Debug, Error)]
pub enum LoaderError {
    /// A module's code could not be retrieved
    #[error("Failed to load '{module}' from {location}: {source}")]
    Retrieval {
        /// Module id
        module: String,
        /// Resolved retrieval location
        location: String,
        /// Transport failure
        #[source]
        source: RetrievalError,
    },

    /// A module raised during evaluation
    #[error("Error evaluating '{}'{}: {}", .0.module, position_suffix(.0), .0.message)]
    Evaluation(#[from] EvaluationError),

    /// The host does not offer this operation
    #[error("{operation} is not supported by the {host} host")]
    Unsupported {
        /// Host name
        host: String,
        /// Operation name
        operation: &'static str,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid build manifest
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// File system error
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// File watcher error
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Async runtime error
    #[error("Runtime error: {0}")]
    Runtime(String),
}

fn position_suffix(err: &EvaluationError) -> String {
    let position = err.position();
    if position.is_empty() {
        position
    } else {
        format!(" at {}", position)
    }
}

impl LoaderError {
    /// Create an unsupported-operation error
    pub fn unsupported(host: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            host: host.into(),
            operation,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Module the error is about, when there is one
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::Retrieval { module, .. } => Some(module),
            Self::Evaluation(err) => Some(&err.module),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_error_display() {
        let err = LoaderError::from(EvaluationError {
            module: "app/core.js".to_string(),
            message: "Uncaught boom".to_string(),
            line: Some(3),
            column: Some(1),
        });
        assert_eq!(
            err.to_string(),
            "Error evaluating 'app/core.js' at 3:1: Uncaught boom"
        );
        assert_eq!(err.module(), Some("app/core.js"));
    }

    #[test]
    fn test_retrieval_error_display() {
        let err = LoaderError::Retrieval {
            module: "b.js".to_string(),
            location: "http://localhost/js/b.js".to_string(),
            source: RetrievalError::Status {
                status: 404,
                location: "http://localhost/js/b.js".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Failed to load 'b.js' from http://localhost/js/b.js: HTTP 404 for http://localhost/js/b.js"
        );
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(RetrievalError::from(io), RetrievalError::NotFound(_)));
    }
}
