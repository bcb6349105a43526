// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Diagnostic sink
//!
//! Every failure the loader sees ends up here, whether or not it is also
//! propagated. Entries are emitted through `tracing` as they are recorded.

use crate::error::{EvaluationError, RetrievalError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, warn};

/// What kind of failure a diagnostic describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The transport could not produce the code
    Retrieval,
    /// The code raised during evaluation
    Evaluation,
}

/// One recorded failure
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Failure kind
    pub kind: DiagnosticKind,
    /// Failing module id
    pub module: String,
    /// Retrieval location of the module
    pub location: String,
    /// Underlying error message
    pub message: String,
    /// Line in the module body
    pub line: Option<usize>,
    /// Column in the module body
    pub column: Option<usize>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Retrieval => "retrieval",
            DiagnosticKind::Evaluation => "evaluation",
        };
        write!(f, "[{}] {} ({})", kind, self.module, self.location)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(column) = self.column {
                write!(f, ":{}", column)?;
            }
        }
        write!(f, ": {}", self.message)
    }
}

/// Warning emitted by fail-forward hosts after an evaluation failure
pub fn continuation_warning(module: &str) -> String {
    format!(
        "The above error occurred when loading \"{}\". Any additional errors after that one may be the result of that failure. In general your code cannot be trusted to execute properly after such a failure. Make sure to fix the first one before looking at others.",
        module
    )
}

/// Shared, append-only list of diagnostics
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl Diagnostics {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a retrieval failure
    pub fn retrieval(&self, module: &str, location: &str, err: &RetrievalError) {
        error!(module, location, "retrieval failed: {}", err);
        self.push(Diagnostic {
            kind: DiagnosticKind::Retrieval,
            module: module.to_string(),
            location: location.to_string(),
            message: err.to_string(),
            line: None,
            column: None,
        });
    }

    /// Record an evaluation failure; `fail_forward` adds the continuation
    /// warning.
    pub fn evaluation(&self, location: &str, err: &EvaluationError, fail_forward: bool) {
        error!(
            module = %err.module,
            location,
            position = %err.position(),
            "evaluation failed: {}",
            err.message
        );
        if fail_forward {
            warn!("{}", continuation_warning(&err.module));
        }
        self.push(Diagnostic {
            kind: DiagnosticKind::Evaluation,
            module: err.module.clone(),
            location: location.to_string(),
            message: err.message.clone(),
            line: err.line,
            column: err.column,
        });
    }

    fn push(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }

    /// Snapshot of every diagnostic so far
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Number of diagnostics
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if nothing failed
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_evaluation_failure() {
        let sink = Diagnostics::new();
        sink.evaluation(
            "/out/b.js",
            &EvaluationError {
                module: "b.js".to_string(),
                message: "Uncaught boom".to_string(),
                line: Some(2),
                column: Some(5),
            },
            true,
        );

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, DiagnosticKind::Evaluation);
        assert_eq!(entries[0].to_string(), "[evaluation] b.js (/out/b.js):2:5: Uncaught boom");
    }

    #[test]
    fn test_clones_share_entries() {
        let sink = Diagnostics::new();
        let other = sink.clone();
        other.retrieval("a.js", "/out/a.js", &RetrievalError::NotFound("/out/a.js".into()));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.entries()[0].message, "Not found: /out/a.js");
    }

    #[test]
    fn test_continuation_warning_names_module() {
        assert!(continuation_warning("app/core.js")
            .starts_with("The above error occurred when loading \"app/core.js\". Any additional errors"));
    }
}
