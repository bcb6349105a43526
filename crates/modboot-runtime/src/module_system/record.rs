// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Per-module load state

use crate::error::{EvaluationError, RetrievalError};
use std::sync::Arc;

/// Retrieved module code
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    /// Module source exactly as retrieved
    pub code: Arc<str>,
}

impl Payload {
    /// Wrap retrieved code
    pub fn new(code: impl Into<Arc<str>>) -> Self {
        Self { code: code.into() }
    }
}

/// Why a module ended up `Failed`
#[derive(Debug, Clone, PartialEq)]
pub enum FailureCause {
    /// The transport could not produce the code
    Retrieval(RetrievalError),
    /// The code raised while being evaluated
    Evaluation(EvaluationError),
}

/// Load state of one module
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleState {
    /// Retrieval initiated, code not yet available
    Requested,
    /// Code available, waiting for its predecessors to evaluate
    Retrieved(Payload),
    /// Evaluated (or force-marked as such)
    Evaluated,
    /// Retrieval or evaluation failed
    Failed(FailureCause),
}

impl ModuleState {
    /// `Evaluated` and `Failed` accept no further regular transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, ModuleState::Evaluated | ModuleState::Failed(_))
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            ModuleState::Requested => "requested",
            ModuleState::Retrieved(_) => "retrieved",
            ModuleState::Evaluated => "evaluated",
            ModuleState::Failed(FailureCause::Retrieval(_)) => "retrieval-failed",
            ModuleState::Failed(FailureCause::Evaluation(_)) => "evaluation-failed",
        }
    }
}

/// What the build collaborator says about one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    /// Module id (also its path relative to the retrieval base)
    pub id: String,
    /// Resolved retrieval location
    pub location: String,
    /// Whether a `<id>.map` source map sits next to the module
    pub has_source_map: bool,
}

/// Tracked module
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRecord {
    /// Module id
    pub id: String,
    /// Resolved retrieval location
    pub location: String,
    /// Whether a source map is available
    pub has_source_map: bool,
    /// Current state
    pub state: ModuleState,
}

impl ModuleRecord {
    /// Create a record in the `Requested` state
    pub fn requested(spec: &ModuleSpec) -> Self {
        Self {
            id: spec.id.clone(),
            location: spec.location.clone(),
            has_source_map: spec.has_source_map,
            state: ModuleState::Requested,
        }
    }

    /// Move forward along `Requested -> Retrieved -> Evaluated | Failed`.
    ///
    /// Returns false (and leaves the record untouched) for any transition
    /// that would go backwards or leave a terminal state.
    pub fn advance(&mut self, next: ModuleState) -> bool {
        let allowed = match (&self.state, &next) {
            (ModuleState::Requested, ModuleState::Requested) => false,
            (ModuleState::Requested, _) => true,
            (ModuleState::Retrieved(_), ModuleState::Evaluated | ModuleState::Failed(_)) => true,
            _ => false,
        };
        if allowed {
            self.state = next;
        }
        allowed
    }

    /// True once evaluated
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModuleState::Evaluated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ModuleRecord {
        ModuleRecord::requested(&ModuleSpec {
            id: "a.js".to_string(),
            location: "/out/a.js".to_string(),
            has_source_map: false,
        })
    }

    #[test]
    fn test_forward_transitions() {
        let mut record = record();
        assert!(record.advance(ModuleState::Retrieved(Payload::new("log(1)"))));
        assert!(record.advance(ModuleState::Evaluated));
        assert!(record.is_loaded());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut record = record();
        assert!(record.advance(ModuleState::Failed(FailureCause::Retrieval(
            RetrievalError::NotFound("a.js".to_string())
        ))));
        assert!(!record.advance(ModuleState::Retrieved(Payload::new(""))));
        assert!(!record.advance(ModuleState::Evaluated));
        assert_eq!(record.state.label(), "retrieval-failed");
    }

    #[test]
    fn test_no_backward_transition() {
        let mut record = record();
        record.advance(ModuleState::Retrieved(Payload::new("x")));
        assert!(!record.advance(ModuleState::Requested));
        assert!(!record.advance(ModuleState::Retrieved(Payload::new("y"))));
        assert_eq!(record.state, ModuleState::Retrieved(Payload::new("x")));
    }
}
