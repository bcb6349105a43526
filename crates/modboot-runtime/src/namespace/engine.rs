// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The host's code execution capability

use super::scope::SCOPE_BINDING;
use modboot_engine::{Engine, ObjectRef, Value};

/// Engine failure with a position in the executed source
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    /// Message including the error category
    pub message: String,
    /// 1-based line, when known
    pub line: Option<usize>,
    /// 1-based column, when known
    pub column: Option<usize>,
}

/// Something that can execute a wrapped unit.
///
/// `scope` must be visible to the unit as `$ROOTS`. Evaluations never
/// overlap, so implementations need not be `Sync`.
pub trait ScriptEngine: Send {
    /// Execute `source` with the scope holder bound
    fn execute(&mut self, source: &str, scope: &ObjectRef) -> Result<(), ScriptError>;

    /// Make calls to `name` fail with `message`
    fn bind_unsupported(&mut self, name: &str, message: &'static str);

    /// Drain any output the executed code produced
    fn take_output(&mut self) -> Vec<String> {
        Vec::new()
    }
}

impl ScriptEngine for Engine {
    fn execute(&mut self, source: &str, scope: &ObjectRef) -> Result<(), ScriptError> {
        self.eval_with(source, &[(SCOPE_BINDING, Value::Object(scope.clone()))])
            .map(|_| ())
            .map_err(|err| ScriptError {
                message: err.to_string(),
                line: err.position.map(|p| p.line),
                column: err.position.map(|p| p.column),
            })
    }

    fn bind_unsupported(&mut self, name: &str, message: &'static str) {
        self.register_native(name, move |_| Err(modboot_engine::Error::type_error(message)));
    }

    fn take_output(&mut self) -> Vec<String> {
        Engine::take_output(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_is_bound() {
        let mut engine = Engine::new();
        let scope = ObjectRef::new();
        ScriptEngine::execute(&mut engine, "$ROOTS.seen = true", &scope).unwrap();
        assert_eq!(scope.get("seen"), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_unsupported_binding_fails() {
        let mut engine = Engine::new();
        engine.bind_unsupported("setTimeout", "timers are not supported");
        let err = engine
            .execute("\nsetTimeout(1)", &ObjectRef::new())
            .unwrap_err();
        assert_eq!(err.message, "TypeError: timers are not supported");
        assert_eq!(err.line, Some(2));
    }
}
