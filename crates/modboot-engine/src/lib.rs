// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # modboot-engine
//!
//! The unit-script engine used to execute compiled module bodies.
//!
//! Module bodies emitted by the compiler's development output are flat
//! statement lists: root declarations, property assignments against those
//! roots, and calls into host-provided native functions. This crate lexes,
//! parses and runs them, reporting every failure with a line and column so
//! the loader can map it back to the unwrapped module source.
//!
//! ## Quick Start
//!
//! ```rust
//! use modboot_engine::{Engine, ObjectRef, Value};
//!
//! let mut engine = Engine::new();
//! let app = ObjectRef::new();
//! engine
//!     .eval_with(
//!         "declare-root(\"app.core\");\napp.core.answer = 42;",
//!         &[("app", Value::Object(app.clone()))],
//!     )
//!     .unwrap();
//! assert_eq!(app.keys(), vec!["core".to_string()]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod runtime;

pub use runtime::{ObjectRef, Value};

use lexer::Span;
use parking_lot::Mutex;
use parser::Parser;
use runtime::interpreter::Interpreter;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A host function callable from unit-script as `name(args...)`.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync>;

/// The main unit-script engine instance.
///
/// Globals persist across evaluations; `var` bindings and the bindings
/// passed to [`Engine::eval_with`] live only for one evaluation.
pub struct Engine {
    globals: FxHashMap<String, Value>,
    natives: FxHashMap<String, NativeFn>,
    output: Arc<Mutex<Vec<String>>>,
}

impl Engine {
    /// Creates a new engine with the `log` native installed.
    pub fn new() -> Self {
        let output = Arc::new(Mutex::new(Vec::new()));
        let mut engine = Self {
            globals: FxHashMap::default(),
            natives: FxHashMap::default(),
            output: Arc::clone(&output),
        };

        engine.register_native("log", move |args| {
            let line = args
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            output.lock().push(line);
            Ok(Value::Undefined)
        });

        engine
    }

    /// Evaluates source code and returns the value of the last expression
    /// statement.
    pub fn eval(&mut self, source: &str) -> Result<Value, Error> {
        self.eval_with(source, &[])
    }

    /// Evaluates source code with extra bindings visible as locals.
    pub fn eval_with(&mut self, source: &str, bindings: &[(&str, Value)]) -> Result<Value, Error> {
        let program = Parser::new(source).parse_program()?;
        Interpreter::new(&mut self.globals, &self.natives, bindings).run(&program)
    }

    /// Defines or replaces a global binding.
    pub fn define_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    /// Reads a global binding.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Registers a native function.
    pub fn register_native<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        self.natives.insert(name.into(), Arc::new(f));
    }

    /// Lines written by `log(...)` so far.
    pub fn output(&self) -> Vec<String> {
        self.output.lock().clone()
    }

    /// Drains the lines written by `log(...)`.
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.lock())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true if `name` is a valid unit-script identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if lexer::is_id_start(first) => chars.all(lexer::is_id_continue),
        _ => false,
    }
}

/// Returns true if `name` is spelled like an identifier but reserved as a
/// keyword, so it cannot be bound with `var`.
pub fn is_keyword(name: &str) -> bool {
    lexer::keyword(name).is_some()
}

/// Source position of an error (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number
    pub line: usize,
    /// Column number
    pub column: usize,
}

/// Categories of engine errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Syntax error during parsing
    Syntax,
    /// Type error during execution
    Type,
    /// Reference error (undefined variable)
    Reference,
    /// Value raised by a `throw` statement
    Thrown,
    /// Internal engine error
    Internal,
}

/// Errors that can occur during unit-script execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// Error category
    pub kind: ErrorKind,
    /// Message without the category prefix
    pub message: String,
    /// Where the error was raised, when known
    pub position: Option<Position>,
}

impl Error {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
        }
    }

    pub(crate) fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, message).at(span)
    }

    /// Creates a TypeError.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    /// Creates a ReferenceError.
    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Reference, message)
    }

    /// Creates an error carrying a thrown value.
    pub fn thrown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Thrown, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attaches a position unless one is already set.
    pub(crate) fn at(mut self, span: Span) -> Self {
        if self.position.is_none() {
            self.position = Some(Position {
                line: span.line,
                column: span.column,
            });
        }
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.kind {
            ErrorKind::Syntax => "SyntaxError: ",
            ErrorKind::Type => "TypeError: ",
            ErrorKind::Reference => "ReferenceError: ",
            ErrorKind::Thrown => "Uncaught ",
            ErrorKind::Internal => "InternalError: ",
        };
        write!(f, "{}{}", prefix, self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_returns_last_expression() {
        let mut engine = Engine::new();
        assert_eq!(engine.eval("var x = 3\nx").unwrap(), Value::Number(3.0));
    }

    #[test]
    fn test_log_output() {
        let mut engine = Engine::new();
        engine.eval("log('a', 1, true)").unwrap();
        engine.eval("log(null)").unwrap();
        assert_eq!(engine.take_output(), vec!["a 1 true", "null"]);
        assert!(engine.output().is_empty());
    }

    #[test]
    fn test_thrown_error_has_position() {
        let mut engine = Engine::new();
        let err = engine.eval("var a = 1\n  throw 'boom'").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Thrown);
        assert_eq!(err.to_string(), "Uncaught boom");
        assert_eq!(err.position, Some(Position { line: 2, column: 3 }));
    }

    #[test]
    fn test_globals_persist_but_locals_do_not() {
        let mut engine = Engine::new();
        engine.eval("counter = 1\nvar local = 2").unwrap();
        assert_eq!(engine.global("counter"), Some(&Value::Number(1.0)));
        let err = engine.eval("local").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Reference);
    }

    #[test]
    fn test_define_global_is_visible() {
        let mut engine = Engine::new();
        let config = ObjectRef::new();
        engine.define_global("config", Value::Object(config.clone()));
        engine.eval("config.mode = 'dev'").unwrap();
        assert_eq!(config.get("mode"), Some(Value::from("dev")));
    }

    #[test]
    fn test_native_errors_propagate() {
        let mut engine = Engine::new();
        engine.register_native("setTimeout", |_| {
            Err(Error::type_error("async functions not supported"))
        });
        let err = engine.eval("setTimeout(1)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
        assert_eq!(err.position.map(|p| p.line), Some(1));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("app"));
        assert!(is_identifier("$ROOTS"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a-b"));
    }

    #[test]
    fn test_is_keyword() {
        assert!(is_keyword("null"));
        assert!(is_keyword("var"));
        assert!(is_keyword("undefined"));
        assert!(!is_keyword("app"));
        assert!(!is_keyword("declare"));
    }
}
