// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tree-walking interpreter for unit-script programs.

use super::value::{ObjectRef, Value};
use crate::ast::{Expression, Program, Statement, StatementKind};
use crate::{Error, NativeFn};
use rustc_hash::FxHashMap;

/// Executes one program against a fresh local scope.
///
/// Locals shadow bindings, bindings shadow globals. Only assignments to a
/// bare name that is not local reach the globals.
pub(crate) struct Interpreter<'e> {
    globals: &'e mut FxHashMap<String, Value>,
    natives: &'e FxHashMap<String, NativeFn>,
    locals: FxHashMap<String, Value>,
}

impl<'e> Interpreter<'e> {
    pub(crate) fn new(
        globals: &'e mut FxHashMap<String, Value>,
        natives: &'e FxHashMap<String, NativeFn>,
        bindings: &[(&str, Value)],
    ) -> Self {
        let locals = bindings
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        Self {
            globals,
            natives,
            locals,
        }
    }

    /// Runs every statement, returning the value of the last expression statement.
    pub(crate) fn run(&mut self, program: &Program) -> Result<Value, Error> {
        let mut completion = Value::Undefined;
        for statement in &program.body {
            completion = self.execute(statement)?;
        }
        Ok(completion)
    }

    fn execute(&mut self, statement: &Statement) -> Result<Value, Error> {
        let span = statement.span;
        match &statement.kind {
            StatementKind::Var { name, init } => {
                let value = self.evaluate(init).map_err(|e| e.at(span))?;
                self.locals.insert(name.clone(), value);
                Ok(Value::Undefined)
            }
            StatementKind::DeclareRoot { path } => {
                self.declare_root(path).map_err(|e| e.at(span))?;
                Ok(Value::Undefined)
            }
            StatementKind::Assign { target, value } => {
                let value = self.evaluate(value).map_err(|e| e.at(span))?;
                self.assign(target, value.clone()).map_err(|e| e.at(span))?;
                Ok(value)
            }
            StatementKind::Throw(expr) => {
                let value = self.evaluate(expr).map_err(|e| e.at(span))?;
                Err(Error::thrown(value.to_string()).at(span))
            }
            StatementKind::Call { callee, arguments } => {
                let native = self.natives.get(callee).cloned().ok_or_else(|| {
                    if self.lookup(callee).is_some() {
                        Error::type_error(format!("{} is not a function", callee)).at(span)
                    } else {
                        Error::reference_error(format!("{} is not defined", callee)).at(span)
                    }
                })?;
                let args = arguments
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| e.at(span))?;
                native(&args).map_err(|e| e.at(span))
            }
            StatementKind::Expression(expr) => self.evaluate(expr).map_err(|e| e.at(span)),
        }
    }

    fn evaluate(&self, expr: &Expression) -> Result<Value, Error> {
        Ok(match expr {
            Expression::Number(n) => Value::Number(*n),
            Expression::String(s) => Value::String(s.clone()),
            Expression::Boolean(b) => Value::Boolean(*b),
            Expression::Null => Value::Null,
            Expression::Undefined => Value::Undefined,
            Expression::EmptyObject => Value::Object(ObjectRef::new()),
            Expression::Path(path) => self.read_path(path)?,
        })
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        self.locals
            .get(name)
            .or_else(|| self.globals.get(name))
            .cloned()
    }

    fn read_path(&self, path: &[String]) -> Result<Value, Error> {
        let (head, rest) = split_path(path)?;
        let mut value = self
            .lookup(head)
            .ok_or_else(|| Error::reference_error(format!("{} is not defined", head)))?;

        for key in rest {
            value = match &value {
                Value::Object(obj) => obj.get(key).unwrap_or(Value::Undefined),
                other => {
                    return Err(Error::type_error(format!(
                        "Cannot read properties of {} (reading '{}')",
                        other, key
                    )));
                }
            };
        }
        Ok(value)
    }

    fn assign(&mut self, target: &[String], value: Value) -> Result<(), Error> {
        let (head, rest) = split_path(target)?;

        let Some((last, middle)) = rest.split_last() else {
            if self.locals.contains_key(head) {
                self.locals.insert(head.to_string(), value);
            } else {
                self.globals.insert(head.to_string(), value);
            }
            return Ok(());
        };

        let mut container = self.read_path(std::slice::from_ref(&target[0]))?;
        for key in middle {
            container = match &container {
                Value::Object(obj) => obj.get(key).unwrap_or(Value::Undefined),
                other => {
                    return Err(Error::type_error(format!(
                        "Cannot read properties of {} (reading '{}')",
                        other, key
                    )));
                }
            };
        }

        match container {
            Value::Object(obj) => {
                obj.set(last.clone(), value);
                Ok(())
            }
            other => Err(Error::type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                other, last
            ))),
        }
    }

    /// Creates every missing object along `path`, starting at the bound root.
    fn declare_root(&self, path: &str) -> Result<(), Error> {
        let mut segments = path.split('.');
        let head = segments.next().unwrap_or_default();
        let root = match self.lookup(head) {
            Some(Value::Object(obj)) => obj,
            Some(other) => {
                return Err(Error::type_error(format!(
                    "Root '{}' is bound to {} instead of an object",
                    head,
                    other.type_of()
                )));
            }
            None => return Err(Error::reference_error(format!("{} is not defined", head))),
        };

        let mut current = root;
        for segment in segments {
            current = current.get_or_insert_object(segment).ok_or_else(|| {
                Error::type_error(format!(
                    "Cannot declare '{}': '{}' is already defined as a non-object",
                    path, segment
                ))
            })?;
        }
        Ok(())
    }
}

fn split_path(path: &[String]) -> Result<(&str, &[String]), Error> {
    match path.split_first() {
        Some((head, rest)) => Ok((head.as_str(), rest)),
        None => Err(Error::internal("empty property path")),
    }
}
