// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Abstract syntax tree for unit-script programs.

use crate::lexer::Span;

/// A parsed program: the statements of one module body.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Statements in source order
    pub body: Vec<Statement>,
}

/// A statement together with the span of its first token.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// What the statement does
    pub kind: StatementKind,
    /// Where it starts
    pub span: Span,
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `var name = init;`
    Var {
        /// Bound name
        name: String,
        /// Initializer (`undefined` when omitted)
        init: Expression,
    },
    /// `declare-root("a.b.c");`
    DeclareRoot {
        /// The dotted path as written
        path: String,
    },
    /// `a.b.c = value;`
    Assign {
        /// Assignment target, split on dots
        target: Vec<String>,
        /// Assigned value
        value: Expression,
    },
    /// `throw value;`
    Throw(Expression),
    /// `name(args...);`
    Call {
        /// Native function name
        callee: String,
        /// Arguments
        arguments: Vec<Expression>,
    },
    /// A bare expression evaluated for its value.
    Expression(Expression),
}

/// Expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// `true` / `false`
    Boolean(bool),
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `{}`, a fresh empty object
    EmptyObject,
    /// `a.b.c` read
    Path(Vec<String>),
}
