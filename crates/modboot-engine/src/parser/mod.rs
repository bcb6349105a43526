// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Recursive descent parser for unit-script.
//!
//! A statement ends at `;`, at a line break, or at end of input.

use crate::Error;
use crate::ast::*;
use crate::lexer::{Scanner, Span, Token, TokenKind};

/// A recursive descent parser for unit-script.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self { scanner, current }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program, Error> {
        let mut body = Vec::new();

        loop {
            while self.check(&TokenKind::Semicolon) {
                self.advance();
            }
            if self.is_at_end() {
                break;
            }
            body.push(self.parse_statement()?);
        }

        Ok(Program { body })
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement, Error> {
        let span = self.current.span;
        let kind = match &self.current.kind {
            TokenKind::Var => self.parse_var()?,
            TokenKind::DeclareRoot => self.parse_declare_root()?,
            TokenKind::Throw => {
                self.advance();
                StatementKind::Throw(self.parse_expression()?)
            }
            TokenKind::Identifier(_) => self.parse_identifier_statement()?,
            _ => StatementKind::Expression(self.parse_expression()?),
        };
        self.end_statement()?;
        Ok(Statement { kind, span })
    }

    fn parse_var(&mut self) -> Result<StatementKind, Error> {
        self.advance(); // consume 'var'
        let name = self.expect_identifier()?;
        let init = if self.check(&TokenKind::Equal) {
            self.advance();
            self.parse_expression()?
        } else {
            Expression::Undefined
        };
        Ok(StatementKind::Var { name, init })
    }

    fn parse_declare_root(&mut self) -> Result<StatementKind, Error> {
        self.advance(); // consume 'declare-root'
        self.expect(&TokenKind::LeftParen)?;
        let path = match &self.current.kind {
            TokenKind::String(s) => s.clone(),
            other => return Err(self.unexpected(other.clone())),
        };
        self.advance();
        self.expect(&TokenKind::RightParen)?;

        let keyword_root = path.split('.').next().is_some_and(crate::is_keyword);
        if keyword_root || path.split('.').any(|segment| !crate::is_identifier(segment)) {
            return Err(Error::syntax(
                format!("Invalid root declaration \"{}\"", path),
                self.current.span,
            ));
        }
        Ok(StatementKind::DeclareRoot { path })
    }

    fn parse_identifier_statement(&mut self) -> Result<StatementKind, Error> {
        let path = self.parse_path()?;

        match self.current.kind {
            TokenKind::Equal if !self.current.newline_before => {
                self.advance();
                let value = self.parse_expression()?;
                Ok(StatementKind::Assign {
                    target: path,
                    value,
                })
            }
            TokenKind::LeftParen if !self.current.newline_before && path.len() == 1 => {
                self.advance();
                let arguments = self.parse_arguments()?;
                Ok(StatementKind::Call {
                    callee: path.into_iter().next().unwrap_or_default(),
                    arguments,
                })
            }
            _ => Ok(StatementKind::Expression(Expression::Path(path))),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, Error> {
        let mut arguments = Vec::new();
        if self.check(&TokenKind::RightParen) {
            self.advance();
            return Ok(arguments);
        }
        loop {
            arguments.push(self.parse_expression()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            self.expect(&TokenKind::RightParen)?;
            return Ok(arguments);
        }
    }

    /// Parses an expression.
    pub fn parse_expression(&mut self) -> Result<Expression, Error> {
        let expr = match self.current.kind.clone() {
            TokenKind::Number(n) => {
                self.advance();
                Expression::Number(n)
            }
            TokenKind::Minus => {
                self.advance();
                match self.current.kind {
                    TokenKind::Number(n) => {
                        self.advance();
                        Expression::Number(-n)
                    }
                    ref other => return Err(self.unexpected(other.clone())),
                }
            }
            TokenKind::String(s) => {
                self.advance();
                Expression::String(s)
            }
            TokenKind::True => {
                self.advance();
                Expression::Boolean(true)
            }
            TokenKind::False => {
                self.advance();
                Expression::Boolean(false)
            }
            TokenKind::Null => {
                self.advance();
                Expression::Null
            }
            TokenKind::Undefined => {
                self.advance();
                Expression::Undefined
            }
            TokenKind::LeftBrace => {
                self.advance();
                self.expect(&TokenKind::RightBrace)?;
                Expression::EmptyObject
            }
            TokenKind::Identifier(_) => Expression::Path(self.parse_path()?),
            other => return Err(self.unexpected(other)),
        };
        Ok(expr)
    }

    fn parse_path(&mut self) -> Result<Vec<String>, Error> {
        let mut path = vec![self.expect_identifier()?];
        while self.check(&TokenKind::Dot) {
            self.advance();
            path.push(self.expect_identifier()?);
        }
        Ok(path)
    }

    fn end_statement(&mut self) -> Result<(), Error> {
        if self.check(&TokenKind::Semicolon) {
            self.advance();
            return Ok(());
        }
        if self.current.newline_before || self.is_at_end() {
            return Ok(());
        }
        Err(self.unexpected(self.current.kind.clone()))
    }

    fn expect_identifier(&mut self) -> Result<String, Error> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.unexpected(other.clone())),
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), Error> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(Error::syntax(
                format!(
                    "Expected {} but found {}",
                    kind.describe(),
                    self.current.kind.describe()
                ),
                self.current.span,
            ))
        }
    }

    fn unexpected(&self, kind: TokenKind) -> Error {
        let span: Span = self.current.span;
        match kind {
            TokenKind::Eof => Error::syntax("Unexpected end of input", span),
            TokenKind::UnterminatedString => Error::syntax("Unterminated string literal", span),
            other => Error::syntax(format!("Unexpected {}", other.describe()), span),
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn advance(&mut self) {
        self.current = self.scanner.next_token();
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }
}
