// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Token definitions for the unit-script lexer.

/// A span in the source code with its 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Line of the first character (1-based)
    pub line: usize,
    /// Column of the first character (1-based, in chars)
    pub column: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Returns the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source code
    pub span: Span,
    /// Whether a line terminator precedes this token.
    ///
    /// Statements end at a `;` or at a line break, so the parser needs to
    /// know where the breaks were even though they are not tokens.
    pub newline_before: bool,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span, newline_before: bool) -> Self {
        Self {
            kind,
            span,
            newline_before,
        }
    }
}

/// The different kinds of tokens in unit-script source.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal
    Number(f64),
    /// String literal (escapes already resolved)
    String(String),
    /// Identifier
    Identifier(String),

    // Keywords
    /// `var`
    Var,
    /// `throw`
    Throw,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `declare-root`
    DeclareRoot,

    // Punctuation
    /// `.`
    Dot,
    /// `=`
    Equal,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `-`
    Minus,

    /// An unterminated string literal
    UnterminatedString,
    /// A character the language does not know
    Invalid(char),
    /// End of input
    Eof,
}

impl TokenKind {
    /// Human readable description used in syntax errors.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::String(s) => format!("string \"{}\"", s),
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::Var => "'var'".to_string(),
            TokenKind::Throw => "'throw'".to_string(),
            TokenKind::True => "'true'".to_string(),
            TokenKind::False => "'false'".to_string(),
            TokenKind::Null => "'null'".to_string(),
            TokenKind::Undefined => "'undefined'".to_string(),
            TokenKind::DeclareRoot => "'declare-root'".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Equal => "'='".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::LeftParen => "'('".to_string(),
            TokenKind::RightParen => "')'".to_string(),
            TokenKind::LeftBrace => "'{'".to_string(),
            TokenKind::RightBrace => "'}'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::UnterminatedString => "unterminated string".to_string(),
            TokenKind::Invalid(ch) => format!("'{}'", ch),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}
