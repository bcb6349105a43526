// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical analysis for unit-script source code.
//!
//! - `scanner.rs` - `Scanner` producing tokens with line/column spans
//! - `token.rs` - `Token` and `TokenKind` definitions
//!
//! ```rust
//! use modboot_engine::lexer::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::new("var x = 42;");
//! assert_eq!(scanner.next_token().kind, TokenKind::Var);
//! ```

mod scanner;
mod token;

pub use scanner::Scanner;
pub(crate) use scanner::{is_id_continue, is_id_start, keyword};
pub use token::{Span, Token, TokenKind};
