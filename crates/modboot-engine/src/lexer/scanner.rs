// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The scanner that produces tokens from source text.

use super::{Span, Token, TokenKind};

/// A scanner that tokenizes unit-script source code.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        let newline_before = self.skip_whitespace_and_comments();

        let start = self.current_pos;
        let (line, column) = (self.line, self.column);

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, line, column),
                newline_before,
            );
        };

        let kind = match ch {
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '=' => TokenKind::Equal,
            '-' => TokenKind::Minus,

            '"' | '\'' => self.scan_string(ch),

            '0'..='9' => self.scan_number(ch),

            _ if is_id_start(ch) => self.scan_identifier(ch),

            _ => TokenKind::Invalid(ch),
        };

        Token::new(
            kind,
            Span::new(start, self.current_pos, line, column),
            newline_before,
        )
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, ch)| ch)
    }

    /// Skips trivia and reports whether a line terminator was crossed.
    fn skip_whitespace_and_comments(&mut self) -> bool {
        let mut newline = false;
        loop {
            match self.peek() {
                Some('\n') => {
                    newline = true;
                    self.advance();
                }
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        // Covers `//# sourceURL=` trailers too
                        while let Some(ch) = self.peek() {
                            if ch == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        let mut prev = ' ';
                        while let Some(ch) = self.peek() {
                            self.advance();
                            if ch == '\n' {
                                newline = true;
                            }
                            if prev == '*' && ch == '/' {
                                break;
                            }
                            prev = ch;
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        newline
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => return TokenKind::UnterminatedString,
                Some(ch) if ch == quote => {
                    self.advance();
                    return TokenKind::String(value);
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some((_, 'n')) => value.push('\n'),
                        Some((_, 't')) => value.push('\t'),
                        Some((_, 'r')) => value.push('\r'),
                        Some((_, '0')) => value.push('\0'),
                        Some((_, other)) => value.push(other),
                        None => return TokenKind::UnterminatedString,
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        let mut seen_dot = false;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                if ch != '_' {
                    text.push(ch);
                }
                self.advance();
            } else if ch == '.' && !seen_dot && matches!(self.peek_next(), Some('0'..='9')) {
                seen_dot = true;
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match text.parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Invalid(first),
        }
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);

        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if name == "declare" && self.source[self.current_pos..].starts_with("-root") {
            let after = self.source[self.current_pos + "-root".len()..].chars().next();
            if !after.is_some_and(is_id_continue) {
                for _ in 0.."-root".len() {
                    self.advance();
                }
                return TokenKind::DeclareRoot;
            }
        }

        keyword(&name).unwrap_or(TokenKind::Identifier(name))
    }
}

/// The keyword token spelled `name`, if any.
pub(crate) fn keyword(name: &str) -> Option<TokenKind> {
    match name {
        "var" => Some(TokenKind::Var),
        "throw" => Some(TokenKind::Throw),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        "null" => Some(TokenKind::Null),
        "undefined" => Some(TokenKind::Undefined),
        _ => None,
    }
}

/// Checks if a character can start an identifier.
pub(crate) fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Checks if a character can continue an identifier.
pub(crate) fn is_id_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        assert_eq!(
            kinds("{ } ( ) ; , . ="),
            vec![
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Equal,
            ]
        );
    }

    #[test]
    fn test_declare_root_keyword() {
        let tokens = kinds("declare-root(\"app.core\");");
        assert_eq!(tokens[0], TokenKind::DeclareRoot);
        assert_eq!(tokens[2], TokenKind::String("app.core".to_string()));
    }

    #[test]
    fn test_declare_minus_is_not_keyword() {
        let tokens = kinds("declare-rooted");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Identifier("declare".to_string()),
                TokenKind::Minus,
                TokenKind::Identifier("rooted".to_string()),
            ]
        );
    }

    #[test]
    fn test_numbers_and_strings() {
        let tokens = kinds("42 3.5 'it\\'s' \"a\\nb\"");
        assert_eq!(tokens[0], TokenKind::Number(42.0));
        assert_eq!(tokens[1], TokenKind::Number(3.5));
        assert_eq!(tokens[2], TokenKind::String("it's".to_string()));
        assert_eq!(tokens[3], TokenKind::String("a\nb".to_string()));
    }

    #[test]
    fn test_comments_and_positions() {
        let mut scanner = Scanner::new("// header\n/* block\n */ x\n//# sourceURL=a.js\n");
        let token = scanner.next_token();
        assert_eq!(token.kind, TokenKind::Identifier("x".to_string()));
        assert!(token.newline_before);
        assert_eq!(token.span.line, 3);
        assert_eq!(token.span.column, 5);
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(kinds("'abc"), vec![TokenKind::UnterminatedString]);
    }
}
