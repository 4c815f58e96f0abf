// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the lexeme cursor the grammar parsers advance over.

use crate::lexer::{read_lexemes, LexError, Lexeme, LexemeKind};

/// Errors produced while parsing a lexeme stream into an AST.
///
/// Syntax errors are fatal for the current parse; no partial AST is built
/// and all intermediate state is dropped on return.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected {found:?} at offset {at}, expected {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
        at: u32,
    },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("missing keyword {keyword:?} at offset {at}")]
    MissingKeyword { keyword: &'static str, at: u32 },
    #[error("malformed tuple at offset {at}")]
    MalformedTuple { at: u32 },
    #[error("unknown frame boundary {found:?} at offset {at}")]
    UnknownFrameBoundary { found: String, at: u32 },
    #[error("parse cancelled")]
    Cancelled,
}

impl ParseError {
    pub(crate) fn unexpected(lexeme: &Lexeme, expected: impl Into<String>) -> Self {
        if lexeme.kind == LexemeKind::EndOfInput {
            Self::UnexpectedEof {
                expected: expected.into(),
            }
        } else {
            Self::UnexpectedToken {
                expected: expected.into(),
                found: lexeme.text.clone(),
                at: lexeme.offset(),
            }
        }
    }
}

/// Cursor over a tokenized statement. The buffer always ends with an
/// `EndOfInput` sentinel, so `current()` is total.
#[derive(Debug)]
pub struct Parser {
    lexemes: Vec<Lexeme>,
    pos: usize,
}

impl Parser {
    pub fn new(sql: &str) -> Result<Self, LexError> {
        Ok(Self::from_lexemes(read_lexemes(sql)?))
    }

    pub(crate) fn from_lexemes(lexemes: Vec<Lexeme>) -> Self {
        debug_assert!(matches!(
            lexemes.last().map(|l| l.kind),
            Some(LexemeKind::EndOfInput)
        ));
        Self { lexemes, pos: 0 }
    }

    pub(crate) fn current(&self) -> &Lexeme {
        &self.lexemes[self.pos.min(self.lexemes.len() - 1)]
    }

    pub(crate) fn nth(&self, n: usize) -> &Lexeme {
        let idx = (self.pos + n).min(self.lexemes.len() - 1);
        &self.lexemes[idx]
    }

    pub(crate) fn finished(&self) -> bool {
        self.current().kind == LexemeKind::EndOfInput
    }

    pub(crate) fn at(&self, kind: LexemeKind) -> bool {
        self.current().kind == kind
    }

    pub(crate) fn at_command(&self, text: &str) -> bool {
        self.at_kind_text(LexemeKind::Command, text)
    }

    pub(crate) fn at_keyword(&self, text: &str) -> bool {
        self.at_kind_text(LexemeKind::Keyword, text)
    }

    pub(crate) fn at_operator(&self, text: &str) -> bool {
        self.at_kind_text(LexemeKind::Operator, text)
    }

    fn at_kind_text(&self, kind: LexemeKind, text: &str) -> bool {
        let current = self.current();
        current.kind == kind && current.text == text
    }

    /// Advances and returns the consumed lexeme. Stays put on the sentinel.
    pub(crate) fn bump(&mut self) -> Lexeme {
        let lexeme = self.current().clone();
        if !self.finished() {
            self.pos += 1;
        }
        lexeme
    }

    pub(crate) fn eat(&mut self, kind: LexemeKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_command(&mut self, text: &str) -> bool {
        if self.at_command(text) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_keyword(&mut self, text: &str) -> bool {
        if self.at_keyword(text) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_operator(&mut self, text: &str) -> bool {
        if self.at_operator(text) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(
        &mut self,
        kind: LexemeKind,
        expected: &str,
    ) -> Result<Lexeme, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(ParseError::unexpected(self.current(), expected))
        }
    }

    pub(crate) fn expect_command(&mut self, text: &'static str) -> Result<Lexeme, ParseError> {
        if self.at_command(text) {
            Ok(self.bump())
        } else {
            Err(ParseError::unexpected(self.current(), format!("{text:?}")))
        }
    }

    pub(crate) fn expect_keyword(&mut self, text: &'static str) -> Result<Lexeme, ParseError> {
        if self.at_keyword(text) {
            Ok(self.bump())
        } else {
            Err(ParseError::MissingKeyword {
                keyword: text,
                at: self.current().offset(),
            })
        }
    }

    pub(crate) fn expect_operator(&mut self, text: &'static str) -> Result<Lexeme, ParseError> {
        if self.at_operator(text) {
            Ok(self.bump())
        } else {
            Err(ParseError::MissingKeyword {
                keyword: text,
                at: self.current().offset(),
            })
        }
    }

    /// Accepts an identifier-like lexeme and returns its text.
    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.current().kind {
            LexemeKind::Identifier | LexemeKind::Function | LexemeKind::Type => {
                Ok(self.bump().text)
            }
            _ => Err(ParseError::unexpected(self.current(), "an identifier")),
        }
    }

    /// Skips optimizer-hint pseudo operators (`/*+ … */`) where no operator
    /// can begin an expression.
    pub(crate) fn skip_hints(&mut self) {
        while self.current().kind == LexemeKind::Operator && self.current().text.starts_with("/*+")
        {
            self.bump();
        }
    }

    /// Requires the statement to be fully consumed.
    pub(crate) fn expect_finished(&self) -> Result<(), ParseError> {
        if self.finished() {
            Ok(())
        } else {
            Err(ParseError::unexpected(self.current(), "end of statement"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cursor_navigation() {
        let mut p = Parser::new("select id from users").unwrap();
        assert!(p.at_command("select"));
        p.bump();
        assert_eq!(p.expect_identifier().unwrap(), "id");
        assert!(p.eat_command("from"));
        assert!(!p.finished());
        p.bump();
        assert!(p.finished());
        // The sentinel is sticky.
        p.bump();
        assert!(p.finished());
    }

    #[test]
    fn test_expect_errors_carry_position() {
        let mut p = Parser::new("select 1").unwrap();
        p.bump();
        assert_eq!(
            p.expect(LexemeKind::Identifier, "an identifier"),
            Err(ParseError::UnexpectedToken {
                expected: "an identifier".to_string(),
                found: "1".to_string(),
                at: 7,
            })
        );
    }

    #[test]
    fn test_eof_error() {
        let mut p = Parser::new("select").unwrap();
        p.bump();
        assert_eq!(
            p.expect(LexemeKind::Identifier, "an identifier"),
            Err(ParseError::UnexpectedEof {
                expected: "an identifier".to_string(),
            })
        );
    }
}
