// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the tagged lexeme model produced by the tokenizer.

use serde::Serialize;
use std::fmt;
use text_size::TextRange;

/// The closed set of lexeme tags the parser dispatches on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum LexemeKind {
    Identifier,
    Command,
    Operator,
    Parameter,
    Literal,
    Dot,
    Comma,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Function,
    Type,
    /// Reserved for standalone string-specifier prefixes. The tokenizer folds
    /// `E'…'`-style prefixes into their Literal lexeme, so it never emits
    /// this kind itself.
    StringSpecifier,
    Keyword,
    EndOfInput,
}

/// A single tagged token of the input text.
///
/// Comment text is attached to the lexeme it immediately precedes as
/// `leading_comments`; comments with no following lexeme end up as
/// `trailing_comments` of the last lexeme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub text: String,
    pub range: TextRange,
    pub leading_comments: Vec<String>,
    pub trailing_comments: Vec<String>,
}

impl Lexeme {
    pub(crate) fn new(kind: LexemeKind, text: impl Into<String>, range: TextRange) -> Self {
        Self {
            kind,
            text: text.into(),
            range,
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
        }
    }

    /// Byte offset of the lexeme start, as reported in errors.
    pub fn offset(&self) -> u32 {
        self.range.start().into()
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?} {:?}", self.kind, self.range, self.text)
    }
}
