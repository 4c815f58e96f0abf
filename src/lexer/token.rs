// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Raw token definition for the [`logos`] scanner.
//!
//! The raw layer only distinguishes the lexical shape of the input; bare
//! words are classified into commands, keywords, operators and functions by
//! the assembly layer in [`crate::lexer`].

use std::fmt;

#[derive(logos::Logos, Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum RawToken {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"--[^\n]*", allow_greedy = true)]
    LineComment,

    // Also matches optimizer hints (`/*+ … */`); the assembly layer keeps
    // those verbatim instead of attaching them as comments.
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_$]*")]
    Ident,

    #[regex(r#""([^"]|"")*""#)]
    QuotedIdent,

    #[regex(r"`[^`]*`")]
    BacktickIdent,

    // Doubles as an index/array-constructor bracket group in value
    // position; the assembly layer splits it back apart there.
    #[regex(r"\[[^\[\]]*\]")]
    BracketIdent,

    #[regex(r"'([^']|'')*'")]
    #[regex(r"[eExXbB]'([^']|'')*'")]
    #[regex(r"[uU]&'([^']|'')*'")]
    StringLiteral,

    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F]+")]
    Number,

    #[regex(r":[a-zA-Z_][a-zA-Z0-9_]*")]
    ColonParam,

    #[regex(r"@[a-zA-Z_][a-zA-Z0-9_]*")]
    AtParam,

    #[regex(r"\$[0-9]+")]
    DollarParam,

    #[regex(r"\$\{[a-zA-Z_][a-zA-Z0-9_]*\}")]
    TemplateParam,

    #[token("?")]
    QuestionParam,

    #[regex(r"::|==|!=|<>|<=|>=|\|\||->>|->|#>>|#>|@>|<@")]
    #[regex(r"[+\-*/%^&|~#<>=]")]
    Operator,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(";")]
    SemiColon,
}

impl RawToken {
    pub(crate) fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::LineComment | Self::BlockComment
        )
    }
}

impl fmt::Display for RawToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::Logos;

    fn check(input: &str, token: RawToken) {
        let mut lexer = RawToken::lexer(input);
        assert_eq!(lexer.next(), Some(Ok(token)));
        assert_eq!(lexer.slice(), input);
    }

    #[test]
    fn lex_spaces_and_newlines() {
        check("  \n", RawToken::Whitespace);
    }

    #[test]
    fn lex_ident() {
        check("hello", RawToken::Ident);
        check("_tmp$2", RawToken::Ident);
    }

    #[test]
    fn lex_quoted_ident() {
        check(r#""select me""#, RawToken::QuotedIdent);
        check(r#""odd""name""#, RawToken::QuotedIdent);
        check("`col`", RawToken::BacktickIdent);
        check("[col name]", RawToken::BracketIdent);
    }

    #[test]
    fn lex_string_literals() {
        check("'it''s'", RawToken::StringLiteral);
        check("E'two\\nlines'", RawToken::StringLiteral);
        check("X'1F'", RawToken::StringLiteral);
        check("U&'d\\0061t'", RawToken::StringLiteral);
    }

    #[test]
    fn lex_numbers() {
        check("42", RawToken::Number);
        check("1.25", RawToken::Number);
        check(".5", RawToken::Number);
        check("1.23e+10", RawToken::Number);
        check("0xFF", RawToken::Number);
    }

    #[test]
    fn lex_parameters() {
        check(":id", RawToken::ColonParam);
        check("@name", RawToken::AtParam);
        check("$3", RawToken::DollarParam);
        check("${env}", RawToken::TemplateParam);
        check("?", RawToken::QuestionParam);
    }

    #[test]
    fn lex_operators_greedy() {
        check("::", RawToken::Operator);
        check("<>", RawToken::Operator);
        check("<=", RawToken::Operator);
        check("||", RawToken::Operator);
        check("@>", RawToken::Operator);
        check("#>>", RawToken::Operator);
        check("->>", RawToken::Operator);
    }

    #[test]
    fn lex_comments() {
        check("-- trailing", RawToken::LineComment);
        check("/* block\ncomment */", RawToken::BlockComment);
        check("/*+ IndexScan(t) */", RawToken::BlockComment);
    }
}
