// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the tokenizer: raw [`logos`] scanning plus the assembly layer
//! that produces the tagged lexeme stream.
//!
//! Assembly skips whitespace, attaches comments to their neighboring
//! lexemes, classifies bare words, merges multi-word operators and
//! commands, folds unambiguous negative signs into numeric literals and
//! resolves the bracket ambiguity between `[quoted idents]` and array
//! subscripts.

mod keyword;
mod lexeme;
mod token;

use keyword::{classify, is_function_name, WordClass};
use logos::Logos;
use std::ops::Range as StdRange;
use text_size::{TextRange, TextSize};
use token::RawToken;

pub use lexeme::{Lexeme, LexemeKind};

/// Errors produced while turning source text into lexemes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unterminated string literal at offset {at}")]
    UnterminatedString { at: u32 },
    #[error("unterminated block comment at offset {at}")]
    UnterminatedBlockComment { at: u32 },
    #[error("invalid numeric literal at offset {at}")]
    InvalidNumericLiteral { at: u32 },
    #[error("unrecognized character {character:?} at offset {at}")]
    UnrecognizedCharacter { at: u32, character: char },
}

#[derive(Debug, Clone, Copy)]
struct RawSpan {
    token: RawToken,
    range: TextRange,
}

impl RawSpan {
    fn new(token: RawToken, range: StdRange<usize>) -> Self {
        let StdRange { start, end } = range;
        let start = TextSize::try_from(start).unwrap();
        let end = TextSize::try_from(end).unwrap();
        Self {
            token,
            range: TextRange::new(start, end),
        }
    }
}

/// Streaming tokenizer over one source string.
///
/// Construction scans and validates the raw token stream; iteration then
/// assembles lexemes one at a time and is infallible. The final yielded
/// lexeme is always [`LexemeKind::EndOfInput`].
#[derive(Debug)]
pub struct Lexer<'a> {
    src: &'a str,
    raw: Vec<RawSpan>,
    pos: usize,
    pending_comments: Vec<String>,
    last: Option<(LexemeKind, String)>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Result<Self, LexError> {
        let raw = scan_raw(src)?;
        let raw = resolve_brackets(src, raw)?;
        validate_stream(src, &raw)?;

        Ok(Self {
            src,
            raw,
            pos: 0,
            pending_comments: Vec::new(),
            last: None,
            done: false,
        })
    }

    fn slice(&self, span: &RawSpan) -> &'a str {
        &self.src[span.range]
    }

    /// Next non-trivia raw index at or after `i`.
    fn next_significant(&self, mut i: usize) -> Option<usize> {
        while i < self.raw.len() {
            let token = self.raw[i].token;
            if !token.is_trivia() && token != RawToken::SemiColon {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    /// Lower-cased word at raw index `i`, if it is a bare word.
    fn word_at(&self, i: usize) -> Option<String> {
        (self.raw[i].token == RawToken::Ident)
            .then(|| self.slice(&self.raw[i]).to_lowercase())
    }

    fn last_is_value(&self) -> bool {
        matches!(
            self.last,
            Some((
                LexemeKind::Identifier
                    | LexemeKind::Literal
                    | LexemeKind::Parameter
                    | LexemeKind::CloseParen
                    | LexemeKind::CloseBracket,
                _
            ))
        )
    }

    fn last_is_cast_operator(&self) -> bool {
        matches!(&self.last, Some((LexemeKind::Operator, text)) if text == "::")
    }

    /// Consumes trivia between `self.pos` and `upto` (inclusive) while
    /// collecting comment text, then advances past `upto`.
    fn consume_through(&mut self, upto: usize) {
        while self.pos <= upto {
            let span = self.raw[self.pos];
            match span.token {
                RawToken::LineComment => self.push_line_comment(&span),
                RawToken::BlockComment => self.push_block_comment(&span),
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn push_line_comment(&mut self, span: &RawSpan) {
        let text = self.src[span.range]
            .trim_start_matches("--")
            .trim()
            .to_string();
        if !text.is_empty() {
            self.pending_comments.push(text);
        }
    }

    fn push_block_comment(&mut self, span: &RawSpan) {
        let raw = &self.src[span.range];
        let text = raw[2..raw.len() - 2].trim().to_string();
        if !text.is_empty() {
            self.pending_comments.push(text);
        }
    }

    fn finish(&mut self, kind: LexemeKind, text: String, range: TextRange) -> Lexeme {
        let mut lexeme = Lexeme::new(kind, text, range);
        lexeme.leading_comments = std::mem::take(&mut self.pending_comments);
        self.last = Some((lexeme.kind, lexeme.text.clone()));
        lexeme
    }

    /// Merges the multi-word operator or command starting with `first`, or
    /// classifies it as a single word. Returns kind, canonical text and the
    /// index of the last consumed raw token.
    fn read_word(&self, start: usize, first: &str) -> (LexemeKind, String, usize) {
        let words = |i: usize| self.next_significant(i).and_then(|n| self.word_at(n).map(|w| (n, w)));

        match first {
            "group" | "order" | "partition" => {
                if let Some((n, w)) = words(start + 1) {
                    if w == "by" {
                        return (LexemeKind::Command, format!("{first} by"), n);
                    }
                }
            }
            "union" => {
                if let Some((n, w)) = words(start + 1) {
                    if w == "all" {
                        return (LexemeKind::Command, "union all".to_string(), n);
                    }
                }
                return (LexemeKind::Command, "union".to_string(), start);
            }
            "is" => {
                if let Some((n1, w1)) = words(start + 1) {
                    if w1 == "not" {
                        if let Some((n2, w2)) = words(n1 + 1) {
                            if w2 == "distinct" {
                                if let Some((n3, w3)) = words(n2 + 1) {
                                    if w3 == "from" {
                                        return (
                                            LexemeKind::Operator,
                                            "is not distinct from".to_string(),
                                            n3,
                                        );
                                    }
                                }
                            }
                        }
                        return (LexemeKind::Operator, "is not".to_string(), n1);
                    }
                    if w1 == "distinct" {
                        if let Some((n2, w2)) = words(n1 + 1) {
                            if w2 == "from" {
                                return (
                                    LexemeKind::Operator,
                                    "is distinct from".to_string(),
                                    n2,
                                );
                            }
                        }
                    }
                }
                return (LexemeKind::Operator, "is".to_string(), start);
            }
            "not" => {
                if let Some((n, w)) = words(start + 1) {
                    if matches!(w.as_str(), "like" | "ilike" | "in" | "between") {
                        return (LexemeKind::Operator, format!("not {w}"), n);
                    }
                }
                return (LexemeKind::Operator, "not".to_string(), start);
            }
            _ => {}
        }

        let followed_by_paren = self
            .next_significant(start + 1)
            .is_some_and(|n| self.raw[n].token == RawToken::LParen);
        if is_function_name(first) && followed_by_paren {
            return (LexemeKind::Function, first.to_string(), start);
        }

        let (kind, text) = match classify(first) {
            Some(WordClass::Command) => (LexemeKind::Command, first.to_string()),
            Some(WordClass::Keyword) => (LexemeKind::Keyword, first.to_string()),
            Some(WordClass::Operator) => (LexemeKind::Operator, first.to_string()),
            Some(WordClass::Literal) => (LexemeKind::Literal, first.to_string()),
            Some(WordClass::Type) => (LexemeKind::Type, first.to_string()),
            None if self.last_is_cast_operator() => (LexemeKind::Type, first.to_string()),
            None => (
                LexemeKind::Identifier,
                self.slice(&self.raw[start]).to_string(),
            ),
        };
        (kind, text, start)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while self.pos < self.raw.len() {
            let span = self.raw[self.pos];
            match span.token {
                RawToken::Whitespace | RawToken::SemiColon => {
                    self.pos += 1;
                }
                RawToken::LineComment => {
                    self.push_line_comment(&span);
                    self.pos += 1;
                }
                RawToken::BlockComment => {
                    if self.slice(&span).starts_with("/*+") {
                        let text = self.slice(&span).to_string();
                        self.pos += 1;
                        return Some(self.finish(LexemeKind::Operator, text, span.range));
                    }
                    self.push_block_comment(&span);
                    self.pos += 1;
                }
                RawToken::Ident => {
                    let first = self.slice(&span).to_lowercase();
                    let (kind, text, last_idx) = self.read_word(self.pos, &first);
                    let range = TextRange::new(span.range.start(), self.raw[last_idx].range.end());
                    self.consume_through(last_idx);
                    return Some(self.finish(kind, text, range));
                }
                RawToken::QuotedIdent => {
                    let raw = self.slice(&span);
                    let name = raw[1..raw.len() - 1].replace("\"\"", "\"");
                    self.pos += 1;
                    return Some(self.finish(LexemeKind::Identifier, name, span.range));
                }
                RawToken::BacktickIdent | RawToken::BracketIdent => {
                    let raw = self.slice(&span);
                    let name = raw[1..raw.len() - 1].to_string();
                    self.pos += 1;
                    return Some(self.finish(LexemeKind::Identifier, name, span.range));
                }
                RawToken::StringLiteral => {
                    let text = self.slice(&span).to_string();
                    self.pos += 1;
                    return Some(self.finish(LexemeKind::Literal, text, span.range));
                }
                RawToken::Number => {
                    let text = normalize_number(self.slice(&span));
                    self.pos += 1;
                    return Some(self.finish(LexemeKind::Literal, text, span.range));
                }
                RawToken::ColonParam
                | RawToken::AtParam
                | RawToken::DollarParam
                | RawToken::TemplateParam
                | RawToken::QuestionParam => {
                    let text = self.slice(&span).to_string();
                    self.pos += 1;
                    return Some(self.finish(LexemeKind::Parameter, text, span.range));
                }
                RawToken::Operator => {
                    let text = self.slice(&span);
                    if text == "-" && !self.last_is_value() {
                        if let Some(n) = self.next_significant(self.pos + 1) {
                            if self.raw[n].token == RawToken::Number {
                                let number = normalize_number(self.slice(&self.raw[n]));
                                let range =
                                    TextRange::new(span.range.start(), self.raw[n].range.end());
                                self.consume_through(n);
                                return Some(self.finish(
                                    LexemeKind::Literal,
                                    format!("-{number}"),
                                    range,
                                ));
                            }
                        }
                    }
                    let text = text.to_string();
                    self.pos += 1;
                    return Some(self.finish(LexemeKind::Operator, text, span.range));
                }
                RawToken::Dot => {
                    self.pos += 1;
                    return Some(self.finish(LexemeKind::Dot, ".".to_string(), span.range));
                }
                RawToken::Comma => {
                    self.pos += 1;
                    return Some(self.finish(LexemeKind::Comma, ",".to_string(), span.range));
                }
                RawToken::LParen => {
                    self.pos += 1;
                    return Some(self.finish(LexemeKind::OpenParen, "(".to_string(), span.range));
                }
                RawToken::RParen => {
                    self.pos += 1;
                    return Some(self.finish(LexemeKind::CloseParen, ")".to_string(), span.range));
                }
                RawToken::LBracket => {
                    self.pos += 1;
                    return Some(self.finish(LexemeKind::OpenBracket, "[".to_string(), span.range));
                }
                RawToken::RBracket => {
                    self.pos += 1;
                    return Some(self.finish(
                        LexemeKind::CloseBracket,
                        "]".to_string(),
                        span.range,
                    ));
                }
            }
        }

        self.done = true;
        let end = TextSize::try_from(self.src.len()).unwrap();
        Some(self.finish(
            LexemeKind::EndOfInput,
            String::new(),
            TextRange::new(end, end),
        ))
    }
}

/// Tokenizes `src` strictly. The result ends with an `EndOfInput` lexeme;
/// comments with no following lexeme are attached to the previous lexeme as
/// trailing comments.
pub fn read_lexemes(src: &str) -> Result<Vec<Lexeme>, LexError> {
    let mut lexemes: Vec<Lexeme> = Lexer::new(src)?.collect();

    if lexemes.len() >= 2 {
        let dangling = std::mem::take(&mut lexemes.last_mut().unwrap().leading_comments);
        if !dangling.is_empty() {
            let target = lexemes.len() - 2;
            lexemes[target].trailing_comments.extend(dangling);
        }
    }

    Ok(lexemes)
}

fn scan_raw(src: &str) -> Result<Vec<RawSpan>, LexError> {
    let mut lexer = RawToken::lexer(src);
    let mut raw = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => raw.push(RawSpan::new(token, lexer.span())),
            Err(()) => return Err(diagnose(src, lexer.span().start)),
        }
    }

    Ok(raw)
}

fn diagnose(src: &str, at: usize) -> LexError {
    let rest = &src[at..];
    let offset = at as u32;

    if rest.starts_with('\'') || rest.starts_with('"') || rest.starts_with('`') {
        LexError::UnterminatedString { at: offset }
    } else if rest.starts_with("/*") {
        LexError::UnterminatedBlockComment { at: offset }
    } else {
        LexError::UnrecognizedCharacter {
            at: offset,
            character: rest.chars().next().unwrap_or('\0'),
        }
    }
}

/// Splits `[…]` groups back into bracket tokens where the preceding
/// significant token makes them a subscript or array constructor rather
/// than a delimited identifier.
fn resolve_brackets(src: &str, raw: Vec<RawSpan>) -> Result<Vec<RawSpan>, LexError> {
    let mut out: Vec<RawSpan> = Vec::with_capacity(raw.len());

    for span in raw {
        if span.token == RawToken::BracketIdent && prev_is_value(src, &out) {
            let start = usize::from(span.range.start());
            let end = usize::from(span.range.end());

            out.push(RawSpan::new(RawToken::LBracket, start..start + 1));

            let inner = &src[start + 1..end - 1];
            let mut lexer = RawToken::lexer(inner);
            while let Some(result) = lexer.next() {
                let offset = start + 1 + lexer.span().start;
                match result {
                    Ok(token) => out.push(RawSpan::new(
                        token,
                        offset..start + 1 + lexer.span().end,
                    )),
                    Err(()) => return Err(diagnose(src, offset)),
                }
            }

            out.push(RawSpan::new(RawToken::RBracket, end - 1..end));
        } else {
            out.push(span);
        }
    }

    Ok(out)
}

fn prev_is_value(src: &str, out: &[RawSpan]) -> bool {
    let Some(prev) = out.iter().rev().find(|s| !s.token.is_trivia()) else {
        return false;
    };

    match prev.token {
        RawToken::QuotedIdent
        | RawToken::BacktickIdent
        | RawToken::StringLiteral
        | RawToken::Number
        | RawToken::ColonParam
        | RawToken::AtParam
        | RawToken::DollarParam
        | RawToken::TemplateParam
        | RawToken::QuestionParam
        | RawToken::RParen
        | RawToken::RBracket => true,
        RawToken::Ident => {
            let word = src[prev.range].to_lowercase();
            word == "array" || classify(&word).is_none()
        }
        _ => false,
    }
}

fn validate_stream(src: &str, raw: &[RawSpan]) -> Result<(), LexError> {
    for window in raw.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        if a.token == RawToken::Number
            && b.token == RawToken::Ident
            && a.range.end() == b.range.start()
        {
            return Err(LexError::InvalidNumericLiteral {
                at: a.range.start().into(),
            });
        }

        // An unterminated block comment falls back to `/` and `*` operator
        // tokens; two of those touching can only be a comment opener.
        if a.token == RawToken::Operator
            && b.token == RawToken::Operator
            && a.range.end() == b.range.start()
            && &src[a.range] == "/"
            && &src[b.range] == "*"
        {
            return Err(LexError::UnterminatedBlockComment {
                at: a.range.start().into(),
            });
        }
    }

    // A statement separator is tolerated only in trailing position.
    for (i, span) in raw.iter().enumerate() {
        if span.token == RawToken::SemiColon {
            let trailing = raw[i + 1..]
                .iter()
                .all(|s| s.token.is_trivia() || s.token == RawToken::SemiColon);
            if !trailing {
                return Err(LexError::UnrecognizedCharacter {
                    at: span.range.start().into(),
                    character: ';',
                });
            }
        }
    }

    Ok(())
}

fn normalize_number(text: &str) -> String {
    if let Some(rest) = text.strip_prefix('.') {
        format!("0.{rest}")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::{expect, Expect};

    fn check(input: &str, expected: Expect) {
        let lexemes = read_lexemes(input).unwrap();
        let mut dump = String::new();
        for lexeme in &lexemes {
            for comment in &lexeme.leading_comments {
                dump.push_str(&format!("  leading {comment:?}\n"));
            }
            dump.push_str(&format!(
                "{:?}@{}..{} {:?}\n",
                lexeme.kind,
                u32::from(lexeme.range.start()),
                u32::from(lexeme.range.end()),
                lexeme.text
            ));
            for comment in &lexeme.trailing_comments {
                dump.push_str(&format!("  trailing {comment:?}\n"));
            }
        }
        expected.assert_eq(&dump);
    }

    #[test]
    fn test_simple_select() {
        check(
            "select id from users",
            expect![[r#"
                Command@0..6 "select"
                Identifier@7..9 "id"
                Command@10..14 "from"
                Identifier@15..20 "users"
                EndOfInput@20..20 ""
            "#]],
        );
    }

    #[test]
    fn test_multi_word_merges() {
        check(
            "a is not null or b not in (1) group by c order by d union all",
            expect![[r#"
                Identifier@0..1 "a"
                Operator@2..8 "is not"
                Literal@9..13 "null"
                Operator@14..16 "or"
                Identifier@17..18 "b"
                Operator@19..25 "not in"
                OpenParen@26..27 "("
                Literal@27..28 "1"
                CloseParen@28..29 ")"
                Command@30..38 "group by"
                Identifier@39..40 "c"
                Command@41..49 "order by"
                Identifier@50..51 "d"
                Command@52..61 "union all"
                EndOfInput@61..61 ""
            "#]],
        );
    }

    #[test]
    fn test_negative_number_binding() {
        // Leading position binds the sign, infix position keeps three
        // lexemes.
        check(
            "-5",
            expect![[r#"
                Literal@0..2 "-5"
                EndOfInput@2..2 ""
            "#]],
        );
        check(
            "1 - 2",
            expect![[r#"
                Literal@0..1 "1"
                Operator@2..3 "-"
                Literal@4..5 "2"
                EndOfInput@5..5 ""
            "#]],
        );
        check(
            "limit -1",
            expect![[r#"
                Command@0..5 "limit"
                Literal@6..8 "-1"
                EndOfInput@8..8 ""
            "#]],
        );
    }

    #[test]
    fn test_leading_dot_normalizes() {
        check(
            ".5 + -.25",
            expect![[r#"
                Literal@0..2 "0.5"
                Operator@3..4 "+"
                Literal@5..9 "-0.25"
                EndOfInput@9..9 ""
            "#]],
        );
    }

    #[test]
    fn test_comment_attachment() {
        check(
            "-- pick the id\nselect id -- done\n",
            expect![[r#"
                  leading "pick the id"
                Command@15..21 "select"
                Identifier@22..24 "id"
                  trailing "done"
                EndOfInput@33..33 ""
            "#]],
        );
    }

    #[test]
    fn test_empty_comment_dropped() {
        check(
            "--\nselect 1",
            expect![[r#"
                Command@3..9 "select"
                Literal@10..11 "1"
                EndOfInput@11..11 ""
            "#]],
        );
    }

    #[test]
    fn test_hint_comment_stays_operator() {
        check(
            "select /*+ IndexScan(t) */ id",
            expect![[r#"
                Command@0..6 "select"
                Operator@7..26 "/*+ IndexScan(t) */"
                Identifier@27..29 "id"
                EndOfInput@29..29 ""
            "#]],
        );
    }

    #[test]
    fn test_function_tagging() {
        check(
            "sum(x), count (*), sum",
            expect![[r#"
                Function@0..3 "sum"
                OpenParen@3..4 "("
                Identifier@4..5 "x"
                CloseParen@5..6 ")"
                Comma@6..7 ","
                Function@8..13 "count"
                OpenParen@14..15 "("
                Operator@15..16 "*"
                CloseParen@16..17 ")"
                Comma@17..18 ","
                Identifier@19..22 "sum"
                EndOfInput@22..22 ""
            "#]],
        );
    }

    #[test]
    fn test_quoted_identifiers() {
        check(
            r#""User Name", `col`, [dbo].[my table]"#,
            expect![[r#"
                Identifier@0..11 "User Name"
                Comma@11..12 ","
                Identifier@13..18 "col"
                Comma@18..19 ","
                Identifier@20..25 "dbo"
                Dot@25..26 "."
                Identifier@26..36 "my table"
                EndOfInput@36..36 ""
            "#]],
        );
    }

    #[test]
    fn test_array_brackets_split() {
        check(
            "array[1, 2]",
            expect![[r#"
                Keyword@0..5 "array"
                OpenBracket@5..6 "["
                Literal@6..7 "1"
                Comma@7..8 ","
                Literal@9..10 "2"
                CloseBracket@10..11 "]"
                EndOfInput@11..11 ""
            "#]],
        );
    }

    #[test]
    fn test_parameters() {
        check(
            ":id @name $2 ? ${env}",
            expect![[r#"
                Parameter@0..3 ":id"
                Parameter@4..9 "@name"
                Parameter@10..12 "$2"
                Parameter@13..14 "?"
                Parameter@15..21 "${env}"
                EndOfInput@21..21 ""
            "#]],
        );
    }

    #[test]
    fn test_cast_type_tagging() {
        check(
            "x::numeric(10, 2)",
            expect![[r#"
                Identifier@0..1 "x"
                Operator@1..3 "::"
                Type@3..10 "numeric"
                OpenParen@10..11 "("
                Literal@11..13 "10"
                Comma@13..14 ","
                Literal@15..16 "2"
                CloseParen@16..17 ")"
                EndOfInput@17..17 ""
            "#]],
        );
    }

    #[test]
    fn test_prefixed_string_is_single_literal() {
        check(
            "E'a\\nb' X'1F'",
            expect![[r#"
                Literal@0..7 "E'a\\nb'"
                Literal@8..13 "X'1F'"
                EndOfInput@13..13 ""
            "#]],
        );
    }

    #[test]
    fn test_trailing_semicolon_dropped() {
        check(
            "select 1;",
            expect![[r#"
                Command@0..6 "select"
                Literal@7..8 "1"
                EndOfInput@9..9 ""
            "#]],
        );
    }

    #[test]
    fn test_lex_errors() {
        assert_eq!(
            read_lexemes("select 'oops"),
            Err(LexError::UnterminatedString { at: 7 })
        );
        assert_eq!(
            read_lexemes("select /* oops"),
            Err(LexError::UnterminatedBlockComment { at: 7 })
        );
        assert_eq!(
            read_lexemes("select 12abc"),
            Err(LexError::InvalidNumericLiteral { at: 7 })
        );
    }
}
