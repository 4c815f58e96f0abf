// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! A lax implementation for parsing type names from the lexeme stream.
//!
//! Compound ANSI names (`double precision`, `character varying`,
//! `timestamp without time zone`) collapse into a single [`TypeName`];
//! trailing `[]` pairs fold into the name as array markers.

use crate::ast::TypeName;
use crate::grammar::parse_expr;
use crate::lexer::LexemeKind;
use crate::parser::{ParseError, Parser};

/// Parses a complete type name, as found after `::` or `cast(… as`.
pub(crate) fn parse_type_name(p: &mut Parser) -> Result<TypeName, ParseError> {
    let mut name = type_word(p)?;

    match name.as_str() {
        "double" => {
            if at_word(p, "precision") {
                p.bump();
                name = "double precision".to_string();
            }
        }
        "character" => {
            if at_word(p, "varying") {
                p.bump();
                name = "character varying".to_string();
            }
        }
        "timestamp" | "time" => {
            let qualifier = if p.at_command("with") {
                Some("with")
            } else if at_word(p, "without") {
                Some("without")
            } else {
                None
            };

            if let Some(qualifier) = qualifier {
                if p.nth(1).text == "time" && p.nth(2).text.eq_ignore_ascii_case("zone") {
                    p.bump();
                    p.bump();
                    p.bump();
                    name = format!("{name} {qualifier} time zone");
                }
            }
        }
        _ => {}
    }

    let mut precision = Vec::new();
    if p.eat(LexemeKind::OpenParen) {
        loop {
            precision.push(parse_expr(p)?);
            if !p.eat(LexemeKind::Comma) {
                break;
            }
        }
        p.expect(LexemeKind::CloseParen, "\")\"")?;
    }

    while p.at(LexemeKind::OpenBracket) && p.nth(1).kind == LexemeKind::CloseBracket {
        p.bump();
        p.bump();
        name.push_str("[]");
    }

    Ok(TypeName { name, precision })
}

fn type_word(p: &mut Parser) -> Result<String, ParseError> {
    match p.current().kind {
        LexemeKind::Identifier | LexemeKind::Type | LexemeKind::Function => {
            Ok(p.bump().text.to_lowercase())
        }
        _ => Err(ParseError::unexpected(p.current(), "a type name")),
    }
}

fn at_word(p: &Parser, word: &str) -> bool {
    p.at(LexemeKind::Identifier) && p.current().text.eq_ignore_ascii_case(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> TypeName {
        let mut p = Parser::new(input).unwrap();
        let ty = parse_type_name(&mut p).unwrap();
        assert!(p.finished());
        ty
    }

    #[test]
    fn test_parse_simple_types() {
        assert_eq!(parse("integer"), TypeName::plain("integer"));
        assert_eq!(parse("TEXT"), TypeName::plain("text"));
        assert_eq!(parse("interval"), TypeName::plain("interval"));
    }

    #[test]
    fn test_parse_compound_types() {
        assert_eq!(parse("double precision"), TypeName::plain("double precision"));
        assert_eq!(
            parse("timestamp without time zone"),
            TypeName::plain("timestamp without time zone")
        );
        assert_eq!(
            parse("TIMESTAMP WITH TIME ZONE"),
            TypeName::plain("timestamp with time zone")
        );
    }

    #[test]
    fn test_parse_precision() {
        let ty = parse("numeric(10, 2)");
        assert_eq!(ty.name, "numeric");
        assert_eq!(ty.precision.len(), 2);

        let ty = parse("character varying(100)");
        assert_eq!(ty.name, "character varying");
        assert_eq!(ty.precision.len(), 1);
    }

    #[test]
    fn test_parse_array_suffix() {
        assert_eq!(parse("int[]"), TypeName::plain("int[]"));
        assert_eq!(parse("text[][]"), TypeName::plain("text[][]"));
    }
}
