// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the Pratt parser for SQL value expressions.

//  Heavily inspired by
//    https://matklad.github.io/2020/04/13/simple-but-powerful-pratt-parsing.html
//    https://arzg.github.io/lang/10/

use crate::ast::{
    ArrayExpression, BetweenExpression, BinaryExpression, CastExpression, ColumnReference,
    LiteralKind, LiteralValue, ParameterExpression, ParenExpression, QueryExpression,
    TupleExpression, TypeName, UnaryExpression, Value,
};
use crate::grammar::{
    is_query_start, parse_case, parse_function_invocation, parse_select_query, parse_type_name,
};
use crate::lexer::{Lexeme, LexemeKind};
use crate::parser::{ParseError, Parser};

// `::` binds tighter than every infix operator.
const CAST_L_BP: u8 = 19;
const PREFIX_SIGN_BP: u8 = 17;
const PREFIX_NOT_BP: u8 = 5;

pub(crate) fn parse_expr(p: &mut Parser) -> Result<Value, ParseError> {
    expr_bp(p, 0)
}

/// Parses an expression that stops short of the `in`/`is`/`like` tier, as
/// needed before the `in` separator of `position(x in y)`.
pub(crate) fn expr_above_in(p: &mut Parser) -> Result<Value, ParseError> {
    expr_bp(p, 11)
}

fn expr_bp(p: &mut Parser, min_bp: u8) -> Result<Value, ParseError> {
    let mut lhs = parse_prefix(p)?;

    loop {
        let current = p.current();
        if current.kind != LexemeKind::Operator || current.text.starts_with("/*") {
            break;
        }
        let op = current.text.clone();

        if op == "::" {
            if CAST_L_BP < min_bp {
                break;
            }
            p.bump();
            let target_type = parse_type_name(p)?;
            lhs = Value::Cast(CastExpression {
                value: Box::new(lhs),
                target_type,
            });
            continue;
        }

        if op == "between" || op == "not between" {
            let (l_bp, r_bp) = (9, 10);
            if l_bp < min_bp {
                break;
            }
            p.bump();
            let low = expr_bp(p, r_bp)?;
            p.expect_operator("and")?;
            let high = expr_bp(p, r_bp)?;
            lhs = Value::Between(BetweenExpression {
                value: Box::new(lhs),
                low: Box::new(low),
                high: Box::new(high),
                negated: op == "not between",
            });
            continue;
        }

        let Some((l_bp, r_bp)) = infix_bp(&op) else {
            break;
        };
        if l_bp < min_bp {
            break;
        }
        p.bump();

        let rhs = if op == "in" || op == "not in" {
            parse_in_rhs(p)?
        } else {
            expr_bp(p, r_bp)?
        };
        lhs = Value::Binary(BinaryExpression {
            left: Box::new(lhs),
            op,
            right: Box::new(rhs),
        });
    }

    Ok(lhs)
}

fn parse_prefix(p: &mut Parser) -> Result<Value, ParseError> {
    if p.at_operator("-") || p.at_operator("+") || p.at_operator("~") {
        let op = p.bump().text;
        let operand = expr_bp(p, PREFIX_SIGN_BP)?;
        return Ok(Value::Unary(UnaryExpression {
            op,
            operand: Box::new(operand),
        }));
    }

    if p.at_operator("not") {
        p.bump();
        let operand = expr_bp(p, PREFIX_NOT_BP)?;
        return Ok(Value::Unary(UnaryExpression {
            op: "not".to_string(),
            operand: Box::new(operand),
        }));
    }

    parse_primary(p)
}

fn parse_primary(p: &mut Parser) -> Result<Value, ParseError> {
    match p.current().kind {
        LexemeKind::Literal => {
            let lexeme = p.bump();
            Ok(Value::Literal(literal_from_lexeme(&lexeme)))
        }
        LexemeKind::Parameter => {
            let lexeme = p.bump();
            Ok(Value::Parameter(parse_parameter(&lexeme.text)))
        }
        LexemeKind::Type => {
            // `interval '2 days'` and friends; a bare type word in value
            // position falls back to a column reference.
            let tag = p.bump().text;
            if p.at(LexemeKind::Literal) && p.current().text.starts_with('\'') {
                let text = p.bump().text;
                Ok(Value::Literal(LiteralValue {
                    kind: LiteralKind::Typed,
                    text,
                    type_tag: Some(TypeName::plain(tag)),
                }))
            } else {
                Ok(Value::Column(ColumnReference {
                    namespaces: Vec::new(),
                    column: tag,
                }))
            }
        }
        LexemeKind::Identifier => parse_reference(p),
        LexemeKind::Function => {
            let name = p.bump().text;
            parse_function_invocation(p, Vec::new(), name)
        }
        LexemeKind::OpenParen => {
            p.bump();
            if is_query_start(p.current()) {
                let query = parse_select_query(p)?;
                p.expect(LexemeKind::CloseParen, "\")\"")?;
                return Ok(Value::Query(QueryExpression {
                    query: Box::new(query),
                }));
            }

            let first = parse_expr(p)?;
            if p.at(LexemeKind::Comma) {
                let mut elements = vec![first];
                while p.eat(LexemeKind::Comma) {
                    elements.push(parse_expr(p)?);
                }
                p.expect(LexemeKind::CloseParen, "\")\"")?;
                return Ok(Value::Tuple(TupleExpression { elements }));
            }

            p.expect(LexemeKind::CloseParen, "\")\"")?;
            Ok(Value::Paren(ParenExpression {
                inner: Box::new(first),
            }))
        }
        LexemeKind::Keyword if p.at_keyword("case") => parse_case(p),
        LexemeKind::Keyword if p.at_keyword("array") => {
            p.bump();
            p.expect(LexemeKind::OpenBracket, "\"[\"")?;
            let mut elements = Vec::new();
            if !p.at(LexemeKind::CloseBracket) {
                loop {
                    elements.push(parse_expr(p)?);
                    if !p.eat(LexemeKind::Comma) {
                        break;
                    }
                }
            }
            p.expect(LexemeKind::CloseBracket, "\"]\"")?;
            Ok(Value::Array(ArrayExpression { elements }))
        }
        LexemeKind::Keyword if p.at_keyword("exists") => {
            p.bump();
            p.expect(LexemeKind::OpenParen, "\"(\"")?;
            let query = parse_select_query(p)?;
            p.expect(LexemeKind::CloseParen, "\")\"")?;
            Ok(Value::Unary(UnaryExpression {
                op: "exists".to_string(),
                operand: Box::new(Value::Query(QueryExpression {
                    query: Box::new(query),
                })),
            }))
        }
        LexemeKind::Operator if p.at_operator("*") => {
            p.bump();
            Ok(Value::Column(ColumnReference {
                namespaces: Vec::new(),
                column: "*".to_string(),
            }))
        }
        _ => Err(ParseError::unexpected(p.current(), "an expression")),
    }
}

/// A dotted identifier chain, ending in a column reference, `.*` or a
/// function call.
fn parse_reference(p: &mut Parser) -> Result<Value, ParseError> {
    let mut parts = vec![p.bump().text];

    while p.at(LexemeKind::Dot) {
        match p.nth(1).kind {
            LexemeKind::Identifier | LexemeKind::Function | LexemeKind::Type => {
                p.bump();
                parts.push(p.bump().text);
            }
            LexemeKind::Operator if p.nth(1).text == "*" => {
                p.bump();
                p.bump();
                return Ok(Value::Column(ColumnReference {
                    namespaces: parts,
                    column: "*".to_string(),
                }));
            }
            _ => return Err(ParseError::unexpected(p.nth(1), "an identifier after \".\"")),
        }
    }

    if p.at(LexemeKind::OpenParen) {
        let name = parts.pop().expect("chain holds at least one part");
        return parse_function_invocation(p, parts, name);
    }

    let column = parts.pop().expect("chain holds at least one part");
    Ok(Value::Column(ColumnReference {
        namespaces: parts,
        column,
    }))
}

fn parse_in_rhs(p: &mut Parser) -> Result<Value, ParseError> {
    p.expect(LexemeKind::OpenParen, "\"(\"")?;

    if is_query_start(p.current()) {
        let query = parse_select_query(p)?;
        p.expect(LexemeKind::CloseParen, "\")\"")?;
        return Ok(Value::Query(QueryExpression {
            query: Box::new(query),
        }));
    }

    let mut elements = Vec::new();
    if !p.at(LexemeKind::CloseParen) {
        loop {
            elements.push(parse_expr(p)?);
            if !p.eat(LexemeKind::Comma) {
                break;
            }
        }
    }
    p.expect(LexemeKind::CloseParen, "\")\"")?;
    Ok(Value::Tuple(TupleExpression { elements }))
}

pub(crate) fn literal_from_lexeme(lexeme: &Lexeme) -> LiteralValue {
    let kind = match lexeme.text.as_str() {
        "true" | "false" => LiteralKind::Boolean,
        "null" => LiteralKind::Null,
        text if text.contains('\'') => LiteralKind::String,
        _ => LiteralKind::Number,
    };
    LiteralValue {
        kind,
        text: lexeme.text.clone(),
        type_tag: None,
    }
}

fn parse_parameter(text: &str) -> ParameterExpression {
    if text == "?" {
        ParameterExpression::Anonymous
    } else if let Some(name) = text.strip_prefix("${").and_then(|t| t.strip_suffix('}')) {
        ParameterExpression::Named(name.to_string())
    } else if let Some(index) = text.strip_prefix('$') {
        match index.parse() {
            Ok(index) => ParameterExpression::Indexed(index),
            Err(_) => ParameterExpression::Named(index.to_string()),
        }
    } else {
        ParameterExpression::Named(text[1..].to_string())
    }
}

fn infix_bp(op: &str) -> Option<(u8, u8)> {
    let bp = match op {
        "or" => (1, 2),
        "and" => (3, 4),
        "=" | "<" | ">" | "<=" | ">=" | "<>" | "!=" | "==" => (7, 8),
        "is" | "is not" | "is distinct from" | "is not distinct from" | "in" | "not in"
        | "like" | "not like" | "ilike" | "not ilike" => (9, 10),
        "+" | "-" | "||" => (11, 12),
        "*" | "/" | "%" => (13, 14),
        "^" | "&" | "|" | "#" => (15, 16),
        "not" | "between" | "not between" | "::" => return None,
        // Remaining symbolic operators (`@>`, `->`, `#>>`, …) sit at the
        // additive tier.
        op if !op.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) => (11, 12),
        _ => return None,
    };
    Some(bp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::tests::check_expr;
    use expect_test::expect;

    #[test]
    fn test_parse_literal() {
        check_expr("1", expect![["1"]]);
        check_expr("'text'", expect![["'text'"]]);
        check_expr("TRUE", expect![["true"]]);
        check_expr("NULL", expect![["null"]]);
    }

    #[test]
    fn test_parse_op_precedence() {
        check_expr("1 + a * 2", expect![[r#"1 + "a" * 2"#]]);
        check_expr("a = 1 or b = 2 and c = 3", expect![[r#""a" = 1 or "b" = 2 and "c" = 3"#]]);
    }

    #[test]
    fn test_parse_prefix_expr() {
        check_expr("-a", expect![[r#"-"a""#]]);
        check_expr("not a = 1", expect![[r#"not "a" = 1"#]]);
    }

    #[test]
    fn test_parse_paren_expr() {
        check_expr("(1 + a) * 2", expect![[r#"(1 + "a") * 2"#]]);
    }

    #[test]
    fn test_parse_column_references() {
        check_expr("s.t.c", expect![[r#""s"."t"."c""#]]);
        check_expr("t.*", expect![[r#""t".*"#]]);
    }

    #[test]
    fn test_parse_keyword_operators() {
        check_expr("a is not null", expect![[r#""a" is not null"#]]);
        check_expr("a not like 'x%'", expect![[r#""a" not like 'x%'"#]]);
        check_expr(
            "a is not distinct from b",
            expect![[r#""a" is not distinct from "b""#]],
        );
    }

    #[test]
    fn test_parse_between() {
        check_expr("x between 1 and 10", expect![["\"x\" between 1 and 10"]]);
        check_expr(
            "x not between 1 + 1 and y * 2",
            expect![[r#""x" not between 1 + 1 and "y" * 2"#]],
        );
    }

    #[test]
    fn test_between_requires_and() {
        let mut p = Parser::new("x between 1 10").unwrap();
        assert_eq!(
            parse_expr(&mut p),
            Err(ParseError::MissingKeyword {
                keyword: "and",
                at: 12,
            })
        );
    }

    #[test]
    fn test_parse_in_lists() {
        check_expr("x in (1, 2, 3)", expect![["\"x\" in (1, 2, 3)"]]);
        check_expr("x not in (1)", expect![["\"x\" not in (1)"]]);
        check_expr(
            "x in (select id from t)",
            expect![[r#""x" in (select "id" from "t")"#]],
        );
    }

    #[test]
    fn test_parse_casts() {
        check_expr("x::int", expect![[r#""x"::int"#]]);
        check_expr("cast(x as integer)", expect![[r#""x"::integer"#]]);
        check_expr("x::numeric(10, 2)", expect![[r#""x"::numeric(10, 2)"#]]);
    }

    #[test]
    fn test_parse_array_and_tuple() {
        check_expr("array[1, 2]", expect![["array[1, 2]"]]);
        check_expr("(1, 'a')", expect![["(1, 'a')"]]);
    }

    #[test]
    fn test_parse_typed_literal() {
        check_expr("interval '2 days'", expect![["interval '2 days'"]]);
        check_expr("date '2024-01-01'", expect![["date '2024-01-01'"]]);
    }

    #[test]
    fn test_parse_exists() {
        check_expr(
            "exists (select 1 from t)",
            expect![[r#"exists (select 1 from "t")"#]],
        );
    }

    #[test]
    fn test_parse_postgres_operators() {
        check_expr("tags @> array['a']", expect![[r#""tags" @> array['a']"#]]);
        check_expr("doc -> 'key'", expect![[r#""doc" -> 'key'"#]]);
    }

    #[test]
    fn test_unbalanced_paren() {
        let mut p = Parser::new("(1 + 2").unwrap();
        assert_eq!(
            parse_expr(&mut p),
            Err(ParseError::UnexpectedEof {
                expected: "\")\"".to_string(),
            })
        );
    }
}
