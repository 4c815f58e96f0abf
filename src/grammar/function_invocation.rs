// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of function invocations, including the
//! keyword-separated argument forms (`extract`, `position`, `substring`,
//! `trim`) and the trailing `filter`/`over` clauses.

use crate::ast::{
    CastExpression, FunctionArgList, FunctionCall, Identifier, OverClause, TrimSide, Value,
};
use crate::grammar::{parse_expr, parse_type_name, parse_window_frame};
use crate::lexer::LexemeKind;
use crate::parser::{ParseError, Parser};

/// Parses the argument list and trailing clauses of a call whose name has
/// already been consumed; the cursor sits on `(`.
pub(crate) fn parse_function_invocation(
    p: &mut Parser,
    namespaces: Vec<Identifier>,
    name: String,
) -> Result<Value, ParseError> {
    match name.to_lowercase().as_str() {
        "cast" if namespaces.is_empty() => parse_cast_call(p),
        "extract" if namespaces.is_empty() => {
            let args = parse_extract_args(p)?;
            Ok(Value::Function(plain_call(name, args)))
        }
        "position" if namespaces.is_empty() => {
            let args = parse_position_args(p)?;
            Ok(Value::Function(plain_call(name, args)))
        }
        "substring" if namespaces.is_empty() => {
            let args = parse_substring_args(p)?;
            Ok(Value::Function(plain_call(name, args)))
        }
        "trim" if namespaces.is_empty() => {
            let args = parse_trim_args(p)?;
            Ok(Value::Function(plain_call(name, args)))
        }
        _ => parse_plain_call(p, namespaces, name).map(Value::Function),
    }
}

/// Same entry point for callers that need the bare [`FunctionCall`], as in
/// function table sources.
pub(crate) fn parse_function_call(
    p: &mut Parser,
    namespaces: Vec<Identifier>,
    name: String,
) -> Result<FunctionCall, ParseError> {
    parse_plain_call(p, namespaces, name)
}

fn plain_call(name: String, args: FunctionArgList) -> FunctionCall {
    FunctionCall {
        namespaces: Vec::new(),
        name,
        args,
        distinct: false,
        filter: None,
        over: None,
    }
}

fn parse_plain_call(
    p: &mut Parser,
    namespaces: Vec<Identifier>,
    name: String,
) -> Result<FunctionCall, ParseError> {
    p.expect(LexemeKind::OpenParen, "\"(\"")?;
    let distinct = p.eat_keyword("distinct");

    let mut args = Vec::new();
    if !p.at(LexemeKind::CloseParen) {
        loop {
            args.push(parse_expr(p)?);
            if !p.eat(LexemeKind::Comma) {
                break;
            }
        }
    }
    p.expect(LexemeKind::CloseParen, "\")\"")?;

    let filter = if p.eat_keyword("filter") {
        p.expect(LexemeKind::OpenParen, "\"(\"")?;
        p.expect_command("where")?;
        let predicate = parse_expr(p)?;
        p.expect(LexemeKind::CloseParen, "\")\"")?;
        Some(Box::new(predicate))
    } else {
        None
    };

    let over = if p.eat_keyword("over") {
        if p.eat(LexemeKind::OpenParen) {
            let window = parse_window_frame(p)?;
            p.expect(LexemeKind::CloseParen, "\")\"")?;
            Some(Box::new(OverClause::Window(window)))
        } else {
            Some(Box::new(OverClause::Named(p.expect_identifier()?)))
        }
    } else {
        None
    };

    Ok(FunctionCall {
        namespaces,
        name,
        args: FunctionArgList::Values(args),
        distinct,
        filter,
        over,
    })
}

/// `cast(value as type)`, normalized to the same node as `value::type`.
fn parse_cast_call(p: &mut Parser) -> Result<Value, ParseError> {
    p.expect(LexemeKind::OpenParen, "\"(\"")?;
    let value = parse_expr(p)?;
    p.expect_keyword("as")?;
    let target_type = parse_type_name(p)?;
    p.expect(LexemeKind::CloseParen, "\")\"")?;
    Ok(Value::Cast(CastExpression {
        value: Box::new(value),
        target_type,
    }))
}

fn parse_extract_args(p: &mut Parser) -> Result<FunctionArgList, ParseError> {
    p.expect(LexemeKind::OpenParen, "\"(\"")?;
    let field = p.expect_identifier()?.to_lowercase();
    p.expect_command("from")?;
    let value = parse_expr(p)?;
    p.expect(LexemeKind::CloseParen, "\")\"")?;
    Ok(FunctionArgList::Extract {
        field,
        value: Box::new(value),
    })
}

fn parse_position_args(p: &mut Parser) -> Result<FunctionArgList, ParseError> {
    p.expect(LexemeKind::OpenParen, "\"(\"")?;
    // The needle stops short of the `in` separator.
    let needle = super::expressions::expr_above_in(p)?;
    p.expect_operator("in")?;
    let haystack = parse_expr(p)?;
    p.expect(LexemeKind::CloseParen, "\")\"")?;
    Ok(FunctionArgList::Position {
        needle: Box::new(needle),
        haystack: Box::new(haystack),
    })
}

fn parse_substring_args(p: &mut Parser) -> Result<FunctionArgList, ParseError> {
    p.expect(LexemeKind::OpenParen, "\"(\"")?;
    let value = parse_expr(p)?;

    // Plain comma form stays a plain argument list.
    if p.eat(LexemeKind::Comma) {
        let mut args = vec![value];
        loop {
            args.push(parse_expr(p)?);
            if !p.eat(LexemeKind::Comma) {
                break;
            }
        }
        p.expect(LexemeKind::CloseParen, "\")\"")?;
        return Ok(FunctionArgList::Values(args));
    }

    let from = if p.eat_command("from") {
        Some(Box::new(parse_expr(p)?))
    } else {
        None
    };
    let for_count = if p.eat_command("for") {
        Some(Box::new(parse_expr(p)?))
    } else {
        None
    };
    let similar = if p.eat_keyword("similar") {
        Some(Box::new(parse_expr(p)?))
    } else {
        None
    };
    let escape = if p.eat_keyword("escape") {
        Some(Box::new(parse_expr(p)?))
    } else {
        None
    };
    p.expect(LexemeKind::CloseParen, "\")\"")?;

    Ok(FunctionArgList::Substring {
        value: Box::new(value),
        from,
        for_count,
        similar,
        escape,
    })
}

fn parse_trim_args(p: &mut Parser) -> Result<FunctionArgList, ParseError> {
    p.expect(LexemeKind::OpenParen, "\"(\"")?;

    let side = if p.eat_keyword("leading") {
        Some(TrimSide::Leading)
    } else if p.eat_keyword("trailing") {
        Some(TrimSide::Trailing)
    } else if p.eat_keyword("both") {
        Some(TrimSide::Both)
    } else {
        None
    };

    // `trim(both from x)` has no trim characters at all.
    if p.eat_command("from") {
        let value = parse_expr(p)?;
        p.expect(LexemeKind::CloseParen, "\")\"")?;
        return Ok(FunctionArgList::Trim {
            side,
            chars: None,
            value: Box::new(value),
            comma_form: false,
        });
    }

    let first = parse_expr(p)?;

    if p.eat_command("from") {
        let value = parse_expr(p)?;
        p.expect(LexemeKind::CloseParen, "\")\"")?;
        return Ok(FunctionArgList::Trim {
            side,
            chars: Some(Box::new(first)),
            value: Box::new(value),
            comma_form: false,
        });
    }

    let chars = if p.eat(LexemeKind::Comma) {
        Some(Box::new(parse_expr(p)?))
    } else {
        None
    };
    p.expect(LexemeKind::CloseParen, "\")\"")?;
    Ok(FunctionArgList::Trim {
        side,
        chars,
        value: Box::new(first),
        comma_form: true,
    })
}
