// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of simple and searched `case` expressions.

use crate::ast::{CaseBranch, CaseExpression, SwitchCaseArgument, Value};
use crate::grammar::parse_expr;
use crate::parser::{ParseError, Parser};

pub(crate) fn parse_case(p: &mut Parser) -> Result<Value, ParseError> {
    p.expect_keyword("case")?;

    let condition = if p.at_keyword("when") {
        None
    } else {
        Some(Box::new(parse_expr(p)?))
    };

    let mut branches = Vec::new();
    while p.eat_keyword("when") {
        let when = parse_expr(p)?;
        p.expect_keyword("then")?;
        let then = parse_expr(p)?;
        branches.push(CaseBranch { when, then });
    }

    if branches.is_empty() {
        return Err(ParseError::MissingKeyword {
            keyword: "when",
            at: p.current().offset(),
        });
    }

    let else_value = if p.eat_keyword("else") {
        Some(Box::new(parse_expr(p)?))
    } else {
        None
    };

    p.expect_keyword("end")?;

    Ok(Value::Case(CaseExpression {
        condition,
        switch: SwitchCaseArgument {
            branches,
            else_value,
        },
    }))
}
