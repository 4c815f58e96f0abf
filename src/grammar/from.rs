// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of the `from` clause: sources, aliases and joins.

use crate::ast::{
    FromClause, JoinConstraint, JoinItem, JoinKind, SelectQuery, SourceAlias, SourceExpression,
    SourceKind, TableRef,
};
use crate::grammar::{is_query_start, parse_expr, parse_function_call, parse_select_query};
use crate::lexer::LexemeKind;
use crate::parser::{ParseError, Parser};

pub(crate) fn parse_from_clause(p: &mut Parser) -> Result<FromClause, ParseError> {
    p.expect_command("from")?;
    let source = parse_source(p)?;

    let mut joins = Vec::new();
    loop {
        // A comma-separated source list normalizes to cross joins.
        if p.eat(LexemeKind::Comma) {
            joins.push(JoinItem {
                kind: JoinKind::Cross,
                lateral: false,
                source: parse_source(p)?,
                constraint: JoinConstraint::None,
            });
            continue;
        }

        let Some(kind) = parse_join_head(p)? else {
            break;
        };
        let lateral = p.eat_keyword("lateral");
        let source = parse_source(p)?;

        let constraint = if p.eat_keyword("on") {
            JoinConstraint::On(parse_expr(p)?)
        } else if p.eat_keyword("using") {
            p.expect(LexemeKind::OpenParen, "\"(\"")?;
            let mut columns = Vec::new();
            loop {
                columns.push(p.expect_identifier()?);
                if !p.eat(LexemeKind::Comma) {
                    break;
                }
            }
            p.expect(LexemeKind::CloseParen, "\")\"")?;
            JoinConstraint::Using(columns)
        } else {
            JoinConstraint::None
        };

        joins.push(JoinItem {
            kind,
            lateral,
            source,
            constraint,
        });
    }

    Ok(FromClause { source, joins })
}

fn parse_join_head(p: &mut Parser) -> Result<Option<JoinKind>, ParseError> {
    let kind = if p.eat_keyword("join") {
        return Ok(Some(JoinKind::Inner));
    } else if p.eat_keyword("inner") {
        JoinKind::Inner
    } else if p.eat_keyword("left") {
        p.eat_keyword("outer");
        JoinKind::Left
    } else if p.eat_keyword("right") {
        p.eat_keyword("outer");
        JoinKind::Right
    } else if p.eat_keyword("full") {
        p.eat_keyword("outer");
        JoinKind::Full
    } else if p.eat_keyword("cross") {
        JoinKind::Cross
    } else if p.eat_keyword("natural") {
        if p.eat_keyword("left") || p.eat_keyword("right") || p.eat_keyword("full") {
            p.eat_keyword("outer");
        } else {
            p.eat_keyword("inner");
        }
        JoinKind::Natural
    } else {
        return Ok(None);
    };

    p.expect_keyword("join")?;
    Ok(Some(kind))
}

pub(crate) fn parse_source(p: &mut Parser) -> Result<SourceExpression, ParseError> {
    let kind = if p.at(LexemeKind::OpenParen) {
        if is_query_start(p.nth(1)) {
            p.bump();
            let query = parse_select_query(p)?;
            p.expect(LexemeKind::CloseParen, "\")\"")?;
            match query {
                SelectQuery::Values(values) => SourceKind::Values(values),
                query => SourceKind::SubQuery(Box::new(query)),
            }
        } else {
            p.bump();
            let inner = parse_source(p)?;
            p.expect(LexemeKind::CloseParen, "\")\"")?;
            SourceKind::Paren(Box::new(inner))
        }
    } else {
        let mut parts = vec![p.expect_identifier()?];
        while p.at(LexemeKind::Dot) {
            p.bump();
            parts.push(p.expect_identifier()?);
        }

        if p.at(LexemeKind::OpenParen) {
            let name = parts.pop().expect("chain holds at least one part");
            SourceKind::Function(parse_function_call(p, parts, name)?)
        } else {
            let name = parts.pop().expect("chain holds at least one part");
            SourceKind::Table(TableRef {
                namespaces: parts,
                name,
            })
        }
    };

    let alias = parse_alias(p)?;
    Ok(SourceExpression { kind, alias })
}

fn parse_alias(p: &mut Parser) -> Result<Option<SourceAlias>, ParseError> {
    let name = if p.eat_keyword("as") {
        Some(p.expect_identifier()?)
    } else if p.at(LexemeKind::Identifier) {
        Some(p.bump().text)
    } else {
        None
    };

    let Some(name) = name else {
        return Ok(None);
    };

    let mut columns = Vec::new();
    if p.at(LexemeKind::OpenParen) && p.nth(1).kind == LexemeKind::Identifier {
        p.bump();
        loop {
            columns.push(p.expect_identifier()?);
            if !p.eat(LexemeKind::Comma) {
                break;
            }
        }
        p.expect(LexemeKind::CloseParen, "\")\"")?;
    }

    Ok(Some(SourceAlias { name, columns }))
}
