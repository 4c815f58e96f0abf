// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of the INSERT and UPDATE statement shells.

use crate::ast::{
    ColumnReference, InsertQuery, SelectQuery, SetItem, TableRef, UpdateQuery,
};
use crate::grammar::{
    is_query_start, parse_from_clause, parse_select_items, parse_select_query, parse_source,
    parse_where_clause,
};
use crate::lexer::LexemeKind;
use crate::parser::{ParseError, Parser};

/// `[with …] insert into target [(cols)] (select … | values …)`.
///
/// A leading `with` belongs to the source query and is attached there.
pub(crate) fn parse_insert_statement(p: &mut Parser) -> Result<InsertQuery, ParseError> {
    let leading_with = if p.at_command("with") {
        Some(crate::grammar::parse_with_clause(p)?)
    } else {
        None
    };

    p.expect_command("insert")?;
    p.expect_command("into")?;
    let target = parse_table_name(p)?;

    let mut columns = Vec::new();
    if p.at(LexemeKind::OpenParen) && !is_query_start(p.nth(1)) {
        p.bump();
        loop {
            columns.push(p.expect_identifier()?);
            if !p.eat(LexemeKind::Comma) {
                break;
            }
        }
        p.expect(LexemeKind::CloseParen, "\")\"")?;
    }

    let mut source = parse_select_query(p)?;
    if let Some(with) = leading_with {
        match &mut source {
            SelectQuery::Simple(simple) if simple.with.is_none() => simple.with = Some(with),
            _ => {
                return Err(ParseError::unexpected(
                    p.current(),
                    "a select body to carry the with clause",
                ))
            }
        }
    }

    p.expect_finished()?;
    Ok(InsertQuery {
        target,
        columns,
        source,
    })
}

/// `update target set col = expr [, …] [from …] [where …] [returning …]`.
pub(crate) fn parse_update_statement(p: &mut Parser) -> Result<UpdateQuery, ParseError> {
    p.expect_command("update")?;
    let target = parse_source(p)?;
    p.expect_command("set")?;

    let mut set_items = Vec::new();
    loop {
        let column = parse_column_name(p)?;
        if !p.eat_operator("=") {
            return Err(ParseError::unexpected(p.current(), "\"=\""));
        }
        let value = crate::grammar::parse_expr(p)?;
        set_items.push(SetItem { column, value });

        if !p.eat(LexemeKind::Comma) {
            break;
        }
    }

    let from = if p.at_command("from") {
        Some(parse_from_clause(p)?)
    } else {
        None
    };

    let where_clause = if p.at_command("where") {
        Some(parse_where_clause(p)?)
    } else {
        None
    };

    let returning = if p.eat_command("returning") {
        parse_select_items(p)?
    } else {
        Vec::new()
    };

    p.expect_finished()?;
    Ok(UpdateQuery {
        target,
        set_items,
        from,
        where_clause,
        returning,
    })
}

fn parse_table_name(p: &mut Parser) -> Result<TableRef, ParseError> {
    let mut parts = vec![p.expect_identifier()?];
    while p.at(LexemeKind::Dot) {
        p.bump();
        parts.push(p.expect_identifier()?);
    }
    let name = parts.pop().expect("chain holds at least one part");
    Ok(TableRef {
        namespaces: parts,
        name,
    })
}

fn parse_column_name(p: &mut Parser) -> Result<ColumnReference, ParseError> {
    let mut parts = vec![p.expect_identifier()?];
    while p.at(LexemeKind::Dot) {
        p.bump();
        parts.push(p.expect_identifier()?);
    }
    let column = parts.pop().expect("chain holds at least one part");
    Ok(ColumnReference {
        namespaces: parts,
        column,
    })
}

#[cfg(test)]
mod tests {
    use crate::format::FormatOptions;
    use crate::{format_insert, format_update, parse_insert, parse_update};
    use expect_test::{expect, Expect};

    fn check_insert(input: &str, expected: Expect) {
        let query = parse_insert(input).unwrap();
        expected.assert_eq(&format_insert(&query, &FormatOptions::postgres()));
    }

    fn check_update(input: &str, expected: Expect) {
        let query = parse_update(input).unwrap();
        expected.assert_eq(&format_update(&query, &FormatOptions::postgres()));
    }

    #[test]
    fn test_parse_insert_values() {
        check_insert(
            "insert into users (id, name) values (1, 'ann'), (2, 'bob')",
            expect![[r#"insert into "users"("id", "name") values (1, 'ann'), (2, 'bob')"#]],
        );
    }

    #[test]
    fn test_parse_insert_select() {
        check_insert(
            "insert into archive select * from events where old",
            expect![[r#"insert into "archive" select * from "events" where "old""#]],
        );
    }

    #[test]
    fn test_parse_insert_with_cte() {
        // The with clause leads the printed statement, as it does the input.
        check_insert(
            "with fresh as (select id from events) insert into archive select * from fresh",
            expect![[
                r#"with "fresh" as (select "id" from "events") insert into "archive" select * from "fresh""#
            ]],
        );
    }

    #[test]
    fn test_parse_update() {
        check_update(
            "update t set a = 1, b = b + 1 where id = 3 returning id",
            expect![[r#"update "t" set "a" = 1, "b" = "b" + 1 where "id" = 3 returning "id""#]],
        );
    }

    #[test]
    fn test_parse_update_from() {
        check_update(
            "update t set a = s.v from src s where s.id = t.id",
            expect![[r#"update "t" set "a" = "s"."v" from "src" as "s" where "s"."id" = "t"."id""#]],
        );
    }
}
