// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of `with` clauses and their common table entries.

use crate::ast::{CommonTable, Materialization, WithClause};
use crate::grammar::parse_select_query;
use crate::lexer::LexemeKind;
use crate::parser::{ParseError, Parser};

pub(crate) fn parse_with_clause(p: &mut Parser) -> Result<WithClause, ParseError> {
    p.expect_command("with")?;
    let recursive = p.eat_keyword("recursive");

    let mut tables = Vec::new();
    loop {
        tables.push(parse_common_table(p)?);
        if !p.eat(LexemeKind::Comma) {
            break;
        }
    }

    Ok(WithClause { recursive, tables })
}

/// One `name[(cols)] as [materialized|not materialized] (query)` entry.
pub(crate) fn parse_common_table(p: &mut Parser) -> Result<CommonTable, ParseError> {
    let name = p.expect_identifier()?;

    let mut columns = Vec::new();
    if p.at(LexemeKind::OpenParen) {
        p.bump();
        loop {
            columns.push(p.expect_identifier()?);
            if !p.eat(LexemeKind::Comma) {
                break;
            }
        }
        p.expect(LexemeKind::CloseParen, "\")\"")?;
    }

    p.expect_keyword("as")?;

    let materialization = if p.eat_keyword("materialized") {
        Materialization::Materialized
    } else if p.at_operator("not") && p.nth(1).text == "materialized" {
        p.bump();
        p.bump();
        Materialization::NotMaterialized
    } else {
        Materialization::Default
    };

    p.expect(LexemeKind::OpenParen, "\"(\"")?;
    let query = parse_select_query(p)?;
    p.expect(LexemeKind::CloseParen, "\")\"")?;

    Ok(CommonTable {
        name,
        columns,
        materialization,
        query: Box::new(query),
    })
}

#[cfg(test)]
mod tests {
    use crate::grammar::tests::check;
    use expect_test::expect;

    #[test]
    fn test_parse_with_clause() {
        check(
            "with active as (select * from users where active) select id from active",
            expect![[
                r#"with "active" as (select * from "users" where "active") select "id" from "active""#
            ]],
        );
    }

    #[test]
    fn test_parse_recursive_cte() {
        check(
            "WITH RECURSIVE t AS (SELECT 1 UNION ALL SELECT t.x+1 FROM t WHERE t.x<3) SELECT * FROM t",
            expect![[
                r#"with recursive "t" as (select 1 union all select "t"."x" + 1 from "t" where "t"."x" < 3) select * from "t""#
            ]],
        );
    }

    #[test]
    fn test_parse_materialization() {
        check(
            "with t as materialized (select 1), u as not materialized (select 2) select * from t, u",
            expect![[
                r#"with "t" as materialized (select 1), "u" as not materialized (select 2) select * from "t" cross join "u""#
            ]],
        );
    }

    #[test]
    fn test_parse_cte_column_list() {
        check(
            "with t(a, b) as (select 1, 2) select a from t",
            expect![[r#"with "t"("a", "b") as (select 1, 2) select "a" from "t""#]],
        );
    }
}
