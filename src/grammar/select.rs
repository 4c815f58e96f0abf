// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of the `select` clause and its item list.

use crate::ast::{DistinctKind, SelectClause, SelectItem};
use crate::grammar::parse_expr;
use crate::lexer::LexemeKind;
use crate::parser::{ParseError, Parser};

pub(crate) fn parse_select_clause(p: &mut Parser) -> Result<SelectClause, ParseError> {
    p.expect_command("select")?;
    p.skip_hints();

    let distinct = if p.eat_keyword("distinct") {
        if p.eat_keyword("on") {
            p.expect(LexemeKind::OpenParen, "\"(\"")?;
            let mut items = Vec::new();
            loop {
                items.push(parse_expr(p)?);
                if !p.eat(LexemeKind::Comma) {
                    break;
                }
            }
            p.expect(LexemeKind::CloseParen, "\")\"")?;
            DistinctKind::On(items)
        } else {
            DistinctKind::All
        }
    } else {
        DistinctKind::None
    };

    let items = parse_select_items(p)?;
    Ok(SelectClause { distinct, items })
}

/// A comma-separated list of expressions with optional aliases, also the
/// shape of `returning` lists.
pub(crate) fn parse_select_items(p: &mut Parser) -> Result<Vec<SelectItem>, ParseError> {
    let mut items = Vec::new();
    loop {
        let value = parse_expr(p)?;
        let alias = if p.eat_keyword("as") {
            Some(p.expect_identifier()?)
        } else if p.at(LexemeKind::Identifier) {
            Some(p.bump().text)
        } else {
            None
        };
        items.push(SelectItem { value, alias });

        if !p.eat(LexemeKind::Comma) {
            break;
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use crate::grammar::tests::check;
    use expect_test::expect;

    #[test]
    fn test_parse_select_items_and_aliases() {
        check(
            "select id, name as n, price * 2 total from products",
            expect![[r#"select "id", "name" as "n", "price" * 2 as "total" from "products""#]],
        );
    }

    #[test]
    fn test_parse_distinct() {
        check(
            "select distinct dept from emp",
            expect![[r#"select distinct "dept" from "emp""#]],
        );
    }

    #[test]
    fn test_parse_distinct_on() {
        check(
            "select distinct on (dept) id, salary from emp order by dept, salary desc",
            expect![[
                r#"select distinct on("dept") "id", "salary" from "emp" order by "dept", "salary" desc"#
            ]],
        );
    }

    #[test]
    fn test_select_star() {
        check("select * from t", expect![[r#"select * from "t""#]]);
        check("select t.* from t", expect![[r#"select "t".* from "t""#]]);
    }
}
