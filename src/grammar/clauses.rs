// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of the scalar trailing clauses: `where`, `group by`,
//! `having`, `order by`, `limit`, `offset` and `for`.

use crate::ast::{
    ForClause, GroupByClause, GroupingKind, HavingClause, LimitClause, LockMode, NullsOrder,
    OffsetClause, OrderByClause, OrderByItem, OrderDirection, WhereClause,
};
use crate::grammar::parse_expr;
use crate::lexer::LexemeKind;
use crate::parser::{ParseError, Parser};

pub(crate) fn parse_where_clause(p: &mut Parser) -> Result<WhereClause, ParseError> {
    p.expect_command("where")?;
    Ok(WhereClause {
        predicate: parse_expr(p)?,
    })
}

pub(crate) fn parse_having_clause(p: &mut Parser) -> Result<HavingClause, ParseError> {
    p.expect_command("having")?;
    Ok(HavingClause {
        predicate: parse_expr(p)?,
    })
}

pub(crate) fn parse_group_by_clause(p: &mut Parser) -> Result<GroupByClause, ParseError> {
    p.expect_command("group by")?;

    let kind = if p.at_keyword("grouping") && p.nth(1).text == "sets" {
        p.bump();
        p.bump();
        GroupingKind::GroupingSets
    } else if p.eat_keyword("cube") {
        GroupingKind::Cube
    } else if p.eat_keyword("rollup") {
        GroupingKind::Rollup
    } else {
        GroupingKind::Plain
    };

    let mut items = Vec::new();
    if kind == GroupingKind::Plain {
        loop {
            items.push(parse_expr(p)?);
            if !p.eat(LexemeKind::Comma) {
                break;
            }
        }
    } else {
        p.expect(LexemeKind::OpenParen, "\"(\"")?;
        if !p.at(LexemeKind::CloseParen) {
            loop {
                items.push(parse_expr(p)?);
                if !p.eat(LexemeKind::Comma) {
                    break;
                }
            }
        }
        p.expect(LexemeKind::CloseParen, "\")\"")?;
    }

    Ok(GroupByClause { kind, items })
}

pub(crate) fn parse_order_by_clause(p: &mut Parser) -> Result<OrderByClause, ParseError> {
    p.expect_command("order by")?;

    let mut items = Vec::new();
    loop {
        let value = parse_expr(p)?;

        let direction = if p.eat_keyword("asc") {
            Some(OrderDirection::Asc)
        } else if p.eat_keyword("desc") {
            Some(OrderDirection::Desc)
        } else {
            None
        };

        let nulls = if p.eat_keyword("nulls") {
            if p.eat_keyword("first") {
                Some(NullsOrder::First)
            } else if p.eat_keyword("last") {
                Some(NullsOrder::Last)
            } else {
                return Err(ParseError::unexpected(p.current(), "\"first\" or \"last\""));
            }
        } else {
            None
        };

        items.push(OrderByItem {
            value,
            direction,
            nulls,
        });

        if !p.eat(LexemeKind::Comma) {
            break;
        }
    }

    Ok(OrderByClause { items })
}

pub(crate) fn parse_limit_clause(p: &mut Parser) -> Result<LimitClause, ParseError> {
    p.expect_command("limit")?;
    Ok(LimitClause {
        value: parse_expr(p)?,
    })
}

pub(crate) fn parse_offset_clause(p: &mut Parser) -> Result<OffsetClause, ParseError> {
    p.expect_command("offset")?;
    let value = parse_expr(p)?;
    // The `offset n rows` spelling is accepted and normalized away.
    if !p.eat_keyword("rows") {
        p.eat_keyword("row");
    }
    Ok(OffsetClause { value })
}

pub(crate) fn parse_for_clause(p: &mut Parser) -> Result<ForClause, ParseError> {
    p.expect_command("for")?;

    let lock_mode = if p.eat_command("update") {
        LockMode::Update
    } else if p.eat_keyword("no") {
        p.expect_keyword("key")?;
        p.expect_command("update")?;
        LockMode::NoKeyUpdate
    } else if p.eat_keyword("key") {
        p.expect_keyword("share")?;
        LockMode::KeyShare
    } else if p.eat_keyword("share") {
        LockMode::Share
    } else {
        return Err(ParseError::unexpected(p.current(), "a lock mode"));
    };

    Ok(ForClause { lock_mode })
}

#[cfg(test)]
mod tests {
    use crate::grammar::tests::check;
    use expect_test::expect;

    #[test]
    fn test_parse_where_and_having() {
        check(
            "select dept, count(*) from emp where active group by dept having count(*) > 3",
            expect![[
                r#"select "dept", count(*) from "emp" where "active" group by "dept" having count(*) > 3"#
            ]],
        );
    }

    #[test]
    fn test_parse_grouping_sets() {
        check(
            "select a, b from t group by grouping sets ((a), (a, b))",
            expect![[r#"select "a", "b" from "t" group by grouping sets(("a"), ("a", "b"))"#]],
        );
        check(
            "select a, b from t group by cube (a, b)",
            expect![[r#"select "a", "b" from "t" group by cube("a", "b")"#]],
        );
        check(
            "select a, b from t group by rollup (a, b)",
            expect![[r#"select "a", "b" from "t" group by rollup("a", "b")"#]],
        );
    }

    #[test]
    fn test_parse_order_by_modifiers() {
        check(
            "select * from t order by a desc nulls last, b asc, c",
            expect![[r#"select * from "t" order by "a" desc nulls last, "b" asc, "c""#]],
        );
    }

    #[test]
    fn test_parse_limit_offset() {
        check(
            "select * from t limit 10 offset 20",
            expect![[r#"select * from "t" limit 10 offset 20"#]],
        );
        check(
            "select * from t limit x + 1",
            expect![[r#"select * from "t" limit "x" + 1"#]],
        );
    }

    #[test]
    fn test_parse_for_lock_modes() {
        check(
            "select * from t for update",
            expect![[r#"select * from "t" for update"#]],
        );
        check(
            "select * from t for no key update",
            expect![[r#"select * from "t" for no key update"#]],
        );
        check(
            "select * from t for key share",
            expect![[r#"select * from "t" for key share"#]],
        );
        check(
            "select * from t for share",
            expect![[r#"select * from "t" for share"#]],
        );
    }
}
