// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the top-level SELECT driver: clause composition, set
//! operations and the cooperative async facade.

use crate::ast::{BinarySelectQuery, SelectQuery, SetOperator, SimpleSelectQuery};
use crate::grammar::{
    parse_for_clause, parse_from_clause, parse_group_by_clause, parse_having_clause,
    parse_limit_clause, parse_offset_clause, parse_order_by_clause, parse_select_clause,
    parse_values_query, parse_where_clause, parse_window_clause, parse_with_clause,
};
use crate::lexer::{Lexeme, LexemeKind};
use crate::parser::{ParseError, Parser};

pub(crate) fn is_query_start(lexeme: &Lexeme) -> bool {
    lexeme.kind == LexemeKind::Command
        && matches!(lexeme.text.as_str(), "select" | "with" | "values")
}

/// Parses a full SELECT-shaped query, folding trailing set operators into a
/// left-associative tree.
pub(crate) fn parse_select_query(p: &mut Parser) -> Result<SelectQuery, ParseError> {
    let mut query = parse_query_operand(p)?;

    while let Some(op) = at_set_operator(p) {
        p.bump();
        let right = parse_query_operand(p)?;
        query = SelectQuery::Binary(Box::new(BinarySelectQuery {
            op,
            left: query,
            right,
        }));
    }

    Ok(query)
}

/// Parses a whole statement, requiring the input to be fully consumed.
pub(crate) fn parse_select_statement(p: &mut Parser) -> Result<SelectQuery, ParseError> {
    let query = parse_select_query(p)?;
    p.expect_finished()?;
    Ok(query)
}

fn at_set_operator(p: &Parser) -> Option<SetOperator> {
    if p.at_command("union all") {
        Some(SetOperator::UnionAll)
    } else if p.at_command("union") {
        Some(SetOperator::Union)
    } else if p.at_command("intersect") {
        Some(SetOperator::Intersect)
    } else if p.at_command("except") {
        Some(SetOperator::Except)
    } else {
        None
    }
}

fn parse_query_operand(p: &mut Parser) -> Result<SelectQuery, ParseError> {
    if p.at(LexemeKind::OpenParen) && is_query_start(p.nth(1)) {
        p.bump();
        let query = parse_select_query(p)?;
        p.expect(LexemeKind::CloseParen, "\")\"")?;
        return Ok(query);
    }

    let with = if p.at_command("with") {
        Some(parse_with_clause(p)?)
    } else {
        None
    };

    if p.at_command("values") {
        if with.is_some() {
            return Err(ParseError::unexpected(p.current(), "\"select\""));
        }
        return Ok(SelectQuery::Values(parse_values_query(p)?));
    }

    let select = parse_select_clause(p)?;
    let mut query = SimpleSelectQuery::new(with, select);
    while parse_trailing_clause(p, &mut query)? {}

    Ok(SelectQuery::Simple(Box::new(query)))
}

/// Parses at most one trailing clause into `query`; returns whether it
/// consumed anything. Duplicate clauses simply stop the loop and surface as
/// an unexpected-token error in the caller.
fn parse_trailing_clause(
    p: &mut Parser,
    query: &mut SimpleSelectQuery,
) -> Result<bool, ParseError> {
    if p.current().kind != LexemeKind::Command {
        return Ok(false);
    }

    match p.current().text.as_str() {
        "from" if query.from.is_none() => query.from = Some(parse_from_clause(p)?),
        "where" if query.where_clause.is_none() => {
            query.where_clause = Some(parse_where_clause(p)?)
        }
        "group by" if query.group_by.is_none() => {
            query.group_by = Some(parse_group_by_clause(p)?)
        }
        "having" if query.having.is_none() => query.having = Some(parse_having_clause(p)?),
        "window" if query.window.is_none() => query.window = Some(parse_window_clause(p)?),
        "order by" if query.order_by.is_none() => {
            query.order_by = Some(parse_order_by_clause(p)?)
        }
        "limit" if query.limit.is_none() => query.limit = Some(parse_limit_clause(p)?),
        "offset" if query.offset.is_none() => query.offset = Some(parse_offset_clause(p)?),
        "for" if query.for_clause.is_none() => query.for_clause = Some(parse_for_clause(p)?),
        _ => return Ok(false),
    }

    Ok(true)
}

/// Cooperative cancellation signal for the async parse facade.
///
/// The flag is only observed at suspension points; setting it aborts the
/// parse with [`ParseError::Cancelled`] at the next one.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(std::sync::Arc<std::sync::atomic::AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// Async twin of [`parse_select_statement`]: same grammar, but yields to
/// the scheduler after tokenization and after each top-level clause so an
/// event loop driving many parses is not starved. Subqueries parse
/// synchronously within their clause.
#[cfg(feature = "async")]
pub(crate) async fn parse_select_statement_async(
    sql: &str,
    cancel: &CancelFlag,
) -> Result<SelectQuery, crate::Error> {
    let lexemes = crate::lexer::read_lexemes(sql)?;
    let mut p = Parser::from_lexemes(lexemes);
    suspend(cancel).await?;

    let mut query = parse_query_operand_async(&mut p, cancel).await?;
    while let Some(op) = at_set_operator(&p) {
        p.bump();
        let right = parse_query_operand_async(&mut p, cancel).await?;
        query = SelectQuery::Binary(Box::new(BinarySelectQuery {
            op,
            left: query,
            right,
        }));
    }

    p.expect_finished().map_err(crate::Error::from)?;
    Ok(query)
}

#[cfg(feature = "async")]
async fn parse_query_operand_async(
    p: &mut Parser,
    cancel: &CancelFlag,
) -> Result<SelectQuery, crate::Error> {
    if p.at(LexemeKind::OpenParen) && is_query_start(p.nth(1)) {
        p.bump();
        let query = parse_select_query(p)?;
        p.expect(LexemeKind::CloseParen, "\")\"")?;
        suspend(cancel).await?;
        return Ok(query);
    }

    let with = if p.at_command("with") {
        let with = parse_with_clause(p)?;
        suspend(cancel).await?;
        Some(with)
    } else {
        None
    };

    if p.at_command("values") {
        if with.is_some() {
            return Err(ParseError::unexpected(p.current(), "\"select\"").into());
        }
        let values = parse_values_query(p)?;
        suspend(cancel).await?;
        return Ok(SelectQuery::Values(values));
    }

    let select = parse_select_clause(p)?;
    suspend(cancel).await?;

    let mut query = SimpleSelectQuery::new(with, select);
    while parse_trailing_clause(p, &mut query)? {
        suspend(cancel).await?;
    }

    Ok(SelectQuery::Simple(Box::new(query)))
}

#[cfg(feature = "async")]
async fn suspend(cancel: &CancelFlag) -> Result<(), ParseError> {
    tokio::task::yield_now().await;
    if cancel.is_cancelled() {
        Err(ParseError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::tests::check;
    use expect_test::expect;

    #[test]
    fn test_parse_set_operations_left_associative() {
        check(
            "select 1 union select 2 union all select 3 except select 4",
            expect![["select 1 union select 2 union all select 3 except select 4"]],
        );
    }

    #[test]
    fn test_parse_parenthesized_operand() {
        check(
            "(select 1 union select 2) intersect select 3",
            expect![["select 1 union select 2 intersect select 3"]],
        );
    }

    #[test]
    fn test_parse_full_clause_ladder() {
        check(
            "select dept, count(*) c from emp where active group by dept having count(*) > 1 order by c desc limit 10 offset 5 for update",
            expect![[
                r#"select "dept", count(*) as "c" from "emp" where "active" group by "dept" having count(*) > 1 order by "c" desc limit 10 offset 5 for update"#
            ]],
        );
    }

    #[test]
    fn test_scalar_subquery() {
        check(
            "select (select max(id) from t) m from u",
            expect![[r#"select (select max("id") from "t") as "m" from "u""#]],
        );
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(crate::parse_select("select 1 select 2").is_err());
    }

    #[cfg(feature = "async")]
    mod async_facade {
        use crate::{parse_select, parse_select_async, CancelFlag, Error};
        use crate::parser::ParseError;

        #[tokio::test]
        async fn test_async_matches_sync() {
            let sql = "with t as (select 1) select * from t union all select 2 order by 1";
            let sync = parse_select(sql).unwrap();
            let parsed = parse_select_async(sql, &CancelFlag::new()).await.unwrap();
            pretty_assertions::assert_eq!(sync, parsed);
        }

        #[tokio::test]
        async fn test_cancellation_observed() {
            let cancel = CancelFlag::new();
            cancel.cancel();
            let result = parse_select_async("select 1", &cancel).await;
            assert!(matches!(result, Err(Error::Parse(ParseError::Cancelled))));
        }
    }
}
