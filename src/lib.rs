// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Dialect-tolerant SQL parsing, analysis and re-printing.
//!
//! The pipeline is pure: text goes through the tokenizer into a lexeme
//! stream, through the recursive-descent parsers into a typed AST, through
//! visitors for collection or rewriting, and back out through one of two
//! renderers. No global state, no I/O; every public entry point returns
//! either a result or a single positioned [`Error`].

pub mod ast;
pub mod format;
pub mod lexer;
pub mod visitor;

mod grammar;
mod parser;

use ast::{
    CommonTable, ForClause, FromClause, GroupByClause, HavingClause, InsertQuery, LimitClause,
    OrderByClause, SelectClause, SelectItem, SelectQuery, TableRef, UpdateQuery, ValuesQuery,
    Value, WhereClause, WindowClause,
};
use format::{FormatOptions, Formatter, PrintStyle, PrintTokenParser, SqlPrinter};
use lexer::{LexError, Lexeme};
use parser::Parser;
use visitor::{CommonTableCollector, SelectItemCollector, TableSourceCollector, VisitError};

pub use format::PrintError;
pub use grammar::CancelFlag;
pub use parser::ParseError;

/// Any failure crossing the library boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Visit(#[from] VisitError),
    #[error(transparent)]
    Print(#[from] PrintError),
}

// --- parsing ------------------------------------------------------------

/// Parses a complete SELECT-shaped statement (including set operations and
/// bare `values` lists).
pub fn parse_select(sql: &str) -> Result<SelectQuery, Error> {
    let mut p = Parser::new(sql)?;
    Ok(grammar::parse_select_statement(&mut p)?)
}

/// Async variant of [`parse_select`]; yields to the scheduler after
/// tokenization and after each top-level clause, and aborts at those points
/// once `cancel` is set.
#[cfg(feature = "async")]
pub async fn parse_select_async(sql: &str, cancel: &CancelFlag) -> Result<SelectQuery, Error> {
    grammar::parse_select_statement_async(sql, cancel).await
}

pub fn parse_insert(sql: &str) -> Result<InsertQuery, Error> {
    let mut p = Parser::new(sql)?;
    Ok(grammar::parse_insert_statement(&mut p)?)
}

pub fn parse_update(sql: &str) -> Result<UpdateQuery, Error> {
    let mut p = Parser::new(sql)?;
    Ok(grammar::parse_update_statement(&mut p)?)
}

/// Parses a single value expression.
pub fn parse_expression(sql: &str) -> Result<Value, Error> {
    scoped(sql, grammar::parse_expr)
}

pub fn parse_select_clause(sql: &str) -> Result<SelectClause, Error> {
    scoped(sql, grammar::parse_select_clause)
}

pub fn parse_from_clause(sql: &str) -> Result<FromClause, Error> {
    scoped(sql, grammar::parse_from_clause)
}

pub fn parse_where(sql: &str) -> Result<WhereClause, Error> {
    scoped(sql, grammar::parse_where_clause)
}

pub fn parse_group_by(sql: &str) -> Result<GroupByClause, Error> {
    scoped(sql, grammar::parse_group_by_clause)
}

pub fn parse_having(sql: &str) -> Result<HavingClause, Error> {
    scoped(sql, grammar::parse_having_clause)
}

pub fn parse_order_by(sql: &str) -> Result<OrderByClause, Error> {
    scoped(sql, grammar::parse_order_by_clause)
}

pub fn parse_limit(sql: &str) -> Result<LimitClause, Error> {
    scoped(sql, grammar::parse_limit_clause)
}

pub fn parse_for(sql: &str) -> Result<ForClause, Error> {
    scoped(sql, grammar::parse_for_clause)
}

pub fn parse_window(sql: &str) -> Result<WindowClause, Error> {
    scoped(sql, grammar::parse_window_clause)
}

pub fn parse_values(sql: &str) -> Result<ValuesQuery, Error> {
    scoped(sql, grammar::parse_values_query)
}

pub fn parse_common_table(sql: &str) -> Result<CommonTable, Error> {
    scoped(sql, grammar::parse_common_table)
}

fn scoped<T>(
    sql: &str,
    parse: impl FnOnce(&mut Parser) -> Result<T, ParseError>,
) -> Result<T, Error> {
    let mut p = Parser::new(sql)?;
    let node = parse(&mut p)?;
    p.expect_finished()?;
    Ok(node)
}

// --- tokenizing ---------------------------------------------------------

/// Tokenizes `sql`; the lexeme sequence (with its attached comments) is a
/// stable public artifact.
pub fn read_lexemes(sql: &str) -> Result<Vec<Lexeme>, Error> {
    Ok(lexer::read_lexemes(sql)?)
}

// --- visitors -----------------------------------------------------------

/// Collects referenced tables; see [`TableSourceCollector`] for the
/// `selectable_only` semantics.
pub fn collect_tables(query: &SelectQuery, selectable_only: bool) -> Vec<TableRef> {
    TableSourceCollector::new(selectable_only).collect(query)
}

/// Collects CTEs, inner-first.
pub fn collect_common_tables(query: &SelectQuery) -> Vec<CommonTable> {
    CommonTableCollector::new().collect(query)
}

/// Returns the left-most select list of the query.
pub fn collect_select_items(query: &SelectQuery) -> Vec<SelectItem> {
    SelectItemCollector::new().collect(query)
}

/// Removes every predicate referencing a bind parameter; pure rewrite.
pub fn remove_parameter_predicates(query: &SelectQuery) -> SelectQuery {
    visitor::remove_parameter_predicates(query)
}

// --- rendering ----------------------------------------------------------

/// Renders a query on a single line under the given element options.
pub fn format(query: &SelectQuery, options: &FormatOptions) -> String {
    Formatter::new(options).format_query(query)
}

pub fn format_insert(insert: &InsertQuery, options: &FormatOptions) -> String {
    Formatter::new(options).format_insert(insert)
}

pub fn format_update(update: &UpdateQuery, options: &FormatOptions) -> String {
    Formatter::new(options).format_update(update)
}

/// Pretty-prints a query through the print-token pipeline.
pub fn print(query: &SelectQuery, style: &PrintStyle) -> Result<String, Error> {
    let tokens = PrintTokenParser::new(style).parse_query(query);
    Ok(SqlPrinter::new(style).print(&tokens)?)
}
