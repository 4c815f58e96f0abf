// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the typed AST nodes for top-level queries.

use super::{
    ColumnReference, ForClause, FromClause, GroupByClause, HavingClause, Identifier, LimitClause,
    OffsetClause, OrderByClause, SelectClause, SelectItem, SourceExpression, TableRef, Value,
    WhereClause, WindowClause, WithClause,
};

/// A SELECT-shaped query: one select body, a set-operation tree or a bare
/// `values` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectQuery {
    Simple(Box<SimpleSelectQuery>),
    Binary(Box<BinarySelectQuery>),
    Values(ValuesQuery),
}

/// A single `select` body with its trailing clauses in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleSelectQuery {
    pub with: Option<WithClause>,
    pub select: SelectClause,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub group_by: Option<GroupByClause>,
    pub having: Option<HavingClause>,
    pub window: Option<WindowClause>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
    pub offset: Option<OffsetClause>,
    pub for_clause: Option<ForClause>,
}

impl SimpleSelectQuery {
    pub(crate) fn new(with: Option<WithClause>, select: SelectClause) -> Self {
        Self {
            with,
            select,
            from: None,
            where_clause: None,
            group_by: None,
            having: None,
            window: None,
            order_by: None,
            limit: None,
            offset: None,
            for_clause: None,
        }
    }
}

/// Two queries combined by a set operator; chains are left-associative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySelectQuery {
    pub op: SetOperator,
    pub left: SelectQuery,
    pub right: SelectQuery,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    Except,
}

/// A `values` list; tuples may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesQuery {
    pub tuples: Vec<Vec<Value>>,
}

/// `insert into target [(columns)] (select … | values …)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertQuery {
    pub target: TableRef,
    pub columns: Vec<Identifier>,
    pub source: SelectQuery,
}

/// `update target set … [from …] [where …] [returning …]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateQuery {
    pub target: SourceExpression,
    pub set_items: Vec<SetItem>,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub returning: Vec<SelectItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetItem {
    pub column: ColumnReference,
    pub value: Value,
}
