// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the typed AST nodes for query clauses.

use serde::Serialize;

use super::{FunctionCall, Identifier, SelectQuery, Value, ValuesQuery, WindowFrameClause};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectClause {
    pub distinct: DistinctKind,
    pub items: Vec<SelectItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistinctKind {
    None,
    /// Plain `distinct`.
    All,
    /// `distinct on (…)`.
    On(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub value: Value,
    pub alias: Option<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromClause {
    pub source: SourceExpression,
    pub joins: Vec<JoinItem>,
}

/// A relation in `from`/`join` position with its optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceExpression {
    pub kind: SourceKind,
    pub alias: Option<SourceAlias>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Table(TableRef),
    SubQuery(Box<SelectQuery>),
    Function(FunctionCall),
    Values(ValuesQuery),
    Paren(Box<SourceExpression>),
}

/// A (possibly schema-qualified) table name. Also the record collected by
/// the table-source visitor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableRef {
    pub namespaces: Vec<Identifier>,
    pub name: Identifier,
}

impl TableRef {
    pub fn plain(name: impl Into<Identifier>) -> Self {
        Self {
            namespaces: Vec::new(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAlias {
    pub name: Identifier,
    pub columns: Vec<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinItem {
    pub kind: JoinKind,
    pub lateral: bool,
    pub source: SourceExpression,
    pub constraint: JoinConstraint,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
    Natural,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinConstraint {
    On(Value),
    Using(Vec<Identifier>),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub predicate: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupByClause {
    pub kind: GroupingKind,
    pub items: Vec<Value>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GroupingKind {
    Plain,
    GroupingSets,
    Cube,
    Rollup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HavingClause {
    pub predicate: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByClause {
    pub items: Vec<OrderByItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByItem {
    pub value: Value,
    pub direction: Option<OrderDirection>,
    pub nulls: Option<NullsOrder>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitClause {
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetClause {
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForClause {
    pub lock_mode: LockMode,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LockMode {
    Update,
    NoKeyUpdate,
    Share,
    KeyShare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClause {
    pub windows: Vec<NamedWindow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedWindow {
    pub name: Identifier,
    pub window: WindowFrameClause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithClause {
    pub recursive: bool,
    pub tables: Vec<CommonTable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonTable {
    pub name: Identifier,
    pub columns: Vec<Identifier>,
    pub materialization: Materialization,
    pub query: Box<SelectQuery>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Materialization {
    Default,
    Materialized,
    NotMaterialized,
}
