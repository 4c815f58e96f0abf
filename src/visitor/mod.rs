// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the visitor infrastructure: a trait with one dispatch entry
//! per node family and exhaustive `walk_*` functions carrying the
//! traversal. Collectors keep their accumulator in themselves, never in the
//! tree.

mod ctes;
mod params;
mod select_items;
mod tables;

pub use ctes::CommonTableCollector;
pub use params::remove_parameter_predicates;
pub use select_items::SelectItemCollector;
pub use tables::TableSourceCollector;

use crate::ast::*;

/// Errors raised by visitors. The built-in visitors never fail; the type
/// exists for user extensions behind the same API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisitError {
    #[error("visitor failure: {0}")]
    Custom(String),
}

pub trait Visitor {
    fn visit_select_query(&mut self, query: &SelectQuery)
    where
        Self: Sized,
    {
        walk_select_query(self, query);
    }

    fn visit_common_table(&mut self, table: &CommonTable)
    where
        Self: Sized,
    {
        walk_common_table(self, table);
    }

    fn visit_source_expression(&mut self, source: &SourceExpression)
    where
        Self: Sized,
    {
        walk_source_expression(self, source);
    }

    fn visit_select_item(&mut self, item: &SelectItem)
    where
        Self: Sized,
    {
        walk_select_item(self, item);
    }

    fn visit_value(&mut self, value: &Value)
    where
        Self: Sized,
    {
        walk_value(self, value);
    }
}

pub fn walk_select_query<V: Visitor>(visitor: &mut V, query: &SelectQuery) {
    match query {
        SelectQuery::Simple(simple) => {
            if let Some(with) = &simple.with {
                for table in &with.tables {
                    visitor.visit_common_table(table);
                }
            }
            for item in &simple.select.items {
                visitor.visit_select_item(item);
            }
            if let DistinctKind::On(items) = &simple.select.distinct {
                for item in items {
                    visitor.visit_value(item);
                }
            }
            if let Some(from) = &simple.from {
                visitor.visit_source_expression(&from.source);
                for join in &from.joins {
                    visitor.visit_source_expression(&join.source);
                    if let JoinConstraint::On(predicate) = &join.constraint {
                        visitor.visit_value(predicate);
                    }
                }
            }
            if let Some(where_clause) = &simple.where_clause {
                visitor.visit_value(&where_clause.predicate);
            }
            if let Some(group_by) = &simple.group_by {
                for item in &group_by.items {
                    visitor.visit_value(item);
                }
            }
            if let Some(having) = &simple.having {
                visitor.visit_value(&having.predicate);
            }
            if let Some(window) = &simple.window {
                for entry in &window.windows {
                    walk_window_frame(visitor, &entry.window);
                }
            }
            if let Some(order_by) = &simple.order_by {
                for item in &order_by.items {
                    visitor.visit_value(&item.value);
                }
            }
            if let Some(limit) = &simple.limit {
                visitor.visit_value(&limit.value);
            }
            if let Some(offset) = &simple.offset {
                visitor.visit_value(&offset.value);
            }
        }
        SelectQuery::Binary(binary) => {
            visitor.visit_select_query(&binary.left);
            visitor.visit_select_query(&binary.right);
        }
        SelectQuery::Values(values) => {
            for tuple in &values.tuples {
                for value in tuple {
                    visitor.visit_value(value);
                }
            }
        }
    }
}

pub fn walk_common_table<V: Visitor>(visitor: &mut V, table: &CommonTable) {
    visitor.visit_select_query(&table.query);
}

pub fn walk_source_expression<V: Visitor>(visitor: &mut V, source: &SourceExpression) {
    match &source.kind {
        SourceKind::Table(_) => {}
        SourceKind::SubQuery(query) => visitor.visit_select_query(query),
        SourceKind::Function(call) => walk_function_call(visitor, call),
        SourceKind::Values(values) => {
            for tuple in &values.tuples {
                for value in tuple {
                    visitor.visit_value(value);
                }
            }
        }
        SourceKind::Paren(inner) => visitor.visit_source_expression(inner),
    }
}

pub fn walk_select_item<V: Visitor>(visitor: &mut V, item: &SelectItem) {
    visitor.visit_value(&item.value);
}

pub fn walk_value<V: Visitor>(visitor: &mut V, value: &Value) {
    match value {
        Value::Column(_) | Value::Literal(_) | Value::Parameter(_) => {}
        Value::Array(array) => {
            for element in &array.elements {
                visitor.visit_value(element);
            }
        }
        Value::Tuple(tuple) => {
            for element in &tuple.elements {
                visitor.visit_value(element);
            }
        }
        Value::Unary(unary) => visitor.visit_value(&unary.operand),
        Value::Binary(binary) => {
            visitor.visit_value(&binary.left);
            visitor.visit_value(&binary.right);
        }
        Value::Paren(paren) => visitor.visit_value(&paren.inner),
        Value::Function(call) => walk_function_call(visitor, call),
        Value::Case(case) => {
            if let Some(condition) = &case.condition {
                visitor.visit_value(condition);
            }
            for branch in &case.switch.branches {
                visitor.visit_value(&branch.when);
                visitor.visit_value(&branch.then);
            }
            if let Some(else_value) = &case.switch.else_value {
                visitor.visit_value(else_value);
            }
        }
        Value::Cast(cast) => visitor.visit_value(&cast.value),
        Value::Between(between) => {
            visitor.visit_value(&between.value);
            visitor.visit_value(&between.low);
            visitor.visit_value(&between.high);
        }
        Value::Query(subquery) => visitor.visit_select_query(&subquery.query),
    }
}

fn walk_function_call<V: Visitor>(visitor: &mut V, call: &FunctionCall) {
    match &call.args {
        FunctionArgList::Values(values) => {
            for value in values {
                visitor.visit_value(value);
            }
        }
        FunctionArgList::Extract { value, .. } => visitor.visit_value(value),
        FunctionArgList::Position { needle, haystack } => {
            visitor.visit_value(needle);
            visitor.visit_value(haystack);
        }
        FunctionArgList::Substring {
            value,
            from,
            for_count,
            similar,
            escape,
        } => {
            visitor.visit_value(value);
            for part in [from, for_count, similar, escape].into_iter().flatten() {
                visitor.visit_value(part);
            }
        }
        FunctionArgList::Trim { chars, value, .. } => {
            if let Some(chars) = chars {
                visitor.visit_value(chars);
            }
            visitor.visit_value(value);
        }
    }

    if let Some(filter) = &call.filter {
        visitor.visit_value(filter);
    }
    if let Some(OverClause::Window(window)) = call.over.as_deref() {
        walk_window_frame(visitor, window);
    }
}

fn walk_window_frame<V: Visitor>(visitor: &mut V, window: &WindowFrameClause) {
    for item in &window.partition {
        visitor.visit_value(item);
    }
    if let Some(order) = &window.order {
        for item in &order.items {
            visitor.visit_value(&item.value);
        }
    }
    if let Some(frame) = &window.frame {
        for bound in std::iter::once(&frame.start).chain(frame.end.as_ref()) {
            if let FrameBound::Preceding(value) | FrameBound::Following(value) = bound {
                visitor.visit_value(value);
            }
        }
    }
}
