// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the compact single-line formatter.
//!
//! Rendering is invertible against the parser: re-parsing the output of any
//! of these methods yields a structurally equal AST, modulo identifier
//! escaping and keyword casing.

use itertools::Itertools;

use super::{FormatOptions, ParameterStyle};
use crate::ast::*;

pub struct Formatter<'a> {
    options: &'a FormatOptions,
    param_index: u32,
}

impl<'a> Formatter<'a> {
    pub fn new(options: &'a FormatOptions) -> Self {
        Self {
            options,
            param_index: 0,
        }
    }

    pub fn format_query(&mut self, query: &SelectQuery) -> String {
        let mut out = String::new();
        self.write_query(&mut out, query);
        out
    }

    pub fn format_value(&mut self, value: &Value) -> String {
        let mut out = String::new();
        self.write_value(&mut out, value);
        out
    }

    pub fn format_insert(&mut self, insert: &InsertQuery) -> String {
        let mut out = String::new();

        // A with clause on the source leads the whole statement, the same
        // position the parser accepts it in.
        let mut source_body = None;
        if let SelectQuery::Simple(simple) = &insert.source {
            if let Some(with) = &simple.with {
                self.write_with(&mut out, with);
                out.push(' ');
                source_body = Some(SimpleSelectQuery {
                    with: None,
                    ..(**simple).clone()
                });
            }
        }

        self.keyword(&mut out, "insert into");
        out.push(' ');
        self.write_table_ref(&mut out, &insert.target);
        if !insert.columns.is_empty() {
            out.push('(');
            self.write_ident_list(&mut out, &insert.columns);
            out.push(')');
        }
        out.push(' ');
        match &source_body {
            Some(body) => self.write_simple(&mut out, body),
            None => self.write_query(&mut out, &insert.source),
        }
        out
    }

    pub fn format_update(&mut self, update: &UpdateQuery) -> String {
        let mut out = String::new();
        self.keyword(&mut out, "update");
        out.push(' ');
        self.write_source(&mut out, &update.target);
        out.push(' ');
        self.keyword(&mut out, "set");
        out.push(' ');
        for (i, item) in update.set_items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_column(&mut out, &item.column);
            out.push_str(" = ");
            self.write_value(&mut out, &item.value);
        }
        if let Some(from) = &update.from {
            out.push(' ');
            self.write_from(&mut out, from);
        }
        if let Some(where_clause) = &update.where_clause {
            out.push(' ');
            self.keyword(&mut out, "where");
            out.push(' ');
            self.write_value(&mut out, &where_clause.predicate);
        }
        if !update.returning.is_empty() {
            out.push(' ');
            self.keyword(&mut out, "returning");
            out.push(' ');
            self.write_select_items(&mut out, &update.returning);
        }
        out
    }

    // --- queries ---------------------------------------------------------

    pub(crate) fn write_query(&mut self, out: &mut String, query: &SelectQuery) {
        match query {
            SelectQuery::Simple(simple) => self.write_simple(out, simple),
            SelectQuery::Binary(binary) => {
                self.write_query(out, &binary.left);
                out.push(' ');
                self.keyword(out, set_operator_text(binary.op));
                out.push(' ');
                self.write_query(out, &binary.right);
            }
            SelectQuery::Values(values) => self.write_values(out, values),
        }
    }

    fn write_simple(&mut self, out: &mut String, query: &SimpleSelectQuery) {
        if let Some(with) = &query.with {
            self.write_with(out, with);
            out.push(' ');
        }

        self.keyword(out, "select");
        match &query.select.distinct {
            DistinctKind::None => {}
            DistinctKind::All => {
                out.push(' ');
                self.keyword(out, "distinct");
            }
            DistinctKind::On(items) => {
                out.push(' ');
                self.keyword(out, "distinct");
                out.push(' ');
                self.keyword(out, "on");
                out.push('(');
                self.write_value_list(out, items);
                out.push(')');
            }
        }
        out.push(' ');
        self.write_select_items(out, &query.select.items);

        if let Some(from) = &query.from {
            out.push(' ');
            self.write_from(out, from);
        }
        if let Some(where_clause) = &query.where_clause {
            out.push(' ');
            self.keyword(out, "where");
            out.push(' ');
            self.write_value(out, &where_clause.predicate);
        }
        if let Some(group_by) = &query.group_by {
            out.push(' ');
            self.keyword(out, "group by");
            out.push(' ');
            match group_by.kind {
                GroupingKind::Plain => self.write_value_list(out, &group_by.items),
                GroupingKind::GroupingSets => {
                    self.keyword(out, "grouping sets");
                    out.push('(');
                    self.write_value_list(out, &group_by.items);
                    out.push(')');
                }
                GroupingKind::Cube => {
                    self.keyword(out, "cube");
                    out.push('(');
                    self.write_value_list(out, &group_by.items);
                    out.push(')');
                }
                GroupingKind::Rollup => {
                    self.keyword(out, "rollup");
                    out.push('(');
                    self.write_value_list(out, &group_by.items);
                    out.push(')');
                }
            }
        }
        if let Some(having) = &query.having {
            out.push(' ');
            self.keyword(out, "having");
            out.push(' ');
            self.write_value(out, &having.predicate);
        }
        if let Some(window) = &query.window {
            out.push(' ');
            self.keyword(out, "window");
            out.push(' ');
            for (i, entry) in window.windows.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                self.ident(out, &entry.name);
                out.push(' ');
                self.keyword(out, "as");
                out.push_str(" (");
                self.write_window_frame(out, &entry.window);
                out.push(')');
            }
        }
        if let Some(order_by) = &query.order_by {
            out.push(' ');
            self.write_order_by(out, order_by);
        }
        if let Some(limit) = &query.limit {
            out.push(' ');
            self.keyword(out, "limit");
            out.push(' ');
            self.write_value(out, &limit.value);
        }
        if let Some(offset) = &query.offset {
            out.push(' ');
            self.keyword(out, "offset");
            out.push(' ');
            self.write_value(out, &offset.value);
        }
        if let Some(for_clause) = &query.for_clause {
            out.push(' ');
            self.keyword(out, "for");
            out.push(' ');
            self.keyword(out, lock_mode_text(for_clause.lock_mode));
        }
    }

    fn write_with(&mut self, out: &mut String, with: &WithClause) {
        self.keyword(out, "with");
        out.push(' ');
        if with.recursive {
            self.keyword(out, "recursive");
            out.push(' ');
        }
        for (i, table) in with.tables.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_common_table(out, table);
        }
    }

    pub(crate) fn write_common_table(&mut self, out: &mut String, table: &CommonTable) {
        self.ident(out, &table.name);
        if !table.columns.is_empty() {
            out.push('(');
            self.write_ident_list(out, &table.columns);
            out.push(')');
        }
        out.push(' ');
        self.keyword(out, "as");
        out.push(' ');
        match table.materialization {
            Materialization::Default => {}
            Materialization::Materialized => {
                self.keyword(out, "materialized");
                out.push(' ');
            }
            Materialization::NotMaterialized => {
                self.keyword(out, "not materialized");
                out.push(' ');
            }
        }
        out.push('(');
        self.write_query(out, &table.query);
        out.push(')');
    }

    fn write_values(&mut self, out: &mut String, values: &ValuesQuery) {
        self.keyword(out, "values");
        out.push(' ');
        for (i, tuple) in values.tuples.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push('(');
            self.write_value_list(out, tuple);
            out.push(')');
        }
    }

    // --- clauses ---------------------------------------------------------

    pub(crate) fn write_select_items(&mut self, out: &mut String, items: &[SelectItem]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_select_item(out, item);
        }
    }

    pub(crate) fn write_select_item(&mut self, out: &mut String, item: &SelectItem) {
        self.write_value(out, &item.value);
        if let Some(alias) = &item.alias {
            out.push(' ');
            self.keyword(out, "as");
            out.push(' ');
            self.ident(out, alias);
        }
    }

    pub(crate) fn write_from(&mut self, out: &mut String, from: &FromClause) {
        self.keyword(out, "from");
        out.push(' ');
        self.write_source(out, &from.source);
        for join in &from.joins {
            out.push(' ');
            self.write_join(out, join);
        }
    }

    pub(crate) fn write_join(&mut self, out: &mut String, join: &JoinItem) {
        self.keyword(out, join_kind_text(join.kind));
        if join.lateral {
            out.push(' ');
            self.keyword(out, "lateral");
        }
        out.push(' ');
        self.write_source(out, &join.source);
        match &join.constraint {
            JoinConstraint::On(predicate) => {
                out.push(' ');
                self.keyword(out, "on");
                out.push(' ');
                self.write_value(out, predicate);
            }
            JoinConstraint::Using(columns) => {
                out.push(' ');
                self.keyword(out, "using");
                out.push_str(" (");
                self.write_ident_list(out, columns);
                out.push(')');
            }
            JoinConstraint::None => {}
        }
    }

    pub(crate) fn write_source(&mut self, out: &mut String, source: &SourceExpression) {
        match &source.kind {
            SourceKind::Table(table) => self.write_table_ref(out, table),
            SourceKind::SubQuery(query) => {
                out.push('(');
                self.write_query(out, query);
                out.push(')');
            }
            SourceKind::Values(values) => {
                out.push('(');
                self.write_values(out, values);
                out.push(')');
            }
            SourceKind::Function(call) => self.write_function_call(out, call),
            SourceKind::Paren(inner) => {
                out.push('(');
                self.write_source(out, inner);
                out.push(')');
            }
        }

        if let Some(alias) = &source.alias {
            // An alias merely repeating the table name is dropped.
            if let SourceKind::Table(table) = &source.kind {
                if alias.name == table.name && alias.columns.is_empty() {
                    return;
                }
            }
            out.push(' ');
            self.keyword(out, "as");
            out.push(' ');
            self.ident(out, &alias.name);
            if !alias.columns.is_empty() {
                out.push('(');
                self.write_ident_list(out, &alias.columns);
                out.push(')');
            }
        }
    }

    pub(crate) fn write_order_by(&mut self, out: &mut String, order_by: &OrderByClause) {
        self.keyword(out, "order by");
        out.push(' ');
        for (i, item) in order_by.items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_order_by_item(out, item);
        }
    }

    pub(crate) fn write_order_by_item(&mut self, out: &mut String, item: &OrderByItem) {
        self.write_value(out, &item.value);
        match item.direction {
            Some(OrderDirection::Asc) => {
                out.push(' ');
                self.keyword(out, "asc");
            }
            Some(OrderDirection::Desc) => {
                out.push(' ');
                self.keyword(out, "desc");
            }
            None => {}
        }
        match item.nulls {
            Some(NullsOrder::First) => {
                out.push(' ');
                self.keyword(out, "nulls first");
            }
            Some(NullsOrder::Last) => {
                out.push(' ');
                self.keyword(out, "nulls last");
            }
            None => {}
        }
    }

    pub(crate) fn write_window_frame(&mut self, out: &mut String, window: &WindowFrameClause) {
        let mut first = true;
        if !window.partition.is_empty() {
            self.keyword(out, "partition by");
            out.push(' ');
            self.write_value_list(out, &window.partition);
            first = false;
        }
        if let Some(order) = &window.order {
            if !first {
                out.push(' ');
            }
            self.write_order_by(out, order);
            first = false;
        }
        if let Some(frame) = &window.frame {
            if !first {
                out.push(' ');
            }
            self.keyword(out, frame_kind_text(frame.kind));
            out.push(' ');
            match &frame.end {
                Some(end) => {
                    self.keyword(out, "between");
                    out.push(' ');
                    self.write_frame_bound(out, &frame.start);
                    out.push(' ');
                    self.keyword(out, "and");
                    out.push(' ');
                    self.write_frame_bound(out, end);
                }
                None => self.write_frame_bound(out, &frame.start),
            }
        }
    }

    fn write_frame_bound(&mut self, out: &mut String, bound: &FrameBound) {
        match bound {
            FrameBound::UnboundedPreceding => self.keyword(out, "unbounded preceding"),
            FrameBound::UnboundedFollowing => self.keyword(out, "unbounded following"),
            FrameBound::CurrentRow => self.keyword(out, "current row"),
            FrameBound::Preceding(value) => {
                self.write_value(out, value);
                out.push(' ');
                self.keyword(out, "preceding");
            }
            FrameBound::Following(value) => {
                self.write_value(out, value);
                out.push(' ');
                self.keyword(out, "following");
            }
        }
    }

    // --- values ----------------------------------------------------------

    pub(crate) fn write_value(&mut self, out: &mut String, value: &Value) {
        match value {
            Value::Column(column) => self.write_column(out, column),
            Value::Literal(literal) => self.write_literal(out, literal),
            Value::Parameter(param) => self.write_parameter(out, param),
            Value::Array(array) => {
                self.keyword(out, "array");
                out.push('[');
                self.write_value_list(out, &array.elements);
                out.push(']');
            }
            Value::Tuple(tuple) => {
                out.push('(');
                self.write_value_list(out, &tuple.elements);
                out.push(')');
            }
            Value::Unary(unary) => {
                out.push_str(&unary.op);
                if unary.op.chars().all(|c| c.is_ascii_alphabetic()) {
                    out.push(' ');
                }
                self.write_value(out, &unary.operand);
            }
            Value::Binary(binary) => {
                self.write_value(out, &binary.left);
                out.push(' ');
                out.push_str(&binary.op);
                out.push(' ');
                self.write_value(out, &binary.right);
            }
            Value::Paren(paren) => {
                out.push('(');
                self.write_value(out, &paren.inner);
                out.push(')');
            }
            Value::Function(call) => self.write_function_call(out, call),
            Value::Case(case) => self.write_case(out, case),
            Value::Cast(cast) => {
                self.write_value(out, &cast.value);
                out.push_str("::");
                self.write_type_name(out, &cast.target_type);
            }
            Value::Between(between) => {
                self.write_value(out, &between.value);
                out.push(' ');
                out.push_str(if between.negated {
                    "not between"
                } else {
                    "between"
                });
                out.push(' ');
                self.write_value(out, &between.low);
                out.push_str(" and ");
                self.write_value(out, &between.high);
            }
            Value::Query(subquery) => {
                out.push('(');
                self.write_query(out, &subquery.query);
                out.push(')');
            }
        }
    }

    fn write_column(&mut self, out: &mut String, column: &ColumnReference) {
        for namespace in &column.namespaces {
            self.ident(out, namespace);
            out.push('.');
        }
        self.ident(out, &column.column);
    }

    fn write_literal(&mut self, out: &mut String, literal: &LiteralValue) {
        match literal.kind {
            LiteralKind::Boolean | LiteralKind::Null => self.keyword(out, &literal.text),
            LiteralKind::Typed => {
                if let Some(tag) = &literal.type_tag {
                    self.keyword(out, &tag.name);
                    out.push(' ');
                }
                out.push_str(&literal.text);
            }
            LiteralKind::Number | LiteralKind::String => out.push_str(&literal.text),
        }
    }

    fn write_parameter(&mut self, out: &mut String, param: &ParameterExpression) {
        let symbol = &self.options.parameter_symbol;
        match self.options.parameter_style {
            ParameterStyle::Anonymous => out.push_str(&symbol.start),
            ParameterStyle::Named => {
                out.push_str(&symbol.start);
                match param {
                    ParameterExpression::Named(name) => out.push_str(name),
                    ParameterExpression::Indexed(index) => out.push_str(&index.to_string()),
                    ParameterExpression::Anonymous => {
                        out.push_str(&self.next_param_index().to_string())
                    }
                }
                out.push_str(&symbol.end);
            }
            ParameterStyle::Indexed => {
                out.push_str(&symbol.start);
                match param {
                    ParameterExpression::Indexed(index) => out.push_str(&index.to_string()),
                    _ => out.push_str(&self.next_param_index().to_string()),
                }
                out.push_str(&symbol.end);
            }
        }
    }

    fn next_param_index(&mut self) -> u32 {
        self.param_index += 1;
        self.param_index
    }

    pub(crate) fn write_function_call(&mut self, out: &mut String, call: &FunctionCall) {
        for namespace in &call.namespaces {
            self.ident(out, namespace);
            out.push('.');
        }
        out.push_str(&call.name);
        out.push('(');
        if call.distinct {
            self.keyword(out, "distinct");
            out.push(' ');
        }
        self.write_function_args(out, &call.args);
        out.push(')');

        if let Some(filter) = &call.filter {
            out.push(' ');
            self.keyword(out, "filter");
            out.push('(');
            self.keyword(out, "where");
            out.push(' ');
            self.write_value(out, filter);
            out.push(')');
        }

        if let Some(over) = &call.over {
            out.push(' ');
            self.keyword(out, "over");
            match over.as_ref() {
                OverClause::Named(name) => {
                    out.push(' ');
                    self.ident(out, name);
                }
                OverClause::Window(window) => {
                    out.push('(');
                    self.write_window_frame(out, window);
                    out.push(')');
                }
            }
        }
    }

    fn write_function_args(&mut self, out: &mut String, args: &FunctionArgList) {
        match args {
            FunctionArgList::Values(values) => self.write_value_list(out, values),
            FunctionArgList::Extract { field, value } => {
                out.push_str(field);
                out.push(' ');
                self.keyword(out, "from");
                out.push(' ');
                self.write_value(out, value);
            }
            FunctionArgList::Position { needle, haystack } => {
                self.write_value(out, needle);
                out.push(' ');
                self.keyword(out, "in");
                out.push(' ');
                self.write_value(out, haystack);
            }
            FunctionArgList::Substring {
                value,
                from,
                for_count,
                similar,
                escape,
            } => {
                self.write_value(out, value);
                for (keyword, part) in [
                    ("from", from),
                    ("for", for_count),
                    ("similar", similar),
                    ("escape", escape),
                ] {
                    if let Some(part) = part {
                        out.push(' ');
                        self.keyword(out, keyword);
                        out.push(' ');
                        self.write_value(out, part);
                    }
                }
            }
            FunctionArgList::Trim {
                side,
                chars,
                value,
                comma_form,
            } => {
                if *comma_form {
                    self.write_value(out, value);
                    if let Some(chars) = chars {
                        out.push_str(", ");
                        self.write_value(out, chars);
                    }
                } else {
                    if let Some(side) = side {
                        self.keyword(out, trim_side_text(*side));
                        out.push(' ');
                    }
                    if let Some(chars) = chars {
                        self.write_value(out, chars);
                        out.push(' ');
                    }
                    self.keyword(out, "from");
                    out.push(' ');
                    self.write_value(out, value);
                }
            }
        }
    }

    fn write_case(&mut self, out: &mut String, case: &CaseExpression) {
        self.keyword(out, "case");
        if let Some(condition) = &case.condition {
            out.push(' ');
            self.write_value(out, condition);
        }
        for branch in &case.switch.branches {
            out.push(' ');
            self.keyword(out, "when");
            out.push(' ');
            self.write_value(out, &branch.when);
            out.push(' ');
            self.keyword(out, "then");
            out.push(' ');
            self.write_value(out, &branch.then);
        }
        if let Some(else_value) = &case.switch.else_value {
            out.push(' ');
            self.keyword(out, "else");
            out.push(' ');
            self.write_value(out, else_value);
        }
        out.push(' ');
        self.keyword(out, "end");
    }

    pub(crate) fn write_type_name(&mut self, out: &mut String, type_name: &TypeName) {
        out.push_str(&type_name.name);
        if !type_name.precision.is_empty() {
            out.push('(');
            self.write_value_list(out, &type_name.precision);
            out.push(')');
        }
    }

    fn write_value_list(&mut self, out: &mut String, values: &[Value]) {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_value(out, value);
        }
    }

    fn write_table_ref(&mut self, out: &mut String, table: &TableRef) {
        for namespace in &table.namespaces {
            self.ident(out, namespace);
            out.push('.');
        }
        self.ident(out, &table.name);
    }

    fn write_ident_list(&mut self, out: &mut String, idents: &[Identifier]) {
        let mut rendered = idents.iter().map(|ident| {
            let mut chunk = String::new();
            self.ident_into(&mut chunk, ident);
            chunk
        });
        out.push_str(&rendered.join(", "));
    }

    pub(crate) fn keyword(&self, out: &mut String, keyword: &str) {
        out.push_str(&self.options.keyword_case.apply(keyword));
    }

    pub(crate) fn ident(&self, out: &mut String, name: &str) {
        self.ident_into(out, name);
    }

    fn ident_into(&self, out: &mut String, name: &str) {
        if name == "*" {
            out.push('*');
            return;
        }
        let escape = &self.options.identifier_escape;
        out.push_str(&escape.start);
        if escape.end.is_empty() {
            out.push_str(name);
        } else {
            out.push_str(&name.replace(&escape.end, &format!("{0}{0}", escape.end)));
        }
        out.push_str(&escape.end);
    }
}

fn set_operator_text(op: SetOperator) -> &'static str {
    match op {
        SetOperator::Union => "union",
        SetOperator::UnionAll => "union all",
        SetOperator::Intersect => "intersect",
        SetOperator::Except => "except",
    }
}

fn join_kind_text(kind: JoinKind) -> &'static str {
    match kind {
        JoinKind::Inner => "inner join",
        JoinKind::Left => "left join",
        JoinKind::Right => "right join",
        JoinKind::Full => "full outer join",
        JoinKind::Cross => "cross join",
        JoinKind::Natural => "natural join",
    }
}

fn lock_mode_text(mode: LockMode) -> &'static str {
    match mode {
        LockMode::Update => "update",
        LockMode::NoKeyUpdate => "no key update",
        LockMode::Share => "share",
        LockMode::KeyShare => "key share",
    }
}

fn frame_kind_text(kind: FrameKind) -> &'static str {
    match kind {
        FrameKind::Rows => "rows",
        FrameKind::Range => "range",
        FrameKind::Groups => "groups",
    }
}

fn trim_side_text(side: TrimSide) -> &'static str {
    match side {
        TrimSide::Leading => "leading",
        TrimSide::Trailing => "trailing",
        TrimSide::Both => "both",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{KeywordCase, ParameterStyle};

    #[test]
    fn test_identifier_escaping_per_dialect() {
        let query = crate::parse_select("select id from users").unwrap();

        let postgres = crate::format(&query, &FormatOptions::postgres());
        assert_eq!(postgres, r#"select "id" from "users""#);

        let mysql = crate::format(&query, &FormatOptions::mysql());
        assert_eq!(mysql, "select `id` from `users`");

        let sqlserver = crate::format(&query, &FormatOptions::sqlserver());
        assert_eq!(sqlserver, "SELECT [id] FROM [users]");
    }

    #[test]
    fn test_embedded_escape_char_doubles() {
        let query = crate::parse_select(r#"select "od""d" from t"#).unwrap();
        assert_eq!(
            crate::format(&query, &FormatOptions::postgres()),
            r#"select "od""d" from "t""#
        );
    }

    #[test]
    fn test_parameter_styles() {
        let query = crate::parse_select("select * from t where a = :a and b = ?").unwrap();

        assert_eq!(
            crate::format(&query, &FormatOptions::postgres()),
            r#"select * from "t" where "a" = :a and "b" = :1"#
        );

        let mut indexed = FormatOptions::postgres();
        indexed.parameter_style = ParameterStyle::Indexed;
        indexed.parameter_symbol.start = "$".to_string();
        assert_eq!(
            crate::format(&query, &indexed),
            r#"select * from "t" where "a" = $1 and "b" = $2"#
        );

        assert_eq!(
            crate::format(&query, &FormatOptions::mysql()),
            "select * from `t` where `a` = ? and `b` = ?"
        );
    }

    #[test]
    fn test_keyword_case_upper_keeps_operators() {
        let query = crate::parse_select("select a from t where a = 1 and b = 2").unwrap();
        let mut options = FormatOptions::postgres();
        options.keyword_case = KeywordCase::Upper;
        // Stored operator strings stay lowercase; clause keywords re-case.
        assert_eq!(
            crate::format(&query, &options),
            r#"SELECT "a" FROM "t" WHERE "a" = 1 and "b" = 2"#
        );
    }
}
