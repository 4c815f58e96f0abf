// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the print-token tree sitting between the AST and the
//! pretty-printer.
//!
//! Leaf expressions are pre-rendered into compact text chunks; containers
//! mark the structural boundaries the printer may break and indent.

use super::{Formatter, PrintStyle};
use crate::ast::*;

/// Structural container kinds; the style's
/// `indent_increment_container_types` selects which of these add an indent
/// level when rendered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContainerType {
    SelectClause,
    SelectItem,
    FromClause,
    JoinItem,
    WhereClause,
    GroupByClause,
    HavingClause,
    OrderByClause,
    WindowClause,
    LimitClause,
    OffsetClause,
    ForClause,
    WithClause,
    CommonTable,
    SetOperation,
    ValuesClause,
    ValuesRow,
    CaseExpression,
    SwitchCaseArgument,
    WindowExpression,
    SubQuery,
}

impl ContainerType {
    /// Containers that indent by default.
    pub const DEFAULT_INDENTED: &'static [ContainerType] = &[
        ContainerType::SelectClause,
        ContainerType::FromClause,
        ContainerType::WhereClause,
        ContainerType::GroupByClause,
        ContainerType::HavingClause,
        ContainerType::OrderByClause,
        ContainerType::WindowClause,
        ContainerType::WithClause,
        ContainerType::ValuesClause,
        ContainerType::CaseExpression,
        ContainerType::SubQuery,
    ];
}

/// One node of the print-token tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintToken {
    /// A structural keyword, re-cased by the printer.
    Keyword(String),
    /// A pre-rendered text chunk, emitted verbatim.
    Text(String),
    /// List separator, placed according to `comma_break`.
    Comma,
    /// Top-level `and`/`or` of a predicate, placed according to
    /// `and_break`.
    BoolOp(String),
    Space,
    /// Soft break between a clause keyword and its body.
    Break,
    Container(ContainerType, Vec<PrintToken>),
}

/// Converts ASTs into print-token trees under a given style.
pub struct PrintTokenParser<'a> {
    style: &'a PrintStyle,
}

impl<'a> PrintTokenParser<'a> {
    pub fn new(style: &'a PrintStyle) -> Self {
        Self { style }
    }

    pub fn parse_query(&self, query: &SelectQuery) -> Vec<PrintToken> {
        let mut formatter = Formatter::new(&self.style.options);
        self.query_tokens(&mut formatter, query)
    }

    fn query_tokens(&self, fmt: &mut Formatter<'_>, query: &SelectQuery) -> Vec<PrintToken> {
        match query {
            SelectQuery::Simple(simple) => self.simple_tokens(fmt, simple),
            SelectQuery::Binary(binary) => {
                let mut tokens = self.query_tokens(fmt, &binary.left);
                tokens.push(PrintToken::Container(
                    ContainerType::SetOperation,
                    vec![PrintToken::Keyword(set_operator_text(binary.op).to_string())],
                ));
                tokens.extend(self.query_tokens(fmt, &binary.right));
                tokens
            }
            SelectQuery::Values(values) => vec![self.values_tokens(fmt, values)],
        }
    }

    fn simple_tokens(
        &self,
        fmt: &mut Formatter<'_>,
        query: &SimpleSelectQuery,
    ) -> Vec<PrintToken> {
        let mut tokens = Vec::new();

        if let Some(with) = &query.with {
            tokens.push(self.with_tokens(fmt, with));
        }

        tokens.push(self.select_tokens(fmt, &query.select));

        if let Some(from) = &query.from {
            tokens.push(self.from_tokens(fmt, from));
        }
        if let Some(where_clause) = &query.where_clause {
            tokens.push(self.predicate_clause_tokens(
                fmt,
                ContainerType::WhereClause,
                "where",
                &where_clause.predicate,
            ));
        }
        if let Some(group_by) = &query.group_by {
            tokens.push(self.group_by_tokens(fmt, group_by));
        }
        if let Some(having) = &query.having {
            tokens.push(self.predicate_clause_tokens(
                fmt,
                ContainerType::HavingClause,
                "having",
                &having.predicate,
            ));
        }
        if let Some(window) = &query.window {
            tokens.push(self.window_clause_tokens(fmt, window));
        }
        if let Some(order_by) = &query.order_by {
            tokens.push(self.order_by_tokens(fmt, order_by));
        }
        if let Some(limit) = &query.limit {
            tokens.push(self.value_clause_tokens(
                fmt,
                ContainerType::LimitClause,
                "limit",
                &limit.value,
            ));
        }
        if let Some(offset) = &query.offset {
            tokens.push(self.value_clause_tokens(
                fmt,
                ContainerType::OffsetClause,
                "offset",
                &offset.value,
            ));
        }
        if let Some(for_clause) = &query.for_clause {
            tokens.push(PrintToken::Container(
                ContainerType::ForClause,
                vec![
                    PrintToken::Keyword("for".to_string()),
                    PrintToken::Break,
                    PrintToken::Keyword(lock_mode_text(for_clause.lock_mode).to_string()),
                ],
            ));
        }

        tokens
    }

    fn select_tokens(&self, fmt: &mut Formatter<'_>, select: &SelectClause) -> PrintToken {
        let mut children = vec![PrintToken::Keyword("select".to_string())];

        match &select.distinct {
            DistinctKind::None => {}
            DistinctKind::All => {
                children.push(PrintToken::Space);
                children.push(PrintToken::Keyword("distinct".to_string()));
            }
            DistinctKind::On(items) => {
                children.push(PrintToken::Space);
                children.push(PrintToken::Keyword("distinct".to_string()));
                children.push(PrintToken::Space);
                children.push(PrintToken::Keyword("on".to_string()));
                let mut list = String::new();
                list.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        list.push_str(", ");
                    }
                    list.push_str(&fmt.format_value(item));
                }
                list.push(')');
                children.push(PrintToken::Text(list));
            }
        }

        children.push(PrintToken::Break);
        for (i, item) in select.items.iter().enumerate() {
            if i > 0 {
                children.push(PrintToken::Comma);
            }
            children.push(self.select_item_tokens(fmt, item));
        }

        PrintToken::Container(ContainerType::SelectClause, children)
    }

    fn select_item_tokens(&self, fmt: &mut Formatter<'_>, item: &SelectItem) -> PrintToken {
        let mut children = Vec::new();

        match &item.value {
            Value::Case(case) if self.indents(ContainerType::CaseExpression) => {
                children.push(self.case_tokens(fmt, case));
            }
            Value::Function(call)
                if matches!(call.over.as_deref(), Some(OverClause::Window(_)))
                    && self.indents(ContainerType::WindowExpression) =>
            {
                children.push(self.window_expression_tokens(fmt, call));
            }
            value => children.push(PrintToken::Text(fmt.format_value(value))),
        }

        if let Some(alias) = &item.alias {
            children.push(PrintToken::Space);
            children.push(PrintToken::Keyword("as".to_string()));
            let mut name = String::new();
            fmt.ident(&mut name, alias);
            children.push(PrintToken::Text(format!(" {name}")));
        }

        PrintToken::Container(ContainerType::SelectItem, children)
    }

    fn from_tokens(&self, fmt: &mut Formatter<'_>, from: &FromClause) -> PrintToken {
        let mut children = vec![PrintToken::Keyword("from".to_string()), PrintToken::Break];
        children.extend(self.source_tokens(fmt, &from.source));

        for join in &from.joins {
            children.push(PrintToken::Break);
            children.push(self.join_tokens(fmt, join));
        }

        PrintToken::Container(ContainerType::FromClause, children)
    }

    fn join_tokens(&self, fmt: &mut Formatter<'_>, join: &JoinItem) -> PrintToken {
        let mut children = vec![PrintToken::Keyword(join_kind_text(join.kind).to_string())];
        if join.lateral {
            children.push(PrintToken::Space);
            children.push(PrintToken::Keyword("lateral".to_string()));
        }
        children.push(PrintToken::Space);
        children.extend(self.source_tokens(fmt, &join.source));

        match &join.constraint {
            JoinConstraint::On(predicate) => {
                children.push(PrintToken::Space);
                children.push(PrintToken::Keyword("on".to_string()));
                children.push(PrintToken::Text(format!(" {}", fmt.format_value(predicate))));
            }
            JoinConstraint::Using(columns) => {
                children.push(PrintToken::Space);
                children.push(PrintToken::Keyword("using".to_string()));
                let mut list = String::new();
                list.push_str(" (");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        list.push_str(", ");
                    }
                    fmt.ident(&mut list, column);
                }
                list.push(')');
                children.push(PrintToken::Text(list));
            }
            JoinConstraint::None => {}
        }

        PrintToken::Container(ContainerType::JoinItem, children)
    }

    fn source_tokens(
        &self,
        fmt: &mut Formatter<'_>,
        source: &SourceExpression,
    ) -> Vec<PrintToken> {
        let mut tokens = Vec::new();

        match &source.kind {
            SourceKind::SubQuery(query) if self.indents(ContainerType::SubQuery) => {
                tokens.push(PrintToken::Container(
                    ContainerType::SubQuery,
                    self.query_tokens(fmt, query),
                ));
            }
            _ => {
                // Sources without a breakable body render compact, alias
                // included.
                let mut text = String::new();
                fmt.write_source(&mut text, source);
                tokens.push(PrintToken::Text(text));
                return tokens;
            }
        }

        if let Some(alias) = &source.alias {
            tokens.push(PrintToken::Space);
            tokens.push(PrintToken::Keyword("as".to_string()));
            let mut name = String::from(" ");
            fmt.ident(&mut name, &alias.name);
            if !alias.columns.is_empty() {
                name.push('(');
                for (i, column) in alias.columns.iter().enumerate() {
                    if i > 0 {
                        name.push_str(", ");
                    }
                    fmt.ident(&mut name, column);
                }
                name.push(')');
            }
            tokens.push(PrintToken::Text(name));
        }

        tokens
    }

    fn predicate_clause_tokens(
        &self,
        fmt: &mut Formatter<'_>,
        container: ContainerType,
        keyword: &str,
        predicate: &Value,
    ) -> PrintToken {
        let mut children = vec![PrintToken::Keyword(keyword.to_string()), PrintToken::Break];
        self.predicate_tokens(fmt, predicate, &mut children);
        PrintToken::Container(container, children)
    }

    /// Splits the left spine of `and`/`or` chains into separately placeable
    /// chunks; parenthesized sub-expressions stay intact.
    fn predicate_tokens(
        &self,
        fmt: &mut Formatter<'_>,
        predicate: &Value,
        out: &mut Vec<PrintToken>,
    ) {
        match predicate {
            Value::Binary(binary) if predicate.is_boolean_chain() => {
                self.predicate_tokens(fmt, &binary.left, out);
                out.push(PrintToken::BoolOp(binary.op.clone()));
                out.push(PrintToken::Text(fmt.format_value(&binary.right)));
            }
            other => out.push(PrintToken::Text(fmt.format_value(other))),
        }
    }

    fn group_by_tokens(&self, fmt: &mut Formatter<'_>, group_by: &GroupByClause) -> PrintToken {
        let mut children = vec![
            PrintToken::Keyword("group by".to_string()),
            PrintToken::Break,
        ];

        let prefix = match group_by.kind {
            GroupingKind::Plain => None,
            GroupingKind::GroupingSets => Some("grouping sets"),
            GroupingKind::Cube => Some("cube"),
            GroupingKind::Rollup => Some("rollup"),
        };

        if let Some(prefix) = prefix {
            children.push(PrintToken::Keyword(prefix.to_string()));
            let mut list = String::new();
            list.push('(');
            for (i, item) in group_by.items.iter().enumerate() {
                if i > 0 {
                    list.push_str(", ");
                }
                list.push_str(&fmt.format_value(item));
            }
            list.push(')');
            children.push(PrintToken::Text(list));
        } else {
            for (i, item) in group_by.items.iter().enumerate() {
                if i > 0 {
                    children.push(PrintToken::Comma);
                }
                children.push(PrintToken::Text(fmt.format_value(item)));
            }
        }

        PrintToken::Container(ContainerType::GroupByClause, children)
    }

    fn order_by_tokens(&self, fmt: &mut Formatter<'_>, order_by: &OrderByClause) -> PrintToken {
        let mut children = vec![
            PrintToken::Keyword("order by".to_string()),
            PrintToken::Break,
        ];
        for (i, item) in order_by.items.iter().enumerate() {
            if i > 0 {
                children.push(PrintToken::Comma);
            }
            let mut text = String::new();
            fmt.write_order_by_item(&mut text, item);
            children.push(PrintToken::Text(text));
        }
        PrintToken::Container(ContainerType::OrderByClause, children)
    }

    fn window_clause_tokens(&self, fmt: &mut Formatter<'_>, window: &WindowClause) -> PrintToken {
        let mut children = vec![
            PrintToken::Keyword("window".to_string()),
            PrintToken::Break,
        ];
        for (i, entry) in window.windows.iter().enumerate() {
            if i > 0 {
                children.push(PrintToken::Comma);
            }
            let mut text = String::new();
            fmt.ident(&mut text, &entry.name);
            children.push(PrintToken::Text(text));
            children.push(PrintToken::Space);
            children.push(PrintToken::Keyword("as".to_string()));
            let mut body = String::from(" (");
            fmt.write_window_frame(&mut body, &entry.window);
            body.push(')');
            children.push(PrintToken::Text(body));
        }
        PrintToken::Container(ContainerType::WindowClause, children)
    }

    fn value_clause_tokens(
        &self,
        fmt: &mut Formatter<'_>,
        container: ContainerType,
        keyword: &str,
        value: &Value,
    ) -> PrintToken {
        PrintToken::Container(
            container,
            vec![
                PrintToken::Keyword(keyword.to_string()),
                PrintToken::Break,
                PrintToken::Text(fmt.format_value(value)),
            ],
        )
    }

    fn with_tokens(&self, fmt: &mut Formatter<'_>, with: &WithClause) -> PrintToken {
        let mut children = vec![PrintToken::Keyword("with".to_string())];
        if with.recursive {
            children.push(PrintToken::Space);
            children.push(PrintToken::Keyword("recursive".to_string()));
        }
        children.push(PrintToken::Break);

        for (i, table) in with.tables.iter().enumerate() {
            if i > 0 {
                children.push(PrintToken::Comma);
            }
            children.push(self.common_table_tokens(fmt, table));
        }

        PrintToken::Container(ContainerType::WithClause, children)
    }

    fn common_table_tokens(&self, fmt: &mut Formatter<'_>, table: &CommonTable) -> PrintToken {
        let mut children = Vec::new();

        let mut head = String::new();
        fmt.ident(&mut head, &table.name);
        if !table.columns.is_empty() {
            head.push('(');
            for (i, column) in table.columns.iter().enumerate() {
                if i > 0 {
                    head.push_str(", ");
                }
                fmt.ident(&mut head, column);
            }
            head.push(')');
        }
        children.push(PrintToken::Text(head));
        children.push(PrintToken::Space);
        children.push(PrintToken::Keyword("as".to_string()));
        children.push(PrintToken::Space);
        match table.materialization {
            Materialization::Default => {}
            Materialization::Materialized => {
                children.push(PrintToken::Keyword("materialized".to_string()));
                children.push(PrintToken::Space);
            }
            Materialization::NotMaterialized => {
                children.push(PrintToken::Keyword("not materialized".to_string()));
                children.push(PrintToken::Space);
            }
        }
        children.push(PrintToken::Container(
            ContainerType::SubQuery,
            self.query_tokens(fmt, &table.query),
        ));

        PrintToken::Container(ContainerType::CommonTable, children)
    }

    fn values_tokens(&self, fmt: &mut Formatter<'_>, values: &ValuesQuery) -> PrintToken {
        let mut children = vec![
            PrintToken::Keyword("values".to_string()),
            PrintToken::Break,
        ];
        for (i, tuple) in values.tuples.iter().enumerate() {
            if i > 0 {
                children.push(PrintToken::Comma);
            }
            let mut row = String::new();
            row.push('(');
            for (j, value) in tuple.iter().enumerate() {
                if j > 0 {
                    row.push_str(", ");
                }
                row.push_str(&fmt.format_value(value));
            }
            row.push(')');
            children.push(PrintToken::Container(
                ContainerType::ValuesRow,
                vec![PrintToken::Text(row)],
            ));
        }
        PrintToken::Container(ContainerType::ValuesClause, children)
    }

    fn case_tokens(&self, fmt: &mut Formatter<'_>, case: &CaseExpression) -> PrintToken {
        let mut children = vec![PrintToken::Keyword("case".to_string())];
        if let Some(condition) = &case.condition {
            children.push(PrintToken::Space);
            children.push(PrintToken::Text(fmt.format_value(condition)));
        }

        for branch in &case.switch.branches {
            children.push(PrintToken::Container(
                ContainerType::SwitchCaseArgument,
                vec![
                    PrintToken::Keyword("when".to_string()),
                    PrintToken::Text(format!(" {} ", fmt.format_value(&branch.when))),
                    PrintToken::Keyword("then".to_string()),
                    PrintToken::Text(format!(" {}", fmt.format_value(&branch.then))),
                ],
            ));
        }
        if let Some(else_value) = &case.switch.else_value {
            children.push(PrintToken::Container(
                ContainerType::SwitchCaseArgument,
                vec![
                    PrintToken::Keyword("else".to_string()),
                    PrintToken::Text(format!(" {}", fmt.format_value(else_value))),
                ],
            ));
        }
        children.push(PrintToken::Keyword("end".to_string()));

        PrintToken::Container(ContainerType::CaseExpression, children)
    }

    fn window_expression_tokens(&self, fmt: &mut Formatter<'_>, call: &FunctionCall) -> PrintToken {
        let Some(OverClause::Window(window)) = call.over.as_deref() else {
            let mut text = String::new();
            fmt.write_function_call(&mut text, call);
            return PrintToken::Text(text);
        };

        let mut prefix = String::new();
        let stripped = FunctionCall {
            over: None,
            ..call.clone()
        };
        fmt.write_function_call(&mut prefix, &stripped);
        prefix.push(' ');

        let mut children = vec![
            PrintToken::Text(prefix),
            PrintToken::Keyword("over".to_string()),
            PrintToken::Text("(".to_string()),
        ];

        if !window.partition.is_empty() {
            children.push(PrintToken::Break);
            children.push(PrintToken::Keyword("partition by".to_string()));
            let mut list = String::from(" ");
            for (i, item) in window.partition.iter().enumerate() {
                if i > 0 {
                    list.push_str(", ");
                }
                list.push_str(&fmt.format_value(item));
            }
            children.push(PrintToken::Text(list));
        }
        if let Some(order) = &window.order {
            children.push(PrintToken::Break);
            let mut text = String::new();
            fmt.write_order_by(&mut text, order);
            children.push(PrintToken::Text(text));
        }
        if let Some(frame) = &window.frame {
            children.push(PrintToken::Break);
            let mut text = String::new();
            let spec = WindowFrameClause {
                partition: Vec::new(),
                order: None,
                frame: Some(frame.clone()),
            };
            fmt.write_window_frame(&mut text, &spec);
            children.push(PrintToken::Text(text));
        }

        children.push(PrintToken::Text(")".to_string()));
        PrintToken::Container(ContainerType::WindowExpression, children)
    }

    fn indents(&self, container: ContainerType) -> bool {
        self.style
            .indent_increment_container_types
            .contains(&container)
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
