// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the parameter-predicate rewriter.

use super::Visitor;
use crate::ast::*;

/// Returns a copy of `query` with every predicate that references a bind
/// parameter removed.
///
/// `and`/`or` chains keep their parameter-free side; a `where`/`having`
/// that prunes to nothing disappears. Parentheses survive only around
/// still-compound survivors. The rewrite recurses into CTE bodies,
/// subqueries and set-operation branches and is idempotent.
pub fn remove_parameter_predicates(query: &SelectQuery) -> SelectQuery {
    rewrite_query(query)
}

fn rewrite_query(query: &SelectQuery) -> SelectQuery {
    match query {
        SelectQuery::Simple(simple) => SelectQuery::Simple(Box::new(rewrite_simple(simple))),
        SelectQuery::Binary(binary) => SelectQuery::Binary(Box::new(BinarySelectQuery {
            op: binary.op,
            left: rewrite_query(&binary.left),
            right: rewrite_query(&binary.right),
        })),
        SelectQuery::Values(values) => SelectQuery::Values(rewrite_values(values)),
    }
}

fn rewrite_simple(query: &SimpleSelectQuery) -> SimpleSelectQuery {
    SimpleSelectQuery {
        with: query.with.as_ref().map(|with| WithClause {
            recursive: with.recursive,
            tables: with
                .tables
                .iter()
                .map(|table| CommonTable {
                    query: Box::new(rewrite_query(&table.query)),
                    ..table.clone()
                })
                .collect(),
        }),
        select: SelectClause {
            distinct: query.select.distinct.clone(),
            items: query
                .select
                .items
                .iter()
                .map(|item| SelectItem {
                    value: rewrite_value(&item.value),
                    alias: item.alias.clone(),
                })
                .collect(),
        },
        from: query.from.as_ref().map(|from| FromClause {
            source: rewrite_source(&from.source),
            joins: from
                .joins
                .iter()
                .map(|join| JoinItem {
                    source: rewrite_source(&join.source),
                    constraint: match &join.constraint {
                        JoinConstraint::On(predicate) => {
                            JoinConstraint::On(rewrite_value(predicate))
                        }
                        other => other.clone(),
                    },
                    ..join.clone()
                })
                .collect(),
        }),
        where_clause: query
            .where_clause
            .as_ref()
            .and_then(|clause| prune_predicate(&clause.predicate))
            .map(|predicate| WhereClause { predicate }),
        group_by: query.group_by.clone(),
        having: query
            .having
            .as_ref()
            .and_then(|clause| prune_predicate(&clause.predicate))
            .map(|predicate| HavingClause { predicate }),
        window: query.window.clone(),
        order_by: query.order_by.clone(),
        limit: query.limit.clone(),
        offset: query.offset.clone(),
        for_clause: query.for_clause.clone(),
    }
}

fn rewrite_values(values: &ValuesQuery) -> ValuesQuery {
    ValuesQuery {
        tuples: values
            .tuples
            .iter()
            .map(|tuple| tuple.iter().map(rewrite_value).collect())
            .collect(),
    }
}

fn rewrite_source(source: &SourceExpression) -> SourceExpression {
    let kind = match &source.kind {
        SourceKind::SubQuery(query) => SourceKind::SubQuery(Box::new(rewrite_query(query))),
        SourceKind::Values(values) => SourceKind::Values(rewrite_values(values)),
        SourceKind::Paren(inner) => SourceKind::Paren(Box::new(rewrite_source(inner))),
        other => other.clone(),
    };
    SourceExpression {
        kind,
        alias: source.alias.clone(),
    }
}

/// Rebuilds a value, rewriting any embedded subquery.
fn rewrite_value(value: &Value) -> Value {
    match value {
        Value::Query(subquery) => Value::Query(QueryExpression {
            query: Box::new(rewrite_query(&subquery.query)),
        }),
        Value::Paren(paren) => Value::Paren(ParenExpression {
            inner: Box::new(rewrite_value(&paren.inner)),
        }),
        Value::Unary(unary) => Value::Unary(UnaryExpression {
            op: unary.op.clone(),
            operand: Box::new(rewrite_value(&unary.operand)),
        }),
        Value::Binary(binary) => Value::Binary(BinaryExpression {
            left: Box::new(rewrite_value(&binary.left)),
            op: binary.op.clone(),
            right: Box::new(rewrite_value(&binary.right)),
        }),
        other => other.clone(),
    }
}

fn prune_predicate(predicate: &Value) -> Option<Value> {
    match predicate {
        Value::Binary(binary) if predicate.is_boolean_chain() => {
            let left = prune_predicate(&binary.left);
            let right = prune_predicate(&binary.right);
            match (left, right) {
                (Some(left), Some(right)) => Some(Value::Binary(BinaryExpression {
                    left: Box::new(left),
                    op: binary.op.clone(),
                    right: Box::new(right),
                })),
                (Some(survivor), None) | (None, Some(survivor)) => Some(survivor),
                (None, None) => None,
            }
        }
        Value::Paren(paren) => prune_predicate(&paren.inner).map(|inner| {
            if inner.is_boolean_chain() {
                Value::Paren(ParenExpression {
                    inner: Box::new(inner),
                })
            } else {
                inner
            }
        }),
        other => {
            if contains_parameter(other) {
                None
            } else {
                Some(rewrite_value(other))
            }
        }
    }
}

fn contains_parameter(value: &Value) -> bool {
    let mut finder = ParameterFinder { found: false };
    finder.visit_value(value);
    finder.found
}

struct ParameterFinder {
    found: bool,
}

impl Visitor for ParameterFinder {
    fn visit_value(&mut self, value: &Value) {
        if let Value::Parameter(_) = value {
            self.found = true;
        }
        if !self.found {
            super::walk_value(self, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatOptions;
    use pretty_assertions::assert_eq;

    fn cleaned(sql: &str) -> String {
        let query = crate::parse_select(sql).unwrap();
        crate::format(
            &remove_parameter_predicates(&query),
            &FormatOptions::postgres(),
        )
    }

    #[test]
    fn test_where_with_only_parameter_disappears() {
        assert_eq!(
            cleaned("select id from users where id = :id"),
            r#"select "id" from "users""#
        );
    }

    #[test]
    fn test_parameter_free_side_survives() {
        assert_eq!(
            cleaned("select id from users where active = true and id = :id"),
            r#"select "id" from "users" where "active" = true"#
        );
        assert_eq!(
            cleaned("select id from users where id = :id or deleted = false"),
            r#"select "id" from "users" where "deleted" = false"#
        );
    }

    #[test]
    fn test_parens_kept_around_compound_survivors() {
        assert_eq!(
            cleaned("select id from t where (a = 1 or b = 2) and c = :c"),
            r#"select "id" from "t" where ("a" = 1 or "b" = 2)"#
        );
        assert_eq!(
            cleaned("select id from t where (a = 1 or b = :b) and c = 2"),
            r#"select "id" from "t" where "a" = 1 and "c" = 2"#
        );
    }

    #[test]
    fn test_having_and_subqueries_pruned() {
        assert_eq!(
            cleaned(
                "with c as (select x from t where x > :min) \
                 select id from c group by id having count(*) > :n"
            ),
            r#"with "c" as (select "x" from "t") select "id" from "c" group by "id""#
        );
    }

    #[test]
    fn test_idempotent_and_parameter_free() {
        let sql = "select id from t where a = :a and (b = 1 or c = :c)";
        let query = crate::parse_select(sql).unwrap();
        let once = remove_parameter_predicates(&query);
        let twice = remove_parameter_predicates(&once);
        assert_eq!(once, twice);
        assert_eq!(
            crate::format(&once, &FormatOptions::postgres()),
            r#"select "id" from "t" where "b" = 1"#
        );
    }
}
