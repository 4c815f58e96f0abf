// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the table-source collector.

use indexmap::IndexSet;
use std::collections::HashSet;

use super::{walk_source_expression, CommonTableCollector, Visitor};
use crate::ast::{SelectQuery, SourceExpression, SourceKind, TableRef};

/// Collects the tables a query reads from, first occurrence first,
/// deduplicated on namespace + name.
///
/// With `selectable_only` set, only the top-level `from`/`join` targets are
/// recorded; names referring to CTEs are kept. Without it, the collector
/// descends into subqueries and CTE bodies and drops every CTE-declared
/// name from the result.
#[derive(Debug, Default)]
pub struct TableSourceCollector {
    selectable_only: bool,
    cte_names: HashSet<String>,
    tables: IndexSet<TableRef>,
}

impl TableSourceCollector {
    pub fn new(selectable_only: bool) -> Self {
        Self {
            selectable_only,
            cte_names: HashSet::new(),
            tables: IndexSet::new(),
        }
    }

    pub fn reset(&mut self) {
        self.cte_names.clear();
        self.tables.clear();
    }

    pub fn collect(&mut self, query: &SelectQuery) -> Vec<TableRef> {
        self.reset();

        if self.selectable_only {
            self.collect_top_level(query);
        } else {
            let mut ctes = CommonTableCollector::new();
            for table in ctes.collect(query) {
                self.cte_names.insert(table.name);
            }
            self.visit_select_query(query);
        }

        self.tables.iter().cloned().collect()
    }

    fn collect_top_level(&mut self, query: &SelectQuery) {
        match query {
            SelectQuery::Simple(simple) => {
                if let Some(from) = &simple.from {
                    self.record_direct(&from.source);
                    for join in &from.joins {
                        self.record_direct(&join.source);
                    }
                }
            }
            SelectQuery::Binary(binary) => {
                self.collect_top_level(&binary.left);
                self.collect_top_level(&binary.right);
            }
            SelectQuery::Values(_) => {}
        }
    }

    fn record_direct(&mut self, source: &SourceExpression) {
        match &source.kind {
            SourceKind::Table(table) => {
                self.tables.insert(table.clone());
            }
            SourceKind::Paren(inner) => self.record_direct(inner),
            SourceKind::SubQuery(_) | SourceKind::Function(_) | SourceKind::Values(_) => {}
        }
    }
}

impl Visitor for TableSourceCollector {
    fn visit_source_expression(&mut self, source: &SourceExpression) {
        if let SourceKind::Table(table) = &source.kind {
            let is_cte = table.namespaces.is_empty() && self.cte_names.contains(&table.name);
            if !is_cte {
                self.tables.insert(table.clone());
            }
        }
        walk_source_expression(self, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(tables: &[TableRef]) -> Vec<String> {
        tables
            .iter()
            .map(|t| {
                let mut parts = t.namespaces.clone();
                parts.push(t.name.clone());
                parts.join(".")
            })
            .collect()
    }

    #[test]
    fn test_collect_simple_tables() {
        let query =
            crate::parse_select("select * from users u join orders o on o.uid = u.id").unwrap();
        let mut collector = TableSourceCollector::new(false);
        assert_eq!(names(&collector.collect(&query)), ["users", "orders"]);
    }

    #[test]
    fn test_duplicates_removed() {
        let query = crate::parse_select("select * from t join t on true").unwrap();
        let mut collector = TableSourceCollector::new(false);
        assert_eq!(names(&collector.collect(&query)), ["t"]);
    }

    #[test]
    fn test_selectable_only_keeps_cte_names_out_of_bodies() {
        let sql =
            "with c as (select * from inner_table) select * from c join other on true";
        let query = crate::parse_select(sql).unwrap();

        let mut selectable = TableSourceCollector::new(true);
        assert_eq!(names(&selectable.collect(&query)), ["c", "other"]);

        let mut full = TableSourceCollector::new(false);
        assert_eq!(names(&full.collect(&query)), ["inner_table", "other"]);
    }

    #[test]
    fn test_full_scan_descends_into_subqueries() {
        let sql = "select * from (select * from deep) d where exists (select 1 from deeper)";
        let query = crate::parse_select(sql).unwrap();

        let mut selectable = TableSourceCollector::new(true);
        assert_eq!(names(&selectable.collect(&query)), Vec::<String>::new());

        let mut full = TableSourceCollector::new(false);
        assert_eq!(names(&full.collect(&query)), ["deep", "deeper"]);
    }

    #[test]
    fn test_schema_qualified_names_distinct() {
        let query = crate::parse_select("select * from a.t join b.t on true").unwrap();
        let mut collector = TableSourceCollector::new(false);
        assert_eq!(names(&collector.collect(&query)), ["a.t", "b.t"]);
    }
}
