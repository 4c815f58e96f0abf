// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the common-table collector.

use super::{walk_common_table, Visitor};
use crate::ast::{CommonTable, SelectQuery};

/// Collects every CTE of a query in inner-to-outer order (depth-first
/// post-order); siblings keep their declaration order.
#[derive(Debug, Default)]
pub struct CommonTableCollector {
    tables: Vec<CommonTable>,
}

impl CommonTableCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.tables.clear();
    }

    pub fn collect(&mut self, query: &SelectQuery) -> Vec<CommonTable> {
        self.reset();
        self.visit_select_query(query);
        std::mem::take(&mut self.tables)
    }
}

impl Visitor for CommonTableCollector {
    fn visit_common_table(&mut self, table: &CommonTable) {
        // Body first: inner CTEs land before their enclosing entry.
        walk_common_table(self, table);
        self.tables.push(table.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(sql: &str) -> Vec<String> {
        let query = crate::parse_select(sql).unwrap();
        CommonTableCollector::new()
            .collect(&query)
            .into_iter()
            .map(|table| table.name)
            .collect()
    }

    #[test]
    fn test_sibling_order_preserved() {
        assert_eq!(
            names("with a as (select 1), b as (select 2) select * from a, b"),
            ["a", "b"]
        );
    }

    #[test]
    fn test_inner_ctes_come_first() {
        let sql = "with outer_cte as (with inner_cte as (select 1) select * from inner_cte) \
                   select * from outer_cte";
        assert_eq!(names(sql), ["inner_cte", "outer_cte"]);
    }

    #[test]
    fn test_subquery_ctes_collected() {
        let sql = "select * from (with sub as (select 1) select * from sub) s";
        assert_eq!(names(sql), ["sub"]);
    }
}
