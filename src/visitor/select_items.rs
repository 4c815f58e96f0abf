// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the select-item collector.

use crate::ast::{SelectItem, SelectQuery};

/// Returns a query's select list; for set operations that is the left-most
/// operand's list, for bare `values` there is none.
#[derive(Debug, Default)]
pub struct SelectItemCollector {
    items: Vec<SelectItem>,
}

impl SelectItemCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.items.clear();
    }

    pub fn collect(&mut self, query: &SelectQuery) -> Vec<SelectItem> {
        self.reset();
        self.push_leftmost(query);
        std::mem::take(&mut self.items)
    }

    fn push_leftmost(&mut self, query: &SelectQuery) {
        match query {
            SelectQuery::Simple(simple) => self.items.extend(simple.select.items.iter().cloned()),
            SelectQuery::Binary(binary) => self.push_leftmost(&binary.left),
            SelectQuery::Values(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collect_plain_select() {
        let query = crate::parse_select("select id, name n from t").unwrap();
        let items = SelectItemCollector::new().collect(&query);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].alias.as_deref(), Some("n"));
    }

    #[test]
    fn test_binary_query_returns_left_list() {
        let query =
            crate::parse_select("select a, b from t union all select c, d from u").unwrap();
        let items = SelectItemCollector::new().collect(&query);
        let rendered: Vec<String> = items
            .iter()
            .map(|item| match &item.value {
                crate::ast::Value::Column(column) => column.column.clone(),
                other => panic!("unexpected item {other:?}"),
            })
            .collect();
        assert_eq!(rendered, ["a", "b"]);
    }

    #[test]
    fn test_values_has_no_items() {
        let query = crate::parse_select("values (1, 2)").unwrap();
        assert!(SelectItemCollector::new().collect(&query).is_empty());
    }
}
