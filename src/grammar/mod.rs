// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements grammar parsing of the lexeme stream, one module per
//! grammatical family.

mod case;
mod clauses;
mod cte;
mod datatype;
mod dml;
mod expressions;
mod from;
mod function_invocation;
mod query;
mod select;
mod values;
mod window;

pub(crate) use case::parse_case;
pub(crate) use clauses::{
    parse_for_clause, parse_group_by_clause, parse_having_clause, parse_limit_clause,
    parse_offset_clause, parse_order_by_clause, parse_where_clause,
};
pub(crate) use cte::{parse_common_table, parse_with_clause};
pub(crate) use datatype::parse_type_name;
pub(crate) use dml::{parse_insert_statement, parse_update_statement};
pub(crate) use expressions::parse_expr;
pub(crate) use from::{parse_from_clause, parse_source};
pub(crate) use function_invocation::{parse_function_call, parse_function_invocation};
pub(crate) use query::{is_query_start, parse_select_query, parse_select_statement};
pub(crate) use select::{parse_select_clause, parse_select_items};
pub(crate) use values::parse_values_query;
pub(crate) use window::{parse_window_clause, parse_window_frame};

pub use query::CancelFlag;
#[cfg(feature = "async")]
pub(crate) use query::parse_select_statement_async;

#[cfg(test)]
pub(crate) mod tests {
    use crate::format::{FormatOptions, Formatter};
    use expect_test::Expect;

    /// Parses a whole statement and compares its compact postgres-preset
    /// rendition against the expected output.
    pub(crate) fn check(input: &str, expected: Expect) {
        let query = crate::parse_select(input).unwrap();
        expected.assert_eq(&crate::format(&query, &FormatOptions::postgres()));
    }

    /// Same, for a single value expression.
    pub(crate) fn check_expr(input: &str, expected: Expect) {
        let value = crate::parse_expression(input).unwrap();
        let options = FormatOptions::postgres();
        expected.assert_eq(&Formatter::new(&options).format_value(&value));
    }
}
