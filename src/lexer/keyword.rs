// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the classification tables for bare words.
//!
//! The raw scanner reports every unquoted word as an identifier; this module
//! decides which of those are clause commands, reserved keywords, keyword
//! operators, literals or type-literal heads. Anything unlisted stays an
//! identifier. This is deliberately not a reserved-word list: classification
//! never rejects input, it only tags it.

use lazy_static::lazy_static;
use std::collections::HashSet;

/// How a bare word maps onto the lexeme kind set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum WordClass {
    Command,
    Keyword,
    Operator,
    Literal,
    Type,
}

lazy_static! {
    static ref COMMANDS: HashSet<&'static str> = [
        "select", "from", "where", "having", "window", "limit", "offset",
        "with", "values", "union", "intersect", "except", "insert", "into",
        "update", "set", "returning", "for",
    ]
    .into_iter()
    .collect();

    static ref KEYWORDS: HashSet<&'static str> = [
        "as", "distinct", "on", "using", "join", "inner", "left", "right",
        "full", "outer", "cross", "natural", "lateral", "case", "when",
        "then", "else", "end", "asc", "desc", "nulls", "first", "last",
        "recursive", "materialized", "all", "any", "over", "filter", "rows",
        "range", "groups", "preceding", "following", "unbounded", "current",
        "row", "grouping", "sets", "cube", "rollup", "exists", "array",
        "escape", "similar", "leading", "trailing", "both", "share", "key",
        "no", "by",
    ]
    .into_iter()
    .collect();

    static ref OPERATOR_KEYWORDS: HashSet<&'static str> =
        ["and", "or", "not", "is", "in", "like", "ilike", "between"]
            .into_iter()
            .collect();

    static ref LITERAL_KEYWORDS: HashSet<&'static str> =
        ["true", "false", "null"].into_iter().collect();

    static ref TYPE_KEYWORDS: HashSet<&'static str> =
        ["interval", "date", "time", "timestamp"].into_iter().collect();

    /// Words tagged as `Function` when they directly precede `(`.
    static ref FUNCTION_NAMES: HashSet<&'static str> = [
        "count", "sum", "avg", "min", "max", "substring", "trim",
        "position", "extract", "cast", "upper", "lower", "coalesce",
        "nullif", "greatest", "least", "abs", "round", "floor", "ceil",
        "ceiling", "length", "char_length", "concat", "now", "row_number",
        "rank", "dense_rank", "ntile", "lag", "lead", "first_value",
        "last_value", "nth_value", "array_agg", "string_agg", "json_agg",
        "to_char", "to_date", "to_number", "date_trunc", "generate_series",
    ]
    .into_iter()
    .collect();
}

pub(crate) fn classify(word: &str) -> Option<WordClass> {
    if COMMANDS.contains(word) {
        Some(WordClass::Command)
    } else if OPERATOR_KEYWORDS.contains(word) {
        Some(WordClass::Operator)
    } else if LITERAL_KEYWORDS.contains(word) {
        Some(WordClass::Literal)
    } else if TYPE_KEYWORDS.contains(word) {
        Some(WordClass::Type)
    } else if KEYWORDS.contains(word) {
        Some(WordClass::Keyword)
    } else {
        None
    }
}

pub(crate) fn is_function_name(word: &str) -> bool {
    FUNCTION_NAMES.contains(word)
}
