// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements the pretty-printer walking a print-token tree.

use super::{BreakMode, ContainerType, PrintStyle, PrintToken};

/// Rendering failures. These indicate an internal inconsistency in the
/// print-token tree, not bad user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrintError {
    #[error("no rendering rule left for container {container:?}")]
    ExhaustedContainerRule { container: String },
}

pub struct SqlPrinter<'a> {
    style: &'a PrintStyle,
}

impl<'a> SqlPrinter<'a> {
    pub fn new(style: &'a PrintStyle) -> Self {
        Self { style }
    }

    /// Renders a top-level token sequence; each container starts a line.
    pub fn print(&self, tokens: &[PrintToken]) -> Result<String, PrintError> {
        let mut out = String::new();
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                if self.breaking_enabled() {
                    self.break_line(&mut out, 0);
                } else {
                    out.push(' ');
                }
            }
            self.render_token(token, 0, &mut out)?;
        }
        Ok(out)
    }

    fn render_token(
        &self,
        token: &PrintToken,
        level: usize,
        out: &mut String,
    ) -> Result<(), PrintError> {
        match token {
            PrintToken::Keyword(keyword) => out.push_str(&self.cased(keyword)),
            PrintToken::Text(text) => out.push_str(text),
            PrintToken::Space => out.push(' '),
            PrintToken::Comma => out.push_str(", "),
            PrintToken::Break => out.push(' '),
            PrintToken::BoolOp(op) => {
                out.push(' ');
                out.push_str(&self.cased(op));
                out.push(' ');
            }
            PrintToken::Container(container, children) => {
                self.render_container(*container, children, level, out)?
            }
        }
        Ok(())
    }

    fn render_container(
        &self,
        container: ContainerType,
        children: &[PrintToken],
        level: usize,
        out: &mut String,
    ) -> Result<(), PrintError> {
        match container {
            ContainerType::SubQuery => self.render_subquery(children, level, out),
            ContainerType::CaseExpression => self.render_case(children, level, out),
            ContainerType::WindowExpression => self.render_window(children, level, out),
            _ => self.render_clause(container, children, level, out),
        }
    }

    /// Generic clause rendering: `Break`/`Comma`/`BoolOp` decide the line
    /// structure, everything else flows inline.
    fn render_clause(
        &self,
        container: ContainerType,
        children: &[PrintToken],
        level: usize,
        out: &mut String,
    ) -> Result<(), PrintError> {
        let broken = self.indented(container) && self.breaking_enabled();
        // Child tokens sit one level deeper only when this container
        // actually breaks its body onto new lines.
        let child_level = if broken { level + 1 } else { level };

        for child in children {
            match child {
                PrintToken::Break => {
                    if broken {
                        self.break_line(out, level + 1);
                    } else {
                        out.push(' ');
                    }
                }
                PrintToken::Comma => {
                    if !broken {
                        out.push_str(", ");
                        continue;
                    }
                    match self.style.comma_break {
                        BreakMode::None => out.push_str(", "),
                        BreakMode::Before => {
                            self.break_line(out, level + 1);
                            out.push_str(", ");
                        }
                        BreakMode::After => {
                            out.push(',');
                            self.break_line(out, level + 1);
                        }
                    }
                }
                PrintToken::BoolOp(op) => {
                    if !broken {
                        out.push(' ');
                        out.push_str(&self.cased(op));
                        out.push(' ');
                        continue;
                    }
                    match self.style.and_break {
                        BreakMode::None => {
                            out.push(' ');
                            out.push_str(&self.cased(op));
                            out.push(' ');
                        }
                        BreakMode::Before => {
                            self.break_line(out, level + 1);
                            out.push_str(&self.cased(op));
                            out.push(' ');
                        }
                        BreakMode::After => {
                            out.push(' ');
                            out.push_str(&self.cased(op));
                            self.break_line(out, level + 1);
                        }
                    }
                }
                token => self.render_token(token, child_level, out)?,
            }
        }

        Ok(())
    }

    /// `(` body on its own indented lines `)`.
    fn render_subquery(
        &self,
        children: &[PrintToken],
        level: usize,
        out: &mut String,
    ) -> Result<(), PrintError> {
        if !self.breaking_enabled() {
            out.push('(');
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                self.render_token(child, level, out)?;
            }
            out.push(')');
            return Ok(());
        }

        out.push('(');
        for child in children {
            self.break_line(out, level + 1);
            self.render_token(child, level + 1, out)?;
        }
        self.break_line(out, level);
        out.push(')');
        Ok(())
    }

    /// `case` line, one branch per line, `end` back at case level.
    fn render_case(
        &self,
        children: &[PrintToken],
        level: usize,
        out: &mut String,
    ) -> Result<(), PrintError> {
        for child in children {
            match child {
                PrintToken::Keyword(keyword) if keyword == "end" => {
                    if self.breaking_enabled() {
                        self.break_line(out, level);
                    } else {
                        out.push(' ');
                    }
                    out.push_str(&self.cased(keyword));
                }
                PrintToken::Container(ContainerType::SwitchCaseArgument, branch) => {
                    if self.breaking_enabled() {
                        self.break_line(out, level + 1);
                    } else {
                        out.push(' ');
                    }
                    for token in branch {
                        self.render_token(token, level + 1, out)?;
                    }
                }
                token => self.render_token(token, level, out)?,
            }
        }
        Ok(())
    }

    /// `over(` with partition/order/frame on sub-lines.
    fn render_window(
        &self,
        children: &[PrintToken],
        level: usize,
        out: &mut String,
    ) -> Result<(), PrintError> {
        let last = children.len().saturating_sub(1);
        for (i, child) in children.iter().enumerate() {
            match child {
                PrintToken::Break => {
                    if self.breaking_enabled() {
                        self.break_line(out, level + 1);
                    }
                }
                PrintToken::Text(text) if i == last && text == ")" => {
                    if self.breaking_enabled() {
                        self.break_line(out, level);
                    }
                    out.push(')');
                }
                token => self.render_token(token, level, out)?,
            }
        }
        Ok(())
    }

    fn break_line(&self, out: &mut String, level: usize) {
        out.push_str(&self.style.newline);
        for _ in 0..level * self.style.indent_size {
            out.push(self.style.indent_char);
        }
    }

    fn breaking_enabled(&self) -> bool {
        self.style.comma_break != BreakMode::None || self.style.and_break != BreakMode::None
    }

    fn indented(&self, container: ContainerType) -> bool {
        self.style
            .indent_increment_container_types
            .contains(&container)
    }

    fn cased(&self, keyword: &str) -> String {
        self.style.options.keyword_case.apply(keyword)
    }
}

#[cfg(test)]
mod tests {
    use crate::format::{BreakMode, FormatOptions, KeywordCase, PrintStyle};
    use expect_test::{expect, Expect};

    fn check(sql: &str, style: &PrintStyle, expected: Expect) {
        let query = crate::parse_select(sql).unwrap();
        expected.assert_eq(&crate::print(&query, style).unwrap());
    }

    fn upper_style() -> PrintStyle {
        let mut style = PrintStyle::default();
        style.options = FormatOptions::postgres();
        style.options.keyword_case = KeywordCase::Upper;
        style
    }

    #[test]
    fn test_pretty_select_where() {
        check(
            "select id, name from users where age > 18 and (status = 'active' or type = 'admin')",
            &upper_style(),
            expect![[r#"
                SELECT
                  "id"
                  , "name"
                FROM
                  "users"
                WHERE
                  "age" > 18
                  AND ("status" = 'active' or "type" = 'admin')"#]],
        );
    }

    #[test]
    fn test_pretty_comma_after() {
        let mut style = upper_style();
        style.comma_break = BreakMode::After;
        check(
            "select id, name from users",
            &style,
            expect![[r#"
                SELECT
                  "id",
                  "name"
                FROM
                  "users""#]],
        );
    }

    #[test]
    fn test_pretty_case_branches() {
        check(
            "select case when a > 1 then 'big' else 'small' end from t",
            &upper_style(),
            expect![[r#"
                SELECT
                  CASE
                    WHEN "a" > 1 THEN 'big'
                    ELSE 'small'
                  END
                FROM
                  "t""#]],
        );
    }

    #[test]
    fn test_pretty_cte_and_set_operation() {
        check(
            "with t as (select 1) select * from t union all select 2",
            &upper_style(),
            expect![[r#"
                WITH
                  "t" AS (
                    SELECT
                      1
                  )
                SELECT
                  *
                FROM
                  "t"
                UNION ALL
                SELECT
                  2"#]],
        );
    }

    #[test]
    fn test_pretty_lateral_join() {
        check(
            "select * from users u left join lateral (select 1) t on true",
            &upper_style(),
            expect![[r#"
                SELECT
                  *
                FROM
                  "users" AS "u"
                  LEFT JOIN LATERAL (
                    SELECT
                      1
                  ) AS "t" ON TRUE"#]],
        );
    }

    #[test]
    fn test_single_line_when_breaks_disabled() {
        let mut style = PrintStyle::default();
        style.comma_break = BreakMode::None;
        style.and_break = BreakMode::None;
        check(
            "select id, name from users where a = 1 and b = 2",
            &style,
            expect![[r#"select "id", "name" from "users" where "a" = 1 and "b" = 2"#]],
        );
    }
}
