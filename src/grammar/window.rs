// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Implements parsing of window bodies: the shared `over (…)` form and the
//! query-level `window` clause with its frame specifications.

use crate::ast::{
    FrameBound, FrameKind, FrameSpec, NamedWindow, WindowClause, WindowFrameClause,
};
use crate::grammar::{parse_expr, parse_order_by_clause};
use crate::lexer::LexemeKind;
use crate::parser::{ParseError, Parser};

/// Parses the body of a window definition, cursor past the opening `(`.
pub(crate) fn parse_window_frame(p: &mut Parser) -> Result<WindowFrameClause, ParseError> {
    let mut partition = Vec::new();
    if p.eat_command("partition by") {
        loop {
            partition.push(parse_expr(p)?);
            if !p.eat(LexemeKind::Comma) {
                break;
            }
        }
    }

    let order = if p.at_command("order by") {
        Some(parse_order_by_clause(p)?)
    } else {
        None
    };

    let frame = if p.at_keyword("rows") || p.at_keyword("range") || p.at_keyword("groups") {
        Some(parse_frame_spec(p)?)
    } else {
        None
    };

    Ok(WindowFrameClause {
        partition,
        order,
        frame,
    })
}

/// The query-level clause: `window w as (…), v as (…)`.
pub(crate) fn parse_window_clause(p: &mut Parser) -> Result<WindowClause, ParseError> {
    p.expect_command("window")?;

    let mut windows = Vec::new();
    loop {
        let name = p.expect_identifier()?;
        p.expect_keyword("as")?;
        p.expect(LexemeKind::OpenParen, "\"(\"")?;
        let window = parse_window_frame(p)?;
        p.expect(LexemeKind::CloseParen, "\")\"")?;
        windows.push(NamedWindow { name, window });

        if !p.eat(LexemeKind::Comma) {
            break;
        }
    }

    Ok(WindowClause { windows })
}

fn parse_frame_spec(p: &mut Parser) -> Result<FrameSpec, ParseError> {
    let kind = if p.eat_keyword("rows") {
        FrameKind::Rows
    } else if p.eat_keyword("range") {
        FrameKind::Range
    } else {
        p.expect_keyword("groups")?;
        FrameKind::Groups
    };

    if p.eat_operator("between") {
        let start = parse_frame_bound(p)?;
        p.expect_operator("and")?;
        let end = parse_frame_bound(p)?;
        Ok(FrameSpec {
            kind,
            start,
            end: Some(end),
        })
    } else {
        let start = parse_frame_bound(p)?;
        Ok(FrameSpec {
            kind,
            start,
            end: None,
        })
    }
}

fn parse_frame_bound(p: &mut Parser) -> Result<FrameBound, ParseError> {
    if p.eat_keyword("unbounded") {
        if p.eat_keyword("preceding") {
            return Ok(FrameBound::UnboundedPreceding);
        }
        if p.eat_keyword("following") {
            return Ok(FrameBound::UnboundedFollowing);
        }
        return Err(frame_error(p));
    }

    if p.eat_keyword("current") {
        if p.eat_keyword("row") {
            return Ok(FrameBound::CurrentRow);
        }
        return Err(frame_error(p));
    }

    let offset = parse_expr(p)?;
    if p.eat_keyword("preceding") {
        Ok(FrameBound::Preceding(offset))
    } else if p.eat_keyword("following") {
        Ok(FrameBound::Following(offset))
    } else {
        Err(frame_error(p))
    }
}

fn frame_error(p: &Parser) -> ParseError {
    ParseError::UnknownFrameBoundary {
        found: p.current().text.clone(),
        at: p.current().offset(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::tests::check;
    use expect_test::expect;

    #[test]
    fn test_parse_window_clause() {
        check(
            "select count(*) over w from m window w as (order by id rows between 2 preceding and 2 following)",
            expect![[
                r#"select count(*) over "w" from "m" window "w" as (order by "id" rows between 2 preceding and 2 following)"#
            ]],
        );
    }

    #[test]
    fn test_parse_frame_variants() {
        check(
            "select sum(x) over (order by t range unbounded preceding) from s",
            expect![[
                r#"select sum("x") over(order by "t" range unbounded preceding) from "s""#
            ]],
        );
        check(
            "select sum(x) over (groups between current row and unbounded following) from s",
            expect![[
                r#"select sum("x") over(groups between current row and unbounded following) from "s""#
            ]],
        );
    }

    #[test]
    fn test_unknown_frame_boundary() {
        let mut p = crate::parser::Parser::new("rows between 2 sideways and current row").unwrap();
        assert_eq!(
            parse_frame_spec(&mut p),
            Err(ParseError::UnknownFrameBoundary {
                found: "sideways".to_string(),
                at: 15,
            })
        );
    }
}
