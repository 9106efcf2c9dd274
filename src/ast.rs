//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! Query AST (component D) and its projection from `sqlparser`'s general
//! grammar.
//!
//! The lexer/parser itself is an external collaborator (§1) — we only
//! specify the AST it must yield. `sqlparser` (the teacher's SQL
//! front-end dependency) tokenizes and parses full ANSI `SELECT`
//! statements; `from_ast` below rejects anything outside the restricted
//! grammar in §6 (`SELECT a,… FROM t,… WHERE … ;`, equality predicates
//! joined by AND) with a semantic error naming the unsupported construct.

use sqlparser::ast::{BinaryOperator, Expr, SelectItem, SetExpr, Statement, TableFactor, Value as SqlValue};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser as SqlParser;

use crate::error::{ParseError, SemanticError};

/// The right-hand side of an equality predicate.
#[derive(Debug, Clone)]
pub enum RhsKind {
    IntConstant(i64),
    FloatConstant(f64),
    StringConstant(String),
    ColumnRef(String),
}

#[derive(Debug, Clone)]
pub struct Predicate {
    pub lhs: String,
    pub rhs: RhsKind,
}

/// `select_list`, `from_list`, `where_list`, each an ordered sequence
/// (§3, §4.4).
#[derive(Debug, Clone)]
pub struct Query {
    pub select_list: Vec<String>,
    pub from_list: Vec<String>,
    pub where_list: Vec<Predicate>,
}

/// Parse one query (or the exit command) from a line of input.
pub fn parse_line(line: &str) -> Result<ParsedLine, ParseError> {
    let trimmed = line.trim();
    if trimmed == "exit;" {
        return Ok(ParsedLine::Exit);
    }
    Ok(ParsedLine::Query(parse_query(trimmed)?))
}

pub enum ParsedLine {
    Exit,
    Query(Query),
}

/// Parse `SELECT ... FROM ... [WHERE ...] ;` into our restricted AST.
pub fn parse_query(sql: &str) -> Result<Query, ParseError> {
    let dialect = GenericDialect {};
    let statements = SqlParser::parse_sql(&dialect, sql).map_err(|e| ParseError {
        message: e.to_string(),
        location: None,
    })?;
    if statements.len() != 1 {
        return Err(ParseError {
            message: "expected exactly one statement".to_string(),
            location: None,
        });
    }
    let query = match &statements[0] {
        Statement::Query(q) => q,
        other => {
            return Err(ParseError {
                message: format!("expected a SELECT statement, found {other}"),
                location: None,
            })
        }
    };
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        other => {
            return Err(ParseError {
                message: format!("unsupported query body: {other}"),
                location: None,
            })
        }
    };

    let mut select_list = Vec::new();
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(Expr::Identifier(ident)) => {
                select_list.push(ident.value.clone())
            }
            other => {
                return Err(ParseError {
                    message: format!("unsupported select item: {other}"),
                    location: None,
                })
            }
        }
    }

    let mut from_list = Vec::new();
    for twj in &select.from {
        match &twj.relation {
            TableFactor::Table { name, .. } => {
                from_list.push(name.to_string());
            }
            other => {
                return Err(ParseError {
                    message: format!("unsupported from item: {other}"),
                    location: None,
                })
            }
        }
        if !twj.joins.is_empty() {
            return Err(ParseError {
                message: "explicit JOIN syntax is not supported, use a comma FROM list".into(),
                location: None,
            });
        }
    }

    let mut where_list = Vec::new();
    if let Some(expr) = &select.selection {
        flatten_and(expr, &mut where_list)?;
    }

    Ok(Query {
        select_list,
        from_list,
        where_list,
    })
}

/// Split a conjunction of equalities into `where_list` (§3: only
/// equality predicates joined by AND are supported).
fn flatten_and(expr: &Expr, out: &mut Vec<Predicate>) -> Result<(), ParseError> {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            flatten_and(left, out)?;
            flatten_and(right, out)?;
            Ok(())
        }
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } => {
            let lhs = match left.as_ref() {
                Expr::Identifier(ident) => ident.value.clone(),
                other => {
                    return Err(ParseError {
                        message: format!("unsupported predicate left-hand side: {other}"),
                        location: None,
                    })
                }
            };
            let rhs = match right.as_ref() {
                Expr::Identifier(ident) => RhsKind::ColumnRef(ident.value.clone()),
                Expr::Value(SqlValue::Number(n, _)) => {
                    if let Ok(i) = n.parse::<i64>() {
                        RhsKind::IntConstant(i)
                    } else {
                        RhsKind::FloatConstant(n.parse::<f64>().map_err(|_| ParseError {
                            message: format!("invalid numeric literal: {n}"),
                            location: None,
                        })?)
                    }
                }
                Expr::Value(SqlValue::SingleQuotedString(s)) => RhsKind::StringConstant(s.clone()),
                other => {
                    return Err(ParseError {
                        message: format!("unsupported predicate right-hand side: {other}"),
                        location: None,
                    })
                }
            };
            out.push(Predicate { lhs, rhs });
            Ok(())
        }
        other => Err(ParseError {
            message: format!(
                "only equality predicates joined by AND are supported, found: {other}"
            ),
            location: None,
        }),
    }
}

/// Convenience wrapper turning a parse error into the semantic-error
/// domain when the AST is already in hand but a later pass rejects it.
pub fn unsupported(what: impl Into<String>) -> SemanticError {
    SemanticError(format!("unsupported construct: {}", what.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scan_only_query() {
        let q = parse_query("SELECT c_id FROM customer;").unwrap();
        assert_eq!(q.select_list, vec!["c_id"]);
        assert_eq!(q.from_list, vec!["customer"]);
        assert!(q.where_list.is_empty());
    }

    #[test]
    fn parses_pushdown_predicates() {
        let q = parse_query(
            "SELECT c_first FROM customer WHERE c_id = 1 AND c_d_id = 1 AND c_w_id = 1;",
        )
        .unwrap();
        assert_eq!(q.where_list.len(), 3);
        assert!(matches!(q.where_list[0].rhs, RhsKind::IntConstant(1)));
    }

    #[test]
    fn parses_join_predicates() {
        let q = parse_query(
            "SELECT o_all_local FROM order, orderline WHERE o_w_id = ol_w_id AND o_d_id = ol_d_id AND o_id = ol_o_id;",
        )
        .unwrap();
        assert_eq!(q.from_list, vec!["order", "orderline"]);
        assert!(matches!(&q.where_list[0].rhs, RhsKind::ColumnRef(c) if c == "ol_w_id"));
    }

    #[test]
    fn exit_command_recognized() {
        assert!(matches!(parse_line("exit;").unwrap(), ParsedLine::Exit));
    }

    #[test]
    fn rejects_or_predicates() {
        let err = parse_query("SELECT a FROM t WHERE a = 1 OR a = 2;");
        assert!(err.is_err());
    }
}
