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

//! Semantic analyzer (component E): turns a [`Query`] plus the live
//! schema into an operator tree (§4.4).
//!
//! Five steps, run in order:
//! 1. instantiate one `TableScan` per `from_list` entry;
//! 2. partition `where_list` into pushdown predicates (constant
//!    right-hand side) and join predicates (column-ref right-hand side);
//! 3. push each pushdown predicate onto the scan that produces its
//!    column, wrapping it in a `Selection`;
//! 4. greedily merge join predicates that reference the same pair of
//!    subtrees into one `InnerJoin`, repeating until a single tree
//!    remains — a query that still needs more than one root after this
//!    would require a cross product, which is rejected;
//! 5. wrap the root in `Print` over the resolved `select_list` columns.

use std::collections::BTreeMap;

use crate::algebra::{Expr, Operator, ScanColumn};
use crate::ast::{Query, RhsKind};
use crate::error::SemanticError;
use crate::iu::{IuArena, IuId};
use crate::storage::Database;

/// Build the plan for one query against `db`. Errors name the
/// unresolved relation/column, the cross-product case, or a degenerate
/// self-join, matching §4.4's three semantic-error cases.
///
/// `column_index` below plays the role of `getIUProducer` walking
/// `CollectIUs()` over the working operator set: since column names are
/// unique across the FROM list (§4.4), it's built once up front instead
/// of being re-searched for every predicate.
pub fn analyze(arena: &mut IuArena, db: &Database, query: &Query) -> Result<Operator, SemanticError> {
    // Step 1: one TableScan per FROM entry, with every declared column of
    // that relation materialized as a fresh IU.
    let mut operators: Vec<Operator> = Vec::with_capacity(query.from_list.len());
    // Maps a globally-unique column name to (operator index, IU) so later
    // steps resolve predicates without re-walking CollectIUs() each time
    // (§4.4 assumes column names are unique across the FROM list).
    let mut column_index: BTreeMap<String, (usize, IuId)> = BTreeMap::new();

    for relation in &query.from_list {
        let rel = db
            .relation(relation)
            .ok_or_else(|| SemanticError(format!("unknown relation '{relation}'")))?;
        let mut columns = Vec::with_capacity(rel.schema.columns.len());
        for (storage_index, (name, ty)) in rel.schema.columns.iter().enumerate() {
            let iu = arena.fresh_table_column(relation, name, *ty);
            columns.push(ScanColumn { iu, storage_index });
            if column_index.insert(name.clone(), (operators.len(), iu)).is_some() {
                return Err(SemanticError(format!(
                    "column '{name}' is ambiguous across the FROM list"
                )));
            }
        }
        operators.push(Operator::table_scan(relation.clone(), columns));
    }

    // Step 2: partition WHERE into pushdown vs. join predicates.
    let mut pushdown = Vec::new();
    let mut join_cond: Vec<(IuId, IuId, usize, usize)> = Vec::new();
    for pred in &query.where_list {
        let (lhs_idx, lhs_iu) = *column_index
            .get(&pred.lhs)
            .ok_or_else(|| SemanticError(format!("unknown column '{}'", pred.lhs)))?;
        match &pred.rhs {
            RhsKind::ColumnRef(rhs_col) => {
                let (rhs_idx, rhs_iu) = *column_index
                    .get(rhs_col)
                    .ok_or_else(|| SemanticError(format!("unknown column '{rhs_col}'")))?;
                if lhs_idx == rhs_idx {
                    return Err(SemanticError(format!(
                        "column equality predicate '{} = {}' references the same relation twice (self-join)",
                        pred.lhs, rhs_col
                    )));
                }
                join_cond.push((lhs_iu, rhs_iu, lhs_idx, rhs_idx));
            }
            _ => pushdown.push((lhs_idx, lhs_iu, pred)),
        }
    }

    // Step 3: wrap each scan producing a pushdown predicate's column in a
    // Selection. Several predicates on one scan chain into nested
    // Selections, each re-checked against the IU the innermost scan
    // already carries.
    for (idx, iu, pred) in pushdown {
        let ty = arena.get(iu).ty;
        let value = match &pred.rhs {
            RhsKind::IntConstant(n) => crate::types::Value::cast_from_text(ty, &n.to_string())
                .map_err(|e| SemanticError(format!("predicate on '{}': {e}", pred.lhs)))?,
            RhsKind::FloatConstant(f) => crate::types::Value::cast_from_text(ty, &f.to_string())
                .map_err(|e| SemanticError(format!("predicate on '{}': {e}", pred.lhs)))?,
            RhsKind::StringConstant(s) => crate::types::Value::cast_from_text(ty, s)
                .map_err(|e| SemanticError(format!("predicate on '{}': {e}", pred.lhs)))?,
            RhsKind::ColumnRef(_) => unreachable!("column-ref predicates were routed to join_cond"),
        };
        let lit_iu = arena.fresh_anonymous("lit", ty);
        let cmp_iu = arena.fresh_anonymous("cmp", crate::types::LogicalType::Bool);
        let predicate = Expr::Equals {
            produced: cmp_iu,
            lhs: Box::new(Expr::IuRef(iu)),
            rhs: Box::new(Expr::Constant { produced: lit_iu, value }),
        };
        let scan = std::mem::replace(&mut operators[idx], Operator::table_scan("", Vec::new()));
        operators[idx] = Operator::selection(scan, predicate);
    }

    // Step 4: greedily merge join predicates referencing the same pair of
    // subtrees into a single InnerJoin, repeating until one root remains.
    let mut join_id = 0usize;
    while let Some((l_iu, r_iu, mut idx_l, mut idx_r)) = join_cond.pop() {
        let mut pairs = vec![(l_iu, r_iu)];
        join_cond.retain(|&(ol, or, oidx_l, oidx_r)| {
            if oidx_l == idx_l && oidx_r == idx_r {
                pairs.push((ol, or));
                false
            } else if oidx_l == idx_r && oidx_r == idx_l {
                pairs.push((or, ol));
                false
            } else {
                true
            }
        });
        if idx_l > idx_r {
            std::mem::swap(&mut idx_l, &mut idx_r);
            for p in &mut pairs {
                *p = (p.1, p.0);
            }
        }
        let right = operators.remove(idx_r);
        let left = std::mem::replace(&mut operators[idx_l], Operator::table_scan("", Vec::new()));
        operators[idx_l] = Operator::inner_join(left, right, pairs, join_id);
        join_id += 1;
        // Every remaining join_cond entry that referenced the merged-away
        // slot now refers to the merged subtree at idx_l instead, and every
        // index that pointed past the removed slot shifts down by one.
        for entry in join_cond.iter_mut() {
            if entry.2 == idx_r {
                entry.2 = idx_l;
            } else if entry.2 > idx_r {
                entry.2 -= 1;
            }
            if entry.3 == idx_r {
                entry.3 = idx_l;
            } else if entry.3 > idx_r {
                entry.3 -= 1;
            }
        }
    }

    if operators.len() != 1 {
        return Err(SemanticError(
            "query would require a cross product, which is not supported".to_string(),
        ));
    }

    // Step 5: wrap the root in Print over the resolved select_list.
    let mut projection = Vec::with_capacity(query.select_list.len());
    for col in &query.select_list {
        let &(_, iu) = column_index
            .get(col)
            .ok_or_else(|| SemanticError(format!("unknown column '{col}'")))?;
        projection.push(iu);
    }
    let root = operators.into_iter().next().expect("checked len == 1 above");
    Ok(Operator::print(root, projection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Predicate;
    use crate::storage::RelationSchema;
    use crate::types::LogicalType;

    fn two_table_db() -> Database {
        let mut db = Database::new();
        db.create_relation(RelationSchema {
            name: "order".into(),
            columns: vec![
                ("o_w_id".into(), LogicalType::Integer),
                ("o_d_id".into(), LogicalType::Integer),
                ("o_id".into(), LogicalType::Integer),
            ],
            primary_key: Some(vec!["o_w_id".into(), "o_d_id".into(), "o_id".into()]),
        });
        db.create_relation(RelationSchema {
            name: "orderline".into(),
            columns: vec![
                ("ol_w_id".into(), LogicalType::Integer),
                ("ol_d_id".into(), LogicalType::Integer),
                ("ol_o_id".into(), LogicalType::Integer),
            ],
            primary_key: None,
        });
        db
    }

    #[test]
    fn scan_only_query_wraps_single_scan_in_print() {
        let db = two_table_db();
        let mut arena = IuArena::new();
        let query = Query {
            select_list: vec!["o_id".into()],
            from_list: vec!["order".into()],
            where_list: vec![],
        };
        let plan = analyze(&mut arena, &db, &query).unwrap();
        assert!(matches!(plan, Operator::Print(_)));
    }

    #[test]
    fn pushdown_predicate_wraps_scan_in_selection() {
        let db = two_table_db();
        let mut arena = IuArena::new();
        let query = Query {
            select_list: vec!["o_id".into()],
            from_list: vec!["order".into()],
            where_list: vec![Predicate {
                lhs: "o_w_id".into(),
                rhs: RhsKind::IntConstant(1),
            }],
        };
        let plan = analyze(&mut arena, &db, &query).unwrap();
        if let Operator::Print(p) = plan {
            assert!(matches!(*p.child, Operator::Selection(_)));
        } else {
            panic!("expected Print");
        }
    }

    #[test]
    fn join_predicate_merges_two_scans_into_one_join() {
        let db = two_table_db();
        let mut arena = IuArena::new();
        let query = Query {
            select_list: vec!["o_id".into()],
            from_list: vec!["order".into(), "orderline".into()],
            where_list: vec![
                Predicate { lhs: "o_w_id".into(), rhs: RhsKind::ColumnRef("ol_w_id".into()) },
                Predicate { lhs: "o_d_id".into(), rhs: RhsKind::ColumnRef("ol_d_id".into()) },
                Predicate { lhs: "o_id".into(), rhs: RhsKind::ColumnRef("ol_o_id".into()) },
            ],
        };
        let plan = analyze(&mut arena, &db, &query).unwrap();
        if let Operator::Print(p) = plan {
            if let Operator::InnerJoin(j) = &*p.child {
                assert_eq!(j.key_pairs.len(), 3);
            } else {
                panic!("expected InnerJoin");
            }
        } else {
            panic!("expected Print");
        }
    }

    #[test]
    fn missing_join_predicate_between_two_relations_is_a_cross_product_error() {
        let db = two_table_db();
        let mut arena = IuArena::new();
        let query = Query {
            select_list: vec!["o_id".into()],
            from_list: vec!["order".into(), "orderline".into()],
            where_list: vec![],
        };
        let err = analyze(&mut arena, &db, &query).unwrap_err();
        assert!(err.0.contains("cross product"));
    }

    #[test]
    fn self_referencing_equality_is_rejected() {
        let db = two_table_db();
        let mut arena = IuArena::new();
        let query = Query {
            select_list: vec!["o_id".into()],
            from_list: vec!["order".into()],
            where_list: vec![Predicate {
                lhs: "o_w_id".into(),
                rhs: RhsKind::ColumnRef("o_d_id".into()),
            }],
        };
        let err = analyze(&mut arena, &db, &query).unwrap_err();
        assert!(err.0.contains("self-join"));
    }

    #[test]
    fn unknown_relation_is_reported() {
        let db = two_table_db();
        let mut arena = IuArena::new();
        let query = Query {
            select_list: vec!["x".into()],
            from_list: vec!["nosuchtable".into()],
            where_list: vec![],
        };
        let err = analyze(&mut arena, &db, &query).unwrap_err();
        assert!(err.0.contains("unknown relation"));
    }
}
