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

//! Operator algebra (component F) and the codegen driver that walks it.
//!
//! §4.5's produce/consume contract asks for each operator to hold a
//! "weak" back-reference to its consumer so `Produce` can call back into
//! `Consume` without owning it. Rust has no safe weak reference to a
//! stack frame, so the redesign (§9) turns that back-reference into an
//! ordinary continuation: `produce_and_consume` takes the consumer as a
//! `&dyn Fn(&mut Codegen) -> Result<(), CodegenError>` and calls it
//! directly from inside the loop/conditional it emits. The call stack at
//! codegen time mirrors the operator tree exactly, so nesting depth is
//! never a real concern for these plans.
//!
//! `prepare` threads the "IUs my consumer still needs" set top-down
//! (§4.5): each operator narrows it to what it can supply and passes the
//! rest, plus whatever its own predicate/join key needs, further down.

use std::collections::BTreeSet;

use crate::emitter::Emitter;
use crate::error::CodegenError;
use crate::iu::{IuArena, IuId};
use crate::types::{LogicalType, Value};

/// Scalar expression tree (§3): constants, references to an
/// already-produced IU, and the two predicate connectives the restricted
/// grammar needs (§6). `And` only ever appears chained by the analyzer
/// (§4.4 step 2), but the node exists so codegen doesn't special-case a
/// flat list.
pub enum Expr {
    Constant { produced: IuId, value: Value },
    IuRef(IuId),
    Equals { produced: IuId, lhs: Box<Expr>, rhs: Box<Expr> },
    And { produced: IuId, lhs: Box<Expr>, rhs: Box<Expr> },
}

impl Expr {
    /// The IU this node's value is available under once `emit` has run.
    pub fn produced(&self) -> IuId {
        match self {
            Expr::Constant { produced, .. } => *produced,
            Expr::IuRef(id) => *id,
            Expr::Equals { produced, .. } => *produced,
            Expr::And { produced, .. } => *produced,
        }
    }

    /// IUs this expression reads that it did not itself produce — what a
    /// containing operator must ensure are declared before `emit` runs.
    pub fn required_ius(&self, out: &mut BTreeSet<IuId>) {
        match self {
            Expr::Constant { .. } => {}
            Expr::IuRef(id) => {
                out.insert(*id);
            }
            Expr::Equals { lhs, rhs, .. } | Expr::And { lhs, rhs, .. } => {
                lhs.required_ius(out);
                rhs.required_ius(out);
            }
        }
    }

    /// Emit the `let` bindings that compute this node's value, depth
    /// first. `IuRef` emits nothing: its variable was declared by
    /// whichever scan or join produced it.
    pub fn emit(&self, arena: &IuArena, cg: &mut Codegen) {
        match self {
            Expr::Constant { produced, value } => {
                let var = arena.get(*produced).varname();
                cg.body.stmt(&format!("let {var} = {}", render_literal(value)));
            }
            Expr::IuRef(_) => {}
            Expr::Equals { produced, lhs, rhs } => {
                lhs.emit(arena, cg);
                rhs.emit(arena, cg);
                let lv = arena.get(lhs.produced()).varname();
                let rv = arena.get(rhs.produced()).varname();
                let out = arena.get(*produced).varname();
                cg.body.stmt(&format!("let {out} = {lv} == {rv}"));
            }
            Expr::And { produced, lhs, rhs } => {
                lhs.emit(arena, cg);
                rhs.emit(arena, cg);
                let lv = arena.get(lhs.produced()).varname();
                let rv = arena.get(rhs.produced()).varname();
                let out = arena.get(*produced).varname();
                cg.body.stmt(&format!("let {out} = {lv} && {rv}"));
            }
        }
    }
}

fn render_literal(value: &Value) -> String {
    match value {
        Value::Integer(v) => format!("{v}i32"),
        Value::Numeric { raw, .. } => format!("{raw}i64"),
        Value::Char { bytes, .. } | Value::Varchar { bytes, .. } => {
            format!("{:?}.to_vec()", String::from_utf8_lossy(bytes).into_owned().into_bytes())
        }
        Value::Timestamp(v) => format!("{v}i64"),
        Value::Bool(v) => format!("{v}"),
    }
}

/// One scan column: the IU it produces and the column's storage index,
/// resolved once by the analyzer so codegen never searches the schema by
/// name (§4.4, §4.5).
pub struct ScanColumn {
    pub iu: IuId,
    pub storage_index: usize,
}

pub struct TableScan {
    pub relation: String,
    pub columns: Vec<ScanColumn>,
    required: BTreeSet<IuId>,
}

pub struct Selection {
    pub child: Box<Operator>,
    pub predicate: Expr,
}

/// `key_pairs.0` are IUs from `left`, `key_pairs.1` the matching IUs from
/// `right` (§4.4 step 4: pairs of globally-unique column names that
/// name the same join key). `left_values` are the left-side IUs the
/// consumer still needs after the join (§4.5's "required ∩ IUs(left
/// subtree)").
pub struct InnerJoin {
    pub left: Box<Operator>,
    pub right: Box<Operator>,
    pub key_pairs: Vec<(IuId, IuId)>,
    left_values: Vec<IuId>,
    join_id: usize,
}

pub struct Print {
    pub child: Box<Operator>,
    pub projection: Vec<IuId>,
}

pub enum Operator {
    TableScan(TableScan),
    Selection(Selection),
    InnerJoin(InnerJoin),
    Print(Print),
}

impl Operator {
    pub fn table_scan(relation: impl Into<String>, columns: Vec<ScanColumn>) -> Self {
        Operator::TableScan(TableScan {
            relation: relation.into(),
            columns,
            required: BTreeSet::new(),
        })
    }

    pub fn selection(child: Operator, predicate: Expr) -> Self {
        Operator::Selection(Selection {
            child: Box::new(child),
            predicate,
        })
    }

    pub fn inner_join(left: Operator, right: Operator, key_pairs: Vec<(IuId, IuId)>, join_id: usize) -> Self {
        Operator::InnerJoin(InnerJoin {
            left: Box::new(left),
            right: Box::new(right),
            key_pairs,
            left_values: Vec::new(),
            join_id,
        })
    }

    pub fn print(child: Operator, projection: Vec<IuId>) -> Self {
        Operator::Print(Print {
            child: Box::new(child),
            projection,
        })
    }

    /// IUs flowing out of this subtree, in a stable order — used before
    /// `prepare` to compute `required ∩ IUs(side)` for a join (§4.5).
    pub fn collect_ius(&self) -> Vec<IuId> {
        match self {
            Operator::TableScan(scan) => scan.columns.iter().map(|c| c.iu).collect(),
            Operator::Selection(sel) => sel.child.collect_ius(),
            Operator::InnerJoin(join) => {
                let mut ius = join.left.collect_ius();
                ius.extend(join.right.collect_ius());
                ius
            }
            Operator::Print(print) => print.child.collect_ius(),
        }
    }

    /// Thread the "still needed downstream" IU set top-down, narrowing it
    /// at each operator to exactly what that operator must keep alive
    /// (§4.5). Must run once, before the first `produce_and_consume`.
    pub fn prepare(&mut self, required: &BTreeSet<IuId>) {
        match self {
            Operator::TableScan(scan) => {
                let own: BTreeSet<IuId> = scan.columns.iter().map(|c| c.iu).collect();
                scan.required = required.intersection(&own).copied().collect();
            }
            Operator::Selection(sel) => {
                let mut own_required = required.clone();
                sel.predicate.required_ius(&mut own_required);
                sel.child.prepare(&own_required);
            }
            Operator::InnerJoin(join) => {
                let mut enlarged = required.clone();
                for (l, r) in &join.key_pairs {
                    enlarged.insert(*l);
                    enlarged.insert(*r);
                }
                let left_ius: BTreeSet<IuId> = join.left.collect_ius().into_iter().collect();
                let right_ius: BTreeSet<IuId> = join.right.collect_ius().into_iter().collect();
                let left_required: BTreeSet<IuId> = enlarged.intersection(&left_ius).copied().collect();
                let right_required: BTreeSet<IuId> = enlarged.intersection(&right_ius).copied().collect();
                join.left_values = required.intersection(&left_ius).copied().collect();
                join.left.prepare(&left_required);
                join.right.prepare(&right_required);
            }
            Operator::Print(print) => {
                let required: BTreeSet<IuId> = print.projection.iter().copied().collect();
                print.child.prepare(&required);
            }
        }
    }

    /// Emit this operator's `Produce`, invoking `sink` (its consumer's
    /// `Consume`) from wherever the produced tuples become available —
    /// the CPS realization of §4.5's back-reference.
    pub fn produce_and_consume(
        &self,
        arena: &IuArena,
        cg: &mut Codegen,
        sink: &dyn Fn(&IuArena, &mut Codegen) -> Result<(), CodegenError>,
    ) -> Result<(), CodegenError> {
        match self {
            Operator::TableScan(scan) => {
                let tid_var = format!("tid{}", cg.fresh_label());
                cg.body.open_scope(&format!(
                    "for {tid_var} in 0..flowbase::runtime_support::relation_size(db, {:?})",
                    scan.relation
                ));
                cg.body.open_scope(&format!(
                    "if flowbase::runtime_support::relation_is_live(db, {:?}, {tid_var})",
                    scan.relation
                ));
                for col in &scan.columns {
                    if !scan.required.contains(&col.iu) {
                        continue;
                    }
                    let iu = arena.get(col.iu);
                    let reader = reader_fn(iu.ty);
                    cg.body.stmt(&format!(
                        "let {} = flowbase::runtime_support::{reader}(db, {:?}, {}, {tid_var})",
                        iu.varname(),
                        scan.relation,
                        col.storage_index,
                    ));
                }
                let result = sink(arena, cg);
                cg.body.close_scope();
                cg.body.close_scope();
                result
            }
            Operator::Selection(sel) => sel.child.produce_and_consume(arena, cg, &|arena, cg| {
                sel.predicate.emit(arena, cg);
                let cond = arena.get(sel.predicate.produced()).varname();
                cg.body.open_scope(&format!("if {cond}"));
                let result = sink(arena, cg);
                cg.body.close_scope();
                result
            }),
            Operator::InnerJoin(join) => {
                let ht_var = format!("ht{}", join.join_id);
                let key_vars: Vec<String> = join
                    .key_pairs
                    .iter()
                    .map(|(l, _)| arena.get(*l).varname())
                    .collect();
                cg.preamble.stmt(&format!(
                    "let {ht_var}: flowbase::multimap::LazyMultiMap<Vec<flowbase::types::Value>, {tuple_ty}> = flowbase::multimap::LazyMultiMap::new(1)",
                    tuple_ty = left_value_tuple_type(arena, &join.left_values),
                ));

                join.left.produce_and_consume(arena, cg, &|arena, cg| {
                    let left_keys: Vec<IuId> = join.key_pairs.iter().map(|(l, _)| *l).collect();
                    let key_expr = multimap_key_expr(arena, &left_keys);
                    let value_expr = left_value_tuple_expr(arena, &join.left_values);
                    cg.body.stmt(&format!("{ht_var}.insert(0, {key_expr}, {value_expr})"));
                    Ok(())
                })?;

                cg.body.stmt(&format!(
                    "let {ht_var} = {ht_var}.finalize()" // shadow: insert-phase handle consumed, sealed handle takes its name (§4.3 type-state)
                ));

                join.right.produce_and_consume(arena, cg, &|arena, cg| {
                    let right_keys: Vec<IuId> = join.key_pairs.iter().map(|(_, r)| *r).collect();
                    let probe_key = multimap_key_expr(arena, &right_keys);
                    let row_var = format!("row{}", cg.fresh_label());
                    cg.body.open_scope(&format!("for {row_var} in {ht_var}.equal_range(&{probe_key})"));
                    for (i, iu) in join.left_values.iter().enumerate() {
                        let var = arena.get(*iu).varname();
                        cg.body.stmt(&format!("let {var} = {row_var}.{i}.clone()"));
                    }
                    let result = sink(arena, cg);
                    cg.body.close_scope();
                    result
                })
            }
            Operator::Print(print) => print.child.produce_and_consume(arena, cg, &|arena, cg| {
                let fields: Vec<String> = print
                    .projection
                    .iter()
                    .map(|iu| format!("({}).render()", value_ctor_expr(arena, *iu)))
                    .collect();
                cg.body.stmt(&format!(
                    "flowbase::runtime_support::print_row(&[{}])",
                    fields.join(", ")
                ));
                let _ = sink;
                Ok(())
            }),
        }
    }
}

fn reader_fn(ty: LogicalType) -> &'static str {
    match ty {
        LogicalType::Integer => "read_integer",
        LogicalType::Numeric { .. } => "read_numeric",
        LogicalType::Char { .. } => "read_char",
        LogicalType::Varchar { .. } => "read_varchar",
        LogicalType::Timestamp => "read_timestamp",
        LogicalType::Bool => "read_bool",
    }
}

fn multimap_key_expr(arena: &IuArena, ius: &[IuId]) -> String {
    let parts: Vec<String> = ius.iter().map(|id| value_ctor_expr(arena, *id)).collect();
    format!("vec![{}]", parts.join(", "))
}

/// Wrap a generated Rust variable (a scan/join's native-typed value) back
/// into a `flowbase::types::Value` for hashing, ordering, or rendering —
/// the inverse of the `read_*` accessors' unwrapping in
/// [`crate::runtime_support`].
fn value_ctor_expr(arena: &IuArena, id: IuId) -> String {
    let iu = arena.get(id);
    let var = iu.varname();
    match iu.ty {
        LogicalType::Integer => format!("flowbase::types::Value::Integer({var})"),
        LogicalType::Numeric { l, p } => {
            format!("flowbase::types::Value::Numeric {{ raw: {var}, l: {l}, p: {p} }}")
        }
        LogicalType::Char { n } => format!("flowbase::types::Value::Char {{ bytes: {var}.clone(), n: {n} }}"),
        LogicalType::Varchar { n } => {
            format!("flowbase::types::Value::Varchar {{ bytes: {var}.clone(), n: {n} }}")
        }
        LogicalType::Timestamp => format!("flowbase::types::Value::Timestamp({var})"),
        LogicalType::Bool => format!("flowbase::types::Value::Bool({var})"),
    }
}

fn left_value_tuple_type(arena: &IuArena, ius: &[IuId]) -> String {
    if ius.is_empty() {
        return "()".to_string();
    }
    let parts: Vec<&'static str> = ius.iter().map(|id| rust_type(arena.get(*id).ty)).collect();
    format!("({},)", parts.join(", "))
}

fn left_value_tuple_expr(arena: &IuArena, ius: &[IuId]) -> String {
    if ius.is_empty() {
        return "()".to_string();
    }
    let parts: Vec<String> = ius.iter().map(|id| format!("{}.clone()", arena.get(*id).varname())).collect();
    format!("({},)", parts.join(", "))
}

fn rust_type(ty: LogicalType) -> &'static str {
    match ty {
        LogicalType::Integer => "i32",
        LogicalType::Numeric { .. } => "i64",
        LogicalType::Char { .. } | LogicalType::Varchar { .. } => "Vec<u8>",
        LogicalType::Timestamp => "i64",
        LogicalType::Bool => "bool",
    }
}

/// Everything the operator tree writes into while it's being walked: a
/// preamble (top-level `static`/`let` items that must precede the entry
/// function, e.g. a join's hash table) and the entry function's body.
/// Kept as one struct, rather than passing `&mut Emitter` around
/// directly, because `produce_and_consume`'s continuations need to call
/// back into the whole codegen context, not just the body writer.
pub struct Codegen {
    pub preamble: Emitter,
    pub body: Emitter,
    label_counter: usize,
}

impl Codegen {
    pub fn new() -> Self {
        Codegen {
            preamble: Emitter::new(),
            body: Emitter::new(),
            label_counter: 0,
        }
    }

    /// A small monotonic counter for loop/row variable disambiguation,
    /// independent of IU ids (a join's probe side needs its own row
    /// variable name that isn't an IU at all).
    fn fresh_label(&mut self) -> usize {
        self.label_counter += 1;
        self.label_counter
    }
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive the whole plan and assemble one translation unit (§6's
/// generated-translation-unit contract): the join hash tables and other
/// preamble items first, then `execute_query`, the fixed entry point
/// component I resolves by name after loading the compiled object.
pub fn compile_plan(arena: &IuArena, plan: &mut Operator) -> Result<String, CodegenError> {
    plan.prepare(&Default::default());
    let mut cg = Codegen::new();
    plan.produce_and_consume(arena, &mut cg, &|_, _| Ok(()))?;

    let mut out = Emitter::new();
    out.line("// Generated translation unit. Do not edit by hand.");
    out.blank();
    out.open_scope("#[no_mangle]\npub extern \"C\" fn execute_query(db: &flowbase::storage::Database) -> i32");
    out.line(&cg.preamble.into_source());
    out.line(&cg.body.into_source());
    out.stmt("0");
    out.close_scope();
    Ok(out.into_source())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LogicalType;

    #[test]
    fn table_scan_emits_guarded_loop_and_calls_sink() {
        let mut arena = IuArena::new();
        let iu = arena.fresh_table_column("customer", "c_id", LogicalType::Integer);
        let mut plan = Operator::table_scan(
            "customer",
            vec![ScanColumn { iu, storage_index: 2 }],
        );
        let required: BTreeSet<IuId> = [iu].into_iter().collect();
        plan.prepare(&required);

        let mut cg = Codegen::new();
        let mut sink_calls = 0;
        plan.produce_and_consume(&arena, &mut cg, &|_, _| {
            sink_calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(sink_calls, 1);
        let src = cg.body.into_source();
        assert!(src.contains("relation_size(db, \"customer\")"));
        assert!(src.contains("relation_is_live(db, \"customer\", tid"));
        assert!(src.contains("read_integer(db, \"customer\", 2, tid"));
    }

    #[test]
    fn selection_wraps_sink_in_a_conditional() {
        let mut arena = IuArena::new();
        let iu = arena.fresh_table_column("customer", "c_id", LogicalType::Integer);
        let scan = Operator::table_scan("customer", vec![ScanColumn { iu, storage_index: 2 }]);
        let cmp = arena.fresh_anonymous("cmp", LogicalType::Bool);
        let lit = arena.fresh_anonymous("lit", LogicalType::Integer);
        let predicate = Expr::Equals {
            produced: cmp,
            lhs: Box::new(Expr::IuRef(iu)),
            rhs: Box::new(Expr::Constant {
                produced: lit,
                value: Value::Integer(322),
            }),
        };
        let mut plan = Operator::selection(scan, predicate);
        let required: BTreeSet<IuId> = [iu].into_iter().collect();
        plan.prepare(&required);

        let mut cg = Codegen::new();
        plan.produce_and_consume(&arena, &mut cg, &|_, _| Ok(())).unwrap();
        let src = cg.body.into_source();
        assert!(src.contains("== "));
        assert!(src.contains("if "));
    }

    #[test]
    fn prepare_narrows_join_sides_to_keys_plus_required() {
        let mut arena = IuArena::new();
        let l_key = arena.fresh_table_column("order", "o_id", LogicalType::Integer);
        let l_extra = arena.fresh_table_column("order", "o_all_local", LogicalType::Integer);
        let r_key = arena.fresh_table_column("orderline", "ol_o_id", LogicalType::Integer);

        let left = Operator::table_scan(
            "order",
            vec![
                ScanColumn { iu: l_key, storage_index: 0 },
                ScanColumn { iu: l_extra, storage_index: 1 },
            ],
        );
        let right = Operator::table_scan("orderline", vec![ScanColumn { iu: r_key, storage_index: 0 }]);
        let mut join = Operator::inner_join(left, right, vec![(l_key, r_key)], 0);
        let required: BTreeSet<IuId> = [l_extra].into_iter().collect();
        join.prepare(&required);

        if let Operator::InnerJoin(j) = &join {
            assert_eq!(j.left_values, vec![l_extra]);
        } else {
            panic!("expected InnerJoin");
        }
    }
}
