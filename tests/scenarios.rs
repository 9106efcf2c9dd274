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

//! End-to-end pipeline scenarios: SQL text through parse, analyze, and
//! codegen against the nine TPC-C relations. These stop short of
//! compile-and-load (component I shells out to `rustc`, which is outside
//! the scope of a test run) and instead assert on the shape of the
//! generated translation unit, which is exactly what `compile::Compiler`
//! would hand the compiler unchanged.

use flowbase::algebra::compile_plan;
use flowbase::analyzer::analyze;
use flowbase::ast::parse_query;
use flowbase::iu::IuArena;
use flowbase::storage::Database;
use flowbase::tpcc_schema;

fn tpcc_db() -> Database {
    let mut db = Database::new();
    for schema in tpcc_schema::all() {
        db.create_relation(schema);
    }
    db
}

fn compile(sql: &str) -> String {
    let db = tpcc_db();
    let mut arena = IuArena::new();
    let query = parse_query(sql).unwrap();
    let mut plan = analyze(&mut arena, &db, &query).unwrap();
    compile_plan(&arena, &mut plan).unwrap()
}

/// S1 — scan-only: one guarded scan over `customer`, printing `c_id`.
#[test]
fn s1_scan_only_prints_c_id() {
    let src = compile("SELECT c_id FROM customer;");
    assert!(src.contains("relation_size(db, \"customer\")"));
    assert!(src.contains("print_row"));
    assert!(!src.contains("LazyMultiMap"));
}

/// S2 — filter pushdown: the three equalities on `customer`'s primary
/// key all land on the same scan as nested conditionals, no join.
#[test]
fn s2_filter_pushdown_wraps_single_scan() {
    let src = compile("SELECT c_first FROM customer WHERE c_id = 1 AND c_d_id = 1 AND c_w_id = 1;");
    assert_eq!(src.matches("if ").count(), 3);
    assert!(!src.contains("LazyMultiMap"));
}

/// S3 — two-way join: `order` built into one lazy multi-map, `orderline`
/// probes it on the three-column key.
#[test]
fn s3_two_way_join_builds_one_hash_table() {
    let src = compile(
        "SELECT o_all_local FROM order, orderline WHERE o_w_id = ol_w_id AND o_d_id = ol_d_id AND o_id = ol_o_id;",
    );
    assert_eq!(src.matches("LazyMultiMap::new").count(), 1);
    assert!(src.contains(".finalize()"));
    assert!(src.contains("equal_range"));
}

/// S4 — three-way join with a filter on `customer`: two hash tables
/// (customer⋈order, then ⋈orderline) plus the pushdown selections on
/// customer's key columns.
#[test]
fn s4_three_way_join_with_filter() {
    let src = compile(
        "SELECT o_all_local, ol_amount, c_first, c_last FROM customer, order, orderline \
         WHERE c_id = 322 AND c_d_id = 1 AND c_w_id = 1 \
         AND c_w_id = o_w_id AND c_d_id = o_d_id AND c_id = o_c_id \
         AND o_w_id = ol_w_id AND o_d_id = ol_d_id AND o_id = ol_o_id;",
    );
    assert_eq!(src.matches("LazyMultiMap::new").count(), 2);
    assert_eq!(src.matches("if ").count(), 3);
}

/// S6 — lazy multi-map stress: 1,000,000 `(Integer, Integer)` pairs with
/// keys uniform over `[0, 1024)`, inserted from 8 threads, finalized
/// once; every key's `equal_range` count sums back to the total.
#[test]
fn s6_multimap_stress_preserves_total_count() {
    use flowbase::multimap::LazyMultiMap;
    use flowbase::types::Value;
    use std::sync::Arc;
    use std::thread;

    const TOTAL: usize = 1_000_000;
    const SHARDS: usize = 8;
    const KEY_SPACE: i32 = 1024;

    let mm: Arc<LazyMultiMap<Vec<Value>, (i32, i32)>> = Arc::new(LazyMultiMap::new(SHARDS));
    let mut handles = Vec::with_capacity(SHARDS);
    for shard in 0..SHARDS {
        let mm = Arc::clone(&mm);
        handles.push(thread::spawn(move || {
            let per_shard = TOTAL / SHARDS;
            for i in 0..per_shard {
                let n = (shard * per_shard + i) as i32;
                let k = n % KEY_SPACE;
                mm.insert(shard, vec![Value::Integer(k)], (k, n));
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let sealed = Arc::try_unwrap(mm).ok().expect("all threads joined").finalize();
    let total: usize = (0..KEY_SPACE)
        .map(|k| sealed.equal_range(&vec![Value::Integer(k)]).count())
        .sum();
    assert_eq!(total, TOTAL);
}
