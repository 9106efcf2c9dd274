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

//! The fixed surface generated translation units link against.
//!
//! A compiled query is a separate crate (`rustc --crate-type cdylib
//! --extern flowbase=...`, component I) that never sees `Relation`'s
//! private fields. Every column read or tombstone check the emitter
//! (component G) plans for comes out as a call into one of these
//! functions instead of a field access, so the generated source stays
//! stable even if storage's internals change.
//!
//! Panicking on a missing relation/column/type mismatch is deliberate:
//! by the time codegen reaches a `TableScan`, the analyzer has already
//! resolved that relation and column against the live schema, so a
//! mismatch here means the plan and the database disagree about the
//! schema underneath it, a programmer bug rather than a query error.

use crate::storage::Database;
use crate::types::Value;

pub fn relation_size(db: &Database, relation: &str) -> usize {
    db.relation(relation)
        .unwrap_or_else(|| panic!("unknown relation '{relation}'"))
        .size()
}

pub fn relation_is_live(db: &Database, relation: &str, tid: usize) -> bool {
    db.relation(relation)
        .unwrap_or_else(|| panic!("unknown relation '{relation}'"))
        .is_live(tid)
}

macro_rules! reader {
    ($name:ident, $variant:ident, $out:ty) => {
        pub fn $name(db: &Database, relation: &str, col: usize, tid: usize) -> $out {
            let rel = db
                .relation(relation)
                .unwrap_or_else(|| panic!("unknown relation '{relation}'"));
            match rel.column(col).get(tid) {
                Value::$variant(v) => v,
                other => panic!("column {col} of '{relation}' is not {}: {other:?}", stringify!($variant)),
            }
        }
    };
}

reader!(read_integer, Integer, i32);
reader!(read_timestamp, Timestamp, i64);
reader!(read_bool, Bool, bool);

pub fn read_numeric(db: &Database, relation: &str, col: usize, tid: usize) -> i64 {
    let rel = db
        .relation(relation)
        .unwrap_or_else(|| panic!("unknown relation '{relation}'"));
    match rel.column(col).get(tid) {
        Value::Numeric { raw, .. } => raw,
        other => panic!("column {col} of '{relation}' is not Numeric: {other:?}"),
    }
}

pub fn read_char(db: &Database, relation: &str, col: usize, tid: usize) -> Vec<u8> {
    let rel = db
        .relation(relation)
        .unwrap_or_else(|| panic!("unknown relation '{relation}'"));
    match rel.column(col).get(tid) {
        Value::Char { bytes, .. } => bytes,
        other => panic!("column {col} of '{relation}' is not Char: {other:?}"),
    }
}

pub fn read_varchar(db: &Database, relation: &str, col: usize, tid: usize) -> Vec<u8> {
    let rel = db
        .relation(relation)
        .unwrap_or_else(|| panic!("unknown relation '{relation}'"));
    match rel.column(col).get(tid) {
        Value::Varchar { bytes, .. } => bytes,
        other => panic!("column {col} of '{relation}' is not Varchar: {other:?}"),
    }
}

/// Render one output row as a `|`-joined line, matching the bulk-load
/// format the rows themselves came in on (§6).
pub fn print_row(fields: &[String]) {
    println!("{}", fields.join("|"));
}
