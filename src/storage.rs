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

//! Column store and relation (component B).
//!
//! Each relation owns an ordered sequence of named, typed, grow-only
//! columns plus a tombstone bit per row and, if a primary key is
//! declared, an ordered index from the PK tuple to row index.

use std::collections::BTreeMap;
use std::io::BufRead;

use crate::error::ParseError;
use crate::types::{LogicalType, Value};

/// A contiguous, grow-only typed buffer: one arm per [`LogicalType`] class.
#[derive(Debug, Clone)]
pub enum ColumnData {
    Integer(Vec<i32>),
    Numeric { raw: Vec<i64>, l: u32, p: u32 },
    Char { rows: Vec<Vec<u8>>, n: u32 },
    Varchar { rows: Vec<Vec<u8>>, n: u32 },
    Timestamp(Vec<i64>),
    Bool(Vec<bool>),
}

impl ColumnData {
    fn empty(ty: LogicalType) -> Self {
        match ty {
            LogicalType::Integer => ColumnData::Integer(Vec::new()),
            LogicalType::Numeric { l, p } => ColumnData::Numeric {
                raw: Vec::new(),
                l,
                p,
            },
            LogicalType::Char { n } => ColumnData::Char {
                rows: Vec::new(),
                n,
            },
            LogicalType::Varchar { n } => ColumnData::Varchar {
                rows: Vec::new(),
                n,
            },
            LogicalType::Timestamp => ColumnData::Timestamp(Vec::new()),
            LogicalType::Bool => ColumnData::Bool(Vec::new()),
        }
    }

    pub fn logical_type(&self) -> LogicalType {
        match self {
            ColumnData::Integer(_) => LogicalType::Integer,
            ColumnData::Numeric { l, p, .. } => LogicalType::Numeric { l: *l, p: *p },
            ColumnData::Char { n, .. } => LogicalType::Char { n: *n },
            ColumnData::Varchar { n, .. } => LogicalType::Varchar { n: *n },
            ColumnData::Timestamp(_) => LogicalType::Timestamp,
            ColumnData::Bool(_) => LogicalType::Bool,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Integer(v) => v.len(),
            ColumnData::Numeric { raw, .. } => raw.len(),
            ColumnData::Char { rows, .. } => rows.len(),
            ColumnData::Varchar { rows, .. } => rows.len(),
            ColumnData::Timestamp(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, value: Value) {
        match (self, value) {
            (ColumnData::Integer(v), Value::Integer(x)) => v.push(x),
            (ColumnData::Numeric { raw, .. }, Value::Numeric { raw: x, .. }) => raw.push(x),
            (ColumnData::Char { rows, .. }, Value::Char { bytes, .. }) => rows.push(bytes),
            (ColumnData::Varchar { rows, .. }, Value::Varchar { bytes, .. }) => rows.push(bytes),
            (ColumnData::Timestamp(v), Value::Timestamp(x)) => v.push(x),
            (ColumnData::Bool(v), Value::Bool(x)) => v.push(x),
            _ => panic!("column/value logical type mismatch on push"),
        }
    }

    fn set(&mut self, row: usize, value: Value) {
        match (self, value) {
            (ColumnData::Integer(v), Value::Integer(x)) => v[row] = x,
            (ColumnData::Numeric { raw, .. }, Value::Numeric { raw: x, .. }) => raw[row] = x,
            (ColumnData::Char { rows, .. }, Value::Char { bytes, .. }) => rows[row] = bytes,
            (ColumnData::Varchar { rows, .. }, Value::Varchar { bytes, .. }) => rows[row] = bytes,
            (ColumnData::Timestamp(v), Value::Timestamp(x)) => v[row] = x,
            (ColumnData::Bool(v), Value::Bool(x)) => v[row] = x,
            _ => panic!("column/value logical type mismatch on set"),
        }
    }

    pub fn get(&self, row: usize) -> Value {
        match self {
            ColumnData::Integer(v) => Value::Integer(v[row]),
            ColumnData::Numeric { raw, l, p } => Value::Numeric {
                raw: raw[row],
                l: *l,
                p: *p,
            },
            ColumnData::Char { rows, n } => Value::Char {
                bytes: rows[row].clone(),
                n: *n,
            },
            ColumnData::Varchar { rows, n } => Value::Varchar {
                bytes: rows[row].clone(),
                n: *n,
            },
            ColumnData::Timestamp(v) => Value::Timestamp(v[row]),
            ColumnData::Bool(v) => Value::Bool(v[row]),
        }
    }
}

/// Declared shape of one relation: column names/types in DDL order, and
/// an optional primary key given as column names in PK-spec order (which
/// may differ from declaration order; §4.2).
#[derive(Debug, Clone)]
pub struct RelationSchema {
    pub name: String,
    pub columns: Vec<(String, LogicalType)>,
    pub primary_key: Option<Vec<String>>,
}

impl RelationSchema {
    /// Column indices of the PK, in PK-spec declaration order.
    fn pk_indices(&self) -> Option<Vec<usize>> {
        let pk = self.primary_key.as_ref()?;
        Some(
            pk.iter()
                .map(|pk_col| {
                    self.columns
                        .iter()
                        .position(|(name, _)| name == pk_col)
                        .unwrap_or_else(|| panic!("primary key column '{pk_col}' not declared"))
                })
                .collect(),
        )
    }
}

/// A live, mutable table: columns + tombstones + (optional) PK index.
pub struct Relation {
    pub schema: RelationSchema,
    columns: Vec<ColumnData>,
    tombstones: Vec<bool>,
    pk_indices: Option<Vec<usize>>,
    pk_index: Option<BTreeMap<Vec<Value>, usize>>,
}

impl Relation {
    pub fn new(schema: RelationSchema) -> Self {
        let pk_indices = schema.pk_indices();
        let columns = schema
            .columns
            .iter()
            .map(|(_, ty)| ColumnData::empty(*ty))
            .collect();
        let pk_index = pk_indices.as_ref().map(|_| BTreeMap::new());
        Relation {
            schema,
            columns,
            tombstones: Vec::new(),
            pk_indices,
            pk_index,
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.schema.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn column_type(&self, name: &str) -> Option<LogicalType> {
        self.schema
            .columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    /// Total rows ever appended, including tombstoned ones. Row indices
    /// are stable for the life of the row (§3).
    pub fn size(&self) -> usize {
        self.tombstones.len()
    }

    fn assemble_pk(&self, tuple: &[Value]) -> Vec<Value> {
        self.pk_indices
            .as_ref()
            .expect("assemble_pk called on a relation without a primary key")
            .iter()
            .map(|&i| tuple[i].clone())
            .collect()
    }

    /// Append one value per column, set the tombstone, update the PK
    /// index. Returns the new row's stable `tid`.
    pub fn create(&mut self, tuple: Vec<Value>) -> usize {
        assert_eq!(tuple.len(), self.columns.len(), "column count mismatch");
        let tid = self.tombstones.len();
        for (col, value) in self.columns.iter_mut().zip(tuple.iter().cloned()) {
            col.push(value);
        }
        self.tombstones.push(true);
        if let Some(index) = &mut self.pk_index {
            let key = self.pk_indices.as_ref().unwrap().iter().map(|&i| tuple[i].clone()).collect();
            index.insert(key, tid);
        }
        debug_assert!(self.columns.iter().all(|c| c.len() == self.tombstones.len()));
        tid
    }

    /// Rewrite all columns at `tid` and re-key the PK index.
    pub fn update(&mut self, tid: usize, new: Vec<Value>) {
        assert_eq!(new.len(), self.columns.len(), "column count mismatch");
        if let Some(index) = &mut self.pk_index {
            let old_key = self.assemble_pk(&self.read(tid));
            index.remove(&old_key);
            let new_key = self.assemble_pk(&new);
            index.insert(new_key, tid);
        }
        for (col, value) in self.columns.iter_mut().zip(new.into_iter()) {
            col.set(tid, value);
        }
    }

    /// Clear the tombstone and remove the PK entry.
    pub fn delete(&mut self, tid: usize) {
        if let Some(index) = &mut self.pk_index {
            let key = self.assemble_pk(&self.read(tid));
            index.remove(&key);
        }
        self.tombstones[tid] = false;
    }

    pub fn is_live(&self, tid: usize) -> bool {
        self.tombstones[tid]
    }

    /// Materialize a tuple by reading each column at `tid`.
    pub fn read(&self, tid: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.get(tid)).collect()
    }

    pub fn column(&self, idx: usize) -> &ColumnData {
        &self.columns[idx]
    }

    /// Row index for a primary key tuple, if present and live.
    pub fn lookup(&self, pk: &[Value]) -> Option<usize> {
        let index = self.pk_index.as_ref()?;
        index.get(pk).copied().filter(|&tid| self.is_live(tid))
    }

    /// Iterate tuples with PK in `[lo, hi)`, in PK order.
    pub fn key_iter(&self, lo: Vec<Value>, hi: Vec<Value>) -> KeyIterator<'_> {
        let index = self
            .pk_index
            .as_ref()
            .expect("key_iter called on a relation without a primary key");
        KeyIterator {
            relation: self,
            inner: index.range(lo..hi),
        }
    }

    /// Read line-delimited `|`-separated records and cast each field
    /// through the column's text cast. Returns the 1-based line number on
    /// failure (§4.2, §6).
    pub fn load_rows<R: BufRead>(&mut self, reader: R) -> Result<usize, (usize, ParseError)> {
        let mut loaded = 0;
        for (lineno, line) in reader.lines().enumerate() {
            let lineno = lineno + 1;
            let line = line.map_err(|e| {
                (
                    lineno,
                    ParseError {
                        message: format!("I/O error: {e}"),
                        location: None,
                    },
                )
            })?;
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('|').collect();
            if fields.len() != self.schema.columns.len() {
                return Err((
                    lineno,
                    ParseError {
                        message: format!(
                            "expected {} fields, found {}",
                            self.schema.columns.len(),
                            fields.len()
                        ),
                        location: None,
                    },
                ));
            }
            let mut tuple = Vec::with_capacity(fields.len());
            for (field, (_, ty)) in fields.iter().zip(self.schema.columns.iter()) {
                let value = Value::cast_from_text(*ty, field).map_err(|e| (lineno, e))?;
                tuple.push(value);
            }
            self.create(tuple);
            loaded += 1;
        }
        Ok(loaded)
    }
}

/// Forward iterator over `[lo, hi)` in primary-key order.
pub struct KeyIterator<'a> {
    relation: &'a Relation,
    inner: std::collections::btree_map::Range<'a, Vec<Value>, usize>,
}

impl<'a> Iterator for KeyIterator<'a> {
    type Item = Vec<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, &tid) = self.inner.next()?;
        Some(self.relation.read(tid))
    }
}

/// The live collection of named relations a query runs against.
#[derive(Default)]
pub struct Database {
    pub relations: std::collections::HashMap<String, Relation>,
}

impl Database {
    pub fn new() -> Self {
        Database {
            relations: std::collections::HashMap::new(),
        }
    }

    pub fn create_relation(&mut self, schema: RelationSchema) {
        self.relations.insert(schema.name.clone(), Relation::new(schema));
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn relation_mut(&mut self, name: &str) -> Option<&mut Relation> {
        self.relations.get_mut(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_schema() -> RelationSchema {
        RelationSchema {
            name: "customer".into(),
            columns: vec![
                ("c_w_id".into(), LogicalType::Integer),
                ("c_d_id".into(), LogicalType::Integer),
                ("c_id".into(), LogicalType::Integer),
                ("c_first".into(), LogicalType::Varchar { n: 16 }),
            ],
            primary_key: Some(vec!["c_w_id".into(), "c_d_id".into(), "c_id".into()]),
        }
    }

    fn row(w: i32, d: i32, id: i32, first: &str) -> Vec<Value> {
        vec![
            Value::Integer(w),
            Value::Integer(d),
            Value::Integer(id),
            Value::Varchar {
                bytes: first.as_bytes().to_vec(),
                n: 16,
            },
        ]
    }

    #[test]
    fn create_read_roundtrip() {
        let mut rel = Relation::new(customer_schema());
        let tid = rel.create(row(1, 1, 322, "Alice"));
        assert_eq!(rel.read(tid), row(1, 1, 322, "Alice"));
        assert_eq!(rel.size(), 1);
    }

    #[test]
    fn update_rewrites_and_rekeys() {
        let mut rel = Relation::new(customer_schema());
        let tid = rel.create(row(1, 1, 322, "Alice"));
        rel.update(tid, row(1, 1, 322, "Alicia"));
        assert_eq!(rel.read(tid), row(1, 1, 322, "Alicia"));
        assert_eq!(
            rel.lookup(&[Value::Integer(1), Value::Integer(1), Value::Integer(322)]),
            Some(tid)
        );
    }

    #[test]
    fn delete_clears_tombstone_and_pk() {
        let mut rel = Relation::new(customer_schema());
        let tid = rel.create(row(1, 1, 322, "Alice"));
        rel.delete(tid);
        assert!(!rel.is_live(tid));
        assert_eq!(
            rel.lookup(&[Value::Integer(1), Value::Integer(1), Value::Integer(322)]),
            None
        );
    }

    #[test]
    fn lookup_matches_assembled_key_for_every_live_tid() {
        let mut rel = Relation::new(customer_schema());
        let a = rel.create(row(1, 1, 1, "A"));
        let b = rel.create(row(1, 1, 2, "B"));
        rel.delete(a);
        for tid in [a, b] {
            if !rel.is_live(tid) {
                continue;
            }
            let tuple = rel.read(tid);
            let key = vec![tuple[0].clone(), tuple[1].clone(), tuple[2].clone()];
            assert_eq!(rel.lookup(&key), Some(tid));
        }
    }

    #[test]
    fn key_iterator_yields_pk_order() {
        let mut rel = Relation::new(customer_schema());
        rel.create(row(1, 1, 3, "C"));
        rel.create(row(1, 1, 1, "A"));
        rel.create(row(1, 1, 2, "B"));
        let lo = vec![Value::Integer(1), Value::Integer(1), Value::Integer(0)];
        let hi = vec![Value::Integer(1), Value::Integer(1), Value::Integer(100)];
        let names: Vec<String> = rel.key_iter(lo, hi).map(|t| t[3].render()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn load_rows_parses_pipe_delimited_records() {
        let mut rel = Relation::new(customer_schema());
        let data = b"1|1|1|Alice\n1|1|2|  Bob\n" as &[u8];
        let loaded = rel.load_rows(data).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(rel.size(), 2);
    }

    #[test]
    fn load_rows_reports_line_number_on_bad_field_count() {
        let mut rel = Relation::new(customer_schema());
        let data = b"1|1|1|Alice\n1|1|oops\n" as &[u8];
        let err = rel.load_rows(data).unwrap_err();
        assert_eq!(err.0, 2);
    }

    #[test]
    fn all_columns_equal_length_after_mutations() {
        let mut rel = Relation::new(customer_schema());
        rel.create(row(1, 1, 1, "A"));
        rel.update(0, row(1, 1, 1, "AA"));
        rel.delete(0);
        rel.create(row(1, 1, 2, "B"));
        let len = rel.size();
        for i in 0..rel.schema.columns.len() {
            assert_eq!(rel.column(i).len(), len);
        }
    }
}
