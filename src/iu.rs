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

//! Information units, arena-allocated (§9 redesign: monotonically
//! increasing ids instead of object addresses, so generated identifier
//! names don't leak process addresses and codegen stays deterministic
//! modulo those ids — §8 property 6).

use std::collections::BTreeMap;

use crate::types::LogicalType;

/// Stable identity of one IU for the life of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IuId(pub usize);

/// A value produced by an operator: `(relation?, column, logical-type)`.
#[derive(Debug, Clone)]
pub struct Iu {
    pub id: IuId,
    pub relation: Option<String>,
    pub column: String,
    pub ty: LogicalType,
}

impl Iu {
    /// Deterministic runtime variable name, derived from the arena id
    /// rather than an address.
    pub fn varname(&self) -> String {
        format!("iu{}", self.id.0)
    }
}

/// Owns every IU created while building a plan.
#[derive(Default)]
pub struct IuArena {
    ius: Vec<Iu>,
}

impl IuArena {
    pub fn new() -> Self {
        IuArena { ius: Vec::new() }
    }

    pub fn fresh_table_column(
        &mut self,
        relation: &str,
        column: &str,
        ty: LogicalType,
    ) -> IuId {
        let id = IuId(self.ius.len());
        self.ius.push(Iu {
            id,
            relation: Some(relation.to_string()),
            column: column.to_string(),
            ty,
        });
        id
    }

    /// An anonymous IU produced by an expression node rather than a scan.
    pub fn fresh_anonymous(&mut self, label: &str, ty: LogicalType) -> IuId {
        let id = IuId(self.ius.len());
        self.ius.push(Iu {
            id,
            relation: None,
            column: label.to_string(),
            ty,
        });
        id
    }

    pub fn get(&self, id: IuId) -> &Iu {
        &self.ius[id.0]
    }
}

/// Maps a globally-unique column name to the IU that produces it, used by
/// the analyzer to resolve references (§4.4).
pub type ColumnIndex = BTreeMap<String, IuId>;
