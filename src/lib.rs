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

//! An in-memory OLTP+OLAP engine for a fixed TPC-C-style schema built
//! around a query-compiling execution pipeline: SQL text is parsed to a
//! restricted AST, resolved to an operator tree, compiled to a native
//! shared object, and dynamically loaded back for execution.
//!
//! The pipeline runs end to end through [`Engine`]: [`ast::parse_line`]
//! produces a [`ast::Query`], [`analyzer::analyze`] turns it into an
//! [`algebra::Operator`] tree, [`algebra::compile_plan`] emits a Rust
//! translation unit, [`compile::Compiler`] builds and loads it, and
//! [`host::run`] calls it against a live [`storage::Database`].

pub mod algebra;
pub mod analyzer;
pub mod ast;
pub mod barrier;
pub mod compile;
pub mod emitter;
pub mod error;
pub mod host;
pub mod iu;
pub mod multimap;
pub mod runtime_support;
pub mod schema;
pub mod storage;
pub mod tpcc_schema;
pub mod types;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use ast::ParsedLine;
use error::QueryError;
use storage::Database;

/// Ties the pipeline stages together and owns the live database plus a
/// monotonic query counter (used both for the scratch file name and, via
/// [`compile::CompiledQuery::query_id`], for diagnostics).
pub struct Engine {
    pub db: Database,
    compiler: compile::Compiler,
    next_query_id: AtomicU64,
}

impl Engine {
    pub fn new(rlib_path: PathBuf) -> Self {
        Engine {
            db: Database::new(),
            compiler: compile::Compiler::new(rlib_path),
            next_query_id: AtomicU64::new(0),
        }
    }

    /// Run one line of input: `exit;` is reported back to the caller as
    /// `Ok(None)`, anything else runs the full pipeline and returns its
    /// exit code wrapped in `Some`.
    pub fn run_line(&mut self, line: &str) -> Result<Option<i32>, QueryError> {
        let parsed = ast::parse_line(line).map_err(QueryError::from)?;
        let query = match parsed {
            ParsedLine::Exit => return Ok(None),
            ParsedLine::Query(q) => q,
        };

        let mut arena = iu::IuArena::new();
        let mut plan = analyzer::analyze(&mut arena, &self.db, &query).map_err(QueryError::from)?;

        let source = algebra::compile_plan(&arena, &mut plan).map_err(QueryError::from)?;

        let query_id = self.next_query_id.fetch_add(1, Ordering::SeqCst);
        let compiled = self
            .compiler
            .compile_and_load(&source, query_id)
            .map_err(QueryError::from)?;

        let code = host::run(&compiled, &self.db).map_err(QueryError::from)?;
        Ok(Some(code))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("relations", &self.db.relations.len())
            .finish()
    }
}
