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

//! Generated query host (component J): the one place that actually calls
//! into a `dlopen`ed query. A generated `execute_query` panics instead of
//! returning an error (§4.5's accessors panic on a schema mismatch, and
//! `unwrap`/`expect` inside emitted arithmetic would too) — any such
//! panic must not be allowed to unwind across the `cdylib` boundary, so
//! it's caught here and turned into the query's [`RuntimeError`] instead
//! of aborting the whole process.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::compile::CompiledQuery;
use crate::error::RuntimeError;
use crate::storage::Database;

/// Run one compiled query against `db`. `Ok` carries whatever exit code
/// `execute_query` returned (`0` on success, by convention — see
/// [`crate::algebra::compile_plan`]).
pub fn run(query: &CompiledQuery, db: &Database) -> Result<i32, RuntimeError> {
    let result = catch_unwind(AssertUnwindSafe(|| query.execute(db)));
    match result {
        Ok(Ok(code)) => Ok(code),
        Ok(Err(load_err)) => Err(RuntimeError(load_err.0)),
        Err(panic) => {
            let message = panic_message(&panic);
            Err(RuntimeError(format!(
                "query {} panicked: {message}",
                query.query_id()
            )))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
