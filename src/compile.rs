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

//! Compile-and-load (component I): write the generated translation unit
//! to a scratch directory, shell out to a native compiler, then
//! `dlopen`/`dlsym` the result (§4.7).
//!
//! §9 redesigns the "native compiler" away from the original's
//! `g++`/`gcc` toolchain invocation (`data/fork_example.cc`'s
//! fork+exec pattern) toward `rustc --crate-type cdylib`, since the
//! generated translation unit here is already Rust source rather than
//! C++. The generated crate is linked against this crate's own compiled
//! rlib with `--extern flowbase=<path>`, so `flowbase::storage::Database`
//! on both sides of the `dlopen` boundary is the exact same type — the
//! loaded symbol can take it by reference rather than an opaque pointer.
//! `dlopen`/`dlsym` themselves are realized with `libloading`, the
//! closest safe-Rust analogue to `data/dlopen/main.cc`.

use std::path::{Path, PathBuf};
use std::process::Command;

use libloading::{Library, Symbol};
use tempfile::TempDir;

use crate::error::{CompileError, LoadError};
use crate::storage::Database;

/// Signature every compiled query exposes under the name
/// `execute_query` (§6's generated-translation-unit contract).
pub type ExecuteQueryFn = unsafe extern "C" fn(&Database) -> i32;

/// One freshly compiled query: keeps its scratch directory and loaded
/// library alive for as long as the query might still run. Dropping it
/// removes the scratch directory and `dlclose`s the library.
pub struct CompiledQuery {
    _scratch: TempDir,
    library: Library,
    query_id: u64,
}

impl CompiledQuery {
    pub fn query_id(&self) -> u64 {
        self.query_id
    }

    /// Resolve and call `execute_query`. Unsafe because the loaded
    /// symbol's signature is trusted, not checked — the component I
    /// contract is that whatever [`compile`] fed `rustc` emits exactly
    /// this signature under exactly this name.
    pub fn execute(&self, db: &Database) -> Result<i32, LoadError> {
        let symbol: Symbol<ExecuteQueryFn> = unsafe {
            self.library
                .get(b"execute_query\0")
                .map_err(|e| LoadError(format!("failed to resolve 'execute_query': {e}")))?
        };
        Ok(unsafe { symbol(db) })
    }
}

/// Where to find the `rustc` binary and this crate's own compiled rlib,
/// which the generated crate links against. `rlib_path` is supplied by
/// the caller (the REPL resolves it once at startup, e.g. from
/// `target/debug/libflowbase.rlib` next to its own executable) rather
/// than guessed here.
pub struct Compiler {
    pub rustc: PathBuf,
    pub rlib_path: PathBuf,
}

impl Compiler {
    pub fn new(rlib_path: impl Into<PathBuf>) -> Self {
        Compiler {
            rustc: PathBuf::from("rustc"),
            rlib_path: rlib_path.into(),
        }
    }

    /// Write `source` to a fresh scratch directory, compile it as a
    /// `cdylib`, and load the result. `query_id` is whatever monotonic
    /// counter the caller uses to keep generated file names unique and
    /// stable across repeated queries (§8 property 6 / §9).
    pub fn compile_and_load(&self, source: &str, query_id: u64) -> Result<CompiledQuery, CompileError> {
        let scratch = TempDir::new().map_err(|e| CompileError {
            diagnostics: format!("failed to create scratch directory: {e}"),
        })?;
        let src_path = scratch.path().join(format!("query_{query_id}.rs"));
        std::fs::write(&src_path, source).map_err(|e| CompileError {
            diagnostics: format!("failed to write generated source: {e}"),
        })?;
        let out_path = scratch.path().join(library_file_name(query_id));

        let output = Command::new(&self.rustc)
            .arg("--crate-type")
            .arg("cdylib")
            .arg("--edition")
            .arg("2021")
            .arg("-O")
            .arg("--extern")
            .arg(format!("flowbase={}", self.rlib_path.display()))
            .arg("-o")
            .arg(&out_path)
            .arg(&src_path)
            .output()
            .map_err(|e| CompileError {
                diagnostics: format!("failed to spawn rustc: {e}"),
            })?;

        if !output.status.success() {
            return Err(CompileError {
                diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let library = unsafe { Library::new(&out_path) }.map_err(|e| CompileError {
            diagnostics: format!("failed to load compiled query: {e}"),
        })?;

        Ok(CompiledQuery {
            _scratch: scratch,
            library,
            query_id,
        })
    }
}

fn library_file_name(query_id: u64) -> String {
    if cfg!(target_os = "macos") {
        format!("libquery_{query_id}.dylib")
    } else if cfg!(target_os = "windows") {
        format!("query_{query_id}.dll")
    } else {
        format!("libquery_{query_id}.so")
    }
}

/// Best-effort discovery of this crate's own rlib, for a caller that
/// hasn't been told where it lives explicitly. Looks next to the
/// current executable for `target/{debug,release}/libflowbase.rlib`,
/// walking upward a few levels the way a `cargo run` binary's
/// `current_exe` sits under `target/<profile>/`.
pub fn discover_rlib_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let mut dir = exe.parent()?;
    for _ in 0..4 {
        let candidate = dir.join("libflowbase.rlib");
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
    None
}

pub fn ensure_rlib(explicit: Option<&Path>) -> Result<PathBuf, CompileError> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    discover_rlib_path().ok_or_else(|| CompileError {
        diagnostics: "could not locate libflowbase.rlib; pass --rlib explicitly".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_file_name_matches_this_platform() {
        let name = library_file_name(7);
        assert!(name.contains("query_7"));
    }

    #[test]
    fn ensure_rlib_passes_through_an_explicit_path() {
        let p = ensure_rlib(Some(Path::new("/tmp/libflowbase.rlib"))).unwrap();
        assert_eq!(p, PathBuf::from("/tmp/libflowbase.rlib"));
    }
}
