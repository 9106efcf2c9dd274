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

//! Error kinds for every phase of the query pipeline, grouped the way the
//! REPL reports them: `"<phase> failed: <message>"`.

use std::fmt;

/// A location in SQL source text, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Parse/lex error: surfaces a location and a message, fatal to the query.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: Option<Location>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(f, "{loc}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Semantic error: unresolved relation/column, ambiguous column, type
/// mismatch, cross-product required, self-join.
#[derive(Debug, Clone)]
pub struct SemanticError(pub String);

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SemanticError {}

/// Codegen error: a state invariant was violated. Always a programmer bug.
#[derive(Debug, Clone)]
pub struct CodegenError(pub String);

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CodegenError {}

/// Compile error: the external compiler returned non-zero. `diagnostics`
/// is its stderr, surfaced verbatim.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub diagnostics: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compiler returned an error:\n{}", self.diagnostics)
    }
}

impl std::error::Error for CompileError {}

/// Load/link error: the dynamic loader failed to open the object or
/// resolve the entry symbol.
#[derive(Debug, Clone)]
pub struct LoadError(pub String);

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for LoadError {}

/// Runtime error during execution of the compiled query function.
#[derive(Debug, Clone)]
pub struct RuntimeError(pub String);

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RuntimeError {}

/// Transaction-scoped rollback, reserved for the TPC-C driver (not this
/// crate's core); recoverable, unlike every other kind here.
#[derive(Debug, Clone)]
pub struct TransactionRollback(pub String);

impl fmt::Display for TransactionRollback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction rolled back: {}", self.0)
    }
}

impl std::error::Error for TransactionRollback {}

/// The phase a `QueryError` originated in, used for the REPL's
/// `"<phase> failed: <message>"` diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Analyze,
    Codegen,
    Compile,
    Load,
    Execute,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Parse => "parse",
            Phase::Analyze => "analyze",
            Phase::Codegen => "codegen",
            Phase::Compile => "compile",
            Phase::Load => "load",
            Phase::Execute => "execute",
        };
        f.write_str(s)
    }
}

/// Any error that can terminate processing of one query, tagged with the
/// phase it occurred in.
#[derive(Debug, Clone)]
pub struct QueryError {
    pub phase: Phase,
    pub message: String,
}

impl QueryError {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        QueryError {
            phase,
            message: message.into(),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.phase, self.message)
    }
}

impl std::error::Error for QueryError {}

macro_rules! from_phase {
    ($err:ty, $phase:expr) => {
        impl From<$err> for QueryError {
            fn from(e: $err) -> Self {
                QueryError::new($phase, e.to_string())
            }
        }
    };
}

from_phase!(ParseError, Phase::Parse);
from_phase!(SemanticError, Phase::Analyze);
from_phase!(CodegenError, Phase::Codegen);
from_phase!(CompileError, Phase::Compile);
from_phase!(LoadError, Phase::Load);
from_phase!(RuntimeError, Phase::Execute);
