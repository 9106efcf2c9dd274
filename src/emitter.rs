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

//! Streaming code emitter (component G): an indented statement/block
//! writer with no semantic knowledge of what it's writing. Identifier
//! generation is entirely the caller's responsibility (see
//! [`crate::iu::Iu::varname`]).

/// Indented writer producing plain Rust source text.
pub struct Emitter {
    out: String,
    indent: usize,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter {
            out: String::new(),
            indent: 0,
        }
    }

    fn pad(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    /// Emit one statement: indent + text + `;` + newline.
    pub fn stmt(&mut self, text: &str) {
        self.pad();
        self.out.push_str(text);
        self.out.push_str(";\n");
    }

    /// Emit one flow line: indent + text + newline, no terminator.
    pub fn line(&mut self, text: &str) {
        self.pad();
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Open an indented `{ ... }` scope headed by `header`. The returned
    /// guard emits the closing brace (at the pre-open indent level) on
    /// drop, regardless of how the caller's code path exits.
    pub fn scope<'a>(&'a mut self, header: &str) -> Scope<'a> {
        self.pad();
        self.out.push_str(header);
        self.out.push_str(" {\n");
        self.indent += 1;
        Scope { emitter: self }
    }

    /// Open a scope without borrowing the emitter across the body that
    /// fills it in. Pairs with [`Emitter::close_scope`]. Operator codegen
    /// uses this form (rather than [`Emitter::scope`]) whenever the scope
    /// body needs to call back into the full codegen context, which a
    /// borrowed [`Scope`] guard can't allow.
    pub fn open_scope(&mut self, header: &str) {
        self.pad();
        self.out.push_str(header);
        self.out.push_str(" {\n");
        self.indent += 1;
    }

    pub fn close_scope(&mut self) {
        self.indent -= 1;
        self.pad();
        self.out.push_str("}\n");
    }

    pub fn into_source(self) -> String {
        self.out
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped handle guaranteeing the closing delimiter is written exactly
/// once, even if the caller returns early via `?`.
pub struct Scope<'a> {
    emitter: &'a mut Emitter,
}

impl<'a> Scope<'a> {
    pub fn emitter(&mut self) -> &mut Emitter {
        self.emitter
    }
}

impl<'a> Drop for Scope<'a> {
    fn drop(&mut self) {
        self.emitter.indent -= 1;
        self.emitter.pad();
        self.emitter.out.push_str("}\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_close_scope_pairs_like_the_guard() {
        let mut e = Emitter::new();
        e.open_scope("for i in 0..10");
        e.stmt("println!(\"{}\", i)");
        e.close_scope();
        assert_eq!(
            e.into_source(),
            "for i in 0..10 {\n    println!(\"{}\", i);\n}\n"
        );
    }

    #[test]
    fn scope_closes_on_drop() {
        let mut e = Emitter::new();
        {
            let mut s = e.scope("for i in 0..10");
            s.emitter().stmt("println!(\"{}\", i)");
        }
        let src = e.into_source();
        assert_eq!(src, "for i in 0..10 {\n    println!(\"{}\", i);\n}\n");
    }

    #[test]
    fn nested_scopes_indent_correctly() {
        let mut e = Emitter::new();
        {
            let mut outer = e.scope("fn f()");
            {
                let mut inner = outer.emitter().scope("if true");
                inner.emitter().stmt("x()");
            }
            outer.emitter().stmt("y()");
        }
        let src = e.into_source();
        assert_eq!(
            src,
            "fn f() {\n    if true {\n        x();\n    }\n    y();\n}\n"
        );
    }
}
