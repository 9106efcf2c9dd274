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

//! The schema tool (§6's CLI contract): `--in <schema.sql> --out <module.rs>`.
//!
//! The original collaborator this redesigns split its output into a
//! header and a translation unit (`--out_h`/`--out_cc`); a single
//! generated Rust module plays both roles here, so there is only one
//! output path.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "flowbase-schemac", version, about = "Compile a CREATE TABLE schema into a flowbase schema module")]
struct Args {
    /// Path to a file of CREATE TABLE statements
    #[arg(long = "in")]
    input: PathBuf,

    /// Path the generated schema module is written to
    #[arg(long)]
    out: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let sql = match std::fs::read_to_string(&args.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading {}: {e}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let schemas = match flowbase::schema::parse_schema(&sql) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("parse failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let module = flowbase::schema::emit_schema_module(&schemas);
    if let Err(e) = std::fs::write(&args.out, module) {
        eprintln!("error writing {}: {e}", args.out.display());
        return ExitCode::FAILURE;
    }

    println!("wrote {} table(s) to {}", schemas.len(), args.out.display());
    ExitCode::SUCCESS
}
