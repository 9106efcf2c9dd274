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

//! The database tool (§6's CLI contract): loads the nine fixed TPC-C
//! relation files from `--include-dir`, then drops into a `reedline`
//! REPL that runs each line through [`flowbase::Engine::run_line`].

mod prompt;
mod theme;
mod validator;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use reedline::{Reedline, Signal};

use flowbase::compile;
use flowbase::storage::RelationSchema;
use flowbase::Engine;
use prompt::SqlPrompt;
use validator::SqlValidator;

#[derive(Parser)]
#[command(name = "flowbase", version, about = "In-memory TPC-C engine with a query-compiling pipeline")]
struct Args {
    /// Directory containing the nine tpcc_<relation>.tbl files
    #[arg(long)]
    include_dir: PathBuf,

    /// Path to this crate's own compiled rlib (generated queries link
    /// against it). Auto-discovered next to the running executable when
    /// omitted.
    #[arg(long)]
    rlib: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let rlib_path = match compile::ensure_rlib(args.rlib.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{}Error: {e}{}", theme::ERROR, theme::R);
            return ExitCode::FAILURE;
        }
    };

    let mut engine = Engine::new(rlib_path);

    for schema in flowbase::tpcc_schema::all() {
        if let Err(code) = load_relation(&mut engine, &args.include_dir, schema) {
            return code;
        }
    }

    run_repl(&mut engine);
    ExitCode::SUCCESS
}

/// Create the relation and bulk-load `tpcc_<name>.tbl` from
/// `include_dir`, printing its row count on success (§6's bulk-load
/// contract).
fn load_relation(engine: &mut Engine, include_dir: &std::path::Path, schema: RelationSchema) -> Result<(), ExitCode> {
    let name = schema.name.clone();
    engine.db.create_relation(schema);

    let path = include_dir.join(format!("tpcc_{name}.tbl"));
    let file = File::open(&path).map_err(|e| {
        eprintln!(
            "{}Error: failed to open {}: {e}{}",
            theme::ERROR,
            path.display(),
            theme::R
        );
        ExitCode::FAILURE
    })?;

    let relation = engine
        .db
        .relation_mut(&name)
        .expect("relation was just created");
    let loaded = relation.load_rows(BufReader::new(file)).map_err(|(lineno, e)| {
        eprintln!(
            "{}Error: {}:{lineno}: {e}{}",
            theme::ERROR,
            path.display(),
            theme::R
        );
        ExitCode::FAILURE
    })?;

    println!("{}{name:<12}{} {loaded} rows", theme::SUCCESS, theme::R);
    Ok(())
}

fn run_repl(engine: &mut Engine) {
    println!();
    println!("Enter query to execute - or 'exit;' to quit");

    let mut editor = Reedline::create().with_validator(Box::new(SqlValidator));
    let prompt = SqlPrompt;

    loop {
        match editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match engine.run_line(trimmed) {
                    Ok(None) => break,
                    Ok(Some(code)) => {
                        if code != 0 {
                            eprintln!("{}query exited with code {code}{}", theme::ERROR, theme::R);
                        }
                    }
                    Err(e) => eprintln!("{}{e}{}", theme::ERROR, theme::R),
                }
            }
            Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => break,
            Err(e) => {
                eprintln!("{}Error: {e}{}", theme::ERROR, theme::R);
                break;
            }
        }
    }
}
