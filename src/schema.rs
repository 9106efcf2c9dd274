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

//! A minimal DDL compiler (§6's schema contract, supplemental — the spec
//! treats the full schema compiler as an external collaborator and names
//! only the `RelationSchema` shape it must produce).
//!
//! Parses `create table <name> (<col> <type> [not null], ..., [primary
//! key (<col>, ...)]);` into [`RelationSchema`], then emits one Rust
//! module per table declaring a typed `Relation` binding — the redesign
//! of `tools/schemac/schema_compiler.cc`'s header+translation-unit split
//! into a single `.rs` file, reusing the query compiler's [`Emitter`].

use sqlparser::ast::{ColumnOption, DataType, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser as SqlParser;

use crate::emitter::Emitter;
use crate::error::ParseError;
use crate::storage::RelationSchema;
use crate::types::LogicalType;

/// Parse one or more `CREATE TABLE` statements into relation schemas, in
/// the order they appear.
pub fn parse_schema(sql: &str) -> Result<Vec<RelationSchema>, ParseError> {
    let dialect = GenericDialect {};
    let statements = SqlParser::parse_sql(&dialect, sql).map_err(|e| ParseError {
        message: e.to_string(),
        location: None,
    })?;

    let mut schemas = Vec::with_capacity(statements.len());
    for stmt in statements {
        let Statement::CreateTable(create) = stmt else {
            return Err(ParseError {
                message: "schema source must contain only CREATE TABLE statements".into(),
                location: None,
            });
        };
        let name = create.name.to_string();
        let mut columns = Vec::with_capacity(create.columns.len());
        let mut primary_key: Option<Vec<String>> = None;

        for col in &create.columns {
            let ty = logical_type_of(&col.data_type).ok_or_else(|| ParseError {
                message: format!("unsupported column type for '{}': {:?}", col.name, col.data_type),
                location: None,
            })?;
            columns.push((col.name.value.clone(), ty));
            for opt in &col.options {
                if matches!(opt.option, ColumnOption::Unique { is_primary: true, .. }) {
                    primary_key
                        .get_or_insert_with(Vec::new)
                        .push(col.name.value.clone());
                }
            }
        }

        for constraint in &create.constraints {
            if let sqlparser::ast::TableConstraint::PrimaryKey { columns: pk_cols, .. } = constraint {
                let names = pk_cols.iter().map(|c| c.to_string()).collect();
                primary_key = Some(names);
            }
        }

        schemas.push(RelationSchema {
            name,
            columns,
            primary_key,
        });
    }
    Ok(schemas)
}

fn logical_type_of(ty: &DataType) -> Option<LogicalType> {
    match ty {
        DataType::Int(_) | DataType::Integer(_) => Some(LogicalType::Integer),
        DataType::Char(Some(len)) => Some(LogicalType::Char {
            n: char_len(len),
        }),
        DataType::Varchar(Some(len)) => Some(LogicalType::Varchar {
            n: char_len(len),
        }),
        DataType::Numeric(info) | DataType::Decimal(info) => match info {
            sqlparser::ast::ExactNumberInfo::PrecisionAndScale(l, p) => Some(LogicalType::Numeric {
                l: *l as u32,
                p: *p as u32,
            }),
            _ => None,
        },
        DataType::Timestamp(..) => Some(LogicalType::Timestamp),
        DataType::Boolean => Some(LogicalType::Bool),
        _ => None,
    }
}

fn char_len(len: &sqlparser::ast::CharacterLength) -> u32 {
    match len {
        sqlparser::ast::CharacterLength::IntegerLength { length, .. } => *length as u32,
        sqlparser::ast::CharacterLength::Max => u32::MAX,
    }
}

fn rust_field_type(ty: LogicalType) -> &'static str {
    match ty {
        LogicalType::Integer => "i32",
        LogicalType::Numeric { .. } => "i64",
        LogicalType::Char { .. } | LogicalType::Varchar { .. } => "Vec<u8>",
        LogicalType::Timestamp => "i64",
        LogicalType::Bool => "bool",
    }
}

fn logical_type_ctor(ty: LogicalType) -> String {
    match ty {
        LogicalType::Integer => "flowbase::types::LogicalType::Integer".to_string(),
        LogicalType::Numeric { l, p } => {
            format!("flowbase::types::LogicalType::Numeric {{ l: {l}, p: {p} }}")
        }
        LogicalType::Char { n } => format!("flowbase::types::LogicalType::Char {{ n: {n} }}"),
        LogicalType::Varchar { n } => format!("flowbase::types::LogicalType::Varchar {{ n: {n} }}"),
        LogicalType::Timestamp => "flowbase::types::LogicalType::Timestamp".to_string(),
        LogicalType::Bool => "flowbase::types::LogicalType::Bool".to_string(),
    }
}

/// Emit one Rust module declaring a `TupleType` alias, an optional
/// `PKType` alias, and a `schema()` constructor function per table — the
/// single-file stand-in for `schema_compiler.cc`'s `out_h`/`out_cc` pair.
pub fn emit_schema_module(tables: &[RelationSchema]) -> String {
    let mut e = Emitter::new();
    e.line("// Generated schema module. Do not edit by hand.");
    e.blank();
    for table in tables {
        let struct_name = format!("table_{}", table.name);
        let tuple_fields: Vec<&'static str> = table.columns.iter().map(|(_, ty)| rust_field_type(*ty)).collect();
        e.stmt(&format!(
            "pub type {struct_name}TupleType = ({},)",
            tuple_fields.join(", ")
        ));
        if let Some(pk) = &table.primary_key {
            let pk_fields: Vec<&'static str> = pk
                .iter()
                .map(|name| {
                    let (_, ty) = table
                        .columns
                        .iter()
                        .find(|(n, _)| n == name)
                        .expect("primary key column must be declared");
                    rust_field_type(*ty)
                })
                .collect();
            e.stmt(&format!(
                "pub type {struct_name}PKType = ({},)",
                pk_fields.join(", ")
            ));
        }
        {
            let mut scope_header = String::new();
            scope_header.push_str(&format!("pub fn {struct_name}_schema() -> flowbase::storage::RelationSchema"));
            let mut scope = e.scope(&scope_header);
            let s = scope.emitter();
            s.line(&format!("flowbase::storage::RelationSchema {{"));
            s.line(&format!("    name: {:?}.to_string(),", table.name));
            s.line("    columns: vec![");
            for (name, ty) in &table.columns {
                s.line(&format!("        ({:?}.to_string(), {}),", name, logical_type_ctor(*ty)));
            }
            s.line("    ],");
            match &table.primary_key {
                Some(pk) => {
                    let names: Vec<String> = pk.iter().map(|n| format!("{n:?}.to_string()")).collect();
                    s.line(&format!("    primary_key: Some(vec![{}]),", names.join(", ")));
                }
                None => s.line("    primary_key: None,"),
            }
            s.line("}")
        }
        e.blank();
    }
    e.into_source()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_s5_scenario_ddl() {
        let schemas =
            parse_schema("create table foo (c1 integer not null, c2 char(20) not null, primary key (c1));")
                .unwrap();
        assert_eq!(schemas.len(), 1);
        let foo = &schemas[0];
        assert_eq!(foo.name, "foo");
        assert_eq!(foo.columns.len(), 2);
        assert_eq!(foo.columns[0], ("c1".to_string(), LogicalType::Integer));
        assert_eq!(foo.columns[1], ("c2".to_string(), LogicalType::Char { n: 20 }));
        assert_eq!(foo.primary_key, Some(vec!["c1".to_string()]));
    }

    #[test]
    fn rejects_non_create_table_statements() {
        let err = parse_schema("select 1;");
        assert!(err.is_err());
    }

    #[test]
    fn emits_a_schema_constructor_per_table() {
        let schemas = parse_schema(
            "create table warehouse (w_id integer not null, w_name varchar(10) not null, primary key (w_id));",
        )
        .unwrap();
        let src = emit_schema_module(&schemas);
        assert!(src.contains("fn table_warehouse_schema"));
        assert!(src.contains("w_id"));
        assert!(src.contains("primary_key: Some(vec![\"w_id\".to_string()])"));
    }
}
