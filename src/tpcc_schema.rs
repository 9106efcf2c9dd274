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

//! The nine fixed TPC-C relations the database tool bootstraps at
//! startup (§6's CLI contract). Column layout follows the standard
//! TPC-C schema; `customer`'s primary key is `(c_w_id, c_d_id, c_id)` —
//! an original reference implementation we consulted keys it off
//! `(w_id, d_id, d_id)` instead, re-using the district id in place of
//! `c_id`, which is almost certainly a transcription bug rather than
//! intended behavior, so it is not reproduced here.

use crate::storage::RelationSchema;
use crate::types::LogicalType;

const INTEGER: LogicalType = LogicalType::Integer;
const TIMESTAMP: LogicalType = LogicalType::Timestamp;

const fn numeric(l: u32, p: u32) -> LogicalType {
    LogicalType::Numeric { l, p }
}

const fn char(n: u32) -> LogicalType {
    LogicalType::Char { n }
}

const fn varchar(n: u32) -> LogicalType {
    LogicalType::Varchar { n }
}

fn col(name: &str, ty: LogicalType) -> (String, LogicalType) {
    (name.to_string(), ty)
}

fn pk(names: &[&str]) -> Option<Vec<String>> {
    Some(names.iter().map(|s| s.to_string()).collect())
}

pub fn warehouse() -> RelationSchema {
    RelationSchema {
        name: "warehouse".to_string(),
        columns: vec![
            col("w_id", INTEGER),
            col("w_name", varchar(10)),
            col("w_street_1", varchar(20)),
            col("w_street_2", varchar(20)),
            col("w_city", varchar(20)),
            col("w_state", char(2)),
            col("w_zip", char(9)),
            col("w_tax", numeric(4, 4)),
            col("w_ytd", numeric(12, 2)),
        ],
        primary_key: pk(&["w_id"]),
    }
}

pub fn district() -> RelationSchema {
    RelationSchema {
        name: "district".to_string(),
        columns: vec![
            col("d_w_id", INTEGER),
            col("d_id", INTEGER),
            col("d_name", varchar(10)),
            col("d_street_1", varchar(20)),
            col("d_street_2", varchar(20)),
            col("d_city", varchar(20)),
            col("d_state", char(2)),
            col("d_zip", char(9)),
            col("d_tax", numeric(4, 4)),
            col("d_ytd", numeric(12, 2)),
            col("d_next_o_id", INTEGER),
        ],
        primary_key: pk(&["d_w_id", "d_id"]),
    }
}

pub fn customer() -> RelationSchema {
    RelationSchema {
        name: "customer".to_string(),
        columns: vec![
            col("c_w_id", INTEGER),
            col("c_d_id", INTEGER),
            col("c_id", INTEGER),
            col("c_first", varchar(16)),
            col("c_middle", char(2)),
            col("c_last", varchar(16)),
            col("c_street_1", varchar(20)),
            col("c_street_2", varchar(20)),
            col("c_city", varchar(20)),
            col("c_state", char(2)),
            col("c_zip", char(9)),
            col("c_phone", char(16)),
            col("c_since", TIMESTAMP),
            col("c_credit", char(2)),
            col("c_credit_lim", numeric(12, 2)),
            col("c_discount", numeric(4, 4)),
            col("c_balance", numeric(12, 2)),
            col("c_ytd_payment", numeric(12, 2)),
            col("c_payment_cnt", numeric(4, 0)),
            col("c_delivery_cnt", numeric(4, 0)),
            col("c_data", varchar(500)),
        ],
        primary_key: pk(&["c_w_id", "c_d_id", "c_id"]),
    }
}

pub fn history() -> RelationSchema {
    RelationSchema {
        name: "history".to_string(),
        columns: vec![
            col("h_c_id", INTEGER),
            col("h_c_d_id", INTEGER),
            col("h_c_w_id", INTEGER),
            col("h_d_id", INTEGER),
            col("h_w_id", INTEGER),
            col("h_date", TIMESTAMP),
            col("h_amount", numeric(6, 2)),
            col("h_data", varchar(24)),
        ],
        primary_key: None,
    }
}

pub fn neworder() -> RelationSchema {
    RelationSchema {
        name: "neworder".to_string(),
        columns: vec![
            col("no_o_id", INTEGER),
            col("no_d_id", INTEGER),
            col("no_w_id", INTEGER),
        ],
        primary_key: pk(&["no_w_id", "no_d_id", "no_o_id"]),
    }
}

pub fn order() -> RelationSchema {
    RelationSchema {
        name: "order".to_string(),
        columns: vec![
            col("o_id", INTEGER),
            col("o_d_id", INTEGER),
            col("o_w_id", INTEGER),
            col("o_c_id", INTEGER),
            col("o_entry_d", TIMESTAMP),
            col("o_carrier_id", INTEGER),
            col("o_ol_cnt", numeric(2, 0)),
            col("o_all_local", numeric(1, 0)),
        ],
        primary_key: pk(&["o_w_id", "o_d_id", "o_id"]),
    }
}

pub fn orderline() -> RelationSchema {
    RelationSchema {
        name: "orderline".to_string(),
        columns: vec![
            col("ol_o_id", INTEGER),
            col("ol_d_id", INTEGER),
            col("ol_w_id", INTEGER),
            col("ol_number", INTEGER),
            col("ol_i_id", INTEGER),
            col("ol_supply_w_id", INTEGER),
            col("ol_delivery_d", TIMESTAMP),
            col("ol_quantity", numeric(2, 0)),
            col("ol_amount", numeric(6, 2)),
            col("ol_dist_info", char(24)),
        ],
        primary_key: pk(&["ol_w_id", "ol_d_id", "ol_o_id", "ol_number"]),
    }
}

pub fn item() -> RelationSchema {
    RelationSchema {
        name: "item".to_string(),
        columns: vec![
            col("i_id", INTEGER),
            col("i_im_id", INTEGER),
            col("i_name", varchar(24)),
            col("i_price", numeric(5, 2)),
            col("i_data", varchar(50)),
        ],
        primary_key: pk(&["i_id"]),
    }
}

pub fn stock() -> RelationSchema {
    RelationSchema {
        name: "stock".to_string(),
        columns: vec![
            col("s_i_id", INTEGER),
            col("s_w_id", INTEGER),
            col("s_quantity", numeric(4, 0)),
            col("s_dist_01", char(24)),
            col("s_dist_02", char(24)),
            col("s_dist_03", char(24)),
            col("s_dist_04", char(24)),
            col("s_dist_05", char(24)),
            col("s_dist_06", char(24)),
            col("s_dist_07", char(24)),
            col("s_dist_08", char(24)),
            col("s_dist_09", char(24)),
            col("s_dist_10", char(24)),
            col("s_ytd", numeric(8, 0)),
            col("s_order_cnt", numeric(4, 0)),
            col("s_remote_cnt", numeric(4, 0)),
            col("s_data", varchar(50)),
        ],
        primary_key: pk(&["s_w_id", "s_i_id"]),
    }
}

/// All nine relations, in the order the database tool loads them.
pub fn all() -> Vec<RelationSchema> {
    vec![
        warehouse(),
        district(),
        customer(),
        history(),
        neworder(),
        order(),
        orderline(),
        item(),
        stock(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_relations_with_distinct_names() {
        let schemas = all();
        assert_eq!(schemas.len(), 9);
        let mut names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn customer_primary_key_uses_c_id_not_d_id_twice() {
        let c = customer();
        assert_eq!(
            c.primary_key,
            Some(vec!["c_w_id".to_string(), "c_d_id".to_string(), "c_id".to_string()])
        );
    }

    #[test]
    fn history_has_no_primary_key() {
        assert!(history().primary_key.is_none());
    }

    #[test]
    fn every_primary_key_column_is_declared() {
        for schema in all() {
            if let Some(pk) = &schema.primary_key {
                for name in pk {
                    assert!(
                        schema.columns.iter().any(|(n, _)| n == name),
                        "{}: pk column '{}' not declared",
                        schema.name,
                        name
                    );
                }
            }
        }
    }
}
