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

//! The closed set of logical value types (component A).
//!
//! Every type here exposes a stable hash, a total order compatible with
//! equality, a text cast, and a text rendering. Columns (module
//! [`crate::storage`]) store these behind typed vectors rather than as a
//! boxed enum per cell; `Value` is the materialized, single-cell view
//! used by `Relation::read`, predicate evaluation, and `Print`.

use std::cmp::Ordering;
use std::fmt;

use crate::error::ParseError;

/// A declared logical type, carrying the parameters (`L`, `P`, `N`) that
/// distinguish instances of the same type class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Integer,
    Numeric { l: u32, p: u32 },
    Char { n: u32 },
    Varchar { n: u32 },
    Timestamp,
    Bool,
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Integer => write!(f, "Integer"),
            LogicalType::Numeric { l, p } => write!(f, "Numeric({l},{p})"),
            LogicalType::Char { n } => write!(f, "Char({n})"),
            LogicalType::Varchar { n } => write!(f, "Varchar({n})"),
            LogicalType::Timestamp => write!(f, "Timestamp"),
            LogicalType::Bool => write!(f, "Bool"),
        }
    }
}

/// A single materialized value of any logical type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    /// Fixed-point, stored as a 64-bit integer scaled by `10^p`.
    Numeric { raw: i64, l: u32, p: u32 },
    Char { bytes: Vec<u8>, n: u32 },
    Varchar { bytes: Vec<u8>, n: u32 },
    Timestamp(i64),
    Bool(bool),
}

impl Value {
    pub fn logical_type(&self) -> LogicalType {
        match self {
            Value::Integer(_) => LogicalType::Integer,
            Value::Numeric { l, p, .. } => LogicalType::Numeric { l: *l, p: *p },
            Value::Char { n, .. } => LogicalType::Char { n: *n },
            Value::Varchar { n, .. } => LogicalType::Varchar { n: *n },
            Value::Timestamp(_) => LogicalType::Timestamp,
            Value::Bool(_) => LogicalType::Bool,
        }
    }

    /// Self-mixed xorshift of the value's 64-bit representation, or a
    /// byte-wise rotating xor for strings (§4.1).
    pub fn hash(&self) -> u64 {
        match self {
            Value::Integer(v) => xorshift_mix(*v as u64),
            Value::Numeric { raw, .. } => xorshift_mix(*raw as u64),
            Value::Timestamp(v) => xorshift_mix(*v as u64),
            Value::Bool(v) => xorshift_mix(*v as u64),
            Value::Char { bytes, .. } | Value::Varchar { bytes, .. } => rotating_xor(bytes),
        }
    }

    /// Text rendering used by `Print` (and round-trip tests).
    pub fn render(&self) -> String {
        match self {
            Value::Integer(v) => v.to_string(),
            Value::Numeric { raw, p, .. } => render_numeric(*raw, *p),
            Value::Char { bytes, .. } => String::from_utf8_lossy(bytes).trim_start().to_string(),
            Value::Varchar { bytes, .. } => String::from_utf8_lossy(bytes).to_string(),
            Value::Timestamp(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
        }
    }

    /// Cast text into a value of the given logical type (§4.1, §6).
    pub fn cast_from_text(ty: LogicalType, text: &str) -> Result<Value, ParseError> {
        match ty {
            LogicalType::Integer => text
                .trim()
                .parse::<i32>()
                .map(Value::Integer)
                .map_err(|e| ParseError {
                    message: format!("invalid integer '{text}': {e}"),
                    location: None,
                }),
            LogicalType::Numeric { l, p } => parse_numeric(text, l, p),
            LogicalType::Char { n } => {
                let trimmed = text.trim_start();
                let bytes = trimmed.as_bytes();
                if bytes.len() as u32 > n {
                    return Err(ParseError {
                        message: format!("char({n}) overflow: '{text}'"),
                        location: None,
                    });
                }
                Ok(Value::Char {
                    bytes: bytes.to_vec(),
                    n,
                })
            }
            LogicalType::Varchar { n } => {
                let bytes = text.as_bytes();
                if bytes.len() as u32 > n {
                    return Err(ParseError {
                        message: format!("varchar({n}) overflow: '{text}'"),
                        location: None,
                    });
                }
                Ok(Value::Varchar {
                    bytes: bytes.to_vec(),
                    n,
                })
            }
            LogicalType::Timestamp => text
                .trim()
                .parse::<i64>()
                .map(Value::Timestamp)
                .map_err(|e| ParseError {
                    message: format!("invalid timestamp '{text}': {e}"),
                    location: None,
                }),
            LogicalType::Bool => match text.trim() {
                "t" | "true" | "1" => Ok(Value::Bool(true)),
                "f" | "false" | "0" => Ok(Value::Bool(false)),
                other => Err(ParseError {
                    message: format!("invalid bool '{other}'"),
                    location: None,
                }),
            },
        }
    }
}

/// Lexicographic on `min(len, other.len)` then by length (§4.1).
fn cmp_bytes(a: &[u8], b: &[u8]) -> Ordering {
    let n = a.len().min(b.len());
    match a[..n].cmp(&b[..n]) {
        Ordering::Equal => a.len().cmp(&b.len()),
        other => other,
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Numeric { raw: a, .. }, Value::Numeric { raw: b, .. }) => a.partial_cmp(b),
            (Value::Char { bytes: a, .. }, Value::Char { bytes: b, .. }) => {
                Some(cmp_bytes(a, b))
            }
            (Value::Varchar { bytes: a, .. }, Value::Varchar { bytes: b, .. }) => {
                Some(cmp_bytes(a, b))
            }
            (Value::Timestamp(a), Value::Timestamp(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Eq for Value {}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .expect("Ord::cmp called on values of different logical types")
    }
}

fn xorshift_mix(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

fn rotating_xor(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0;
    for &b in bytes {
        h = h.rotate_left(5) ^ (b as u64);
    }
    h
}

fn render_numeric(raw: i64, p: u32) -> String {
    if p == 0 {
        return raw.to_string();
    }
    let scale = 10i64.pow(p);
    let neg = raw < 0;
    let abs = raw.unsigned_abs();
    let int_part = abs / scale as u64;
    let frac_part = abs % scale as u64;
    format!(
        "{}{}.{:0width$}",
        if neg { "-" } else { "" },
        int_part,
        frac_part,
        width = p as usize
    )
}

/// Numeric string parsing: trim spaces, accept optional sign, one `.`,
/// strip trailing fractional zeros, then scale to `p`; reject if integral
/// digits exceed `l - p` or fractional digits exceed `p` (§4.1).
fn parse_numeric(text: &str, l: u32, p: u32) -> Result<Value, ParseError> {
    let trimmed = text.trim();
    let (neg, rest) = match trimmed.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let mut parts = rest.splitn(2, '.');
    let int_digits = parts.next().unwrap_or("");
    let frac_digits = parts.next().unwrap_or("");

    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(ParseError {
            message: format!("invalid numeric literal '{text}'"),
            location: None,
        });
    }
    if !int_digits.chars().all(|c| c.is_ascii_digit())
        || !frac_digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ParseError {
            message: format!("invalid numeric literal '{text}'"),
            location: None,
        });
    }

    let max_int_digits = l.saturating_sub(p);
    let int_digits_trimmed = int_digits.trim_start_matches('0');
    if int_digits_trimmed.len() as u32 > max_int_digits {
        return Err(ParseError {
            message: format!(
                "numeric({l},{p}) overflow: {} integral digits exceeds {max_int_digits}",
                int_digits_trimmed.len()
            ),
            location: None,
        });
    }
    let frac_trimmed = frac_digits.trim_end_matches('0');
    if frac_trimmed.len() as u32 > p {
        return Err(ParseError {
            message: format!(
                "numeric({l},{p}) overflow: {} fractional digits exceeds {p}",
                frac_trimmed.len()
            ),
            location: None,
        });
    }

    let int_val: i64 = if int_digits.is_empty() {
        0
    } else {
        int_digits.parse().map_err(|_| ParseError {
            message: format!("invalid numeric literal '{text}'"),
            location: None,
        })?
    };
    let mut frac_val: i64 = if frac_digits.is_empty() {
        0
    } else {
        frac_digits.parse().map_err(|_| ParseError {
            message: format!("invalid numeric literal '{text}'"),
            location: None,
        })?
    };
    // Scale the fractional part up or down to exactly `p` digits.
    let frac_len = frac_digits.len() as i64;
    let want = p as i64;
    if frac_len < want {
        frac_val *= 10i64.pow((want - frac_len) as u32);
    } else if frac_len > want {
        frac_val /= 10i64.pow((frac_len - want) as u32);
    }

    let scale = 10i64.pow(p);
    let mut raw = int_val * scale + frac_val;
    if neg {
        raw = -raw;
    }
    Ok(Value::Numeric { raw, l, p })
}

/// `Numeric(L,P) * Numeric(L,P) -> Numeric(L, 2P)`: unscaled product of
/// the two raw representations (§3, §8 property 2).
pub fn numeric_mul(a_raw: i64, b_raw: i64, l: u32, p: u32) -> Value {
    Value::Numeric {
        raw: a_raw * b_raw,
        l,
        p: 2 * p,
    }
}

/// `Numeric(L,P) +/- Numeric(L,P) -> Numeric(L,P)` within the same scale.
pub fn numeric_add(a_raw: i64, b_raw: i64, l: u32, p: u32) -> Value {
    Value::Numeric {
        raw: a_raw + b_raw,
        l,
        p,
    }
}

pub fn numeric_sub(a_raw: i64, b_raw: i64, l: u32, p: u32) -> Value {
    Value::Numeric {
        raw: a_raw - b_raw,
        l,
        p,
    }
}

/// Rescale a raw numeric representation from precision `from_p` to `to_p`
/// (used by `castP1`/`castP2`/`castM1`/`castM2`-style shifts, §3).
pub fn rescale(raw: i64, from_p: u32, to_p: u32) -> i64 {
    use std::cmp::Ordering::*;
    match from_p.cmp(&to_p) {
        Equal => raw,
        Less => raw * 10i64.pow(to_p - from_p),
        Greater => raw / 10i64.pow(from_p - to_p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trip() {
        let v = Value::Integer(-42);
        let rendered = v.render();
        let parsed = Value::cast_from_text(LogicalType::Integer, &rendered).unwrap();
        assert_eq!(v, parsed);
    }

    #[test]
    fn numeric_parses_and_renders() {
        let v = Value::cast_from_text(LogicalType::Numeric { l: 6, p: 2 }, "12.3").unwrap();
        assert_eq!(v, Value::Numeric { raw: 1230, l: 6, p: 2 });
        assert_eq!(v.render(), "12.30");
    }

    #[test]
    fn numeric_negative() {
        let v = Value::cast_from_text(LogicalType::Numeric { l: 6, p: 2 }, "-0.05").unwrap();
        assert_eq!(v, Value::Numeric { raw: -5, l: 6, p: 2 });
        assert_eq!(v.render(), "-0.05");
    }

    #[test]
    fn numeric_rejects_excess_integral_digits() {
        let err = Value::cast_from_text(LogicalType::Numeric { l: 4, p: 2 }, "123.45");
        assert!(err.is_err());
    }

    #[test]
    fn numeric_rejects_excess_fractional_digits() {
        let err = Value::cast_from_text(LogicalType::Numeric { l: 6, p: 2 }, "1.234");
        assert!(err.is_err());
    }

    #[test]
    fn numeric_multiplication_doubles_precision() {
        let a = Value::cast_from_text(LogicalType::Numeric { l: 6, p: 2 }, "1.50").unwrap();
        let b = Value::cast_from_text(LogicalType::Numeric { l: 6, p: 2 }, "2.00").unwrap();
        let (a_raw, b_raw) = match (&a, &b) {
            (Value::Numeric { raw: ar, .. }, Value::Numeric { raw: br, .. }) => (*ar, *br),
            _ => unreachable!(),
        };
        let prod = numeric_mul(a_raw, b_raw, 6, 2);
        assert_eq!(prod, Value::Numeric { raw: 150 * 200, l: 6, p: 4 });
    }

    #[test]
    fn char_trims_leading_spaces_on_cast() {
        let v = Value::cast_from_text(LogicalType::Char { n: 20 }, "   hello").unwrap();
        assert_eq!(v.render(), "hello");
    }

    #[test]
    fn string_hash_stable_under_clone() {
        let v = Value::cast_from_text(LogicalType::Varchar { n: 10 }, "abc").unwrap();
        assert_eq!(v.hash(), v.clone().hash());
    }

    #[test]
    fn string_ordering_is_length_then_lex() {
        let a = Value::cast_from_text(LogicalType::Varchar { n: 10 }, "ab").unwrap();
        let b = Value::cast_from_text(LogicalType::Varchar { n: 10 }, "abc").unwrap();
        assert!(a < b);
    }
}
