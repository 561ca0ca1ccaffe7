//! Scalar value sniffing and canonicalization.
//!
//! Cells arrive as raw strings; before any hashing or row comparison they are
//! folded into a canonical form so that `10`, `10.0`, and ` 10 ` (or two
//! spellings of the same date) compare equal. Outer joins widen nullable
//! integer columns to floats in most relational engines, so the float form
//! collapses back to the integer rendering whenever the fraction is zero.

use std::fmt;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

/// Sniffs the most specific scalar type for a raw cell.
///
/// Returns `None` for empty or whitespace-only cells, the CSV rendering of a
/// null. Non-finite float spellings ("NaN", "inf") stay strings so they never
/// collide with genuine numeric cells.
pub fn sniff_value(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(Value::Integer(parsed));
    }
    if let Ok(parsed) = trimmed.parse::<f64>()
        && parsed.is_finite()
    {
        return Some(Value::Float(parsed));
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => return Some(Value::Boolean(true)),
        "false" => return Some(Value::Boolean(false)),
        _ => {}
    }
    if let Ok(parsed) = parse_naive_date(trimmed) {
        return Some(Value::Date(parsed));
    }
    Some(Value::String(trimmed.to_string()))
}

/// Canonical string form of a raw cell; empty string for nulls.
pub fn canonical_value(raw: &str) -> String {
    match sniff_value(raw) {
        Some(value) => value.as_display(),
        None => String::new(),
    }
}
