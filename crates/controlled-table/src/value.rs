//! Scalar cell values.
//!
//! Every record field a column can read or write is a [`CellValue`]. The editing
//! layer treats values as opaque display strings; turning a raw string back
//! into a typed value is the column's job (see `ColumnDef::parser`).

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A displayable, editable scalar.
///
/// Serializes untagged, so a record dumps to JSON the way a host would expect:
/// `{"age": 40}` for a number and `{"age": "40"}` after a raw string edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Integer data.
    Int(i64),
    /// Floating point data.
    Float(f64),
    /// String data.
    Text(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl CellValue {
    /// Wraps raw editor input without any coercion.
    pub fn from_input(raw: &str) -> Self {
        CellValue::Text(raw.to_string())
    }

    /// Parses raw input as a number, falling back to text.
    ///
    /// Intended as a column parser for numeric fields.
    pub fn parse_number(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            CellValue::Int(n)
        } else if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                CellValue::Float(n)
            } else {
                CellValue::Text(raw.to_string())
            }
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    /// Returns `true` for `Int` and `Float`.
    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Int(_) | CellValue::Float(_))
    }

    /// Attempts to get the value as a string slice.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(n) => Some(*n as f64),
            CellValue::Float(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }

    /// The string an editor starts from.
    pub fn to_input(&self) -> String {
        self.to_string()
    }

    /// Ordering used by the sort stage of the view-model.
    ///
    /// Numbers compare numerically and sort before text; text compares
    /// lexically.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(n) => write!(f, "{n}"),
            CellValue::Float(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Int(n as i64)
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Int(n as i64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Float(n)
    }
}
