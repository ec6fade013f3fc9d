//! Cell values and column types.
//!
//! A [`Table`](crate::Table) column holds values of exactly one
//! [`ColumnType`]. [`Value`] is the owned, row-oriented view of a single cell,
//! used for edits, predicate operands and column extraction.

use std::{fmt, str::FromStr};

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// UTF-8 text (`Utf8`).
    Text,
    /// 64-bit signed integer (`Int64`).
    Int,
    /// 64-bit float (`Float64`).
    Float,
}

impl ColumnType {
    /// The Arrow data type backing this column type.
    #[must_use]
    pub fn data_type(self) -> DataType {
        match self {
            Self::Text => DataType::Utf8,
            Self::Int => DataType::Int64,
            Self::Float => DataType::Float64,
        }
    }

    /// Maps a normalized Arrow data type back to a column type.
    #[must_use]
    pub fn from_data_type(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Utf8 => Some(Self::Text),
            DataType::Int64 => Some(Self::Int),
            DataType::Float64 => Some(Self::Float),
            _ => None,
        }
    }

    /// Whether range and ordering operators apply to this type.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// The value a freshly added column is filled with.
    #[must_use]
    pub fn zero_value(self) -> Value {
        match self {
            Self::Text => Value::Text(String::new()),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Float => "float",
        };
        f.write_str(name)
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "str" | "string" | "utf8" => Ok(Self::Text),
            "int" | "integer" | "int64" => Ok(Self::Int),
            "float" | "double" | "float64" => Ok(Self::Float),
            other => Err(Error::parse(format!(
                "Unknown column type: '{}'. Use: text, int, float",
                other
            ))),
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    Null,
    /// Text value.
    Text(String),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value, if it has one.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }

    /// Text representation used by substring matching and text columns.
    ///
    /// `None` for null.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Converts the value to `target`, or `None` when it cannot be.
    ///
    /// Null converts to null of any type. Floats convert to integers only
    /// when they hold an exact integral value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn coerce_to(&self, target: ColumnType) -> Option<Self> {
        match (self, target) {
            (Self::Null, _) => Some(Self::Null),
            (v, ColumnType::Text) => v.as_text().map(Self::Text),
            (Self::Int(i), ColumnType::Int) => Some(Self::Int(*i)),
            (Self::Int(i), ColumnType::Float) => Some(Self::Float(*i as f64)),
            (Self::Float(f), ColumnType::Float) => Some(Self::Float(*f)),
            (Self::Float(f), ColumnType::Int) => float_to_int(*f).map(Self::Int),
            (Self::Text(s), ColumnType::Int) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(float_to_int))
                    .map(Self::Int)
            }
            (Self::Text(s), ColumnType::Float) => s.trim().parse::<f64>().ok().map(Self::Float),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_int(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{}", i),
            // Debug keeps the trailing ".0" on integral floats
            Self::Float(x) => write!(f, "{:?}", x),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
