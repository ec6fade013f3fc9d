//! Row filters: substring search, numeric range and typed predicates.

use std::{fmt, str::FromStr};

use arrow::array::{BooleanArray, RecordBatch};

use super::{MaskFilter, Transform};
use crate::{
    error::{Error, Result},
    table::column::column_values,
    value::{ColumnType, Value},
};

/// Looks up a column of a normalized batch and reads its values.
fn column_of(batch: &RecordBatch, name: &str) -> Result<(ColumnType, Vec<Value>)> {
    let schema = batch.schema();
    let (idx, field) = schema
        .column_with_name(name)
        .ok_or_else(|| Error::column_not_found(name))?;
    let ty = ColumnType::from_data_type(field.data_type()).ok_or_else(|| {
        Error::schema_mismatch(format!(
            "column '{}' has unnormalized type {}",
            name,
            field.data_type()
        ))
    })?;
    let values = column_values(batch.column(idx).as_ref(), ty)?;
    Ok((ty, values))
}

/// Substring search over the text representation of a column.
///
/// Null cells never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contains {
    column: String,
    term: String,
    ignore_case: bool,
}

impl Contains {
    /// Case-sensitive search.
    pub fn new(column: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            term: term.into(),
            ignore_case: false,
        }
    }

    /// Case-insensitive search.
    pub fn case_insensitive(column: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            ignore_case: true,
            ..Self::new(column, term)
        }
    }

    fn matches(&self, needle: &str, value: &Value) -> bool {
        match value.as_text() {
            Some(text) if self.ignore_case => text.to_lowercase().contains(needle),
            Some(text) => text.contains(needle),
            None => false,
        }
    }

    fn row_mask(&self, batch: &RecordBatch) -> Result<Vec<bool>> {
        let (_, values) = column_of(batch, &self.column)?;
        let needle = if self.ignore_case {
            self.term.to_lowercase()
        } else {
            self.term.clone()
        };
        Ok(values.iter().map(|v| self.matches(&needle, v)).collect())
    }
}

impl Transform for Contains {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        MaskFilter::new(|b: &RecordBatch| self.row_mask(b).map(BooleanArray::from)).apply(batch)
    }
}

/// Keeps rows whose integer or float column lies in `[min, max]`.
///
/// Null cells never match.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    column: String,
    min: f64,
    max: f64,
}

impl Range {
    /// Creates a range filter. Bounds are not reordered.
    pub fn new(column: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            column: column.into(),
            min,
            max,
        }
    }
}

impl Range {
    fn row_mask(&self, batch: &RecordBatch) -> Result<Vec<bool>> {
        let (ty, values) = column_of(batch, &self.column)?;
        if !ty.is_numeric() {
            return Err(Error::type_coercion(
                format!("range filter on '{}'", self.column),
                format!("column is {}, not numeric", ty),
            ));
        }
        let (min, max) = (self.min, self.max);
        Ok(values
            .iter()
            .map(|v| v.as_f64().is_some_and(|x| x >= min && x <= max))
            .collect())
    }
}

impl Transform for Range {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        MaskFilter::new(|b: &RecordBatch| self.row_mask(b).map(BooleanArray::from)).apply(batch)
    }
}

/// The condition half of a [`Predicate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Cell equals the operand after coercion to the column type.
    Equals(Value),
    /// Text representation contains the operand (case-sensitive).
    Contains(Value),
    /// Cell is strictly greater than the operand.
    GreaterThan(Value),
    /// Cell is strictly less than the operand.
    LessThan(Value),
    /// Cell lies in `[low, high]`.
    Between(Value, Value),
}

impl Condition {
    fn keyword(&self) -> &'static str {
        match self {
            Self::Equals(_) => "=",
            Self::Contains(_) => "contains",
            Self::GreaterThan(_) => ">",
            Self::LessThan(_) => "<",
            Self::Between(..) => "between",
        }
    }
}

/// A single filter condition on a named column.
///
/// # Example
///
/// ```
/// use datasheet::{Predicate, Table};
///
/// let table = Table::sample().unwrap();
/// let older: Predicate = "age > 28".parse().unwrap();
/// let in_lyon = Predicate::equals("ville", "Lyon");
///
/// let result = table.filter_advanced(&[older, in_lyon]).unwrap();
/// assert_eq!(result.row_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: String,
    condition: Condition,
}

impl Predicate {
    /// Creates a predicate.
    pub fn new(column: impl Into<String>, condition: Condition) -> Self {
        Self {
            column: column.into(),
            condition,
        }
    }

    /// `column = operand`.
    pub fn equals(column: impl Into<String>, operand: impl Into<Value>) -> Self {
        Self::new(column, Condition::Equals(operand.into()))
    }

    /// `column contains operand`.
    pub fn contains(column: impl Into<String>, operand: impl Into<Value>) -> Self {
        Self::new(column, Condition::Contains(operand.into()))
    }

    /// `column > operand`.
    pub fn greater_than(column: impl Into<String>, operand: impl Into<Value>) -> Self {
        Self::new(column, Condition::GreaterThan(operand.into()))
    }

    /// `column < operand`.
    pub fn less_than(column: impl Into<String>, operand: impl Into<Value>) -> Self {
        Self::new(column, Condition::LessThan(operand.into()))
    }

    /// `low <= column <= high`.
    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::new(column, Condition::Between(low.into(), high.into()))
    }

    /// The column this predicate reads.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The condition applied to the column.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    fn coercion_error(&self, message: impl Into<String>) -> Error {
        Error::type_coercion(format!("predicate '{}'", self), message)
    }

    fn typed_operand(&self, operand: &Value, ty: ColumnType) -> Result<Value> {
        operand
            .coerce_to(ty)
            .ok_or_else(|| self.coercion_error(format!("'{}' is not a valid {}", operand, ty)))
    }

    fn numeric_operand(&self, operand: &Value, ty: ColumnType) -> Result<f64> {
        if !ty.is_numeric() {
            return Err(self.coercion_error(format!(
                "'{}' compares numerically but the column is {}",
                self.condition.keyword(),
                ty
            )));
        }
        operand
            .coerce_to(ColumnType::Float)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| self.coercion_error(format!("'{}' is not a number", operand)))
    }

    fn row_mask(&self, batch: &RecordBatch) -> Result<Vec<bool>> {
        let (ty, values) = column_of(batch, &self.column)?;
        let mask = match &self.condition {
            Condition::Equals(operand) => {
                let target = self.typed_operand(operand, ty)?;
                values
                    .iter()
                    .map(|v| !v.is_null() && *v == target)
                    .collect()
            }
            Condition::Contains(operand) => {
                let needle = operand
                    .as_text()
                    .ok_or_else(|| self.coercion_error("a null operand has no text"))?;
                values
                    .iter()
                    .map(|v| v.as_text().is_some_and(|t| t.contains(&needle)))
                    .collect()
            }
            Condition::GreaterThan(operand) => {
                let bound = self.numeric_operand(operand, ty)?;
                values
                    .iter()
                    .map(|v| v.as_f64().is_some_and(|x| x > bound))
                    .collect()
            }
            Condition::LessThan(operand) => {
                let bound = self.numeric_operand(operand, ty)?;
                values
                    .iter()
                    .map(|v| v.as_f64().is_some_and(|x| x < bound))
                    .collect()
            }
            Condition::Between(low, high) => {
                let low = self.numeric_operand(low, ty)?;
                let high = self.numeric_operand(high, ty)?;
                values
                    .iter()
                    .map(|v| v.as_f64().is_some_and(|x| x >= low && x <= high))
                    .collect()
            }
        };
        Ok(mask)
    }
}

impl Transform for Predicate {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        MaskFilter::new(|b: &RecordBatch| self.row_mask(b).map(BooleanArray::from)).apply(batch)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = self.condition.keyword();
        match &self.condition {
            Condition::Equals(v)
            | Condition::Contains(v)
            | Condition::GreaterThan(v)
            | Condition::LessThan(v) => write!(f, "{} {} {}", self.column, keyword, v),
            Condition::Between(low, high) => {
                write!(f, "{} {} {} {}", self.column, keyword, low, high)
            }
        }
    }
}

const KEYWORDS: [&str; 7] = ["=", "==", "contains", "~", ">", "<", "between"];
const SYMBOLS: [char; 4] = ['=', '>', '<', '~'];

impl FromStr for Predicate {
    type Err = Error;

    /// Parses `<column> <op> <operand>`.
    ///
    /// `op` is one of `=`, `==`, `contains`, `~`, `>`, `<`, `between`. The
    /// column may contain spaces when the operator is a separate word;
    /// symbolic operators may also be written without spaces (`age>30`).
    /// `between` takes `low high` or `low..high`.
    fn from_str(input: &str) -> Result<Self> {
        let input = input.trim();

        let split = words(input)
            .into_iter()
            .skip(1)
            .find(|(_, w)| KEYWORDS.contains(&w.to_lowercase().as_str()));

        let (column, op, rest) = if let Some((at, op)) = split {
            (
                input[..at].trim_end().to_string(),
                op.to_lowercase(),
                input[at + op.len()..].trim().to_string(),
            )
        } else {
            let pos = input
                .find(SYMBOLS)
                .ok_or_else(|| Error::parse(format!("No operator in filter: '{}'", input)))?;
            let op_len = if input[pos..].starts_with("==") { 2 } else { 1 };
            (
                input[..pos].trim().to_string(),
                input[pos..pos + op_len].to_string(),
                input[pos + op_len..].trim().to_string(),
            )
        };

        if column.is_empty() {
            return Err(Error::parse(format!("Missing column in filter: '{}'", input)));
        }
        if rest.is_empty() {
            return Err(Error::parse(format!("Missing operand in filter: '{}'", input)));
        }

        let condition = match op.as_str() {
            "=" | "==" => Condition::Equals(Value::from(unquote(&rest))),
            "contains" | "~" => Condition::Contains(Value::from(unquote(&rest))),
            ">" => Condition::GreaterThan(Value::from(rest.as_str())),
            "<" => Condition::LessThan(Value::from(rest.as_str())),
            "between" => {
                let (low, high) = split_bounds(&rest).ok_or_else(|| {
                    Error::parse(format!("between needs two bounds: '{}'", rest))
                })?;
                Condition::Between(Value::from(low), Value::from(high))
            }
            other => return Err(Error::parse(format!("Unknown operator: '{}'", other))),
        };

        Ok(Self { column, condition })
    }
}

/// Whitespace-separated words with their byte offsets.
fn words(input: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in input.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                words.push((s, &input[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push((s, &input[s..]));
    }
    words
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

fn split_bounds(rest: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        [low, high] => Some((low, high)),
        [low, "and", high] => Some((low, high)),
        [single] => single.split_once(".."),
        _ => None,
    }
}
