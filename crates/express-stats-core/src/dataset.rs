//! Immutable tabular snapshot consumed by the experiment engine
//!
//! Ingestion and row filtering happen outside this crate; whatever produces
//! the rows hands over a [`Dataset`] and never mutates it afterwards. A new
//! filter means a new snapshot.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;

use crate::errors::{StatsError, StatsResult};

/// Typed storage for one column. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Integer and floating-point storage
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Int(_) | ColumnData::Float(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnData::Int(_) => "int",
            ColumnData::Float(_) => "float",
            ColumnData::Bool(_) => "bool",
            ColumnData::Text(_) => "text",
            ColumnData::Date(_) => "date",
        }
    }

    /// Value at `row`, or `None` when the cell is missing. NaN floats count as missing.
    pub fn value(&self, row: usize) -> Option<Value<'_>> {
        match self {
            ColumnData::Int(v) => v.get(row).copied().flatten().map(Value::Int),
            ColumnData::Float(v) => v
                .get(row)
                .copied()
                .flatten()
                .filter(|x| !x.is_nan())
                .map(Value::Float),
            ColumnData::Bool(v) => v.get(row).copied().flatten().map(Value::Bool),
            ColumnData::Text(v) => v
                .get(row)
                .and_then(|s| s.as_deref())
                .map(Value::Text),
            ColumnData::Date(v) => v.get(row).copied().flatten().map(Value::Date),
        }
    }

    /// Numeric value at `row` for integer or float storage
    pub fn numeric(&self, row: usize) -> Option<f64> {
        match self.value(row)? {
            Value::Int(i) => Some(i as f64),
            Value::Float(x) => Some(x),
            _ => None,
        }
    }

    /// Number of distinct non-missing values
    pub fn distinct_count(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
            ColumnData::Float(v) => v
                .iter()
                .flatten()
                .filter(|x| !x.is_nan())
                // -0.0 and 0.0 are the same value
                .map(|x| if *x == 0.0 { 0u64 } else { x.to_bits() })
                .collect::<HashSet<_>>()
                .len(),
            ColumnData::Bool(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
            ColumnData::Text(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
            ColumnData::Date(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
        }
    }
}

/// A borrowed, non-missing cell value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(&'a str),
    Date(NaiveDate),
}

impl Value<'_> {
    /// Natural ordering between values of the same column
    pub fn natural_cmp(&self, other: &Value<'_>) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                // NaN never becomes a Value; -0.0 and 0.0 compare equal
                let a = self.as_f64().unwrap_or(f64::NAN);
                let b = other.as_f64().unwrap_or(f64::NAN);
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn int(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::new(name, ColumnData::Int(values.into_iter().map(Some).collect()))
    }

    pub fn float(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, ColumnData::Float(values.into_iter().map(Some).collect()))
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|s| Some(s.into())).collect()),
        )
    }
}

/// Ordered, equal-length named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Build a snapshot, rejecting ragged columns and duplicate names
    pub fn new(columns: Vec<Column>) -> StatsResult<Self> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);

        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(StatsError::DuplicateColumn(col.name.clone()));
            }
            if col.data.len() != n_rows {
                return Err(StatsError::DimensionMismatch {
                    column: col.name.clone(),
                    len: col.data.len(),
                    expected: n_rows,
                });
            }
        }

        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column lookup that reports unknown names as an error
    pub fn require(&self, name: &str) -> StatsResult<&Column> {
        self.column(name)
            .ok_or_else(|| StatsError::UnknownColumn(name.to_string()))
    }

    /// Row indices where every named column has a value
    pub fn complete_rows(&self, names: &[&str]) -> StatsResult<Vec<usize>> {
        let cols = names
            .iter()
            .map(|n| self.require(n))
            .collect::<StatsResult<Vec<_>>>()?;

        Ok((0..self.n_rows)
            .filter(|&row| cols.iter().all(|c| c.data.value(row).is_some()))
            .collect())
    }
}
