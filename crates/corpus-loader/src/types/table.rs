//! Column-oriented typed tables produced by loading files

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;

use super::DataType;
use crate::error::{Error, Result};

/// Datetime layouts accepted when casting text, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Date-only layouts accepted when casting text, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d %B %Y", "%B %d, %Y"];

/// Rendering used when a datetime is normalised to text
const DATETIME_DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

/// A single cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Whether this is a missing value
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Normalised text rendering; missing values become the empty string
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::DateTime(dt) => dt.format(DATETIME_DISPLAY).to_string(),
        }
    }

    /// Parse raw text into a value of the given type.
    ///
    /// Empty (or whitespace-only) text is a missing value for every type.
    pub fn parse(raw: &str, datatype: DataType) -> std::result::Result<Self, String> {
        if raw.trim().is_empty() {
            return Ok(Self::Null);
        }
        match datatype {
            DataType::Text | DataType::Category => Ok(Self::Text(raw.to_string())),
            DataType::Integer => parse_integer(raw)
                .map(Self::Integer)
                .ok_or_else(|| cast_failure(raw, datatype)),
            DataType::Float => parse_float(raw)
                .map(Self::Float)
                .ok_or_else(|| cast_failure(raw, datatype)),
            DataType::Boolean => parse_boolean(raw)
                .map(Self::Boolean)
                .ok_or_else(|| cast_failure(raw, datatype)),
            DataType::DateTime => parse_datetime(raw)
                .map(Self::DateTime)
                .ok_or_else(|| cast_failure(raw, datatype)),
        }
    }

    /// Convert this value to the given type
    pub fn cast(self, datatype: DataType) -> std::result::Result<Self, String> {
        match (self, datatype) {
            (Self::Null, _) => Ok(Self::Null),
            (Self::Text(s), _) => Self::parse(&s, datatype),
            (value, DataType::Text | DataType::Category) => Ok(Self::Text(value.to_text())),
            (Self::Integer(i), DataType::Integer) => Ok(Self::Integer(i)),
            (Self::Integer(i), DataType::Float) => Ok(Self::Float(i as f64)),
            (Self::Float(f), DataType::Float) => Ok(Self::Float(f)),
            (Self::Float(f), DataType::Integer) => integral_float(f)
                .map(Self::Integer)
                .ok_or_else(|| cast_failure(&f.to_string(), datatype)),
            (Self::Boolean(b), DataType::Boolean) => Ok(Self::Boolean(b)),
            (Self::Boolean(b), DataType::Integer) => Ok(Self::Integer(i64::from(b))),
            (Self::DateTime(dt), DataType::DateTime) => Ok(Self::DateTime(dt)),
            (value, _) => Err(cast_failure(&value.to_text(), datatype)),
        }
    }

    /// The datatype this value naturally belongs to, if any
    pub fn natural_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Text(_) => Some(DataType::Text),
            Self::Integer(_) => Some(DataType::Integer),
            Self::Float(_) => Some(DataType::Float),
            Self::Boolean(_) => Some(DataType::Boolean),
            Self::DateTime(_) => Some(DataType::DateTime),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn cast_failure(raw: &str, datatype: DataType) -> String {
    format!("cannot cast '{}' to {}", raw, datatype)
}

pub(crate) fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().and_then(integral_float))
}

pub(crate) fn parse_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("nan") || trimmed.eq_ignore_ascii_case("inf") {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

pub(crate) fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Boolean literals only (no numeric forms), used during inference
pub(crate) fn is_boolean_literal(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "false")
}

pub(crate) fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn integral_float(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
    pub values: Vec<Value>,
}

impl Column {
    /// Create a column
    pub fn new(name: impl Into<String>, datatype: DataType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            datatype,
            values,
        }
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Every value rendered as text
    pub fn texts(&self) -> Vec<String> {
        self.values.iter().map(Value::to_text).collect()
    }
}

/// In-memory column-oriented table.
///
/// The row count is stored alongside the columns so a table with every
/// column excluded still knows how many records it holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// An empty table with no rows and no columns
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from equal-length columns
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        Self::with_rows(columns, rows)
    }

    /// Build a table with an explicit row count; every column must have that many values
    pub fn with_rows(columns: Vec<Column>, rows: usize) -> Result<Self> {
        for column in &columns {
            if column.len() != rows {
                return Err(Error::build(format!(
                    "column '{}' has {} values, expected {}",
                    column.name,
                    column.len(),
                    rows
                )));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::build(format!("duplicate column '{}'", column.name)));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Columns in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether a column with this name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// A new table with only the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name)
                    .cloned()
                    .ok_or_else(|| Error::build(format!("column '{}' not found", name)))
            })
            .collect::<Result<Vec<_>>>()?;
        Table::with_rows(columns, self.rows)
    }

    /// Values of one row, in column order
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.rows {
            return None;
        }
        Some(self.columns.iter().filter_map(|c| c.values.get(index)).collect())
    }

    /// Append another table's rows below this one's.
    ///
    /// Column names and datatypes must match position by position. An empty
    /// table with no columns adopts the other table's shape.
    pub fn vstack(&mut self, other: Table) -> Result<()> {
        if self.columns.is_empty() && self.rows == 0 {
            *self = other;
            return Ok(());
        }
        let ours: Vec<(&str, DataType)> =
            self.columns.iter().map(|c| (c.name.as_str(), c.datatype)).collect();
        let theirs: Vec<(&str, DataType)> =
            other.columns.iter().map(|c| (c.name.as_str(), c.datatype)).collect();
        if ours != theirs {
            return Err(Error::build(format!(
                "cannot concatenate tables with columns {:?} and {:?}",
                ours, theirs
            )));
        }

        for (column, extra) in self.columns.iter_mut().zip(other.columns) {
            column.values.extend(extra.values);
        }
        self.rows += other.rows;
        Ok(())
    }

    /// Move the named column to the front
    pub fn move_to_front(&mut self, name: &str) -> Result<()> {
        let index = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::build(format!("column '{}' not found", name)))?;
        let column = self.columns.remove(index);
        self.columns.insert(0, column);
        Ok(())
    }

    /// A new table holding only rows at the given indices
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                datatype: c.datatype,
                values: indices
                    .iter()
                    .map(|&i| c.values.get(i).cloned().unwrap_or(Value::Null))
                    .collect(),
            })
            .collect();
        Table {
            columns,
            rows: indices.len(),
        }
    }

    /// Inner join on `left_on` / `right_on`.
    ///
    /// Keys compare by their normalised text, and missing keys never match.
    /// Row order follows the left table; a left row matching several right
    /// rows yields one output row per match. When both key columns share a
    /// name only the left one is kept. Any other right column whose name is
    /// already taken gets `suffix` appended until it is unique.
    pub fn inner_join(&self, right: &Table, left_on: &str, right_on: &str, suffix: &str) -> Result<Table> {
        let left_key = self
            .column(left_on)
            .ok_or_else(|| Error::build(format!("link column '{}' not found in corpus", left_on)))?;
        let right_key = right
            .column(right_on)
            .ok_or_else(|| Error::build(format!("link column '{}' not found in metadata", right_on)))?;

        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (row, value) in right_key.values.iter().enumerate() {
            if !value.is_null() {
                index.entry(value.to_text()).or_default().push(row);
            }
        }

        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();
        for (row, value) in left_key.values.iter().enumerate() {
            if value.is_null() {
                continue;
            }
            if let Some(matches) = index.get(&value.to_text()) {
                for &matched in matches {
                    left_rows.push(row);
                    right_rows.push(matched);
                }
            }
        }

        let mut joined = self.take_rows(&left_rows);
        let right_part = right.take_rows(&right_rows);
        for mut column in right_part.columns {
            if left_on == right_on && column.name == right_on {
                continue;
            }
            while joined.has_column(&column.name) {
                column.name.push_str(suffix);
            }
            joined.columns.push(column);
        }
        Ok(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| Value::Text(v.to_string())).collect()
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&v| Value::Integer(v)).collect()
    }

    #[test]
    fn test_parse_and_cast() {
        assert_eq!(Value::parse("42", DataType::Integer).unwrap(), Value::Integer(42));
        assert_eq!(Value::parse("42.0", DataType::Integer).unwrap(), Value::Integer(42));
        assert_eq!(Value::parse("", DataType::Integer).unwrap(), Value::Null);
        assert_eq!(Value::parse("Yes", DataType::Boolean).unwrap(), Value::Boolean(true));
        assert!(Value::parse("4.5", DataType::Integer).is_err());

        let dt = Value::parse("2024-03-01", DataType::DateTime).unwrap();
        assert_eq!(dt.to_text(), "2024-03-01 00:00:00");

        assert_eq!(Value::Float(30.0).cast(DataType::Integer).unwrap(), Value::Integer(30));
        assert_eq!(Value::Integer(7).cast(DataType::Text).unwrap(), Value::Text("7".to_string()));
        assert!(Value::Boolean(true).cast(DataType::DateTime).is_err());
    }

    #[test]
    fn test_vstack_sums_rows() {
        let mut a = Table::from_columns(vec![Column::new("n", DataType::Integer, ints(&[1, 2]))]).unwrap();
        let b = Table::from_columns(vec![Column::new("n", DataType::Integer, ints(&[3]))]).unwrap();
        a.vstack(b).unwrap();
        assert_eq!(a.row_count(), 3);
        assert_eq!(a.column("n").unwrap().values, ints(&[1, 2, 3]));

        let c = Table::from_columns(vec![Column::new("m", DataType::Integer, ints(&[4]))]).unwrap();
        assert!(a.vstack(c).is_err());
        assert_eq!(a.row_count(), 3);
    }

    #[test]
    fn test_zero_column_table_keeps_rows() {
        let mut a = Table::with_rows(Vec::new(), 2).unwrap();
        a.vstack(Table::with_rows(Vec::new(), 3).unwrap()).unwrap();
        assert_eq!(a.row_count(), 5);
    }

    #[test]
    fn test_inner_join_cross_product_and_suffix() {
        let left = Table::from_columns(vec![
            Column::new("doc", DataType::Text, text(&["a", "b", "c"])),
            Column::new("id", DataType::Integer, ints(&[1, 2, 3])),
            Column::new("year", DataType::Integer, ints(&[2000, 2001, 2002])),
        ])
        .unwrap();
        let right = Table::from_columns(vec![
            Column::new("key", DataType::Text, text(&["1", "1", "3", "9"])),
            Column::new("year", DataType::Text, text(&["x", "y", "z", "w"])),
        ])
        .unwrap();

        let joined = left.inner_join(&right, "id", "key", "_meta").unwrap();
        assert_eq!(joined.row_count(), 3);
        assert_eq!(joined.column_names(), vec!["doc", "id", "year", "key", "year_meta"]);
        assert_eq!(joined.column("doc").unwrap().texts(), vec!["a", "a", "c"]);
        assert_eq!(joined.column("year_meta").unwrap().texts(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_inner_join_same_key_name_collapses() {
        let left = Table::from_columns(vec![
            Column::new("id", DataType::Text, text(&["1", "2"])),
            Column::new("doc", DataType::Text, text(&["a", "b"])),
        ])
        .unwrap();
        let right = Table::from_columns(vec![
            Column::new("id", DataType::Text, vec![Value::Text("2".into()), Value::Null]),
            Column::new("author", DataType::Text, text(&["z", "q"])),
        ])
        .unwrap();

        let joined = left.inner_join(&right, "id", "id", "_meta").unwrap();
        assert_eq!(joined.column_names(), vec!["id", "doc", "author"]);
        assert_eq!(joined.row_count(), 1);
        assert_eq!(joined.column("author").unwrap().texts(), vec!["z"]);
    }
}
