//! Backend-neutral result types.
//!
//! Both drivers decode rows into these so reporters never see sqlx types.

use crate::error::{ReportError, Result};
use chrono::NaiveDateTime;
use std::fmt;
use std::time::Duration;

/// Display format for timestamp values. Fractional seconds appear only when set.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Columns and rows returned by one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Columns in select-list order.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data, in the order the engine returned them.
    pub rows: Vec<Row>,

    /// Wall-clock time spent in the driver.
    pub execution_time: Duration,
}

impl QueryResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            execution_time: Duration::ZERO,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Returns true if the result set has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the index of the column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Checks that every row has exactly one value per column.
    pub fn validate_shape(&self) -> Result<()> {
        let expected = self.columns.len();
        match self.rows.iter().position(|row| row.len() != expected) {
            Some(index) => Err(ReportError::query(format!(
                "Malformed result: row {} has {} values but {} columns were declared",
                index + 1,
                self.rows[index].len(),
                expected
            ))),
            None => Ok(()),
        }
    }
}

/// Name and engine-reported type of one result column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Header text, exactly as the engine returned it.
    pub name: String,
    /// Driver type name, e.g. `FLOAT8` or `DATETIME`.
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// One result row; always `columns.len()` values long once validated.
pub type Row = Vec<Value>;

/// A decoded cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Date and time without zone.
    Timestamp(NaiveDateTime),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell. Text that parses as a number counts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text used for table cells. Floats keep full precision and always
    /// show a decimal point so they read differently from integers.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.1}"),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v $(as $cast)?)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i32 => Int as i64,
    i64 => Int,
    f64 => Float,
    String => String,
    NaiveDateTime => Timestamp,
    Vec<u8> => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2006, 4, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(Value::Float(9.47).to_display_string(), "9.47");
        assert_eq!(Value::from("rain").to_display_string(), "rain");
        assert_eq!(
            Value::Timestamp(timestamp(5)).to_display_string(),
            "2006-04-01 05:00:00"
        );
        assert_eq!(Value::Bytes(vec![1, 2, 3]).to_display_string(), "<3 bytes>");
    }

    #[test]
    fn test_whole_floats_keep_a_decimal_place() {
        assert_eq!(Value::Float(20.0).to_display_string(), "20.0");
        assert_eq!(Value::Float(-3.0).to_display_string(), "-3.0");
        assert_eq!(Value::Float(0.0).to_display_string(), "0.0");
        assert_eq!(Value::Float(f64::NAN).to_display_string(), "NaN");
        assert_ne!(
            Value::Float(15.0).to_display_string(),
            Value::Int(15).to_display_string()
        );
    }

    #[test]
    fn test_timestamp_keeps_fractional_seconds() {
        let ts = timestamp(0) + chrono::Duration::milliseconds(500);
        assert_eq!(
            Value::Timestamp(ts).to_display_string(),
            "2006-04-01 00:00:00.500"
        );
    }

    #[test]
    fn test_value_as_f64() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(-1.5).as_f64(), Some(-1.5));
        assert_eq!(Value::from(" 12.25 ").as_f64(), Some(12.25));
        assert_eq!(Value::from("rain").as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
        assert_eq!(Value::Timestamp(timestamp(0)).as_f64(), None);
    }

    #[test]
    fn test_value_from_conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from(2.71f64), Value::Float(2.71));
        assert_eq!(Value::from(timestamp(1)), Value::Timestamp(timestamp(1)));
        assert_eq!(Value::from(None::<f64>), Value::Null);
        assert_eq!(Value::from(Some("snow")), Value::String("snow".to_string()));
    }

    #[test]
    fn test_query_result_with_data() {
        let columns = vec![
            ColumnInfo::new("Formatted Date", "TIMESTAMP"),
            ColumnInfo::new("Temperature (C)", "FLOAT8"),
        ];
        let rows = vec![
            vec![Value::Timestamp(timestamp(0)), Value::Float(9.47)],
            vec![Value::Timestamp(timestamp(1)), Value::Float(9.36)],
        ];

        let result = QueryResult::with_data(columns, rows);

        assert!(!result.is_empty());
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.column_index("Temperature (C)"), Some(1));
        assert_eq!(result.column_index("Humidity"), None);
        assert!(result.validate_shape().is_ok());
    }

    #[test]
    fn test_validate_shape_rejects_ragged_rows() {
        let result = QueryResult::with_data(
            vec![ColumnInfo::new("a", "INT4"), ColumnInfo::new("b", "INT4")],
            vec![vec![Value::Int(1), Value::Int(2)], vec![Value::Int(3)]],
        );

        let err = result.validate_shape().unwrap_err();
        assert!(err.to_string().contains("row 2 has 1 values"), "{err}");
    }

    #[test]
    fn test_empty_result_is_valid() {
        let result = QueryResult::new().with_execution_time(Duration::from_millis(3));
        assert!(result.is_empty());
        assert!(result.validate_shape().is_ok());
        assert_eq!(result.execution_time, Duration::from_millis(3));
    }
}
