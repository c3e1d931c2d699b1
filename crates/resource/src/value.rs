//! Driver-neutral statement parameters and result rows

use std::fmt;

use crate::error::DriverError;

/// A SQL parameter or result cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// `bit`
    Bool(bool),
    /// Any integer column (`tinyint` through `bigint`)
    Int(i64),
    /// `real` / `float`
    Float(f64),
    /// Character data
    Text(String),
    /// `binary` / `varbinary`
    Binary(Vec<u8>),
}

impl Value {
    /// Integer content, if any
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text content, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Binary(v) => {
                f.write_str("0x")?;
                v.iter().try_for_each(|b| write!(f, "{b:02X}"))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One result row: column names paired with their values, in select order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    /// Row from `(column, value)` pairs
    pub fn new(cells: Vec<(String, Value)>) -> Self {
        Self { cells }
    }

    /// Value of `column` (case-insensitive)
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    }

    /// Integer value of `column`
    pub fn int(&self, column: &str) -> Result<i64, DriverError> {
        let value = self.require(column)?;
        value
            .as_i64()
            .ok_or_else(|| DriverError::column(column, format!("expected int, got {}", value.kind())))
    }

    /// `column` as printable text.
    ///
    /// NULL becomes an empty string and binary cells, such as ciphertext the
    /// driver did not decrypt, print as `0x` hex. Only a missing column fails.
    pub fn display(&self, column: &str) -> Result<String, DriverError> {
        Ok(match self.require(column)? {
            Value::Null => String::new(),
            Value::Text(v) => v.clone(),
            other => other.to_string(),
        })
    }

    fn require(&self, column: &str) -> Result<&Value, DriverError> {
        self.get(column)
            .ok_or_else(|| DriverError::column(column, "not in result set"))
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(c, v)| (c.into(), v.into())).collect())
    }
}
