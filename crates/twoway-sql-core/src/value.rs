//! SQL values and parameter values.
//!
//! [`SqlValue`] is what ends up in the bind list. [`ParamValue`] is what a
//! [`ParametersContext`](crate::ParametersContext) holds: a scalar, a
//! collection, a nested record, or a stream handle.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// A SQL value that is passed to the statement as a bind parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns the value as raw SQL text, without quoting.
    ///
    /// Used by output and replace variables, which splice text into the
    /// statement instead of binding it.
    #[must_use]
    pub fn to_raw_text(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => s.clone(),
            Self::Blob(b) => b.iter().map(|byte| format!("{byte:02X}")).collect(),
        }
    }

    /// Reads `text` as a value of the declared SQL type.
    ///
    /// Integer types give [`SqlValue::Int`], `REAL`/`FLOAT`/`DOUBLE` give
    /// [`SqlValue::Float`] and `BOOLEAN` gives [`SqlValue::Bool`]. Any other
    /// type, or no type, keeps the text. `NULL` is null for every type.
    /// Returns `None` if the text does not fit the type.
    #[must_use]
    pub fn parse_as(text: &str, sql_type: Option<&str>) -> Option<Self> {
        if text.eq_ignore_ascii_case("null") {
            return Some(Self::Null);
        }
        let base = sql_type.map_or_else(String::new, |t| {
            t.split('(').next().unwrap_or(t).trim().to_ascii_uppercase()
        });
        match base.as_str() {
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" => {
                text.parse().ok().map(Self::Int)
            }
            "REAL" | "FLOAT" | "DOUBLE" | "DOUBLE PRECISION" => text.parse().ok().map(Self::Float),
            "BOOLEAN" | "BOOL" => match text.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Self::Bool(true)),
                "false" | "0" => Some(Self::Bool(false)),
                _ => None,
            },
            _ => Some(Self::Text(String::from(text))),
        }
    }

    /// Returns true for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

/// A shared handle to a stream the statement reads from.
///
/// The engine only passes the handle along; reading and closing it is up to
/// whoever executes the statement.
#[derive(Clone)]
pub struct InputStream(pub Arc<Mutex<dyn Read + Send>>);

/// A shared handle to a stream the statement writes to.
#[derive(Clone)]
pub struct OutputStream(pub Arc<Mutex<dyn Write + Send>>);

impl InputStream {
    /// Wraps a reader.
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(reader)))
    }

    /// Returns true if both handles point at the same stream.
    #[must_use]
    pub fn same_stream(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl OutputStream {
    /// Wraps a writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(writer)))
    }

    /// Returns true if both handles point at the same stream.
    #[must_use]
    pub fn same_stream(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InputStream(..)")
    }
}

impl fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OutputStream(..)")
    }
}

/// A value held by a parameters context.
#[derive(Debug, Clone)]
pub enum ParamValue {
    /// A scalar value.
    Value(SqlValue),
    /// An ordered collection.
    List(Vec<ParamValue>),
    /// A record whose members are reachable through dotted names.
    Map(BTreeMap<String, ParamValue>),
    /// A stream read by the statement.
    InputStream(InputStream),
    /// A stream written by the statement.
    OutputStream(OutputStream),
}

impl ParamValue {
    /// Returns the scalar value, if this is one.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&SqlValue> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the member named `key` of a map value.
    #[must_use]
    pub fn member(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Returns the elements a collection-valued directive iterates over.
    ///
    /// A scalar counts as a one-element collection.
    #[must_use]
    pub fn elements(&self) -> Option<Vec<&Self>> {
        match self {
            Self::List(items) => Some(items.iter().collect()),
            Self::Value(_) | Self::Map(_) => Some(vec![self]),
            Self::InputStream(_) | Self::OutputStream(_) => None,
        }
    }
}

impl<T: ToSqlValue> From<T> for ParamValue {
    fn from(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }
}

impl From<InputStream> for ParamValue {
    fn from(stream: InputStream) -> Self {
        Self::InputStream(stream)
    }
}

impl From<OutputStream> for ParamValue {
    fn from(stream: OutputStream) -> Self {
        Self::OutputStream(stream)
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Json::Null => Self::Value(SqlValue::Null),
            Json::Bool(b) => Self::Value(SqlValue::Bool(b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Value(SqlValue::Int(i)),
                None => Self::Value(SqlValue::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Json::String(s) => Self::Value(SqlValue::Text(s)),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Builds a [`ParamValue::List`] from anything convertible to SQL values.
pub fn list<T: ToSqlValue>(values: impl IntoIterator<Item = T>) -> ParamValue {
    ParamValue::List(
        values
            .into_iter()
            .map(|v| ParamValue::Value(v.to_sql_value()))
            .collect(),
    )
}
