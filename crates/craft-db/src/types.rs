//! Database value types and conversions.

use crate::DbError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// A scalar used as a filter operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Real/float value.
    Real(f64),
    /// Text value.
    Text(String),
}

impl Value {
    /// Try to get the value as an i64.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get the value as a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert to a JSON value.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Integer(i) => Json::Number((*i).into()),
            Value::Real(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Text(s) => Json::String(s.clone()),
        }
    }

    /// Render the operand the way PostgREST expects it in a query string.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    /// Check whether a stored JSON field equals this operand.
    ///
    /// Numbers compare by value; a missing field only matches `Null`.
    pub fn matches(&self, field: Option<&Json>) -> bool {
        match (self, field) {
            (Value::Null, None) | (Value::Null, Some(Json::Null)) => true,
            (_, None) => false,
            (Value::Bool(b), Some(Json::Bool(v))) => b == v,
            (Value::Integer(i), Some(Json::Number(n))) => {
                n.as_i64() == Some(*i) || n.as_f64() == Some(*i as f64)
            }
            (Value::Real(f), Some(Json::Number(n))) => n.as_f64() == Some(*f),
            (Value::Text(s), Some(Json::String(v))) => s == v,
            // Filters travel as text literals; integer keys match their digits.
            (Value::Text(s), Some(Json::Number(n))) => n.to_string() == *s,
            _ => false,
        }
    }
}

// Conversions from Rust types to Value
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// A row: a JSON object keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Json>);

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a row from any serializable struct.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, DbError> {
        match serde_json::to_value(value)? {
            Json::Object(map) => Ok(Self(map)),
            other => Err(DbError::TypeError(format!("expected an object, got {}", other))),
        }
    }

    /// Set a column, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into().to_json());
        self
    }

    /// Set a column to a raw JSON value.
    pub fn set_json(&mut self, column: impl Into<String>, value: Json) {
        self.0.insert(column.into(), value);
    }

    /// Get a value by column name.
    pub fn get(&self, column: &str) -> Option<&Json> {
        self.0.get(column)
    }

    /// Get a text column.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(Json::as_str)
    }

    /// Get the column names.
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Json> {
        &self.0
    }

    /// Consume and return the underlying JSON object.
    pub fn into_map(self) -> Map<String, Json> {
        self.0
    }

    /// Try to deserialize the row into a type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, DbError> {
        serde_json::from_value(Json::Object(self.0.clone()))
            .map_err(|e| DbError::DeserializeError(e.to_string()))
    }
}

impl From<Map<String, Json>> for Row {
    fn from(map: Map<String, Json>) -> Self {
        Self(map)
    }
}

/// Query result containing rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// The rows.
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Create a new query result.
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Get the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the first row.
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Deserialize all rows into a vector of a type.
    pub fn deserialize_all<T: DeserializeOwned>(&self) -> Result<Vec<T>, DbError> {
        self.rows.iter().map(|row| row.deserialize()).collect()
    }

    /// Deserialize the first row, failing with `NotFound` when there is none.
    pub fn deserialize_one<T: DeserializeOwned>(&self) -> Result<T, DbError> {
        self.first().ok_or(DbError::NotFound)?.deserialize()
    }
}

impl IntoIterator for QueryResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Region {
        id: String,
        name: String,
        is_active: bool,
    }

    #[test]
    fn test_value_matching() {
        assert!(Value::from(3).matches(Some(&json!(3))));
        assert!(Value::from(3).matches(Some(&json!(3.0))));
        assert!(!Value::from(3).matches(Some(&json!("3"))));
        assert!(Value::from("SAVE10").matches(Some(&json!("SAVE10"))));
        assert!(Value::from("42").matches(Some(&json!(42))));
        assert!(Value::from(true).matches(Some(&json!(true))));
        assert!(Value::Null.matches(None));
        assert!(Value::Null.matches(Some(&Json::Null)));
        assert!(!Value::from("x").matches(None));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }

    #[test]
    fn test_literals() {
        assert_eq!(Value::Null.to_literal(), "null");
        assert_eq!(Value::from(false).to_literal(), "false");
        assert_eq!(Value::from(42).to_literal(), "42");
    }

    #[test]
    fn test_row_roundtrip() {
        let region = Region {
            id: "r1".into(),
            name: "Cairo".into(),
            is_active: true,
        };
        let row = Row::from_serialize(&region).unwrap();
        assert_eq!(row.get_str("name"), Some("Cairo"));
        assert_eq!(row.deserialize::<Region>().unwrap(), region);
    }

    #[test]
    fn test_row_builder() {
        let row = Row::new().with("used_count", 4).with("code", "SAVE10");
        assert_eq!(row.get("used_count"), Some(&json!(4)));
        assert_eq!(row.columns().count(), 2);
    }

    #[test]
    fn test_from_serialize_rejects_scalars() {
        assert!(matches!(Row::from_serialize(&5), Err(DbError::TypeError(_))));
    }

    #[test]
    fn test_deserialize_one_not_found() {
        let result = QueryResult::default();
        assert!(matches!(
            result.deserialize_one::<Region>(),
            Err(DbError::NotFound)
        ));
    }
}
