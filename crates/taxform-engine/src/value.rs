use crate::error::{EngineError, EngineResult};
use crate::person::Person;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// The result of evaluating a line, or one field of a form's input.
///
/// Lines are heterogeneous (amounts, names, flags, lists of codes), so callers
/// check the shape they expect with [`Value::as_number`] and friends, or with
/// [`FromValue`] through the `*_as` helpers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Blank,
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
    Person(Person),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Blank => "blank",
            Value::List(_) => "list",
            Value::Record(_) => "record",
            Value::Person(_) => "person",
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Blank)
    }

    pub fn as_number(&self) -> EngineResult<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(mismatch("number", other)),
        }
    }

    pub fn as_text(&self) -> EngineResult<&str> {
        match self {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("text", other)),
        }
    }

    pub fn as_bool(&self) -> EngineResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }

    pub fn as_list(&self) -> EngineResult<&[Value]> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(mismatch("list", other)),
        }
    }

    pub fn as_record(&self) -> EngineResult<&BTreeMap<String, Value>> {
        match self {
            Value::Record(fields) => Ok(fields),
            other => Err(mismatch("record", other)),
        }
    }

    pub fn as_person(&self) -> EngineResult<&Person> {
        match self {
            Value::Person(p) => Ok(p),
            other => Err(mismatch("person", other)),
        }
    }
}

fn mismatch(expected: &'static str, actual: &Value) -> EngineError {
    EngineError::TypeMismatch {
        expected,
        actual: actual.type_name(),
    }
}

/// Typed extraction of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> EngineResult<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> EngineResult<Self> {
        Ok(value)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> EngineResult<Self> {
        value.as_number()
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> EngineResult<Self> {
        value.as_bool()
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> EngineResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: Value) -> EngineResult<Self> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(mismatch("list", &other)),
        }
    }
}

impl FromValue for Person {
    fn from_value(value: Value) -> EngineResult<Self> {
        match value {
            Value::Person(p) => Ok(p),
            other => Err(mismatch("person", &other)),
        }
    }
}

/// Blank reads as `None`; anything else must convert to `T`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> EngineResult<Self> {
        match value {
            Value::Blank => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Person> for Value {
    fn from(value: Person) -> Self {
        Value::Person(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Blank
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Blank,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => n.as_f64().map_or(Value::Blank, Value::Number),
            JsonValue::String(s) => Value::Text(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(fields) => Value::Record(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Blank => f.write_str(""),
            Value::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Record(fields) => {
                f.write_str("{")?;
                for (idx, (key, value)) in fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Person(p) => f.write_str(p.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_access_reports_mismatch() {
        assert_eq!(Value::from(12.34).as_number().unwrap(), 12.34);
        assert_eq!(Value::from("abc").as_text().unwrap(), "abc");

        let err = Value::from("abc").as_number().unwrap_err();
        assert_eq!(
            err,
            EngineError::TypeMismatch {
                expected: "number",
                actual: "text"
            }
        );
    }

    #[test]
    fn optional_values_read_blank_as_none() {
        assert_eq!(Option::<f64>::from_value(Value::Blank).unwrap(), None);
        assert_eq!(Option::<f64>::from_value(Value::from(3)).unwrap(), Some(3.0));
        assert!(Option::<f64>::from_value(Value::from(true)).is_err());
    }

    #[test]
    fn converts_nested_json() {
        let value = Value::from(json!({
            "code": "D",
            "amounts": [1, 2.5],
            "missing": null,
        }));
        let record = value.as_record().unwrap();
        assert_eq!(record["code"], Value::from("D"));
        assert_eq!(
            record["amounts"],
            Value::List(vec![Value::from(1.0), Value::from(2.5)])
        );
        assert!(record["missing"].is_blank());
    }

    #[test]
    fn display_is_compact() {
        let value = Value::List(vec![Value::from(1), Value::from("x"), Value::Blank]);
        assert_eq!(value.to_string(), "[1, x, ]");
    }
}
