use crate::error::{EngineError, EngineResult};
use crate::value::Value;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// The raw data a form was created with, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormInput {
    fields: BTreeMap<String, Value>,
}

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an input from any serializable struct or map.
    ///
    /// Fields that serialize to `null` (typically `None` options) are left
    /// undefined, so [`FormInput::contains`] reports them as absent.
    pub fn from_serialize<T: Serialize + ?Sized>(input: &T) -> EngineResult<Self> {
        let json = serde_json::to_value(input)
            .map_err(|err| EngineError::InvalidInput(err.to_string()))?;
        match json {
            JsonValue::Object(map) => Ok(map
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key, Value::from(value)))
                .collect()),
            other => Err(EngineError::InvalidInput(format!(
                "expected an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FormInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
