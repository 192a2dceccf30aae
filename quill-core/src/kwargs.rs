use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::HttpError;

/// Keyword arguments bound from a request.
///
/// Values from a JSON body keep their JSON type; query, form and path
/// values are strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kwargs {
    values: Map<String, Value>,
}

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    /// Insert unless `name` is already bound. Returns whether it was inserted.
    pub fn insert_first(&mut self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.values.entry(name.into()) {
            serde_json::map::Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
            serde_json::map::Entry::Occupied(_) => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String value of `name`; numbers and booleans are rendered as text.
    pub fn str(&self, name: &str) -> Option<std::borrow::Cow<'_, str>> {
        match self.values.get(name)? {
            Value::String(s) => Some(std::borrow::Cow::Borrowed(s)),
            Value::Number(n) => Some(std::borrow::Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(std::borrow::Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    /// Typed value of `name`, `None` when absent.
    ///
    /// Strings that hold a number or boolean are accepted for numeric and
    /// boolean targets, since query and form values arrive as text.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, HttpError> {
        let Some(value) = self.values.get(name) else {
            return Ok(None);
        };
        match serde_json::from_value::<T>(value.clone()) {
            Ok(v) => Ok(Some(v)),
            Err(first) => match value {
                Value::String(s) => serde_json::from_str::<T>(s)
                    .map(Some)
                    .map_err(|_| HttpError::validation(name, first.to_string())),
                _ => Err(HttpError::validation(name, first.to_string())),
            },
        }
    }

    /// Typed value of `name`; absence is a validation error on `name`.
    pub fn require<T: DeserializeOwned>(&self, name: &str) -> Result<T, HttpError> {
        self.get(name)?
            .ok_or_else(|| HttpError::validation(name, format!("Missing argument: {name}")))
    }

    /// Typed value of `name`, or `default` when absent.
    pub fn get_or<T: DeserializeOwned>(&self, name: &str, default: T) -> Result<T, HttpError> {
        Ok(self.get(name)?.unwrap_or(default))
    }

    /// Deserialize every bound argument into one struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .map_err(|e| HttpError::BadRequest(e.to_string()))
    }

    /// Keep only the names accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.values.retain(|k, _| keep(k));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}
