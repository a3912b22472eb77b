//! Query-string encoding.
//!
//! Endpoint wrappers describe their query parameters as an ordered
//! [`QueryParams`] mapping; [`encode_query`] turns that into the suffix
//! appended to the request path.
//!
//! ## Wire format
//!
//! - Scalar: `name=value`
//! - List: `name[]=a&name[]=b`, one pair per element, in list order
//! - First parameter prefixed with `?`, the rest joined with `&`
//!
//! Names and values are percent-encoded; the `[]` list suffix is written
//! literally. Plain alphanumeric input therefore encodes exactly as the
//! unencoded form.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// Rendered as `name=value`.
    Scalar(String),
    /// Rendered as one `name[]=element` pair per element.
    List(Vec<String>),
}

impl QueryValue {
    /// Creates a scalar value from anything with a textual representation.
    pub fn scalar(value: impl Display) -> Self {
        Self::Scalar(value.to_string())
    }

    /// Creates a list value, preserving element order.
    pub fn list<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        Self::List(values.into_iter().map(|v| v.to_string()).collect())
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::scalar(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::scalar(value)
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        Self::scalar(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

// ---------------------------------------------------------------------------

/// Ordered mapping of parameter name to value.
///
/// Insertion order is the order parameters appear in the encoded string.
/// Setting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams(Vec<(String, QueryValue)>);

impl QueryParams {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, returning the updated mapping.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name` to `value`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<QueryValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Returns the value set for `name`.
    pub fn get(&self, name: &str) -> Option<&QueryValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Returns `true` if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// Encodes `params` as a query-string suffix.
///
/// Returns an empty string when `params` is absent, empty, or contains only
/// empty lists.
pub fn encode_query(params: Option<&QueryParams>) -> String {
    let Some(params) = params else {
        return String::new();
    };

    let mut pairs = Vec::new();
    for (name, value) in params.iter() {
        let name = urlencoding::encode(name);
        match value {
            QueryValue::Scalar(value) => {
                pairs.push(format!("{name}={}", urlencoding::encode(value)));
            }
            QueryValue::List(values) => {
                pairs.extend(
                    values
                        .iter()
                        .map(|value| format!("{name}[]={}", urlencoding::encode(value))),
                );
            }
        }
    }

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}
