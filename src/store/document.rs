//! Backend-neutral documents and the small query language the collector
//! needs: equality, inequality and existence filters, one sort key, an
//! optional limit.

use serde_json::Value;
use std::cmp::Ordering;

/// A stored document: a JSON object.
pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    /// Field at the dotted path equals the value.
    Eq(String, Value),
    /// Field at the dotted path is absent or differs from the value.
    Ne(String, Value),
    /// Field at the dotted path is present.
    Exists(String),
}

impl Filter {
    pub fn eq(path: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(path.to_string(), value.into())
    }

    pub fn ne(path: &str, value: impl Into<Value>) -> Self {
        Filter::Ne(path.to_string(), value.into())
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(path, value) => get_path(document, path) == Some(value),
            Filter::Ne(path, value) => get_path(document, path) != Some(value),
            Filter::Exists(path) => get_path(document, path).is_some(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// MongoDB-style direction, `1` or `-1`.
    pub fn direction(&self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl FindQuery {
    pub fn all() -> Self {
        Self {
            filter: Filter::All,
            sort: None,
            limit: None,
        }
    }

    /// Every document carrying a value at `path`.
    pub fn with_field(path: &str) -> Self {
        Self {
            filter: Filter::Exists(path.to_string()),
            sort: None,
            limit: None,
        }
    }
}

/// Turns a `json!({...})` value into a document; anything else is empty.
pub fn document_from(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Resolves a dotted path such as `weather_data.fetched_at`.
pub fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = document.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Total order over JSON values used for sorting: numbers numerically,
/// strings lexically, mixed types by a fixed type rank.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}
