//! Filters for scanning a cached collection.
//!
//! The caller picks the filter shape explicitly; no runtime inspection of the
//! argument decides how matching works.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{json_type_name, Document, ValidationError};

type PredicateFn = dyn Fn(&Document) -> bool + Send + Sync;

/// Filter over cached documents.
#[derive(Clone)]
pub enum Filter {
    /// Every listed field of the document value must equal the given value.
    Fields(Map<String, Value>),
    /// Arbitrary predicate invoked once per document.
    Predicate(Arc<PredicateFn>),
    /// Containment check of a scalar against the document value.
    Contains(Value),
}

impl Filter {
    /// Build a field-equality filter from a JSON object.
    ///
    /// # Errors
    ///
    /// `ValidationError::NotAnObject` if `fields` is not an object.
    pub fn fields(fields: Value) -> Result<Self, ValidationError> {
        match fields {
            Value::Object(map) => Ok(Filter::Fields(map)),
            other => Err(ValidationError::NotAnObject {
                context: "field filter".to_string(),
                received: json_type_name(&other),
            }),
        }
    }

    /// Build a predicate filter.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Document) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Arc::new(f))
    }

    /// Build a containment filter.
    pub fn contains(needle: impl Into<Value>) -> Self {
        Filter::Contains(needle.into())
    }

    /// Test a single document.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::Fields(fields) => fields.iter().all(|(name, expected)| {
                document
                    .value
                    .get(name)
                    .is_some_and(|actual| loose_eq(actual, expected))
            }),
            Filter::Predicate(predicate) => predicate(document),
            Filter::Contains(needle) => contains(&document.value, needle),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Filter::Predicate(_) => f.write_str("Predicate(<fn>)"),
            Filter::Contains(needle) => f.debug_tuple("Contains").field(needle).finish(),
        }
    }
}

/// Strings match by substring, arrays by element, objects by key name or
/// field value, everything else by equality.
fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::String(text), Value::String(part)) => text.contains(part.as_str()),
        (Value::Array(elements), _) => elements.iter().any(|e| loose_eq(e, needle)),
        (Value::Object(fields), Value::String(name)) if fields.contains_key(name) => true,
        (Value::Object(fields), _) => fields.values().any(|v| loose_eq(v, needle)),
        _ => loose_eq(haystack, needle),
    }
}

/// Equality that treats `1` and `1.0` as the same number.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}
