//! Dotted key paths.
//!
//! A raw key such as `"user1.hp"` addresses the field `hp` of the document
//! stored under the root key `user1`. Only one level of nesting is supported:
//! `"a.b.c"` is rejected rather than interpreted.

use std::fmt;

use crate::ValidationError;

const SEPARATOR: char = '.';

/// A parsed key: root key plus an optional nested field.
///
/// Derived from the raw key on every operation, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    root_key: String,
    nested_field: Option<String>,
}

impl KeyPath {
    /// Parse a raw dotted key.
    ///
    /// Fails with `ValidationError::InvalidKey` when the key is empty, when
    /// either side of the separator is empty, or when the nested part itself
    /// contains a separator.
    pub fn parse(raw_key: &str) -> Result<Self, ValidationError> {
        if raw_key.is_empty() {
            return Err(invalid(raw_key, "key must be a non-empty string"));
        }

        let Some((root, nested)) = raw_key.split_once(SEPARATOR) else {
            return Ok(Self::root(raw_key));
        };

        if root.is_empty() {
            return Err(invalid(raw_key, "root key must not be empty"));
        }
        if nested.is_empty() {
            return Err(invalid(raw_key, "nested field must not be empty"));
        }
        if nested.contains(SEPARATOR) {
            return Err(invalid(raw_key, "only one level of nesting is supported"));
        }

        Ok(Self {
            root_key: root.to_string(),
            nested_field: Some(nested.to_string()),
        })
    }

    /// A path addressing a whole document.
    pub fn root(root_key: impl Into<String>) -> Self {
        Self {
            root_key: root_key.into(),
            nested_field: None,
        }
    }

    pub fn root_key(&self) -> &str {
        &self.root_key
    }

    pub fn nested_field(&self) -> Option<&str> {
        self.nested_field.as_deref()
    }

    pub fn is_nested(&self) -> bool {
        self.nested_field.is_some()
    }

    /// The same root key without the nested field.
    pub fn to_root(&self) -> Self {
        Self::root(self.root_key.clone())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.nested_field {
            Some(field) => write!(f, "{}{}{}", self.root_key, SEPARATOR, field),
            None => f.write_str(&self.root_key),
        }
    }
}

fn invalid(raw_key: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidKey {
        key: raw_key.to_string(),
        reason: reason.to_string(),
    }
}
