//! Value codec: element tagging and one-level nested merges.

use serde_json::{Map, Value};

use crate::{json_type_name, new_element_id, KeyPath, ValidationError, ELEMENT_ID_FIELD};

/// Attach a fresh identifier to every object element that lacks one.
///
/// Scalars, nested arrays and objects that already carry a non-null
/// identifier pass through untouched, so tagging twice is a no-op.
///
/// # Errors
///
/// `ValidationError::NotAnArray` if `values` is not an array.
pub fn tag_array_elements(values: Value) -> Result<Value, ValidationError> {
    match values {
        Value::Array(mut elements) => {
            tag_elements(&mut elements);
            Ok(Value::Array(elements))
        }
        other => Err(ValidationError::NotAnArray {
            context: "array element tagging".to_string(),
            received: json_type_name(&other),
        }),
    }
}

/// In-place variant of [`tag_array_elements`] for an already unwrapped array.
pub fn tag_elements(elements: &mut [Value]) {
    for element in elements.iter_mut() {
        if let Value::Object(fields) = element {
            let tagged = fields
                .get(ELEMENT_ID_FIELD)
                .is_some_and(|id| !id.is_null());
            if !tagged {
                fields.insert(ELEMENT_ID_FIELD.to_string(), Value::String(new_element_id()));
            }
        }
    }
}

/// Parse `raw_key` and merge `new_value` into `existing` at that path.
pub fn merge_nested(raw_key: &str, new_value: Value, existing: Value) -> Result<Value, ValidationError> {
    let path = KeyPath::parse(raw_key)?;
    Ok(merge_at(&path, new_value, existing))
}

/// Merge `new_value` into `existing` at an already parsed path.
///
/// Without a nested field the new value replaces the document wholesale.
/// With one, the field is set on `existing` and its other fields are kept.
/// A non-object `existing` is coerced to an object holding only that field.
pub fn merge_at(path: &KeyPath, new_value: Value, existing: Value) -> Value {
    let Some(field) = path.nested_field() else {
        return new_value;
    };

    let mut fields = match existing {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    fields.insert(field.to_string(), new_value);
    Value::Object(fields)
}

/// Read the value addressed by `path` inside a document value.
///
/// Returns `None` when the nested field does not exist or the document is not
/// an object.
pub fn read_at<'a>(path: &KeyPath, value: &'a Value) -> Option<&'a Value> {
    match path.nested_field() {
        Some(field) => value.as_object().and_then(|fields| fields.get(field)),
        None => Some(value),
    }
}

/// Remove the nested field addressed by `path` from a document value.
///
/// Returns the value unchanged if there is no nested field to remove.
pub fn remove_at(path: &KeyPath, value: Value) -> Value {
    match (path.nested_field(), value) {
        (Some(field), Value::Object(mut fields)) => {
            fields.remove(field);
            Value::Object(fields)
        }
        (_, value) => value,
    }
}
