//! Owner-field sanitizer for mutation input.
//!
//! The backend fills an owner field from the caller's identity when the
//! input leaves it out, but rejects an explicit `null`. Unset owner fields
//! are therefore dropped from the input before it is sent.

use crate::ModelSchema;
use serde_json::{Map, Value};

/// Remove every owner-rule field whose value is absent or `null`.
pub fn remove_null_owner_fields(schema: &ModelSchema, input: &mut Map<String, Value>) {
    for rule in schema.owner_rules() {
        if matches!(input.get(&rule.owner_field), Some(Value::Null)) {
            input.remove(&rule.owner_field);
        }
    }
}
