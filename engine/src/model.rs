//! Model instances handed to mutation builders.

use crate::{error::Result, Error, RecordId};
use serde::Serialize;
use serde_json::{Map, Value};

/// Read access to the field values of a model instance.
pub trait Model {
    /// Name of the model this instance belongs to.
    fn model_name(&self) -> &str;

    /// Primary key of the instance.
    fn id(&self) -> &str;

    /// Value of a declared field.
    ///
    /// `Ok(None)` means the instance does not carry the field at all;
    /// `Ok(Some(Value::Null))` means it carries an explicit null.
    fn field_value(&self, field: &str) -> Result<Option<Value>>;
}

/// A model instance backed by a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    model_name: String,
    id: RecordId,
    fields: Map<String, Value>,
}

impl ModelRecord {
    /// Create a record from a JSON object payload. The payload must carry
    /// a string `id`.
    pub fn new(model_name: impl Into<String>, payload: Value) -> Result<Self> {
        let model_name = model_name.into();
        let Value::Object(fields) = payload else {
            return Err(Error::field_access(
                model_name,
                crate::ID_FIELD,
                "payload must be an object",
            ));
        };

        let id = match fields.get(crate::ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            _ => {
                return Err(Error::field_access(
                    model_name,
                    crate::ID_FIELD,
                    "missing string id",
                ))
            }
        };

        Ok(Self {
            model_name,
            id,
            fields,
        })
    }

    /// Create a record from any serializable value.
    pub fn from_serializable<T: Serialize>(
        model_name: impl Into<String>,
        model: &T,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let payload = serde_json::to_value(model)
            .map_err(|e| Error::field_access(&model_name, "*", e.to_string()))?;
        Self::new(model_name, payload)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl Model for ModelRecord {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn field_value(&self, field: &str) -> Result<Option<Value>> {
        Ok(self.fields.get(field).cloned())
    }
}
