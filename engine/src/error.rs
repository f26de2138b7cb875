//! Error types for the syncql engine.

use thiserror::Error;

/// All possible errors from building documents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Predicate errors
    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),

    // Schema errors
    #[error("schema introspection failed for '{model}': {reason}")]
    SchemaIntrospection { model: String, reason: String },

    // Model errors
    #[error("cannot read field '{field}' of model '{model}': {reason}")]
    ModelFieldAccess {
        model: String,
        field: String,
        reason: String,
    },
}

impl Error {
    pub(crate) fn introspection(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::SchemaIntrospection {
            model: model.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn field_access(
        model: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::ModelFieldAccess {
            model: model.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::InvalidPredicate("not requires exactly one child".into());
        assert_eq!(
            err.to_string(),
            "invalid predicate: not requires exactly one child"
        );

        let err = Error::introspection("Blog", "unknown custom type 'Address'");
        assert_eq!(
            err.to_string(),
            "schema introspection failed for 'Blog': unknown custom type 'Address'"
        );

        let err = Error::field_access("Comment", "post", "reference has no id");
        assert_eq!(
            err.to_string(),
            "cannot read field 'post' of model 'Comment': reference has no id"
        );
    }
}
