//! GraphQL response envelope.

use serde::{Deserialize, Serialize};

/// Source location of an error within the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub line: u32,
    pub column: u32,
}

/// Path segment pointing into the response data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(i64),
}

/// An error entry returned next to (or instead of) the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLResponseError {
    pub message: String,
    #[serde(default)]
    pub locations: Vec<ErrorLocation>,
    #[serde(default)]
    pub path: Vec<PathSegment>,
    /// Backend specific details, e.g. `errorType`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

/// A decoded response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GraphQLResponse<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQLResponseError>,
}

impl<T> GraphQLResponse<T> {
    pub fn new(data: Option<T>, errors: Vec<GraphQLResponseError>) -> Self {
        Self { data, errors }
    }

    /// Returns `true` if no errors were returned.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
