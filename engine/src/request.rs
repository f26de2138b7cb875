//! GraphQL request documents.
//!
//! A [`GraphQLRequest`] keeps the document in structured form so callers can
//! bind extra variables (owner claims, pagination tokens) after it was
//! built. The text form is rendered on demand and is deterministic:
//! variables and arguments are sorted by name, selections keep the order
//! they were built in.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;

const INDENT: &str = "  ";

/// The kind of root operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::Query => write!(f, "query"),
            OperationType::Mutation => write!(f, "mutation"),
            OperationType::Subscription => write!(f, "subscription"),
        }
    }
}

/// One entry of a selection set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub children: Vec<Selection>,
}

impl Selection {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn node(name: impl Into<String>, children: Vec<Selection>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    fn render(&self, out: &mut String, depth: usize) {
        let pad = INDENT.repeat(depth);
        if self.children.is_empty() {
            let _ = writeln!(out, "{}{}", pad, self.name);
            return;
        }
        let _ = writeln!(out, "{}{} {{", pad, self.name);
        for child in &self.children {
            child.render(out, depth + 1);
        }
        let _ = writeln!(out, "{}}}", pad);
    }
}

/// A GraphQL operation with its variables.
///
/// Every declared variable is passed to the root field as an argument of
/// the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQLRequest {
    operation_type: OperationType,
    operation_name: String,
    field: String,
    model_name: String,
    variable_types: BTreeMap<String, String>,
    variables: BTreeMap<String, Value>,
    selection: Vec<Selection>,
}

impl GraphQLRequest {
    /// Create a request without variables.
    pub fn new(
        operation_type: OperationType,
        operation_name: impl Into<String>,
        field: impl Into<String>,
        model_name: impl Into<String>,
        selection: Vec<Selection>,
    ) -> Self {
        Self {
            operation_type,
            operation_name: operation_name.into(),
            field: field.into(),
            model_name: model_name.into(),
            variable_types: BTreeMap::new(),
            variables: BTreeMap::new(),
            selection,
        }
    }

    /// Bind a new variable of the given GraphQL type and pass it to the
    /// root field. Rebinding an existing name replaces it.
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        graphql_type: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let name = name.into();
        self.variable_types
            .insert(name.clone(), graphql_type.into());
        self.variables.insert(name, value.into());
        self
    }

    /// Continue a paginated sync from the token returned by the previous page.
    pub fn next_page(self, next_token: impl Into<String>) -> Self {
        self.with_variable("nextToken", "String", next_token.into())
    }

    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    /// Name of the root field, e.g. `syncPosts`.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn variables(&self) -> &BTreeMap<String, Value> {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Declared GraphQL type of a variable.
    pub fn variable_type(&self, name: &str) -> Option<&str> {
        self.variable_types.get(name).map(String::as_str)
    }

    pub fn selection(&self) -> &[Selection] {
        &self.selection
    }

    /// Render the document text.
    pub fn content(&self) -> String {
        let mut out = String::new();

        let _ = write!(out, "{} {}", self.operation_type, self.operation_name);
        if !self.variable_types.is_empty() {
            let declarations: Vec<String> = self
                .variable_types
                .iter()
                .map(|(name, ty)| format!("${}: {}", name, ty))
                .collect();
            let _ = write!(out, "({})", declarations.join(", "));
        }
        out.push_str(" {\n");

        let _ = write!(out, "{}{}", INDENT, self.field);
        if !self.variable_types.is_empty() {
            let arguments: Vec<String> = self
                .variable_types
                .keys()
                .map(|name| format!("{}: ${}", name, name))
                .collect();
            let _ = write!(out, "({})", arguments.join(", "));
        }
        out.push_str(" {\n");

        for selection in &self.selection {
            selection.render(&mut out, 2);
        }

        let _ = writeln!(out, "{}}}", INDENT);
        out.push_str("}\n");
        out
    }

    /// The `{"query", "variables"}` payload sent over the wire.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "query": self.content(),
            "variables": self.variables,
        })
    }
}

impl Serialize for GraphQLRequest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            query: String,
            variables: &'a BTreeMap<String, Value>,
        }

        Wire {
            query: self.content(),
            variables: &self.variables,
        }
        .serialize(serializer)
    }
}
