//! # syncql Engine
//!
//! Builds the GraphQL documents a local-first client exchanges with a sync
//! backend.
//!
//! This crate turns a resolved model schema, a model instance and a query
//! predicate into wire-ready requests. It has no knowledge of transports,
//! credentials or storage - every function is a pure transformation.
//!
//! ## Design Principles
//!
//! - **No IO**: Engine never touches the network or the disk
//! - **Deterministic**: Same inputs always render the same document
//! - **All-or-nothing**: A failed build returns an error, never a partial document
//! - **Reentrant**: No shared mutable state, safe to call from any thread
//!
//! ## Core Concepts
//!
//! ### Schemas
//!
//! A [`ModelSchema`] lists the fields of a model, the custom types nested
//! inside it and its authorization rules.
//!
//! ### Predicates
//!
//! A [`QueryPredicate`] is a filter tree built with [`QueryField`]. The
//! [`filter`] module compiles it into the backend filter grammar.
//!
//! ### Requests
//!
//! The [`factory`] module builds a [`GraphQLRequest`] for each operation:
//! - [`build_sync_request`] - Base, delta and paginated sync queries
//! - [`build_creation_request`] - Create mutations
//! - [`build_update_request`] - Versioned, optionally conditional updates
//! - [`build_deletion_request`] - Versioned, optionally conditional deletes
//! - [`build_subscription_request`] - Create/update/delete change feeds
//!
//! ## Quick Start
//!
//! ```rust
//! use syncql_engine::{
//!     build_sync_request, build_update_request, AuthRule, FieldType, ModelField,
//!     ModelRecord, ModelSchema, QueryField, QueryPredicate,
//! };
//! use serde_json::json;
//!
//! // 1. Describe the model
//! let schema = ModelSchema::new(
//!     "Todo",
//!     vec![
//!         ModelField::required("id", FieldType::Id),
//!         ModelField::required("description", FieldType::String),
//!         ModelField::optional("owner", FieldType::String),
//!     ],
//! )
//! .with_auth_rule(AuthRule::owner());
//!
//! // 2. Build a delta sync page
//! let sync = build_sync_request(&schema, Some(1706745600000), Some(100), &QueryPredicate::all()).unwrap();
//! assert_eq!(sync.operation_name(), "SyncTodos");
//!
//! // 3. Build a conditional update
//! let todo = ModelRecord::new("Todo", json!({"id": "1", "description": "Mop", "owner": null})).unwrap();
//! let update = build_update_request(&schema, &todo, 3, &QueryField::new("description").eq("Sweep")).unwrap();
//! assert_eq!(update.variable("input"), Some(&json!({"id": "1", "description": "Mop", "_version": 3})));
//! ```

pub mod error;
pub mod factory;
pub mod filter;
pub mod model;
pub mod predicate;
pub mod request;
pub mod response;
pub mod sanitize;
pub mod schema;

// Re-export main types at crate root
pub use error::Error;
pub use factory::{
    build_creation_request, build_deletion_request, build_subscription_request, build_sync_request,
    build_update_request, SubscriptionType, DELETED_FIELD, LAST_CHANGED_AT_FIELD, VERSION_FIELD,
};
pub use filter::Filter;
pub use model::{Model, ModelRecord};
pub use predicate::{GroupType, QueryField, QueryOperator, QueryPredicate};
pub use request::{GraphQLRequest, OperationType, Selection};
pub use response::{ErrorLocation, GraphQLResponse, GraphQLResponseError, PathSegment};
pub use schema::{
    is_graphql_name, Association, AuthProvider, AuthRule, AuthStrategy, CustomTypeSchema, FieldType,
    ModelField, ModelSchema, ID_FIELD,
};

/// Type aliases for clarity
pub type RecordId = String;
pub type Version = u64;
pub type Timestamp = u64;
