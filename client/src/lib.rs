//! # syncql-client
//!
//! Subscription client for syncql backends.
//!
//! Opens change-feed subscriptions for models described by
//! [`syncql_engine::ModelSchema`]. When a model accepts several
//! authorization types, candidates are tried in order until the backend
//! acknowledges one.
//!
//! ## Architecture
//!
//! - [`auth`]: authorization types and candidate sources
//! - [`decorate`]: owner arguments for owner-protected models
//! - [`endpoint`]: the transport seam
//! - [`subscription`]: lifecycle and the candidate loop
//! - [`registry`]: live subscription tracking
//! - [`client`]: the facade tying them together
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use serde_json::Value;
//! use syncql_client::{
//!     telemetry, AuthorizationType, ClientConfig, EndpointError, EndpointSender,
//!     SubscriptionClient, SubscriptionEndpoint, SubscriptionEvent,
//! };
//! use syncql_engine::{
//!     AuthRule, FieldType, GraphQLRequest, ModelField, ModelSchema, SubscriptionType,
//! };
//!
//! /// Hands requests to the application's websocket connection.
//! struct MyEndpoint;
//!
//! impl SubscriptionEndpoint for MyEndpoint {
//!     fn request_subscription(
//!         &self,
//!         _request: GraphQLRequest,
//!         _auth_type: AuthorizationType,
//!         _events: EndpointSender,
//!     ) {
//!         // Send the request and forward its signals to `_events`.
//!     }
//!
//!     fn release_subscription(&self, _subscription_id: &str) -> Result<(), EndpointError> {
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load()?;
//! telemetry::init_tracing(&config)?;
//!
//! let posts = ModelSchema::new(
//!     "Post",
//!     vec![
//!         ModelField::required("id", FieldType::Id),
//!         ModelField::required("title", FieldType::String),
//!         ModelField::optional("owner", FieldType::String),
//!     ],
//! )
//! .with_auth_rule(AuthRule::owner())
//! .with_auth_rule(AuthRule::public());
//!
//! let client = SubscriptionClient::new(Arc::new(MyEndpoint), config);
//! let (operation, mut events) = client.subscribe::<Value>(&posts, SubscriptionType::OnCreate)?;
//! operation.start();
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         SubscriptionEvent::Next(response) => println!("{:?}", response.data),
//!         SubscriptionEvent::Error(e) => eprintln!("{}", e),
//!         SubscriptionEvent::Completed => break,
//!         SubscriptionEvent::Started(_) => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod decorate;
pub mod endpoint;
pub mod error;
pub mod registry;
pub mod subscription;
pub mod telemetry;

pub use auth::{AuthCandidate, AuthCandidates, AuthorizationType, RuleCandidates};
pub use client::SubscriptionClient;
pub use config::{ClientConfig, ConfigError};
pub use decorate::{
    IdentityClaims, NoopDecorator, OwnerClaimDecorator, RequestDecorator, StaticClaims,
};
pub use endpoint::{EndpointEvent, EndpointSender, SubscriptionEndpoint};
pub use error::{CandidateError, DecorationError, EndpointError, SubscriptionError};
pub use registry::{ManagedSubscription, SubscriptionRegistry};
pub use subscription::{
    SubscriptionEvent, SubscriptionEvents, SubscriptionOperation, SubscriptionOperationBuilder,
    SubscriptionState,
};
