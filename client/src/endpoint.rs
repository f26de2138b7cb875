//! The transport seam.
//!
//! A [`SubscriptionEndpoint`] opens and releases subscriptions on the
//! backend. Signals for one request flow back over the sender handed to
//! [`SubscriptionEndpoint::request_subscription`].

use serde_json::Value;
use syncql_engine::GraphQLRequest;
use tokio::sync::mpsc;

use crate::{AuthorizationType, EndpointError};

/// A signal emitted by the endpoint for one subscription request.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointEvent {
    /// The backend acknowledged the subscription under this id
    Started(String),
    /// A raw `{data, errors}` payload
    Next(Value),
    Error(EndpointError),
    Completed,
}

pub type EndpointSender = mpsc::UnboundedSender<EndpointEvent>;
pub type EndpointReceiver = mpsc::UnboundedReceiver<EndpointEvent>;

/// Opens and releases subscriptions against a backend.
pub trait SubscriptionEndpoint: Send + Sync {
    /// Open a subscription. Must not block; signals go to `events`.
    /// Dropping `events` without a terminal signal closes the stream.
    fn request_subscription(
        &self,
        request: GraphQLRequest,
        auth_type: AuthorizationType,
        events: EndpointSender,
    );

    /// Release a subscription previously acknowledged with `Started`.
    fn release_subscription(&self, subscription_id: &str) -> Result<(), EndpointError>;
}
