//! Error types for subscription handling.

use crate::AuthorizationType;

/// Failure reported by a subscription endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Unauthorized for {auth_type}: {message}")]
    Unauthorized {
        auth_type: AuthorizationType,
        message: String,
    },

    #[error("Subscription rejected: {0}")]
    Rejected(String),

    #[error("Endpoint closed the subscription stream")]
    Closed,

    #[error("Unknown subscription: {0}")]
    UnknownSubscription(String),
}

/// Failure to attach authorization info to a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecorationError {
    #[error("Identity claim '{claim}' is not available for {auth_type}")]
    MissingClaim {
        auth_type: AuthorizationType,
        claim: String,
    },

    #[error("Identity claims unavailable: {0}")]
    ClaimsUnavailable(String),
}

/// Inconsistency while enumerating rule-derived candidates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Error while iterating through auth rules: {0}")]
pub struct CandidateError(pub String);

/// Errors delivered on a subscription's event channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Decoration error: {0}")]
    Decoration(#[from] DecorationError),

    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    #[error("Candidate source error: {0}")]
    CandidateSource(#[from] CandidateError),

    #[error("Undecodable subscription item: {0}")]
    Decode(String),

    #[error("No authorization candidate was available")]
    AuthExhausted,

    #[error("Engine error: {0}")]
    Engine(#[from] syncql_engine::Error),
}
