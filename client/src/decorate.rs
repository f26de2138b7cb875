//! Request decoration.
//!
//! Owner-protected models only deliver subscription events to the owner,
//! so the subscription must name the owner as an argument. The value comes
//! from the caller's identity token.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use syncql_engine::{AuthRule, AuthStrategy, GraphQLRequest, ModelSchema, OperationType};

use crate::{AuthorizationType, DecorationError};

/// Attaches authorization specific arguments to a request.
pub trait RequestDecorator: Send + Sync {
    fn decorate(
        &self,
        request: GraphQLRequest,
        auth_type: AuthorizationType,
    ) -> Result<GraphQLRequest, DecorationError>;
}

/// Passes requests through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDecorator;

impl RequestDecorator for NoopDecorator {
    fn decorate(
        &self,
        request: GraphQLRequest,
        _auth_type: AuthorizationType,
    ) -> Result<GraphQLRequest, DecorationError> {
        Ok(request)
    }
}

/// Source of the caller's token claims.
pub trait IdentityClaims: Send + Sync {
    /// Claim `name` of the token used for `auth_type`, if any.
    fn claim(
        &self,
        auth_type: AuthorizationType,
        name: &str,
    ) -> Result<Option<Value>, DecorationError>;
}

/// Fixed claims, identical for every authorization type.
#[derive(Debug, Clone, Default)]
pub struct StaticClaims {
    claims: HashMap<String, Value>,
}

impl StaticClaims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }
}

impl IdentityClaims for StaticClaims {
    fn claim(
        &self,
        _auth_type: AuthorizationType,
        name: &str,
    ) -> Result<Option<Value>, DecorationError> {
        Ok(self.claims.get(name).cloned())
    }
}

/// Adds owner arguments to subscriptions on owner-protected models.
///
/// Only subscription requests made with a user identity (user pools or
/// OIDC) are touched. Callers in one of the model's read groups see every
/// record and are left undecorated.
pub struct OwnerClaimDecorator {
    schema: Arc<ModelSchema>,
    claims: Arc<dyn IdentityClaims>,
}

impl OwnerClaimDecorator {
    pub fn new(schema: Arc<ModelSchema>, claims: Arc<dyn IdentityClaims>) -> Self {
        Self { schema, claims }
    }

    fn in_read_group(&self, auth_type: AuthorizationType) -> Result<bool, DecorationError> {
        for rule in self
            .schema
            .auth_rules
            .iter()
            .filter(|r| r.strategy == AuthStrategy::Group)
        {
            let Some(value) = self.claims.claim(auth_type, &rule.group_claim)? else {
                continue;
            };
            if caller_groups(&value).any(|g| rule.groups.iter().any(|rg| rg == g)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn owner_value(
        &self,
        auth_type: AuthorizationType,
        rule: &AuthRule,
    ) -> Result<String, DecorationError> {
        let missing = || DecorationError::MissingClaim {
            auth_type,
            claim: rule.identity_claim.clone(),
        };
        match self.claims.claim(auth_type, &rule.identity_claim)? {
            Some(Value::String(s)) if !s.is_empty() => Ok(s),
            _ => Err(missing()),
        }
    }
}

impl RequestDecorator for OwnerClaimDecorator {
    fn decorate(
        &self,
        request: GraphQLRequest,
        auth_type: AuthorizationType,
    ) -> Result<GraphQLRequest, DecorationError> {
        if request.operation_type() != OperationType::Subscription
            || !auth_type.has_identity()
            || !self.schema.has_owner_rule()
        {
            return Ok(request);
        }
        if self.in_read_group(auth_type)? {
            return Ok(request);
        }

        let mut request = request;
        for rule in self.schema.owner_rules() {
            let owner = self.owner_value(auth_type, rule)?;
            request = request.with_variable(rule.owner_field.clone(), "String!", owner);
        }
        Ok(request)
    }
}

// Group claims are either a list or a single space separated string.
fn caller_groups(value: &Value) -> Box<dyn Iterator<Item = &str> + '_> {
    match value {
        Value::Array(items) => Box::new(items.iter().filter_map(Value::as_str)),
        Value::String(s) => Box::new(s.split_whitespace()),
        _ => Box::new(std::iter::empty()),
    }
}
