//! Client facade.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use syncql_engine::{build_subscription_request, ModelSchema, SubscriptionType};

use crate::{
    AuthCandidates, ClientConfig, IdentityClaims, NoopDecorator, OwnerClaimDecorator,
    RequestDecorator, RuleCandidates, SubscriptionEndpoint, SubscriptionError, SubscriptionEvents,
    SubscriptionOperation, SubscriptionRegistry,
};

/// Opens model subscriptions against an endpoint.
pub struct SubscriptionClient {
    endpoint: Arc<dyn SubscriptionEndpoint>,
    claims: Option<Arc<dyn IdentityClaims>>,
    config: ClientConfig,
    registry: Arc<SubscriptionRegistry>,
}

impl SubscriptionClient {
    pub fn new(endpoint: Arc<dyn SubscriptionEndpoint>, config: ClientConfig) -> Self {
        Self {
            endpoint,
            claims: None,
            config,
            registry: SubscriptionRegistry::new_shared(),
        }
    }

    /// Enable owner decoration using the caller's token claims.
    pub fn with_claims(mut self, claims: Arc<dyn IdentityClaims>) -> Self {
        self.claims = Some(claims);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    /// Candidate source for a model.
    ///
    /// Rule-derived when multi-auth is enabled and the model declares rules,
    /// the configured default otherwise.
    pub fn candidates_for(&self, schema: &ModelSchema) -> AuthCandidates {
        if self.config.multi_auth && !schema.auth_rules.is_empty() {
            AuthCandidates::RuleDerived(RuleCandidates::from_rules(&schema.auth_rules))
        } else {
            AuthCandidates::Fixed(self.config.default_auth_type)
        }
    }

    /// Build and register a subscription to a model's change feed.
    ///
    /// The returned operation is idle; call
    /// [`SubscriptionOperation::start`] to begin.
    pub fn subscribe<T>(
        &self,
        schema: &ModelSchema,
        subscription_type: SubscriptionType,
    ) -> Result<(SubscriptionOperation<T>, SubscriptionEvents<T>), SubscriptionError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let request = build_subscription_request(schema, subscription_type)?;
        let decorator: Arc<dyn RequestDecorator> = match &self.claims {
            Some(claims) => {
                let schema = Arc::new(schema.clone());
                Arc::new(OwnerClaimDecorator::new(schema, Arc::clone(claims)))
            }
            None => Arc::new(NoopDecorator),
        };

        let (operation, events) = SubscriptionOperation::builder()
            .request(request)
            .candidates(self.candidates_for(schema))
            .endpoint(Arc::clone(&self.endpoint))
            .decorator(decorator)
            .build()?;

        self.registry.prune();
        self.registry.register(&operation);

        tracing::debug!(
            subscription = %operation.instance_id(),
            model = %schema.name,
            field = %operation.request().field(),
            "Subscription created"
        );

        Ok((operation, events))
    }

    /// Cancel every subscription opened by this client.
    pub fn shutdown(&self) -> usize {
        self.registry.cancel_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthorizationType, EndpointError, EndpointSender};
    use syncql_engine::{AuthRule, FieldType, GraphQLRequest, ModelField};

    struct NullEndpoint;

    impl SubscriptionEndpoint for NullEndpoint {
        fn request_subscription(
            &self,
            _request: GraphQLRequest,
            _auth_type: AuthorizationType,
            _events: EndpointSender,
        ) {
        }

        fn release_subscription(&self, _subscription_id: &str) -> Result<(), EndpointError> {
            Ok(())
        }
    }

    fn schema() -> ModelSchema {
        ModelSchema::new("Post", vec![ModelField::required("id", FieldType::Id)])
            .with_auth_rule(AuthRule::public())
            .with_auth_rule(AuthRule::owner())
    }

    #[test]
    fn fixed_candidates_without_multi_auth() {
        let client = SubscriptionClient::new(Arc::new(NullEndpoint), ClientConfig::default());
        assert!(matches!(
            client.candidates_for(&schema()),
            AuthCandidates::Fixed(AuthorizationType::ApiKey)
        ));
    }

    #[test]
    fn rule_candidates_with_multi_auth() {
        let config = ClientConfig {
            multi_auth: true,
            ..ClientConfig::default()
        };
        let client = SubscriptionClient::new(Arc::new(NullEndpoint), config);
        assert!(matches!(
            client.candidates_for(&schema()),
            AuthCandidates::RuleDerived(_)
        ));

        let bare = ModelSchema::new("Tag", vec![ModelField::required("id", FieldType::Id)]);
        assert!(matches!(
            client.candidates_for(&bare),
            AuthCandidates::Fixed(AuthorizationType::ApiKey)
        ));
    }

    #[tokio::test]
    async fn subscribe_registers_operation() {
        let client = SubscriptionClient::new(Arc::new(NullEndpoint), ClientConfig::default());
        let (operation, _events) = client
            .subscribe::<serde_json::Value>(&schema(), SubscriptionType::OnUpdate)
            .unwrap();

        assert_eq!(operation.request().field(), "onUpdatePost");
        assert_eq!(client.registry().len(), 1);
        assert_eq!(client.shutdown(), 1);
    }

    #[tokio::test]
    async fn subscribe_rejects_invalid_schema() {
        let client = SubscriptionClient::new(Arc::new(NullEndpoint), ClientConfig::default());
        let broken = ModelSchema::new(
            "Place",
            vec![
                ModelField::required("id", FieldType::Id),
                ModelField::optional("location", FieldType::CustomType("Location".into())),
            ],
        );
        let result = client.subscribe::<serde_json::Value>(&broken, SubscriptionType::OnCreate);
        assert!(matches!(result, Err(SubscriptionError::Engine(_))));
    }
}
