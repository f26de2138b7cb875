//! Registry of live subscriptions.
//!
//! Tracks every subscription opened through a client so they can be
//! canceled together on shutdown.

use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;

use crate::{SubscriptionOperation, SubscriptionState};

/// Type-erased view of a subscription.
pub trait ManagedSubscription: Send + Sync {
    fn cancel(&self);
    fn state(&self) -> SubscriptionState;
}

impl<T> ManagedSubscription for SubscriptionOperation<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn cancel(&self) {
        SubscriptionOperation::cancel(self)
    }

    fn state(&self) -> SubscriptionState {
        SubscriptionOperation::state(self)
    }
}

/// Subscriptions keyed by instance id.
///
/// Thread-safe and can be shared via `Arc`.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: DashMap<String, Arc<dyn ManagedSubscription>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Track a subscription. Returns its instance id.
    pub fn register<T>(&self, operation: &SubscriptionOperation<T>) -> String
    where
        T: DeserializeOwned + Send + 'static,
    {
        let instance_id = operation.instance_id().to_string();
        self.subscriptions
            .insert(instance_id.clone(), Arc::new(operation.clone()));

        tracing::debug!(subscription = %instance_id, "Subscription registered");

        instance_id
    }

    pub fn unregister(&self, instance_id: &str) -> bool {
        let removed = self.subscriptions.remove(instance_id).is_some();
        if removed {
            tracing::debug!(subscription = %instance_id, "Subscription unregistered");
        }
        removed
    }

    pub fn state(&self, instance_id: &str) -> Option<SubscriptionState> {
        self.subscriptions.get(instance_id).map(|s| s.state())
    }

    /// Drop subscriptions that reached a terminal state.
    ///
    /// Returns the number removed.
    pub fn prune(&self) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|_, s| !s.state().is_terminal());
        before - self.subscriptions.len()
    }

    /// Cancel and forget every subscription.
    ///
    /// Returns the number canceled.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<String> = self
            .subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        let mut canceled = 0;
        for id in ids {
            if let Some((_, subscription)) = self.subscriptions.remove(&id) {
                subscription.cancel();
                canceled += 1;
            }
        }

        tracing::info!(canceled, "Canceled all subscriptions");

        canceled
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
