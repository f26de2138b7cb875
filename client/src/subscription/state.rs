//! Subscription lifecycle.

use serde::Serialize;
use tokio::task::AbortHandle;

use crate::auth::CandidateCursor;

/// Observable lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubscriptionState {
    /// Built but not started
    Idle,
    /// Trying authorization candidates
    Starting,
    /// Acknowledged by the endpoint and delivering items
    Active,
    /// The endpoint finished the subscription
    Completed,
    /// Canceled by the caller
    Canceled,
    /// Ended with an error
    Failed,
}

impl SubscriptionState {
    /// Terminal states never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubscriptionState::Completed | SubscriptionState::Canceled | SubscriptionState::Failed
        )
    }
}

/// Internal phase. The subscription id appears once, on activation, and
/// is carried into every later phase.
#[derive(Debug)]
pub(crate) enum Phase {
    Idle,
    Starting,
    Active { subscription_id: String },
    Completed { subscription_id: String },
    Canceled { subscription_id: Option<String> },
    Failed { subscription_id: Option<String> },
}

impl Phase {
    pub fn state(&self) -> SubscriptionState {
        match self {
            Phase::Idle => SubscriptionState::Idle,
            Phase::Starting => SubscriptionState::Starting,
            Phase::Active { .. } => SubscriptionState::Active,
            Phase::Completed { .. } => SubscriptionState::Completed,
            Phase::Canceled { .. } => SubscriptionState::Canceled,
            Phase::Failed { .. } => SubscriptionState::Failed,
        }
    }

    pub fn subscription_id(&self) -> Option<&str> {
        match self {
            Phase::Idle | Phase::Starting => None,
            Phase::Active { subscription_id } | Phase::Completed { subscription_id } => {
                Some(subscription_id)
            }
            Phase::Canceled { subscription_id } | Phase::Failed { subscription_id } => {
                subscription_id.as_deref()
            }
        }
    }

    pub fn active_id(&self) -> Option<&str> {
        match self {
            Phase::Active { subscription_id } => Some(subscription_id),
            _ => None,
        }
    }
}

/// Everything guarded by the operation's lock.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    pub phase: Phase,
    /// Background task driving the candidate loop
    pub task: Option<AbortHandle>,
    /// Consumed by `start`
    pub candidates: Option<CandidateCursor>,
}

impl Lifecycle {
    pub fn new(candidates: CandidateCursor) -> Self {
        Self {
            phase: Phase::Idle,
            task: None,
            candidates: Some(candidates),
        }
    }

    pub fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!SubscriptionState::Idle.is_terminal());
        assert!(!SubscriptionState::Starting.is_terminal());
        assert!(!SubscriptionState::Active.is_terminal());
        assert!(SubscriptionState::Completed.is_terminal());
        assert!(SubscriptionState::Canceled.is_terminal());
        assert!(SubscriptionState::Failed.is_terminal());
    }

    #[test]
    fn id_is_carried_into_terminal_phases() {
        let phase = Phase::Canceled {
            subscription_id: Some("sub-1".into()),
        };
        assert_eq!(phase.state(), SubscriptionState::Canceled);
        assert_eq!(phase.subscription_id(), Some("sub-1"));
        assert_eq!(phase.active_id(), None);

        let phase = Phase::Active {
            subscription_id: "sub-2".into(),
        };
        assert_eq!(phase.active_id(), Some("sub-2"));
        assert_eq!(Phase::Starting.subscription_id(), None);
    }
}
