//! Subscription lifecycle and orchestration.

mod events;
mod operation;
mod state;

pub use events::{SubscriptionEvent, SubscriptionEvents};
pub use operation::{SubscriptionOperation, SubscriptionOperationBuilder};
pub use state::SubscriptionState;
