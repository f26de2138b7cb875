//! Events delivered to the subscriber.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use syncql_engine::GraphQLResponse;
use tokio::sync::mpsc;

use crate::SubscriptionError;

/// A subscriber-facing signal.
///
/// `Started` precedes every `Next`. `Error` and `Completed` are terminal,
/// except for an `Error` reporting a failed release after cancellation.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent<T> {
    Started(String),
    Next(GraphQLResponse<T>),
    Error(SubscriptionError),
    Completed,
}

pub(crate) type EventSender<T> = mpsc::UnboundedSender<SubscriptionEvent<T>>;

/// Receiving half of a subscription's event channel.
#[derive(Debug)]
pub struct SubscriptionEvents<T> {
    receiver: mpsc::UnboundedReceiver<SubscriptionEvent<T>>,
}

impl<T> SubscriptionEvents<T> {
    pub(crate) fn channel() -> (EventSender<T>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }

    /// Wait for the next event. `None` once the operation is gone and
    /// every event has been read.
    pub async fn recv(&mut self) -> Option<SubscriptionEvent<T>> {
        self.receiver.recv().await
    }

    /// Take an event if one is queued.
    pub fn try_recv(&mut self) -> Option<SubscriptionEvent<T>> {
        self.receiver.try_recv().ok()
    }
}

impl<T> Stream for SubscriptionEvents<T> {
    type Item = SubscriptionEvent<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
