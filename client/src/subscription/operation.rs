//! Multi-auth subscription orchestration.
//!
//! A [`SubscriptionOperation`] tries authorization candidates in order until
//! the endpoint acknowledges one, then forwards decoded items until the
//! subscription completes, fails or is canceled.
//!
//! All lifecycle transitions and event emissions happen under a single
//! lock, so the subscriber sees a consistent sequence: `Started` before any
//! `Next`, nothing after a terminal event, and nothing from a canceled
//! subscription.
//!
//! Canceling while an attempt is in flight does not drop the attempt: the
//! endpoint may still acknowledge it, and that late subscription is
//! released.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use syncql_engine::{GraphQLRequest, GraphQLResponse};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::events::{EventSender, SubscriptionEvent, SubscriptionEvents};
use super::state::{Lifecycle, Phase, SubscriptionState};
use crate::auth::{AuthCandidates, CandidateCursor};
use crate::decorate::{NoopDecorator, RequestDecorator};
use crate::endpoint::{EndpointEvent, EndpointReceiver, SubscriptionEndpoint};
use crate::{EndpointError, SubscriptionError};

/// How long a canceled attempt waits for a late acknowledgment to release.
const LATE_ACK_WINDOW: Duration = Duration::from_secs(30);

/// Handle to a single subscription.
///
/// Cheap to clone; clones control the same subscription.
pub struct SubscriptionOperation<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SubscriptionOperation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T> {
    instance_id: String,
    request: GraphQLRequest,
    endpoint: Arc<dyn SubscriptionEndpoint>,
    decorator: Arc<dyn RequestDecorator>,
    runtime: Handle,
    lifecycle: Mutex<Lifecycle>,
    /// Flipped once, when the first acknowledgment is accepted
    started: AtomicBool,
    cancel: CancellationToken,
    events: EventSender<T>,
}

/// Builder for [`SubscriptionOperation`].
pub struct SubscriptionOperationBuilder<T> {
    request: Option<GraphQLRequest>,
    candidates: Option<AuthCandidates>,
    endpoint: Option<Arc<dyn SubscriptionEndpoint>>,
    decorator: Option<Arc<dyn RequestDecorator>>,
    runtime: Option<Handle>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for SubscriptionOperationBuilder<T> {
    fn default() -> Self {
        Self {
            request: None,
            candidates: None,
            endpoint: None,
            decorator: None,
            runtime: None,
            _marker: PhantomData,
        }
    }
}

impl<T> SubscriptionOperationBuilder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub fn request(mut self, request: GraphQLRequest) -> Self {
        self.request = Some(request);
        self
    }

    pub fn candidates(mut self, candidates: AuthCandidates) -> Self {
        self.candidates = Some(candidates);
        self
    }

    pub fn endpoint(mut self, endpoint: Arc<dyn SubscriptionEndpoint>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Defaults to [`NoopDecorator`].
    pub fn decorator(mut self, decorator: Arc<dyn RequestDecorator>) -> Self {
        self.decorator = Some(decorator);
        self
    }

    /// Runtime the candidate loop runs on. Defaults to the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(
        self,
    ) -> Result<(SubscriptionOperation<T>, SubscriptionEvents<T>), SubscriptionError> {
        let request = self
            .request
            .ok_or_else(|| usage("a subscription request is required"))?;
        let candidates = self
            .candidates
            .ok_or_else(|| usage("an auth candidate source is required"))?;
        let endpoint = self
            .endpoint
            .ok_or_else(|| usage("a subscription endpoint is required"))?;
        let decorator = self.decorator.unwrap_or_else(|| Arc::new(NoopDecorator));
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current()
                .map_err(|e| usage(format!("no tokio runtime: {}", e)))?,
        };

        let (events, receiver) = SubscriptionEvents::channel();
        let inner = Inner {
            instance_id: uuid::Uuid::new_v4().to_string(),
            request,
            endpoint,
            decorator,
            runtime,
            lifecycle: Mutex::new(Lifecycle::new(CandidateCursor::from(candidates))),
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            events,
        };

        Ok((
            SubscriptionOperation {
                inner: Arc::new(inner),
            },
            receiver,
        ))
    }
}

impl<T> SubscriptionOperation<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub fn builder() -> SubscriptionOperationBuilder<T> {
        SubscriptionOperationBuilder::default()
    }

    /// Begin trying candidates on the background runtime.
    ///
    /// Only valid once, from `Idle`. Any other call reports a
    /// [`SubscriptionError::Usage`] on the event channel.
    pub fn start(&self) {
        let inner = &self.inner;
        let mut guard = inner.lock();
        let lifecycle = &mut *guard;

        let candidates = match (&lifecycle.phase, lifecycle.candidates.take()) {
            (Phase::Idle, Some(candidates)) => candidates,
            (Phase::Canceled { .. }, _) => {
                let error = usage("subscription was canceled before it was started");
                inner.emit(SubscriptionEvent::Error(error));
                return;
            }
            _ => {
                let error = usage("subscription was already started");
                inner.emit(SubscriptionEvent::Error(error));
                return;
            }
        };

        lifecycle.phase = Phase::Starting;
        let task = inner.runtime.spawn(Arc::clone(inner).run(candidates));
        lifecycle.task = Some(task.abort_handle());

        tracing::debug!(
            subscription = %inner.instance_id,
            field = %inner.request.field(),
            "Subscription starting"
        );
    }

    /// Stop the subscription.
    ///
    /// Releases the endpoint subscription if one was acknowledged, or stops
    /// the candidate loop otherwise. Calling it again is a no-op. A failed
    /// release is reported on the event channel; the state stays
    /// `Canceled`.
    pub fn cancel(&self) {
        let inner = &self.inner;
        let mut guard = inner.lock();
        let lifecycle = &mut *guard;

        let released = match &lifecycle.phase {
            Phase::Idle => {
                lifecycle.candidates = None;
                lifecycle.phase = Phase::Canceled {
                    subscription_id: None,
                };
                None
            }
            Phase::Starting => {
                // The loop stays alive to release a late acknowledgment.
                lifecycle.task = None;
                lifecycle.phase = Phase::Canceled {
                    subscription_id: None,
                };
                None
            }
            Phase::Active { subscription_id } => {
                let subscription_id = subscription_id.clone();
                lifecycle.abort_task();
                lifecycle.phase = Phase::Canceled {
                    subscription_id: Some(subscription_id.clone()),
                };
                Some(subscription_id)
            }
            Phase::Completed { .. } | Phase::Canceled { .. } | Phase::Failed { .. } => {
                tracing::debug!(subscription = %inner.instance_id, "Nothing to cancel");
                return;
            }
        };
        inner.cancel.cancel();
        drop(guard);

        tracing::debug!(subscription = %inner.instance_id, "Cancelling subscription");

        if let Some(subscription_id) = released {
            if let Err(e) = inner.endpoint.release_subscription(&subscription_id) {
                tracing::warn!(
                    subscription = %inner.instance_id,
                    subscription_id = %subscription_id,
                    error = %e,
                    "Failed to release subscription"
                );
                inner.emit(SubscriptionEvent::Error(SubscriptionError::Endpoint(e)));
            }
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.inner.lock().phase.state()
    }

    /// Id assigned by the endpoint, once acknowledged.
    pub fn subscription_id(&self) -> Option<String> {
        let lifecycle = self.inner.lock();
        lifecycle.phase.subscription_id().map(str::to_string)
    }

    /// Locally generated id of this operation.
    pub fn instance_id(&self) -> &str {
        &self.inner.instance_id
    }

    pub fn request(&self) -> &GraphQLRequest {
        &self.inner.request
    }
}

impl<T> Inner<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SubscriptionEvent<T>) {
        // The subscriber may have dropped its receiver.
        let _ = self.events.send(event);
    }

    fn is_starting(&self) -> bool {
        matches!(self.lock().phase, Phase::Starting)
    }

    /// The candidate loop.
    async fn run(self: Arc<Self>, mut candidates: CandidateCursor) {
        tracing::debug!(
            subscription = %self.instance_id,
            document = %self.request.content(),
            "Requesting subscription"
        );

        let mut attempts = 0usize;
        loop {
            if !self.is_starting() {
                return;
            }

            let attempt = match candidates.next_attempt() {
                Some(Ok(attempt)) => attempt,
                Some(Err(e)) => {
                    self.fail(SubscriptionError::CandidateSource(e));
                    return;
                }
                None => {
                    if attempts == 0 {
                        self.fail(SubscriptionError::AuthExhausted);
                    }
                    return;
                }
            };
            attempts += 1;
            let has_next = candidates.has_next();

            tracing::debug!(
                subscription = %self.instance_id,
                auth_type = %attempt.auth_type,
                attempt = attempts,
                "Attempting subscription"
            );

            let request = if attempt.decorate {
                let request = self.request.clone();
                match self.decorator.decorate(request, attempt.auth_type) {
                    Ok(request) => request,
                    Err(_) if has_next => continue,
                    Err(e) => {
                        self.fail(SubscriptionError::Decoration(e));
                        return;
                    }
                }
            } else {
                self.request.clone()
            };

            let (sender, mut receiver) = mpsc::unbounded_channel();
            self.endpoint
                .request_subscription(request, attempt.auth_type, sender);

            match self.await_start(&mut receiver).await {
                StartOutcome::Started(subscription_id) => {
                    if self.activate(subscription_id) {
                        self.forward(receiver).await;
                    }
                    return;
                }
                StartOutcome::Canceled => {
                    self.drain_canceled(receiver).await;
                    return;
                }
                StartOutcome::Rejected(e) if has_next => {
                    tracing::debug!(
                        subscription = %self.instance_id,
                        auth_type = %attempt.auth_type,
                        error = %e,
                        "Candidate rejected, trying next"
                    );
                }
                StartOutcome::Rejected(e) => {
                    self.fail(SubscriptionError::Endpoint(e));
                    return;
                }
            }
        }
    }

    /// Wait for the endpoint to acknowledge or reject an attempt, or for
    /// the subscription to be canceled.
    async fn await_start(&self, receiver: &mut EndpointReceiver) -> StartOutcome {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return StartOutcome::Canceled,
                event = receiver.recv() => match event {
                    Some(EndpointEvent::Started(subscription_id)) => {
                        return StartOutcome::Started(subscription_id);
                    }
                    Some(EndpointEvent::Error(e)) => return StartOutcome::Rejected(e),
                    Some(EndpointEvent::Completed) | None => {
                        return StartOutcome::Rejected(EndpointError::Closed);
                    }
                    Some(EndpointEvent::Next(_)) => {
                        tracing::warn!(
                            subscription = %self.instance_id,
                            "Dropping item delivered before the subscription started"
                        );
                    }
                },
            }
        }
    }

    /// Release the acknowledgment of an attempt that was in flight when the
    /// subscription was canceled. Nothing is emitted.
    async fn drain_canceled(&self, mut receiver: EndpointReceiver) {
        let late = tokio::time::timeout(LATE_ACK_WINDOW, async {
            while let Some(event) = receiver.recv().await {
                match event {
                    EndpointEvent::Started(subscription_id) => return Some(subscription_id),
                    EndpointEvent::Error(_) | EndpointEvent::Completed => return None,
                    EndpointEvent::Next(_) => {}
                }
            }
            None
        })
        .await;

        if let Ok(Some(subscription_id)) = late {
            tracing::debug!(
                subscription = %self.instance_id,
                subscription_id = %subscription_id,
                "Releasing subscription acknowledged after cancel"
            );
            self.release_quietly(&subscription_id);
        }
    }

    /// Accept an acknowledgment. Returns `false` if the subscription was
    /// canceled while the attempt was in flight; the fresh id is released.
    fn activate(&self, subscription_id: String) -> bool {
        let mut lifecycle = self.lock();
        let accepted = matches!(lifecycle.phase, Phase::Starting)
            && self
                .started
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok();

        if !accepted {
            drop(lifecycle);
            self.release_quietly(&subscription_id);
            return false;
        }

        lifecycle.phase = Phase::Active {
            subscription_id: subscription_id.clone(),
        };
        tracing::info!(
            subscription = %self.instance_id,
            subscription_id = %subscription_id,
            "Subscription started"
        );
        self.emit(SubscriptionEvent::Started(subscription_id));
        true
    }

    /// Forward items of an active subscription until it ends.
    async fn forward(&self, mut receiver: EndpointReceiver) {
        while let Some(event) = receiver.recv().await {
            let mut lifecycle = self.lock();
            let Some(subscription_id) = lifecycle.phase.active_id().map(str::to_string) else {
                return;
            };

            match event {
                EndpointEvent::Next(payload) => {
                    match serde_json::from_value::<GraphQLResponse<T>>(payload) {
                        Ok(response) => self.emit(SubscriptionEvent::Next(response)),
                        Err(e) => {
                            lifecycle.phase = Phase::Failed {
                                subscription_id: Some(subscription_id.clone()),
                            };
                            lifecycle.task = None;
                            tracing::error!(
                                subscription = %self.instance_id,
                                error = %e,
                                "Undecodable subscription item"
                            );
                            let error = SubscriptionError::Decode(e.to_string());
                            self.emit(SubscriptionEvent::Error(error));
                            drop(lifecycle);
                            self.release_quietly(&subscription_id);
                            return;
                        }
                    }
                }
                EndpointEvent::Started(_) => {
                    tracing::warn!(
                        subscription = %self.instance_id,
                        "Ignoring repeated start acknowledgment"
                    );
                }
                EndpointEvent::Error(e) => {
                    self.terminate_failed(&mut lifecycle, subscription_id, e);
                    return;
                }
                EndpointEvent::Completed => {
                    lifecycle.phase = Phase::Completed { subscription_id };
                    lifecycle.task = None;
                    tracing::info!(subscription = %self.instance_id, "Subscription completed");
                    self.emit(SubscriptionEvent::Completed);
                    return;
                }
            }
        }

        let mut lifecycle = self.lock();
        if let Some(subscription_id) = lifecycle.phase.active_id().map(str::to_string) {
            self.terminate_failed(&mut lifecycle, subscription_id, EndpointError::Closed);
        }
    }

    fn terminate_failed(
        &self,
        lifecycle: &mut Lifecycle,
        subscription_id: String,
        error: EndpointError,
    ) {
        lifecycle.phase = Phase::Failed {
            subscription_id: Some(subscription_id),
        };
        lifecycle.task = None;
        tracing::warn!(subscription = %self.instance_id, error = %error, "Subscription failed");
        self.emit(SubscriptionEvent::Error(SubscriptionError::Endpoint(error)));
    }

    /// Fail a subscription that is still trying candidates.
    fn fail(&self, error: SubscriptionError) {
        let mut lifecycle = self.lock();
        if !matches!(lifecycle.phase, Phase::Starting) {
            return;
        }
        lifecycle.phase = Phase::Failed {
            subscription_id: None,
        };
        lifecycle.task = None;
        tracing::warn!(subscription = %self.instance_id, error = %error, "Subscription failed");
        self.emit(SubscriptionEvent::Error(error));
    }

    fn release_quietly(&self, subscription_id: &str) {
        if let Err(e) = self.endpoint.release_subscription(subscription_id) {
            tracing::warn!(
                subscription = %self.instance_id,
                subscription_id = %subscription_id,
                error = %e,
                "Failed to release subscription"
            );
        }
    }
}

fn usage(message: impl Into<String>) -> SubscriptionError {
    SubscriptionError::Usage(message.into())
}

enum StartOutcome {
    Started(String),
    Rejected(EndpointError),
    Canceled,
}
