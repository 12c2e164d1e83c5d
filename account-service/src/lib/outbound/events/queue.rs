use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::account::errors::EventPublisherError;
use crate::account::events::AccountEvent;
use crate::account::events::EmailVerificationRequestedEvent;
use crate::account::ports::EventPublisher;

/// In-process event publisher backed by a bounded tokio channel.
///
/// Publishing never waits; a full queue is reported as `QueueFull`.
#[derive(Clone)]
pub struct ChannelEventPublisher {
    sender: mpsc::Sender<AccountEvent>,
}

impl ChannelEventPublisher {
    /// Create a publisher and the receiving end of its queue.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of undelivered events, at least 1
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AccountEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tracing::info!(capacity = capacity.max(1), "Account event queue initialized");
        (Self { sender }, receiver)
    }

    fn publish(&self, event: AccountEvent) -> Result<(), EventPublisherError> {
        let event_id = event.event_id().to_string();
        let event_type = event.event_type().to_string();

        self.sender
            .try_send(event)
            .map(|_| {
                tracing::debug!(event_id = %event_id, event_type = %event_type, "Event queued");
            })
            .map_err(|e| {
                tracing::error!(event_id = %event_id, event_type = %event_type, error = %e, "Failed to queue event");
                match e {
                    TrySendError::Full(_) => EventPublisherError::QueueFull,
                    TrySendError::Closed(_) => EventPublisherError::Closed,
                }
            })
    }
}

#[async_trait]
impl EventPublisher for ChannelEventPublisher {
    async fn publish_email_verification_requested(
        &self,
        event: &EmailVerificationRequestedEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish(AccountEvent::EmailVerificationRequested(event.clone()))
    }
}
