use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::account::events::AccountEvent;
use crate::account::events::EmailVerificationRequestedEvent;
use crate::account::models::SendEmailConfirmationCommand;
use crate::account::ports::AccountServicePort;

/// Background consumer that emails confirmation links for new accounts.
///
/// Delivery failures are logged and dropped; the account stays in
/// `PendingVerification` and the user can request a new link.
pub struct EmailVerificationWorker {
    receiver: mpsc::Receiver<AccountEvent>,
    service: Arc<dyn AccountServicePort>,
}

impl EmailVerificationWorker {
    pub fn new(receiver: mpsc::Receiver<AccountEvent>, service: Arc<dyn AccountServicePort>) -> Self {
        Self { receiver, service }
    }

    /// Consume events until every publisher has been dropped.
    pub async fn start_consuming(mut self) {
        tracing::info!("Starting email verification worker");

        while let Some(event) = self.receiver.recv().await {
            tracing::debug!(
                event_id = %event.event_id(),
                event_type = %event.event_type(),
                "Received account event"
            );

            match event {
                AccountEvent::EmailVerificationRequested(requested) => {
                    self.handle_email_verification_requested(requested).await
                }
            }
        }

        tracing::warn!("Email verification worker stopped");
    }

    async fn handle_email_verification_requested(&self, event: EmailVerificationRequestedEvent) {
        let command = SendEmailConfirmationCommand {
            email: event.email.clone(),
        };

        match self.service.send_email_confirmation(command).await {
            Ok(()) => tracing::info!(
                account_id = %event.account_id,
                username = %event.username,
                "Confirmation email sent"
            ),
            Err(e) => tracing::error!(
                account_id = %event.account_id,
                username = %event.username,
                error = %e,
                "Failed to send confirmation email"
            ),
        }
    }
}

/// Spawn an [`EmailVerificationWorker`] on the tokio runtime.
pub fn spawn_email_verification_worker(
    receiver: mpsc::Receiver<AccountEvent>,
    service: Arc<dyn AccountServicePort>,
) -> JoinHandle<()> {
    tokio::spawn(EmailVerificationWorker::new(receiver, service).start_consuming())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::function;
    use problem::ErrorCode;
    use problem::InternalError;

    use super::*;
    use crate::account::models::ConfirmEmailCommand;
    use crate::account::models::ConfirmEmailOutcome;
    use crate::account::models::LoginCommand;
    use crate::account::models::RefreshTokenCommand;
    use crate::account::models::RegisterCommand;
    use crate::account::models::ResetPasswordCommand;
    use crate::account::models::TokenPair;

    mock! {
        pub TestAccountService {}

        #[async_trait]
        impl AccountServicePort for TestAccountService {
            async fn login(&self, command: LoginCommand) -> problem::Result<TokenPair>;
            async fn register(&self, command: RegisterCommand) -> problem::Result<()>;
            async fn send_email_confirmation(&self, command: SendEmailConfirmationCommand) -> problem::Result<()>;
            async fn confirm_email(&self, command: ConfirmEmailCommand) -> problem::Result<ConfirmEmailOutcome>;
            async fn reset_password(&self, command: ResetPasswordCommand) -> problem::Result<()>;
            async fn refresh_token(&self, command: RefreshTokenCommand) -> problem::Result<TokenPair>;
            async fn jwt_public_key(&self) -> problem::Result<String>;
        }
    }

    fn requested(email: &str) -> AccountEvent {
        AccountEvent::EmailVerificationRequested(EmailVerificationRequestedEvent {
            event_id: format!("event-{}", email),
            account_id: "2f0b5a9e-0000-0000-0000-000000000000".to_string(),
            username: "alice".to_string(),
            email: email.to_string(),
            requested_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_sends_confirmation_for_each_event() {
        let mut service = MockTestAccountService::new();
        service
            .expect_send_email_confirmation()
            .with(function(|c: &SendEmailConfirmationCommand| {
                c.email == "alice@example.com"
            }))
            .times(1)
            .returning(|_| Ok(()));
        service
            .expect_send_email_confirmation()
            .with(function(|c: &SendEmailConfirmationCommand| c.email == "bob@example.com"))
            .times(1)
            .returning(|_| {
                Err(InternalError::new(
                    ErrorCode::ServiceUnavailable,
                    "External service is not available",
                ))
            });

        let (sender, receiver) = mpsc::channel(4);
        let handle = spawn_email_verification_worker(receiver, Arc::new(service));

        sender.send(requested("alice@example.com")).await.unwrap();
        sender.send(requested("bob@example.com")).await.unwrap();
        drop(sender);

        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_stops_when_publishers_are_gone() {
        let (sender, receiver) = mpsc::channel::<AccountEvent>(1);
        drop(sender);

        spawn_email_verification_worker(receiver, Arc::new(MockTestAccountService::new()))
            .await
            .unwrap();
    }
}
