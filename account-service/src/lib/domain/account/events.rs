use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::account::models::Account;

/// Envelope for all account-related domain events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    EmailVerificationRequested(EmailVerificationRequestedEvent),
}

impl AccountEvent {
    pub fn event_id(&self) -> &str {
        match self {
            AccountEvent::EmailVerificationRequested(e) => &e.event_id,
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            AccountEvent::EmailVerificationRequested(_) => "email_verification_requested",
        }
    }
}

/// Raised once a registered account is durably stored in `PendingVerification`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailVerificationRequestedEvent {
    pub event_id: String,
    pub account_id: String,
    pub username: String,
    pub email: String,
    pub requested_at: DateTime<Utc>,
}

impl EmailVerificationRequestedEvent {
    pub fn new(account: &Account) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            account_id: account.id.to_string(),
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            requested_at: Utc::now(),
        }
    }
}
