use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::account::errors::EmailError;
use crate::account::errors::UsernameError;

/// Registered account as seen through the user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub username: Username,
    pub email: EmailAddress,
    pub email_confirmed: bool,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn state(&self) -> AccountState {
        if self.email_confirmed {
            AccountState::Verified
        } else {
            AccountState::PendingVerification
        }
    }
}

/// Account under construction, before the store has persisted it.
///
/// Identity fields are assigned through the store so it can apply its own
/// normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub username: Option<Username>,
    pub email: Option<EmailAddress>,
}

impl NewAccount {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: None,
            email: None,
        }
    }

    pub fn state(&self) -> AccountState {
        AccountState::Unregistered
    }
}

/// Verification lifecycle of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    Unregistered,
    PendingVerification,
    Verified,
}

/// Account unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Non-empty, drawn from ASCII letters, digits and `-._@+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const ALLOWED_SYMBOLS: &'static str = "-._@+";

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `Empty` - Username is empty
    /// * `InvalidCharacters` - Contains a character outside the allowed alphabet
    pub fn new(username: String) -> Result<Self, UsernameError> {
        if username.is_empty() {
            return Err(UsernameError::Empty);
        }

        if username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || Self::ALLOWED_SYMBOLS.contains(c))
        {
            Ok(Self(username))
        } else {
            Err(UsernameError::InvalidCharacters)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of a store `create` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordPolicyResult {
    /// Account persisted in `PendingVerification`.
    Created(Account),
    /// Password refused; one description per violated rule.
    Rejected(Vec<String>),
}

/// What an email provider reported for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryResult {
    pub success: bool,
    pub transport_status: u16,
}

impl DeliveryResult {
    pub fn delivered(transport_status: u16) -> Self {
        Self {
            success: true,
            transport_status,
        }
    }

    pub fn failed(transport_status: u16) -> Self {
        Self {
            success: false,
            transport_status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginCommand {
    pub username: String,
    pub password: String,
    pub remember_me: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterCommand {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SendEmailConfirmationCommand {
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfirmEmailCommand {
    pub email: String,
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetPasswordCommand {
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshTokenCommand {
    pub access_token: String,
    pub refresh_token: String,
}

/// Session tokens handed out by Login and RefreshToken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Where the client should go after a successful email confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmEmailOutcome {
    pub redirect_to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        for username in ["a", "john.doe", "bob@x.com", "A-1+tag"] {
            assert!(Username::new(username.to_string()).is_ok(), "{username}");
        }
        assert_eq!(Username::new(String::new()), Err(UsernameError::Empty));
        assert_eq!(
            Username::new("alice smith".to_string()),
            Err(UsernameError::InvalidCharacters)
        );
        assert_eq!(
            Username::new("alice_01".to_string()),
            Err(UsernameError::InvalidCharacters)
        );
        assert_eq!(
            Username::new("zoë".to_string()),
            Err(UsernameError::InvalidCharacters)
        );
    }

    #[test]
    fn test_email_address_validation() {
        assert!(EmailAddress::new("alice@example.com".to_string()).is_ok());
        assert!(EmailAddress::new("not-an-email".to_string()).is_err());
    }

    #[test]
    fn test_states() {
        assert_eq!(NewAccount::new("A", "B").state(), AccountState::Unregistered);

        let mut account = Account {
            id: AccountId::new(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            username: Username::new("alice".to_string()).unwrap(),
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            email_confirmed: false,
            refresh_token: None,
            refresh_token_expires_at: None,
            created_at: Utc::now(),
        };
        assert_eq!(account.state(), AccountState::PendingVerification);

        account.email_confirmed = true;
        assert_eq!(account.state(), AccountState::Verified);
    }

    #[test]
    fn test_commands_tolerate_missing_fields() {
        let command: LoginCommand = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(command.username, "alice");
        assert_eq!(command.password, "");
        assert!(!command.remember_me);

        let command: RegisterCommand =
            serde_json::from_str(r#"{"firstName":"Alice","lastName":"Smith"}"#).unwrap();
        assert_eq!(command.first_name, "Alice");
        assert_eq!(command.email, "");
    }
}
