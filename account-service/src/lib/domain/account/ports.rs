use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use url::Url;

use crate::account::errors::EmailSenderError;
use crate::account::errors::EventPublisherError;
use crate::account::errors::StoreError;
use crate::account::errors::TokenIssuerError;
use crate::account::events::EmailVerificationRequestedEvent;
use crate::account::models::Account;
use crate::account::models::ConfirmEmailCommand;
use crate::account::models::ConfirmEmailOutcome;
use crate::account::models::DeliveryResult;
use crate::account::models::EmailAddress;
use crate::account::models::LoginCommand;
use crate::account::models::NewAccount;
use crate::account::models::PasswordPolicyResult;
use crate::account::models::RefreshTokenCommand;
use crate::account::models::RegisterCommand;
use crate::account::models::ResetPasswordCommand;
use crate::account::models::SendEmailConfirmationCommand;
use crate::account::models::TokenPair;
use crate::account::models::Username;

/// Port for account use cases.
///
/// Every operation reports its outcome as a [`problem::Result`]; expected
/// failures are never raised any other way.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Authenticate with username and password.
    ///
    /// # Returns
    /// Fresh access and refresh tokens
    ///
    /// # Errors
    /// * `ValidationFailed` - Username or password empty
    /// * `InvalidCredentialsOrEmailNotVerified` - Unknown user, wrong password or unconfirmed email
    /// * `InternalServerError` - Store or signing key failure
    async fn login(&self, command: LoginCommand) -> problem::Result<TokenPair>;

    /// Create an account in `PendingVerification` and request its confirmation email.
    ///
    /// # Errors
    /// * `ValidationFailed` - A field is empty or malformed
    /// * `EmailOrUsernameAlreadyUsed` - Email or username belongs to an existing account
    /// * `PasswordDoesNotMeetSecurityCriteria` - Password policy rejected the password
    /// * `InternalServerError` - Store failure
    async fn register(&self, command: RegisterCommand) -> problem::Result<()>;

    /// Email a fresh confirmation link.
    ///
    /// # Errors
    /// * `ValidationFailed` - Email empty or malformed
    /// * `UserNotFound` - No account has this email
    /// * `EmailAlreadyVerified` - Account is already verified
    /// * `ExternalServiceUnavailable` - Email provider unavailable
    /// * `InternalServerError` - Store failure or email rejected
    async fn send_email_confirmation(
        &self,
        command: SendEmailConfirmationCommand,
    ) -> problem::Result<()>;

    /// Consume a confirmation token and mark the email as verified.
    ///
    /// # Errors
    /// * `ValidationFailed` - Email empty or malformed, or token empty
    /// * `InvalidVerificationLink` - Unknown account, malformed, expired or used token
    async fn confirm_email(
        &self,
        command: ConfirmEmailCommand,
    ) -> problem::Result<ConfirmEmailOutcome>;

    /// Email a password reset link to a verified account.
    ///
    /// # Errors
    /// * `ValidationFailed` - Email empty or malformed
    /// * `InvalidCredentialsOrEmailNotVerified` - No account, or email not verified
    /// * `ExternalServiceUnavailable` - Email provider unavailable
    async fn reset_password(&self, command: ResetPasswordCommand) -> problem::Result<()>;

    /// Exchange an access token and its refresh token for a rotated pair.
    ///
    /// # Errors
    /// * `ValidationFailed` - A token is empty
    /// * `InvalidRefreshToken` - Any token or account mismatch
    async fn refresh_token(&self, command: RefreshTokenCommand) -> problem::Result<TokenPair>;

    /// PEM encoded public half of the signing key.
    ///
    /// # Errors
    /// * `FileNotFound` - Public key file is missing
    async fn jwt_public_key(&self) -> problem::Result<String>;
}

/// Persistence and credential operations for accounts.
///
/// Lookups by email and username are case-insensitive.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    async fn set_username(
        &self,
        account: &mut NewAccount,
        username: Username,
    ) -> Result<(), StoreError>;

    async fn set_email(&self, account: &mut NewAccount, email: EmailAddress)
        -> Result<(), StoreError>;

    /// Persist a new account with the given password.
    ///
    /// # Returns
    /// `Created` with the stored account, or `Rejected` with policy violations
    ///
    /// # Errors
    /// * `DuplicateAccount` - Email or username taken
    /// * `Incomplete` - Username or email was never set
    async fn create(
        &self,
        account: &NewAccount,
        password: &str,
    ) -> Result<PasswordPolicyResult, StoreError>;

    /// Issue a single-use email confirmation token.
    async fn generate_email_confirmation_token(
        &self,
        account: &Account,
    ) -> Result<String, StoreError>;

    /// Consume a confirmation token.
    ///
    /// # Returns
    /// `true` when the token was valid and unused; the account is then verified
    async fn confirm_email(&self, account: &Account, token: &str) -> Result<bool, StoreError>;

    async fn is_email_confirmed(&self, account: &Account) -> Result<bool, StoreError>;

    /// Issue a single-use password reset token.
    async fn generate_password_reset_token(&self, account: &Account)
        -> Result<String, StoreError>;

    async fn check_password(&self, account: &Account, password: &str)
        -> Result<bool, StoreError>;

    /// Spend the cost of a password check when no account matched.
    async fn check_password_without_account(&self, password: &str);

    async fn set_refresh_token(
        &self,
        account: &Account,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Outbound email delivery.
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    async fn send_confirmation_email(
        &self,
        address: &EmailAddress,
        link: &Url,
    ) -> Result<DeliveryResult, EmailSenderError>;

    async fn send_password_reset_email(
        &self,
        address: &EmailAddress,
        link: &Url,
    ) -> Result<DeliveryResult, EmailSenderError>;
}

/// Session token issuance.
#[async_trait]
pub trait TokenIssuer: Send + Sync + 'static {
    async fn issue_access_token(&self, subject: &str) -> Result<String, TokenIssuerError>;

    fn issue_refresh_token(&self) -> String;

    /// Verify a token without checking its lifetime and return its subject.
    async fn subject_of_expired_token(&self, token: &str) -> Result<String, TokenIssuerError>;

    async fn public_key_pem(&self) -> Result<String, TokenIssuerError>;
}

/// Event publishing for domain events.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    async fn publish_email_verification_requested(
        &self,
        event: &EmailVerificationRequestedEvent,
    ) -> Result<(), EventPublisherError>;
}
