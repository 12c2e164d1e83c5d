use std::sync::Arc;

use async_trait::async_trait;
use auth::codec::decode_token;
use auth::codec::encode_token;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use problem::InternalError;
use subtle::ConstantTimeEq;
use url::Url;

use crate::account::errors::AccountError;
use crate::account::errors::EmailSenderError;
use crate::account::errors::StoreError;
use crate::account::errors::TokenIssuerError;
use crate::account::events::EmailVerificationRequestedEvent;
use crate::account::models::Account;
use crate::account::models::AccountState;
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
use crate::account::ports::AccountServicePort;
use crate::account::ports::EmailSender;
use crate::account::ports::EventPublisher;
use crate::account::ports::TokenIssuer;
use crate::account::ports::UserStore;

const LOGIN_REDIRECT: &str = "/login";
const REMEMBER_ME_REFRESH_DAYS: i64 = 30;
const DEFAULT_REFRESH_DAYS: i64 = 1;
const PROVIDER_UNAVAILABLE: u16 = 503;

/// Public addresses used to build links sent by email.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub base_url: String,
    pub auth_api_url: String,
}

impl LinkSettings {
    pub fn new(base_url: impl Into<String>, auth_api_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_api_url: auth_api_url.into(),
        }
    }

    /// `{base_url}/{auth_api_url}/confirm-email?email=..&token=..`
    pub fn confirmation_link(
        &self,
        email: &EmailAddress,
        encoded_token: &str,
    ) -> Result<Url, url::ParseError> {
        self.link("confirm-email", email, encoded_token)
    }

    /// `{base_url}/{auth_api_url}/reset-password?email=..&token=..`
    pub fn password_reset_link(
        &self,
        email: &EmailAddress,
        encoded_token: &str,
    ) -> Result<Url, url::ParseError> {
        self.link("reset-password", email, encoded_token)
    }

    fn link(
        &self,
        route: &str,
        email: &EmailAddress,
        encoded_token: &str,
    ) -> Result<Url, url::ParseError> {
        let prefix = self.auth_api_url.trim_matches('/');
        let path = if prefix.is_empty() {
            route.to_string()
        } else {
            format!("{}/{}", prefix, route)
        };

        let mut url = Url::parse(&format!("{}/{}", self.base_url.trim_end_matches('/'), path))?;
        url.query_pairs_mut()
            .append_pair("email", email.as_str())
            .append_pair("token", encoded_token);
        Ok(url)
    }
}

/// Domain service implementation for account operations.
///
/// Concrete implementation of AccountServicePort with dependency injection.
pub struct AccountService<US, ES, TI, EP>
where
    US: UserStore,
    ES: EmailSender,
    TI: TokenIssuer,
    EP: EventPublisher,
{
    store: Arc<US>,
    email_sender: Arc<ES>,
    token_issuer: Arc<TI>,
    event_publisher: Arc<EP>,
    links: LinkSettings,
}

impl<US, ES, TI, EP> AccountService<US, ES, TI, EP>
where
    US: UserStore,
    ES: EmailSender,
    TI: TokenIssuer,
    EP: EventPublisher,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - User store and credential collaborator
    /// * `email_sender` - Outbound email delivery
    /// * `token_issuer` - Access and refresh token issuance
    /// * `event_publisher` - Domain event publishing implementation
    /// * `links` - Public addresses for emailed links
    pub fn new(
        store: Arc<US>,
        email_sender: Arc<ES>,
        token_issuer: Arc<TI>,
        event_publisher: Arc<EP>,
        links: LinkSettings,
    ) -> Self {
        Self {
            store,
            email_sender,
            token_issuer,
            event_publisher,
            links,
        }
    }

    async fn issue_session(
        &self,
        account: &Account,
        refresh_expires_at: DateTime<Utc>,
        operation: &'static str,
    ) -> Result<TokenPair, AccountError> {
        let access_token = self
            .token_issuer
            .issue_access_token(account.username.as_str())
            .await
            .map_err(|e| {
                tracing::error!(operation, error = %e, "Failed to issue access token");
                AccountError::InternalServerError
            })?;
        let refresh_token = self.token_issuer.issue_refresh_token();

        self.store
            .set_refresh_token(account, &refresh_token, refresh_expires_at)
            .await
            .map_err(store_fault(operation))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

fn store_fault(operation: &'static str) -> impl FnOnce(StoreError) -> AccountError {
    move |e| {
        tracing::error!(operation, error = %e, "User store operation failed");
        AccountError::InternalServerError
    }
}

fn link_fault(operation: &'static str) -> impl FnOnce(url::ParseError) -> AccountError {
    move |e| {
        tracing::error!(operation, error = %e, "Failed to build emailed link");
        AccountError::InternalServerError
    }
}

/// Collapse a provider response into the two delivery failures callers may see.
fn delivery_outcome(
    operation: &'static str,
    result: Result<DeliveryResult, EmailSenderError>,
) -> Result<(), AccountError> {
    match result {
        Ok(delivery) if delivery.success => Ok(()),
        Ok(delivery) if delivery.transport_status == PROVIDER_UNAVAILABLE => {
            tracing::warn!(
                operation,
                status = delivery.transport_status,
                "Email provider unavailable"
            );
            Err(AccountError::ExternalServiceUnavailable)
        }
        Ok(delivery) => {
            tracing::error!(
                operation,
                status = delivery.transport_status,
                "Email provider rejected message"
            );
            Err(AccountError::InternalServerError)
        }
        Err(e @ EmailSenderError::Unreachable(_)) => {
            tracing::error!(operation, error = %e, "Email provider unreachable");
            Err(AccountError::ExternalServiceUnavailable)
        }
        Err(e) => {
            tracing::error!(operation, error = %e, "Email could not be sent");
            Err(AccountError::InternalServerError)
        }
    }
}

#[async_trait]
impl<US, ES, TI, EP> AccountServicePort for AccountService<US, ES, TI, EP>
where
    US: UserStore,
    ES: EmailSender,
    TI: TokenIssuer,
    EP: EventPublisher,
{
    async fn login(&self, command: LoginCommand) -> problem::Result<TokenPair> {
        command.validate()?;

        // Unknown user, wrong password and unconfirmed email must stay indistinguishable.
        let Some(account) = self
            .store
            .find_by_username(command.username.trim())
            .await
            .map_err(store_fault("login"))?
        else {
            self.store
                .check_password_without_account(&command.password)
                .await;
            tracing::info!("Login rejected");
            return Err(AccountError::InvalidCredentialsOrEmailNotVerified.into());
        };

        let password_matches = self
            .store
            .check_password(&account, &command.password)
            .await
            .map_err(store_fault("login"))?;
        let email_confirmed = self
            .store
            .is_email_confirmed(&account)
            .await
            .map_err(store_fault("login"))?;

        if !password_matches || !email_confirmed {
            tracing::info!(username = %account.username, "Login rejected");
            return Err(AccountError::InvalidCredentialsOrEmailNotVerified.into());
        }

        let refresh_days = if command.remember_me {
            REMEMBER_ME_REFRESH_DAYS
        } else {
            DEFAULT_REFRESH_DAYS
        };
        let tokens = self
            .issue_session(&account, Utc::now() + Duration::days(refresh_days), "login")
            .await?;

        tracing::info!(username = %account.username, "Login succeeded");
        Ok(tokens)
    }

    async fn register(&self, command: RegisterCommand) -> problem::Result<()> {
        let (username, email) = command.validate()?;

        let by_email = self
            .store
            .find_by_email(email.as_str())
            .await
            .map_err(store_fault("register"))?;
        let by_username = self
            .store
            .find_by_username(username.as_str())
            .await
            .map_err(store_fault("register"))?;
        if by_email.is_some() || by_username.is_some() {
            tracing::info!("Registration rejected: email or username in use");
            return Err(AccountError::EmailOrUsernameAlreadyUsed.into());
        }

        let mut account = NewAccount::new(command.first_name.trim(), command.last_name.trim());
        self.store
            .set_username(&mut account, username)
            .await
            .map_err(store_fault("register"))?;
        self.store
            .set_email(&mut account, email)
            .await
            .map_err(store_fault("register"))?;

        let created = match self.store.create(&account, &command.password).await {
            Ok(PasswordPolicyResult::Created(created)) => created,
            Ok(PasswordPolicyResult::Rejected(descriptions)) => {
                return Err(AccountError::PasswordDoesNotMeetSecurityCriteria(descriptions).into())
            }
            Err(StoreError::DuplicateAccount) => {
                return Err(AccountError::EmailOrUsernameAlreadyUsed.into())
            }
            Err(e) => return Err(store_fault("register")(e).into()),
        };

        tracing::info!(
            account_id = %created.id,
            username = %created.username,
            from = ?account.state(),
            to = ?created.state(),
            "Account registered"
        );

        let event = EmailVerificationRequestedEvent::new(&created);
        if let Err(e) = self
            .event_publisher
            .publish_email_verification_requested(&event)
            .await
        {
            tracing::error!(
                account_id = %created.id,
                error = %e,
                "Failed to publish EmailVerificationRequested event"
            );
        }

        Ok(())
    }

    async fn send_email_confirmation(
        &self,
        command: SendEmailConfirmationCommand,
    ) -> problem::Result<()> {
        let email = command.validate()?;

        let account = self
            .store
            .find_by_email(email.as_str())
            .await
            .map_err(store_fault("send_email_confirmation"))?
            .ok_or(AccountError::UserNotFound)?;

        if self
            .store
            .is_email_confirmed(&account)
            .await
            .map_err(store_fault("send_email_confirmation"))?
        {
            return Err(AccountError::EmailAlreadyVerified.into());
        }

        let token = self
            .store
            .generate_email_confirmation_token(&account)
            .await
            .map_err(store_fault("send_email_confirmation"))?;
        let link = self
            .links
            .confirmation_link(&account.email, &encode_token(&token))
            .map_err(link_fault("send_email_confirmation"))?;

        delivery_outcome(
            "send_email_confirmation",
            self.email_sender
                .send_confirmation_email(&account.email, &link)
                .await,
        )?;

        tracing::info!(account_id = %account.id, "Confirmation email sent");
        Ok(())
    }

    async fn confirm_email(
        &self,
        command: ConfirmEmailCommand,
    ) -> problem::Result<ConfirmEmailOutcome> {
        let email = command.validate()?;

        let Some(account) = self
            .store
            .find_by_email(email.as_str())
            .await
            .map_err(store_fault("confirm_email"))?
        else {
            return Err(AccountError::InvalidVerificationLink.into());
        };

        let token = decode_token(command.token.trim()).map_err(|e| {
            tracing::debug!(error = %e, "Verification token could not be decoded");
            AccountError::InvalidVerificationLink
        })?;

        let confirmed = self
            .store
            .confirm_email(&account, &token)
            .await
            .map_err(store_fault("confirm_email"))?;
        if !confirmed {
            return Err(AccountError::InvalidVerificationLink.into());
        }

        tracing::info!(account_id = %account.id, "Email confirmed");
        Ok(ConfirmEmailOutcome {
            redirect_to: LOGIN_REDIRECT.to_string(),
        })
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> problem::Result<()> {
        let email = command.validate()?;

        let account = self
            .store
            .find_by_email(email.as_str())
            .await
            .map_err(store_fault("reset_password"))?
            .ok_or(AccountError::InvalidCredentialsOrEmailNotVerified)?;

        if !self
            .store
            .is_email_confirmed(&account)
            .await
            .map_err(store_fault("reset_password"))?
        {
            return Err(AccountError::InvalidCredentialsOrEmailNotVerified.into());
        }

        let token = self
            .store
            .generate_password_reset_token(&account)
            .await
            .map_err(store_fault("reset_password"))?;
        let link = self
            .links
            .password_reset_link(&account.email, &encode_token(&token))
            .map_err(link_fault("reset_password"))?;

        delivery_outcome(
            "reset_password",
            self.email_sender
                .send_password_reset_email(&account.email, &link)
                .await,
        )?;

        tracing::info!(account_id = %account.id, "Password reset email sent");
        Ok(())
    }

    async fn refresh_token(&self, command: RefreshTokenCommand) -> problem::Result<TokenPair> {
        command.validate()?;

        let subject = self
            .token_issuer
            .subject_of_expired_token(command.access_token.trim())
            .await
            .map_err(|e| match e {
                TokenIssuerError::Rejected(reason) => {
                    tracing::debug!(reason = %reason, "Refresh rejected: access token invalid");
                    AccountError::InvalidRefreshToken
                }
                other => {
                    tracing::error!(operation = "refresh_token", error = %other, "Token validation failed");
                    AccountError::InternalServerError
                }
            })?;

        let account = self
            .store
            .find_by_username(&subject)
            .await
            .map_err(store_fault("refresh_token"))?
            .ok_or(AccountError::InvalidRefreshToken)?;
        if account.state() != AccountState::Verified {
            tracing::info!(account_id = %account.id, "Refresh rejected: account not verified");
            return Err(AccountError::InvalidRefreshToken.into());
        }

        // Rotation keeps the window chosen at login.
        let expires_at = match (&account.refresh_token, account.refresh_token_expires_at) {
            (Some(stored), Some(expires_at))
                if bool::from(stored.as_bytes().ct_eq(command.refresh_token.as_bytes()))
                    && expires_at > Utc::now() =>
            {
                expires_at
            }
            _ => return Err(AccountError::InvalidRefreshToken.into()),
        };

        let tokens = self
            .issue_session(&account, expires_at, "refresh_token")
            .await?;

        tracing::info!(username = %account.username, "Session refreshed");
        Ok(tokens)
    }

    async fn jwt_public_key(&self) -> problem::Result<String> {
        self.token_issuer.public_key_pem().await.map_err(|e| {
            InternalError::from(match e {
                TokenIssuerError::KeyNotFound(path) => {
                    tracing::warn!(path = %path, "Public key file not found");
                    AccountError::FileNotFound
                }
                other => {
                    tracing::error!(operation = "jwt_public_key", error = %other, "Public key unavailable");
                    AccountError::InternalServerError
                }
            })
        })
    }
}
