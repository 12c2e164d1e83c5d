//! In-memory user store for development and tests.
//!
//! Mirrors the Postgres store: hashed tokens, 24 hour expiry, single use.

use std::collections::HashMap;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::PasswordPolicy;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use super::tokens;
use super::tokens::TokenPurpose;
use crate::account::errors::StoreError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::EmailAddress;
use crate::account::models::NewAccount;
use crate::account::models::PasswordPolicyResult;
use crate::account::models::Username;
use crate::account::ports::UserStore;

struct StoredAccount {
    account: Account,
    password_hash: String,
}

struct StoredToken {
    account_id: AccountId,
    purpose: TokenPurpose,
    digest: String,
    expires_at: DateTime<Utc>,
    consumed: bool,
}

#[derive(Default)]
struct State {
    accounts: HashMap<AccountId, StoredAccount>,
    tokens: Vec<StoredToken>,
}

impl State {
    fn find(&self, matches: impl Fn(&Account) -> bool) -> Option<Account> {
        self.accounts
            .values()
            .map(|stored| &stored.account)
            .find(|account| matches(account))
            .cloned()
    }

    fn stored_mut(&mut self, id: &AccountId) -> Result<&mut StoredAccount, StoreError> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

pub struct InMemoryUserStore {
    state: RwLock<State>,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::with_policy(PasswordPolicy::default())
    }

    pub fn with_policy(policy: PasswordPolicy) -> Self {
        Self {
            state: RwLock::new(State::default()),
            hasher: PasswordHasher::new(),
            policy,
        }
    }

    async fn issue_token(
        &self,
        account: &Account,
        purpose: TokenPurpose,
    ) -> Result<String, StoreError> {
        let (token, digest) = tokens::generate();
        let now = Utc::now();
        let mut state = self.state.write().await;
        state.stored_mut(&account.id)?;
        state.tokens.retain(|t| !t.consumed && t.expires_at > now);
        state.tokens.push(StoredToken {
            account_id: account.id,
            purpose,
            digest,
            expires_at: now + tokens::token_lifetime(),
            consumed: false,
        });
        Ok(token)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let state = self.state.read().await;
        Ok(state.find(|account| account.email.as_str().eq_ignore_ascii_case(email)))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let state = self.state.read().await;
        Ok(state.find(|account| account.username.as_str().eq_ignore_ascii_case(username)))
    }

    async fn set_username(
        &self,
        account: &mut NewAccount,
        username: Username,
    ) -> Result<(), StoreError> {
        account.username = Some(username);
        Ok(())
    }

    async fn set_email(
        &self,
        account: &mut NewAccount,
        email: EmailAddress,
    ) -> Result<(), StoreError> {
        account.email = Some(email);
        Ok(())
    }

    async fn create(
        &self,
        account: &NewAccount,
        password: &str,
    ) -> Result<PasswordPolicyResult, StoreError> {
        let username = account
            .username
            .clone()
            .ok_or(StoreError::Incomplete("username"))?;
        let email = account
            .email
            .clone()
            .ok_or(StoreError::Incomplete("email"))?;

        let violations = self.policy.validate(password);
        if !violations.is_empty() {
            return Ok(PasswordPolicyResult::Rejected(
                violations.into_iter().map(|v| v.description).collect(),
            ));
        }

        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|e| StoreError::Password(e.to_string()))?;

        let mut state = self.state.write().await;
        let taken = state.accounts.values().any(|stored| {
            stored
                .account
                .username
                .as_str()
                .eq_ignore_ascii_case(username.as_str())
                || stored
                    .account
                    .email
                    .as_str()
                    .eq_ignore_ascii_case(email.as_str())
        });
        if taken {
            return Err(StoreError::DuplicateAccount);
        }

        let created = Account {
            id: AccountId::new(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            username,
            email,
            email_confirmed: false,
            refresh_token: None,
            refresh_token_expires_at: None,
            created_at: Utc::now(),
        };
        state.accounts.insert(
            created.id,
            StoredAccount {
                account: created.clone(),
                password_hash,
            },
        );

        Ok(PasswordPolicyResult::Created(created))
    }

    async fn generate_email_confirmation_token(
        &self,
        account: &Account,
    ) -> Result<String, StoreError> {
        self.issue_token(account, TokenPurpose::EmailConfirmation)
            .await
    }

    async fn confirm_email(&self, account: &Account, token: &str) -> Result<bool, StoreError> {
        let digest = tokens::digest(token);
        let now = Utc::now();

        let mut state = self.state.write().await;
        state.stored_mut(&account.id)?;

        let Some(stored_token) = state.tokens.iter_mut().find(|t| {
            t.account_id == account.id
                && t.purpose == TokenPurpose::EmailConfirmation
                && t.digest == digest
        }) else {
            return Ok(false);
        };
        if stored_token.consumed || stored_token.expires_at <= now {
            return Ok(false);
        }
        stored_token.consumed = true;

        state.stored_mut(&account.id)?.account.email_confirmed = true;
        Ok(true)
    }

    async fn is_email_confirmed(&self, account: &Account) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.stored_mut(&account.id)?.account.email_confirmed)
    }

    async fn generate_password_reset_token(
        &self,
        account: &Account,
    ) -> Result<String, StoreError> {
        self.issue_token(account, TokenPurpose::PasswordReset).await
    }

    async fn check_password(&self, account: &Account, password: &str) -> Result<bool, StoreError> {
        let password_hash = {
            let mut state = self.state.write().await;
            state.stored_mut(&account.id)?.password_hash.clone()
        };

        self.hasher
            .verify(password, &password_hash)
            .map_err(|e| StoreError::Corrupted(e.to_string()))
    }

    async fn check_password_without_account(&self, password: &str) {
        self.hasher.verify_dummy(password);
    }

    async fn set_refresh_token(
        &self,
        account: &Account,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let stored = state.stored_mut(&account.id)?;
        stored.account.refresh_token = Some(token.to_string());
        stored.account.refresh_token_expires_at = Some(expires_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    async fn registered(store: &InMemoryUserStore, username: &str, email: &str) -> Account {
        let mut account = NewAccount::new("Alice", "Smith");
        store
            .set_username(&mut account, Username::new(username.to_string()).unwrap())
            .await
            .unwrap();
        store
            .set_email(&mut account, EmailAddress::new(email.to_string()).unwrap())
            .await
            .unwrap();

        match store.create(&account, "Str0ng!pass").await.unwrap() {
            PasswordPolicyResult::Created(account) => account,
            PasswordPolicyResult::Rejected(reasons) => panic!("rejected: {:?}", reasons),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_case_insensitively() {
        let store = InMemoryUserStore::new();
        let created = registered(&store, "alice", "alice@example.com").await;

        assert!(!created.email_confirmed);
        assert_eq!(
            store.find_by_email("ALICE@example.com").await.unwrap(),
            Some(created.clone())
        );
        assert_eq!(
            store.find_by_username("Alice").await.unwrap(),
            Some(created)
        );
        assert_eq!(store.find_by_username("bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_requires_identity_fields() {
        let store = InMemoryUserStore::new();
        let result = store
            .create(&NewAccount::new("Alice", "Smith"), "Str0ng!pass")
            .await;
        assert_eq!(result, Err(StoreError::Incomplete("username")));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let store = InMemoryUserStore::new();
        registered(&store, "alice", "alice@example.com").await;

        let mut account = NewAccount::new("Other", "Person");
        account.username = Some(Username::new("other".to_string()).unwrap());
        account.email = Some(EmailAddress::new("Alice@Example.com".to_string()).unwrap());

        let result = store.create(&account, "Str0ng!pass").await;
        assert_eq!(result, Err(StoreError::DuplicateAccount));
    }

    #[tokio::test]
    async fn test_create_applies_password_policy() {
        let store = InMemoryUserStore::new();
        let mut account = NewAccount::new("Alice", "Smith");
        account.username = Some(Username::new("alice".to_string()).unwrap());
        account.email = Some(EmailAddress::new("alice@example.com".to_string()).unwrap());

        match store.create(&account, "weak").await.unwrap() {
            PasswordPolicyResult::Rejected(reasons) => {
                assert!(reasons.contains(&"Passwords must be at least 6 characters.".to_string()))
            }
            PasswordPolicyResult::Created(_) => panic!("weak password accepted"),
        }
        assert_eq!(store.find_by_username("alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_confirmation_token_is_single_use() {
        let store = InMemoryUserStore::new();
        let account = registered(&store, "alice", "alice@example.com").await;
        let token = store
            .generate_email_confirmation_token(&account)
            .await
            .unwrap();

        assert!(!store.confirm_email(&account, "forged").await.unwrap());
        assert!(store.confirm_email(&account, &token).await.unwrap());
        assert!(store.is_email_confirmed(&account).await.unwrap());
        assert!(!store.confirm_email(&account, &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_token_cannot_confirm_email() {
        let store = InMemoryUserStore::new();
        let account = registered(&store, "alice", "alice@example.com").await;
        let token = store.generate_password_reset_token(&account).await.unwrap();

        assert!(!store.confirm_email(&account, &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let store = InMemoryUserStore::new();
        let account = registered(&store, "alice", "alice@example.com").await;
        let token = store
            .generate_email_confirmation_token(&account)
            .await
            .unwrap();

        for stored in store.state.write().await.tokens.iter_mut() {
            stored.expires_at = Utc::now() - Duration::minutes(1);
        }

        assert!(!store.confirm_email(&account, &token).await.unwrap());
        assert!(!store.is_email_confirmed(&account).await.unwrap());
    }

    #[tokio::test]
    async fn test_spent_tokens_are_pruned_on_issue() {
        let store = InMemoryUserStore::new();
        let account = registered(&store, "alice", "alice@example.com").await;

        let consumed = store
            .generate_email_confirmation_token(&account)
            .await
            .unwrap();
        assert!(store.confirm_email(&account, &consumed).await.unwrap());
        store.generate_password_reset_token(&account).await.unwrap();
        for stored in store.state.write().await.tokens.iter_mut() {
            if !stored.consumed {
                stored.expires_at = Utc::now() - Duration::minutes(1);
            }
        }

        let live = store.generate_password_reset_token(&account).await.unwrap();

        let state = store.state.read().await;
        assert_eq!(state.tokens.len(), 1);
        assert_eq!(state.tokens[0].digest, tokens::digest(&live));
    }

    #[tokio::test]
    async fn test_password_check_without_account_completes() {
        let store = InMemoryUserStore::new();

        store.check_password_without_account("Str0ng!pass").await;
        store.check_password_without_account("Str0ng!pass").await;
    }

    #[tokio::test]
    async fn test_password_check_and_refresh_token() {
        let store = InMemoryUserStore::new();
        let account = registered(&store, "alice", "alice@example.com").await;

        assert!(store.check_password(&account, "Str0ng!pass").await.unwrap());
        assert!(!store.check_password(&account, "wrong").await.unwrap());

        let expires_at = Utc::now() + Duration::days(1);
        store
            .set_refresh_token(&account, "refresh", expires_at)
            .await
            .unwrap();

        let reloaded = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(reloaded.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(reloaded.refresh_token_expires_at, Some(expires_at));
    }
}
