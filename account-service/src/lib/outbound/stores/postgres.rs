use async_trait::async_trait;
use auth::PasswordHasher;
use auth::PasswordPolicy;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

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

const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, username, email, email_confirmed, \
                               refresh_token, refresh_token_expires_at, created_at";

#[derive(FromRow)]
struct AccountRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    username: String,
    email: String,
    email_confirmed: bool,
    refresh_token: Option<String>,
    refresh_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            username: Username::new(row.username)
                .map_err(|e| StoreError::Corrupted(e.to_string()))?,
            email: EmailAddress::new(row.email).map_err(|e| StoreError::Corrupted(e.to_string()))?,
            email_confirmed: row.email_confirmed,
            refresh_token: row.refresh_token,
            refresh_token_expires_at: row.refresh_token_expires_at,
            created_at: row.created_at,
        })
    }
}

fn database_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

pub struct PostgresUserStore {
    pool: PgPool,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            hasher: PasswordHasher::new(),
            policy: PasswordPolicy::default(),
        }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Account>, StoreError> {
        let query = format!(
            "SELECT {} FROM accounts WHERE lower({}) = lower($1)",
            ACCOUNT_COLUMNS, column
        );

        sqlx::query_as::<_, AccountRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .map(Account::try_from)
            .transpose()
    }

    async fn issue_token(
        &self,
        account: &Account,
        purpose: TokenPurpose,
    ) -> Result<String, StoreError> {
        let (token, digest) = tokens::generate();

        sqlx::query(
            r#"
            INSERT INTO verification_tokens (id, account_id, purpose, token_digest, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account.id.0)
        .bind(purpose.as_str())
        .bind(digest)
        .bind(Utc::now() + tokens::token_lifetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_foreign_key_violation() {
                    return StoreError::NotFound(account.id.to_string());
                }
            }
            database_error(e)
        })?;

        Ok(token)
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.find_one("username", username).await
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

        sqlx::query(
            r#"
            INSERT INTO accounts (id, first_name, last_name, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(created.id.0)
        .bind(&created.first_name)
        .bind(&created.last_name)
        .bind(created.username.as_str())
        .bind(created.email.as_str())
        .bind(password_hash)
        .bind(created.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return StoreError::DuplicateAccount;
                }
            }
            database_error(e)
        })?;

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
        let mut transaction = self.pool.begin().await.map_err(database_error)?;

        // Only one concurrent caller can flip consumed_at for a given token.
        let consumed = sqlx::query(
            r#"
            UPDATE verification_tokens
            SET consumed_at = now()
            WHERE account_id = $1
              AND purpose = $2
              AND token_digest = $3
              AND consumed_at IS NULL
              AND expires_at > now()
            "#,
        )
        .bind(account.id.0)
        .bind(TokenPurpose::EmailConfirmation.as_str())
        .bind(tokens::digest(token))
        .execute(&mut *transaction)
        .await
        .map_err(database_error)?
        .rows_affected();

        if consumed == 0 {
            transaction.rollback().await.map_err(database_error)?;
            return Ok(false);
        }

        let updated = sqlx::query("UPDATE accounts SET email_confirmed = TRUE WHERE id = $1")
            .bind(account.id.0)
            .execute(&mut *transaction)
            .await
            .map_err(database_error)?
            .rows_affected();
        if updated == 0 {
            transaction.rollback().await.map_err(database_error)?;
            return Err(StoreError::NotFound(account.id.to_string()));
        }

        transaction.commit().await.map_err(database_error)?;
        Ok(true)
    }

    async fn is_email_confirmed(&self, account: &Account) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT email_confirmed FROM accounts WHERE id = $1")
            .bind(account.id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .ok_or_else(|| StoreError::NotFound(account.id.to_string()))
    }

    async fn generate_password_reset_token(
        &self,
        account: &Account,
    ) -> Result<String, StoreError> {
        self.issue_token(account, TokenPurpose::PasswordReset).await
    }

    async fn check_password(&self, account: &Account, password: &str) -> Result<bool, StoreError> {
        let password_hash =
            sqlx::query_scalar::<_, String>("SELECT password_hash FROM accounts WHERE id = $1")
                .bind(account.id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(database_error)?
                .ok_or_else(|| StoreError::NotFound(account.id.to_string()))?;

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
        let updated = sqlx::query(
            r#"
            UPDATE accounts
            SET refresh_token = $2, refresh_token_expires_at = $3
            WHERE id = $1
            "#,
        )
        .bind(account.id.0)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?
        .rows_affected();

        if updated == 0 {
            return Err(StoreError::NotFound(account.id.to_string()));
        }
        Ok(())
    }
}
