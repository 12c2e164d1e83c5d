use async_trait::async_trait;
use auth::IdentityIssuer;
use auth::IssuerError;
use auth::IssuerSettings;
use auth::KeyError;

use crate::account::errors::TokenIssuerError;
use crate::account::ports::TokenIssuer;

/// RS256 token issuer reading its key pair from PEM files.
pub struct RsaTokenIssuer {
    issuer: IdentityIssuer,
}

impl RsaTokenIssuer {
    pub fn new(settings: IssuerSettings) -> Self {
        Self {
            issuer: IdentityIssuer::from_files(settings),
        }
    }
}

fn key_error(e: KeyError) -> TokenIssuerError {
    match e {
        KeyError::FileNotFound(path) => TokenIssuerError::KeyNotFound(path),
        other => TokenIssuerError::KeyUnavailable(other.to_string()),
    }
}

#[async_trait]
impl TokenIssuer for RsaTokenIssuer {
    async fn issue_access_token(&self, subject: &str) -> Result<String, TokenIssuerError> {
        self.issuer
            .issue_access_token(subject)
            .await
            .map_err(|e| match e {
                IssuerError::Key(e) => key_error(e),
                IssuerError::Jwt(e) => TokenIssuerError::SigningFailed(e.to_string()),
            })
    }

    fn issue_refresh_token(&self) -> String {
        self.issuer.issue_refresh_token()
    }

    async fn subject_of_expired_token(&self, token: &str) -> Result<String, TokenIssuerError> {
        let claims = self
            .issuer
            .validate_expired_token(token)
            .await
            .map_err(|e| match e {
                IssuerError::Key(e) => key_error(e),
                IssuerError::Jwt(e) => TokenIssuerError::Rejected(e.to_string()),
            })?;

        claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| TokenIssuerError::Rejected("token has no subject".to_string()))
    }

    async fn public_key_pem(&self) -> Result<String, TokenIssuerError> {
        let key = self.issuer.public_key().await.map_err(|e| match e {
            IssuerError::Key(e) => key_error(e),
            IssuerError::Jwt(e) => TokenIssuerError::KeyUnavailable(e.to_string()),
        })?;
        Ok(key.as_str().to_string())
    }
}
