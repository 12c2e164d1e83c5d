use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Duration;
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::keys::FileKeyLoader;
use crate::keys::KeyError;
use crate::keys::KeyLoader;
use crate::keys::KeyMaterial;

const REFRESH_TOKEN_BYTES: usize = 32;

/// Identity issuance errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IssuerError {
    #[error("Signing key unavailable: {0}")]
    Key(#[from] KeyError),

    #[error("JWT error: {0}")]
    Jwt(#[from] JwtError),
}

/// Static settings for token issuance.
#[derive(Debug, Clone)]
pub struct IssuerSettings {
    pub issuer: String,
    pub audience: String,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub access_token_lifetime: Duration,
}

/// Issues and validates RS256 session tokens.
///
/// Key material is loaded through the [`KeyLoader`] on every call and dropped
/// when the call returns.
pub struct IdentityIssuer<L: KeyLoader = FileKeyLoader> {
    key_loader: L,
    settings: IssuerSettings,
    jwt_handler: JwtHandler,
}

impl IdentityIssuer<FileKeyLoader> {
    /// Create an issuer reading PEM files from disk.
    pub fn from_files(settings: IssuerSettings) -> Self {
        Self::new(FileKeyLoader::new(), settings)
    }
}

impl<L: KeyLoader> IdentityIssuer<L> {
    /// Create a new identity issuer.
    ///
    /// # Arguments
    /// * `key_loader` - Source of PEM key material
    /// * `settings` - Issuer, audience, key locations and access token lifetime
    pub fn new(key_loader: L, settings: IssuerSettings) -> Self {
        let jwt_handler = JwtHandler::new(settings.issuer.clone(), settings.audience.clone());
        Self {
            key_loader,
            settings,
            jwt_handler,
        }
    }

    /// Sign an access token for an account.
    ///
    /// # Arguments
    /// * `subject` - Account unique name
    ///
    /// # Returns
    /// Signed JWT expiring after the configured lifetime
    ///
    /// # Errors
    /// * `Key` - Private key missing or unreadable
    /// * `Jwt` - Key is unusable or signing failed
    pub async fn issue_access_token(&self, subject: &str) -> Result<String, IssuerError> {
        let private_key = self.private_key().await?;

        let claims = Claims::for_subject(subject, self.settings.access_token_lifetime)
            .with_issuer(&self.settings.issuer)
            .with_audience(&self.settings.audience);

        self.jwt_handler
            .encode(&claims, &private_key)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to sign access token");
                IssuerError::from(e)
            })
    }

    /// Generate an opaque refresh token.
    ///
    /// 32 bytes from the operating system CSPRNG, base64-encoded. The value is a
    /// bearer secret.
    pub fn issue_refresh_token(&self) -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        STANDARD.encode(bytes)
    }

    /// Validate a token's signature, issuer, audience, algorithm and lifetime.
    ///
    /// # Errors
    /// * `Key` - Public key missing or unreadable
    /// * `Jwt` - Token rejected
    pub async fn validate_token(&self, token: &str) -> Result<Claims, IssuerError> {
        let public_key = self.public_key().await?;
        Ok(self.jwt_handler.decode(token, &public_key, true)?)
    }

    /// Validate a token the same way as [`Self::validate_token`] but accept an elapsed expiry.
    ///
    /// Used when exchanging a refresh token for a new access token.
    pub async fn validate_expired_token(&self, token: &str) -> Result<Claims, IssuerError> {
        let public_key = self.public_key().await?;
        Ok(self.jwt_handler.decode(token, &public_key, false)?)
    }

    /// Load the public half of the signing key.
    pub async fn public_key(&self) -> Result<KeyMaterial, IssuerError> {
        self.load(&self.settings.public_key_path).await
    }

    async fn private_key(&self) -> Result<KeyMaterial, IssuerError> {
        self.load(&self.settings.private_key_path).await
    }

    async fn load(&self, path: &std::path::Path) -> Result<KeyMaterial, IssuerError> {
        self.key_loader
            .load_asymmetric_key(path)
            .await
            .map_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "Failed to load signing key");
                IssuerError::Key(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    fn settings() -> IssuerSettings {
        IssuerSettings {
            issuer: "accounts".to_string(),
            audience: "web".to_string(),
            private_key_path: fixture("private.pem"),
            public_key_path: fixture("public.pem"),
            access_token_lifetime: Duration::minutes(30),
        }
    }

    #[tokio::test]
    async fn test_issue_and_validate_access_token() {
        let issuer = IdentityIssuer::from_files(settings());

        let token = issuer
            .issue_access_token("alice")
            .await
            .expect("Failed to issue token");
        let claims = issuer
            .validate_token(&token)
            .await
            .expect("Failed to validate token");

        assert_eq!(claims.sub, Some("alice".to_string()));
        assert_eq!(claims.iss, Some("accounts".to_string()));
        assert_eq!(claims.aud, Some("web".to_string()));
        assert_eq!(claims.exp.unwrap() - claims.iat.unwrap(), 30 * 60);
    }

    #[tokio::test]
    async fn test_missing_private_key() {
        let issuer = IdentityIssuer::from_files(IssuerSettings {
            private_key_path: fixture("absent.pem"),
            ..settings()
        });

        let result = issuer.issue_access_token("alice").await;
        assert!(matches!(
            result,
            Err(IssuerError::Key(KeyError::FileNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_token_from_other_key_pair_is_rejected() {
        let other = IdentityIssuer::from_files(IssuerSettings {
            private_key_path: fixture("other_private.pem"),
            public_key_path: fixture("other_public.pem"),
            ..settings()
        });
        let issuer = IdentityIssuer::from_files(settings());

        let token = other.issue_access_token("alice").await.unwrap();
        assert!(issuer.validate_token(&token).await.is_err());
    }

    #[test]
    fn test_refresh_tokens_are_32_random_bytes() {
        let issuer = IdentityIssuer::from_files(settings());

        let tokens: HashSet<String> = (0..64).map(|_| issuer.issue_refresh_token()).collect();
        assert_eq!(tokens.len(), 64);

        for token in tokens {
            assert_eq!(STANDARD.decode(token).unwrap().len(), REFRESH_TOKEN_BYTES);
        }
    }
}
