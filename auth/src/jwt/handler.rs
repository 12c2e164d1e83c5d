use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::JwtError;
use crate::keys::KeyMaterial;

/// JWT token handler for asymmetric (RS256) tokens.
///
/// Holds the issuer/audience expectations only; key material is supplied on
/// every call so that keys can be loaded, used and dropped per operation.
#[derive(Debug, Clone)]
pub struct JwtHandler {
    algorithm: Algorithm,
    issuer: String,
    audience: String,
}

impl JwtHandler {
    /// Create a new RS256 JWT handler.
    ///
    /// # Arguments
    /// * `issuer` - Expected and emitted `iss` claim
    /// * `audience` - Expected and emitted `aud` claim
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            algorithm: Algorithm::RS256,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Sign claims into a JWT token.
    ///
    /// # Arguments
    /// * `claims` - Claims to encode (must implement Serialize)
    /// * `private_key` - PEM-encoded RSA private key
    ///
    /// # Returns
    /// JWT token string
    ///
    /// # Errors
    /// * `InvalidKey` - PEM is not an RSA private key
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(
        &self,
        claims: &T,
        private_key: &KeyMaterial,
    ) -> Result<String, JwtError> {
        let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .map_err(|e| JwtError::InvalidKey(e.to_string()))?;

        encode(&Header::new(self.algorithm), claims, &key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify a JWT token and decode its claims.
    ///
    /// Signature, issuer, audience and algorithm are always checked. A token
    /// whose header names any algorithm other than RS256 is rejected even if
    /// its signature would verify under that algorithm.
    ///
    /// # Arguments
    /// * `token` - JWT token string
    /// * `public_key` - PEM-encoded RSA public key
    /// * `validate_lifetime` - Whether an elapsed `exp` rejects the token
    ///
    /// # Errors
    /// * `InvalidKey` - PEM is not an RSA public key
    /// * `TokenExpired` - Token has expired and lifetime is validated
    /// * `AlgorithmMismatch` - Header algorithm is not RS256
    /// * `InvalidToken` - Signature, issuer, audience or format is invalid
    pub fn decode<T: DeserializeOwned>(
        &self,
        token: &str,
        public_key: &KeyMaterial,
        validate_lifetime: bool,
    ) -> Result<T, JwtError> {
        let key = DecodingKey::from_rsa_pem(public_key.as_bytes())
            .map_err(|e| JwtError::InvalidKey(e.to_string()))?;

        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_exp = validate_lifetime;

        decode::<T>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                ErrorKind::InvalidAlgorithm => JwtError::AlgorithmMismatch,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }
}
