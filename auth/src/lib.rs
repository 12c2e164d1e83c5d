//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for the account service:
//! - Password hashing (Argon2id) and password policy checks
//! - PEM key loading for asymmetric signing keys
//! - RS256 JWT generation and validation
//! - Identity issuance (access and refresh tokens)
//! - URL-safe transport encoding for verification tokens
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Password Policy
//! ```
//! use auth::PasswordPolicy;
//!
//! let violations = PasswordPolicy::default().validate("short");
//! assert!(violations.iter().any(|v| v.code == "PasswordTooShort"));
//! ```
//!
//! ## Verification Token Transport
//! ```
//! use auth::codec::decode_token;
//! use auth::codec::encode_token;
//!
//! let encoded = encode_token("CfDJ8+provider/token==");
//! assert!(!encoded.contains('+'));
//! assert_eq!(decode_token(&encoded).unwrap(), "CfDJ8+provider/token==");
//! ```

pub mod codec;
pub mod issuer;
pub mod jwt;
pub mod keys;
pub mod password;

// Re-export commonly used items
pub use codec::DecodingError;
pub use issuer::IdentityIssuer;
pub use issuer::IssuerError;
pub use issuer::IssuerSettings;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use keys::FileKeyLoader;
pub use keys::KeyError;
pub use keys::KeyLoader;
pub use keys::KeyMaterial;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordPolicy;
pub use password::PolicyViolation;
