use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Duration;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;

const TOKEN_BYTES: usize = 32;

/// How long an emailed token stays usable.
pub(crate) fn token_lifetime() -> Duration {
    Duration::hours(24)
}

/// Purpose a verification token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TokenPurpose {
    EmailConfirmation,
    PasswordReset,
}

impl TokenPurpose {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            TokenPurpose::EmailConfirmation => "email_confirmation",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }
}

/// Fresh provider token and the digest that is stored in its place.
pub(crate) fn generate() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let token = STANDARD.encode(bytes);
    let stored = digest(&token);
    (token, stored)
}

pub(crate) fn digest(token: &str) -> String {
    STANDARD.encode(Sha256::digest(token.as_bytes()))
}
