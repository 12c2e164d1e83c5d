use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::DecodePaddingMode;
use base64::Engine;
use thiserror::Error;

/// base64url without padding on the way out; trailing padding is tolerated on the way in.
const URL_SAFE_TOKEN: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Error for verification token decoding failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodingError {
    #[error("Token is not valid base64url: {0}")]
    InvalidEncoding(String),

    #[error("Token is not valid UTF-8")]
    InvalidUtf8,
}

/// Encode a provider-issued token for embedding in a URL.
///
/// The UTF-8 bytes of the token are base64url-encoded without padding.
pub fn encode_token(token: &str) -> String {
    URL_SAFE_TOKEN.encode(token.as_bytes())
}

/// Recover the provider-issued token from its URL-safe form.
///
/// # Errors
/// * `InvalidEncoding` - Input uses characters outside the base64url alphabet or is truncated
/// * `InvalidUtf8` - Decoded bytes are not a UTF-8 string
pub fn decode_token(encoded: &str) -> Result<String, DecodingError> {
    let bytes = URL_SAFE_TOKEN
        .decode(encoded)
        .map_err(|e| DecodingError::InvalidEncoding(e.to_string()))?;

    String::from_utf8(bytes).map_err(|_| DecodingError::InvalidUtf8)
}
