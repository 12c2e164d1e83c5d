use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;

use super::errors::KeyError;

/// PEM-encoded asymmetric key material.
///
/// Held only for the duration of a single signing or validation call.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial(String);

impl KeyMaterial {
    /// Wrap PEM text.
    ///
    /// # Errors
    /// * `InvalidPem` - Text carries no PEM armour
    pub fn from_pem(pem: impl Into<String>, origin: &str) -> Result<Self, KeyError> {
        let pem = pem.into();
        if pem.contains("-----BEGIN ") && pem.contains("-----END ") {
            Ok(Self(pem))
        } else {
            Err(KeyError::InvalidPem(origin.to_string()))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(..)")
    }
}

/// Source of asymmetric key material.
#[async_trait]
pub trait KeyLoader: Send + Sync + 'static {
    /// Load PEM key material from a location.
    ///
    /// # Arguments
    /// * `path` - Location of the PEM file
    ///
    /// # Returns
    /// Key material ready for signing or verification
    ///
    /// # Errors
    /// * `FileNotFound` - Path does not resolve to a file
    /// * `ReadFailed` - File could not be read
    /// * `InvalidPem` - File content is not PEM
    async fn load_asymmetric_key(&self, path: &Path) -> Result<KeyMaterial, KeyError>;
}

/// Loads keys from the local filesystem on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileKeyLoader;

impl FileKeyLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl KeyLoader for FileKeyLoader {
    async fn load_asymmetric_key(&self, path: &Path) -> Result<KeyMaterial, KeyError> {
        let display = path.display().to_string();

        let pem = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => KeyError::FileNotFound(display.clone()),
                _ => KeyError::ReadFailed {
                    path: display.clone(),
                    reason: e.to_string(),
                },
            })?;

        KeyMaterial::from_pem(pem, &display)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[tokio::test]
    async fn test_load_existing_key() {
        let key = FileKeyLoader::new()
            .load_asymmetric_key(&fixture("public.pem"))
            .await
            .expect("Failed to load key");

        assert!(key.as_str().starts_with("-----BEGIN PUBLIC KEY-----"));
    }

    #[tokio::test]
    async fn test_load_missing_key() {
        let result = FileKeyLoader::new()
            .load_asymmetric_key(&fixture("missing.pem"))
            .await;

        assert!(matches!(result, Err(KeyError::FileNotFound(_))));
    }

    #[test]
    fn test_reject_non_pem() {
        let result = KeyMaterial::from_pem("just some text", "inline");
        assert_eq!(result, Err(KeyError::InvalidPem("inline".to_string())));
    }

    #[test]
    fn test_debug_hides_material() {
        let key = KeyMaterial::from_pem("-----BEGIN X-----\nabc\n-----END X-----", "inline")
            .expect("Failed to wrap key");
        assert_eq!(format!("{:?}", key), "KeyMaterial(..)");
    }
}
