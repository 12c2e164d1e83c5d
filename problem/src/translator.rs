use crate::document::ProblemDocument;
use crate::error::InternalError;
use crate::extensions::Extensions;

const STATUS_CODE_MEMBER: &str = "statusCode";

/// Maps [`InternalError`] values onto problem documents.
#[derive(Debug, Clone)]
pub struct ProblemTranslator {
    base_url: String,
    error_path: String,
}

impl ProblemTranslator {
    /// Translator emitting type URIs under `{base_url}/errors/`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            error_path: "errors".to_string(),
        }
    }

    /// Override the path segment placed between the base URL and the code.
    pub fn with_error_path(mut self, error_path: impl Into<String>) -> Self {
        self.error_path = error_path.into().trim_matches('/').to_string();
        self
    }

    /// Build the document for `error` raised while serving `request_path`.
    ///
    /// Pure; the same input always yields the same document.
    pub fn translate(&self, error: &InternalError, request_path: &str) -> ProblemDocument {
        let code = error.code();

        let mut extensions = Extensions::new();
        extensions.insert(STATUS_CODE_MEMBER, code.as_str());
        for (key, value) in error.extensions().iter() {
            if ProblemDocument::RESERVED_MEMBERS.contains(&key) || key == STATUS_CODE_MEMBER {
                continue;
            }
            extensions.insert(key, value.clone());
        }

        ProblemDocument {
            type_url: format!(
                "{}/{}/{}",
                self.base_url,
                self.error_path,
                code.as_str().to_lowercase()
            ),
            title: error.title().to_string(),
            detail: error.detail().map(str::to_string),
            status: code.status(),
            instance: request_path.to_string(),
            extensions,
        }
    }
}

/// Translate with a throwaway [`ProblemTranslator`].
pub fn translate(error: &InternalError, request_path: &str, base_url: &str) -> ProblemDocument {
    ProblemTranslator::new(base_url).translate(error, request_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::ErrorCode;
    use crate::extensions::ExtensionValue;

    fn conflict() -> InternalError {
        InternalError::new(ErrorCode::Conflict, "Invalid verification link")
            .with_detail("This verification link is invalid or has already been used.")
    }

    #[test]
    fn test_translate_fills_standard_members() {
        let document = translate(&conflict(), "/auth/confirm-email", "https://accounts.test");

        assert_eq!(document.type_url, "https://accounts.test/errors/conflict");
        assert_eq!(document.title, "Invalid verification link");
        assert_eq!(
            document.detail.as_deref(),
            Some("This verification link is invalid or has already been used.")
        );
        assert_eq!(document.status, 409);
        assert_eq!(document.instance, "/auth/confirm-email");
        assert_eq!(
            document.extensions.get("statusCode"),
            Some(&ExtensionValue::Text("Conflict".into()))
        );
    }

    #[test]
    fn test_trailing_slash_and_custom_error_path() {
        let document = ProblemTranslator::new("https://accounts.test/")
            .with_error_path("/problems/")
            .translate(&conflict(), "/x");
        assert_eq!(document.type_url, "https://accounts.test/problems/conflict");
    }

    #[test]
    fn test_extensions_follow_status_code_in_order() {
        let error = InternalError::new(ErrorCode::BadRequest, "Invalid request")
            .with_extension("Password", "required")
            .with_extension("Email", vec!["a".to_string(), "b".to_string()]);

        let document = translate(&error, "/auth/register", "https://accounts.test");
        assert_eq!(
            document.extensions.keys().collect::<Vec<_>>(),
            vec!["statusCode", "Password", "Email"]
        );
    }

    #[test]
    fn test_reserved_members_cannot_be_overridden() {
        let error = InternalError::new(ErrorCode::NotFound, "User not found")
            .with_extension("status", "200")
            .with_extension("statusCode", "OK");

        let document = translate(&error, "/", "https://accounts.test");
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["status"], 404);
        assert_eq!(value["statusCode"], "NotFound");
    }

    #[test]
    fn test_translation_is_deterministic() {
        let translator = ProblemTranslator::new("https://accounts.test");
        let error = conflict().with_extension("hint", "retry");

        let first = serde_json::to_string(&translator.translate(&error, "/p")).unwrap();
        let second = serde_json::to_string(&translator.translate(&error, "/p")).unwrap();
        assert_eq!(first, second);
    }
}
