use thiserror::Error;

use crate::codes::ErrorCode;
use crate::extensions::ExtensionValue;
use crate::extensions::Extensions;

/// Structured failure returned by a use case.
///
/// Immutable once built; the builder methods consume and return the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {title}")]
pub struct InternalError {
    code: ErrorCode,
    title: String,
    detail: Option<String>,
    extensions: Extensions,
}

impl InternalError {
    pub fn new(code: ErrorCode, title: impl Into<String>) -> Self {
        Self {
            code,
            title: title.into(),
            detail: None,
            extensions: Extensions::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_extension(
        mut self,
        key: impl Into<String>,
        value: impl Into<ExtensionValue>,
    ) -> Self {
        self.extensions.insert(key, value);
        self
    }

    /// Append every member of `extensions`, in order.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        for (key, value) in extensions.iter() {
            self.extensions.insert(key, value.clone());
        }
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}
