//! Structured failure propagation for use cases.
//!
//! Every use case returns [`Result<T>`]: either its success value or exactly
//! one [`InternalError`]. At the presentation boundary a [`ProblemTranslator`]
//! turns the error into an RFC 7807 [`ProblemDocument`], which is the only
//! error shape a client ever sees.
//!
//! ```
//! use problem::ErrorCode;
//! use problem::InternalError;
//! use problem::ProblemTranslator;
//!
//! let error = InternalError::new(ErrorCode::NotFound, "User not found")
//!     .with_detail("The user requested could not be found.");
//! let document = ProblemTranslator::new("https://accounts.example.com")
//!     .translate(&error, "/auth/confirm-email");
//!
//! assert_eq!(document.type_url, "https://accounts.example.com/errors/notfound");
//! assert_eq!(document.status, 404);
//! ```

pub mod codes;
pub mod document;
pub mod error;
pub mod extensions;
pub mod translator;
pub mod validation;

pub use codes::ErrorCode;
pub use document::ProblemDocument;
pub use document::PROBLEM_JSON_CONTENT_TYPE;
pub use error::InternalError;
pub use extensions::ExtensionValue;
pub use extensions::Extensions;
pub use translator::translate;
pub use translator::ProblemTranslator;
pub use validation::ValidationErrors;

/// Outcome of a use case.
///
/// `Ok` carries the value, `Err` carries exactly one structured error; a
/// success with an error or a failure without one cannot be constructed.
pub type Result<T, E = InternalError> = std::result::Result<T, E>;
