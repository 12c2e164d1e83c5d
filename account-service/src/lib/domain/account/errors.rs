use problem::ErrorCode;
use problem::InternalError;
use problem::ValidationErrors;
use thiserror::Error;

/// Extension key carrying password policy violations.
pub const PASSWORD_VALIDATION_ERRORS: &str = "password_validation_errors";

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username must not be empty")]
    Empty,

    #[error("Username contains invalid characters (only letters, digits and -._@+ allowed)")]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Failures reported by a user store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("An account with this email or username already exists")]
    DuplicateAccount,

    #[error("Account is missing required field: {0}")]
    Incomplete(&'static str),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Stored account is corrupted: {0}")]
    Corrupted(String),

    #[error("Password hashing failed: {0}")]
    Password(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Transport failures reported by an email sender.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailSenderError {
    #[error("Email provider unreachable: {0}")]
    Unreachable(String),

    #[error("Email request could not be built: {0}")]
    InvalidRequest(String),
}

/// Failures reported by a token issuer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenIssuerError {
    #[error("Key file not found: {0}")]
    KeyNotFound(String),

    #[error("Key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("Token rejected: {0}")]
    Rejected(String),

    #[error("Token signing failed: {0}")]
    SigningFailed(String),
}

/// Error for event publishing operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventPublisherError {
    #[error("Event queue is full")]
    QueueFull,

    #[error("Event queue is closed")]
    Closed,
}

/// Every failure an account use case can report to its caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("One or more validation errors occurred")]
    ValidationFailed(ValidationErrors),

    #[error("Invalid credentials or email not verified")]
    InvalidCredentialsOrEmailNotVerified,

    #[error("User not found")]
    UserNotFound,

    #[error("Email or username already used")]
    EmailOrUsernameAlreadyUsed,

    #[error("Password does not meet security criteria")]
    PasswordDoesNotMeetSecurityCriteria(Vec<String>),

    #[error("Invalid verification link")]
    InvalidVerificationLink,

    #[error("Email already verified")]
    EmailAlreadyVerified,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("External service unavailable")]
    ExternalServiceUnavailable,

    #[error("Internal server error")]
    InternalServerError,

    #[error("File not found")]
    FileNotFound,
}

impl From<ValidationErrors> for AccountError {
    fn from(errors: ValidationErrors) -> Self {
        AccountError::ValidationFailed(errors)
    }
}

impl From<AccountError> for InternalError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::ValidationFailed(errors) => {
                InternalError::new(ErrorCode::BadRequest, "Invalid request")
                    .with_detail("One or more validation errors occurred.")
                    .with_extensions(errors.to_extensions())
            }
            AccountError::InvalidCredentialsOrEmailNotVerified => {
                InternalError::new(ErrorCode::Unauthorized, "Invalid credentials").with_detail(
                    "Invalid credentials or email not verified. Please check your details or \
                     request a new verification link.",
                )
            }
            AccountError::UserNotFound => InternalError::new(ErrorCode::NotFound, "User not found")
                .with_detail("The user requested could not be found."),
            AccountError::EmailOrUsernameAlreadyUsed => {
                InternalError::new(ErrorCode::BadRequest, "Registration failed").with_detail(
                    "An account with these details already exists or the information is \
                     invalid. Please try again or use the 'Forgot Password' option if needed.",
                )
            }
            AccountError::PasswordDoesNotMeetSecurityCriteria(descriptions) => {
                let descriptions: Vec<String> = descriptions
                    .into_iter()
                    .filter(|d| !d.is_empty())
                    .collect();

                InternalError::new(
                    ErrorCode::ValidationFailed,
                    "Password does not meet security criteria",
                )
                .with_detail(
                    "The password you have entered does not meet the basic security criteria. \
                     Please create a new password following the established security criteria.",
                )
                .with_extension(PASSWORD_VALIDATION_ERRORS, descriptions)
            }
            AccountError::InvalidVerificationLink => {
                InternalError::new(ErrorCode::Conflict, "Invalid verification link").with_detail(
                    "This verification link is invalid or has already been used. Please \
                     request a new one if needed.",
                )
            }
            AccountError::EmailAlreadyVerified => {
                InternalError::new(ErrorCode::Conflict, "Email already verified")
                    .with_detail("The email address of this account has already been verified.")
            }
            AccountError::InvalidRefreshToken => {
                InternalError::new(ErrorCode::Unauthorized, "Invalid refresh token")
                    .with_detail("The session could not be refreshed. Please log in again.")
            }
            AccountError::ExternalServiceUnavailable => InternalError::new(
                ErrorCode::ServiceUnavailable,
                "External service is not available",
            )
            .with_detail("The external service requested is not available."),
            AccountError::InternalServerError => {
                InternalError::new(ErrorCode::InternalError, "Internal server error")
                    .with_detail("One or more internal components have failed.")
            }
            AccountError::FileNotFound => InternalError::new(ErrorCode::NotFound, "File not found")
                .with_detail("The file you requested is invalid. Please try again."),
        }
    }
}

#[cfg(test)]
mod tests {
    use problem::ExtensionValue;

    use super::*;

    #[test]
    fn test_validation_failed_carries_field_extensions() {
        let mut errors = ValidationErrors::new();
        errors.add("Email", "The Email field is required.");
        errors.add("Password", "");

        let error = InternalError::from(AccountError::ValidationFailed(errors));
        assert_eq!(error.code(), ErrorCode::BadRequest);
        assert_eq!(error.title(), "Invalid request");
        assert_eq!(error.extensions().len(), 1);
        assert_eq!(
            error.extensions().get("Email"),
            Some(&ExtensionValue::Text("The Email field is required.".into()))
        );
    }

    #[test]
    fn test_password_criteria_drops_empty_descriptions() {
        let error = InternalError::from(AccountError::PasswordDoesNotMeetSecurityCriteria(vec![
            "Passwords must be at least 6 characters.".to_string(),
            String::new(),
            "Passwords must have at least one digit ('0'-'9').".to_string(),
        ]));

        assert_eq!(error.code(), ErrorCode::ValidationFailed);
        assert_eq!(
            error.extensions().get(PASSWORD_VALIDATION_ERRORS),
            Some(&ExtensionValue::List(vec![
                "Passwords must be at least 6 characters.".to_string(),
                "Passwords must have at least one digit ('0'-'9').".to_string(),
            ]))
        );
    }

    #[test]
    fn test_catalogue_codes() {
        let cases = [
            (AccountError::InvalidCredentialsOrEmailNotVerified, 401),
            (AccountError::UserNotFound, 404),
            (AccountError::EmailOrUsernameAlreadyUsed, 400),
            (AccountError::InvalidVerificationLink, 409),
            (AccountError::EmailAlreadyVerified, 409),
            (AccountError::InvalidRefreshToken, 401),
            (AccountError::ExternalServiceUnavailable, 503),
            (AccountError::InternalServerError, 500),
            (AccountError::FileNotFound, 404),
        ];

        for (error, status) in cases {
            let internal = InternalError::from(error);
            assert_eq!(internal.code().status(), status, "{}", internal.title());
            assert!(internal.detail().is_some());
        }
    }
}
