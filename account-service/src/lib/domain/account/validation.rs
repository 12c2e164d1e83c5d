//! Required-field checks run at the top of every use case.
//!
//! Messages follow the wording clients of the HTTP API already match on.

use problem::ValidationErrors;

use crate::account::errors::AccountError;
use crate::account::models::ConfirmEmailCommand;
use crate::account::models::EmailAddress;
use crate::account::models::LoginCommand;
use crate::account::models::RefreshTokenCommand;
use crate::account::models::RegisterCommand;
use crate::account::models::ResetPasswordCommand;
use crate::account::models::SendEmailConfirmationCommand;
use crate::account::models::Username;

fn required(errors: &mut ValidationErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, format!("The {} field is required.", field));
        false
    } else {
        true
    }
}

fn email(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<EmailAddress> {
    if !required(errors, field, value) {
        return None;
    }
    match EmailAddress::new(value.trim().to_string()) {
        Ok(address) => Some(address),
        Err(_) => {
            errors.add(
                field,
                format!("The {} field is not a valid e-mail address.", field),
            );
            None
        }
    }
}

fn finish<T>(errors: ValidationErrors, value: Option<T>) -> Result<T, AccountError> {
    match (errors.into_result(), value) {
        (Ok(()), Some(value)) => Ok(value),
        (Err(errors), _) => Err(AccountError::ValidationFailed(errors)),
        (Ok(()), None) => Err(AccountError::InternalServerError),
    }
}

impl LoginCommand {
    pub fn validate(&self) -> Result<(), AccountError> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "Username", &self.username);
        required(&mut errors, "Password", &self.password);
        finish(errors, Some(()))
    }
}

impl RegisterCommand {
    /// Check every field and return the typed identity values.
    pub fn validate(&self) -> Result<(Username, EmailAddress), AccountError> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "FirstName", &self.first_name);
        required(&mut errors, "LastName", &self.last_name);
        let email = email(&mut errors, "Email", &self.email);
        let username = if required(&mut errors, "Username", &self.username) {
            Username::new(self.username.trim().to_string())
                .map_err(|e| errors.add("Username", e.to_string()))
                .ok()
        } else {
            None
        };
        required(&mut errors, "Password", &self.password);

        finish(errors, username.zip(email))
    }
}

impl SendEmailConfirmationCommand {
    pub fn validate(&self) -> Result<EmailAddress, AccountError> {
        let mut errors = ValidationErrors::new();
        let email = email(&mut errors, "Email", &self.email);
        finish(errors, email)
    }
}

impl ConfirmEmailCommand {
    pub fn validate(&self) -> Result<EmailAddress, AccountError> {
        let mut errors = ValidationErrors::new();
        let email = email(&mut errors, "Email", &self.email);
        required(&mut errors, "Token", &self.token);
        finish(errors, email)
    }
}

impl ResetPasswordCommand {
    pub fn validate(&self) -> Result<EmailAddress, AccountError> {
        let mut errors = ValidationErrors::new();
        let email = email(&mut errors, "Email", &self.email);
        finish(errors, email)
    }
}

impl RefreshTokenCommand {
    pub fn validate(&self) -> Result<(), AccountError> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "AccessToken", &self.access_token);
        required(&mut errors, "RefreshToken", &self.refresh_token);
        finish(errors, Some(()))
    }
}
