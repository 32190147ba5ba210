//! Field validation run before any remote call.
//!
//! Rules are checked in order and the first failure wins:
//! 1. username present
//! 2. password present, then the configured [`PasswordPolicy`]
//! 3. in `Signup` mode, confirmation present and equal to the password

use thiserror::Error;

use crate::models::ViewMode;

use super::SubmissionRequest;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username is required")]
    UsernameRequired,

    #[error("Password is required")]
    PasswordRequired,

    #[error("{0}")]
    WeakPassword(String),

    #[error("Please confirm your password")]
    ConfirmPasswordRequired,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Pass/fail strength check applied to non-empty passwords.
pub trait PasswordPolicy: Send + Sync {
    /// `Err` carries the message shown to the user.
    fn check(&self, password: &str) -> Result<(), String>;
}

/// Accepts every non-empty password; the server enforces its own rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAny;

impl PasswordPolicy for AcceptAny {
    fn check(&self, _password: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Requires at least this many characters.
#[derive(Debug, Clone, Copy)]
pub struct MinLength(pub usize);

impl PasswordPolicy for MinLength {
    fn check(&self, password: &str) -> Result<(), String> {
        if password.chars().count() < self.0 {
            Err(format!("Password must be at least {} characters", self.0))
        } else {
            Ok(())
        }
    }
}

impl<F> PasswordPolicy for F
where
    F: Fn(&str) -> Result<(), String> + Send + Sync,
{
    fn check(&self, password: &str) -> Result<(), String> {
        self(password)
    }
}

pub fn validate(
    request: &SubmissionRequest,
    policy: &dyn PasswordPolicy,
) -> Result<(), ValidationError> {
    if request.username.trim().is_empty() {
        return Err(ValidationError::UsernameRequired);
    }

    if request.password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    policy
        .check(&request.password)
        .map_err(ValidationError::WeakPassword)?;

    if request.mode == ViewMode::Signup {
        if request.confirm_password.is_empty() {
            return Err(ValidationError::ConfirmPasswordRequired);
        }
        if request.confirm_password != request.password {
            return Err(ValidationError::PasswordMismatch);
        }
    }

    Ok(())
}
