use std::fmt;

use crate::models::ViewMode;

/// Field values and view mode captured at the moment of a submit.
#[derive(Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub mode: ViewMode,
    pub username: String,
    pub password: String,
    /// Only consulted in `Signup` mode.
    pub confirm_password: String,
}

impl SubmissionRequest {
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mode: ViewMode::Login,
            username: username.into(),
            password: password.into(),
            confirm_password: String::new(),
        }
    }

    pub fn signup(
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            mode: ViewMode::Signup,
            username: username.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }
}

// Passwords never reach logs
impl fmt::Debug for SubmissionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionRequest")
            .field("mode", &self.mode)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_passwords() {
        let req = SubmissionRequest::signup("bob", "hunter2", "hunter2");
        let out = format!("{:?}", req);
        assert!(out.contains("bob"));
        assert!(!out.contains("hunter2"));
    }
}
