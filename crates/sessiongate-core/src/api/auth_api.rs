use std::future::Future;

use crate::models::Session;

use super::ApiError;

/// Remote operations the submission flow depends on.
///
/// Implementations deliver their result asynchronously; the flow never
/// cancels a call once it has been started.
pub trait AuthApi {
    /// Read-style operation: exchange credentials for a session.
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send;

    /// Write-style operation: create an account and return its first session.
    fn signup(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send;
}
