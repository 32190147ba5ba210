//! GraphQL client for the authentication endpoint.
//!
//! This module provides the `GraphQlClient` struct, which posts login
//! queries and signup mutations as JSON and decodes the returned session.

use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::models::Session;

use super::queries::{login_query, signup_mutation, LOGIN_FIELD, SIGNUP_FIELD};
use super::{ApiError, AuthApi};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// What to do with one HTTP response from the endpoint.
#[derive(Debug)]
enum ResponseAction {
    /// Rate limited: wait this long, then send the same request again.
    Retry(Duration),
    Finish(Result<Session, ApiError>),
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// GraphQL client for the authentication service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct GraphQlClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl GraphQlClient {
    /// Create a new client posting to `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: None,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Create a new client with the given bearer token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            token: Some(token.into()),
        }
    }

    /// Post one GraphQL operation and decode the session held in `field`.
    async fn execute(
        &self,
        query: &str,
        variables: Value,
        field: &str,
    ) -> Result<Session, ApiError> {
        let body = GraphQlRequest { query, variables };
        let mut retries = 0;

        loop {
            let mut request = self.client.post(&self.endpoint).json(&body);
            if let Some(ref token) = self.token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            debug!(endpoint = %self.endpoint, %status, field, "GraphQL response received");

            match Self::next_action(status, &text, field, retries) {
                ResponseAction::Retry(delay) => {
                    retries += 1;
                    let backoff_ms = delay.as_millis() as u64;
                    warn!(retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(delay).await;
                }
                ResponseAction::Finish(result) => return result,
            }
        }
    }

    /// Decide how to handle a response, given how many retries already ran.
    fn next_action(status: StatusCode, body: &str, field: &str, retries: u32) -> ResponseAction {
        if status == StatusCode::TOO_MANY_REQUESTS {
            if retries >= MAX_RATE_LIMIT_RETRIES {
                return ResponseAction::Finish(Err(ApiError::RateLimited));
            }
            // Exponential backoff
            let delay = Duration::from_millis(INITIAL_BACKOFF_MS << retries);
            return ResponseAction::Retry(delay);
        }

        if !status.is_success() {
            // GraphQL servers report rejected operations with a 4xx and an
            // `errors` array; prefer that message over the bare status.
            let error = match Self::first_error(body) {
                Some(message) => ApiError::GraphQl(message),
                None => ApiError::from_status(status, body),
            };
            return ResponseAction::Finish(Err(error));
        }

        ResponseAction::Finish(Self::decode_session(body, field))
    }

    fn first_error(body: &str) -> Option<String> {
        serde_json::from_str::<GraphQlResponse>(body)
            .ok()
            .and_then(|r| r.errors.into_iter().next())
            .map(|e| e.message)
    }

    /// Decode a GraphQL envelope, surfacing the first reported error verbatim.
    fn decode_session(body: &str, field: &str) -> Result<Session, ApiError> {
        let envelope: GraphQlResponse = serde_json::from_str(body).map_err(|e| {
            ApiError::InvalidResponse(format!("Malformed GraphQL response: {}", e))
        })?;

        if let Some(error) = envelope.errors.into_iter().next() {
            return Err(ApiError::GraphQl(error.message));
        }

        let payload = envelope
            .data
            .and_then(|mut data| data.get_mut(field).map(Value::take))
            .filter(|v| !v.is_null())
            .ok_or_else(|| ApiError::InvalidResponse(format!("Response is missing `{}`", field)))?;

        serde_json::from_value(payload).map_err(|e| {
            ApiError::InvalidResponse(format!("Invalid session in `{}`: {}", field, e))
        })
    }
}

impl AuthApi for GraphQlClient {
    async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let variables = json!({
            "login": {
                "username": username,
                "password": password,
            }
        });
        self.execute(&login_query(), variables, LOGIN_FIELD).await
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Session, ApiError> {
        let variables = json!({
            "signup": {
                "username": username,
                "password": password,
                "confirmPassword": confirm_password,
            }
        });
        self.execute(&signup_mutation(), variables, SIGNUP_FIELD).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_BODY: &str = concat!(
        r#"{"data":{"login":{"userId":"1","token":"t1","#,
        r#""tokenExpiration":"2099-01-01","username":"alice"}}}"#
    );

    fn finished(action: ResponseAction) -> Result<Session, ApiError> {
        match action {
            ResponseAction::Finish(result) => result,
            ResponseAction::Retry(delay) => panic!("unexpected retry after {:?}", delay),
        }
    }

    #[test]
    fn test_decode_login_response() {
        let body = LOGIN_BODY;
        let session = GraphQlClient::decode_session(body, LOGIN_FIELD).expect("session");
        assert_eq!(session.user_id(), "1");
        assert_eq!(session.token(), "t1");
        assert_eq!(session.username(), "alice");
    }

    #[test]
    fn test_decode_surfaces_first_graphql_error() {
        let body = concat!(
            r#"{"data":{"login":null},"errors":["#,
            r#"{"message":"invalid credentials","path":["login"]},{"message":"second"}]}"#
        );
        let err = GraphQlClient::decode_session(body, LOGIN_FIELD).unwrap_err();
        assert!(matches!(err, ApiError::GraphQl(ref m) if m == "invalid credentials"));
    }

    #[test]
    fn test_decode_missing_field() {
        let body = r#"{"data":{"signup":null}}"#;
        let err = GraphQlClient::decode_session(body, SIGNUP_FIELD).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));

        let err = GraphQlClient::decode_session(r#"{"data":null}"#, SIGNUP_FIELD).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_decode_rejects_partial_session() {
        let body = concat!(
            r#"{"data":{"signup":{"userId":"2","token":"","#,
            r#""tokenExpiration":"2099-01-01","username":"bob"}}}"#
        );
        let err = GraphQlClient::decode_session(body, SIGNUP_FIELD).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_decode_malformed_body() {
        let err = GraphQlClient::decode_session("<html>", LOGIN_FIELD).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_first_error() {
        assert_eq!(
            GraphQlClient::first_error(r#"{"errors":[{"message":"Username taken"}]}"#),
            Some("Username taken".to_string())
        );
        assert_eq!(GraphQlClient::first_error("Bad Request"), None);
    }

    // ========================================================================
    // Response handling
    // ========================================================================

    #[test]
    fn test_rate_limit_backs_off_exponentially() {
        let delays: Vec<Duration> = (0..MAX_RATE_LIMIT_RETRIES)
            .map(|retries| {
                let status = StatusCode::TOO_MANY_REQUESTS;
                match GraphQlClient::next_action(status, "", LOGIN_FIELD, retries) {
                    ResponseAction::Retry(delay) => delay,
                    ResponseAction::Finish(result) => panic!("expected retry, got {:?}", result),
                }
            })
            .collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
            ]
        );
    }

    #[test]
    fn test_rate_limit_gives_up_after_max_retries() {
        let action = GraphQlClient::next_action(
            StatusCode::TOO_MANY_REQUESTS,
            "",
            LOGIN_FIELD,
            MAX_RATE_LIMIT_RETRIES,
        );
        assert!(matches!(finished(action), Err(ApiError::RateLimited)));
    }

    #[test]
    fn test_error_status_prefers_graphql_message() {
        let body = r#"{"errors":[{"message":"Username taken"}]}"#;
        let action = GraphQlClient::next_action(StatusCode::BAD_REQUEST, body, SIGNUP_FIELD, 0);
        assert!(matches!(finished(action), Err(ApiError::GraphQl(ref m)) if m == "Username taken"));
    }

    #[test]
    fn test_error_status_without_graphql_body() {
        let action =
            GraphQlClient::next_action(StatusCode::INTERNAL_SERVER_ERROR, "boom", LOGIN_FIELD, 0);
        assert!(matches!(finished(action), Err(ApiError::ServerError(ref b)) if b == "boom"));

        let action = GraphQlClient::next_action(StatusCode::UNAUTHORIZED, "", LOGIN_FIELD, 1);
        assert!(matches!(finished(action), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_success_status_decodes_session() {
        let action = GraphQlClient::next_action(StatusCode::OK, LOGIN_BODY, LOGIN_FIELD, 2);
        let session = finished(action).expect("session");
        assert_eq!(session.username(), "alice");

        // A 200 can still carry GraphQL errors
        let body = r#"{"data":null,"errors":[{"message":"invalid credentials"}]}"#;
        let action = GraphQlClient::next_action(StatusCode::OK, body, LOGIN_FIELD, 0);
        assert!(matches!(finished(action), Err(ApiError::GraphQl(_))));
    }

    #[test]
    fn test_with_token_keeps_endpoint() {
        let client = GraphQlClient::new("http://localhost:4000/graphql").unwrap();
        let authed = client.with_token("t1");
        assert_eq!(authed.endpoint(), "http://localhost:4000/graphql");
        assert_eq!(authed.token.as_deref(), Some("t1"));
    }
}
