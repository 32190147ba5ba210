use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session is missing {0}")]
    MissingField(&'static str),
}

/// An authenticated identity.
///
/// All four fields are always populated: construction and deserialization
/// both reject blank values, so a stored session is either complete or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SessionPayload")]
pub struct Session {
    user_id: String,
    token: String,
    token_expiration: String,
    username: String,
}

/// Wire shape of a session before the completeness check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionPayload {
    user_id: String,
    token: String,
    token_expiration: String,
    username: String,
}

impl TryFrom<SessionPayload> for Session {
    type Error = SessionError;

    fn try_from(p: SessionPayload) -> Result<Self, Self::Error> {
        Session::new(p.user_id, p.token, p.token_expiration, p.username)
    }
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        token: impl Into<String>,
        token_expiration: impl Into<String>,
        username: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let session = Self {
            user_id: user_id.into(),
            token: token.into(),
            token_expiration: token_expiration.into(),
            username: username.into(),
        };

        let fields = [
            ("user id", &session.user_id),
            ("token", &session.token),
            ("token expiration", &session.token_expiration),
            ("username", &session.username),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(SessionError::MissingField(*name));
        }

        Ok(session)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn token_expiration(&self) -> &str {
        &self.token_expiration
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Parse the expiration as RFC 3339, a bare `YYYY-MM-DD` date (midnight
    /// UTC), or epoch milliseconds.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.token_expiration.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
        raw.parse::<i64>()
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// Unparseable expirations never count as expired; the server stays the
    /// authority on token validity.
    pub fn is_expired(&self) -> bool {
        self.expires_at().map(|at| Utc::now() >= at).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Session {
        Session::new("1", "t1", "2099-01-01", "alice").unwrap()
    }

    #[test]
    fn test_new_rejects_blank_fields() {
        assert_eq!(
            Session::new("", "t", "2099-01-01", "a"),
            Err(SessionError::MissingField("user id"))
        );
        assert_eq!(
            Session::new("1", " ", "2099-01-01", "a"),
            Err(SessionError::MissingField("token"))
        );
        assert_eq!(
            Session::new("1", "t", "", "a"),
            Err(SessionError::MissingField("token expiration"))
        );
        assert_eq!(
            Session::new("1", "t", "2099-01-01", ""),
            Err(SessionError::MissingField("username"))
        );
    }

    #[test]
    fn test_deserialize_camel_case_payload() {
        let json =
            r#"{"userId":"1","token":"t1","tokenExpiration":"2099-01-01","username":"alice"}"#;
        let session: Session = serde_json::from_str(json).expect("valid payload");
        assert_eq!(session, alice());
    }

    #[test]
    fn test_deserialize_rejects_partial_payload() {
        let missing = r#"{"userId":"1","token":"t1","username":"alice"}"#;
        assert!(serde_json::from_str::<Session>(missing).is_err());

        let blank =
            r#"{"userId":"1","token":"","tokenExpiration":"2099-01-01","username":"alice"}"#;
        assert!(serde_json::from_str::<Session>(blank).is_err());
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let json = serde_json::to_value(alice()).unwrap();
        assert_eq!(json["userId"], "1");
        assert_eq!(json["tokenExpiration"], "2099-01-01");
    }

    #[test]
    fn test_expires_at_formats() {
        let date = alice();
        assert_eq!(
            date.expires_at().map(|d| d.to_rfc3339()),
            Some("2099-01-01T00:00:00+00:00".to_string())
        );

        let rfc = Session::new("1", "t", "2030-06-01T12:30:00Z", "a").unwrap();
        assert_eq!(rfc.expires_at().map(|d| d.timestamp()), Some(1_906_547_400));

        let millis = Session::new("1", "t", "1000", "a").unwrap();
        assert_eq!(millis.expires_at().map(|d| d.timestamp_millis()), Some(1000));

        let junk = Session::new("1", "t", "soon", "a").unwrap();
        assert_eq!(junk.expires_at(), None);
    }

    #[test]
    fn test_is_expired() {
        assert!(!alice().is_expired());
        assert!(Session::new("1", "t", "2000-01-01", "a").unwrap().is_expired());
        assert!(!Session::new("1", "t", "whenever", "a").unwrap().is_expired());
    }
}
