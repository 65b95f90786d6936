//! Session layer: turns the `auth` cookie into an [`Identity`].
//!
//! The cookie value is base64-encoded JSON:
//!
//! ```json
//! { "name": "Alice", "avatar_url": "https://…", "email": "alice@example.com" }
//! ```
//!
//! Decoding and validation happen here, once, before a connection is
//! upgraded. A rejected session never reaches the hub.

use axum_extra::extract::CookieJar;
use data_encoding::{BASE64, BASE64_NOPAD, BASE64URL, BASE64URL_NOPAD};

use crate::domain::Identity;

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "auth";

/// Reasons a session cookie is rejected.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No `auth` cookie was sent and authentication is required.
    #[error("missing auth cookie")]
    Missing,

    /// The cookie value was not base64.
    #[error("session cookie is not base64: {0}")]
    Encoding(#[from] data_encoding::DecodeError),

    /// The decoded cookie was not a JSON object holding a valid identity.
    #[error("session payload is invalid: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Whether connections must present a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Reject connections without an `auth` cookie. When `false`, such
    /// connections get [`Identity::anonymous`]. A cookie that is present
    /// but invalid is always rejected.
    pub require_auth: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self { require_auth: true }
    }
}

impl SessionPolicy {
    /// Resolves the identity for a request.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Missing`] when the cookie is absent and
    /// required, or the decoding error for a malformed cookie.
    pub fn resolve(&self, jar: &CookieJar) -> Result<Identity, SessionError> {
        match jar.get(AUTH_COOKIE) {
            Some(cookie) => decode_session(cookie.value()),
            None if self.require_auth => Err(SessionError::Missing),
            None => Ok(Identity::anonymous()),
        }
    }
}

/// Decodes a cookie value into a validated [`Identity`].
///
/// # Errors
///
/// See [`SessionError`].
pub fn decode_session(value: &str) -> Result<Identity, SessionError> {
    let raw = decode_base64(value.trim())?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Encodes an identity as a cookie value (URL-safe base64, no padding).
///
/// # Errors
///
/// Returns [`SessionError::Payload`] if serialization fails.
pub fn encode_session(identity: &Identity) -> Result<String, SessionError> {
    let json = serde_json::to_vec(identity)?;
    Ok(BASE64URL_NOPAD.encode(&json))
}

/// URL-safe first, then standard alphabet; padded or not.
fn decode_base64(value: &str) -> Result<Vec<u8>, data_encoding::DecodeError> {
    let bytes = value.as_bytes();
    BASE64URL_NOPAD
        .decode(bytes)
        .or_else(|_| BASE64URL.decode(bytes))
        .or_else(|_| BASE64.decode(bytes))
        .or_else(|_| BASE64_NOPAD.decode(bytes))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum_extra::extract::cookie::Cookie;

    use super::*;

    fn jar_with(value: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(AUTH_COOKIE, value.to_string()))
    }

    #[test]
    fn round_trips_through_cookie_value() {
        let Ok(identity) = Identity::named("Alice") else {
            panic!("valid identity");
        };
        let identity = identity.with_email(Some("alice@example.com".to_string()));
        let Ok(value) = encode_session(&identity) else {
            panic!("encode failed");
        };
        let Ok(decoded) = decode_session(&value) else {
            panic!("decode failed");
        };
        assert_eq!(decoded, identity);
    }

    #[test]
    fn accepts_padded_standard_base64() {
        let value = BASE64.encode(br#"{"name":"Bob","avatar_url":"https://example.com/b.png"}"#);
        let Ok(identity) = decode_session(&value) else {
            panic!("standard base64 should decode");
        };
        assert_eq!(identity.name(), "Bob");
        assert_eq!(identity.avatar_url(), Some("https://example.com/b.png"));
    }

    #[test]
    fn rejects_non_base64() {
        assert!(matches!(
            decode_session("%%%"),
            Err(SessionError::Encoding(_))
        ));
    }

    #[test]
    fn rejects_non_json_payload() {
        let value = BASE64URL_NOPAD.encode(b"not json");
        assert!(matches!(
            decode_session(&value),
            Err(SessionError::Payload(_))
        ));
    }

    #[test]
    fn rejects_blank_name() {
        let value = BASE64URL_NOPAD.encode(br#"{"name":"  "}"#);
        assert!(matches!(
            decode_session(&value),
            Err(SessionError::Payload(_))
        ));
    }

    #[test]
    fn rejects_over_long_name() {
        let json = format!(r#"{{"name":"{}"}}"#, "n".repeat(65));
        let value = BASE64URL_NOPAD.encode(json.as_bytes());
        assert!(decode_session(&value).is_err());
    }

    #[test]
    fn missing_cookie_rejected_when_required() {
        let policy = SessionPolicy { require_auth: true };
        assert!(matches!(
            policy.resolve(&CookieJar::new()),
            Err(SessionError::Missing)
        ));
    }

    #[test]
    fn missing_cookie_is_anonymous_when_optional() {
        let policy = SessionPolicy {
            require_auth: false,
        };
        let Ok(identity) = policy.resolve(&CookieJar::new()) else {
            panic!("anonymous identity expected");
        };
        assert!(identity.is_anonymous());
    }

    #[test]
    fn invalid_cookie_rejected_even_when_optional() {
        let policy = SessionPolicy {
            require_auth: false,
        };
        assert!(policy.resolve(&jar_with("%%%")).is_err());
    }

    #[test]
    fn resolves_cookie_from_jar() {
        let value = BASE64URL_NOPAD.encode(br#"{"name":"Carol"}"#);
        let policy = SessionPolicy::default();
        let Ok(identity) = policy.resolve(&jar_with(&value)) else {
            panic!("cookie should resolve");
        };
        assert_eq!(identity.name(), "Carol");
    }
}
