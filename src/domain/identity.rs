//! Identity attached to a connection by the session layer.
//!
//! An [`Identity`] is validated exactly once, when the session layer builds
//! it, and is then handed to the connection pump as an immutable record.
//! Neither the pump nor the hub re-validates it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of characters in a display name.
pub const MAX_NAME_LEN: usize = 64;

/// Validation failures for [`Identity`] fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Display name was empty after trimming.
    #[error("display name cannot be empty")]
    EmptyName,

    /// Display name exceeded [`MAX_NAME_LEN`].
    #[error("display name cannot exceed {max} characters (got {actual})")]
    NameTooLong {
        /// Allowed maximum.
        max: usize,
        /// Length that was supplied.
        actual: usize,
    },
}

/// Display name plus optional profile metadata for one connection.
///
/// Deserializing goes through [`Identity::named`], so a decoded identity is
/// always valid:
///
/// ```json
/// { "name": "Alice", "avatar_url": "https://…", "email": "alice@example.com" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IdentityRecord", into = "IdentityRecord")]
pub struct Identity {
    name: String,
    avatar_url: Option<String>,
    email: Option<String>,
}

/// Wire shape of an [`Identity`] before validation.
#[derive(Debug, Serialize, Deserialize)]
struct IdentityRecord {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl TryFrom<IdentityRecord> for Identity {
    type Error = IdentityError;

    fn try_from(record: IdentityRecord) -> Result<Self, Self::Error> {
        Ok(Self::named(&record.name)?
            .with_avatar_url(record.avatar_url)
            .with_email(record.email))
    }
}

impl From<Identity> for IdentityRecord {
    fn from(identity: Identity) -> Self {
        Self {
            name: identity.name,
            avatar_url: identity.avatar_url,
            email: identity.email,
        }
    }
}

impl Identity {
    /// Builds a named identity, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmptyName`] for blank names and
    /// [`IdentityError::NameTooLong`] when the trimmed name exceeds
    /// [`MAX_NAME_LEN`] characters.
    pub fn named(name: &str) -> Result<Self, IdentityError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IdentityError::EmptyName);
        }
        let actual = name.chars().count();
        if actual > MAX_NAME_LEN {
            return Err(IdentityError::NameTooLong {
                max: MAX_NAME_LEN,
                actual,
            });
        }
        Ok(Self {
            name: name.to_string(),
            avatar_url: None,
            email: None,
        })
    }

    /// Identity used when sessions are not required. Its name is empty.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            name: String::new(),
            avatar_url: None,
            email: None,
        }
    }

    /// Attaches an avatar URL.
    #[must_use]
    pub fn with_avatar_url(mut self, url: Option<String>) -> Self {
        self.avatar_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    /// Attaches an email address.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.trim().is_empty());
        self
    }

    /// Display name stamped on every message from this connection.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional avatar URL.
    #[must_use]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    /// Optional email address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns `true` for the anonymous identity.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn named_trims_whitespace() {
        let id = Identity::named("  alice ");
        assert_eq!(id.map(|i| i.name().to_string()), Ok("alice".to_string()));
    }

    #[test]
    fn blank_name_rejected() {
        assert_eq!(Identity::named("   "), Err(IdentityError::EmptyName));
    }

    #[test]
    fn long_name_rejected() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            Identity::named(&name),
            Err(IdentityError::NameTooLong {
                max: MAX_NAME_LEN,
                actual: MAX_NAME_LEN + 1,
            })
        );
    }

    #[test]
    fn name_at_limit_accepted() {
        let name = "y".repeat(MAX_NAME_LEN);
        assert!(Identity::named(&name).is_ok());
    }

    #[test]
    fn blank_metadata_is_dropped() {
        let Ok(id) = Identity::named("bob") else {
            panic!("valid identity");
        };
        let id = id
            .with_avatar_url(Some(" ".to_string()))
            .with_email(Some("bob@example.com".to_string()));
        assert_eq!(id.avatar_url(), None);
        assert_eq!(id.email(), Some("bob@example.com"));
    }

    #[test]
    fn anonymous_has_empty_name() {
        let id = Identity::anonymous();
        assert!(id.is_anonymous());
        assert_eq!(id.name(), "");
    }

    #[test]
    fn deserializing_validates_the_name() {
        assert!(serde_json::from_str::<Identity>(r#"{"name":"   "}"#).is_err());

        let long = format!(r#"{{"name":"{}"}}"#, "z".repeat(MAX_NAME_LEN + 1));
        assert!(serde_json::from_str::<Identity>(&long).is_err());
    }

    #[test]
    fn deserializing_trims_and_keeps_metadata() {
        let json = r#"{"name":" carol ","avatar_url":"https://example.com/c.png","email":" "}"#;
        let Ok(id) = serde_json::from_str::<Identity>(json) else {
            panic!("valid identity JSON");
        };
        assert_eq!(id.name(), "carol");
        assert_eq!(id.avatar_url(), Some("https://example.com/c.png"));
        assert_eq!(id.email(), None);
    }
}
