//! Principal module - authenticated user identities

use std::fmt;

/// Stable identifier of a user (the login name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(String);

impl UserId {
    /// Create a user id, rejecting blank names
    ///
    /// # Examples
    ///
    /// ```
    /// use quill_domain::UserId;
    ///
    /// assert!(UserId::new("alice").is_some());
    /// assert!(UserId::new("   ").is_none());
    /// ```
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Borrow the raw name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authenticated user identity, as resolved by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Identity used for ownership checks
    pub id: UserId,

    /// Human readable name shown on pages
    pub display_name: String,
}

impl Principal {
    /// Create a principal whose display name is its id
    pub fn new(id: UserId) -> Self {
        let display_name = id.as_str().to_string();
        Self { id, display_name }
    }

    /// Create a principal with an explicit display name
    pub fn with_display_name(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_is_trimmed() {
        let id = UserId::new("  bob ").unwrap();
        assert_eq!(id.as_str(), "bob");
        assert_eq!(id.to_string(), "bob");
    }

    #[test]
    fn test_principal_defaults_display_name() {
        let principal = Principal::new(UserId::new("carol").unwrap());
        assert_eq!(principal.display_name, "carol");
    }
}
