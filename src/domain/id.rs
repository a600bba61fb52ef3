//! Domain ID Types with NewType Pattern
//!
//! Type-safe wrappers for domain identifiers to prevent ID mixing errors at
//! compile time. Each ID type implements Display, FromStr, Debug, Serialize,
//! and Deserialize.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Macro to generate NewType ID wrappers with all required traits
macro_rules! domain_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Create an ID from an existing string (for database retrieval)
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Create an ID from a string slice without UUID validation
            pub fn from_str_unchecked(s: &str) -> Self {
                Self(s.to_string())
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert to inner string value
            pub fn into_string(self) -> String {
                self.0
            }

            /// Parse and validate a UUID string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Uuid::parse_str(s)?;
                Ok(Self(s.to_string()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

domain_id! {
    /// Identifier for a user account
    UserId
}

domain_id! {
    /// Identifier for a role reference row
    RoleId
}

domain_id! {
    /// Identifier for a password reset token record
    ResetTokenId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_valid_uuids() {
        let id = UserId::new();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(UserId::parse("not-a-uuid").is_err());
        assert!("also not".parse::<RoleId>().is_err());
    }

    #[test]
    fn round_trip_through_string() {
        let id = ResetTokenId::new();
        let s: String = id.clone().into();
        assert_eq!(ResetTokenId::from_string(s), id);
    }

    #[test]
    fn serde_is_transparent() {
        let id = UserId::from_str_unchecked("4f8e8e2e-0000-0000-0000-000000000001");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"4f8e8e2e-0000-0000-0000-000000000001\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
