//! Validated name value objects.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Maximum length accepted for a display name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Name used when nothing usable came back from the backend.
pub const FALLBACK_ITEM_NAME: &str = "Unnamed";

// ============================================================================
// ItemName
// ============================================================================

/// A validated item name (non-empty, <=200 chars, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    /// Create a new validated item name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if:
    /// - The name is empty after trimming
    /// - The name exceeds 200 characters after trimming
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Item name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Item name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Best-effort conversion: blank input becomes [`FALLBACK_ITEM_NAME`] and
    /// overlong input is truncated, so a generated record always has a name.
    pub fn lenient(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Self(FALLBACK_ITEM_NAME.to_string());
        }
        Self(trimmed.chars().take(MAX_NAME_LENGTH).collect::<String>().trim_end().to_string())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ItemName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ItemName> for String {
    fn from(name: ItemName) -> String {
        name.0
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
