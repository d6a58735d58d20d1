//! A single user request to generate a record.

use crate::{DomainError, ItemCategory};

/// Immutable input to one pipeline run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    category_hint: Option<ItemCategory>,
    forced_name: Option<String>,
}

impl GenerationRequest {
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyPrompt`] when the prompt is blank.
    pub fn new(prompt: impl Into<String>) -> Result<Self, DomainError> {
        let prompt = prompt.into();
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyPrompt);
        }
        Ok(Self {
            prompt: trimmed.to_string(),
            category_hint: None,
            forced_name: None,
        })
    }

    pub fn with_category_hint(mut self, hint: Option<ItemCategory>) -> Self {
        self.category_hint = hint;
        self
    }

    /// A blank forced name is ignored.
    pub fn with_forced_name(mut self, name: Option<String>) -> Self {
        self.forced_name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn category_hint(&self) -> Option<ItemCategory> {
        self.category_hint
    }

    pub fn forced_name(&self) -> Option<&str> {
        self.forced_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_prompt_rejected() {
        assert_eq!(GenerationRequest::new("   "), Err(DomainError::EmptyPrompt));
        assert_eq!(GenerationRequest::new(""), Err(DomainError::EmptyPrompt));
    }

    #[test]
    fn test_builder_fields() {
        let request = GenerationRequest::new(" a simple iron sword ")
            .unwrap()
            .with_category_hint(Some(ItemCategory::Weapon))
            .with_forced_name(Some("  ".to_string()));
        assert_eq!(request.prompt(), "a simple iron sword");
        assert_eq!(request.category_hint(), Some(ItemCategory::Weapon));
        assert_eq!(request.forced_name(), None);
    }
}
