//! Request bodies accepted by the engine.

use serde::{Deserialize, Serialize};

/// `POST /api/items`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateItemRequest {
    /// Free-text description of the item to generate
    pub prompt: String,
    /// Optional explicit category ("weapon", "armor", "potion", ...)
    #[serde(default)]
    pub category: Option<String>,
    /// Optional name that overrides the generated one
    #[serde(default)]
    pub name: Option<String>,
}

/// `POST /api/tables`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateTableRequest {
    /// Theme of the table (biome, city, loot hoard, ...)
    pub prompt: String,
    /// "items" or "generic"; may also be given inline as `-- tableType=items`
    #[serde(default)]
    pub mode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_default() {
        let req: GenerateItemRequest =
            serde_json::from_str(r#"{"prompt":"a simple iron sword"}"#).unwrap();
        assert_eq!(req.prompt, "a simple iron sword");
        assert!(req.category.is_none());
        assert!(req.name.is_none());

        let req: GenerateTableRequest =
            serde_json::from_str(r#"{"prompt":"forest encounters","mode":"generic"}"#).unwrap();
        assert_eq!(req.mode.as_deref(), Some("generic"));
    }
}
