//! Roll tables and their results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{RecordId, TableId, PLACEHOLDER_IMAGE};

/// Dice formula used when the model supplies none.
pub const DEFAULT_TABLE_FORMULA: &str = "1d20";

/// Name used when neither the model nor the prompt supplies one.
pub const DEFAULT_TABLE_NAME: &str = "Generated Roll Table";

/// How table entries are turned into results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableMode {
    /// Every entry becomes a generated item linked from the result
    Items,
    /// Entries are plain text
    #[default]
    Generic,
}

impl TableMode {
    /// Lenient parse: anything other than "items" is generic.
    pub fn from_loose(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("items") {
            Self::Items
        } else {
            Self::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for TableMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table header as created in the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollTable {
    pub name: String,
    pub formula: String,
    pub description: String,
    /// Results may be drawn more than once
    pub replacement: bool,
}

/// Whether a result is plain text or links a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableResultKind {
    Text,
    Document,
}

/// One embedded result row of a roll table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResult {
    pub kind: TableResultKind,
    pub text: String,
    /// Inclusive die range
    pub range: [u32; 2],
    pub weight: u32,
    pub image: String,
    pub document_collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<RecordId>,
    pub drawn: bool,
}

impl TableResult {
    pub fn text(text: impl Into<String>, range: [u32; 2], weight: u32) -> Self {
        Self {
            kind: TableResultKind::Text,
            text: text.into(),
            range,
            weight,
            image: PLACEHOLDER_IMAGE.to_string(),
            document_collection: "Item".to_string(),
            document_id: None,
            drawn: false,
        }
    }

    pub fn document(
        text: impl Into<String>,
        range: [u32; 2],
        weight: u32,
        document_id: RecordId,
    ) -> Self {
        Self {
            kind: TableResultKind::Document,
            document_id: Some(document_id),
            ..Self::text(text, range, weight)
        }
    }
}

/// A roll table after the document store assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTable {
    pub id: TableId,
    pub table: RollTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_mode_is_lenient() {
        assert_eq!(TableMode::from_loose("Items"), TableMode::Items);
        assert_eq!(TableMode::from_loose("encounters"), TableMode::Generic);
        assert_eq!(TableMode::default(), TableMode::Generic);
    }

    #[test]
    fn test_document_result_links_record() {
        let id = RecordId::new();
        let result = TableResult::document("Frostbrand", [1, 2], 1, id);
        assert_eq!(result.kind, TableResultKind::Document);
        assert_eq!(result.document_id, Some(id));
        assert_eq!(result.image, PLACEHOLDER_IMAGE);
        assert!(!result.drawn);
    }
}
