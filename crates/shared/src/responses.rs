//! Response bodies returned by the engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lootforge_domain::{ItemRecord, TableMode, TableResult};

/// A created item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub record: ItemRecord,
}

/// A created roll table with its results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableResponse {
    pub id: Uuid,
    pub name: String,
    pub formula: String,
    pub description: String,
    /// Whether results link generated items or are plain text
    pub mode: TableMode,
    pub results: Vec<TableResult>,
}

/// Error classification code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request data failed validation
    ValidationError,
    /// Internal server error
    InternalError,

    /// Unknown variant for forward compatibility
    #[serde(other)]
    Unknown,
}

/// Error body for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
