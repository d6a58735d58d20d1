//! External service port traits (LLM, image generation, document and asset stores).

use async_trait::async_trait;

use lootforge_domain::{ItemRecord, RollTable, StoredItem, StoredTable, TableId, TableResult};

use super::error::{AssetError, ImageGenError, LlmError, StoreError};

// =============================================================================
// LLM Types
// =============================================================================

/// LLM request/response types
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The conversation history
    pub messages: Vec<ChatMessage>,
    /// System prompt / style instructions
    pub system_prompt: Option<String>,
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A message in the conversation
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// Response from the LLM
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text content
    pub content: String,
    /// Token usage, when the backend reports it
    pub usage: Option<TokenUsage>,
}

/// Token usage information
#[derive(Debug, Clone)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait LlmPort: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;
}

// =============================================================================
// Image Generation Types
// =============================================================================

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    /// Exclusions, for backends that take a negative prompt
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct ImageResult {
    pub image_data: Vec<u8>,
    pub format: String,
}

#[async_trait]
pub trait ImageGenPort: Send + Sync {
    async fn generate(&self, request: ImageRequest) -> Result<ImageResult, ImageGenError>;
}

// =============================================================================
// Asset Store
// =============================================================================

/// Binary asset persistence for generated images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStorePort: Send + Sync {
    /// Create the folder if it does not exist yet.
    async fn ensure_folder(&self, folder: &str) -> Result<(), AssetError>;
    async fn folder_exists(&self, folder: &str) -> Result<bool, AssetError>;
    /// Store `bytes` as `folder/filename`, returning the stored path.
    async fn upload(&self, folder: &str, filename: &str, bytes: &[u8])
        -> Result<String, AssetError>;
}

// =============================================================================
// Document Store
// =============================================================================

/// Host document store. Every call is an independent creation; nothing is
/// updated in place.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStorePort: Send + Sync {
    async fn create_item(&self, record: ItemRecord) -> Result<StoredItem, StoreError>;
    async fn create_table(&self, table: RollTable) -> Result<StoredTable, StoreError>;
    /// Embed result rows under an existing table.
    async fn create_table_results(
        &self,
        table_id: TableId,
        results: Vec<TableResult>,
    ) -> Result<(), StoreError>;
}
