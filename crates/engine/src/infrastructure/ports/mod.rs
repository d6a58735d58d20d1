//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - LLM calls (OpenAI, Ollama, anything chat-shaped)
//! - Image generation (OpenAI images, Automatic1111)
//! - Document and asset stores (host application collaborators)
//! - Clock/Random (for testing)

mod error;
mod external;
mod testing;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    AssetStorePort, ChatMessage, DocumentStorePort, ImageGenPort, ImageRequest, ImageResult,
    LlmPort, LlmRequest, LlmResponse, MessageRole, TokenUsage,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockAssetStorePort, MockDocumentStorePort};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{AssetError, ImageGenError, LlmError, StoreError};
