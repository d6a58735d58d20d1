//! Lootforge Protocol - Shared types for the generation HTTP API
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, uuid and the domain crate
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - use raw `uuid::Uuid` in DTOs

pub mod requests;
pub mod responses;

pub use requests::{GenerateItemRequest, GenerateTableRequest};
pub use responses::{ErrorCode, ErrorResponse, ItemResponse, TableResponse};
