//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod asset_store;
pub mod clock;
pub mod config;
pub mod document_store;
pub mod image_client;
pub mod llm_client;
pub mod ports;
pub mod resilient_llm;
