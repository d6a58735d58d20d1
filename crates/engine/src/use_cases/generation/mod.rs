//! Structured generation of items and roll tables.
//!
//! Each stage absorbs its own failures and hands the next stage a usable
//! value. Only an empty prompt (before anything runs) and a document store
//! failure (after everything ran) reach the caller.

pub mod augment;
pub mod consistency;
pub mod item;
pub mod naming;
pub mod prompts;
pub mod recovery;
pub mod schema;
pub mod table;

use std::sync::Arc;

use crate::infrastructure::ports::StoreError;

pub use augment::{Augmentation, MagicAugmenter};
pub use consistency::{ConsistencyResolver, CorrectionRule, Reconciled};
pub use item::GenerateItem;
pub use naming::{enforce_naming_policy, NamingEngine};
pub use recovery::{run_cascade, RecoveryEngine, RepairStage, RepairStrategy};
pub use table::{GenerateRollTable, GeneratedTable};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("A prompt is required to generate anything")]
    EmptyPrompt,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Container for generation use cases.
pub struct GenerationUseCases {
    pub item: Arc<GenerateItem>,
    pub table: Arc<GenerateRollTable>,
}

impl GenerationUseCases {
    pub fn new(item: Arc<GenerateItem>, table: Arc<GenerateRollTable>) -> Self {
        Self { item, table }
    }
}
