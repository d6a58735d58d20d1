//! Lootforge Domain - records, categories, effects and tables produced by the
//! structured-generation pipeline.
//!
//! Pure types only: no I/O and no randomness. The engine injects random draws.

extern crate self as lootforge_domain;

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{
    ArmorDescriptor, CategoryDetails, ConsumableDetails, DamageDescriptor, DamagePart,
    EquipmentDetails, GenerationRequest, ItemRecord, ParsedRecord, Price, RollTable, StoredItem,
    StoredTable, TableMode, TableResult, TableResultKind, WeaponDetails, DEFAULT_DESCRIPTION,
    DEFAULT_TABLE_FORMULA, DEFAULT_TABLE_NAME, PLACEHOLDER_IMAGE,
};

pub use error::DomainError;

pub use ids::{RecordId, TableId};

pub use value_objects::{
    signed_bonus, Ability, ConsumableType, DiceFormula, DiceParseError, EffectDescriptor,
    EffectTarget, EquipmentType, ItemCategory, ItemName, WeaponType, FALLBACK_ITEM_NAME,
    MAX_NAME_LENGTH,
};
