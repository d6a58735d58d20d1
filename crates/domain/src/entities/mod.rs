//! Domain entities - Core business objects

mod generation_request;
mod item;
mod parsed_record;
mod roll_table;

pub use generation_request::GenerationRequest;
pub use item::{
    ArmorDescriptor, CategoryDetails, ConsumableDetails, DamageDescriptor, DamagePart,
    EquipmentDetails, ItemRecord, Price, StoredItem, WeaponDetails, DEFAULT_DESCRIPTION,
    PLACEHOLDER_IMAGE,
};
pub use parsed_record::ParsedRecord;
pub use roll_table::{
    RollTable, StoredTable, TableMode, TableResult, TableResultKind, DEFAULT_TABLE_FORMULA,
    DEFAULT_TABLE_NAME,
};
