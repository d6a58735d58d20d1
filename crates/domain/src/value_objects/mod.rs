//! Value objects - Immutable objects defined by their attributes

mod category;
mod dice;
mod effect;
mod names;

pub use category::{ConsumableType, EquipmentType, ItemCategory, WeaponType};
pub use dice::{signed_bonus, DiceFormula, DiceParseError};
pub use effect::{Ability, EffectDescriptor, EffectTarget};
pub use names::{ItemName, FALLBACK_ITEM_NAME, MAX_NAME_LENGTH};
