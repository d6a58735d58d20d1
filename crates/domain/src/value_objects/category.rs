//! Closed classifications for generated records and their sub-types.
//!
//! The string forms follow the D&D 5e system vocabulary used by the host
//! document store (`simpleM`, `martialR`, `heavy`, `trinket`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Output category of a generated record.
///
/// `Equipment` covers both armor-like gear and the generic default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Weapon,
    Equipment,
    Consumable,
    Tool,
    Loot,
    Spell,
}

impl ItemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Equipment => "equipment",
            Self::Consumable => "consumable",
            Self::Tool => "tool",
            Self::Loot => "loot",
            Self::Spell => "spell",
        }
    }
}

impl Default for ItemCategory {
    fn default() -> Self {
        Self::Equipment
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemCategory {
    type Err = DomainError;

    /// Accepts the canonical names plus the common synonyms a user types into
    /// a category hint ("armor", "potion", "gear", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weapon" => Ok(Self::Weapon),
            "equipment" | "armor" | "armour" | "shield" | "gear" | "trinket" => {
                Ok(Self::Equipment)
            }
            "consumable" | "potion" | "scroll" | "ammunition" => Ok(Self::Consumable),
            "tool" => Ok(Self::Tool),
            "loot" | "treasure" => Ok(Self::Loot),
            "spell" => Ok(Self::Spell),
            other => Err(DomainError::parse(format!("Unknown item category: {}", other))),
        }
    }
}

/// Weapon classification tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponType {
    #[serde(rename = "simpleM")]
    SimpleMelee,
    #[serde(rename = "martialM")]
    MartialMelee,
    #[serde(rename = "simpleR")]
    SimpleRanged,
    #[serde(rename = "martialR")]
    MartialRanged,
}

impl WeaponType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SimpleMelee => "simpleM",
            Self::MartialMelee => "martialM",
            Self::SimpleRanged => "simpleR",
            Self::MartialRanged => "martialR",
        }
    }

    pub fn is_ranged(&self) -> bool {
        matches!(self, Self::SimpleRanged | Self::MartialRanged)
    }
}

impl fmt::Display for WeaponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equipment subtype for armor-like records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentType {
    Light,
    Medium,
    Heavy,
    Shield,
    Clothing,
    Trinket,
}

impl EquipmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Heavy => "heavy",
            Self::Shield => "shield",
            Self::Clothing => "clothing",
            Self::Trinket => "trinket",
        }
    }

    /// Body armor, as opposed to shields, clothing and trinkets.
    pub fn is_body_armor(&self) -> bool {
        matches!(self, Self::Light | Self::Medium | Self::Heavy)
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumable subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumableType {
    #[default]
    Potion,
    Scroll,
    Wand,
    Rod,
    Food,
    Ammo,
}

impl ConsumableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Potion => "potion",
            Self::Scroll => "scroll",
            Self::Wand => "wand",
            Self::Rod => "rod",
            Self::Food => "food",
            Self::Ammo => "ammo",
        }
    }
}

impl fmt::Display for ConsumableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
