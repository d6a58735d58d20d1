//! Item record - the finished, schema-conformant output of a generation run
//!
//! # Lifecycle
//!
//! Assembled once by the engine, then handed by value to the document store.
//! Nothing mutates a record after handoff; the store answers with a
//! [`StoredItem`] that pairs the record with its new id.
//!
//! This is a data-carrying struct: every field combination is valid, so all
//! fields are public.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    ConsumableType, EffectDescriptor, EquipmentType, ItemCategory, ItemName, RecordId, WeaponType,
};

/// Image reference used when no generated image could be stored.
pub const PLACEHOLDER_IMAGE: &str = "icons/svg/d20-highlight.svg";

/// Description used when the model produced none.
pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

/// A generated game item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub name: ItemName,
    pub category: ItemCategory,
    /// Stored asset path or [`PLACEHOLDER_IMAGE`]
    pub image: String,
    /// HTML fragment
    pub description: String,
    pub rarity: String,
    pub weight: f64,
    pub price: Price,
    pub attunement: bool,
    pub properties: BTreeSet<String>,
    pub details: CategoryDetails,
    /// Activation block copied through from the model when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<Value>,
    /// Limited-uses block copied through from the model when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectDescriptor>,
}

impl ItemRecord {
    pub fn is_magical(&self) -> bool {
        self.properties.contains("mgc")
    }
}

/// Price in a coin denomination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub value: f64,
    pub denomination: String,
}

impl Price {
    pub fn gold(value: f64) -> Self {
        Self {
            value,
            denomination: "gp".to_string(),
        }
    }
}

/// Category-specific sub-structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CategoryDetails {
    Weapon(WeaponDetails),
    Equipment(EquipmentDetails),
    Consumable(ConsumableDetails),
    /// Tools, loot and spells carry no extra structure
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponDetails {
    pub weapon_type: WeaponType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<DamageDescriptor>,
}

/// Structured damage: one or more (formula, damage type) parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageDescriptor {
    pub parts: Vec<DamagePart>,
    /// Two-handed formula for versatile weapons
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versatile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamagePart {
    pub formula: String,
    pub damage_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentDetails {
    pub equipment_type: EquipmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<ArmorDescriptor>,
}

/// Armor class block. `dex_cap: None` means no cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmorDescriptor {
    pub value: u32,
    pub dex_cap: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<u32>,
    pub proficient: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumableDetails {
    pub consumable_type: ConsumableType,
}

/// An item record after the document store assigned it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredItem {
    pub id: RecordId,
    pub record: ItemRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ItemRecord {
        ItemRecord {
            name: ItemName::new("Iron Sword").unwrap(),
            category: ItemCategory::Weapon,
            image: PLACEHOLDER_IMAGE.to_string(),
            description: "A plain blade.".to_string(),
            rarity: "common".to_string(),
            weight: 3.0,
            price: Price::gold(15.0),
            attunement: false,
            properties: BTreeSet::from(["ver".to_string()]),
            details: CategoryDetails::Weapon(WeaponDetails {
                weapon_type: WeaponType::MartialMelee,
                base_item: Some("longsword".to_string()),
                damage: Some(DamageDescriptor {
                    parts: vec![DamagePart {
                        formula: "1d8".to_string(),
                        damage_type: "slashing".to_string(),
                    }],
                    versatile: Some("1d10".to_string()),
                }),
            }),
            activation: None,
            uses: None,
            effects: Vec::new(),
        }
    }

    #[test]
    fn test_record_serializes_category_details_tagged() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["category"], "weapon");
        assert_eq!(json["details"]["kind"], "weapon");
        assert_eq!(json["details"]["weaponType"], "martialM");
        assert!(json.get("effects").is_none());
    }

    #[test]
    fn test_magical_follows_property() {
        let mut record = sample();
        assert!(!record.is_magical());
        record.properties.insert("mgc".to_string());
        assert!(record.is_magical());
    }
}
