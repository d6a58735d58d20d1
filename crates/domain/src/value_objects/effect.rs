//! Mechanical effects derived from magical-property sentences.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Dexterity => "dexterity",
            Self::Constitution => "constitution",
            Self::Intelligence => "intelligence",
            Self::Wisdom => "wisdom",
            Self::Charisma => "charisma",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Strength => "str",
            Self::Dexterity => "dex",
            Self::Constitution => "con",
            Self::Intelligence => "int",
            Self::Wisdom => "wis",
            Self::Charisma => "cha",
        }
    }
}

/// The record field a mechanical modifier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stat", content = "ability", rename_all = "camelCase")]
pub enum EffectTarget {
    Ability(Ability),
    ArmorClass,
    Attack,
    Damage,
    SavingThrows,
}

impl EffectTarget {
    /// Attribute path in the host document schema.
    pub fn key(&self) -> String {
        match self {
            Self::Ability(ability) => format!("system.abilities.{}.value", ability.abbreviation()),
            Self::ArmorClass => "system.attributes.ac.bonus".to_string(),
            Self::Attack => "system.bonuses.mwak.attack".to_string(),
            Self::Damage => "system.bonuses.mwak.damage".to_string(),
            Self::SavingThrows => "system.bonuses.abilities.save".to_string(),
        }
    }
}

impl fmt::Display for EffectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ability(ability) => f.write_str(ability.name()),
            Self::ArmorClass => f.write_str("AC"),
            Self::Attack => f.write_str("attack"),
            Self::Damage => f.write_str("damage"),
            Self::SavingThrows => f.write_str("saving throws"),
        }
    }
}

/// A derived effect: either a numeric bonus or a purely descriptive property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EffectDescriptor {
    Modifier {
        label: String,
        target: EffectTarget,
        magnitude: i32,
    },
    Flavor {
        label: String,
    },
}

impl EffectDescriptor {
    pub fn modifier(label: impl Into<String>, target: EffectTarget, magnitude: i32) -> Self {
        Self::Modifier {
            label: label.into(),
            target,
            magnitude,
        }
    }

    pub fn flavor(label: impl Into<String>) -> Self {
        Self::Flavor {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Modifier { label, .. } | Self::Flavor { label } => label,
        }
    }

    pub fn is_mechanical(&self) -> bool {
        matches!(self, Self::Modifier { .. })
    }
}
