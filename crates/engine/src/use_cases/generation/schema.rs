//! Schema mapping: loosely-typed model output into a typed [`ItemRecord`].
//!
//! Every read goes through [`ParsedRecord`] accessors with a documented
//! default, so a record missing any field still maps to something usable.

use std::collections::BTreeSet;

use lootforge_domain::{
    signed_bonus, ArmorDescriptor, CategoryDetails, ConsumableDetails, ConsumableType,
    DamageDescriptor, DamagePart, DiceFormula, EffectDescriptor, EquipmentDetails, EquipmentType,
    ItemCategory, ItemName, ItemRecord, ParsedRecord, Price, WeaponDetails, WeaponType,
    DEFAULT_DESCRIPTION, PLACEHOLDER_IMAGE,
};
use serde_json::Value;

use crate::infrastructure::ports::RandomPort;

/// Nouns that make a self-reported type (or a name) a weapon.
const WEAPON_KEYWORDS: &[&str] = &[
    "sword",
    "dagger",
    "axe",
    "bow",
    "mace",
    "halberd",
    "flail",
    "club",
    "spear",
    "pike",
    "rapier",
    "scimitar",
    "quarterstaff",
];

/// Exact self-reported types with a fixed category.
const TYPE_LOOKUP: &[(&str, ItemCategory)] = &[
    ("armor", ItemCategory::Equipment),
    ("potion", ItemCategory::Consumable),
    ("scroll", ItemCategory::Consumable),
    ("rod", ItemCategory::Equipment),
    ("staff", ItemCategory::Equipment),
    ("wand", ItemCategory::Equipment),
    ("ammunition", ItemCategory::Consumable),
    ("gear", ItemCategory::Equipment),
    ("loot", ItemCategory::Loot),
    ("tool", ItemCategory::Tool),
];

const MARTIAL_MELEE: &[&str] = &[
    "battleaxe",
    "flail",
    "glaive",
    "greataxe",
    "greatsword",
    "halberd",
    "lance",
    "longsword",
    "maul",
    "morningstar",
    "pike",
    "rapier",
    "scimitar",
    "shortsword",
    "trident",
    "war pick",
    "warhammer",
    "whip",
];

const RANGED: &[&str] = &[
    "bow", "longbow", "shortbow", "crossbow", "sling", "dart", "blowgun", "javelin",
];

/// Name fragment to base item. More specific entries come first.
const BASE_ITEMS: &[(&str, &str)] = &[
    ("greatsword", "greatsword"),
    ("longsword", "longsword"),
    ("shortsword", "shortsword"),
    ("scimitar", "scimitar"),
    ("rapier", "rapier"),
    ("greataxe", "greataxe"),
    ("battleaxe", "battleaxe"),
    ("handaxe", "handaxe"),
    ("warhammer", "warhammer"),
    ("light hammer", "lighthammer"),
    ("war pick", "warpick"),
    ("morningstar", "morningstar"),
    ("quarterstaff", "quarterstaff"),
    ("greatclub", "greatclub"),
    ("halberd", "halberd"),
    ("glaive", "glaive"),
    ("maul", "maul"),
    ("flail", "flail"),
    ("mace", "mace"),
    ("club", "club"),
    ("spear", "spear"),
    ("pike", "pike"),
    ("trident", "trident"),
    ("lance", "lance"),
    ("whip", "whip"),
    ("dagger", "dagger"),
    ("sickle", "sickle"),
    ("javelin", "javelin"),
    ("heavy crossbow", "heavycrossbow"),
    ("hand crossbow", "handcrossbow"),
    ("light crossbow", "lightcrossbow"),
    ("crossbow", "lightcrossbow"),
    ("longbow", "longbow"),
    ("shortbow", "shortbow"),
    ("sling", "sling"),
    ("dart", "dart"),
    ("blowgun", "blowgun"),
];

const DAMAGE_TYPES: &[&str] = &[
    "acid",
    "bludgeoning",
    "cold",
    "fire",
    "force",
    "lightning",
    "necrotic",
    "piercing",
    "poison",
    "psychic",
    "radiant",
    "slashing",
    "thunder",
];

/// Free-text weapon property to its short code.
const PROPERTY_ABBREVIATIONS: &[(&str, &str)] = &[
    ("versatile", "ver"),
    ("finesse", "fin"),
    ("heavy", "hvy"),
    ("light", "lgt"),
    ("loading", "lod"),
    ("reach", "rch"),
    ("thrown", "thr"),
    ("two-handed", "two"),
    ("ammunition", "amm"),
    ("special", "spc"),
    ("silvered", "sil"),
    ("adamantine", "ada"),
    ("magical", "mgc"),
    ("melee", "mel"),
    ("ranged", "rng"),
];

pub const MAGIC_PROPERTY: &str = "mgc";

const HIGH_RARITIES: &[&str] = &["rare", "very rare", "legendary", "artifact"];

const DEFAULT_ARMOR_CLASS: u32 = 14;
const DEFAULT_SHIELD_BONUS: u32 = 2;
const DEFAULT_HEAVY_STRENGTH: u32 = 13;
const DEFAULT_PRICE: f64 = 100.0;

// =============================================================================
// Classification
// =============================================================================

/// Pick the output category. An explicit hint wins; then the record's own
/// `itemType`; then the name and description are scanned. Defaults to
/// [`ItemCategory::Equipment`].
pub fn classify(
    record: &ParsedRecord,
    hint: Option<ItemCategory>,
    name: &str,
    description: &str,
) -> ItemCategory {
    if let Some(hint) = hint {
        return hint;
    }

    let reported = record
        .text_lower("itemType")
        .or_else(|| record.text_lower("type"));
    if let Some(category) = reported.as_deref().and_then(category_from_type) {
        return category;
    }

    [name, description]
        .iter()
        .find_map(|text| category_from_text(&text.to_lowercase()))
        .unwrap_or(ItemCategory::Equipment)
}

fn category_from_type(type_str: &str) -> Option<ItemCategory> {
    if type_str.contains("weapon") || WEAPON_KEYWORDS.iter().any(|k| type_str.contains(k)) {
        return Some(ItemCategory::Weapon);
    }
    TYPE_LOOKUP
        .iter()
        .find(|(key, _)| *key == type_str)
        .map(|(_, category)| *category)
        .or_else(|| type_str.parse().ok())
}

fn category_from_text(text: &str) -> Option<ItemCategory> {
    if text.contains("potion") {
        Some(ItemCategory::Consumable)
    } else if WEAPON_KEYWORDS.iter().any(|k| text.contains(k)) {
        Some(ItemCategory::Weapon)
    } else {
        None
    }
}

// =============================================================================
// Category details
// =============================================================================

pub fn synthesize(
    category: ItemCategory,
    record: &ParsedRecord,
    name: &str,
    description: &str,
) -> CategoryDetails {
    let text = format!("{} {}", name, description).to_lowercase();
    match category {
        ItemCategory::Weapon => CategoryDetails::Weapon(weapon_details(record, &text)),
        ItemCategory::Equipment => CategoryDetails::Equipment(equipment_details(record, &text)),
        ItemCategory::Consumable => CategoryDetails::Consumable(ConsumableDetails {
            consumable_type: consumable_type(record, &text),
        }),
        ItemCategory::Tool | ItemCategory::Loot | ItemCategory::Spell => CategoryDetails::None,
    }
}

fn weapon_details(record: &ParsedRecord, text: &str) -> WeaponDetails {
    WeaponDetails {
        weapon_type: weapon_type(record, text),
        base_item: base_item(text),
        damage: damage_descriptor(record, text),
    }
}

fn weapon_type(record: &ParsedRecord, text: &str) -> WeaponType {
    let tagged = record.text("weaponType").and_then(|tag| match tag.as_str() {
        "simpleM" => Some(WeaponType::SimpleMelee),
        "martialM" => Some(WeaponType::MartialMelee),
        "simpleR" => Some(WeaponType::SimpleRanged),
        "martialR" => Some(WeaponType::MartialRanged),
        _ => None,
    });
    if let Some(weapon_type) = tagged {
        return weapon_type;
    }

    if RANGED.iter().any(|term| mentions(text, term)) {
        if text.contains("long") {
            WeaponType::MartialRanged
        } else {
            WeaponType::SimpleRanged
        }
    } else if MARTIAL_MELEE.iter().any(|term| mentions(text, term)) {
        WeaponType::MartialMelee
    } else {
        WeaponType::SimpleMelee
    }
}

fn base_item(text: &str) -> Option<String> {
    BASE_ITEMS
        .iter()
        .find(|(fragment, _)| mentions(text, fragment))
        .map(|(_, base)| base.to_string())
}

/// Build the damage descriptor from `damage` (string, object or list) plus a
/// separate bonus field.
fn damage_descriptor(record: &ParsedRecord, text: &str) -> Option<DamageDescriptor> {
    let bonus = ["damageModifier", "damageBonus", "modifier", "bonus"]
        .iter()
        .find_map(|key| record.text(key))
        .and_then(|raw| signed_bonus(&raw));
    let fallback_type = record
        .text_lower("damageType")
        .or_else(|| find_damage_type(text))
        .unwrap_or_default();

    let sources: Vec<&Value> = match record.get("damage") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(value) => vec![value],
        None => Vec::new(),
    };

    let mut versatile = None;
    let mut parts = Vec::new();
    for (index, source) in sources.into_iter().enumerate() {
        let Some((formula, damage_type)) = damage_part(source) else {
            continue;
        };
        // The separate bonus belongs to the primary part only.
        let formula = if index == 0 {
            with_bonus(formula, bonus.as_deref())
        } else {
            formula.display()
        };
        parts.push(DamagePart {
            formula,
            damage_type: damage_type.unwrap_or_else(|| fallback_type.clone()),
        });
        if versatile.is_none() {
            versatile = source
                .get("versatile")
                .and_then(Value::as_str)
                .and_then(DiceFormula::find_in)
                .map(|f| f.display());
        }
    }

    if versatile.is_none() {
        versatile = versatile_from_properties(record);
    }

    (!parts.is_empty()).then_some(DamageDescriptor { parts, versatile })
}

fn damage_part(source: &Value) -> Option<(DiceFormula, Option<String>)> {
    match source {
        Value::String(s) => Some((DiceFormula::find_in(s)?, find_damage_type(&s.to_lowercase()))),
        Value::Object(map) => {
            let dice = ["dice", "formula", "value", "damage", "roll"]
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_str))
                .find_map(DiceFormula::find_in)?;
            let damage_type = ["type", "damageType"]
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_str))
                .map(|s| s.trim().to_lowercase())
                .find(|s| !s.is_empty());
            Some((dice, damage_type))
        }
        _ => None,
    }
}

fn with_bonus(formula: DiceFormula, bonus: Option<&str>) -> String {
    let Some(bonus) = bonus else {
        return formula.display();
    };
    let summed = bonus
        .trim_start_matches('+')
        .parse::<i32>()
        .ok()
        .and_then(|n| formula.modifier.checked_add(n));
    match summed {
        Some(modifier) => DiceFormula {
            modifier,
            ..formula
        }
        .display(),
        None => format!("{}{}", formula.display(), bonus),
    }
}

fn versatile_from_properties(record: &ParsedRecord) -> Option<String> {
    ["weaponProperties", "properties"]
        .iter()
        .flat_map(|key| record.tokens(key))
        .find_map(|(token, value)| {
            if !token.to_lowercase().starts_with("versatile") {
                return None;
            }
            value
                .as_deref()
                .and_then(DiceFormula::find_in)
                .or_else(|| DiceFormula::find_in(&token))
                .map(|f| f.display())
        })
}

fn find_damage_type(text: &str) -> Option<String> {
    DAMAGE_TYPES
        .iter()
        .find(|t| mentions(text, t))
        .map(|t| t.to_string())
}

fn equipment_details(record: &ParsedRecord, text: &str) -> EquipmentDetails {
    let item_type = record.text_lower("itemType").unwrap_or_default();
    let signals_shield = item_type.contains("shield");
    let signals_armor = signals_shield || item_type.contains("armor") || item_type.contains("armour");

    let equipment_type = record
        .text_lower("armorType")
        .and_then(|t| armor_weight(&t).or_else(|| armor_subtype(&t)))
        .or_else(|| armor_subtype(&format!("{} {}", item_type, text)))
        .or_else(|| signals_armor.then_some(EquipmentType::Medium))
        .unwrap_or_else(|| trinket_or_clothing(text));

    let armor = signals_armor.then(|| armor_descriptor(record, equipment_type));
    EquipmentDetails {
        equipment_type,
        armor,
    }
}

/// Bare weight qualifiers, only trusted in the `armorType` field.
fn armor_weight(field: &str) -> Option<EquipmentType> {
    [
        ("light", EquipmentType::Light),
        ("medium", EquipmentType::Medium),
        ("heavy", EquipmentType::Heavy),
        ("shield", EquipmentType::Shield),
    ]
    .into_iter()
    .find(|(word, _)| mentions(field, word))
    .map(|(_, kind)| kind)
}

fn armor_subtype(text: &str) -> Option<EquipmentType> {
    const MEDIUM: &[&str] = &[
        "medium armor",
        "half plate",
        "breastplate",
        "chain shirt",
        "scale mail",
        "hide armor",
    ];
    const HEAVY: &[&str] = &["heavy armor", "plate", "splint", "chain mail", "ring mail"];
    const LIGHT: &[&str] = &["light armor", "leather", "padded", "studded"];

    if mentions(text, "shield") {
        Some(EquipmentType::Shield)
    } else if MEDIUM.iter().any(|t| mentions(text, t)) {
        Some(EquipmentType::Medium)
    } else if HEAVY.iter().any(|t| mentions(text, t)) {
        Some(EquipmentType::Heavy)
    } else if LIGHT.iter().any(|t| mentions(text, t)) {
        Some(EquipmentType::Light)
    } else if mentions(text, "armor") || mentions(text, "armour") {
        Some(EquipmentType::Medium)
    } else {
        None
    }
}

fn trinket_or_clothing(text: &str) -> EquipmentType {
    const CLOTHING: &[&str] = &[
        "clothing", "clothes", "robe", "cloak", "boots", "gloves", "tunic", "mantle",
    ];
    if CLOTHING.iter().any(|t| mentions(text, t)) {
        EquipmentType::Clothing
    } else {
        EquipmentType::Trinket
    }
}

fn armor_descriptor(record: &ParsedRecord, equipment_type: EquipmentType) -> ArmorDescriptor {
    let default_value = match equipment_type {
        EquipmentType::Shield => DEFAULT_SHIELD_BONUS,
        _ => DEFAULT_ARMOR_CLASS,
    };
    let value = ["ac", "armorClass", "armor"]
        .iter()
        .find_map(|key| record.number(key))
        .filter(|ac| *ac > 0.0)
        .map_or(default_value, |ac| ac.round() as u32);

    let dex_cap = match equipment_type {
        EquipmentType::Medium => Some(2),
        EquipmentType::Heavy => Some(0),
        _ => None,
    };
    let strength = (equipment_type == EquipmentType::Heavy).then(|| {
        ["strength", "strengthRequirement"]
            .iter()
            .find_map(|key| record.number(key))
            .filter(|s| *s > 0.0)
            .map_or(DEFAULT_HEAVY_STRENGTH, |s| s.round() as u32)
    });

    ArmorDescriptor {
        value,
        dex_cap,
        strength,
        proficient: true,
    }
}

fn consumable_type(record: &ParsedRecord, text: &str) -> ConsumableType {
    let text = format!(
        "{} {} {}",
        record.text_lower("consumableType").unwrap_or_default(),
        record.text_lower("itemType").unwrap_or_default(),
        text
    );
    const FOOD: &[&str] = &["food", "ration", "rations", "bread", "meal", "fruit"];
    const AMMO: &[&str] = &["ammo", "ammunition", "arrow", "bolt", "bullet", "needle"];

    if mentions(&text, "scroll") {
        ConsumableType::Scroll
    } else if mentions(&text, "wand") {
        ConsumableType::Wand
    } else if mentions(&text, "rod") {
        ConsumableType::Rod
    } else if FOOD.iter().any(|t| mentions(&text, t)) {
        ConsumableType::Food
    } else if AMMO.iter().any(|t| mentions(&text, t)) {
        ConsumableType::Ammo
    } else {
        ConsumableType::Potion
    }
}

/// `true` if `term` occurs in `text` and ends a word there (a plural `s` is
/// allowed). Any prefix is accepted, so compounds like "flamebow" match "bow"
/// while "balanced" does not match "lance".
fn mentions(text: &str, term: &str) -> bool {
    text.match_indices(term).any(|(start, _)| {
        let rest = &text[start + term.len()..];
        let rest = rest.strip_prefix('s').unwrap_or(rest);
        !rest.starts_with(|c: char| c.is_alphanumeric())
    })
}

// =============================================================================
// Properties and magic
// =============================================================================

/// Map weapon property tokens onto their short codes. Tokens without a code
/// pass through lower-cased; key/value tokens become `"key: value"`.
pub fn normalize_properties(record: &ParsedRecord) -> BTreeSet<String> {
    ["weaponProperties", "properties"]
        .iter()
        .flat_map(|key| record.tokens(key))
        .map(|(token, value)| {
            let lower = token.trim().to_lowercase();
            let normalized = lower.replace(' ', "-");
            PROPERTY_ABBREVIATIONS
                .iter()
                .find(|(full, code)| names_property(&normalized, full) || normalized == *code)
                .map(|(_, code)| code.to_string())
                .unwrap_or_else(|| match value {
                    Some(value) => format!("{}: {}", lower, value.to_lowercase()),
                    None => lower,
                })
        })
        .collect()
}

/// `token` is `full` itself or `full` followed by a qualifier such as
/// `"(1d10)"`. "lightning" is not "light" and "reach-of-the-storm" is not "reach".
fn names_property(token: &str, full: &str) -> bool {
    token.strip_prefix(full).is_some_and(|rest| {
        !rest
            .trim_start_matches('-')
            .starts_with(|c: char| c.is_alphabetic())
    })
}

/// An explicit `magical` flag always wins; otherwise a high rarity turns the
/// record magical with probability `probability`.
pub fn derive_magical(record: &ParsedRecord, random: &dyn RandomPort, probability: f64) -> bool {
    if record.flag_is_true("magical") || record.flag_is_true("magic") {
        return true;
    }
    let rarity = record.text_lower("rarity").unwrap_or_default();
    HIGH_RARITIES.contains(&rarity.as_str()) && random.gen_bool(probability)
}

// =============================================================================
// Assembly
// =============================================================================

/// Everything the pipeline decided about an item before defaults are filled.
#[derive(Debug, Clone)]
pub struct ItemDraft {
    pub name: String,
    pub category: ItemCategory,
    pub details: CategoryDetails,
    pub description: String,
    /// Stored image path; empty means placeholder
    pub image: String,
    pub properties: BTreeSet<String>,
    pub effects: Vec<EffectDescriptor>,
}

impl ItemDraft {
    /// Fill the remaining fields from `source`, falling back to defaults.
    pub fn into_record(self, source: &ParsedRecord) -> ItemRecord {
        let description = if self.description.trim().is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            self.description
        };
        let image = if self.image.trim().is_empty() {
            PLACEHOLDER_IMAGE.to_string()
        } else {
            self.image
        };

        ItemRecord {
            name: ItemName::lenient(&self.name),
            category: self.category,
            image,
            description,
            rarity: source
                .text_lower("rarity")
                .unwrap_or_else(|| "common".to_string()),
            weight: source.number("weight").unwrap_or(1.0),
            price: price(source),
            attunement: requires_attunement(source),
            properties: self.properties,
            details: self.details,
            activation: present(source, "activation"),
            uses: present(source, "uses"),
            effects: self.effects,
        }
    }
}

fn price(record: &ParsedRecord) -> Price {
    if let Some(Value::Object(map)) = record.get("price") {
        let value = map.get("value").and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        let denomination = map
            .get("denomination")
            .and_then(Value::as_str)
            .and_then(denomination);
        return Price {
            value: value.unwrap_or(DEFAULT_PRICE),
            denomination: denomination.unwrap_or("gp").to_string(),
        };
    }

    let value = record.number("price").unwrap_or(DEFAULT_PRICE);
    let denomination = record
        .text_lower("price")
        .as_deref()
        .and_then(denomination)
        .unwrap_or("gp");
    Price {
        value,
        denomination: denomination.to_string(),
    }
}

fn denomination(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    ["pp", "gp", "ep", "sp", "cp"]
        .into_iter()
        .find(|d| text.contains(d))
}

fn requires_attunement(record: &ParsedRecord) -> bool {
    ["requiresAttunement", "attunement"]
        .iter()
        .find_map(|key| record.text_lower(key))
        .is_some_and(|v| v == "true" || v.starts_with("yes") || v.starts_with("required"))
}

fn present(record: &ParsedRecord, key: &str) -> Option<Value> {
    record.get(key).filter(|v| !v.is_null()).cloned()
}
