//! Supplementary magical properties and the effects derived from them.

use std::sync::{Arc, LazyLock};

use lootforge_domain::{Ability, EffectDescriptor, EffectTarget};
use regex_lite::Regex;

use super::prompts::{augment_system, augment_user, AUGMENT_MAX_TOKENS};
use crate::infrastructure::ports::RandomPort;
use crate::repositories::BackendClient;

pub const MAGIC_HEADING: &str = "<h3>Magical Properties</h3>";

const MIN_PROPERTIES: i32 = 1;
const MAX_PROPERTIES: i32 = 3;

/// `+N to <target>` with N in 1..=3.
static STAT_BONUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\+\s*([1-3])\b(?:\s+bonus)?\s+to\s+(?:the\s+|your\s+|its\s+|all\s+)?(strength|dexterity|constitution|intelligence|wisdom|charisma|armor class|ac|attack rolls?|attacks?|damage rolls?|damage|saving throws?|saves?)\b",
    )
    .expect("valid regex")
});

/// Flavor text to append to a description plus one effect per property line.
#[derive(Debug, Clone, PartialEq)]
pub struct Augmentation {
    pub text: String,
    pub effects: Vec<EffectDescriptor>,
}

pub struct MagicAugmenter {
    backend: Arc<BackendClient>,
    random: Arc<dyn RandomPort>,
}

impl MagicAugmenter {
    pub fn new(backend: Arc<BackendClient>, random: Arc<dyn RandomPort>) -> Self {
        Self { backend, random }
    }

    pub fn draw_property_count(&self) -> usize {
        self.random
            .gen_range(MIN_PROPERTIES, MAX_PROPERTIES)
            .clamp(MIN_PROPERTIES, MAX_PROPERTIES) as usize
    }

    /// Ask for `count` properties. `None` when the backend returned nothing
    /// usable; the description then stays as it is.
    pub async fn augment(&self, name: &str, description: &str, count: usize) -> Option<Augmentation> {
        let reply = self
            .backend
            .generate_text(
                &augment_system(count),
                &augment_user(name, description),
                AUGMENT_MAX_TOKENS,
            )
            .await;

        let lines: Vec<String> = reply
            .lines()
            .map(strip_bullet)
            .filter(|line| !line.is_empty())
            .take(count)
            .map(String::from)
            .collect();
        if lines.is_empty() {
            tracing::warn!(item = %name, "Augmentation returned no properties");
            return None;
        }

        let effects: Vec<EffectDescriptor> = lines.iter().map(|line| parse_effect(line)).collect();
        tracing::debug!(
            item = %name,
            properties = lines.len(),
            mechanical = effects.iter().filter(|e| e.is_mechanical()).count(),
            "Augmented magical properties"
        );

        let items: String = lines
            .iter()
            .map(|line| format!("<li>{}</li>", escape_html(line)))
            .collect();
        Some(Augmentation {
            text: format!("{}<ul>{}</ul>", MAGIC_HEADING, items),
            effects,
        })
    }
}

/// Append augmentation text after the existing description.
pub fn append_to_description(description: &str, augmentation: &Augmentation) -> String {
    if description.trim().is_empty() {
        augmentation.text.clone()
    } else {
        format!("{}\n{}", description.trim_end(), augmentation.text)
    }
}

/// Match one property sentence against the stat-bonus phrasings.
pub fn parse_effect(line: &str) -> EffectDescriptor {
    let label = line.trim();
    let Some(captures) = STAT_BONUS.captures(label) else {
        return EffectDescriptor::flavor(label);
    };
    let magnitude = captures
        .get(1)
        .and_then(|m| m.as_str().parse::<i32>().ok());
    let target = captures.get(2).and_then(|m| target_for(&m.as_str().to_lowercase()));

    match (magnitude, target) {
        (Some(magnitude), Some(target)) => EffectDescriptor::modifier(label, target, magnitude),
        _ => EffectDescriptor::flavor(label),
    }
}

fn target_for(phrase: &str) -> Option<EffectTarget> {
    if let Some(ability) = Ability::ALL.into_iter().find(|a| a.name() == phrase) {
        return Some(EffectTarget::Ability(ability));
    }
    match phrase {
        "armor class" | "ac" => Some(EffectTarget::ArmorClass),
        p if p.starts_with("attack") => Some(EffectTarget::Attack),
        p if p.starts_with("damage") => Some(EffectTarget::Damage),
        p if p.starts_with("sav") => Some(EffectTarget::SavingThrows),
        _ => None,
    }
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(['-', '*', '•']).trim_start();
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && line[digits..].starts_with(['.', ')']) {
        line[digits + 1..].trim_start()
    } else {
        line
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
