//! Item naming: derive a name from the prompt, refine it from the finished
//! description, and enforce the keyword policy on every name that leaves here.

use std::sync::Arc;

use lootforge_domain::{FALLBACK_ITEM_NAME, MAX_NAME_LENGTH};

use super::prompts::{refine_name_user, NAME_MAX_TOKENS, NAME_SYSTEM, REFINE_NAME_SYSTEM};
use crate::repositories::BackendClient;

/// Item kinds that must appear in the name when the prompt asks for them.
pub const NAME_KEYWORDS: [&str; 8] = [
    "ring", "amulet", "dagger", "sword", "shield", "gloves", "cloak", "potion",
];

/// Multi-word phrase carried into the name when the prompt contains it.
pub const FORCED_PHRASE: &str = "class change";

/// Theme word removed from names unless the prompt asks for it.
pub const DISALLOWED_THEME: &str = "dragon";

/// Upper bound on policy passes; a fixpoint is reached in at most three.
const MAX_POLICY_PASSES: usize = 8;

pub struct NamingEngine {
    backend: Arc<BackendClient>,
}

impl NamingEngine {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    pub async fn derive_name(&self, prompt: &str) -> String {
        let raw = self
            .backend
            .generate_text(NAME_SYSTEM, prompt, NAME_MAX_TOKENS)
            .await;
        let name = clean_model_name(&raw).unwrap_or_else(|| FALLBACK_ITEM_NAME.to_string());
        let enforced = enforce_naming_policy(&name, prompt);
        tracing::debug!(name = %enforced, "Derived item name");
        enforced
    }

    /// Ask for a better name given the finished description. Any failure keeps
    /// `current`.
    pub async fn refine_name(&self, current: &str, description: &str) -> String {
        let raw = self
            .backend
            .generate_text(
                REFINE_NAME_SYSTEM,
                &refine_name_user(current, description),
                NAME_MAX_TOKENS,
            )
            .await;
        match clean_model_name(&raw) {
            Some(refined) => {
                tracing::debug!(from = %current, to = %refined, "Refined item name");
                refined
            }
            None => current.to_string(),
        }
    }
}

/// Apply the keyword policy until nothing changes, so applying it again to
/// its own output is a no-op.
pub fn enforce_naming_policy(name: &str, prompt: &str) -> String {
    let prompt = prompt.to_lowercase();
    let mut current = name.to_string();
    for _ in 0..MAX_POLICY_PASSES {
        let next = policy_pass(&current, &prompt);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn policy_pass(name: &str, prompt_lower: &str) -> String {
    let mut result = name.to_string();

    for keyword in NAME_KEYWORDS {
        if prompt_lower.contains(keyword) && !result.to_lowercase().contains(keyword) {
            result = format!("{} {}", result, capitalize(keyword)).trim().to_string();
        }
    }

    if prompt_lower.contains(FORCED_PHRASE) && !result.to_lowercase().contains(FORCED_PHRASE) {
        result = format!("{} Class Change", result).trim().to_string();
    }

    if !prompt_lower.contains(DISALLOWED_THEME)
        && result.to_lowercase().contains(DISALLOWED_THEME)
    {
        // Removal can splice a new occurrence together ("dradragongon").
        while result.to_ascii_lowercase().contains(DISALLOWED_THEME) {
            result = remove_ignore_ascii_case(&result, DISALLOWED_THEME);
        }
        result = result.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    result
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn remove_ignore_ascii_case(text: &str, needle: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(offset) = lower[cursor..].find(needle) {
        out.push_str(&text[cursor..cursor + offset]);
        cursor += offset + needle.len();
    }
    out.push_str(&text[cursor..]);
    out
}

/// First line of a model reply with quotes, markup and label prefixes removed.
fn clean_model_name(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .strip_prefix("Item Name:")
        .or_else(|| line.strip_prefix("Name:"))
        .unwrap_or(line);
    let cleaned = line
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`' | '.'))
        .trim();
    if cleaned.is_empty() || cleaned.len() > MAX_NAME_LENGTH || cleaned.contains('{') {
        return None;
    }
    Some(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::ports::{LlmError, LlmPort, MockAssetStorePort};
    use crate::test_fixtures::llm_mocks::{FailingLlm, ScriptedLlm};

    fn naming(llm: Arc<dyn LlmPort>) -> NamingEngine {
        NamingEngine::new(Arc::new(BackendClient::new(
            llm,
            None,
            Arc::new(MockAssetStorePort::new()),
            Arc::new(SystemClock::new()),
            "lootforge",
        )))
    }

    #[test]
    fn test_missing_keyword_appended_capitalized() {
        assert_eq!(
            enforce_naming_policy("Iron Blade", "a simple iron sword"),
            "Iron Blade Sword"
        );
        assert_eq!(
            enforce_naming_policy("Starlight", "a ring and an amulet"),
            "Starlight Ring Amulet"
        );
    }

    #[test]
    fn test_present_keyword_not_duplicated() {
        assert_eq!(
            enforce_naming_policy("Moonsword", "an elven sword"),
            "Moonsword"
        );
    }

    #[test]
    fn test_forced_phrase_appended() {
        assert_eq!(
            enforce_naming_policy("Tome of Rebirth", "a class change scroll"),
            "Tome of Rebirth Class Change"
        );
    }

    #[test]
    fn test_theme_word_stripped_unless_requested() {
        assert_eq!(
            enforce_naming_policy("Dragonfang  DRAGON Cloak", "a warm cloak"),
            "fang Cloak"
        );
        assert_eq!(
            enforce_naming_policy("Dragonfang Cloak", "a dragon hide cloak"),
            "Dragonfang Cloak"
        );
    }

    #[test]
    fn test_stripping_that_breaks_a_keyword_restores_it() {
        // "swordragon" loses the shared 'd' of "sword" when "dragon" is removed.
        let once = enforce_naming_policy("swordragon", "a sword");
        assert_eq!(once, "swor Sword");
    }

    #[test]
    fn test_policy_is_idempotent() {
        let names = [
            "",
            "Unnamed",
            "Iron Blade",
            "swordragon",
            "Dragon Dragon",
            "dradragongon Ring",
            "Ring of the DRAGON",
            "  spaced   out  ",
            "Potion Class Change",
        ];
        let prompts = [
            "a simple iron sword",
            "a potion and a ring for a class change",
            "gloves, cloak, shield and dagger",
            "a dragon amulet",
            "",
        ];
        for name in names {
            for prompt in prompts {
                let once = enforce_naming_policy(name, prompt);
                let twice = enforce_naming_policy(&once, prompt);
                assert_eq!(once, twice, "name {:?} prompt {:?}", name, prompt);
            }
        }
    }

    #[tokio::test]
    async fn test_derive_name_applies_policy() {
        let llm = Arc::new(ScriptedLlm::new(vec!["\"Dragonbane\"\n"]));
        let name = naming(llm.clone()).derive_name("a simple iron sword").await;

        assert_eq!(name, "bane Sword");
        let requests = llm.requests();
        assert_eq!(requests[0].max_tokens, Some(NAME_MAX_TOKENS));
    }

    #[tokio::test]
    async fn test_derive_name_falls_back_when_backend_fails() {
        let name = naming(Arc::new(FailingLlm::new(LlmError::NotConfigured)))
            .derive_name("a trinket")
            .await;
        assert_eq!(name, FALLBACK_ITEM_NAME);
    }

    #[tokio::test]
    async fn test_refine_name_keeps_current_on_empty_reply() {
        let refined = naming(Arc::new(ScriptedLlm::empty()))
            .refine_name("Iron Blade Sword", "A blade.")
            .await;
        assert_eq!(refined, "Iron Blade Sword");
    }

    #[tokio::test]
    async fn test_refine_name_uses_clean_reply() {
        let refined = naming(Arc::new(ScriptedLlm::new(vec!["Name: **Winter's Edge**"])))
            .refine_name("Iron Blade", "A blade of ice.")
            .await;
        assert_eq!(refined, "Winter's Edge");
    }
}
