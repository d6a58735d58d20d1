//! Cross-field consistency between the name, the prompt and the record.

use std::sync::{Arc, LazyLock};

use lootforge_domain::ParsedRecord;
use regex_lite::Regex;

use super::prompts::{mismatch_system, FIX_JSON_MAX_TOKENS};
use super::recovery::extract_json_block;
use crate::repositories::BackendClient;

/// `<b>Item Name:</b> Frostbrand<br>` at the very start of a description.
static EMBEDDED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^<b>\s*Item Name:\s*</b>\s*([^<]+)<br\s*/?>").expect("valid regex")
});

/// When the prompt mentions `trigger`, every `conflicting` term in the name or
/// description is replaced with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionRule {
    pub trigger: String,
    pub conflicting: Vec<String>,
    pub replacement: String,
}

impl CorrectionRule {
    pub fn new(
        trigger: impl Into<String>,
        conflicting: impl IntoIterator<Item = impl Into<String>>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            trigger: trigger.into().to_lowercase(),
            conflicting: conflicting
                .into_iter()
                .map(|t| t.into().to_lowercase())
                .collect(),
            replacement: replacement.into(),
        }
    }

    pub fn sword() -> Self {
        Self::new(
            "sword",
            ["dagger", "helm", "amulet", "staff", "crossbow"],
            "sword",
        )
    }

    pub fn defaults() -> Vec<Self> {
        vec![Self::sword()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Name to use from here on
    pub name: String,
    /// Record JSON with the marker stripped and corrections applied
    pub record_text: String,
    /// Set when the description carried an embedded name
    pub extracted_name: Option<String>,
}

pub struct ConsistencyResolver {
    rules: Vec<CorrectionRule>,
    backend: Arc<BackendClient>,
}

impl ConsistencyResolver {
    pub fn new(backend: Arc<BackendClient>, rules: Vec<CorrectionRule>) -> Self {
        Self { rules, backend }
    }

    /// Extract an embedded name, then apply the correction rules. Text that
    /// does not parse comes back unchanged.
    pub fn reconcile(&self, name: &str, record_text: &str, prompt: &str) -> Reconciled {
        let unchanged = Reconciled {
            name: name.to_string(),
            record_text: record_text.to_string(),
            extracted_name: None,
        };
        let Ok(mut record) = ParsedRecord::parse(record_text) else {
            tracing::debug!("Record text does not parse, skipping reconciliation");
            return unchanged;
        };

        let mut name = name.to_string();
        let mut description = record.text("description");
        let mut extracted_name = None;

        if let Some((extracted, rest)) = description.as_deref().and_then(extract_embedded_name) {
            tracing::debug!(name = %extracted, "Extracted name from description");
            name = extracted.clone();
            extracted_name = Some(extracted);
            description = Some(rest);
        }

        let prompt = prompt.to_lowercase();
        for rule in self.rules.iter().filter(|r| prompt.contains(&r.trigger)) {
            for term in &rule.conflicting {
                if name.to_ascii_lowercase().contains(term.as_str()) {
                    tracing::debug!(term = %term, replacement = %rule.replacement, "Correcting name");
                    name = replace_ignore_ascii_case(&name, term, &rule.replacement);
                }
                if let Some(text) = description.as_mut() {
                    if text.to_ascii_lowercase().contains(term.as_str()) {
                        *text = replace_ignore_ascii_case(text, term, &rule.replacement);
                    }
                }
            }
        }

        if let Some(text) = description {
            record.set_text("description", text);
        }

        Reconciled {
            name,
            record_text: record.to_json_string(),
            extracted_name,
        }
    }

    /// When the prompt names one kind of item and the record's `itemType`
    /// names a conflicting one, ask the backend to rewrite the record.
    /// Keeps the original text on any failure.
    pub async fn fix_category_mismatch(&self, record_text: &str, prompt: &str) -> String {
        let Ok(record) = ParsedRecord::parse(record_text) else {
            return record_text.to_string();
        };
        let Some(found) = record.text_lower("itemType") else {
            return record_text.to_string();
        };
        let prompt = prompt.to_lowercase();
        let Some(rule) = self.rules.iter().find(|r| {
            prompt.contains(&r.trigger)
                && !found.contains(&r.trigger)
                && r.conflicting.iter().any(|t| found.contains(t.as_str()))
        }) else {
            return record_text.to_string();
        };

        tracing::info!(expected = %rule.replacement, found = %found, "Item type mismatch, asking backend to fix");
        let reply = self
            .backend
            .generate_text(
                &mismatch_system(&rule.replacement, &found),
                record_text,
                FIX_JSON_MAX_TOKENS,
            )
            .await;

        match ParsedRecord::parse(&extract_json_block(&reply)) {
            Ok(fixed) => fixed.to_json_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Mismatch fix did not return a record, keeping original");
                record_text.to_string()
            }
        }
    }
}

/// Split `"<b>Item Name:</b> X<br>rest"` into `("X", "rest")`.
pub fn extract_embedded_name(description: &str) -> Option<(String, String)> {
    let captures = EMBEDDED_NAME.captures(description)?;
    let name = captures.get(1)?.as_str().trim();
    if name.is_empty() {
        return None;
    }
    let marker_end = captures.get(0)?.end();
    Some((name.to_string(), description[marker_end..].trim().to_string()))
}

fn replace_ignore_ascii_case(text: &str, needle: &str, replacement: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(offset) = lower[cursor..].find(needle) {
        out.push_str(&text[cursor..cursor + offset]);
        out.push_str(replacement);
        cursor += offset + needle.len();
    }
    out.push_str(&text[cursor..]);
    out
}
