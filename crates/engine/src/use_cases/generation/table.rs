//! Roll table pipeline: request a table, then turn every entry into a result.

use std::sync::Arc;

use lootforge_domain::{
    DiceFormula, GenerationRequest, ParsedRecord, RollTable, StoredTable, TableMode, TableResult,
    DEFAULT_TABLE_FORMULA, DEFAULT_TABLE_NAME,
};
use serde_json::{json, Value};

use super::item::GenerateItem;
use super::prompts::{TABLE_MAX_TOKENS, TABLE_SYSTEM};
use super::recovery::RecoveryEngine;
use super::GenerationError;
use crate::infrastructure::ports::DocumentStorePort;
use crate::repositories::BackendClient;

/// Appended to a prompt to pick the table mode, e.g. `-- tableType=items`.
pub const MODE_MARKER: &str = "-- tableType=";

const DEFAULT_ITEM_TEXT: &str = "Mysterious Item";
const DEFAULT_ENTRY_TEXT: &str = "No text";

/// A stored table together with the results embedded under it.
#[derive(Debug, Clone)]
pub struct GeneratedTable {
    pub table: StoredTable,
    pub mode: TableMode,
    pub results: Vec<TableResult>,
}

pub struct GenerateRollTable {
    backend: Arc<BackendClient>,
    recovery: Arc<RecoveryEngine>,
    items: Arc<GenerateItem>,
    store: Arc<dyn DocumentStorePort>,
}

impl GenerateRollTable {
    pub fn new(
        backend: Arc<BackendClient>,
        recovery: Arc<RecoveryEngine>,
        items: Arc<GenerateItem>,
        store: Arc<dyn DocumentStorePort>,
    ) -> Self {
        Self {
            backend,
            recovery,
            items,
            store,
        }
    }

    /// Generate and store a table. An explicit `mode` wins over a mode marker
    /// in the prompt, which wins over the mode the model reports.
    ///
    /// # Errors
    ///
    /// [`GenerationError::EmptyPrompt`] for a blank prompt, or a document
    /// store failure while creating the table or its results.
    pub async fn execute(
        &self,
        prompt: &str,
        mode: Option<TableMode>,
    ) -> Result<GeneratedTable, GenerationError> {
        let (topic, marked_mode) = split_mode_marker(prompt);
        if topic.is_empty() && marked_mode.is_none() {
            return Err(GenerationError::EmptyPrompt);
        }
        let requested_mode = mode.or(marked_mode);
        tracing::info!(prompt_len = prompt.len(), mode = ?requested_mode, "Generating roll table");

        let user = match requested_mode {
            Some(mode) => format!("{} {}{}", topic, MODE_MARKER, mode),
            None => topic.clone(),
        };
        let raw = self
            .backend
            .generate_text(TABLE_SYSTEM, user.trim(), TABLE_MAX_TOKENS)
            .await;
        let parsed = if raw.is_empty() {
            tracing::warn!("Table generation returned nothing, using the empty skeleton");
            table_skeleton()
        } else {
            self.recovery.recover(&raw, table_skeleton()).await
        };

        let mode = requested_mode
            .or_else(|| parsed.text("tableType").map(|t| TableMode::from_loose(&t)))
            .unwrap_or_default();

        let table = RollTable {
            name: parsed
                .text("name")
                .or_else(|| (!topic.is_empty()).then(|| topic.clone()))
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            formula: table_formula(&parsed),
            description: parsed.text("description").unwrap_or_default(),
            replacement: true,
        };
        let stored = self.store.create_table(table).await?;

        let entries = entries(&parsed);
        tracing::info!(table_id = %stored.id, entries = entries.len(), mode = %mode, "Building table results");

        let mut results = Vec::with_capacity(entries.len());
        for entry in &entries {
            let result = match mode {
                TableMode::Items => self.item_result(entry).await,
                TableMode::Generic => TableResult::text(
                    entry.text.as_deref().unwrap_or(DEFAULT_ENTRY_TEXT),
                    entry.range,
                    entry.weight,
                ),
            };
            results.push(result);
        }

        if results.is_empty() {
            tracing::warn!(table_id = %stored.id, "Backend returned no entries, table is empty");
        }
        self.store
            .create_table_results(stored.id, results.clone())
            .await?;

        tracing::info!(table_id = %stored.id, name = %stored.table.name, results = results.len(), "Roll table created");
        Ok(GeneratedTable {
            table: stored,
            mode,
            results,
        })
    }

    /// Run the item pipeline with the entry text as both prompt and name.
    /// Any failure becomes a plain text result.
    async fn item_result(&self, entry: &Entry) -> TableResult {
        let text = entry.text.as_deref().unwrap_or(DEFAULT_ITEM_TEXT);
        let outcome = match GenerationRequest::new(text) {
            Ok(request) => {
                let request = request.with_forced_name(Some(text.to_string()));
                self.items.execute(&request).await
            }
            Err(_) => Err(GenerationError::EmptyPrompt),
        };

        match outcome {
            Ok(item) => TableResult::document(
                item.record.name.as_str(),
                entry.range,
                entry.weight,
                item.id,
            ),
            Err(e) => {
                tracing::warn!(entry = %text, error = %e, "Item generation failed for table entry");
                TableResult::text(format!("Failed item: {}", text), entry.range, entry.weight)
            }
        }
    }
}

/// One table entry with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    text: Option<String>,
    range: [u32; 2],
    weight: u32,
}

fn table_skeleton() -> ParsedRecord {
    ParsedRecord::from_value(json!({
        "name": "",
        "formula": DEFAULT_TABLE_FORMULA,
        "description": "",
        "tableType": "generic",
        "entries": []
    }))
    .unwrap_or_default()
}

fn table_formula(parsed: &ParsedRecord) -> String {
    match parsed.text("formula") {
        Some(formula) => match DiceFormula::parse(&formula) {
            Ok(dice) => dice.display(),
            Err(e) => {
                tracing::warn!(formula = %formula, error = %e, "Invalid table formula, using default");
                DEFAULT_TABLE_FORMULA.to_string()
            }
        },
        None => DEFAULT_TABLE_FORMULA.to_string(),
    }
}

fn entries(parsed: &ParsedRecord) -> Vec<Entry> {
    let Some(Value::Array(items)) = parsed.get("entries") else {
        return Vec::new();
    };
    items.iter().map(entry).collect()
}

fn entry(value: &Value) -> Entry {
    let record = match value {
        Value::String(text) => {
            return Entry {
                text: Some(text.trim().to_string()).filter(|t| !t.is_empty()),
                range: [1, 1],
                weight: 1,
            }
        }
        other => ParsedRecord::from_value(other.clone()).unwrap_or_default(),
    };

    let whole = |key: &str| {
        record
            .number(key)
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as u32)
    };
    let min = whole("minRange").unwrap_or(1);
    let max = whole("maxRange").unwrap_or(min).max(min);

    Entry {
        text: record.text("text"),
        range: [min, max],
        weight: whole("weight").filter(|w| *w > 0).unwrap_or(1),
    }
}

/// Split `"haunted forest -- tableType=items"` into the topic and the mode.
pub fn split_mode_marker(prompt: &str) -> (String, Option<TableMode>) {
    let Some(pos) = prompt.find(MODE_MARKER) else {
        return (prompt.trim().to_string(), None);
    };
    let mode = prompt[pos + MODE_MARKER.len()..]
        .split_whitespace()
        .next()
        .map(TableMode::from_loose);
    (prompt[..pos].trim().to_string(), mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedRandom, SystemClock};
    use crate::infrastructure::ports::{LlmPort, MockAssetStorePort, MockDocumentStorePort};
    use crate::test_fixtures::llm_mocks::ScriptedLlm;
    use crate::use_cases::generation::item::tests::pipeline;
    use lootforge_domain::{RecordId, StoredItem, TableId, TableResultKind};
    use mockall::predicate::*;
    use std::sync::Mutex;

    const TABLE_NEEDLE: &str = "roll table";

    fn table_use_case(llm: Arc<dyn LlmPort>, store: MockDocumentStorePort) -> GenerateRollTable {
        let store: Arc<dyn DocumentStorePort> = Arc::new(store);
        let backend = Arc::new(BackendClient::new(
            llm.clone(),
            None,
            Arc::new(MockAssetStorePort::new()),
            Arc::new(SystemClock::new()),
            "lootforge",
        ));
        let items = Arc::new(pipeline(llm, store.clone(), FixedRandom::new(1, false)));
        GenerateRollTable::new(
            backend.clone(),
            Arc::new(RecoveryEngine::new(backend)),
            items,
            store,
        )
    }

    /// Store that echoes tables and captures the results it receives.
    fn capturing_store(captured: Arc<Mutex<Vec<TableResult>>>) -> MockDocumentStorePort {
        let mut store = MockDocumentStorePort::new();
        store.expect_create_table().times(1).returning(|table| {
            Ok(StoredTable {
                id: TableId::new(),
                table,
            })
        });
        store
            .expect_create_table_results()
            .times(1)
            .returning(move |_, results| {
                captured.lock().expect("capture lock").extend(results);
                Ok(())
            });
        store
    }

    #[tokio::test]
    async fn test_zero_entries_still_creates_results() {
        let llm = Arc::new(ScriptedLlm::routed(vec![(
            TABLE_NEEDLE,
            r#"{"name": "Empty Ruins", "formula": "1d6", "tableType": "generic", "entries": []}"#,
        )]));
        let mut store = MockDocumentStorePort::new();
        store.expect_create_table().times(1).returning(|table| {
            Ok(StoredTable {
                id: TableId::new(),
                table,
            })
        });
        store
            .expect_create_table_results()
            .with(always(), function(|results: &Vec<TableResult>| results.is_empty()))
            .times(1)
            .returning(|_, _| Ok(()));

        let generated = table_use_case(llm, store)
            .execute("ruins", None)
            .await
            .expect("table created");

        assert!(generated.results.is_empty());
        assert_eq!(generated.table.table.name, "Empty Ruins");
        assert_eq!(generated.table.table.formula, "1d6");
        assert!(generated.table.table.replacement);
    }

    #[tokio::test]
    async fn test_unusable_reply_falls_back_to_skeleton() {
        let llm = Arc::new(ScriptedLlm::routed(vec![(TABLE_NEEDLE, "I cannot do that.")]));
        let captured = Arc::new(Mutex::new(Vec::new()));

        let generated = table_use_case(llm, capturing_store(captured.clone()))
            .execute("swamp encounters", None)
            .await
            .expect("table created");

        assert_eq!(generated.table.table.name, "swamp encounters");
        assert_eq!(generated.table.table.formula, DEFAULT_TABLE_FORMULA);
        assert_eq!(generated.mode, TableMode::Generic);
        assert!(captured.lock().expect("capture lock").is_empty());
    }

    #[tokio::test]
    async fn test_generic_entries_with_defaults() {
        let llm = Arc::new(ScriptedLlm::routed(vec![(
            TABLE_NEEDLE,
            r#"{"name": "Tavern Rumors", "formula": "d4", "description": "Whispers.",
                "tableType": "generic",
                "entries": [
                    {"text": "A dragon was seen.", "minRange": 1, "maxRange": 2, "weight": 2},
                    {"minRange": 3},
                    "The mayor is a doppelganger."
                ]}"#,
        )]));
        let captured = Arc::new(Mutex::new(Vec::new()));

        let generated = table_use_case(llm, capturing_store(captured.clone()))
            .execute("tavern rumors", None)
            .await
            .expect("table created");

        assert_eq!(generated.table.table.formula, "1d4");
        let results = captured.lock().expect("capture lock").clone();
        assert_eq!(results, generated.results);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], TableResult::text("A dragon was seen.", [1, 2], 2));
        assert_eq!(results[1], TableResult::text("No text", [3, 3], 1));
        assert_eq!(results[2].text, "The mayor is a doppelganger.");
        assert_eq!(results[2].range, [1, 1]);
    }

    #[tokio::test]
    async fn test_item_entries_run_item_pipeline() {
        let llm = Arc::new(ScriptedLlm::routed(vec![
            (
                TABLE_NEEDLE,
                r#"{"name": "Hoard", "formula": "1d2", "tableType": "generic",
                    "entries": [{"text": "Amber Amulet", "minRange": 1, "maxRange": 1}, {"minRange": 2}]}"#,
            ),
            (
                "single, consistent DnD 5e item",
                r#"{"description": "A warm amber stone.", "rarity": "common"}"#,
            ),
        ]));
        let mut store = capturing_store(Arc::new(Mutex::new(Vec::new())));
        store.expect_create_item().times(2).returning(|record| {
            Ok(StoredItem {
                id: RecordId::new(),
                record,
            })
        });

        let generated = table_use_case(llm.clone(), store)
            .execute("dragon hoard", Some(TableMode::Items))
            .await
            .expect("table created");

        assert_eq!(generated.mode, TableMode::Items);
        assert_eq!(generated.results.len(), 2);
        assert_eq!(generated.results[0].kind, TableResultKind::Document);
        assert_eq!(generated.results[0].text, "Amber Amulet");
        assert!(generated.results[0].document_id.is_some());
        assert_eq!(generated.results[1].text, DEFAULT_ITEM_TEXT);
        assert_eq!(llm.calls_matching("short item name"), 0);

        let table_request = llm
            .requests()
            .into_iter()
            .find(|r| r.system_prompt.as_deref() == Some(TABLE_SYSTEM))
            .expect("table request");
        assert_eq!(
            table_request.messages[0].content,
            "dragon hoard -- tableType=items"
        );
    }

    #[tokio::test]
    async fn test_failed_item_becomes_text_result() {
        let llm = Arc::new(ScriptedLlm::routed(vec![(
            TABLE_NEEDLE,
            r#"{"tableType": "items", "entries": [{"text": "Cursed Coin"}]}"#,
        )]));
        let mut store = capturing_store(Arc::new(Mutex::new(Vec::new())));
        store.expect_create_item().times(1).returning(|_| {
            Err(crate::infrastructure::ports::StoreError::write(
                "create_item",
                "locked",
            ))
        });

        let generated = table_use_case(llm, store)
            .execute("coins", None)
            .await
            .expect("table created");

        assert_eq!(generated.mode, TableMode::Items);
        assert_eq!(generated.table.table.name, "coins");
        assert_eq!(
            generated.results,
            vec![TableResult::text("Failed item: Cursed Coin", [1, 1], 1)]
        );
    }

    #[tokio::test]
    async fn test_blank_prompt_rejected() {
        let result = table_use_case(Arc::new(ScriptedLlm::empty()), MockDocumentStorePort::new())
            .execute("   ", None)
            .await;
        assert!(matches!(result, Err(GenerationError::EmptyPrompt)));
    }

    #[test]
    fn test_split_mode_marker() {
        assert_eq!(
            split_mode_marker("haunted forest -- tableType=items"),
            ("haunted forest".to_string(), Some(TableMode::Items))
        );
        assert_eq!(
            split_mode_marker("city rumors -- tableType=Generic extra"),
            ("city rumors".to_string(), Some(TableMode::Generic))
        );
        assert_eq!(split_mode_marker(" loot "), ("loot".to_string(), None));
    }

    #[test]
    fn test_entry_ranges_never_invert() {
        let e = entry(&json!({"text": "x", "minRange": 5, "maxRange": 2, "weight": 0}));
        assert_eq!(e.range, [5, 5]);
        assert_eq!(e.weight, 1);
    }
}
