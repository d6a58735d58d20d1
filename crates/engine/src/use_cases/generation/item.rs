//! Single item pipeline: name, image, record, repair, reconcile, map, augment, store.

use std::collections::BTreeSet;
use std::sync::Arc;

use lootforge_domain::{
    GenerationRequest, ItemCategory, ParsedRecord, StoredItem, DEFAULT_DESCRIPTION,
};

use super::augment::{append_to_description, MagicAugmenter};
use super::consistency::ConsistencyResolver;
use super::naming::{enforce_naming_policy, NamingEngine};
use super::prompts::{ITEM_MAX_TOKENS, ITEM_SYSTEM};
use super::recovery::RecoveryEngine;
use super::schema::{
    classify, derive_magical, normalize_properties, synthesize, ItemDraft, MAGIC_PROPERTY,
};
use super::GenerationError;
use crate::infrastructure::config::PipelineConfig;
use crate::infrastructure::ports::{DocumentStorePort, RandomPort};
use crate::repositories::BackendClient;

pub struct GenerateItem {
    backend: Arc<BackendClient>,
    recovery: Arc<RecoveryEngine>,
    naming: Arc<NamingEngine>,
    consistency: Arc<ConsistencyResolver>,
    augmenter: Arc<MagicAugmenter>,
    store: Arc<dyn DocumentStorePort>,
    random: Arc<dyn RandomPort>,
    settings: PipelineConfig,
}

impl GenerateItem {
    pub fn new(
        backend: Arc<BackendClient>,
        recovery: Arc<RecoveryEngine>,
        naming: Arc<NamingEngine>,
        consistency: Arc<ConsistencyResolver>,
        augmenter: Arc<MagicAugmenter>,
        store: Arc<dyn DocumentStorePort>,
        random: Arc<dyn RandomPort>,
        settings: PipelineConfig,
    ) -> Self {
        Self {
            backend,
            recovery,
            naming,
            consistency,
            augmenter,
            store,
            random,
            settings,
        }
    }

    /// Run the whole pipeline and store the result.
    ///
    /// # Errors
    ///
    /// Only a document store failure is returned; every backend problem
    /// degrades to defaults.
    pub async fn execute(&self, request: &GenerationRequest) -> Result<StoredItem, GenerationError> {
        let prompt = request.prompt();
        tracing::info!(
            prompt_len = prompt.len(),
            hint = ?request.category_hint(),
            forced_name = request.forced_name().is_some(),
            "Generating item"
        );

        let derived_name = match request.forced_name() {
            Some(forced) => forced.to_string(),
            None => self.naming.derive_name(prompt).await,
        };
        let image = self.backend.generate_and_store_image(prompt).await;

        let raw = self
            .backend
            .generate_text(ITEM_SYSTEM, prompt, ITEM_MAX_TOKENS)
            .await;
        let parsed = if raw.is_empty() {
            tracing::warn!("Item generation returned nothing, using an empty record");
            ParsedRecord::empty()
        } else {
            self.recovery.recover(&raw, ParsedRecord::empty()).await
        };

        let record_text = self
            .consistency
            .fix_category_mismatch(&parsed.to_json_string(), prompt)
            .await;
        let reconciled = self.consistency.reconcile(&derived_name, &record_text, prompt);
        let record = ParsedRecord::parse(&reconciled.record_text).unwrap_or(parsed);
        let description = record
            .text("description")
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        let name = match request.forced_name() {
            Some(forced) => forced.to_string(),
            None => {
                let extracted = reconciled.extracted_name.is_some();
                self.settle_name(&reconciled.name, extracted, &description, prompt)
                    .await
            }
        };

        let category = classify(&record, request.category_hint(), &name, &description);
        let details = synthesize(category, &record, &name, &description);

        let mut properties = if category == ItemCategory::Weapon {
            normalize_properties(&record)
        } else {
            BTreeSet::new()
        };
        let magical = derive_magical(&record, self.random.as_ref(), self.settings.magic_probability)
            || properties.contains(MAGIC_PROPERTY);
        if magical {
            properties.insert(MAGIC_PROPERTY.to_string());
        }

        let mut description = description;
        let mut effects = Vec::new();
        if magical && self.settings.augment_magic {
            let count = self.augmenter.draw_property_count();
            if let Some(augmentation) = self.augmenter.augment(&name, &description, count).await {
                description = append_to_description(&description, &augmentation);
                effects = augmentation.effects;
            }
        }

        let item = ItemDraft {
            name,
            category,
            details,
            description,
            image,
            properties,
            effects,
        }
        .into_record(&record);

        let stored = self.store.create_item(item).await?;
        tracing::info!(
            id = %stored.id,
            name = %stored.record.name,
            category = %stored.record.category,
            magical,
            "Item created"
        );
        Ok(stored)
    }

    /// An embedded name is authoritative; otherwise the name may be refined
    /// against the finished description. The keyword policy applies either way.
    async fn settle_name(
        &self,
        name: &str,
        extracted: bool,
        description: &str,
        prompt: &str,
    ) -> String {
        let name = enforce_naming_policy(name, prompt);
        if extracted || !self.settings.refine_names {
            return name;
        }
        let refined = self.naming.refine_name(&name, description).await;
        enforce_naming_policy(&refined, prompt)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infrastructure::asset_store::FsAssetStore;
    use crate::infrastructure::clock::{FixedRandom, SystemClock};
    use crate::infrastructure::ports::{
        LlmError, LlmPort, MockAssetStorePort, MockDocumentStorePort, StoreError,
    };
    use crate::test_fixtures::completions::{FROSTBRAND_ITEM, IRON_SWORD_ITEM};
    use crate::test_fixtures::image_mocks::PlaceholderImageGen;
    use crate::test_fixtures::llm_mocks::{FailingLlm, ScriptedLlm};
    use crate::use_cases::generation::consistency::CorrectionRule;
    use lootforge_domain::{CategoryDetails, EffectTarget, RecordId, WeaponType};

    /// Wire a full item pipeline around `llm` and `store`.
    pub(crate) fn pipeline(
        llm: Arc<dyn LlmPort>,
        store: Arc<dyn DocumentStorePort>,
        random: FixedRandom,
    ) -> GenerateItem {
        let backend = Arc::new(BackendClient::new(
            llm,
            None,
            Arc::new(MockAssetStorePort::new()),
            Arc::new(SystemClock::new()),
            "lootforge",
        ));
        pipeline_on(backend, store, random)
    }

    fn pipeline_on(
        backend: Arc<BackendClient>,
        store: Arc<dyn DocumentStorePort>,
        random: FixedRandom,
    ) -> GenerateItem {
        let random: Arc<dyn RandomPort> = Arc::new(random);
        GenerateItem::new(
            backend.clone(),
            Arc::new(RecoveryEngine::new(backend.clone())),
            Arc::new(NamingEngine::new(backend.clone())),
            Arc::new(ConsistencyResolver::new(
                backend.clone(),
                CorrectionRule::defaults(),
            )),
            Arc::new(MagicAugmenter::new(backend.clone(), random.clone())),
            store,
            random,
            PipelineConfig::default(),
        )
    }

    pub(crate) fn echo_store() -> MockDocumentStorePort {
        let mut store = MockDocumentStorePort::new();
        store.expect_create_item().returning(|record| {
            Ok(StoredItem {
                id: RecordId::new(),
                record,
            })
        });
        store
    }

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest::new(prompt).expect("non-empty prompt")
    }

    #[tokio::test]
    async fn test_simple_iron_sword() {
        let llm = Arc::new(ScriptedLlm::routed(vec![
            ("short item name", "Iron Blade"),
            ("single, consistent DnD 5e item", IRON_SWORD_ITEM),
        ]));
        let item = pipeline(llm.clone(), Arc::new(echo_store()), FixedRandom::new(1, true));

        let stored = item
            .execute(&request("a simple iron sword"))
            .await
            .expect("item stored");
        let record = stored.record;

        assert_eq!(record.category, ItemCategory::Weapon);
        assert!(record.name.as_str().contains("Sword"), "{}", record.name);
        assert_eq!(record.name.as_str(), "Iron Blade Sword");
        assert!(!record.description.contains("Item Name:"));
        assert_eq!(record.description, "A simple iron blade, well balanced.");
        match record.details {
            CategoryDetails::Weapon(ref weapon) => {
                assert_eq!(weapon.weapon_type, WeaponType::SimpleMelee);
                let damage = weapon.damage.as_ref().expect("damage");
                assert_eq!(damage.parts[0].formula, "1d6");
            }
            other => panic!("expected weapon details, got {:?}", other),
        }
        assert!(!record.is_magical());
        assert_eq!(llm.calls_matching("better fitting name"), 0);
        assert_eq!(llm.calls_matching("magical properties"), 0);
    }

    #[tokio::test]
    async fn test_frostbrand_extracted_and_augmented() {
        let llm = Arc::new(ScriptedLlm::routed(vec![
            ("short item name", "Winter Fang"),
            ("single, consistent DnD 5e item", FROSTBRAND_ITEM),
            ("magical properties", "+1 to attack rolls.\nFrost rimes the blade at dawn."),
        ]));
        let item = pipeline(llm.clone(), Arc::new(echo_store()), FixedRandom::new(2, false));

        let record = item
            .execute(&request("an icy sword"))
            .await
            .expect("item stored")
            .record;

        assert_eq!(record.name.as_str(), "Frostbrand Sword");
        assert!(record.description.starts_with("A blade of ice."));
        assert!(record.description.contains("<h3>Magical Properties</h3>"));
        assert_eq!(record.rarity, "very rare");
        assert!(record.attunement);
        assert!(record.is_magical());
        assert!(record.properties.contains("ver"));
        assert!(record.properties.contains("fin"));
        assert_eq!(record.effects.len(), 2);
        assert!(matches!(
            record.effects[0],
            lootforge_domain::EffectDescriptor::Modifier {
                target: EffectTarget::Attack,
                magnitude: 1,
                ..
            }
        ));
        match record.details {
            CategoryDetails::Weapon(weapon) => {
                let damage = weapon.damage.expect("damage");
                assert_eq!(damage.parts[0].formula, "1d8+2");
                assert_eq!(damage.parts[0].damage_type, "cold");
            }
            other => panic!("expected weapon details, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forced_name_skips_naming() {
        let llm = Arc::new(ScriptedLlm::routed(vec![
            ("short item name", "Ignored"),
            ("single, consistent DnD 5e item", FROSTBRAND_ITEM),
            ("better fitting name", "Also Ignored"),
        ]));
        let item = pipeline(llm.clone(), Arc::new(echo_store()), FixedRandom::new(1, false));
        let request =
            request("a glass orb").with_forced_name(Some("Mysterious Orb".to_string()));

        let record = item.execute(&request).await.expect("item stored").record;

        assert_eq!(record.name.as_str(), "Mysterious Orb");
        assert_eq!(llm.calls_matching("short item name"), 0);
        assert_eq!(llm.calls_matching("better fitting name"), 0);
    }

    #[tokio::test]
    async fn test_name_refined_without_embedded_name() {
        let llm = Arc::new(ScriptedLlm::routed(vec![
            ("short item name", "Glow Stone"),
            (
                "single, consistent DnD 5e item",
                r#"{"description": "A warm stone.", "rarity": "common", "magical": false}"#,
            ),
            ("better fitting name", "Hearthstone"),
        ]));
        let item = pipeline(llm.clone(), Arc::new(echo_store()), FixedRandom::new(1, false));

        let record = item
            .execute(&request("a warm stone"))
            .await
            .expect("item stored")
            .record;

        assert_eq!(record.name.as_str(), "Hearthstone");
        assert_eq!(record.category, ItemCategory::Equipment);
        assert_eq!(llm.calls_matching("better fitting name"), 1);
    }

    #[tokio::test]
    async fn test_category_hint_wins() {
        let llm = Arc::new(ScriptedLlm::routed(vec![(
            "single, consistent DnD 5e item",
            FROSTBRAND_ITEM,
        )]));
        let item = pipeline(llm, Arc::new(echo_store()), FixedRandom::new(1, false));
        let request = request("an icy sword").with_category_hint(Some(ItemCategory::Loot));

        let record = item.execute(&request).await.expect("item stored").record;

        assert_eq!(record.category, ItemCategory::Loot);
        assert_eq!(record.details, CategoryDetails::None);
    }

    #[tokio::test]
    async fn test_backend_down_still_creates_record() {
        let llm = Arc::new(FailingLlm::new(LlmError::RequestFailed("refused".into())));
        let item = pipeline(llm, Arc::new(echo_store()), FixedRandom::new(1, true));

        let record = item
            .execute(&request("a glowing ring"))
            .await
            .expect("item stored")
            .record;

        assert_eq!(record.name.as_str(), "Unnamed Ring");
        assert_eq!(record.description, DEFAULT_DESCRIPTION);
        assert_eq!(record.image, lootforge_domain::PLACEHOLDER_IMAGE);
        assert_eq!(record.category, ItemCategory::Equipment);
        assert!(!record.is_magical());
    }

    #[tokio::test]
    async fn test_store_failure_is_returned() {
        let mut store = MockDocumentStorePort::new();
        store
            .expect_create_item()
            .times(1)
            .returning(|_| Err(StoreError::write("create_item", "disk full")));
        let item = pipeline(
            Arc::new(ScriptedLlm::empty()),
            Arc::new(store),
            FixedRandom::new(1, false),
        );

        let result = item.execute(&request("a hat")).await;

        assert!(matches!(result, Err(GenerationError::Store(_))));
    }

    #[tokio::test]
    async fn test_generated_image_is_stored_and_linked() {
        let dir = tempfile::tempdir().expect("tempdir");
        let images = Arc::new(PlaceholderImageGen::new());
        let llm = Arc::new(ScriptedLlm::routed(vec![
            ("short item name", "Iron Blade"),
            ("single, consistent DnD 5e item", IRON_SWORD_ITEM),
        ]));
        let backend = Arc::new(BackendClient::new(
            llm,
            Some(images.clone()),
            Arc::new(FsAssetStore::new(dir.path())),
            Arc::new(SystemClock::new()),
            "lootforge",
        ));
        let item = pipeline_on(backend, Arc::new(echo_store()), FixedRandom::new(1, false));

        let record = item
            .execute(&request("a simple iron sword"))
            .await
            .expect("item stored")
            .record;

        assert_eq!(images.call_count(), 1);
        assert!(
            record.image.starts_with("lootforge/a_simple_iron_sword_"),
            "{}",
            record.image
        );
        assert!(dir.path().join(&record.image).is_file());
    }
}
