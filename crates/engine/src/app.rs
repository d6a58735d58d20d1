//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    asset_store::FsAssetStore,
    clock::{SystemClock, SystemRandom},
    config::{GeneratorConfig, PipelineConfig},
    document_store::JsonFileDocumentStore,
    image_client::HttpImageClient,
    llm_client::HttpLlmClient,
    ports::{AssetStorePort, ClockPort, DocumentStorePort, ImageGenPort, LlmPort, RandomPort},
    resilient_llm::{ResilientLlmClient, RetryPolicy},
};
use crate::repositories::BackendClient;
use crate::use_cases::generation::{
    consistency::CorrectionRule, ConsistencyResolver, GenerateItem, GenerateRollTable,
    GenerationUseCases, MagicAugmenter, NamingEngine, RecoveryEngine,
};

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub generation: GenerationUseCases,
}

/// Every external collaborator the pipeline talks to.
pub struct Ports {
    pub llm: Arc<dyn LlmPort>,
    /// `None` when no image backend is configured
    pub image_gen: Option<Arc<dyn ImageGenPort>>,
    pub assets: Arc<dyn AssetStorePort>,
    pub documents: Arc<dyn DocumentStorePort>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
}

impl App {
    /// Build the HTTP and filesystem adapters described by `config`.
    pub fn new(config: &GeneratorConfig) -> Self {
        if !config.text.is_usable() {
            tracing::warn!(
                provider = ?config.text.provider,
                "Text backend is not configured, every generated record will use defaults"
            );
        }

        let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());
        let retry_policy = RetryPolicy::with_max_retries(config.text.max_retries);
        tracing::info!(
            provider = ?config.text.provider,
            model = %config.text.model,
            max_retries = retry_policy.max_retries,
            base_delay_ms = retry_policy.base_delay_ms,
            "LLM client configured"
        );
        let llm: Arc<dyn LlmPort> = Arc::new(ResilientLlmClient::new(
            Arc::new(HttpLlmClient::new(&config.text)),
            retry_policy,
            random.clone(),
        ));

        let image_gen: Option<Arc<dyn ImageGenPort>> = if config.image.is_usable() {
            tracing::info!(provider = ?config.image.provider, "Image backend configured");
            Some(Arc::new(HttpImageClient::new(&config.image)))
        } else {
            tracing::info!("No usable image backend, items get the placeholder image");
            None
        };

        let ports = Ports {
            llm,
            image_gen,
            assets: Arc::new(FsAssetStore::new(&config.data_dir)),
            documents: Arc::new(JsonFileDocumentStore::new(&config.records_dir)),
            clock: Arc::new(SystemClock::new()),
            random,
        };
        Self::with_ports(ports, &config.pipeline)
    }

    /// Wire the pipeline around already-built ports.
    pub fn with_ports(ports: Ports, pipeline: &PipelineConfig) -> Self {
        let backend = Arc::new(BackendClient::new(
            ports.llm,
            ports.image_gen,
            ports.assets,
            ports.clock,
            pipeline.image_folder.clone(),
        ));

        let recovery = Arc::new(RecoveryEngine::new(backend.clone()));
        let item = Arc::new(GenerateItem::new(
            backend.clone(),
            recovery.clone(),
            Arc::new(NamingEngine::new(backend.clone())),
            Arc::new(ConsistencyResolver::new(
                backend.clone(),
                CorrectionRule::defaults(),
            )),
            Arc::new(MagicAugmenter::new(backend.clone(), ports.random.clone())),
            ports.documents.clone(),
            ports.random,
            pipeline.clone(),
        ));
        let table = Arc::new(GenerateRollTable::new(
            backend,
            recovery,
            item.clone(),
            ports.documents,
        ));

        Self {
            use_cases: UseCases {
                generation: GenerationUseCases::new(item, table),
            },
        }
    }
}
