//! Generator configuration.
//!
//! Read once from the environment at startup and passed into constructors.
//! Pipeline stages never look anything up themselves; changing a value means
//! building a new [`crate::App`].

use std::path::PathBuf;

/// Which wire protocol the text backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextProvider {
    /// `POST /v1/chat/completions`, bearer credential
    OpenAi,
    /// `POST /api/generate` on a local Ollama
    Ollama,
}

impl TextProvider {
    fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "ollama" => Self::Ollama,
            _ => Self::OpenAi,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4",
            Self::Ollama => "llama3.2",
        }
    }
}

/// Which image backend to use, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProvider {
    /// `POST /v1/images/generations` with `response_format = b64_json`
    OpenAi,
    /// Stable Diffusion WebUI `POST /sdapi/v1/txt2img`
    Automatic1111,
    None,
}

impl ImageProvider {
    fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "openai" | "dalle" | "dall-e" => Self::OpenAi,
            "automatic1111" | "a1111" | "stable-diffusion" => Self::Automatic1111,
            _ => Self::None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Automatic1111 => "http://localhost:7860",
            Self::None => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextBackendConfig {
    pub provider: TextProvider,
    pub base_url: String,
    pub model: String,
    /// Empty means "no credential"
    pub api_key: String,
    pub max_retries: u32,
}

impl TextBackendConfig {
    /// OpenAI needs a credential; Ollama only needs an endpoint.
    pub fn is_usable(&self) -> bool {
        if self.base_url.trim().is_empty() {
            return false;
        }
        match self.provider {
            TextProvider::OpenAi => !self.api_key.trim().is_empty(),
            TextProvider::Ollama => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageBackendConfig {
    pub provider: ImageProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl ImageBackendConfig {
    pub fn is_usable(&self) -> bool {
        match self.provider {
            ImageProvider::None => false,
            ImageProvider::OpenAi => {
                !self.base_url.trim().is_empty() && !self.api_key.trim().is_empty()
            }
            ImageProvider::Automatic1111 => !self.base_url.trim().is_empty(),
        }
    }
}

/// Feature toggles and tuning for the pipeline stages.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Chance that a rare-or-better, not explicitly magical record turns magical
    pub magic_probability: f64,
    pub augment_magic: bool,
    pub refine_names: bool,
    /// Folder (relative to the asset root) for generated images
    pub image_folder: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            magic_probability: 0.5,
            augment_magic: true,
            refine_names: true,
            image_folder: "lootforge".to_string(),
        }
    }
}

/// Everything the engine needs, resolved once.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub text: TextBackendConfig,
    pub image: ImageBackendConfig,
    pub pipeline: PipelineConfig,
    /// Root directory of the asset store
    pub data_dir: PathBuf,
    /// Directory of the JSON-file document store
    pub records_dir: PathBuf,
    pub server_host: String,
    pub server_port: u16,
}

impl GeneratorConfig {
    /// Build from process environment variables (after `.env` has been loaded).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; missing or malformed values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let text_provider = get("LOOTFORGE_TEXT_PROVIDER")
            .map(|v| TextProvider::from_env_value(&v))
            .unwrap_or(TextProvider::OpenAi);
        let api_key = get("LOOTFORGE_API_KEY").unwrap_or_default();

        let text = TextBackendConfig {
            provider: text_provider,
            base_url: get("LOOTFORGE_TEXT_BASE_URL")
                .unwrap_or_else(|| text_provider.default_base_url().to_string()),
            model: get("LOOTFORGE_TEXT_MODEL")
                .unwrap_or_else(|| text_provider.default_model().to_string()),
            api_key: api_key.clone(),
            max_retries: get("LOOTFORGE_LLM_MAX_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(2),
        };

        let image_provider = get("LOOTFORGE_IMAGE_PROVIDER")
            .map(|v| ImageProvider::from_env_value(&v))
            .unwrap_or(ImageProvider::OpenAi);
        let image = ImageBackendConfig {
            provider: image_provider,
            base_url: get("LOOTFORGE_IMAGE_BASE_URL")
                .unwrap_or_else(|| image_provider.default_base_url().to_string()),
            model: get("LOOTFORGE_IMAGE_MODEL").unwrap_or_else(|| "dall-e-3".to_string()),
            api_key: get("LOOTFORGE_IMAGE_API_KEY").unwrap_or(api_key),
        };

        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            magic_probability: get("LOOTFORGE_MAGIC_PROBABILITY")
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|p| (0.0..=1.0).contains(p))
                .unwrap_or(defaults.magic_probability),
            augment_magic: get("LOOTFORGE_AUGMENT_MAGIC")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.augment_magic),
            refine_names: get("LOOTFORGE_REFINE_NAMES")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.refine_names),
            image_folder: get("LOOTFORGE_IMAGE_FOLDER").unwrap_or(defaults.image_folder),
        };

        Self {
            text,
            image,
            pipeline,
            data_dir: get("LOOTFORGE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            records_dir: get("LOOTFORGE_RECORDS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("records")),
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: get("SERVER_PORT")
                .or_else(|| get("PORT"))
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(3000),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
