//! Backend client - the one place generation calls go out.
//!
//! Wraps the text and image ports and absorbs their failures: callers always
//! get a value (possibly empty) and a `warn!` is logged instead of an error.

use std::sync::Arc;

use crate::infrastructure::ports::{
    AssetStorePort, ChatMessage, ClockPort, ImageGenPort, ImageRequest, ImageResult, LlmPort,
    LlmRequest,
};

/// Appended to every image prompt.
const IMAGE_STYLE: &str = "fantasy item illustration, centered, detailed, painterly";

/// Negative prompt for backends that accept one.
const IMAGE_EXCLUSIONS: &str = "text, letters, watermark, signature, blurry, frame";

const IMAGE_SIZE: u32 = 1024;

/// Longest filename stem derived from a prompt.
const MAX_SLUG_LENGTH: usize = 64;

pub struct BackendClient {
    llm: Arc<dyn LlmPort>,
    image_gen: Option<Arc<dyn ImageGenPort>>,
    assets: Arc<dyn AssetStorePort>,
    clock: Arc<dyn ClockPort>,
    image_folder: String,
}

impl BackendClient {
    pub fn new(
        llm: Arc<dyn LlmPort>,
        image_gen: Option<Arc<dyn ImageGenPort>>,
        assets: Arc<dyn AssetStorePort>,
        clock: Arc<dyn ClockPort>,
        image_folder: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            image_gen,
            assets,
            clock,
            image_folder: image_folder.into(),
        }
    }

    /// One system + user exchange. Returns the trimmed completion, or `""`
    /// when the backend is missing, unreachable or returns nothing.
    pub async fn generate_text(&self, system: &str, user: &str, max_tokens: u32) -> String {
        let request = LlmRequest::new(vec![ChatMessage::user(user)])
            .with_system_prompt(system)
            .with_max_tokens(Some(max_tokens));

        match self.llm.generate(request).await {
            Ok(response) => response.content.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, max_tokens, "Text generation failed, using empty result");
                String::new()
            }
        }
    }

    /// Render an item image. `None` when no image backend is configured or it fails.
    pub async fn generate_image(&self, prompt: &str) -> Option<ImageResult> {
        let image_gen = self.image_gen.as_ref()?;
        let request = ImageRequest {
            prompt: format!(
                "Generate an image for a DnD 5e item with these details: {}. \
                 Do not include any text in the image. {}",
                prompt, IMAGE_STYLE
            ),
            negative_prompt: IMAGE_EXCLUSIONS.to_string(),
            width: IMAGE_SIZE,
            height: IMAGE_SIZE,
        };

        match image_gen.generate(request).await {
            Ok(image) if !image.image_data.is_empty() => Some(image),
            Ok(_) => {
                tracing::warn!("Image backend returned no data");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Image generation failed, continuing without image");
                None
            }
        }
    }

    /// Generate an image and persist it. Returns the stored path, or `""` if
    /// any step failed.
    pub async fn generate_and_store_image(&self, prompt: &str) -> String {
        let Some(image) = self.generate_image(prompt).await else {
            return String::new();
        };

        let filename = format!(
            "{}_{}.{}",
            slugify(prompt),
            self.clock.now().timestamp_millis(),
            image.format
        );
        let folder = self.image_folder.as_str();

        // Creation failure usually means the folder already exists; the check below decides.
        if let Err(e) = self.assets.ensure_folder(folder).await {
            tracing::warn!(folder, error = %e, "Folder creation failed");
        }
        match self.assets.folder_exists(folder).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(folder, "Folder missing after creation attempt"),
            Err(e) => tracing::warn!(folder, error = %e, "Folder check failed"),
        }

        match self.assets.upload(folder, &filename, &image.image_data).await {
            Ok(path) => {
                tracing::info!(path = %path, "Stored generated image");
                path
            }
            Err(e) => {
                tracing::warn!(filename = %filename, error = %e, "Image upload failed");
                String::new()
            }
        }
    }
}

/// Lower-case, whitespace runs become `_`, anything outside `[a-z0-9_-]` is dropped.
pub fn slugify(prompt: &str) -> String {
    let joined = prompt
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    let slug: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_SLUG_LENGTH)
        .collect();
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}
