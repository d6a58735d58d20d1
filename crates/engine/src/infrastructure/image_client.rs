//! Image generation client
//!
//! Implements the ImageGenPort trait against OpenAI's image endpoint or a
//! Stable Diffusion WebUI (Automatic1111). Both return base64 payloads.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::infrastructure::config::{ImageBackendConfig, ImageProvider};
use crate::infrastructure::ports::{ImageGenError, ImageGenPort, ImageRequest, ImageResult};

/// Client for a configured image backend
#[derive(Clone)]
pub struct HttpImageClient {
    client: Client,
    provider: ImageProvider,
    base_url: String,
    model: String,
    api_key: String,
}

impl HttpImageClient {
    pub fn new(config: &ImageBackendConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // 5 minute timeout for generation
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            provider: config.provider,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.trim().to_string(),
        }
    }

    async fn generate_openai(&self, request: &ImageRequest) -> Result<String, ImageGenError> {
        if self.api_key.is_empty() {
            return Err(ImageGenError::Unavailable);
        }

        let body = OpenAIImageRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            n: 1,
            size: format!("{}x{}", request.width, request.height),
            response_format: "b64_json",
        };

        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ImageGenError::GenerationFailed(error_text));
        }

        let parsed: OpenAIImageResponse = response
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        first_openai_image(parsed)
    }

    async fn generate_automatic1111(
        &self,
        request: &ImageRequest,
    ) -> Result<String, ImageGenError> {
        let body = Txt2ImgRequest {
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            width: request.width,
            height: request.height,
            steps: 25,
        };

        let response = self
            .client
            .post(format!("{}/sdapi/v1/txt2img", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ImageGenError::GenerationFailed(error_text));
        }

        let parsed: Txt2ImgResponse = response
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        first_txt2img(parsed)
    }
}

#[async_trait]
impl ImageGenPort for HttpImageClient {
    async fn generate(&self, request: ImageRequest) -> Result<ImageResult, ImageGenError> {
        if self.base_url.is_empty() {
            return Err(ImageGenError::Unavailable);
        }

        let encoded = match self.provider {
            ImageProvider::OpenAi => self.generate_openai(&request).await?,
            ImageProvider::Automatic1111 => self.generate_automatic1111(&request).await?,
            ImageProvider::None => return Err(ImageGenError::Unavailable),
        };

        let image_data = decode_payload(&encoded)?;
        tracing::debug!(bytes = image_data.len(), "Decoded generated image");

        Ok(ImageResult {
            image_data,
            format: "png".to_string(),
        })
    }
}

/// The first entry's `b64_json`. URL-only entries count as missing since the
/// request asks for inline payloads.
fn first_openai_image(response: OpenAIImageResponse) -> Result<String, ImageGenError> {
    response
        .data
        .into_iter()
        .next()
        .and_then(|d| d.b64_json)
        .filter(|payload| !payload.trim().is_empty())
        .ok_or_else(no_image_data)
}

fn first_txt2img(response: Txt2ImgResponse) -> Result<String, ImageGenError> {
    response
        .images
        .into_iter()
        .next()
        .filter(|payload| !payload.trim().is_empty())
        .ok_or_else(no_image_data)
}

fn no_image_data() -> ImageGenError {
    ImageGenError::GenerationFailed("No image data returned".to_string())
}

/// Decode a base64 image payload, tolerating a `data:image/...;base64,` prefix.
fn decode_payload(encoded: &str) -> Result<Vec<u8>, ImageGenError> {
    let raw = match encoded.split_once("base64,") {
        Some((_, rest)) => rest,
        None => encoded,
    };
    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|e| ImageGenError::Decode(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ImageGenError::Decode("empty payload".to_string()));
    }
    Ok(bytes)
}

// API types

#[derive(Debug, Serialize)]
struct OpenAIImageRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAIImageResponse {
    #[serde(default)]
    data: Vec<OpenAIImageData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIImageData {
    b64_json: Option<String>,
}

#[derive(Debug, Serialize)]
struct Txt2ImgRequest {
    prompt: String,
    negative_prompt: String,
    width: u32,
    height: u32,
    steps: u32,
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
}
