//! Mock image generation for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::infrastructure::ports::{ImageGenError, ImageGenPort, ImageRequest, ImageResult};

/// PNG signature only. Enough for storage tests.
const PLACEHOLDER_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Image generator that returns the same placeholder bytes for every prompt.
pub struct PlaceholderImageGen {
    call_count: AtomicUsize,
}

impl PlaceholderImageGen {
    pub fn new() -> Self {
        Self {
            call_count: AtomicUsize::new(0),
        }
    }

    /// Get the number of generate calls made.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Default for PlaceholderImageGen {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenPort for PlaceholderImageGen {
    async fn generate(&self, _request: ImageRequest) -> Result<ImageResult, ImageGenError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(ImageResult {
            image_data: PLACEHOLDER_PNG.to_vec(),
            format: "png".to_string(),
        })
    }
}
