//! Image generation port

use async_trait::async_trait;
use thiserror::Error;
use xylos_domain::{GeneratedImage, ImagePrompt};

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("No image returned")]
    NoImage,
}

/// Opaque text-to-image service.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &ImagePrompt) -> Result<GeneratedImage, ImageError>;
}
