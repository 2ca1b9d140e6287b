//! Image generation over the `ai-generate-image` edge function.

use super::client::BackendClient;
use super::error::{image_send_error, rejection_message};
use async_trait::async_trait;
use serde::Deserialize;
use xylos_application::{ImageError, ImageGenerator};
use xylos_domain::{GeneratedImage, ImagePrompt};

const FUNCTION: &str = "ai-generate-image";
const FALLBACK_ERROR: &str = "Failed to generate image";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    image_url: Option<String>,
}

pub struct HttpImageGenerator {
    client: BackendClient,
}

impl HttpImageGenerator {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, prompt: &ImagePrompt) -> Result<GeneratedImage, ImageError> {
        let response = self
            .client
            .function(FUNCTION)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(image_send_error)?;

        let status = response.status();
        let body = response.text().await.map_err(image_send_error)?;
        if !status.is_success() {
            return Err(ImageError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body, FALLBACK_ERROR),
            });
        }

        let parsed: ImageResponse =
            serde_json::from_str(&body).map_err(|_| ImageError::NoImage)?;
        match parsed.image_url {
            Some(image_url) if !image_url.is_empty() => Ok(GeneratedImage { image_url }),
            _ => Err(ImageError::NoImage),
        }
    }
}
