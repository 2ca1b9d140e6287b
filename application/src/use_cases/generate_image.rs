//! Generate Image use case.

use crate::ports::image_generator::{ImageError, ImageGenerator};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use xylos_domain::{DomainError, GeneratedImage, ImagePrompt};

#[derive(Error, Debug)]
pub enum GenerateImageError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

pub struct GenerateImageUseCase {
    generator: Arc<dyn ImageGenerator>,
}

impl GenerateImageUseCase {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self { generator }
    }

    pub async fn execute(&self, prompt: &str) -> Result<GeneratedImage, GenerateImageError> {
        let prompt = ImagePrompt::new(prompt)?;
        info!("Generating image for prompt: {}", prompt);
        Ok(self.generator.generate(&prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGenerator {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ImageGenerator for FakeGenerator {
        async fn generate(&self, prompt: &ImagePrompt) -> Result<GeneratedImage, ImageError> {
            self.prompts.lock().unwrap().push(prompt.as_str().to_string());
            if self.fail {
                return Err(ImageError::NoImage);
            }
            Ok(GeneratedImage {
                image_url: "https://img.example/1.png".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_generates_image() {
        let generator = Arc::new(FakeGenerator::default());
        let use_case = GenerateImageUseCase::new(generator.clone());

        let image = use_case.execute("a red fox").await.unwrap();

        assert_eq!(image.image_url, "https://img.example/1.png");
        assert_eq!(*generator.prompts.lock().unwrap(), vec!["a red fox"]);
    }

    #[tokio::test]
    async fn test_blank_prompt_never_reaches_generator() {
        let generator = Arc::new(FakeGenerator::default());
        let use_case = GenerateImageUseCase::new(generator.clone());

        let err = use_case.execute("  ").await.unwrap_err();

        assert!(matches!(err, GenerateImageError::Domain(DomainError::EmptyPrompt)));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generator_error_is_surfaced() {
        let generator = Arc::new(FakeGenerator {
            fail: true,
            ..Default::default()
        });
        let use_case = GenerateImageUseCase::new(generator);

        let err = use_case.execute("sunset").await.unwrap_err();

        assert_eq!(err.to_string(), "No image returned");
    }
}
