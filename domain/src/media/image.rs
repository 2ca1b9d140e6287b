//! Image value objects: attachments sent with chat messages and
//! prompts/results of image generation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::conversation::entities::UserId;
use crate::core::error::DomainError;

/// Image types accepted as chat attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Gif => "image/gif",
            ImageMime::Webp => "image/webp",
        }
    }

    /// Resolve a mime type from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Result<Self, DomainError> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageMime::Png),
            "jpg" | "jpeg" => Ok(ImageMime::Jpeg),
            "gif" => Ok(ImageMime::Gif),
            "webp" => Ok(ImageMime::Webp),
            other => Err(DomainError::UnsupportedImageType(other.to_string())),
        }
    }
}

impl ImageMime {
    fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageMime::Png),
            "image/jpeg" | "image/jpg" => Some(ImageMime::Jpeg),
            "image/gif" => Some(ImageMime::Gif),
            "image/webp" => Some(ImageMime::Webp),
            _ => None,
        }
    }

    /// File extension used when saving an image of this type.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageMime::Png => "png",
            ImageMime::Jpeg => "jpg",
            ImageMime::Gif => "gif",
            ImageMime::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image attached to the next outgoing message, encoded as a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    mime: ImageMime,
    data_url: String,
    byte_len: usize,
}

impl ImageAttachment {
    pub fn from_bytes(mime: ImageMime, bytes: &[u8]) -> Self {
        let data_url = format!("data:{};base64,{}", mime.as_str(), STANDARD.encode(bytes));
        Self {
            mime,
            data_url,
            byte_len: bytes.len(),
        }
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Size of the original image in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

/// Profile picture uploaded at sign-up.
///
/// Stored as `{user_id}.{extension}`, keeping the extension of the file the
/// user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarImage {
    mime: ImageMime,
    extension: String,
    bytes: Vec<u8>,
}

impl AvatarImage {
    pub fn new(extension: &str, bytes: Vec<u8>) -> Result<Self, DomainError> {
        let mime = ImageMime::from_extension(extension)?;
        Ok(Self {
            mime,
            extension: extension.to_ascii_lowercase(),
            bytes,
        })
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Object name in the avatar bucket.
    pub fn object_name(&self, owner: &UserId) -> String {
        format!("{}.{}", owner, self.extension)
    }
}

/// A validated image generation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImagePrompt(String);

impl ImagePrompt {
    pub fn new(prompt: impl Into<String>) -> Result<Self, DomainError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(DomainError::EmptyPrompt);
        }
        Ok(Self(prompt))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImagePrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of image generation.
///
/// `image_url` is either a regular URL or an inline `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub image_url: String,
}

impl GeneratedImage {
    /// Decode an inline base64 `data:` URL. Returns `None` for regular URLs
    /// and for data URLs that are not base64 images.
    pub fn decode_data_url(&self) -> Option<(ImageMime, Vec<u8>)> {
        let rest = self.image_url.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        let mime = ImageMime::from_mime(mime)?;
        let bytes = STANDARD.decode(payload.trim()).ok()?;
        Some((mime, bytes))
    }
}
