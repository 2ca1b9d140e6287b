//! Reading image attachments and saving generated images

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xylos_domain::{AvatarImage, DomainError, GeneratedImage, ImageAttachment, ImageMime};

#[derive(Error, Debug)]
pub enum ImageFileError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Read an image file into an attachment. The type comes from the extension.
pub fn read_attachment(path: &Path) -> Result<ImageAttachment, ImageFileError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let mime = ImageMime::from_extension(ext)?;
    let bytes = std::fs::read(path).map_err(|source| ImageFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImageAttachment::from_bytes(mime, &bytes))
}

/// Read a profile picture for upload.
pub fn read_avatar(path: &Path) -> Result<AvatarImage, ImageFileError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let bytes = std::fs::read(path).map_err(|source| ImageFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(AvatarImage::new(ext, bytes)?)
}

/// Where a generated image can be found after it has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocation {
    /// Inline image written to disk
    Saved(PathBuf),
    /// Remote image, printed as-is
    Remote(String),
}

/// Save an inline data-URL image under `dir`; remote URLs are passed through.
pub fn store_generated(
    image: &GeneratedImage,
    dir: &Path,
    stem: &str,
) -> Result<ImageLocation, ImageFileError> {
    let Some((mime, bytes)) = image.decode_data_url() else {
        return Ok(ImageLocation::Remote(image.image_url.clone()));
    };
    std::fs::create_dir_all(dir).map_err(|source| ImageFileError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    // Never overwrite an earlier image.
    let mut path = dir.join(format!("{}.{}", stem, mime.extension()));
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("{}-{}.{}", stem, n, mime.extension()));
        n += 1;
    }
    std::fs::write(&path, bytes).map_err(|source| ImageFileError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(ImageLocation::Saved(path))
}
