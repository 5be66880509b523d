//! Storage of uploaded product images beneath the media root.

use std::path::Path;

use flowershop_core::AppConfig;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Directory under the media root that product uploads land in.
pub const PRODUCT_UPLOAD_DIR: &str = "products";

/// Hex characters of the content hash kept in the file name.
const HASH_PREFIX_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("upload is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("upload is empty")]
    Empty,
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// An upload written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Path relative to the media root, e.g. `products/ab12….jpg`.
    pub relative_path: String,
    /// Absolute URL the file is served at.
    pub absolute_url: String,
    /// Whether this upload wrote the file. A file that was already present
    /// may belong to another product.
    pub created: bool,
}

/// File extension for an image content type; unknown types are stored as jpg.
#[must_use]
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());
    match essence.as_deref() {
        Some("image/png") => "png",
        Some("image/webp") => "webp",
        Some("image/gif") => "gif",
        _ => "jpg",
    }
}

/// Content-addressed relative path for an upload.
#[must_use]
pub fn content_path(bytes: &[u8], content_type: Option<&str>) -> String {
    let digest = format!("{:x}", Sha256::digest(bytes));
    format!(
        "{PRODUCT_UPLOAD_DIR}/{}.{}",
        &digest[..HASH_PREFIX_LEN],
        extension_for(content_type)
    )
}

/// Absolute public URL of a media-relative path.
#[must_use]
pub fn absolute_media_url(config: &AppConfig, relative: &str) -> String {
    format!(
        "{}{}",
        config.public_base_url.trim_end_matches('/'),
        flowershop_core::urls::media_url(&config.media_url, relative)
    )
}

/// Writes a product image under the media root. Identical content maps to the
/// same file, so re-uploads are idempotent.
///
/// # Errors
///
/// Returns [`MediaError::TooLarge`] over the configured limit,
/// [`MediaError::Empty`] for an empty body, or [`MediaError::Io`] when the
/// file cannot be written.
pub async fn store_product_image(
    config: &AppConfig,
    bytes: &[u8],
    content_type: Option<&str>,
) -> Result<StoredMedia, MediaError> {
    if bytes.is_empty() {
        return Err(MediaError::Empty);
    }
    if bytes.len() > config.max_upload_bytes {
        return Err(MediaError::TooLarge {
            size: bytes.len(),
            limit: config.max_upload_bytes,
        });
    }

    let relative_path = content_path(bytes, content_type);
    let target = config.media_root.join(&relative_path);
    let created = write_file(&target, bytes).await?;

    tracing::info!(path = %relative_path, size = bytes.len(), created, "stored product image");

    Ok(StoredMedia {
        absolute_url: absolute_media_url(config, &relative_path),
        relative_path,
        created,
    })
}

/// Removes an upload whose product could not be saved. Files that existed
/// before the upload are left alone.
pub async fn discard_product_image(media_root: &Path, stored: &StoredMedia) {
    if !stored.created || stored.relative_path.is_empty() {
        return;
    }
    let target = media_root.join(&stored.relative_path);
    match tokio::fs::remove_file(&target).await {
        Ok(()) => tracing::info!(path = %stored.relative_path, "discarded orphaned upload"),
        Err(e) => tracing::warn!(
            path = %stored.relative_path,
            error = %e,
            "failed to discard orphaned upload"
        ),
    }
}

/// Writes `bytes` unless the file already exists. Returns whether it wrote.
async fn write_file(target: &Path, bytes: &[u8]) -> Result<bool, MediaError> {
    let io_err = |source| MediaError::Io {
        path: target.display().to_string(),
        source,
    };
    if tokio::fs::try_exists(target).await.map_err(io_err)? {
        return Ok(false);
    }
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(target, bytes).await.map_err(io_err)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_follows_content_type() {
        assert_eq!(extension_for(Some("image/png")), "png");
        assert_eq!(extension_for(Some("IMAGE/WEBP")), "webp");
        assert_eq!(extension_for(Some("image/gif; charset=binary")), "gif");
        assert_eq!(extension_for(Some("image/jpeg")), "jpg");
        assert_eq!(extension_for(Some("application/octet-stream")), "jpg");
        assert_eq!(extension_for(None), "jpg");
    }

    #[test]
    fn content_path_is_stable_and_prefixed() {
        let a = content_path(b"rose", Some("image/png"));
        let b = content_path(b"rose", Some("image/png"));
        assert_eq!(a, b);
        assert!(a.starts_with("products/"));
        assert!(a.ends_with(".png"));
        assert_eq!(a.len(), "products/".len() + HASH_PREFIX_LEN + ".png".len());
        assert_ne!(a, content_path(b"tulip", Some("image/png")));
    }

    fn temp_root(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("flowershop-media-{tag}-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn discard_removes_only_files_this_upload_wrote() {
        let root = temp_root("discard");
        let relative = content_path(b"peony", Some("image/jpeg"));
        let target = root.join(&relative);

        assert!(write_file(&target, b"peony").await.expect("first write"));
        assert!(!write_file(&target, b"peony").await.expect("second write"));

        let shared = StoredMedia {
            relative_path: relative.clone(),
            absolute_url: String::new(),
            created: false,
        };
        discard_product_image(&root, &shared).await;
        assert!(target.exists(), "pre-existing file must survive");

        let fresh = StoredMedia {
            created: true,
            ..shared
        };
        discard_product_image(&root, &fresh).await;
        assert!(!target.exists());

        std::fs::remove_dir_all(&root).ok();
    }
}
