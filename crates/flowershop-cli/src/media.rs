//! Checks on the uploaded-media directory.

use std::path::Path;

use clap::Subcommand;
use flowershop_core::urls::is_media_relative;
use flowershop_core::AppConfig;

/// Sub-commands available under `media`.
#[derive(Debug, Subcommand)]
pub enum MediaCommands {
    /// Verify the media root and report uploads and gallery images missing on disk
    Check,
}

pub(crate) async fn run(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: MediaCommands,
) -> anyhow::Result<()> {
    match command {
        MediaCommands::Check => check(pool, config).await,
    }
}

const WRITE_CHECK_FILE: &str = ".flowershop-write-check";

/// Writes and removes a scratch file so permission problems surface before the
/// first bot upload does.
async fn ensure_writable(root: &Path) -> anyhow::Result<()> {
    let scratch = root.join(WRITE_CHECK_FILE);
    tokio::fs::write(&scratch, b"ok").await.map_err(|e| {
        anyhow::anyhow!("media root {} is not writable: {e}", root.display())
    })?;
    tokio::fs::remove_file(&scratch).await?;
    Ok(())
}

/// Media-relative paths that are recorded but absent. Empty values and legacy
/// URLs are skipped.
pub(crate) async fn missing_files<'a, I>(root: &Path, recorded: I) -> Vec<(i64, &'a str)>
where
    I: IntoIterator<Item = (i64, &'a str)>,
{
    let mut missing = Vec::new();
    for (id, relative) in recorded {
        if !is_media_relative(relative) {
            continue;
        }
        if !tokio::fs::try_exists(root.join(relative))
            .await
            .unwrap_or(false)
        {
            missing.push((id, relative));
        }
    }
    missing
}

async fn check(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let root = &config.media_root;
    let metadata = tokio::fs::metadata(root).await.map_err(|e| {
        anyhow::anyhow!("media root {} is not accessible: {e}", root.display())
    })?;
    if !metadata.is_dir() {
        anyhow::bail!("media root {} is not a directory", root.display());
    }
    ensure_writable(root).await?;
    println!("media root {} ok", root.display());

    let products = flowershop_db::list_all_products(pool).await?;
    let uploads = products
        .iter()
        .filter_map(|p| p.uploaded_image.as_deref().map(|path| (p.id, path)));
    let missing_uploads = missing_files(root, uploads).await;

    let gallery = flowershop_db::list_all_product_images(pool).await?;
    let missing_gallery = missing_files(
        root,
        gallery.iter().map(|img| (img.product_id, img.image.as_str())),
    )
    .await;

    if missing_uploads.is_empty() && missing_gallery.is_empty() {
        println!("all uploaded and gallery images present");
        return Ok(());
    }
    for (id, path) in &missing_uploads {
        println!("product {id}: missing upload {path}");
    }
    for (id, path) in &missing_gallery {
        println!("product {id}: missing gallery image {path}");
    }
    tracing::warn!(
        uploads = missing_uploads.len(),
        gallery = missing_gallery.len(),
        "images missing on disk"
    );
    println!(
        "{} uploaded and {} gallery images missing",
        missing_uploads.len(),
        missing_gallery.len()
    );
    Ok(())
}
