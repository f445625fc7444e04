//! Repository preparation for GitHub Pages hosting.
//!
//! Run once before the first migration (`--bootstrap`): makes sure the
//! images directory exists and that the site root serves a landing page
//! instead of a 404.

use tracing::{info, instrument};

use super::{ASSET_DIR, AssetPublisher, PublishAction, PublishError};

/// Placeholder file that keeps an otherwise empty directory in git.
pub const PLACEHOLDER_NAME: &str = ".gitkeep";

/// Path of the landing page at the site root.
pub const LANDING_PAGE_PATH: &str = "index.html";

const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Product Image Hosting</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; }
        h1 { color: #333; }
    </style>
</head>
<body>
    <h1>Product Image Hosting</h1>
    <p>This site hosts product images for Shopify import.</p>
</body>
</html>
"#;

/// Creates `images/.gitkeep` when it is missing.
///
/// Returns `true` when the placeholder was created, `false` when it was
/// already there.
///
/// # Errors
///
/// Returns [`PublishError`] from the underlying store.
#[instrument(skip(publisher))]
pub async fn ensure_asset_directory(publisher: &AssetPublisher) -> Result<bool, PublishError> {
    let path = format!("{ASSET_DIR}/{PLACEHOLDER_NAME}");
    let store = publisher.store();
    if store.lookup(&path).await?.is_some() {
        return Ok(false);
    }
    store
        .create(&path, &format!("Create {ASSET_DIR} directory"), b"")
        .await?;
    info!(path = %path, "created asset directory placeholder");
    Ok(true)
}

/// Creates or refreshes the landing page at the site root.
///
/// # Errors
///
/// Returns [`PublishError`] from the underlying store.
#[instrument(skip(publisher))]
pub async fn publish_landing_page(publisher: &AssetPublisher) -> Result<PublishAction, PublishError> {
    let action = publisher
        .upsert(
            LANDING_PAGE_PATH,
            &format!("Publish {LANDING_PAGE_PATH}"),
            LANDING_PAGE.as_bytes(),
        )
        .await?;
    info!(
        url = %publisher.site().public_url(LANDING_PAGE_PATH),
        ?action,
        "landing page published"
    );
    Ok(action)
}
