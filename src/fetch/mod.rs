// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::path::Path;
use tokio::fs;
use tracing::info;
use url::Url;

/// Single GET of `url` into `dest`; no retries. Parent directories are
/// created. Returns the number of bytes written.
pub async fn download_doc(client: &Client, url: &str, dest: impl AsRef<Path>) -> Result<u64> {
    let dest = dest.as_ref();
    let url = Url::parse(url.trim()).with_context(|| format!("parsing URL {url}"))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let resp = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("GET {url}"))?
        .error_for_status()?;
    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("reading body from {url}"))?;
    fs::write(dest, &bytes)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;

    info!(url = %url, path = %dest.display(), bytes = bytes.len(), "downloaded");
    Ok(bytes.len() as u64)
}
