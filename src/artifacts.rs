use std::path::Path;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use tokio::fs;
use tracing::info;

use crate::error::{Error, Result};

/// Makes sure `path` exists, downloading it from `url` when it does not.
pub async fn ensure_artifact(
    client: &Client,
    path: &Path,
    url: Option<&str>,
    token: Option<&str>,
) -> Result<()> {
    if fs::try_exists(path).await? {
        return Ok(());
    }

    let Some(url) = url else {
        return Err(Error::MissingArtifact(path.to_path_buf()));
    };
    download(client, url, path, token).await
}

async fn download(client: &Client, url: &str, path: &Path, token: Option<&str>) -> Result<()> {
    info!(%url, path = %path.display(), "downloading artifact");

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));
    if let Some(token) = token {
        // an unusable token is skipped rather than failing the download
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, value);
        }
    }

    let response = client.get(url).headers(headers).send().await?;
    if !response.status().is_success() {
        return Err(Error::Download {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    let bytes = response.bytes().await?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, &bytes).await?;

    info!(path = %path.display(), bytes = bytes.len(), "artifact saved");
    Ok(())
}
