use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use reqwest::{
    Client,
    Response,
};
use tracing::debug;

use super::{
    GermankiError,
    MediaError,
};

const AGENT: &str = concat!("germanki/", env!("CARGO_PKG_VERSION"), " (+reqwest)");

pub fn http_client(timeout: Duration) -> Result<Client, GermankiError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(AGENT)
        .build()
        .map_err(|e| GermankiError::Custom(format!("HTTP client build failed: {e}")))
}

/// GETs `url` and writes the body to `path`. Nothing is written unless the
/// server answered with a success status and the whole body arrived.
pub async fn download_to_file(client: &Client, url: &str, path: &Path) -> Result<(), MediaError> {
    let download_error =
        |message: String| MediaError::Download { url: url.to_string(), message };

    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| download_error(e.to_string()))?;

    ensure_success(&resp).map_err(download_error)?;

    let bytes = resp.bytes().await.map_err(|e| download_error(e.to_string()))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| MediaError::Write { path: parent.to_path_buf(), source })?;
    }
    let partial = partial_path(path);
    if let Err(source) = tokio::fs::write(&partial, &bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(MediaError::Write { path: partial, source });
    }
    if let Err(source) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(MediaError::Write { path: path.to_path_buf(), source });
    }

    debug!(url, path = %path.display(), bytes = bytes.len(), "Downloaded media");
    Ok(())
}

/// Sibling the body is written to before it is moved onto `path`.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

fn ensure_success(resp: &Response) -> Result<(), String> {
    if !resp.status().is_success() {
        return Err(format!("HTTP error {} from {}", resp.status(), resp.url()));
    }
    Ok(())
}
