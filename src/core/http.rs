use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

const APP_USER_AGENT: &str = "InterfaceOficial/0.1.0";

pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .timeout(timeout)
        .build()
}

/// GET `url` and return the body, failing on any non-2xx status.
pub async fn fetch_text(client: &Client, url: &str) -> LauncherResult<String> {
    debug!("GET {}", url);
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(LauncherError::DownloadFailed {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp.text().await?)
}

/// GET `url` and deserialize the body.
///
/// A body that does not match `T` is a validation error naming the URL,
/// not a transport error.
pub async fn fetch_json<T: DeserializeOwned>(client: &Client, url: &str) -> LauncherResult<T> {
    let body = fetch_text(client, url).await?;
    serde_json::from_str(&body).map_err(|e| LauncherError::InvalidDocument {
        source_name: url.to_string(),
        reason: e.to_string(),
    })
}
