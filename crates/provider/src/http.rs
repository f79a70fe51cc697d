//! Shared HTTP plumbing for the provider adapters.

use crate::chat::preview;
use serde::Serialize;
use slidegen_core::{Error, Result};
use std::time::Duration;

/// Build a client that enforces `timeout` on every request.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))
}

/// POST a JSON body and return the status and body of a successful reply.
///
/// Transport failures and non-2xx answers become `ProviderError`.
pub(crate) async fn post_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    body: &T,
    bearer: Option<&str>,
    timeout: Duration,
) -> Result<(u16, String)> {
    log::debug!("POST {}", url);

    let mut request = client.post(url).json(body);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let response = request.send().await.map_err(|e| transport_error(url, timeout, e))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| transport_error(url, timeout, e))?;

    if !status.is_success() {
        log::warn!("{} answered {}", url, status);
        return Err(Error::provider(
            Some(status.as_u16()),
            format!("Backend returned {}: {}", status, preview(&text)),
        ));
    }

    Ok((status.as_u16(), text))
}

fn transport_error(url: &str, timeout: Duration, error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::provider(
            None,
            format!("Request to {} timed out after {}s", url, timeout.as_secs_f32()),
        )
    } else {
        Error::provider(
            error.status().map(|s| s.as_u16()),
            format!("Request to {} failed: {}", url, error),
        )
    }
}
