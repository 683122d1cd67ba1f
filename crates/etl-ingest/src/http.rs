//! HTTP helpers for the scraping jobs

use etl_common::{EtlError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("course-etl/", env!("CARGO_PKG_VERSION"));

/// Client with the job user agent and a request timeout
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| EtlError::network(format!("Failed to build HTTP client: {}", e)))
}

/// GET `url` and return the body as text
///
/// A non-success status is an error, so an archive's 404 page is never parsed
/// as data.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    debug!(url, "Fetching");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| EtlError::network(format!("GET {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EtlError::network(format!("GET {} returned {}", url, status)));
    }

    let body = response
        .text()
        .await
        .map_err(|e| EtlError::network(format!("Failed to read body of {}: {}", url, e)))?;

    debug!(url, bytes = body.len(), "Fetched");
    Ok(body)
}
