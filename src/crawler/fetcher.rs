//! HTTP fetcher
//!
//! Transport-level page retrieval: given a URL, return the page text or a
//! classified failure. There is no retry logic at this layer; a failed
//! fetch abandons the entry for the rest of the run.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Classified fetch failure
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network, DNS, or TLS failure before a status line was received
    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success HTTP status
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },
}

/// Builds the HTTP client shared by all workers
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let user_agent = format!("linden/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and returns its body text
///
/// Follows redirects per the client's default policy. Non-success status
/// codes become `FetchError::HttpStatus`; connection, DNS, TLS, and timeout
/// failures become `FetchError::Transport`. A body read that dies mid-stream
/// is a transport failure too.
pub async fn fetch_page(client: &Client, url: &Url) -> Result<String, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })
}
