use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::models::SearchResult;

/// HTTP client backend that delegates searches to a running
/// `operadoras serve` daemon.
pub struct HttpSearchBackend {
    client: Client,
    base_url: String,
}

/// Error body returned by the server on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

impl HttpSearchBackend {
    /// Create a new HTTP backend targeting the given base URL
    /// (e.g. "http://127.0.0.1:5000").
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Execute a search via `GET /buscar?termo=<term>`, returning a
    /// deserialized `SearchResult`.
    pub fn search(&self, term: &str) -> Result<SearchResult> {
        let url = self.url_for("/buscar");
        let response = self
            .client
            .get(&url)
            .query(&[("termo", term)])
            .send()
            .with_context(|| format!("failed to send request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody {
                    error,
                    details: Some(details),
                }) => bail!("server returned {status}: {error} ({details})"),
                Ok(ErrorBody { error, .. }) => bail!("server returned {status}: {error}"),
                Err(_) => bail!("server returned {status} for {url}"),
            }
        }

        let value = response
            .json::<SearchResult>()
            .context("failed to decode JSON response from server")?;

        Ok(value)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
