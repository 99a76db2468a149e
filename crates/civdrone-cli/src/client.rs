//! HTTP client for the civdrone server API.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde_json::Value;

pub struct ServerClient {
    client: Client,
    base_url: String,
}

impl ServerClient {
    /// `base_url` is the server root, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("{url} returned {}: {text}", status.as_u16());
        }
        response
            .json()
            .await
            .context("Failed to parse server response")
    }
}
