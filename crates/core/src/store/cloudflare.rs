//! Cloudflare Workers KV mapping store, reached over the REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use filerelay_shared::config::CloudflareKvConfig;

use super::{MappingStore, StoreError};

/// Smallest `expiration_ttl` KV accepts.
const MIN_EXPIRATION_TTL: u64 = 60;

/// Longest key KV accepts, in bytes.
const MAX_KEY_BYTES: usize = 512;

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

/// Workers KV namespace client.
pub struct CloudflareKvStore {
    client: Client,
    values_url: Url,
    api_token: String,
    expiration_ttl: Option<u64>,
}

impl CloudflareKvStore {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &CloudflareKvConfig) -> Result<Self, StoreError> {
        let values_url = Url::parse(&format!(
            "{}/accounts/{}/storage/kv/namespaces/{}/values",
            config.api_base_url.trim_end_matches('/'),
            config.account_id,
            config.namespace_id
        ))
        .map_err(|e| StoreError::Configuration(e.to_string()))?;
        if values_url.cannot_be_a_base() {
            return Err(StoreError::Configuration(
                "api_base_url must be an http(s) URL".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| StoreError::Configuration(e.without_url().to_string()))?;

        Ok(Self {
            client,
            values_url,
            api_token: config.api_token.clone(),
            expiration_ttl: config
                .expiration_ttl_secs
                .map(|ttl| ttl.max(MIN_EXPIRATION_TTL)),
        })
    }

    /// URL of a single value; the key is percent-encoded as one path segment.
    fn value_url(&self, key: &str) -> Result<Url, StoreError> {
        if key.is_empty() || key.len() > MAX_KEY_BYTES || key == "." || key == ".." {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        let mut url = self.values_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Configuration("base URL cannot hold a path".to_string()))?
            .push(key);
        Ok(url)
    }

    async fn api_error(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = match response.json::<ApiEnvelope>().await {
            Ok(envelope) if !envelope.errors.is_empty() => envelope
                .errors
                .iter()
                .map(|e| format!("{} {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; "),
            _ => "no error detail".to_string(),
        };
        StoreError::api(status, message)
    }
}

#[async_trait]
impl MappingStore for CloudflareKvStore {
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut request = self
            .client
            .put(self.value_url(key)?)
            .bearer_auth(&self.api_token)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(value.to_string());
        if let Some(ttl) = self.expiration_ttl {
            request = request.query(&[("expiration_ttl", ttl)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        debug!(key, "Mapping written to Workers KV");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let response = self
            .client
            .get(self.value_url(key)?)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.text().await?)),
            _ => Err(Self::api_error(response).await),
        }
    }

    fn name(&self) -> &'static str {
        "cloudflare"
    }
}
