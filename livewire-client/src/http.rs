//! One-shot HTTP transport
//!
//! Each call is an independent POST of a JSON-RPC envelope (or batch array)
//! to the RPC endpoint. No connection state is kept beyond reqwest's pool.
//! A non-2xx status is an [`Error::Http`] carrying the status; an empty
//! body, which servers send for notification-only posts, is `None`.

use livewire_core::{codec, Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;

/// HTTP POST transport for JSON-RPC envelopes
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl HttpTransport {
    /// Create a transport posting to `url` with the given extra headers
    ///
    /// `Content-Type: application/json` is always sent. Invalid header
    /// names or values are rejected here rather than on every call.
    pub fn new(url: impl Into<String>, extra: &[(String, String)]) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidRequest(format!("header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidRequest(format!("header value for {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            url: url.into(),
            headers,
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST a pre-encoded body and return the parsed reply body, if any
    pub async fn post(&self, body: String) -> Result<Option<Value>> {
        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Http {
                status: None,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: Some(status.as_u16()),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let text = response.text().await.map_err(|e| Error::Http {
            status: Some(status.as_u16()),
            reason: e.to_string(),
        })?;

        if text.trim().is_empty() {
            return Ok(None);
        }
        codec::decode_value(&text).map(Some)
    }
}
