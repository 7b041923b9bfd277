//! Registry HTTP client
//!
//! Thin, stateless request layer over the account registry. The contract the
//! rest of the bot relies on: any HTTP status the registry legitimately
//! returns (200/404/409/...) comes back as data in [`ApiResponse`], never as
//! an `Err`. Only transport failures (connect, timeout, read) fail the call.
//! Retry policy deliberately does not exist here; callers map failures to
//! their own outcome and report them.

pub mod types;

use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::errors::ApiError;

/// Per-request timeout. Interactions that may outlive the platform reply
/// deadline defer first, so a slow registry only risks the deadline of the
/// non-deferred paths.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One registry response: the status code plus the undecoded body.
///
/// Body decoding is lazy so that statuses whose bodies are never inspected
/// (404s with empty or HTML bodies, for instance) cannot fail the call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Bytes) -> Self {
        Self { status, body }
    }

    /// Decodes the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(ApiError::Decode)
    }

    /// Decodes the body as a bare JSON string.
    ///
    /// The registry returns plain string payloads for verify/unverify
    /// responses and conflict bodies.
    pub fn text(&self) -> Result<String, ApiError> {
        self.json::<String>()
    }
}

/// Authenticated client for the account registry.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client with the bearer credential baked into every request.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .context("api.token is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build registry HTTP client")?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issues a GET; `query` pairs are URL-encoded by reqwest.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse, ApiError> {
        let response = self.http.get(self.url(path)).query(query).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(ApiResponse::new(status, body))
    }

    /// Issues a POST with a JSON payload.
    pub async fn post<P: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &P,
    ) -> Result<ApiResponse, ApiError> {
        let response = self.http.post(self.url(path)).json(payload).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_duplicate_slash() {
        let client = ApiClient::new(&ApiConfig {
            url: "https://api.example.com/".to_string(),
            token: "secret".to_string(),
        })
        .unwrap();

        assert_eq!(client.url("/verify"), "https://api.example.com/verify");
        assert_eq!(client.url("server"), "https://api.example.com/server");
    }

    #[test]
    fn text_decodes_bare_json_string() {
        let response = ApiResponse::new(StatusCode::OK, Bytes::from_static(b"\"shaft\""));
        assert_eq!(response.text().unwrap(), "shaft");
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let response = ApiResponse::new(StatusCode::OK, Bytes::from_static(b"<html>"));
        assert!(matches!(response.text(), Err(ApiError::Decode(_))));
    }
}
