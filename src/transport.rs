//! HTTP Transport
//!
//! This module owns the `reqwest` client, composes endpoint URLs against the
//! configured origin, and maps responses to typed results. It also carries
//! the closed flag shared by every API handle.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::errors::{map_download_status_to_error, map_status_to_error, ApiError, Result};
use crate::types::ClientConfig;

/// Sends requests to the hospital administration API
///
/// A transport is shared behind an `Arc` by all API handles created from one
/// client. Closing it makes every later request fail with `ClientClosed`.
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
    closed: RwLock<bool>,
}

impl Transport {
    /// Builds a transport for the configured origin
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            base_url,
            request_timeout: Duration::from_millis(config.request_timeout),
            closed: RwLock::new(false),
        })
    }

    /// Origin every route is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Composes an endpoint from path segments
    ///
    /// Segments are percent-encoded; a segment containing `/` is split so
    /// multi-segment routes can be passed as one string. Any path prefix of
    /// the base URL is preserved.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidArgument("Base URL cannot carry a path".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                for part in segment.split('/').filter(|p| !p.is_empty()) {
                    path.push(part);
                }
            }
        }
        Ok(url)
    }

    /// Checks if the transport is closed
    pub async fn check_closed(&self) -> Result<()> {
        let closed = self.closed.read().await;
        if *closed {
            return Err(ApiError::ClientClosed);
        }
        Ok(())
    }

    /// Sends a JSON request and decodes the JSON response
    pub async fn request_json<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self.request_bytes(method, url, body).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Sends a JSON request and returns the raw response body
    pub async fn request_bytes<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<Bytes>
    where
        B: Serialize + ?Sized,
    {
        self.check_closed().await?;

        debug!(method = %method, url = %url, "sending request");
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .timeout(self.request_timeout)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(method = %method, url = %url, error = %e, "request did not complete");
            ApiError::Network(e)
        })?;

        let status = response.status();
        if let Some(err) = map_status_to_error(status) {
            warn!(method = %method, url = %url, status = status.as_u16(), "request rejected");
            return Err(err);
        }

        debug!(method = %method, url = %url, status = status.as_u16(), "request succeeded");
        Ok(response.bytes().await?)
    }

    /// Opens a streamed GET for a binary resource
    ///
    /// Only the status line and headers have been received when this returns;
    /// the body is left for the caller to consume chunk by chunk.
    pub async fn open_stream(&self, url: Url) -> Result<Response> {
        self.check_closed().await?;

        debug!(url = %url, "opening stream");
        let response = self.http.get(url.clone()).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "stream request did not complete");
            ApiError::Network(e)
        })?;

        let status = response.status();
        if let Some(err) = map_download_status_to_error(status) {
            warn!(url = %url, status = status.as_u16(), "stream request rejected");
            return Err(err);
        }

        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return Err(ApiError::UnsupportedStream(format!(
                "{} responded with {} and no body",
                url, status
            )));
        }

        Ok(response)
    }

    /// Closes the transport
    ///
    /// It's safe to call close multiple times.
    pub async fn close(&self) {
        let mut closed = self.closed.write().await;
        *closed = true;
    }

    /// Returns true once close has been called
    pub async fn is_closed(&self) -> bool {
        *self.closed.read().await
    }
}

/// Parses and validates the configured origin
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ApiError::InvalidArgument(format!(
                "Unsupported URL scheme: {}",
                other
            )))
        }
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(ApiError::InvalidArgument(format!("Invalid base URL: {}", raw)));
    }
    Ok(url)
}
