//! HTTP transport seam and its reqwest implementation.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::str::FromStr;

use crate::request::{Headers, WorkingRequest};

/// What the transport got back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Lower-case names; repeated headers are joined with `", "`
    pub headers: Headers,
    pub body: String,
}

/// Failures that leave no response behind.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Invalid header {name}: {message}")]
    InvalidHeader { name: String, message: String },

    #[error("Connection reset: {0}")]
    ConnectionReset(String),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Performs one HTTP request.
///
/// The request arrives with its final headers already merged.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &WorkingRequest) -> Result<TransportResponse, TransportError>;
}

/// Transport backed by a shared `reqwest::Client`.
///
/// No request timeout is configured; a call that never answers holds its
/// tick until the process ends.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn header_map(headers: &Headers) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let header_name = HeaderName::from_str(name).map_err(|e| TransportError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &WorkingRequest) -> Result<TransportResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TransportError::InvalidMethod(request.method.clone()))?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .headers(Self::header_map(&request.headers)?);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes());
            headers
                .entry(name.as_str().to_string())
                .and_modify(|joined: &mut String| {
                    joined.push_str(", ");
                    joined.push_str(&value);
                })
                .or_insert_with(|| value.to_string());
        }
        let body = response.text().await?;

        Ok(TransportResponse { status, headers, body })
    }
}
