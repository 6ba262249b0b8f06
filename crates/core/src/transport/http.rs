//! `Transport` backed by a `reqwest` client.

use super::{HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

/// Transport that sends every request through a shared `reqwest::Client`.
/// The client keeps no cookies of its own; cookies travel as explicit headers.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a caller-built client, e.g. one with a timeout or proxy configured.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        trace!("GET {}", request.url);
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        trace!(status, bytes = body.len(), "response from {}", request.url);
        Ok(HttpResponse { status, body })
    }
}
