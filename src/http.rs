use async_trait::async_trait;
use tracing::debug;

use crate::contract::{HttpClient, HttpResponse, TransportError};

/// [`HttpClient`] backed by `reqwest`. Redirects are followed (reqwest's
/// default policy, up to ten hops).
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        debug!(url, status, bytes = body.len(), "HTTP GET finished");
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
