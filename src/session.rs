use crate::error::TransportError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub type Headers<'a> = [(&'a str, &'a str)];

/// Retrieves raw bytes over the network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` with the given headers and return the body
    async fn fetch(&self, url: &str, headers: &Headers<'_>) -> Result<Vec<u8>, TransportError>;

    /// Follow redirects from `url` and return where they end up
    async fn resolve_redirect(
        &self,
        url: &str,
        _headers: &Headers<'_>,
    ) -> Result<String, TransportError> {
        Ok(url.to_string())
    }
}

/// HTTP session shared by every request of a run. Cookies set by one
/// response are sent with all later requests.
pub struct HttpSession {
    client: reqwest::Client,
}

impl HttpSession {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    async fn send(
        &self,
        method: reqwest::Method,
        url: &str,
        headers: &Headers<'_>,
    ) -> Result<reqwest::Response, TransportError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|_| TransportError::InvalidUrl(url.to_string()))?;

        let mut request = self.client.request(method, parsed);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpSession {
    async fn fetch(&self, url: &str, headers: &Headers<'_>) -> Result<Vec<u8>, TransportError> {
        debug!("Fetching {}", url);
        let response = self.send(reqwest::Method::GET, url, headers).await?;

        let data = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?
            .to_vec();

        debug!("Fetched {} bytes from {}", data.len(), url);
        Ok(data)
    }

    async fn resolve_redirect(
        &self,
        url: &str,
        headers: &Headers<'_>,
    ) -> Result<String, TransportError> {
        // HEAD so only the redirect chain is walked, not the final page body
        let response = self.send(reqwest::Method::HEAD, url, headers).await?;
        Ok(response.url().to_string())
    }
}
