// transport.rs — The network seam of the discovery client.
//
// A Transport performs one GET, following redirects, and reports the status,
// the final resolved URL and (for success statuses only) a size-bounded body.
// Deadlines and security decisions live in the client, not here.

use std::future::Future;
use std::sync::Arc;

use reqwest::header::{HeaderName, ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use url::Url;

use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, TransportError};

/// What came back from one GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// URL the response settled on after redirects.
    pub final_url: Url,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    /// Empty for non-success statuses.
    pub body: Vec<u8>,
}

/// Performs a single bounded GET request.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        url: &Url,
        max_body_bytes: u64,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn get(
        &self,
        url: &Url,
        max_body_bytes: u64,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        (**self).get(url, max_body_bytes)
    }
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(DiscoveryError::ClientInit)?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &Url,
        max_body_bytes: u64,
    ) -> Result<TransportResponse, TransportError> {
        let mut response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "text/markdown, text/plain;q=0.9, */*;q=0.1")
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let final_url = response.url().clone();
        let (content_type, cache_control) = {
            let headers = response.headers();
            let header = |name: HeaderName| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            (header(CONTENT_TYPE), header(CACHE_CONTROL))
        };

        let mut body = Vec::new();
        if status.is_success() {
            if let Some(declared) = response.content_length() {
                if declared > max_body_bytes {
                    return Err(TransportError::BodyTooLarge {
                        bytes: declared,
                        limit: max_body_bytes,
                    });
                }
            }
            // Content-Length may be absent or wrong; count as we read.
            while let Some(chunk) = response.chunk().await.map_err(classify)? {
                body.extend_from_slice(&chunk);
                let measured = body.len() as u64;
                if measured > max_body_bytes {
                    return Err(TransportError::BodyTooLarge {
                        bytes: measured,
                        limit: max_body_bytes,
                    });
                }
            }
        }

        Ok(TransportResponse {
            status: status.as_u16(),
            final_url,
            content_type,
            cache_control,
            body,
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::TimedOut
    } else {
        TransportError::Network(Box::new(err))
    }
}
