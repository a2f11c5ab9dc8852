use crate::common::error::{Result, ScraperError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Source of schedule page bodies
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches pages over HTTP.
///
/// Any non-2xx status or transport failure is reported as
/// [`ScraperError::Network`] for the url.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let network = |message: String| ScraperError::Network {
            url: url.to_string(),
            message,
        };

        let t0 = std::time::Instant::now();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(network(format!("HTTP {}", status.as_u16())));
        }
        let body = resp.text().await.map_err(|e| network(e.to_string()))?;

        debug!(
            "Fetched {} ({} bytes in {:.2}s)",
            url,
            body.len(),
            t0.elapsed().as_secs_f64()
        );
        Ok(body)
    }
}
