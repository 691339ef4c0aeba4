use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::Fetcher;
use crate::errors::{HeraldError, HeraldResult};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; herald)";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Sites reject empty or library-default user agents.
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> HeraldResult<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| HeraldError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> HeraldResult<Vec<u8>> {
        let network = |e: reqwest::Error| HeraldError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), url, "GET");

        if status.as_u16() >= 400 {
            return Err(HeraldError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(network)?;
        Ok(bytes.to_vec())
    }
}
