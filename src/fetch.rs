//! Page retrieval over HTTP.
//!
//! All network access goes through the [`PageSource`] trait so tests can
//! substitute canned pages; [`HttpSource`] is the production implementation.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::record::FetchFailure;

/// Raw fetched page plus the response metadata kept for diagnostics.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    pub status: u16,
    pub final_url: String,
    pub content_type: Option<String>,
}

/// Source of page content: the HTTP client in production, a mock in tests.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchFailure>;
}

pub struct HttpSource {
    client: reqwest::Client,
    retries: u32,
}

impl HttpSource {
    pub fn new(cfg: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            retries: cfg.retries,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchedPage, FetchFailure> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_err)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        // `text()` decodes using the charset declared in Content-Type.
        let body = resp.text().await.map_err(map_reqwest_err)?;

        Ok(FetchedPage {
            body,
            status: status.as_u16(),
            final_url,
            content_type,
        })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchFailure> {
        let mut attempt = 0u32;
        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                // non-2xx is a page-level answer, not a transient fault
                Err(FetchFailure::Status(code)) => return Err(FetchFailure::Status(code)),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(url, attempt, error = %e, "retrying fetch");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn map_reqwest_err(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Network(e.to_string())
    }
}
