//! HTTP page fetcher backed by `reqwest`.

use std::time::Duration;

use reqwest::Client;
use url::Url;
use yachtscan_core::AppConfig;

use crate::error::ScraperError;
use crate::session::PageFetcher;

pub const BROWSER_FALLBACK_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Fetches listing pages as text.
///
/// Tries the configured user agent first and retries once with a browser
/// user agent on a non-success status; many brokerage sites refuse
/// non-browser clients.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            user_agent: user_agent.to_owned(),
        })
    }

    /// # Errors
    ///
    /// See [`HttpFetcher::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(config.fetch_timeout_secs, &config.user_agent)
    }

    /// Fetches `url` and returns its body.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] for unparseable or non-HTTP URLs.
    /// - [`ScraperError::UnexpectedStatus`] when every attempt returned non-2xx.
    /// - [`ScraperError::EmptyBody`] for a 2xx response with a blank body.
    /// - [`ScraperError::Http`] for network or TLS failures.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        let parsed = Url::parse(url).map_err(|err| ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScraperError::InvalidUrl {
                url: url.to_owned(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }

        let mut user_agents = vec![self.user_agent.as_str()];
        if self.user_agent != BROWSER_FALLBACK_UA {
            user_agents.push(BROWSER_FALLBACK_UA);
        }

        let mut last_status = 0;
        for ua in user_agents {
            let response = self
                .client
                .get(parsed.clone())
                .header(reqwest::header::USER_AGENT, ua)
                .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                tracing::debug!(url, status = status.as_u16(), user_agent = ua, "page fetch returned non-success status");
                last_status = status.as_u16();
                continue;
            }

            let body = response.text().await?;
            if body.trim().is_empty() {
                return Err(ScraperError::EmptyBody {
                    url: url.to_owned(),
                });
            }
            return Ok(body);
        }

        Err(ScraperError::UnexpectedStatus {
            status: last_status,
            url: url.to_owned(),
        })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_page(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<String, ScraperError>> + Send {
        self.fetch_html(url)
    }
}
