use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};
use tracing::warn;

use crate::config::Settings;

/// HTTP page retrieval with bounded retry and a pacing delay.
pub struct Fetcher {
    client: Client,
    delay: Duration,
    retry_delay: Duration,
    max_retries: u32,
}

/// Body text plus the status it came with.
#[derive(Debug)]
pub struct Fetched {
    pub status: u16,
    pub body: String,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Fetcher {
            client,
            delay: settings.delay(),
            retry_delay: settings.retry_delay(),
            max_retries: settings.max_retries,
        })
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        Ok(self.get(url).await?.body)
    }

    /// GET with retry on network errors, 429 and 5xx; backoff doubles each attempt.
    pub async fn get(&self, url: &str) -> Result<Fetched> {
        let mut attempt = 0;
        loop {
            let err = match self.client.get(url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let status = resp.status().as_u16();
                    let body = resp
                        .text()
                        .await
                        .with_context(|| format!("Failed to read body of {}", url))?;
                    return Ok(Fetched { status, body });
                }
                Ok(resp) if is_transient(resp.status()) => format!("HTTP {}", resp.status()),
                Ok(resp) => bail!("HTTP {} for {}", resp.status(), url),
                Err(e) => e.to_string(),
            };

            if attempt >= self.max_retries {
                bail!("{} after {} retries: {}", url, self.max_retries, err);
            }
            let wait = backoff(self.retry_delay, attempt);
            warn!(
                "{} on {} (attempt {}/{}), backing off {:.1}s",
                err,
                url,
                attempt + 1,
                self.max_retries,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    /// Courtesy pause between requests.
    pub async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `base * 2^attempt`, saturating instead of overflowing.
fn backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

// ── Tests ──
