use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://www.akc.org/dog-breeds/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Runtime settings. Defaults, overridden by `BREEDS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub user_agent: String,
    pub db_path: PathBuf,
    pub output_dir: PathBuf,
    /// Pause between page requests.
    pub delay_ms: u64,
    /// Base backoff; doubled on each retry.
    pub retry_delay_ms: u64,
    pub max_retries: u32,
    pub timeout_secs: u64,
    /// Cards on a full listing page.
    pub page_size: usize,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(Environment::with_prefix("BREEDS"))
    }

    pub fn load_from(env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("db_path", "data/breeds.sqlite")?
            .set_default("output_dir", "output")?
            .set_default("delay_ms", 2000)?
            .set_default("retry_delay_ms", 3000)?
            .set_default("max_retries", 3)?
            .set_default("timeout_secs", 30)?
            .set_default("page_size", 12)?
            .add_source(env.try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
impl Settings {
    /// Zero pacing and backoff, pointed at a local server.
    pub fn for_tests(base_url: &str, max_retries: u32) -> Self {
        Settings {
            base_url: base_url.to_string(),
            user_agent: "breed_scraper-tests".to_string(),
            db_path: PathBuf::from(":memory:"),
            output_dir: PathBuf::from("output"),
            delay_ms: 0,
            retry_delay_ms: 0,
            max_retries,
            timeout_secs: 5,
            page_size: 12,
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("BREEDS").source(Some(map))
    }

    #[test]
    fn defaults() {
        let s = Settings::load_from(env(&[])).unwrap();
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        assert_eq!(s.db_path, PathBuf::from("data/breeds.sqlite"));
        assert_eq!(s.delay(), Duration::from_secs(2));
        assert_eq!(s.max_retries, 3);
        assert_eq!(s.page_size, 12);
    }

    #[test]
    fn environment_overrides() {
        let s = Settings::load_from(env(&[
            ("BREEDS_DELAY_MS", "10"),
            ("BREEDS_OUTPUT_DIR", "/tmp/breeds"),
            ("BREEDS_MAX_RETRIES", "0"),
        ]))
        .unwrap();
        assert_eq!(s.delay_ms, 10);
        assert_eq!(s.output_dir, PathBuf::from("/tmp/breeds"));
        assert_eq!(s.max_retries, 0);
        assert_eq!(s.retry_delay_ms, 3000);
    }
}
