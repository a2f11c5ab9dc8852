use crate::common::error::{Result, ScraperError};
use crate::matching::lookup::SPOTIFY_SEARCH_URL;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_CONFIG_PATH: &str = "sift.toml";

/// Browser-like agent; Double Door refuses the default client agent.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub scrape: ScrapeConfig,
    pub lookup: LookupConfig,
    /// Prometheus exporter address; no exporter when unset
    pub metrics_addr: Option<SocketAddr>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub user_agent: String,
    /// Pause between month pages for paginated venues
    pub settle_delay_ms: u64,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub spotify_search_url: String,
    pub spotify_token: Option<String>,
    /// Pause between lookups when refreshing ids in bulk
    pub delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/sift.db"),
            scrape: ScrapeConfig::default(),
            lookup: LookupConfig::default(),
            metrics_addr: None,
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            settle_delay_ms: 3000,
            timeout_seconds: 30,
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            spotify_search_url: SPOTIFY_SEARCH_URL.to_string(),
            spotify_token: None,
            delay_ms: 500,
        }
    }
}

impl ScrapeConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl LookupConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Config {
    /// Loads `sift.toml` (or the file named by `SIFT_CONFIG`) and applies
    /// environment overrides. A missing file means defaults.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let path = std::env::var("SIFT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Applies `SIFT_DATABASE`, `SIFT_SPOTIFY_TOKEN` and `SIFT_METRICS_ADDR`.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("SIFT_DATABASE").filter(|v| !v.trim().is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(token) = var("SIFT_SPOTIFY_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.lookup.spotify_token = Some(token);
        }
        if let Some(addr) = var("SIFT_METRICS_ADDR").filter(|v| !v.trim().is_empty()) {
            let addr = addr
                .trim()
                .parse()
                .map_err(|e| ScraperError::Config(format!("SIFT_METRICS_ADDR {addr:?}: {e}")))?;
            self.metrics_addr = Some(addr);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::from_file(Path::new("/nonexistent/sift.toml")).unwrap();
        assert_eq!(config.database_path, PathBuf::from("data/sift.db"));
        assert_eq!(config.scrape.settle_delay(), Duration::from_secs(3));
        assert_eq!(config.scrape.timeout(), Duration::from_secs(30));
        assert!(config.metrics_addr.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database_path = \"/tmp/shows.db\"\n\n[scrape]\nsettle_delay_ms = 10\n\n[lookup]\ndelay_ms = 0"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/shows.db"));
        assert_eq!(config.scrape.settle_delay_ms, 10);
        assert_eq!(config.scrape.timeout_seconds, 30);
        assert_eq!(config.lookup.delay_ms, 0);
        assert_eq!(config.lookup.spotify_search_url, SPOTIFY_SEARCH_URL);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scrape\nsettle_delay_ms = ").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ScraperError::Toml(_))
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("SIFT_DATABASE", "/var/lib/sift.db"),
            ("SIFT_SPOTIFY_TOKEN", "abc"),
            ("SIFT_METRICS_ADDR", "127.0.0.1:9000"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/sift.db"));
        assert_eq!(config.lookup.spotify_token.as_deref(), Some("abc"));
        assert_eq!(config.metrics_addr, Some("127.0.0.1:9000".parse().unwrap()));
    }

    #[test]
    fn bad_metrics_address_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == "SIFT_METRICS_ADDR").then(|| "nope".to_string()));
        assert!(matches!(result, Err(ScraperError::Config(_))));
    }
}
