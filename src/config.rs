use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            anon_key: String::new(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_title")]
    pub title: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Fraction of the list, counted from the end, that triggers loading
    /// the next page once the selection enters it.
    #[serde(default = "default_load_more_threshold")]
    pub load_more_threshold: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title: default_feed_title(),
            page_size: default_page_size(),
            load_more_threshold: default_load_more_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_bio")]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            bio: default_bio(),
            avatar_url: None,
        }
    }
}

fn default_tick_rate_ms() -> u64 {
    250
}

fn default_gateway_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_feed_title() -> String {
    "Home".to_string()
}

fn default_page_size() -> u32 {
    3
}

fn default_load_more_threshold() -> f64 {
    0.1
}

fn default_username() -> String {
    "Administrator".to_string()
}

fn default_bio() -> String {
    "Exploring the world one code at a time.".to_string()
}

const DEFAULT_CONFIG: &str = r#"# postfeed configuration

[general]
# Redraw interval of the terminal UI
tick_rate_ms = 250

[gateway]
# Base URL of the hosted backend (data API at /rest/v1, auth at /auth/v1)
url = "http://localhost:54321"
# Public API key sent with every request
anon_key = ""
# Signed-in user's access token; leave unset to browse anonymously
# access_token = ""
timeout_secs = 20

[feed]
title = "Home"
page_size = 3
load_more_threshold = 0.1

[profile]
username = "Administrator"
bio = "Exploring the world one code at a time."
# avatar_url = "https://example.com/me.png"
"#;

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("postfeed").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise. Environment
    /// overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Apply `POSTFEED_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("POSTFEED_URL") {
            self.gateway.url = url;
        }
        if let Some(key) = lookup("POSTFEED_ANON_KEY") {
            self.gateway.anon_key = key;
        }
        if let Some(token) = lookup("POSTFEED_ACCESS_TOKEN") {
            self.gateway.access_token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.feed.page_size >= 1, "feed.page_size must be at least 1");
        ensure!(
            self.feed.load_more_threshold > 0.0 && self.feed.load_more_threshold <= 1.0,
            "feed.load_more_threshold must be in (0, 1], got {}",
            self.feed.load_more_threshold
        );
        ensure!(
            self.gateway.url.starts_with("http://") || self.gateway.url.starts_with("https://"),
            "gateway.url must be an http(s) URL, got {:?}",
            self.gateway.url
        );
        ensure!(self.general.tick_rate_ms > 0, "general.tick_rate_ms must be positive");
        Ok(())
    }

    /// Write the commented default file to `path`, creating parent
    /// directories. Refuses to replace an existing file unless `force`.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        ensure!(
            force || !path.exists(),
            "{} already exists (use --force to overwrite)",
            path.display()
        );
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.feed.page_size, 3);
        assert_eq!(config.feed.load_more_threshold, 0.1);
        assert_eq!(config.gateway.timeout_secs, 20);
        assert_eq!(config.profile.username, "Administrator");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::write_default(&path, false).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.gateway.url, "http://localhost:54321");
        assert_eq!(config.gateway.access_token, None);
        assert_eq!(config.feed.title, "Home");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_write_default_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[feed]\npage_size = 5\n").unwrap();

        assert!(Config::write_default(&path, false).is_err());
        assert_eq!(Config::load_from(&path).unwrap().feed.page_size, 5);

        Config::write_default(&path, true).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().feed.page_size, 3);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[gateway]\nurl = \"https://abc.example.co\"\nanon_key = \"k\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.gateway.url, "https://abc.example.co");
        assert_eq!(config.gateway.anon_key, "k");
        assert_eq!(config.feed.page_size, 3);
        assert_eq!(config.general.tick_rate_ms, 250);
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("POSTFEED_URL", "https://override.example"),
            ("POSTFEED_ACCESS_TOKEN", "jwt"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.gateway.url, "https://override.example");
        assert_eq!(config.gateway.access_token.as_deref(), Some("jwt"));
        assert_eq!(config.gateway.anon_key, "");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.feed.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.feed.load_more_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.gateway.url = "localhost".to_string();
        assert!(config.validate().is_err());
    }
}
