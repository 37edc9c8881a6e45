//! Configuration loading and editing.
//!
//! Settings live in `config.toml` under the platform config dir. Feeds are
//! part of the config file, not the database: removing one from the file is
//! enough to stop fetching it. A fully commented default file is written on
//! first run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::{DriftlineError, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Output language for AI features: en, ko, ja, zh-CN, es, de.
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    /// Reader profile injected into insight prompts. Empty means generic.
    pub persona: String,
    pub allow_insecure_ssl: bool,
    pub feeds: Vec<FeedConfig>,
    pub ai: AiConfig,
    pub digest: DigestConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            db_path: None,
            persona: String::new(),
            allow_insecure_ssl: false,
            feeds: Vec::new(),
            ai: AiConfig::default(),
            digest: DigestConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AiConfig {
    /// "claude_cli" or "anthropic".
    pub provider: String,
    /// Literal key, or `${ENV_VAR}` to read one at startup.
    pub api_key: String,
    /// Empty picks the provider's default model.
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "claude_cli".to_string(),
            api_key: String::new(),
            model: String::new(),
        }
    }
}

impl AiConfig {
    /// The configured key with `${ENV_VAR}` references resolved. The raw
    /// value stays in the struct so saving the config never writes secrets.
    pub fn resolved_api_key(&self) -> String {
        resolve_env(&self.api_key)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DigestConfig {
    pub period_days: i64,
    pub max_articles: usize,
    pub bookmarked_only: bool,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            period_days: 7,
            max_articles: 20,
            bookmarked_only: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content).map_err(|e| {
            DriftlineError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        for feed in &mut config.feeds {
            if feed.name.is_empty() {
                feed.name = feed.url.clone();
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DriftlineError::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DriftlineError::Config("could not determine config directory".into()))?;
        Ok(config_dir.join("driftline").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::default_config_content())?;
        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# driftline configuration

# Output language for AI features: en, ko, ja, zh-CN, es, de
# language = "en"

# Where the article database lives. Defaults to the platform data dir.
# db_path = "/home/me/.local/share/driftline/driftline.db"

# A short reader profile used to tailor insights.
# persona = "backend engineer who cares about databases and latency"

# Accept invalid TLS certificates when fetching feeds.
# allow_insecure_ssl = false

# [ai]
# provider = "claude_cli"    # or "anthropic"
# api_key = "${ANTHROPIC_API_KEY}"
# model = ""                 # empty picks the provider default

# [digest]
# period_days = 7
# max_articles = 20
# bookmarked_only = false

# [[feeds]]
# url = "https://example.com/feed.xml"
# name = "Example"
"##
    }
}

/// Add a feed to the config file. Returns false when the URL is already
/// configured.
pub fn add_feed(path: &Path, feed: FeedConfig) -> Result<bool> {
    let mut config = Config::load_from(path)?;
    if config.feeds.iter().any(|f| f.url == feed.url) {
        return Ok(false);
    }
    config.feeds.push(feed);
    config.save_to(path)?;
    Ok(true)
}

/// Remove a feed by URL. Returns false when no such feed is configured.
pub fn remove_feed(path: &Path, url: &str) -> Result<bool> {
    let mut config = Config::load_from(path)?;
    let before = config.feeds.len();
    config.feeds.retain(|f| f.url != url);
    if config.feeds.len() == before {
        return Ok(false);
    }
    config.save_to(path)?;
    Ok(true)
}

fn resolve_env(value: &str) -> String {
    if let Some(name) = value.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        return std::env::var(name).unwrap_or_default();
    }
    value.to_string()
}
