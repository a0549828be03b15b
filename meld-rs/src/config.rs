use crate::error::{MeldError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub meld: MeldConfig,
    pub site: Option<SiteConfig>,
    pub templates: TemplatesConfig,
    pub storage: StorageConfig,
    pub smtp: SmtpConfig,
    pub logging: LoggingConfig,
}

/// Settings consulted by every composer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MeldConfig {
    /// Re-parse template sources on every use instead of trusting the store
    pub force_update: bool,
    /// Prepended to every subject line before rendering
    pub subject_prefix: String,
    /// Exposed to templates as `STATIC_URL`
    pub static_url: String,
    /// Layout that rendered HTML is wrapped into (block `content`)
    pub base_template: String,
    pub default_from_email: String,
}

/// Current site identity, exposed to templates as `site`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub domain: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Searched in order, first match wins
    pub dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub server_addr: String,
    /// Name announced in EHLO; defaults to the local hostname
    pub hello_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| MeldError::Config(e.to_string()))?;

        let mut config: Config =
            toml::from_str(&content).map_err(|e| MeldError::Config(e.to_string()))?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `MELD_FORCE_UPDATE` and `MELD_DATABASE_URL` on top of file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("MELD_FORCE_UPDATE") {
            self.meld.force_update = parse_flag(&value).ok_or_else(|| {
                MeldError::Config(format!("MELD_FORCE_UPDATE is not a boolean: {}", value))
            })?;
        }
        if let Ok(url) = std::env::var("MELD_DATABASE_URL") {
            self.storage.database_url = url;
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meld: MeldConfig::default(),
            site: None,
            templates: TemplatesConfig::default(),
            storage: StorageConfig::default(),
            smtp: SmtpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for MeldConfig {
    fn default() -> Self {
        Self {
            force_update: false,
            subject_prefix: String::new(),
            static_url: "/static/".to_string(),
            base_template: "emailmeld/base.html".to_string(),
            default_from_email: "webmaster@localhost".to_string(),
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dirs: vec![PathBuf::from("templates")],
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://meld.db?mode=rwc".to_string(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server_addr: "localhost:25".to_string(),
            hello_name: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
