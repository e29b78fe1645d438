// Endpoint configuration. The three base URIs come from built-in
// defaults, an optional JSON file and finally environment variables, in
// that order of precedence (lowest first).

use crate::error::{PublishError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "EXCHANGE_PUBLISH_CONFIG";
pub const CS_SITE_API_ENV: &str = "CS_SITE_API_URL";
pub const EXCHANGE_API_ENV: &str = "EXCHANGE_API_URL";
pub const EXCHANGE_MAVEN_API_ENV: &str = "EXCHANGE_MAVEN_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub base_uri: String,
}

impl Endpoint {
    fn new(base_uri: &str) -> Self {
        Endpoint {
            base_uri: base_uri.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Login and profile API.
    pub cs_site_api: Endpoint,
    /// Organization and group lookups.
    pub exchange_api: Endpoint,
    /// Maven-style repository receiving the uploads.
    pub exchange_maven_api: Endpoint,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cs_site_api: Endpoint::new("https://anypoint.mulesoft.com/accounts"),
            exchange_api: Endpoint::new("https://anypoint.mulesoft.com/exchange"),
            exchange_maven_api: Endpoint::new("https://maven.anypoint.mulesoft.com"),
        }
    }
}

impl Config {
    /// Resolve the configuration for this process: defaults, then the
    /// config file if one is found, then environment overrides.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let config = Config::resolve(explicit.as_deref(), default_config_path().as_deref())?;
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Pick the config file. An explicitly named file must be readable;
    /// only the default location may be absent.
    pub fn resolve(explicit: Option<&Path>, default_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Config::from_file(path);
        }
        match default_path {
            Some(path) if path.exists() => Config::from_file(path),
            Some(path) => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Config::default())
            }
            None => Ok(Config::default()),
        }
    }

    /// Parse a JSON config file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PublishError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            PublishError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config.normalized())
    }

    /// Apply overrides from `lookup` (the process environment in
    /// production).
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots = [
            (CS_SITE_API_ENV, &mut self.cs_site_api),
            (EXCHANGE_API_ENV, &mut self.exchange_api),
            (EXCHANGE_MAVEN_API_ENV, &mut self.exchange_maven_api),
        ];
        for (key, endpoint) in slots {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                endpoint.base_uri = value;
            }
        }
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        for endpoint in [
            &mut self.cs_site_api,
            &mut self.exchange_api,
            &mut self.exchange_maven_api,
        ] {
            let trimmed = endpoint.base_uri.trim().trim_end_matches('/').to_string();
            endpoint.base_uri = trimmed;
        }
        self
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("exchange-publish").join("config.json"))
}
