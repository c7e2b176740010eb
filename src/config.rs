use reqwest::Url;
use std::path::PathBuf;
use thiserror::Error;

use crate::session::LogPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")] Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Url,
    pub asset_base: Url,
    pub catalog_path: Option<PathBuf>,
    pub history_path: PathBuf,
    pub log_policy: LogPolicy,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base = parse_url("TRYON_API_BASE", get("TRYON_API_BASE").unwrap_or_else(|| "http://localhost:8000".into()))?;
        let path = get("TRYON_ENDPOINT_PATH").unwrap_or_else(|| "/api/swap-clothing".into());
        let endpoint = api_base.join(&path).map_err(|e| ConfigError::Invalid { key: "TRYON_ENDPOINT_PATH", reason: e.to_string() })?;
        let asset_base = parse_url("ASSET_BASE_URL", get("ASSET_BASE_URL").unwrap_or_else(|| "http://localhost:8080".into()))?;

        let log_policy = match get("TRYON_LOG_POLICY") {
            Some(raw) => raw.parse::<LogPolicy>().map_err(|reason| ConfigError::Invalid { key: "TRYON_LOG_POLICY", reason })?,
            None => LogPolicy::default(),
        };
        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid { key: "PORT", reason: e.to_string() })?,
            None => 3000,
        };

        Ok(Self {
            endpoint,
            asset_base,
            catalog_path: get("CATALOG_PATH").filter(|p| !p.trim().is_empty()).map(PathBuf::from),
            history_path: get("HISTORY_PATH").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("tryon_history.json")),
            log_policy,
            port,
        })
    }
}

fn parse_url(key: &'static str, raw: String) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid { key, reason: format!("{raw}: {e}") })
}
