use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::upload::UploadPolicy;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    /// Longer than `request_timeout` to leave room for large videos.
    pub upload_timeout: Duration,
    pub upload_chunk_bytes: usize,
    pub upload_policy: UploadPolicy,
}

fn number(
    lookup: &impl Fn(&str) -> Option<String>, name: &'static str, default: u64,
) -> Result<u64, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::Invalid { name, value: raw }),
            Ok(v) => Ok(v),
        },
    }
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("AUTHORING_API_URL").ok_or(ConfigError::Missing("AUTHORING_API_URL"))?;
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "AUTHORING_API_URL",
                value: api_url,
            });
        }
        let request_secs = number(&lookup, "AUTHORING_REQUEST_TIMEOUT_SECS", 30)?;
        let upload_secs = number(&lookup, "AUTHORING_UPLOAD_TIMEOUT_SECS", 30 * 60)?;
        let max_upload_mb = number(&lookup, "AUTHORING_MAX_UPLOAD_MB", 2048)?;
        let chunk_kb = number(&lookup, "AUTHORING_UPLOAD_CHUNK_KB", 256)?;

        let upload_policy = UploadPolicy {
            max_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            ..UploadPolicy::default()
        };
        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(request_secs),
            upload_timeout: Duration::from_secs(upload_secs),
            upload_chunk_bytes: usize::try_from(chunk_kb.saturating_mul(1024))
                .unwrap_or(usize::MAX),
            upload_policy,
        })
    }
}
