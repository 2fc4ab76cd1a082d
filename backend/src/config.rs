use std::collections::HashSet;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Static service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub upload_folder: PathBuf,
    pub allowed_extensions: HashSet<String>,
    pub default_from_email: String,
    pub alert_recipient: String,
    pub smtp_host: String,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub actuator_url: String,
    pub notify_timeout: Duration,
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub top_k: usize,
    pub sightings_log: PathBuf,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            upload_folder: PathBuf::from(var_or("UPLOAD_FOLDER", "uploads")),
            allowed_extensions: parse_extensions(&var_or("ALLOWED_EXTENSIONS", "jpg,jpeg,png")),
            default_from_email: required("DEFAULT_FROM_EMAIL")?,
            alert_recipient: required("ALERT_RECIPIENT")?,
            smtp_host: required("SMTP_HOST")?,
            smtp_username: optional("SMTP_USERNAME"),
            smtp_password: optional("SMTP_PASSWORD"),
            actuator_url: required("ACTUATOR_URL")?,
            notify_timeout: Duration::from_secs(parse_or("NOTIFY_TIMEOUT_SECS", 10)?),
            model_path: PathBuf::from(required("MODEL_PATH")?),
            labels_path: PathBuf::from(required("LABELS_PATH")?),
            top_k: parse_or("TOP_K", 1)?,
            sightings_log: PathBuf::from(var_or("SIGHTINGS_LOG", "sightings.jsonl")),
            port: parse_or("PORT", 8081)?,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match optional(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

fn parse_extensions(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_extensions;

    #[test]
    fn extension_list_is_normalized() {
        let exts = parse_extensions("JPG, .jpeg,png,,  ");
        assert_eq!(exts.len(), 3);
        assert!(exts.contains("jpg"));
        assert!(exts.contains("jpeg"));
        assert!(exts.contains("png"));
    }
}
