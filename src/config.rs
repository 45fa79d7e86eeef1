use crate::pagination::DEFAULT_PAGE_SIZE;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const BASE_URL_VAR: &str = "PAYDESK_API_BASE_URL";
pub const SESSION_FILE_VAR: &str = "PAYDESK_SESSION_FILE";
pub const LOG_DIR_VAR: &str = "PAYDESK_LOG_DIR";
pub const LOG_SPEC_VAR: &str = "PAYDESK_LOG";
pub const PAGE_SIZE_VAR: &str = "PAYDESK_PAGE_SIZE";
pub const TIMEOUT_VAR: &str = "PAYDESK_REQUEST_TIMEOUT_SECS";
pub const STRICT_PAYLOADS_VAR: &str = "PAYDESK_STRICT_PAYLOADS";

const APP_DIR: &str = ".paydesk";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("Could not determine the home directory")]
    NoHomeDir,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: Url,
    pub session_file: PathBuf,
    pub log_dir: PathBuf,
    pub log_spec: String,
    pub page_size: u32,
    pub request_timeout: Duration,
    /// On by default: a list payload in an unknown shape, or with a row that doesn't
    /// decode, fails the page load with an error. Set `PAYDESK_STRICT_PAYLOADS=false` to
    /// render unknown shapes as empty lists and skip undecodable rows instead.
    pub strict_payloads: bool,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let home = home::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Self::from_lookup(|name| std::env::var(name).ok(), home)
    }

    pub fn from_lookup<F>(lookup: F, home: PathBuf) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let raw_url = get(BASE_URL_VAR).ok_or(ConfigError::Missing(BASE_URL_VAR))?;
        let api_base_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            name: BASE_URL_VAR,
            value: raw_url.clone(),
            reason: e.to_string(),
        })?;

        let app_dir = home.join(APP_DIR);
        let session_file = get(SESSION_FILE_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| app_dir.join("session.json"));
        let log_dir = get(LOG_DIR_VAR).map(PathBuf::from).unwrap_or(app_dir);
        let log_spec = get(LOG_SPEC_VAR).unwrap_or_else(|| "info".to_string());

        let page_size = match get(PAGE_SIZE_VAR) {
            None => DEFAULT_PAGE_SIZE,
            Some(value) => match value.parse::<u32>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: PAGE_SIZE_VAR,
                        value,
                        reason: "expected a positive integer".to_string(),
                    })
                }
            },
        };

        let request_timeout = match get(TIMEOUT_VAR) {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid {
                    name: TIMEOUT_VAR,
                    value: value.clone(),
                    reason: e.to_string(),
                })?,
        };

        let strict_payloads = match get(STRICT_PAYLOADS_VAR) {
            None => true,
            Some(value) => parse_flag(&value).ok_or_else(|| ConfigError::Invalid {
                name: STRICT_PAYLOADS_VAR,
                value: value.clone(),
                reason: "expected true or false".to_string(),
            })?,
        };

        Ok(Config {
            api_base_url,
            session_file,
            log_dir,
            log_spec,
            page_size,
            request_timeout,
            strict_payloads,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned(), PathBuf::from("/home/admin"))
    }

    #[test]
    fn defaults() {
        let config = config_from(&[(BASE_URL_VAR, "https://api.example.com")]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://api.example.com/");
        assert_eq!(config.session_file, PathBuf::from("/home/admin/.paydesk/session.json"));
        assert_eq!(config.log_dir, PathBuf::from("/home/admin/.paydesk"));
        assert_eq!(config.log_spec, "info");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.strict_payloads);
    }

    #[test]
    fn overrides() {
        let config = config_from(&[
            (BASE_URL_VAR, "http://localhost:4000/api"),
            (SESSION_FILE_VAR, "/tmp/s.json"),
            (PAGE_SIZE_VAR, "25"),
            (TIMEOUT_VAR, "5"),
            (STRICT_PAYLOADS_VAR, "off"),
            (LOG_SPEC_VAR, "debug"),
        ])
        .unwrap();
        assert_eq!(config.session_file, PathBuf::from("/tmp/s.json"));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(!config.strict_payloads);
        assert_eq!(config.log_spec, "debug");
    }

    #[test]
    fn base_url_is_required_and_validated() {
        assert!(matches!(config_from(&[]), Err(ConfigError::Missing(BASE_URL_VAR))));
        assert!(matches!(
            config_from(&[(BASE_URL_VAR, "   ")]),
            Err(ConfigError::Missing(BASE_URL_VAR))
        ));
        assert!(matches!(
            config_from(&[(BASE_URL_VAR, "not a url")]),
            Err(ConfigError::Invalid { name: BASE_URL_VAR, .. })
        ));
    }

    #[test]
    fn rejects_zero_page_size() {
        let result = config_from(&[(BASE_URL_VAR, "https://api.example.com"), (PAGE_SIZE_VAR, "0")]);
        assert!(matches!(result, Err(ConfigError::Invalid { name: PAGE_SIZE_VAR, .. })));
    }
}
