//! Runtime settings loaded from environment variables.
//!
//! `.env` is read by the binary before [`AppSettings::from_env`] runs, so every
//! value can come from either place. Unset variables fall back to defaults;
//! set-but-malformed variables are configuration errors.

use crate::config::seeds::{SeedConfig, load_seed_config};
use crate::errors::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Default timeout applied to every remote store call
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(8);
/// Default number of attempts for a mirror write
pub const DEFAULT_MIRROR_ATTEMPTS: u32 = 3;
/// Default delay between mirror write attempts
pub const DEFAULT_MIRROR_RETRY_DELAY: Duration = Duration::from_millis(250);
/// Page that forwards `?code=` invite links into the app
pub const DEFAULT_INVITE_WEB_BASE_URL: &str =
    "https://alinadeem13.github.io/React-Native-App/invite.html";

/// Settings shared by every session
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// SQL database backing the stores
    pub database_url: String,
    /// Upper bound on any single remote call
    pub remote_timeout: Duration,
    /// Attempts per mirror write before it is dropped
    pub mirror_max_attempts: u32,
    /// Pause between mirror write attempts
    pub mirror_retry_delay: Duration,
    /// Base URL of web invite links
    pub invite_web_base_url: String,
    /// Optional seeds.toml overriding the built-in seed set
    pub seeds_path: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            database_url: crate::config::database::DEFAULT_DATABASE_URL.to_string(),
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            mirror_max_attempts: DEFAULT_MIRROR_ATTEMPTS,
            mirror_retry_delay: DEFAULT_MIRROR_RETRY_DELAY,
            invite_web_base_url: DEFAULT_INVITE_WEB_BASE_URL.to_string(),
            seeds_path: None,
        }
    }
}

impl AppSettings {
    /// Reads settings from the process environment.
    ///
    /// Recognized variables: `DATABASE_URL`, `LOVEVERSE_REMOTE_TIMEOUT_MS`,
    /// `LOVEVERSE_MIRROR_ATTEMPTS`, `LOVEVERSE_MIRROR_RETRY_MS`,
    /// `LOVEVERSE_INVITE_WEB_BASE_URL`, `LOVEVERSE_SEEDS_PATH`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let settings = Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            remote_timeout: parse_millis(&lookup, "LOVEVERSE_REMOTE_TIMEOUT_MS")?
                .unwrap_or(defaults.remote_timeout),
            mirror_max_attempts: parse_number(&lookup, "LOVEVERSE_MIRROR_ATTEMPTS")?
                .map_or(defaults.mirror_max_attempts, |n: u32| n.max(1)),
            mirror_retry_delay: parse_millis(&lookup, "LOVEVERSE_MIRROR_RETRY_MS")?
                .unwrap_or(defaults.mirror_retry_delay),
            invite_web_base_url: lookup("LOVEVERSE_INVITE_WEB_BASE_URL")
                .unwrap_or(defaults.invite_web_base_url),
            seeds_path: lookup("LOVEVERSE_SEEDS_PATH").map(PathBuf::from),
        };
        info!(
            "Settings loaded: remote timeout {:?}, mirror attempts {}",
            settings.remote_timeout, settings.mirror_max_attempts
        );
        Ok(settings)
    }

    /// Loads the seed set named by `seeds_path`, or the built-in one.
    pub fn load_seeds(&self) -> Result<SeedConfig> {
        match &self.seeds_path {
            Some(path) => load_seed_config(path),
            None => Ok(SeedConfig::default()),
        }
    }
}

fn parse_number<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| Error::Config {
                message: format!("{key} must be a number, got '{raw}': {e}"),
            })
        })
        .transpose()
}

fn parse_millis<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_number::<F, u64>(lookup, key)?.map(Duration::from_millis))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_settings_read_overrides() {
        let settings = AppSettings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("LOVEVERSE_REMOTE_TIMEOUT_MS", "1500"),
            ("LOVEVERSE_MIRROR_ATTEMPTS", "5"),
            ("LOVEVERSE_MIRROR_RETRY_MS", "10"),
            ("LOVEVERSE_INVITE_WEB_BASE_URL", "https://example.org/invite"),
        ]))
        .unwrap();

        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.remote_timeout, Duration::from_millis(1500));
        assert_eq!(settings.mirror_max_attempts, 5);
        assert_eq!(settings.mirror_retry_delay, Duration::from_millis(10));
        assert_eq!(settings.invite_web_base_url, "https://example.org/invite");
        assert!(settings.seeds_path.is_none());
    }

    #[test]
    fn test_malformed_number_is_config_error() {
        let result =
            AppSettings::from_lookup(lookup_from(&[("LOVEVERSE_REMOTE_TIMEOUT_MS", "soon")]));
        assert!(matches!(result, Err(Error::Config { message: _ })));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let settings =
            AppSettings::from_lookup(lookup_from(&[("LOVEVERSE_MIRROR_ATTEMPTS", "0")])).unwrap();
        assert_eq!(settings.mirror_max_attempts, 1);
    }

    #[test]
    fn test_builtin_seeds_when_no_path() {
        let settings = AppSettings::default();
        let seeds = settings.load_seeds().unwrap();
        assert_eq!(seeds.challenges.len(), 4);
    }
}
