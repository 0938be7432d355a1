use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::error::Result;
use crate::store::DEFAULT_KEY_PREFIX;

/// Default location of the notus feed directory.
pub const DEFAULT_FEED_DIR: &str = "/var/lib/notus/advisories";

/// Runtime configuration, supplied by the embedding process.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory the notus feed is placed in.
    pub feed_dir: PathBuf,
    /// Disables hashsum verification for notus advisories.
    pub disable_advisory_verification: bool,
    pub redis_url: String,
    /// Namespace prefix for advisory keys in the store.
    pub key_prefix: String,
    pub log_to_file: bool,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let feed_dir = env::var("NOTUS_FEED_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_FEED_DIR));

        let disable_advisory_verification = env::var("NOTUS_DISABLE_HASHSUM_VERIFICATION")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let key_prefix =
            env::var("NOTUS_KEY_PREFIX").unwrap_or_else(|_| DEFAULT_KEY_PREFIX.to_string());

        let log_to_file = env::var("NOTUS_LOG_TO_FILE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let log_dir = env::var("NOTUS_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/var/log/notus"));

        Ok(Self {
            feed_dir,
            disable_advisory_verification,
            redis_url,
            key_prefix,
            log_to_file,
            log_dir,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_dir: PathBuf::from(DEFAULT_FEED_DIR),
            disable_advisory_verification: false,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            log_to_file: false,
            log_dir: PathBuf::from("/var/log/notus"),
        }
    }
}
