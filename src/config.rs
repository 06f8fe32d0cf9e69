use std::env::{self, VarError};
use std::path::PathBuf;

use dotenv::dotenv;

use crate::db::{ErrorKind, Result};

const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_BLOB_ROOT: &str = "./uploads";
const DEFAULT_BLOB_BASE_URL: &str = "/uploads";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub token_secret: String,
    pub pool_size: u32,
    pub blob_root: PathBuf,
    pub blob_base_url: String,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<AppConfig> {
        dotenv().ok();
        AppConfig::from_lookup(|key| env::var(key))
    }

    fn from_lookup<F>(lookup: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> ::std::result::Result<String, VarError>,
    {
        let optional = |key: &str| -> ::std::result::Result<Option<String>, VarError> {
            match lookup(key) {
                Ok(value) => Ok(Some(value)),
                Err(VarError::NotPresent) => Ok(None),
                Err(e) => Err(e),
            }
        };
        let required = |key: &'static str| -> Result<String> {
            match optional(key)? {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(ErrorKind::MissingSetting(key).into()),
            }
        };

        let pool_size = match optional("DB_POOL_SIZE")? {
            Some(value) => value.trim().parse::<u32>()?,
            None => DEFAULT_POOL_SIZE,
        };
        if pool_size == 0 {
            return Err(ErrorKind::InvalidSetting("DB_POOL_SIZE", "must be at least 1".into()).into());
        }

        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            token_secret: required("TOKEN_SECRET")?,
            pool_size,
            blob_root: optional("BLOB_ROOT")?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BLOB_ROOT)),
            blob_base_url: optional("BLOB_BASE_URL")?
                .unwrap_or_else(|| DEFAULT_BLOB_BASE_URL.to_string()),
        })
    }
}
