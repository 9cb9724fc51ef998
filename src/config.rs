//! Server configuration
//!
//! Read from the environment at startup:
//!
//! | Variable                | Default        |
//! |-------------------------|----------------|
//! | `PORT`                  | `3000`         |
//! | `CHAT_HOST`             | `0.0.0.0`      |
//! | `CHAT_DB_PATH`          | `data/db.json` |
//! | `CHAT_UPLOAD_DIR`       | `uploads`      |
//! | `CHAT_PUBLIC_DIR`       | `public`       |
//! | `CHAT_BCRYPT_COST`      | `10`           |
//! | `CHAT_MAX_UPLOAD_BYTES` | `5242880`      |

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("bcrypt cost must be between 4 and 31, got {0}")]
    BcryptCost(u32),
}

/// Runtime settings for the chat server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Credential store file
    pub db_path: PathBuf,
    /// Where uploaded profile images are written
    pub upload_dir: PathBuf,
    /// Signup, login and chat pages
    pub public_dir: PathBuf,
    pub bcrypt_cost: u32,
    /// Request body limit for signup uploads
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            db_path: PathBuf::from("data").join("db.json"),
            upload_dir: PathBuf::from("uploads"),
            public_dir: PathBuf::from("public"),
            bcrypt_cost: 10,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Build from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            host: lookup("CHAT_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            db_path: lookup("CHAT_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            upload_dir: lookup("CHAT_UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            public_dir: lookup("CHAT_PUBLIC_DIR").map(PathBuf::from).unwrap_or(defaults.public_dir),
            bcrypt_cost: parse_or(&lookup, "CHAT_BCRYPT_COST", defaults.bcrypt_cost)?,
            max_upload_bytes: parse_or(
                &lookup,
                "CHAT_MAX_UPLOAD_BYTES",
                defaults.max_upload_bytes,
            )?,
        };

        if !(4..=31).contains(&config.bcrypt_cost) {
            return Err(ConfigError::BcryptCost(config.bcrypt_cost));
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "CHAT_HOST".to_string(),
            value: self.host.clone(),
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
