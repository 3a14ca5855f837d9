use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::token::MAX_TTL_HOURS;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn default_port(self) -> u16 {
        match self {
            Environment::Development => 4000,
            Environment::Production => 443,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

/// How the next public product id is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// Last product in insertion order plus one.
    LastInserted,
    /// Atomic increment on a counter document.
    Counter,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub database_name: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub delete_secret: Option<String>,
    pub admin_secret: Option<String>,
    pub public_url: String,
    pub upload_dir: PathBuf,
    pub id_base: i64,
    pub id_strategy: IdStrategy,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("APP_ENV").as_deref() {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "APP_ENV",
                    value: other.to_string(),
                })
            }
        };

        let store = match get("STORE_BACKEND").as_deref() {
            None | Some("mongo") => StoreBackend::Mongo,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let database_url = get("DATABASE_URL");
        if store == StoreBackend::Mongo && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let id_strategy = match get("ID_STRATEGY").as_deref() {
            None | Some("last_inserted") => IdStrategy::LastInserted,
            Some("counter") => IdStrategy::Counter,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "ID_STRATEGY",
                    value: other.to_string(),
                })
            }
        };

        let port = parse_or(&get, "PORT", environment.default_port())?;

        let token_ttl_hours: i64 = parse_or(&get, "TOKEN_TTL_HOURS", 1)?;
        if !(1..=MAX_TTL_HOURS).contains(&token_ttl_hours) {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                value: token_ttl_hours.to_string(),
            });
        }

        Ok(Config {
            environment,
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            store,
            database_url,
            database_name: get("DATABASE_NAME").unwrap_or_else(|| "e-commerce".to_string()),
            jwt_secret: get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            token_ttl_hours,
            delete_secret: get("DB_DELETE"),
            admin_secret: get("ADMIN_SECRET"),
            public_url: get("HOMEPAGE")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads/images")),
            id_base: parse_or(&get, "PRODUCT_ID_BASE", 1001)?,
            id_strategy,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
