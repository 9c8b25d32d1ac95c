use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not valid: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bind_addr: String,
    pub upload_dir: String,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let ttl = or("TOKEN_TTL_HOURS", "24");
        let token_ttl_hours = match ttl.parse::<i64>() {
            Ok(hours) if hours > 0 => hours,
            _ => {
                return Err(ConfigError::Invalid {
                    name: "TOKEN_TTL_HOURS",
                    value: ttl,
                })
            }
        };

        Ok(Config {
            database_url: or("DATABASE_URL", "mongodb://localhost:27017"),
            database_name: or("DATABASE_NAME", "estoque"),
            jwt_secret,
            token_ttl_hours,
            bind_addr: or("BIND_ADDR", "0.0.0.0:8080"),
            upload_dir: or("UPLOAD_DIR", "uploads"),
        })
    }
}
