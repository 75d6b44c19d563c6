//! Central module for application-wide configuration settings.
//!
//! Settings are read once at startup from the environment (optionally seeded
//! from a `.env` file) and passed down explicitly; nothing re-reads them
//! per request.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub secret_key: String,
    pub jwt_algorithm: String,
    pub access_token_expire_minutes: i64,
    pub server_port: u16,
    pub api_v1_str: String,
    pub first_superadmin_email: Option<String>,
    pub first_superadmin_password: Option<String>,
    pub debug: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let secret_key = env::var("SECRET_KEY").context("SECRET_KEY not set")?;

        let jwt_algorithm = env::var("JWT_ALGORITHM").unwrap_or_else(|_| "HS256".to_string());

        let access_token_expire_minutes = env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<i64>()
            .context("ACCESS_TOKEN_EXPIRE_MINUTES must be a valid number")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let api_v1_str = env::var("API_V1_STR").unwrap_or_else(|_| "/api/v1".to_string());

        let first_superadmin_email = env::var("FIRST_SUPERADMIN_EMAIL").ok();
        let first_superadmin_password = env::var("FIRST_SUPERADMIN_PASSWORD").ok();

        let debug = env::var("DEBUG")
            .map(|value| parse_flag(&value))
            .unwrap_or(false);

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            secret_key,
            jwt_algorithm,
            access_token_expire_minutes,
            server_port,
            api_v1_str,
            first_superadmin_email,
            first_superadmin_password,
            debug,
        })
    }

    /// Bootstrap superadmin credentials, when both halves are configured.
    pub fn first_superadmin(&self) -> Option<(&str, &str)> {
        match (&self.first_superadmin_email, &self.first_superadmin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_first_superadmin_requires_both_values() {
        let mut config = Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            secret_key: "secret".to_string(),
            jwt_algorithm: "HS256".to_string(),
            access_token_expire_minutes: 30,
            server_port: 8000,
            api_v1_str: "/api/v1".to_string(),
            first_superadmin_email: Some("admin@example.com".to_string()),
            first_superadmin_password: None,
            debug: false,
        };
        assert!(config.first_superadmin().is_none());

        config.first_superadmin_password = Some("changeme".to_string());
        assert_eq!(
            config.first_superadmin(),
            Some(("admin@example.com", "changeme"))
        );
    }
}
