//! Configuration for genseqdid
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

use crate::i18n::Lang;
use crate::types::ServiceError;

/// Secret used when running in development mode without JWT_SECRET
const DEV_JWT_SECRET: &str = "dev-only-insecure-secret-not-for-production";

/// Genseqdid - didactic sequence service
#[derive(Parser, Debug, Clone)]
#[command(name = "genseqdid")]
#[command(about = "Role-gated collaborative API for didactic sequences and resources")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// Enable development mode (built-in JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Language used when the request does not ask for a supported one
    #[arg(long, env = "DEFAULT_LANG", default_value = "fr")]
    pub default_lang: String,

    /// Number of audit entries kept in memory
    #[arg(long, env = "AUDIT_CAPACITY", default_value = "1000")]
    pub audit_capacity: usize,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "1048576")]
    pub max_body_bytes: usize,

    /// Create the bootstrap users and the default document/resource catalogue
    #[arg(
        long,
        env = "SEED_DEMO_DATA",
        default_value = "true",
        action = clap::ArgAction::Set
    )]
    pub seed_demo_data: bool,

    /// Start with maintenance mode enabled
    #[arg(long, env = "MAINTENANCE", default_value = "false")]
    pub maintenance: bool,
}

impl Args {
    /// Get effective JWT secret (uses a built-in secret in dev mode)
    pub fn jwt_secret(&self) -> Result<String, ServiceError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => Ok(secret.clone()),
            (None, true) => Ok(DEV_JWT_SECRET.to_string()),
            (None, false) => Err(ServiceError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Parsed default language
    pub fn default_lang(&self) -> Lang {
        Lang::from_code(&self.default_lang).unwrap_or_default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if Lang::from_code(&self.default_lang).is_none() {
            return Err(format!(
                "DEFAULT_LANG '{}' is not one of {}",
                self.default_lang,
                Lang::supported_codes().join(", ")
            ));
        }

        if self.audit_capacity == 0 {
            return Err("AUDIT_CAPACITY must be at least 1".to_string());
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be at least 1".to_string());
        }

        Ok(())
    }
}
