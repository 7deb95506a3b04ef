//! Rental server configuration

use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Rental server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// sqlx pool size
    pub db_max_connections: u32,
    /// Midtrans server key (basic-auth user)
    pub midtrans_server_key: String,
    /// Use production Midtrans hosts instead of sandbox
    pub midtrans_production: bool,
    /// Timeout applied to every outbound gateway request
    pub gateway_timeout: Duration,
    /// Release claimed bikes when a payment ends denied, canceled or expired
    pub release_bikes_on_failed_payment: bool,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Parse an optional env var, falling back to `default` when unset.
    /// A present but unparseable value is a configuration error.
    fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, BoxError> {
        match std::env::var(name) {
            Ok(v) if !v.trim().is_empty() => v
                .trim()
                .parse()
                .map_err(|_| format!("{name} has an invalid value: {v}").into()),
            _ => Ok(default),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        if !matches!(
            environment.as_str(),
            "development" | "staging" | "production"
        ) {
            return Err(format!("ENVIRONMENT has an invalid value: {environment}").into());
        }

        let gateway_timeout_secs: u64 = Self::parse_or("GATEWAY_TIMEOUT_SECS", 15)?;
        if gateway_timeout_secs == 0 {
            return Err("GATEWAY_TIMEOUT_SECS must be greater than zero".into());
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: Self::parse_or("HTTP_PORT", 8080)?,
            db_max_connections: Self::parse_or("DB_MAX_CONNECTIONS", 10)?,
            midtrans_server_key: Self::require_secret("MIDTRANS_SERVER_KEY", &environment)?,
            midtrans_production: Self::parse_or("MIDTRANS_PRODUCTION", false)?,
            gateway_timeout: Duration::from_secs(gateway_timeout_secs),
            release_bikes_on_failed_payment: Self::parse_or(
                "RELEASE_BIKES_ON_FAILED_PAYMENT",
                true,
            )?,
            environment,
        })
    }
}
