use chrono::Duration;
use clap::Parser;
use std::fmt;
use thiserror::Error;

/// Upper bound on the access token lifetime: one day
pub const MAX_ACCESS_TTL_MINUTES: i64 = 24 * 60;

/// Upper bound on the refresh token lifetime: one year
pub const MAX_REFRESH_TTL_HOURS: i64 = 366 * 24;

/// Command-line and environment configuration for the API server
#[derive(Parser, Debug, Clone)]
#[command(name = "movies-auth", version, about = "Session authentication API")]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Postgres connection string; an in-memory demo user store is used when absent
    #[arg(long, env = "DATABASE_URL")]
    pub dsn: Option<String>,

    /// Shared HMAC signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Issuer written into access tokens and required when verifying them
    #[arg(long, env = "JWT_ISSUER", default_value = "example.com")]
    pub jwt_issuer: String,

    /// Audience written into access tokens
    #[arg(long, env = "JWT_AUDIENCE", default_value = "example.com")]
    pub jwt_audience: String,

    /// Domain attribute of the refresh cookie
    #[arg(long, env = "COOKIE_DOMAIN", default_value = "localhost")]
    pub cookie_domain: String,

    /// Name of the refresh cookie
    #[arg(long, env = "COOKIE_NAME", default_value = "refresh_token")]
    pub cookie_name: String,

    /// Path attribute of the refresh cookie
    #[arg(long, env = "COOKIE_PATH", default_value = "/")]
    pub cookie_path: String,

    /// Access token lifetime in minutes
    #[arg(long, env = "ACCESS_TTL_MINUTES", default_value_t = 15)]
    pub access_ttl_minutes: i64,

    /// Refresh token and cookie lifetime in hours
    #[arg(long, env = "REFRESH_TTL_HOURS", default_value_t = 24)]
    pub refresh_ttl_hours: i64,

    /// Origin allowed to make credentialed cross-origin requests
    #[arg(long, env = "FRONTEND_ORIGIN", default_value = "http://localhost:3000")]
    pub frontend_origin: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("{name} lifetime must be positive, got {value}")]
    NonPositiveLifetime { name: &'static str, value: i64 },

    #[error("{name} lifetime {value} exceeds the maximum of {max}")]
    LifetimeTooLong {
        name: &'static str,
        value: i64,
        max: i64,
    },

    #[error("refresh token lifetime must be longer than the access token lifetime")]
    RefreshShorterThanAccess,
}

impl Cli {
    /// Builds the immutable signing configuration shared by every component
    pub fn signing_config(&self) -> Result<SigningConfig, ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        let access_ttl = checked_lifetime(
            "access token",
            self.access_ttl_minutes,
            MAX_ACCESS_TTL_MINUTES,
            Duration::try_minutes,
        )?;
        let refresh_ttl = checked_lifetime(
            "refresh token",
            self.refresh_ttl_hours,
            MAX_REFRESH_TTL_HOURS,
            Duration::try_hours,
        )?;
        if refresh_ttl <= access_ttl {
            return Err(ConfigError::RefreshShorterThanAccess);
        }

        Ok(SigningConfig {
            issuer: self.jwt_issuer.clone(),
            audience: self.jwt_audience.clone(),
            secret: self.jwt_secret.as_bytes().to_vec(),
            access_ttl,
            refresh_ttl,
            cookie_name: self.cookie_name.clone(),
            cookie_path: self.cookie_path.clone(),
            cookie_domain: self.cookie_domain.clone(),
        })
    }
}

fn checked_lifetime(
    name: &'static str,
    value: i64,
    max: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::NonPositiveLifetime { name, value });
    }
    if value > max {
        return Err(ConfigError::LifetimeTooLong { name, value, max });
    }

    to_duration(value).ok_or(ConfigError::LifetimeTooLong { name, value, max })
}

/// Process-wide token and cookie settings, read-only after startup
#[derive(Clone)]
pub struct SigningConfig {
    pub issuer: String,
    pub audience: String,
    pub secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_domain: String,
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_path", &self.cookie_path)
            .field("cookie_domain", &self.cookie_domain)
            .finish()
    }
}
