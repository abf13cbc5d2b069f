//! Refresh-token cookie construction and lookup.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::UNIX_EPOCH;

use crate::config::SigningConfig;
use crate::shared::AppError;

/// Server-built refresh cookie. Always HttpOnly, Secure and SameSite=Strict.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub domain: String,
    pub expires: DateTime<Utc>,
    pub max_age: i64,
}

impl RefreshCookie {
    /// Cookie carrying a freshly issued refresh token
    pub fn issue(
        config: &SigningConfig,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let expires = now.checked_add_signed(config.refresh_ttl).ok_or_else(|| {
            tracing::error!(refresh_ttl = %config.refresh_ttl, "Refresh cookie expiry out of range");
            AppError::Internal
        })?;

        Ok(Self {
            name: config.cookie_name.clone(),
            value: refresh_token.to_string(),
            path: config.cookie_path.clone(),
            domain: config.cookie_domain.clone(),
            expires,
            max_age: config.refresh_ttl.num_seconds(),
        })
    }

    /// Cookie instructing the browser to drop the refresh token immediately
    pub fn expired(config: &SigningConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            value: String::new(),
            path: config.cookie_path.clone(),
            domain: config.cookie_domain.clone(),
            expires: DateTime::<Utc>::from(UNIX_EPOCH),
            max_age: 0,
        }
    }

    pub fn is_deletion(&self) -> bool {
        self.value.is_empty() && self.max_age <= 0
    }

    /// Renders the `Set-Cookie` header value
    pub fn to_header_value(&self) -> Result<HeaderValue, AppError> {
        HeaderValue::from_str(&self.to_string()).map_err(|e| {
            tracing::error!(error = %e, cookie = %self.name, "Refresh cookie is not a valid header value");
            AppError::Internal
        })
    }
}

impl fmt::Display for RefreshCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Path={}; Domain={}; Expires={}; Max-Age={}; HttpOnly; Secure; SameSite=Strict",
            self.name,
            self.value,
            self.path,
            self.domain,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.max_age.max(0)
        )
    }
}

/// Returns the value of the first cookie called `name` across all Cookie headers
pub fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
}
