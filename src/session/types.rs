use serde::{Deserialize, Serialize};

use super::cookie::RefreshCookie;
use crate::user::models::UserRecord;

/// Minimal identity projected into a token
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl PrincipalSummary {
    /// Token subject: the stringified user id
    pub fn subject(&self) -> String {
        self.id.to_string()
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<&UserRecord> for PrincipalSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Response body for login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// What a successful login or refresh hands back to the transport layer
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub tokens: TokenPair,
    pub cookie: RefreshCookie,
}
