use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    cookie::RefreshCookie,
    token::TokenService,
    types::{PrincipalSummary, SessionGrant},
};
use crate::{
    config::SigningConfig,
    shared::AppError,
    user::{password::UNKNOWN_USER_HASH, PasswordVerifier, UserLookup},
};

/// Login, refresh and logout flows
pub struct SessionService {
    token_service: Arc<TokenService>,
    users: Arc<dyn UserLookup>,
    verifier: Arc<dyn PasswordVerifier>,
    config: Arc<SigningConfig>,
}

impl SessionService {
    pub fn new(
        token_service: Arc<TokenService>,
        users: Arc<dyn UserLookup>,
        verifier: Arc<dyn PasswordVerifier>,
        config: Arc<SigningConfig>,
    ) -> Self {
        Self {
            token_service,
            users,
            verifier,
            config,
        }
    }

    /// Exchanges credentials for a token pair and refresh cookie.
    /// Unknown email and wrong password are indistinguishable to the caller.
    #[instrument(skip(self, email, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionGrant, AppError> {
        let user = match self.users.lookup_user_by_email(email).await? {
            Some(user) => user,
            None => {
                self.verifier.verify_password(UNKNOWN_USER_HASH, password);
                warn!("Login attempt for unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self.verifier.verify_password(&user.password_hash, password) {
            warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let grant = self.grant(&PrincipalSummary::from(&user), now)?;
        info!(user_id = user.id, "User logged in");
        Ok(grant)
    }

    /// Rotates the session from a refresh-token cookie value
    #[instrument(skip(self, cookie_value))]
    pub async fn refresh(
        &self,
        cookie_value: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SessionGrant, AppError> {
        let refresh_token = cookie_value.ok_or_else(|| {
            warn!(cookie = %self.config.cookie_name, "Refresh requested without cookie");
            AppError::MissingRefreshCookie
        })?;

        let claims = self.token_service.verify_refresh_token(refresh_token, now)?;

        let user_id: i64 = claims.sub.parse().map_err(|_| {
            warn!(sub = %claims.sub, "Refresh token subject is not a user id");
            AppError::UnknownUser
        })?;

        let user = self.users.lookup_user_by_id(user_id).await?.ok_or_else(|| {
            warn!(user_id, "Refresh token subject no longer exists");
            AppError::UnknownUser
        })?;

        let grant = self.grant(&PrincipalSummary::from(&user), now)?;
        info!(user_id, "Session refreshed");
        Ok(grant)
    }

    /// Cookie deletion instruction; succeeds whatever the request carried
    #[instrument(skip(self))]
    pub fn logout(&self) -> RefreshCookie {
        info!("Clearing refresh cookie");
        RefreshCookie::expired(&self.config)
    }

    fn grant(
        &self,
        principal: &PrincipalSummary,
        now: DateTime<Utc>,
    ) -> Result<SessionGrant, AppError> {
        let tokens = self.token_service.issue_token_pair(principal, now)?;
        let cookie = RefreshCookie::issue(&self.config, &tokens.refresh_token, now)?;

        Ok(SessionGrant { tokens, cookie })
    }
}
