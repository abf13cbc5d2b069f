use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::claims::{
    check_expiry, decode_and_verify_signature, encode_access_claims, encode_refresh_claims, Claims,
};
use super::types::{PrincipalSummary, TokenPair};
use crate::config::SigningConfig;
use crate::shared::AppError;

/// Issues token pairs and applies verification policy on top of the codec
pub struct TokenService {
    config: Arc<SigningConfig>,
}

impl TokenService {
    pub fn new(config: Arc<SigningConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    /// Signs a fresh access token and refresh token for the principal
    #[instrument(skip(self, principal), fields(user_id = principal.id))]
    pub fn issue_token_pair(
        &self,
        principal: &PrincipalSummary,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AppError> {
        let access_token = encode_access_claims(principal, &self.config, now)?;
        let refresh_token = encode_refresh_claims(principal, &self.config, now)?;

        debug!(issued_at = now.timestamp(), "Issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Validates signature, expiry and issuer of an access token.
    /// Audience is carried but not enforced.
    #[instrument(skip(self, token))]
    pub fn verify_access_token(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let claims = decode_and_verify_signature(token, &self.config.secret)?;
        check_expiry(&claims, now)?;

        if claims.iss.as_deref() != Some(self.config.issuer.as_str()) {
            warn!(
                expected = %self.config.issuer,
                found = ?claims.iss,
                "Access token issuer mismatch"
            );
            return Err(AppError::InvalidIssuer);
        }

        debug!(sub = %claims.sub, exp = claims.exp, "Access token verified");
        Ok(claims)
    }

    /// Validates signature and expiry of a refresh token
    #[instrument(skip(self, token))]
    pub fn verify_refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Claims, AppError> {
        let claims = decode_and_verify_signature(token, &self.config.secret)?;
        check_expiry(&claims, now)?;

        debug!(sub = %claims.sub, exp = claims.exp, "Refresh token verified");
        Ok(claims)
    }
}
