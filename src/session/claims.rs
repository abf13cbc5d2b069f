use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::types::PrincipalSummary;
use crate::config::SigningConfig;
use crate::shared::AppError;

/// Algorithm used for every token this service signs
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Header algorithms accepted on inbound tokens
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
}

/// Claim set carried by access tokens
#[derive(Debug, Clone, Serialize)]
struct AccessClaims<'a> {
    sub: String,
    name: String,
    aud: &'a str,
    iss: &'a str,
    iat: i64,
    exp: i64,
    typ: TokenType,
}

/// Claim set carried by refresh tokens: the user id and the validity window, nothing else
#[derive(Debug, Clone, Serialize)]
struct RefreshClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Claims recovered from a verified token of either kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, rename = "typ", skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,
    pub iat: i64, // Issued at, unix seconds
    pub exp: i64, // Expiry, unix seconds
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

#[instrument(skip(principal, config), fields(user_id = principal.id))]
pub fn encode_access_claims(
    principal: &PrincipalSummary,
    config: &SigningConfig,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let iat = now.timestamp();
    let claims = AccessClaims {
        sub: principal.subject(),
        name: principal.display_name(),
        aud: &config.audience,
        iss: &config.issuer,
        iat,
        exp: iat + config.access_ttl.num_seconds(),
        typ: TokenType::Access,
    };

    debug!(exp = claims.exp, "Signing access token");
    sign(&claims, &config.secret)
}

#[instrument(skip(principal, config), fields(user_id = principal.id))]
pub fn encode_refresh_claims(
    principal: &PrincipalSummary,
    config: &SigningConfig,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let iat = now.timestamp();
    let claims = RefreshClaims {
        sub: principal.subject(),
        iat,
        exp: iat + config.refresh_ttl.num_seconds(),
    };

    debug!(exp = claims.exp, "Signing refresh token");
    sign(&claims, &config.secret)
}

fn sign<T: Serialize>(claims: &T, secret: &[u8]) -> Result<String, AppError> {
    if secret.is_empty() {
        return Err(AppError::SigningFailure(
            "signing secret is empty".to_string(),
        ));
    }

    encode(
        &Header::new(SIGNING_ALGORITHM),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| {
        debug!(error = %e, "Failed to encode token");
        AppError::SigningFailure(e.to_string())
    })
}

/// Checks structure, declared algorithm and signature; expiry is left to the caller
#[instrument(skip_all)]
pub fn decode_and_verify_signature(token: &str, secret: &[u8]) -> Result<Claims, AppError> {
    ensure_hmac_header(token)?;

    let mut validation = Validation::new(SIGNING_ALGORITHM);
    validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Token rejected by decoder");
            match e.kind() {
                ErrorKind::InvalidSignature => AppError::SignatureMismatch,
                ErrorKind::InvalidAlgorithm => {
                    AppError::UnsupportedAlgorithm("algorithm not in HMAC family".to_string())
                }
                ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::MalformedToken(e.to_string()),
            }
        })
}

/// Rejects any token whose raw header does not declare an HMAC algorithm.
/// Runs before the decoder sees the token so `none` and asymmetric algorithms
/// never reach key selection.
fn ensure_hmac_header(token: &str) -> Result<(), AppError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(AppError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(segments[0])
        .map_err(|e| AppError::MalformedToken(format!("header is not base64url: {e}")))?;
    let header: RawHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| AppError::MalformedToken(format!("header is not valid JSON: {e}")))?;

    match header.alg.as_str() {
        "HS256" | "HS384" | "HS512" => Ok(()),
        other => {
            debug!(alg = %other, "Rejecting token with non-HMAC algorithm");
            Err(AppError::UnsupportedAlgorithm(other.to_string()))
        }
    }
}

/// A token is valid up to and including its `exp` second
pub fn check_expiry(claims: &Claims, now: DateTime<Utc>) -> Result<(), AppError> {
    if now.timestamp() > claims.exp {
        debug!(exp = claims.exp, now = now.timestamp(), "Token expired");
        return Err(AppError::ExpiredToken);
    }
    Ok(())
}
