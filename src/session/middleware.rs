use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::shared::{AppError, AppState};

/// Bearer authentication middleware - validates the access token and adds its Claims to the request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), session::jwt_auth))
/// Handlers can then extract Extension(claims): Extension<Claims>.
#[instrument(skip(state, req, next), fields(uri = %req.uri()))]
pub async fn jwt_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let verified = bearer_token(req.headers())
        .and_then(|token| state.token_service.verify_access_token(token, Utc::now()));

    let mut response = match verified {
        Ok(claims) => {
            info!(sub = %claims.sub, "Authentication successful, adding claims to request");
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            warn!(error = %e, "Bearer authentication failed");
            e.into_response()
        }
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("no auth header".to_string()))?
        .to_str()
        .map_err(|_| AppError::MalformedHeader("header is not valid ASCII".to_string()))?;

    match auth_header.split(' ').collect::<Vec<_>>().as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(*token),
        _ => Err(AppError::MalformedHeader(
            "expected 'Bearer <token>'".to_string(),
        )),
    }
}
