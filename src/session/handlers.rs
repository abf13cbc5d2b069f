use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use tracing::{info, instrument, warn};

use super::{
    claims::Claims,
    cookie::find_cookie,
    types::{LoginRequest, SessionGrant},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for logging in
///
/// POST /authenticate
/// Returns the token pair and sets the refresh cookie
#[instrument(name = "authenticate", skip(state, payload))]
pub async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    info!("Processing login request");

    let Json(request) = payload.map_err(|rejection| {
        warn!(status = rejection.status().as_u16(), "Login body rejected");
        AppError::MalformedRequest(rejection.body_text())
    })?;

    let grant = state
        .session_service
        .login(&request.email, &request.password, Utc::now())
        .await?;

    grant_response(StatusCode::ACCEPTED, grant)
}

/// HTTP handler for rotating the session
///
/// GET /refresh
/// Reads the refresh cookie, returns a new token pair and replaces the cookie
#[instrument(name = "refresh", skip(state, headers))]
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    info!("Processing refresh request");

    let cookie_name = &state.token_service.config().cookie_name;
    let grant = state
        .session_service
        .refresh(find_cookie(&headers, cookie_name), Utc::now())
        .await?;

    grant_response(StatusCode::OK, grant)
}

/// HTTP handler for logging out
///
/// GET /logout
/// Always clears the refresh cookie
#[instrument(name = "logout", skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<Response, AppError> {
    let cookie = state.session_service.logout();

    Ok((
        StatusCode::ACCEPTED,
        [(header::SET_COOKIE, cookie.to_header_value()?)],
    )
        .into_response())
}

/// Returns the verified access-token claims of the caller
///
/// GET /admin/me (behind jwt_auth)
pub async fn current_session(Extension(claims): Extension<Claims>) -> Json<Claims> {
    Json(claims)
}

fn grant_response(status: StatusCode, grant: SessionGrant) -> Result<Response, AppError> {
    let cookie = grant.cookie.to_header_value()?;
    Ok((status, [(header::SET_COOKIE, cookie)], Json(grant.tokens)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::TokenPair;
    use crate::shared::test_utils::{test_user, AppStateBuilder, TEST_PASSWORD};
    use axum::{
        body::Body,
        http::Request,
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/authenticate", post(authenticate))
            .route("/refresh", get(refresh))
            .route("/logout", get(logout))
            .with_state(state)
    }

    fn login_request(email: &str, password: &str) -> Request<Body> {
        let body = serde_json::json!({ "email": email, "password": password }).to_string();
        Request::builder()
            .method("POST")
            .uri("/authenticate")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_handler() {
        let state = AppStateBuilder::new().with_user(test_user()).build();

        let response = app(state)
            .oneshot(login_request("ann@example.com", TEST_PASSWORD))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let tokens: TokenPair = serde_json::from_value(body_json(response).await).unwrap();
        assert!(cookie.starts_with(&format!("refresh_token={};", tokens.refresh_token)));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_authenticate_bad_credentials() {
        let state = AppStateBuilder::new().with_user(test_user()).build();

        let unknown = app(state.clone())
            .oneshot(login_request("ghost@example.com", TEST_PASSWORD))
            .await
            .unwrap();
        let wrong = app(state)
            .oneshot(login_request("ann@example.com", "nope"))
            .await
            .unwrap();

        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert!(unknown.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_json(unknown).await, body_json(wrong).await);
    }

    #[tokio::test]
    async fn test_authenticate_missing_field_is_bad_request() {
        let state = AppStateBuilder::new().with_user(test_user()).build();
        let request = Request::builder()
            .method("POST")
            .uri("/authenticate")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email":"ann@example.com"}"#))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Malformed request body"));
    }

    #[tokio::test]
    async fn test_authenticate_without_content_type_is_bad_request() {
        let state = AppStateBuilder::new().with_user(test_user()).build();
        let body = serde_json::json!({ "email": "ann@example.com", "password": TEST_PASSWORD });
        let request = Request::builder()
            .method("POST")
            .uri("/authenticate")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_authenticate_invalid_json_is_bad_request() {
        let state = AppStateBuilder::new().with_user(test_user()).build();
        let request = Request::builder()
            .method("POST")
            .uri("/authenticate")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refresh_handler_uses_cookie() {
        let state = AppStateBuilder::new().with_user(test_user()).build();

        let login = app(state.clone())
            .oneshot(login_request("ann@example.com", TEST_PASSWORD))
            .await
            .unwrap();
        let tokens: TokenPair = serde_json::from_value(body_json(login).await).unwrap();

        let request = Request::builder()
            .uri("/refresh")
            .header("cookie", format!("theme=dark; refresh_token={}", tokens.refresh_token))
            .body(Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_some());
        let refreshed: TokenPair = serde_json::from_value(body_json(response).await).unwrap();
        assert!(!refreshed.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_handler_without_cookie() {
        let state = AppStateBuilder::new().with_user(test_user()).build();

        let request = Request::builder()
            .uri("/refresh")
            .body(Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_logout_handler_without_cookie() {
        let state = AppStateBuilder::new().build();

        let request = Request::builder()
            .uri("/logout")
            .body(Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("refresh_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
