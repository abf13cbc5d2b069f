use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tower::ServiceExt;

use movies_auth::{
    build_router, AppState, BcryptPasswordVerifier, InMemoryUserRepository, SigningConfig,
    TokenPair, UserRecord,
};

pub const PASSWORD: &str = "popcorn-and-soda";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestApp {
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
    pub router: Router,
}

pub struct TestAppBuilder {
    config: SigningConfig,
    users: Vec<UserRecord>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            config: SigningConfig {
                issuer: "movies.example.com".to_string(),
                audience: "movies.example.com".to_string(),
                secret: b"integration-secret".to_vec(),
                access_ttl: Duration::minutes(15),
                refresh_ttl: Duration::hours(24),
                cookie_name: "jwt_refresh".to_string(),
                cookie_path: "/".to_string(),
                cookie_domain: "localhost".to_string(),
            },
            users: vec![],
        }
    }

    pub fn with_user(mut self, id: i64, first: &str, last: &str, email: &str) -> Self {
        let now = Utc::now();
        self.users.push(UserRecord {
            id,
            email: email.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            password_hash: bcrypt::hash(PASSWORD, 4).unwrap(),
            created_at: now,
            updated_at: now,
        });
        self
    }

    pub fn with_ann(self) -> Self {
        self.with_user(1, "Ann", "Lee", "ann@example.com")
    }

    pub fn build(self) -> TestApp {
        let users = Arc::new(InMemoryUserRepository::with_users(self.users));
        let state = AppState::new(
            Arc::new(self.config),
            users.clone(),
            Arc::new(BcryptPasswordVerifier::new()),
        );

        TestApp {
            router: build_router(state.clone()),
            state,
            users,
        }
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> Response<Body> {
        let body = serde_json::json!({ "email": email, "password": password }).to_string();
        self.send(
            Request::builder()
                .method("POST")
                .uri("/authenticate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn refresh(&self, cookie: Option<&str>) -> Response<Body> {
        self.send(with_cookie("/refresh", cookie)).await
    }

    pub async fn logout(&self, cookie: Option<&str>) -> Response<Body> {
        self.send(with_cookie("/logout", cookie)).await
    }

    pub async fn admin_me(&self, authorization: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri("/admin/me");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

fn with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Logs Ann in and returns the token pair plus the raw Set-Cookie value
pub async fn login_ann(app: &TestApp) -> (TokenPair, String) {
    let response = app.login("ann@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let set_cookie = set_cookie(&response).expect("login should set the refresh cookie");
    (json_body(response).await, set_cookie)
}

pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|value| value.to_str().unwrap().to_string())
}

/// The `name=value` pair a browser would send back for a Set-Cookie header
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}

pub async fn json_body<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
