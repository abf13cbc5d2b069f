use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::session;
use crate::shared::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
}

pub async fn home() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "active",
        message: "Movies auth service up and running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Public session routes plus the bearer-protected admin routes
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/me", get(session::current_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), session::jwt_auth));

    Router::new()
        .route("/", get(home))
        .route("/authenticate", post(session::authenticate))
        .route("/refresh", get(session::refresh))
        .route("/logout", get(session::logout))
        .nest("/admin", admin)
        .with_state(state)
}
