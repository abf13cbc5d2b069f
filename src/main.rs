use axum::http::{header, HeaderName, HeaderValue, Method};
use chrono::Utc;
use clap::Parser;
use movies_auth::{
    build_router,
    user::{BcryptPasswordVerifier, InMemoryUserRepository, PostgresUserRepository, UserLookup},
    AppState, Cli, UserRecord,
};
use sqlx::postgres::PgPoolOptions;
use std::{error::Error, sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env file is fine; the environment may already be populated
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movies_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Arc::new(cli.signing_config()?);
    info!(?config, "Starting movies auth service");

    let users: Arc<dyn UserLookup> = match &cli.dsn {
        Some(dsn) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(5))
                .connect(dsn)
                .await?;
            info!("Connected to Postgres user store");
            Arc::new(PostgresUserRepository::new(pool))
        }
        None => {
            warn!("No DATABASE_URL given, serving the in-memory demo user store");
            Arc::new(demo_user_store()?)
        }
    };

    let app_state = AppState::new(config, users, Arc::new(BcryptPasswordVerifier::new()));

    let cors = CorsLayer::new()
        .allow_origin(cli.frontend_origin.parse::<HeaderValue>()?)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-csrf-token"),
        ]);

    let app = build_router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cli.port)).await?;
    info!(port = cli.port, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Single demo account for running without a database
fn demo_user_store() -> Result<InMemoryUserRepository, bcrypt::BcryptError> {
    let now = Utc::now();
    let admin = UserRecord {
        id: 1,
        email: "admin@example.com".to_string(),
        first_name: "Admin".to_string(),
        last_name: "User".to_string(),
        password_hash: bcrypt::hash("secret", bcrypt::DEFAULT_COST)?,
        created_at: now,
        updated_at: now,
    };

    Ok(InMemoryUserRepository::with_users(vec![admin]))
}
