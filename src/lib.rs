// Library crate for the movies session-authentication API
// This file exposes the public API for integration tests

pub mod app;
pub mod config;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use app::build_router;
pub use config::{Cli, SigningConfig};
pub use session::{Claims, PrincipalSummary, TokenPair};
pub use shared::{AppError, AppState};
pub use user::{
    models::UserRecord, BcryptPasswordVerifier, InMemoryUserRepository, PasswordVerifier,
    UserLookup,
};
