// Public API - what other modules can use
pub use claims::Claims;
pub use handlers::{authenticate, current_session, logout, refresh};
pub use middleware::jwt_auth;
pub use types::{PrincipalSummary, TokenPair};

// Internal modules
pub mod claims;
pub mod cookie;
mod handlers;
mod middleware;
pub mod service;
pub mod token;
pub mod types;
