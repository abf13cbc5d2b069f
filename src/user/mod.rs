// Public API - what other modules can use
pub use password::{BcryptPasswordVerifier, PasswordVerifier};
pub use repository::{InMemoryUserRepository, PostgresUserRepository, UserLookup};

// Internal modules
pub mod models;
pub mod password;
pub mod repository;
