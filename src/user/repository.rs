use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::UserRecord;
use crate::shared::AppError;

/// Read-only capability the session flow needs from a user store
///
/// `Ok(None)` means the user does not exist; `Err` is reserved for the store
/// itself failing.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn lookup_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;
    async fn lookup_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, AppError>;
}

/// In-memory implementation of UserLookup for development and testing
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<i64, UserRecord>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated users
    pub fn with_users(users: Vec<UserRecord>) -> Self {
        let user_map = users.into_iter().map(|user| (user.id, user)).collect();

        Self {
            users: RwLock::new(user_map),
        }
    }

    pub async fn insert_user(&self, user: UserRecord) {
        self.users.write().await.insert(user.id, user);
    }

    /// Removes a user, returning whether it existed
    pub async fn remove_user(&self, id: i64) -> bool {
        self.users.write().await.remove(&id).is_some()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserLookup for InMemoryUserRepository {
    #[instrument(skip(self, email))]
    async fn lookup_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let users = self.users.read().await;
        let user = users.values().find(|user| user.email == email).cloned();

        match &user {
            Some(u) => debug!(user_id = u.id, "User found in memory"),
            None => debug!("No user with that email in memory"),
        }

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn lookup_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, AppError> {
        let user = self.users.read().await.get(&id).cloned();

        if user.is_none() {
            debug!(user_id = id, "User not found in memory");
        }

        Ok(user)
    }
}

/// PostgreSQL implementation of the user store
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id::bigint AS id, email, first_name, last_name, password, created_at, updated_at";

#[async_trait]
impl UserLookup for PostgresUserRepository {
    #[instrument(skip(self, email))]
    async fn lookup_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        debug!("Fetching user by email from database");

        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user by email");
            AppError::from(e)
        })
    }

    #[instrument(skip(self))]
    async fn lookup_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, AppError> {
        debug!(user_id = id, "Fetching user by id from database");

        sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = id, "Failed to fetch user by id");
                AppError::from(e)
            })
    }
}
