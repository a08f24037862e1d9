//! # Database Module
//!
//! The credential store: users and news behind one async interface, with an
//! in-memory backend and a PostgreSQL backend (tokio-postgres + deadpool).

pub mod connection;
pub mod memory;
pub mod migrations;
pub mod models;

use async_trait::async_trait;

pub use connection::DatabaseConnection;
pub use memory::MemoryStore;
pub use models::*;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("author '{0}' does not exist")]
    UnknownAuthor(String),

    #[error("record not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence for users and news records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;

    /// Insert a user; fails with `DuplicateUsername` if the name is taken
    async fn insert_user(&self, user: User) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn list_news(&self) -> StoreResult<Vec<News>>;

    async fn get_news(&self, id: &str) -> StoreResult<Option<News>>;

    /// Insert a news record, assigning `created_at`. The author must exist.
    async fn insert_news(&self, news: NewNews) -> StoreResult<News>;

    /// Overwrite fields of an existing record and return it; `NotFound` on a miss
    async fn update_news(&self, id: &str, update: NewsUpdate) -> StoreResult<News>;

    /// Remove a record; `NotFound` when nothing matched
    async fn delete_news(&self, id: &str) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
}
