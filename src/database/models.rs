// Database Models
//
// Records persisted by the credential store, plus the row mapping used by the
// postgres backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Trait for converting from tokio-postgres Row
pub trait FromRow {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> where Self: Sized;
}

/// Registered user. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl FromRow for User {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password")?,
        })
    }
}

/// News article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl FromRow for News {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            author: row.try_get("author")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A news record about to be inserted; `created_at` is assigned by the store
#[derive(Debug, Clone)]
pub struct NewNews {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author: String,
}

/// Fields to overwrite on an existing record. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct NewsUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub author: Option<String>,
}

impl NewsUpdate {
    pub fn apply_to(self, news: &mut News) {
        if let Some(title) = self.title {
            news.title = title;
        }
        if let Some(body) = self.body {
            news.body = body;
        }
        if let Some(author) = self.author {
            news.author = author;
        }
    }
}
