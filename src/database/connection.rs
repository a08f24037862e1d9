// Database Connection Management
//
// PostgreSQL credential store using tokio-postgres and a deadpool connection pool.
use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::str::FromStr;
use std::time::Duration;
use tokio_postgres::config::Host;
use tokio_postgres::error::SqlState;

use super::migrations;
use super::models::FromRow;
use super::{CredentialStore, NewNews, News, NewsUpdate, StoreError, StoreResult, User};

/// Database configuration: the parsed connection settings plus pool sizing
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Everything the URL carries (hosts, credentials, `sslmode`, `connect_timeout`, `options`)
    pub pg: tokio_postgres::Config,
    pub max_size: usize,
    pub timeouts: deadpool_postgres::Timeouts,
}

impl DatabaseConfig {
    /// Create configuration from a `postgres://` connection URL
    pub fn from_url(database_url: &str, max_size: usize) -> Result<Self> {
        let pg = tokio_postgres::Config::from_str(database_url)
            .context("Failed to parse DATABASE_URL")?;

        Ok(Self {
            pg,
            max_size,
            timeouts: deadpool_postgres::Timeouts {
                wait: Some(Duration::from_secs(30)),
                create: Some(Duration::from_secs(30)),
                recycle: Some(Duration::from_secs(30)),
            },
        })
    }

    /// `host:port/dbname` for logs, without credentials
    fn masked_target(&self) -> String {
        let host = match self.pg.get_hosts().first() {
            Some(Host::Tcp(h)) => h.clone(),
            Some(Host::Unix(p)) => p.to_string_lossy().to_string(),
            None => "localhost".to_string(),
        };
        let port = self.pg.get_ports().first().copied().unwrap_or(5432);
        format!("{}:{}/{}", host, port, self.pg.get_dbname().unwrap_or_default())
    }
}

/// Database connection wrapper
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: Pool,
}

impl DatabaseConnection {
    /// Connect, verify the connection, and create the schema if needed
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        tracing::info!("🔌 Connecting to database: {}", config.masked_target());

        let tls_connector = TlsConnector::builder().build().context("Failed to build TLS connector")?;
        let tls = MakeTlsConnector::new(tls_connector);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(config.pg, tls, mgr_config);

        let pool = Pool::builder(mgr)
            .max_size(config.max_size)
            .wait_timeout(config.timeouts.wait)
            .create_timeout(config.timeouts.create)
            .recycle_timeout(config.timeouts.recycle)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .context("Failed to create database pool")?;

        let client = pool
            .get()
            .await
            .context("Failed to get connection from pool")?;
        client
            .query("SELECT 1", &[])
            .await
            .context("Failed to test database connection")?;
        drop(client);

        migrations::run_migrations(&pool).await?;

        tracing::info!("✅ Database connection established successfully");

        Ok(Self { pool })
    }

    /// Create connection from database URL
    pub async fn from_url(url: &str, max_size: usize) -> Result<Self> {
        let config = DatabaseConfig::from_url(url, max_size)?;
        Self::new(config).await
    }

    async fn client(&self) -> StoreResult<deadpool_postgres::Client> {
        self.pool
            .get()
            .await
            .context("Failed to get DB connection")
            .map_err(StoreError::Backend)
    }
}

fn backend_error(err: tokio_postgres::Error, what: &'static str) -> StoreError {
    StoreError::Backend(anyhow::Error::new(err).context(what))
}

fn is(err: &tokio_postgres::Error, state: &SqlState) -> bool {
    err.code() == Some(state)
}

fn news_from_row(row: &tokio_postgres::Row) -> StoreResult<News> {
    News::from_row(row).map_err(|e| backend_error(e, "Failed to decode news row"))
}

#[async_trait]
impl CredentialStore for DatabaseConnection {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let client = self.client().await?;
        client
            .execute(
                "INSERT INTO users (id, username, password) VALUES ($1, $2, $3)",
                &[&user.id, &user.username, &user.password_hash],
            )
            .await
            .map_err(|e| {
                if is(&e, &SqlState::UNIQUE_VIOLATION) {
                    StoreError::DuplicateUsername(user.username.clone())
                } else {
                    backend_error(e, "Failed to insert user")
                }
            })?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT id, username, password FROM users WHERE id = $1", &[&id])
            .await
            .map_err(|e| backend_error(e, "Failed to query user by id"))?;
        row.map(|r| User::from_row(&r))
            .transpose()
            .map_err(|e| backend_error(e, "Failed to decode user row"))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT id, username, password FROM users WHERE username = $1", &[&username])
            .await
            .map_err(|e| backend_error(e, "Failed to query user by username"))?;
        row.map(|r| User::from_row(&r))
            .transpose()
            .map_err(|e| backend_error(e, "Failed to decode user row"))
    }

    async fn list_news(&self) -> StoreResult<Vec<News>> {
        let client = self.client().await?;
        let rows = client
            .query("SELECT id, title, body, author, created_at FROM news ORDER BY created_at, id", &[])
            .await
            .map_err(|e| backend_error(e, "Failed to list news"))?;
        rows.iter().map(news_from_row).collect()
    }

    async fn get_news(&self, id: &str) -> StoreResult<Option<News>> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT id, title, body, author, created_at FROM news WHERE id = $1", &[&id])
            .await
            .map_err(|e| backend_error(e, "Failed to query news by id"))?;
        row.as_ref().map(news_from_row).transpose()
    }

    async fn insert_news(&self, news: NewNews) -> StoreResult<News> {
        let client = self.client().await?;
        let row = client
            .query_one(
                "INSERT INTO news (id, title, body, author) VALUES ($1, $2, $3, $4) \
                 RETURNING id, title, body, author, created_at",
                &[&news.id, &news.title, &news.body, &news.author],
            )
            .await
            .map_err(|e| {
                if is(&e, &SqlState::FOREIGN_KEY_VIOLATION) {
                    StoreError::UnknownAuthor(news.author.clone())
                } else {
                    backend_error(e, "Failed to insert news")
                }
            })?;
        news_from_row(&row)
    }

    async fn update_news(&self, id: &str, update: NewsUpdate) -> StoreResult<News> {
        let client = self.client().await?;
        let author = update.author.clone();
        let row = client
            .query_opt(
                "UPDATE news SET title = COALESCE($1, title), body = COALESCE($2, body), \
                 author = COALESCE($3, author) WHERE id = $4 \
                 RETURNING id, title, body, author, created_at",
                &[&update.title, &update.body, &update.author, &id],
            )
            .await
            .map_err(|e| {
                if is(&e, &SqlState::FOREIGN_KEY_VIOLATION) {
                    StoreError::UnknownAuthor(author.unwrap_or_default())
                } else {
                    backend_error(e, "Failed to update news")
                }
            })?;
        match row {
            Some(row) => news_from_row(&row),
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_news(&self, id: &str) -> StoreResult<()> {
        let client = self.client().await?;
        let affected = client
            .execute("DELETE FROM news WHERE id = $1", &[&id])
            .await
            .map_err(|e| backend_error(e, "Failed to delete news"))?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        let client = self.client().await?;
        client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| backend_error(e, "Database health check failed"))?;
        Ok(())
    }
}
