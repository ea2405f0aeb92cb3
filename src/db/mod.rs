//! Database module for SQLite persistence.
//!
//! SQLite is the content store: the durable, append-only record of every published
//! content version plus the contact messages.

mod repository;

pub use repository::*;

use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::OnceCell;

use crate::errors::AppError;

/// Lazily connected handle to the content store, shared for the process lifetime.
///
/// Concurrent first callers all await the same connection attempt. A failed
/// attempt leaves the handle empty so the next caller tries again.
pub struct ContentStore {
    database_url: String,
    pool: OnceCell<SqlitePool>,
    connect_attempts: AtomicUsize,
}

impl ContentStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: OnceCell::new(),
            connect_attempts: AtomicUsize::new(0),
        }
    }

    /// Get a repository, connecting on first use.
    pub async fn repository(&self) -> Result<Repository, AppError> {
        let pool = self
            .pool
            .get_or_try_init(|| async {
                self.connect_attempts.fetch_add(1, Ordering::SeqCst);
                tracing::info!("Connecting to content store");
                init_database(&self.database_url).await
            })
            .await?;

        Ok(Repository::new(pool.clone()))
    }

    /// Number of connection attempts made so far.
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }
}

/// Open a SQLite pool for `url`, creating the file and its directory if needed.
pub async fn open_pool(url: &str) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = sqlite_file_path(url).and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
    }

    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Initialize the content store connection pool and run migrations.
pub async fn init_database(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = open_pool(url).await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

fn sqlite_file_path(url: &str) -> Option<&Path> {
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(Path::new(path))
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS content_versions (
            content_type TEXT NOT NULL,
            version INTEGER NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (content_type, version)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contact_messages (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_contact_messages_created_at ON contact_messages(created_at);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
