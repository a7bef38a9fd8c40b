//! Database module for artist persistence.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Provides async operations for:
//! - Listing artists in deterministic (name-ascending) order
//! - Single-record transactional updates of catalog fields
//! - Inserting and fetching artist records
//!
//! [`SqliteArtistStore`] wraps a pool and implements the
//! [`ArtistStore`](crate::sync::traits::ArtistStore) seam used by the sync
//! pipeline.
//!
//! # Example
//!
//! ```ignore
//! use artist_sync::db::{init_db, list_artists};
//!
//! let pool = init_db("sqlite:artist_sync.db").await?;
//! let artists = list_artists(&pool).await?;
//! ```

use async_trait::async_trait;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::model::{ArtistRecord, ArtistUpdate};
use crate::sync::traits::ArtistStore;

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "artist_sync.db";

/// Errors raised by the artist store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying SQLx failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// The store could not be reached at all
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// No artist row matched the given id
    #[error("Artist not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// HTTP-equivalent status code derived from the failure.
    ///
    /// Connectivity problems map to 503, everything else to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::Unavailable(_) => 503,
            StoreError::Database(_) => 500,
            StoreError::NotFound(_) => 404,
        }
    }
}

/// SQLite primary result code for "unable to open database file"
const SQLITE_CANTOPEN: i64 = 14;

impl From<sqlx::Error> for StoreError {
    /// Connection-level failures become [`StoreError::Unavailable`].
    fn from(e: sqlx::Error) -> Self {
        let unreachable = match &e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
            sqlx::Error::Database(db) => db
                .code()
                .and_then(|code| code.parse::<i64>().ok())
                .is_some_and(|code| code & 0xff == SQLITE_CANTOPEN),
            _ => false,
        };

        if unreachable {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Database(e)
        }
    }
}

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&std::path::Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Get all artists, ordered by name ascending.
///
/// Ties on name are broken by id so repeated runs see the same order.
pub async fn list_artists(pool: &SqlitePool) -> sqlx::Result<Vec<ArtistRecord>> {
    sqlx::query_as::<_, ArtistRecord>(
        "SELECT id, name, image_url, catalog_url, catalog_id FROM artists ORDER BY name ASC, id ASC",
    )
    .fetch_all(pool)
    .await
}

/// Get artists that have not been matched to the catalog yet.
pub async fn list_unsynced_artists(pool: &SqlitePool) -> sqlx::Result<Vec<ArtistRecord>> {
    sqlx::query_as::<_, ArtistRecord>(
        r#"
        SELECT id, name, image_url, catalog_url, catalog_id
        FROM artists
        WHERE catalog_id IS NULL OR catalog_id = ''
        ORDER BY name ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Get an artist by its database ID.
pub async fn get_artist(pool: &SqlitePool, id: &str) -> sqlx::Result<Option<ArtistRecord>> {
    sqlx::query_as::<_, ArtistRecord>(
        "SELECT id, name, image_url, catalog_url, catalog_id FROM artists WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Insert a new artist and return its generated ID.
pub async fn insert_artist(
    pool: &SqlitePool,
    name: &str,
    image_url: Option<&str>,
) -> sqlx::Result<String> {
    let row: (String,) =
        sqlx::query_as("INSERT INTO artists (name, image_url) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(image_url)
            .fetch_one(pool)
            .await?;

    Ok(row.0)
}

/// Apply a catalog update to a single artist inside a transaction.
///
/// `catalog_id` and `catalog_url` are always written; `image_url` only when
/// the update carries one. Fails with [`StoreError::NotFound`] (and rolls
/// back) when no row has the given id.
pub async fn update_artist(
    pool: &SqlitePool,
    id: &str,
    update: &ArtistUpdate,
) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE artists
        SET catalog_id = ?,
            catalog_url = ?,
            image_url = COALESCE(?, image_url)
        WHERE id = ?
        "#,
    )
    .bind(&update.catalog_id)
    .bind(&update.catalog_url)
    .bind(&update.image_url)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() != 1 {
        tx.rollback().await?;
        return Err(StoreError::NotFound(id.to_string()));
    }

    tx.commit().await?;
    Ok(())
}

/// [`ArtistStore`] backed by a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteArtistStore {
    pool: SqlitePool,
}

impl SqliteArtistStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArtistStore for SqliteArtistStore {
    async fn list_artists(&self) -> Result<Vec<ArtistRecord>, StoreError> {
        Ok(list_artists(&self.pool).await?)
    }

    async fn update_artist(&self, id: &str, update: &ArtistUpdate) -> Result<(), StoreError> {
        update_artist(&self.pool, id, update).await
    }
}
