//! Test utilities and fixtures for artist-sync tests.
//!
//! This module provides common test helpers, fixture factories, and
//! database utilities to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use artist_sync::test_utils::{temp_db, artist};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let record = artist("a1", "Coldplay");
//!     // ... test logic
//! }
//! ```

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::model::ArtistRecord;
use crate::sync::domain::CatalogCandidate;

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// An unsynced artist record without an image.
pub fn artist(id: &str, name: &str) -> ArtistRecord {
    ArtistRecord {
        id: id.to_string(),
        name: name.to_string(),
        image_url: None,
        catalog_url: None,
        catalog_id: None,
    }
}

/// An artist record that already carries a catalog identifier.
pub fn synced_artist(id: &str, name: &str, catalog_id: &str) -> ArtistRecord {
    ArtistRecord {
        catalog_id: Some(catalog_id.to_string()),
        catalog_url: Some(format!("https://open.spotify.com/artist/{}", catalog_id)),
        ..artist(id, name)
    }
}

/// A catalog candidate with sensible defaults.
///
/// Customize using struct update syntax:
///
/// ```ignore
/// let c = CatalogCandidate { popularity: 10, ..candidate("id", "Name") };
/// ```
pub fn candidate(id: &str, name: &str) -> CatalogCandidate {
    CatalogCandidate {
        id: id.to_string(),
        name: name.to_string(),
        image_url: Some(format!("https://i.scdn.co/image/{}", id)),
        url: format!("https://open.spotify.com/artist/{}", id),
        followers: 1_000,
        popularity: 50,
    }
}
