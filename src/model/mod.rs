//! Core data models for the artist store.
//!
//! Defines [`ArtistRecord`], the persisted artist row, and [`ArtistUpdate`],
//! the partial payload the sync pipeline writes back.
//!
//! # Database Schema
//!
//! The models map to the `artists` table:
//! - `id` - opaque text identifier
//! - `name` - artist name as curated locally
//! - `image_url`, `catalog_url`, `catalog_id` - optional catalog data

use sqlx::FromRow;

/// An artist in the local store.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ArtistRecord {
    /// Opaque database identifier
    pub id: String,
    /// Artist name
    pub name: String,
    /// Curated image URL (never overwritten by sync)
    pub image_url: Option<String>,
    /// Link to the artist's catalog page
    pub catalog_url: Option<String>,
    /// External catalog identifier; set means "already synced"
    pub catalog_id: Option<String>,
}

impl ArtistRecord {
    /// Whether this record already carries a catalog identifier.
    ///
    /// Synced records are never searched or written again.
    pub fn is_synced(&self) -> bool {
        self.catalog_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Whether the record has a curated image.
    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// Partial update applied to a single artist after a high-confidence match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistUpdate {
    pub catalog_id: String,
    pub catalog_url: String,
    /// Only present when the record had no image of its own
    pub image_url: Option<String>,
}

impl ArtistUpdate {
    /// Apply this update to an in-memory record.
    pub fn apply_to(&self, record: &mut ArtistRecord) {
        record.catalog_id = Some(self.catalog_id.clone());
        record.catalog_url = Some(self.catalog_url.clone());
        if let Some(ref url) = self.image_url {
            record.image_url = Some(url.clone());
        }
    }
}
