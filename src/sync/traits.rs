//! Trait definitions for the collaborators of the sync pipeline.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses the SQLite store, the Spotify client and the
//! tracing observer, while tests substitute the mocks below.
//!
//! # Example
//!
//! ```ignore
//! use artist_sync::sync::traits::{ArtistMatcher, ArtistStore};
//!
//! // In production code:
//! let service = SyncService::new(store, matcher, TracingObserver, config);
//!
//! // In tests:
//! let service = SyncService::new(MockStore::with_artists(..), MockMatcher::new(), ..);
//! ```

use async_trait::async_trait;

use super::domain::{
    ArtistFailure, BatchSummary, CatalogCandidate, CatalogError, MatchResult,
};
use crate::db::StoreError;
use crate::model::{ArtistRecord, ArtistUpdate};

/// Persistent artist storage.
#[async_trait]
pub trait ArtistStore: Send + Sync {
    /// All artists, ordered by name ascending.
    async fn list_artists(&self) -> Result<Vec<ArtistRecord>, StoreError>;

    /// Apply a partial update to exactly one artist.
    async fn update_artist(&self, id: &str, update: &ArtistUpdate) -> Result<(), StoreError>;
}

/// Raw artist search against the external catalog.
///
/// Implementations own their retry, backoff and timeout policy.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search_artists(&self, name: &str) -> Result<Vec<CatalogCandidate>, CatalogError>;
}

/// Match engine: find and classify the best catalog entry for a name.
///
/// Must not mutate any artist state.
#[async_trait]
pub trait ArtistMatcher: Send + Sync {
    async fn match_artist(&self, name: &str) -> Result<MatchResult, CatalogError>;
}

/// Receives progress events from the pipeline.
///
/// All methods default to no-ops so observers only implement what they need.
pub trait SyncObserver: Send + Sync {
    fn batch_started(&self, _total: usize, _principal: &str) {}
    fn load_failed(&self, _error: &StoreError) {}
    fn artist_skipped(&self, _artist: &ArtistRecord) {}
    fn searching(&self, _artist: &ArtistRecord) {}
    fn artist_updated(&self, _artist: &ArtistRecord, _candidate: &CatalogCandidate) {}
    fn needs_review(&self, _artist: &ArtistRecord, _candidate: &CatalogCandidate) {}
    fn not_found(&self, _artist: &ArtistRecord) {}
    fn artist_failed(&self, _artist: &ArtistRecord, _failure: &ArtistFailure) {}
    fn batch_finished(&self, _summary: &BatchSummary, _principal: &str) {}
}

#[async_trait]
impl<T: ArtistStore + ?Sized> ArtistStore for std::sync::Arc<T> {
    async fn list_artists(&self) -> Result<Vec<ArtistRecord>, StoreError> {
        (**self).list_artists().await
    }

    async fn update_artist(&self, id: &str, update: &ArtistUpdate) -> Result<(), StoreError> {
        (**self).update_artist(id, update).await
    }
}

#[async_trait]
impl<T: ArtistMatcher + ?Sized> ArtistMatcher for std::sync::Arc<T> {
    async fn match_artist(&self, name: &str) -> Result<MatchResult, CatalogError> {
        (**self).match_artist(name).await
    }
}

impl<T: SyncObserver + ?Sized> SyncObserver for std::sync::Arc<T> {
    fn batch_started(&self, total: usize, principal: &str) {
        (**self).batch_started(total, principal)
    }
    fn load_failed(&self, error: &StoreError) {
        (**self).load_failed(error)
    }
    fn artist_skipped(&self, artist: &ArtistRecord) {
        (**self).artist_skipped(artist)
    }
    fn searching(&self, artist: &ArtistRecord) {
        (**self).searching(artist)
    }
    fn artist_updated(&self, artist: &ArtistRecord, candidate: &CatalogCandidate) {
        (**self).artist_updated(artist, candidate)
    }
    fn needs_review(&self, artist: &ArtistRecord, candidate: &CatalogCandidate) {
        (**self).needs_review(artist, candidate)
    }
    fn not_found(&self, artist: &ArtistRecord) {
        (**self).not_found(artist)
    }
    fn artist_failed(&self, artist: &ArtistRecord, failure: &ArtistFailure) {
        (**self).artist_failed(artist, failure)
    }
    fn batch_finished(&self, summary: &BatchSummary, principal: &str) {
        (**self).batch_finished(summary, principal)
    }
}
