//! Production observer: forwards pipeline events to `tracing`.

use super::domain::{ArtistFailure, BatchSummary, CatalogCandidate};
use super::traits::SyncObserver;
use crate::db::StoreError;
use crate::model::ArtistRecord;

/// Logs pipeline progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn batch_started(&self, total: usize, principal: &str) {
        tracing::info!("[{}] Starting catalog sync for {} artists", principal, total);
    }

    fn load_failed(&self, error: &StoreError) {
        tracing::error!("Failed to load artists: {}", error);
    }

    fn artist_skipped(&self, artist: &ArtistRecord) {
        tracing::debug!("Skipping {} - already has catalog ID", artist.name);
    }

    fn searching(&self, artist: &ArtistRecord) {
        tracing::debug!("Searching catalog for: {}", artist.name);
    }

    fn artist_updated(&self, artist: &ArtistRecord, candidate: &CatalogCandidate) {
        tracing::info!("Updated {} with catalog ID: {}", artist.name, candidate.id);
    }

    fn needs_review(&self, artist: &ArtistRecord, candidate: &CatalogCandidate) {
        tracing::warn!(
            "Medium confidence match for {} ({}) - needs review",
            artist.name,
            candidate.name
        );
    }

    fn not_found(&self, artist: &ArtistRecord) {
        tracing::warn!("No high-confidence catalog match for: {}", artist.name);
    }

    fn artist_failed(&self, artist: &ArtistRecord, failure: &ArtistFailure) {
        tracing::error!("Error processing {}: {}", artist.name, failure);
    }

    fn batch_finished(&self, summary: &BatchSummary, principal: &str) {
        tracing::info!(
            "[{}] Sync completed: {} updated, {} skipped, {} failed",
            principal,
            summary.updated,
            summary.skipped,
            summary.failed
        );
    }
}
