//! Reconciliation policy: what to do with a match result.
//!
//! Pure functions only. The service executes the decision; nothing here
//! touches the store or the catalog.

use super::domain::{CatalogCandidate, Confidence, MatchResult};
use crate::model::{ArtistRecord, ArtistUpdate};

/// Outcome of reconciling one unsynced artist against its match result.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// High confidence: write this update
    Apply {
        update: ArtistUpdate,
        candidate: CatalogCandidate,
    },
    /// Medium confidence: hold for manual review, never written
    Flag(CatalogCandidate),
    /// Nothing usable
    NotFound,
}

/// Idempotence guard: synced artists are never searched or written again.
pub fn should_skip(artist: &ArtistRecord) -> bool {
    artist.is_synced()
}

/// Build the update payload for an accepted candidate.
///
/// Catalog id and url are always set; the image only fills a gap and never
/// replaces a curated one.
pub fn build_update(artist: &ArtistRecord, candidate: &CatalogCandidate) -> ArtistUpdate {
    let image_url = if artist.has_image() {
        None
    } else {
        candidate.image_url.clone()
    };

    ArtistUpdate {
        catalog_id: candidate.id.clone(),
        catalog_url: candidate.url.clone(),
        image_url,
    }
}

/// Map a match result to a decision.
pub fn decide(artist: &ArtistRecord, result: MatchResult) -> Decision {
    match (result.confidence, result.candidate) {
        (Confidence::High, Some(candidate)) => Decision::Apply {
            update: build_update(artist, &candidate),
            candidate,
        },
        (Confidence::Medium, Some(candidate)) => Decision::Flag(candidate),
        // A classified match without a candidate is unusable
        (Confidence::High | Confidence::Medium, None) => Decision::NotFound,
        (Confidence::NoMatch, _) => Decision::NotFound,
    }
}
