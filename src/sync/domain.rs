//! Internal domain models for catalog matching and batch reconciliation.
//!
//! These types are OUR types - they don't change when the catalog API changes.
//! Catalog responses get converted into [`CatalogCandidate`] by the adapter in
//! [`crate::catalog`].

use serde::Serialize;

use crate::db::StoreError;

/// An artist entry returned by the external catalog.
///
/// Ephemeral: only `id`, `url` and `image_url` ever reach the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCandidate {
    /// Catalog artist ID
    pub id: String,
    /// Name as listed in the catalog
    pub name: String,
    /// Largest available artist image
    pub image_url: Option<String>,
    /// Public catalog page
    pub url: String,
    /// Follower count
    pub followers: u64,
    /// Catalog popularity (0-100)
    pub popularity: u32,
}

/// How strongly the best candidate matches the queried name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Nothing cleared the minimum bar
    #[serde(rename = "none")]
    NoMatch,
    /// Plausible but not exact; needs a human
    Medium,
    /// Near-exact normalized match; safe to auto-apply
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::NoMatch => "none",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running the match engine for one name.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Best candidate; absent when confidence is [`Confidence::NoMatch`]
    pub candidate: Option<CatalogCandidate>,
    pub confidence: Confidence,
    /// Similarity of the best candidate (0.0 to 1.0)
    pub similarity: f32,
}

impl MatchResult {
    /// A result with no usable candidate.
    pub fn no_match() -> Self {
        Self {
            candidate: None,
            confidence: Confidence::NoMatch,
            similarity: 0.0,
        }
    }
}

/// Errors that can occur while searching the catalog.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog credentials missing: {0}")]
    MissingCredentials(String),

    #[error("Authentication with catalog failed: {0}")]
    Auth(String),

    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Rate limited - retries exhausted")]
    RateLimited,

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Invalid matcher configuration: {0}")]
    InvalidConfig(String),
}

/// Why a single artist ended in the `error` state.
#[derive(Debug, thiserror::Error)]
pub enum ArtistFailure {
    /// Search or scoring failed
    #[error("match failed: {0}")]
    Match(#[from] CatalogError),

    /// The store rejected the update
    #[error("update failed: {0}")]
    Write(#[from] StoreError),

    /// Processing the artist panicked
    #[error("unexpected failure: {0}")]
    Panic(String),
}

/// Wire status of a processed artist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Updated,
    Skipped,
    NotFound,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Updated => "updated",
            SyncStatus::Skipped => "skipped",
            SyncStatus::NotFound => "not_found",
            SyncStatus::Error => "error",
        }
    }

    /// Whether this status counts against the batch.
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncStatus::NotFound | SyncStatus::Error)
    }
}

/// Per-artist result, collected into the batch report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub artist_name: String,
    pub status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<CatalogCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MatchOutcome {
    fn new(artist_name: &str, status: SyncStatus) -> Self {
        Self {
            artist_name: artist_name.to_string(),
            status,
            candidate: None,
            confidence: None,
            error: None,
        }
    }

    pub fn skipped(artist_name: &str) -> Self {
        Self::new(artist_name, SyncStatus::Skipped)
    }

    pub fn updated(artist_name: &str, candidate: CatalogCandidate) -> Self {
        Self {
            candidate: Some(candidate),
            confidence: Some(Confidence::High),
            ..Self::new(artist_name, SyncStatus::Updated)
        }
    }

    /// Medium-confidence match held back for manual review.
    pub fn flagged(artist_name: &str, candidate: CatalogCandidate) -> Self {
        Self {
            candidate: Some(candidate),
            confidence: Some(Confidence::Medium),
            ..Self::new(artist_name, SyncStatus::NotFound)
        }
    }

    pub fn not_found(artist_name: &str) -> Self {
        Self {
            confidence: Some(Confidence::NoMatch),
            ..Self::new(artist_name, SyncStatus::NotFound)
        }
    }

    pub fn failed(artist_name: &str, failure: &ArtistFailure) -> Self {
        Self {
            error: Some(failure.to_string()),
            ..Self::new(artist_name, SyncStatus::Error)
        }
    }

    /// True for medium-confidence flags that carry a candidate awaiting review.
    pub fn needs_review(&self) -> bool {
        self.status == SyncStatus::NotFound
            && self.confidence == Some(Confidence::Medium)
            && self.candidate.is_some()
    }
}

/// Counts derived from a batch of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Count outcome statuses. `not_found` and `error` both count as failed.
    pub fn from_outcomes(outcomes: &[MatchOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                summary.total += 1;
                match outcome.status {
                    SyncStatus::Updated => summary.updated += 1,
                    SyncStatus::Skipped => summary.skipped += 1,
                    SyncStatus::NotFound | SyncStatus::Error => summary.failed += 1,
                }
                summary
            })
    }
}
