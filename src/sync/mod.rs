//! Catalog sync pipeline
//!
//! Reconciles local artist records with the external catalog:
//! - Loads every artist from the store in name order
//! - Matches unsynced artists through an [`ArtistMatcher`]
//! - Writes high-confidence matches, flags medium ones for review
//! - Summarizes the batch into a [`SyncReport`]
//!
//! Collaborators are injected through the traits in [`traits`], so the
//! whole pipeline runs against mocks in tests.

pub mod domain;
pub mod observer;
pub mod policy;
pub mod report;
pub mod service;
pub mod traits;

pub use domain::{BatchSummary, CatalogCandidate, Confidence, MatchOutcome, SyncStatus};
pub use observer::TracingObserver;
pub use report::{SyncReport, SyncResponse};
pub use service::{SyncError, SyncService, handle_sync_request};
pub use traits::{ArtistMatcher, ArtistStore, CatalogSearch, SyncObserver};
