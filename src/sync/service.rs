//! Sync service - orchestrates one catalog reconciliation batch
//!
//! For every artist in the store, in name order:
//! 1. Skip it if it already carries a catalog ID
//! 2. Ask the match engine for the best catalog entry
//! 3. Apply, flag or drop the match per [`policy::decide`]
//! 4. Wait out the pacing delay before the next artist
//!
//! Artists are processed strictly one at a time. A failure for one artist,
//! panics included, becomes that artist's outcome and the batch moves on.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;

use super::domain::{ArtistFailure, BatchSummary, CatalogError, MatchOutcome};
use super::policy::{self, Decision};
use super::report::{SyncReport, SyncResponse};
use super::traits::{ArtistMatcher, ArtistStore, SyncObserver};
use crate::auth::{AuthError, AuthVerifier, Credentials, Principal};
use crate::config::SyncConfig;
use crate::db::StoreError;
use crate::model::ArtistRecord;

/// Batch-level failures. Per-artist problems never end up here.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Caller not allowed to run the pipeline
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The artist list could not be loaded
    #[error("Failed to load artists: {0}")]
    DataAccess(#[from] StoreError),

    /// The match engine could not be built
    #[error("Failed to set up catalog matching: {0}")]
    Setup(#[from] CatalogError),

    /// Something escaped the per-artist guard
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl SyncError {
    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self {
            SyncError::Auth(_) => 401,
            SyncError::DataAccess(e) => e.status_code(),
            SyncError::Setup(_) | SyncError::Unexpected(_) => 500,
        }
    }

    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            SyncError::Auth(e) => e.to_string(),
            SyncError::DataAccess(e) => format!("Failed to load artists: {}", e),
            SyncError::Setup(e) => format!("Failed to set up catalog matching: {}", e),
            SyncError::Unexpected(_) => "Internal server error".to_string(),
        }
    }
}

/// Runs reconciliation batches against a store and a match engine.
pub struct SyncService<S, M, O> {
    store: S,
    matcher: M,
    observer: O,
    pacing_delay: Duration,
}

impl<S, M, O> SyncService<S, M, O>
where
    S: ArtistStore,
    M: ArtistMatcher,
    O: SyncObserver,
{
    pub fn new(store: S, matcher: M, observer: O, config: &SyncConfig) -> Self {
        Self {
            store,
            matcher,
            observer,
            pacing_delay: config.pacing_delay(),
        }
    }

    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay = delay;
        self
    }

    /// Run one batch on behalf of `principal`.
    ///
    /// Fails only when the artist list can't be read or something panics
    /// outside per-artist processing; every other failure is recorded per
    /// artist.
    pub async fn run(&self, principal: &Principal) -> Result<SyncReport, SyncError> {
        AssertUnwindSafe(self.run_batch(principal))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(SyncError::Unexpected(panic_message(payload))))
    }

    async fn run_batch(&self, principal: &Principal) -> Result<SyncReport, SyncError> {
        let started_at = chrono::Utc::now();

        let artists = match self.store.list_artists().await {
            Ok(artists) => artists,
            Err(e) => {
                self.observer.load_failed(&e);
                return Err(SyncError::DataAccess(e));
            }
        };

        self.observer.batch_started(artists.len(), &principal.name);

        let results = self.process_all(&artists).await;

        let summary = BatchSummary::from_outcomes(&results);
        self.observer.batch_finished(&summary, &principal.name);

        Ok(SyncReport {
            principal: principal.name.clone(),
            started_at: started_at.to_rfc3339(),
            finished_at: chrono::Utc::now().to_rfc3339(),
            summary,
            results,
        })
    }

    async fn process_all(&self, artists: &[ArtistRecord]) -> Vec<MatchOutcome> {
        let mut results = Vec::with_capacity(artists.len());

        for artist in artists {
            let outcome = match AssertUnwindSafe(self.process_artist(artist))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let failure = ArtistFailure::Panic(panic_message(payload));
                    self.observer.artist_failed(artist, &failure);
                    MatchOutcome::failed(&artist.name, &failure)
                }
            };
            results.push(outcome);

            // Pace every artist, skipped or not
            tokio::time::sleep(self.pacing_delay).await;
        }

        results
    }

    /// Reconcile a single artist. Never fails; failures become the outcome.
    pub async fn process_artist(&self, artist: &ArtistRecord) -> MatchOutcome {
        if policy::should_skip(artist) {
            self.observer.artist_skipped(artist);
            return MatchOutcome::skipped(&artist.name);
        }

        match self.reconcile(artist).await {
            Ok(outcome) => outcome,
            Err(failure) => {
                self.observer.artist_failed(artist, &failure);
                MatchOutcome::failed(&artist.name, &failure)
            }
        }
    }

    async fn reconcile(&self, artist: &ArtistRecord) -> Result<MatchOutcome, ArtistFailure> {
        self.observer.searching(artist);
        let result = self.matcher.match_artist(&artist.name).await?;

        match policy::decide(artist, result) {
            Decision::Apply { update, candidate } => {
                self.store.update_artist(&artist.id, &update).await?;
                self.observer.artist_updated(artist, &candidate);
                Ok(MatchOutcome::updated(&artist.name, candidate))
            }
            Decision::Flag(candidate) => {
                self.observer.needs_review(artist, &candidate);
                Ok(MatchOutcome::flagged(&artist.name, candidate))
            }
            Decision::NotFound => {
                self.observer.not_found(artist);
                Ok(MatchOutcome::not_found(&artist.name))
            }
        }
    }
}

/// Authorize the caller, build the service, run a batch and shape the
/// response.
///
/// `connect` runs only after the caller is verified, so unauthorized
/// callers never open the store or reach the catalog. A `connect` failure
/// is reported like any other batch failure.
pub async fn handle_sync_request<V, F, Fut, S, M, O>(
    verifier: &V,
    credentials: &Credentials,
    connect: F,
) -> SyncResponse
where
    V: AuthVerifier + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<SyncService<S, M, O>, SyncError>>,
    S: ArtistStore,
    M: ArtistMatcher,
    O: SyncObserver,
{
    let principal = match verifier.verify(credentials) {
        Ok(principal) => principal,
        Err(e) => {
            tracing::warn!("Rejected sync request: {}", e);
            return SyncResponse::failure(&SyncError::Auth(e));
        }
    };

    let result = match connect().await {
        Ok(service) => service.run(&principal).await,
        Err(e) => Err(e),
    };

    match &result {
        Ok(report) => {
            let review = report.needs_review().count();
            if review > 0 {
                tracing::info!("{} artist(s) need manual review", review);
            }
        }
        Err(e) => tracing::error!("Sync failed: {}", e),
    }
    SyncResponse::from(result)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use proptest::prelude::*;

    use super::*;
    use crate::auth::{TokenVerifier, hash_token};
    use crate::config::{AuthConfig, TokenEntry};
    use crate::db::{self, SqliteArtistStore};
    use crate::model::ArtistRecord;
    use crate::sync::domain::{CatalogError, Confidence, SyncStatus};
    use crate::sync::traits::mocks::{MockMatcher, MockStore, RecordingObserver};
    use crate::test_utils::{artist, candidate, synced_artist, temp_db};

    fn admin() -> Principal {
        Principal {
            name: "admin@example.com".to_string(),
            role: "admin".to_string(),
        }
    }

    fn service<S: ArtistStore, M: ArtistMatcher>(
        store: S,
        matcher: M,
    ) -> SyncService<S, M, Arc<RecordingObserver>> {
        SyncService::new(
            store,
            matcher,
            Arc::new(RecordingObserver::default()),
            &SyncConfig::default(),
        )
        .with_pacing_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_synced_artist_is_skipped_without_search() {
        let store = MockStore::with_artists(vec![synced_artist("1", "The Beatles", "3WrFJ7")]);
        let matcher = Arc::new(MockMatcher::new());
        let svc = service(store, matcher.clone());

        let report = svc.run(&admin()).await.unwrap();

        assert_eq!(report.results, vec![MatchOutcome::skipped("The Beatles")]);
        assert_eq!(report.summary.skipped, 1);
        assert!(matcher.calls().is_empty());
        assert_eq!(svc.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_high_confidence_is_written() {
        let store = MockStore::with_artists(vec![artist("1", "Radiohead")]);
        let matcher = MockMatcher::new().high("Radiohead", candidate("4Z8W", "Radiohead"));
        let svc = service(store, matcher);

        let report = svc.run(&admin()).await.unwrap();

        assert_eq!(report.results[0].status, SyncStatus::Updated);
        assert_eq!(report.summary.updated, 1);
        let stored = svc.store.artist("1").unwrap();
        assert_eq!(stored.catalog_id.as_deref(), Some("4Z8W"));
        assert_eq!(stored.image_url.as_deref(), Some("https://i.scdn.co/image/4Z8W"));
        assert_eq!(
            svc.observer.events(),
            vec![
                "start:1:admin@example.com",
                "searching:Radiohead",
                "updated:Radiohead:4Z8W",
                "finished:1/0/0",
            ]
        );
    }

    #[tokio::test]
    async fn test_curated_image_survives_update() {
        let record = ArtistRecord {
            image_url: Some("https://cdn.local/bjork.png".to_string()),
            ..artist("1", "Björk")
        };
        let store = MockStore::with_artists(vec![record]);
        let matcher = MockMatcher::new().high("Björk", candidate("7w29", "Björk"));
        let svc = service(store, matcher);

        svc.run(&admin()).await.unwrap();

        assert_eq!(svc.store.writes_for("1")[0].image_url, None);
        assert_eq!(
            svc.store.artist("1").unwrap().image_url.as_deref(),
            Some("https://cdn.local/bjork.png")
        );
    }

    #[tokio::test]
    async fn test_medium_confidence_is_flagged_not_written() {
        let store = MockStore::with_artists(vec![artist("1", "Cold Play")]);
        let matcher = MockMatcher::new().medium("Cold Play", candidate("4gzp", "Coldplay"));
        let svc = service(store, matcher);

        let report = svc.run(&admin()).await.unwrap();

        let outcome = &report.results[0];
        assert_eq!(outcome.status, SyncStatus::NotFound);
        assert_eq!(outcome.confidence, Some(Confidence::Medium));
        assert!(outcome.needs_review());
        assert_eq!(report.summary.failed, 1);
        assert_eq!(svc.store.write_count(), 0);
        assert!(svc.observer.events().contains(&"review:Cold Play:Coldplay".to_string()));
    }

    #[tokio::test]
    async fn test_no_match_is_not_found() {
        let store = MockStore::with_artists(vec![artist("1", "Obscure Name Xyz123")]);
        let svc = service(store, MockMatcher::new());

        let report = svc.run(&admin()).await.unwrap();

        assert_eq!(report.results, vec![MatchOutcome::not_found("Obscure Name Xyz123")]);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(svc.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_read_failure_aborts_batch() {
        let matcher = Arc::new(MockMatcher::new());
        let svc = service(MockStore::unreachable(), matcher.clone());

        let err = svc.run(&admin()).await.unwrap_err();

        assert!(matches!(err, SyncError::DataAccess(_)));
        assert_eq!(err.status_code(), 503);
        assert!(matcher.calls().is_empty());
        assert_eq!(svc.observer.events(), vec!["load_failed"]);
    }

    #[tokio::test]
    async fn test_write_failure_is_isolated() {
        let store = MockStore::with_artists(vec![artist("1", "ABBA"), artist("2", "Beck")])
            .failing_writes_for("1");
        let matcher = MockMatcher::new()
            .high("ABBA", candidate("abba", "ABBA"))
            .high("Beck", candidate("beck", "Beck"));
        let svc = service(store, matcher);

        let report = svc.run(&admin()).await.unwrap();

        assert_eq!(report.results[0].status, SyncStatus::Error);
        assert!(report.results[0].error.as_deref().unwrap().contains("write rejected"));
        assert_eq!(report.results[1].status, SyncStatus::Updated);
        assert_eq!(
            report.summary,
            BatchSummary {
                total: 2,
                updated: 1,
                skipped: 0,
                failed: 1
            }
        );
        assert!(!svc.store.artist("1").unwrap().is_synced());
    }

    #[tokio::test]
    async fn test_match_failure_is_isolated() {
        let store = MockStore::with_artists(vec![artist("1", "ABBA"), artist("2", "Beck")]);
        let matcher = MockMatcher::new()
            .failing("ABBA", CatalogError::Network("timeout".into()))
            .high("Beck", candidate("beck", "Beck"));
        let svc = service(store, matcher);

        let report = svc.run(&admin()).await.unwrap();

        assert_eq!(report.results[0].status, SyncStatus::Error);
        assert_eq!(report.results[1].status, SyncStatus::Updated);
        assert!(svc.observer.events().contains(&"failed:ABBA".to_string()));
    }

    #[tokio::test]
    async fn test_panic_is_isolated_to_its_artist() {
        let store = MockStore::with_artists(vec![artist("1", "ABBA"), artist("2", "Beck")]);
        let matcher = Arc::new(MockMatcher::new().panicking("ABBA"));
        let svc = service(store, matcher.clone());

        let report = svc.run(&admin()).await.unwrap();

        let statuses: Vec<_> = report.results.iter().map(|o| o.status).collect();
        assert_eq!(statuses, vec![SyncStatus::Error, SyncStatus::NotFound]);
        assert!(report.results[0].error.as_deref().unwrap().contains("ABBA"));
        assert_eq!(report.summary.failed, 2);
        assert_eq!(report.summary.total, 2);
        assert_eq!(matcher.calls(), vec!["ABBA", "Beck"]);
        assert!(svc.observer.events().contains(&"failed:ABBA".to_string()));
    }

    /// Observer that panics as soon as a batch starts.
    struct PanickingObserver;

    impl SyncObserver for PanickingObserver {
        fn batch_started(&self, _total: usize, _principal: &str) {
            panic!("observer unavailable");
        }
    }

    #[tokio::test]
    async fn test_panic_outside_artist_is_unexpected() {
        let store = MockStore::with_artists(vec![artist("1", "ABBA")]);
        let matcher = Arc::new(MockMatcher::new());
        let svc = SyncService::new(store, matcher.clone(), PanickingObserver, &SyncConfig::default())
            .with_pacing_delay(Duration::ZERO);

        let err = svc.run(&admin()).await.unwrap_err();

        assert_eq!(err.status_code(), 500);
        let SyncError::Unexpected(cause) = &err else {
            panic!("expected Unexpected, got {:?}", err);
        };
        assert!(cause.contains("observer unavailable"));
        assert!(matcher.calls().is_empty());

        let response = SyncResponse::failure(&err);
        assert_eq!(response.error.as_deref(), Some("Internal server error"));
        assert_eq!(response.details.as_deref(), Some("observer unavailable"));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let store = Arc::new(MockStore::with_artists(vec![
            artist("1", "Radiohead"),
            artist("2", "Cold Play"),
        ]));
        let matcher = Arc::new(
            MockMatcher::new()
                .high("Radiohead", candidate("4Z8W", "Radiohead"))
                .medium("Cold Play", candidate("4gzp", "Coldplay")),
        );
        let svc = service(store.clone(), matcher.clone());

        svc.run(&admin()).await.unwrap();
        let second = svc.run(&admin()).await.unwrap();

        assert_eq!(store.write_count(), 1);
        assert_eq!(second.summary.updated, 0);
        assert_eq!(second.summary.skipped, 1);
        // Only the unresolved artist is searched again
        assert_eq!(matcher.calls(), vec!["Cold Play", "Radiohead", "Cold Play"]);
    }

    #[tokio::test]
    async fn test_sqlite_store_end_to_end() {
        let (pool, _dir) = temp_db().await;
        let id = db::insert_artist(&pool, "Radiohead", None).await.unwrap();
        db::insert_artist(&pool, "Obscure Name Xyz123", None)
            .await
            .unwrap();
        let matcher = MockMatcher::new().high("Radiohead", candidate("4Z8W", "Radiohead"));
        let svc = service(SqliteArtistStore::new(pool.clone()), matcher);

        let first = svc.run(&admin()).await.unwrap();
        let second = svc.run(&admin()).await.unwrap();

        assert_eq!(first.summary.updated, 1);
        assert_eq!(second.summary.skipped, 1);
        assert_eq!(second.summary.updated, 0);
        let stored = db::get_artist(&pool, &id).await.unwrap().unwrap();
        assert_eq!(stored.catalog_id.as_deref(), Some("4Z8W"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_delay_after_every_artist() {
        let store = MockStore::with_artists(vec![
            synced_artist("1", "ABBA", "abba"),
            artist("2", "Beck"),
            artist("3", "Cher"),
        ]);
        let svc = SyncService::new(
            store,
            MockMatcher::new(),
            RecordingObserver::default(),
            &SyncConfig {
                pacing_delay_ms: 150,
            },
        );

        let start = tokio::time::Instant::now();
        svc.run(&admin()).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(450));
    }

    fn ops_verifier() -> TokenVerifier {
        TokenVerifier::new(&AuthConfig {
            tokens: vec![TokenEntry {
                principal: "ops".to_string(),
                role: "admin".to_string(),
                token_sha256: hash_token("s3cret"),
            }],
        })
    }

    #[tokio::test]
    async fn test_unauthorized_request_never_connects() {
        let verifier = TokenVerifier::new(&AuthConfig::default());
        let connected = AtomicBool::new(false);
        let flag = &connected;

        let response = handle_sync_request(&verifier, &Credentials::default(), move || async move {
            flag.store(true, Ordering::SeqCst);
            Ok(service(MockStore::unreachable(), MockMatcher::new()))
        })
        .await;

        assert_eq!(response.status_code(), 401);
        assert_eq!(
            response.error.as_deref(),
            Some("Missing or invalid authorization header")
        );
        assert!(!connected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_wrong_token_never_connects() {
        let connected = AtomicBool::new(false);
        let flag = &connected;

        let response = handle_sync_request(&ops_verifier(), &Credentials::bearer("guess"), move || async move {
            flag.store(true, Ordering::SeqCst);
            Ok(service(MockStore::unreachable(), MockMatcher::new()))
        })
        .await;

        assert_eq!(response.status_code(), 401);
        assert!(!connected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_authorized_request_runs_batch() {
        let observer = Arc::new(RecordingObserver::default());
        let store = MockStore::with_artists(vec![artist("1", "Radiohead"), artist("2", "Cold Play")]);
        let matcher = MockMatcher::new()
            .high("Radiohead", candidate("4Z8W", "Radiohead"))
            .medium("Cold Play", candidate("4gzp", "Coldplay"));
        let svc = SyncService::new(store, matcher, observer.clone(), &SyncConfig::default())
            .with_pacing_delay(Duration::ZERO);

        let response =
            handle_sync_request(&ops_verifier(), &Credentials::bearer("s3cret"), move || async move {
                Ok(svc)
            })
            .await;

        assert_eq!(response.status_code(), 200);
        assert!(response.success);
        assert_eq!(response.principal.as_deref(), Some("ops"));
        assert_eq!(response.summary.unwrap().updated, 1);
        assert_eq!(observer.events()[0], "start:2:ops");
    }

    #[tokio::test]
    async fn test_store_outage_response() {
        let response =
            handle_sync_request(&ops_verifier(), &Credentials::bearer("s3cret"), || async {
                Ok(service(MockStore::unreachable(), MockMatcher::new()))
            })
            .await;

        assert_eq!(response.status_code(), 503);
        assert!(!response.success);
        assert!(response.results.is_none());
    }

    #[tokio::test]
    async fn test_connect_failure_response() {
        let response = handle_sync_request(
            &ops_verifier(),
            &Credentials::bearer("s3cret"),
            || async {
                Err::<SyncService<MockStore, MockMatcher, RecordingObserver>, _>(
                    SyncError::DataAccess(StoreError::Unavailable("disk gone".into())),
                )
            },
        )
        .await;

        assert_eq!(response.status_code(), 503);
        assert!(!response.success);
        assert!(response.error.as_deref().unwrap().contains("disk gone"));
        assert!(response.summary.is_none());
    }

    #[derive(Debug, Clone)]
    enum Fixture {
        Synced,
        High,
        Medium,
        Miss,
        MatchError,
        WriteError,
    }

    fn fixture() -> impl Strategy<Value = Fixture> {
        prop_oneof![
            Just(Fixture::Synced),
            Just(Fixture::High),
            Just(Fixture::Medium),
            Just(Fixture::Miss),
            Just(Fixture::MatchError),
            Just(Fixture::WriteError),
        ]
    }

    proptest! {
        #[test]
        fn prop_summary_accounts_for_every_artist(fixtures in prop::collection::vec(fixture(), 0..20)) {
            let mut artists = Vec::new();
            let mut store_failures = Vec::new();
            let mut matcher = MockMatcher::new();

            for (i, f) in fixtures.iter().enumerate() {
                let id = format!("id{:02}", i);
                let name = format!("Artist {:02}", i);
                match f {
                    Fixture::Synced => artists.push(synced_artist(&id, &name, "x")),
                    Fixture::High => {
                        matcher = matcher.high(&name, candidate(&id, &name));
                        artists.push(artist(&id, &name));
                    }
                    Fixture::Medium => {
                        matcher = matcher.medium(&name, candidate(&id, &name));
                        artists.push(artist(&id, &name));
                    }
                    Fixture::Miss => artists.push(artist(&id, &name)),
                    Fixture::MatchError => {
                        matcher = matcher.failing(&name, CatalogError::RateLimited);
                        artists.push(artist(&id, &name));
                    }
                    Fixture::WriteError => {
                        matcher = matcher.high(&name, candidate(&id, &name));
                        store_failures.push(id.clone());
                        artists.push(artist(&id, &name));
                    }
                }
            }

            let mut store = MockStore::with_artists(artists);
            for id in &store_failures {
                store = store.failing_writes_for(id);
            }

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let report = rt.block_on(service(store, matcher).run(&admin())).unwrap();
            let s = report.summary;

            prop_assert_eq!(s.total, fixtures.len());
            prop_assert_eq!(report.results.len(), fixtures.len());
            prop_assert_eq!(s.updated + s.skipped + s.failed, s.total);
        }
    }
}
