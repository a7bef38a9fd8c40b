//! Catalog sync and token commands.

use tokio::runtime::Runtime;

use crate::auth::{self, Credentials, TokenVerifier};
use crate::catalog::{CatalogMatcher, SpotifyClient};
use crate::config::Config;
use crate::db::{self, SqliteArtistStore, StoreError};
use crate::sync::{SyncError, SyncResponse, SyncService, TracingObserver, handle_sync_request};

type CliSyncService = SyncService<SqliteArtistStore, CatalogMatcher<SpotifyClient>, TracingObserver>;

/// Run one authorized sync batch and print the JSON response.
///
/// Returns the response's `success` flag.
pub fn cmd_sync(
    rt: &Runtime,
    config: &Config,
    token: Option<&str>,
    pretty: bool,
) -> anyhow::Result<bool> {
    let response = rt.block_on(sync_response(config, token));
    println!("{}", response.to_json(pretty)?);

    if !response.success {
        eprintln!("Sync failed with status {}", response.status_code());
    }
    Ok(response.success)
}

/// Verify `token`, then open the store and catalog client and run a batch.
async fn sync_response(config: &Config, token: Option<&str>) -> SyncResponse {
    let verifier = TokenVerifier::new(&config.auth);
    let credentials = token.map(Credentials::bearer).unwrap_or_default();

    handle_sync_request(&verifier, &credentials, || connect(config)).await
}

async fn connect(config: &Config) -> Result<CliSyncService, SyncError> {
    let url = db::db_url(Some(&config.database.path));
    let pool = db::init_db(&url).await.map_err(StoreError::from)?;

    let client = SpotifyClient::new(&config.catalog)?;
    let matcher = CatalogMatcher::new(client, config.matching.thresholds())?;

    Ok(SyncService::new(
        SqliteArtistStore::new(pool),
        matcher,
        TracingObserver,
        &config.sync,
    ))
}

/// Print the config hash for a plaintext token
pub fn cmd_hash_token(token: &str) {
    println!("{}", auth::hash_token(token));
}
