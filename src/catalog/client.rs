//! Spotify Web API client
//!
//! Handles communication with the Spotify catalog.
//! See: https://developer.spotify.com/documentation/web-api
//!
//! ## Authentication
//! Uses the client-credentials flow: the client ID and secret are exchanged
//! for a bearer token at the accounts service. Tokens live for an hour; we
//! cache them and refresh a minute early. A 401 from the Web API drops the
//! cached token and retries once with a fresh one.
//!
//! ## Rate Limits
//! Spotify answers `429 Too Many Requests` with a `Retry-After` header (in
//! seconds). We honour it up to `max_retries` times. Server errors and
//! transport failures back off exponentially instead.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use tokio::sync::Mutex;

use super::{adapter, dto};
use crate::config::CatalogConfig;
use crate::sync::domain::{CatalogCandidate, CatalogError};
use crate::sync::traits::CatalogSearch;

/// Refresh tokens this long before Spotify says they expire
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Base delay for exponential backoff
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Longest `Retry-After` we are willing to sit through
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Maximum page size accepted by the search endpoint
const MAX_SEARCH_LIMIT: u32 = 50;

/// A bearer token and the moment it stops being usable
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Spotify API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_base_url: String,
    accounts_base_url: String,
    market: Option<String>,
    search_limit: u32,
    max_retries: u32,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    /// Create a new client from catalog settings.
    ///
    /// Fails when the client ID or secret is missing.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client_id = config
            .client_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| CatalogError::MissingCredentials("client_id".to_string()))?;
        let client_secret = config
            .client_secret
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| CatalogError::MissingCredentials("client_secret".to_string()))?;

        let http_client = reqwest::Client::builder()
            .gzip(true)
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| CatalogError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            client_id,
            client_secret,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            accounts_base_url: config.accounts_base_url.trim_end_matches('/').to_string(),
            market: config.market.clone().filter(|m| !m.is_empty()),
            search_limit: config.search_limit.clamp(1, MAX_SEARCH_LIMIT),
            max_retries: config.max_retries,
            token: Mutex::new(None),
        })
    }

    /// Search the catalog for artists matching a name
    pub async fn search_artists(&self, name: &str) -> Result<Vec<CatalogCandidate>, CatalogError> {
        let response = self.send_search_request(name).await?;
        adapter::to_candidates(response)
    }

    /// Build the search URL for a query
    fn search_url(&self, name: &str) -> String {
        let mut url = format!(
            "{}/v1/search?q={}&type=artist&limit={}",
            self.api_base_url,
            urlencoding::encode(name),
            self.search_limit
        );
        if let Some(ref market) = self.market {
            url.push_str("&market=");
            url.push_str(&urlencoding::encode(market));
        }
        url
    }

    /// Send the search request, retrying per the rate-limit policy
    async fn send_search_request(&self, name: &str) -> Result<dto::SearchResponse, CatalogError> {
        let url = self.search_url(name);
        let mut attempt: u32 = 0;
        let mut token_refreshed = false;

        loop {
            let token = self.access_token().await?;

            let response = match self.http_client.get(&url).bearer_auth(&token).send().await {
                Ok(response) => response,
                Err(e) if attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        "Catalog request failed ({}), retrying in {:?}",
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(CatalogError::Network(e.to_string())),
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<dto::SearchResponse>()
                    .await
                    .map_err(|e| CatalogError::Parse(e.to_string()));
            }

            if status == StatusCode::UNAUTHORIZED && !token_refreshed {
                tracing::debug!("Catalog token rejected, requesting a new one");
                self.invalidate_token().await;
                token_refreshed = true;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.max_retries {
                    return Err(CatalogError::RateLimited);
                }
                let delay = retry_after(response.headers()).unwrap_or(Duration::from_secs(1));
                tracing::warn!("Catalog rate limited, waiting {:?}", delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if status.is_server_error() && attempt < self.max_retries {
                let delay = backoff_delay(attempt);
                tracing::warn!("Catalog returned HTTP {}, retrying in {:?}", status, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if let Ok(body) = response.json::<dto::ApiErrorResponse>().await {
                return Err(CatalogError::ApiError(format!(
                    "HTTP {}: {}",
                    body.error.status, body.error.message
                )));
            }
            return Err(CatalogError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }
    }

    /// Return a valid access token, requesting one if needed
    async fn access_token(&self) -> Result<String, CatalogError> {
        let mut cached = self.token.lock().await;

        if let Some(ref token) = *cached
            && Instant::now() < token.refresh_at
        {
            return Ok(token.access_token.clone());
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Exchange client credentials for a bearer token
    async fn request_token(&self) -> Result<CachedToken, CatalogError> {
        let url = format!("{}/api/token", self.accounts_base_url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if let Ok(body) = response.json::<dto::AuthErrorResponse>().await {
                return Err(CatalogError::Auth(
                    body.error_description.unwrap_or(body.error),
                ));
            }
            return Err(CatalogError::Auth(format!("HTTP {}", status)));
        }

        let token = response
            .json::<dto::TokenResponse>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        tracing::debug!("Obtained catalog token valid for {}s", token.expires_in);

        Ok(CachedToken {
            access_token: token.access_token,
            refresh_at: token_refresh_at(Instant::now(), token.expires_in),
        })
    }
}

#[async_trait]
impl CatalogSearch for SpotifyClient {
    async fn search_artists(&self, name: &str) -> Result<Vec<CatalogCandidate>, CatalogError> {
        SpotifyClient::search_artists(self, name).await
    }
}

/// When to refresh a token issued at `now` with the given lifetime
fn token_refresh_at(now: Instant, expires_in_secs: u64) -> Instant {
    let lifetime = Duration::from_secs(expires_in_secs);
    now + lifetime.saturating_sub(TOKEN_REFRESH_MARGIN)
}

/// Exponential backoff: 500ms, 1s, 2s, ...
fn backoff_delay(attempt: u32) -> Duration {
    BACKOFF_BASE * 2u32.saturating_pow(attempt.min(6))
}

/// Parse a `Retry-After` header given in seconds
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}
