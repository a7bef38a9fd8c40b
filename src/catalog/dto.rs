//! Spotify Web API Data Transfer Objects
//!
//! These types match EXACTLY what the Spotify API returns.
//! DO NOT add fields that aren't in the API response.
//! DO NOT use these types outside the catalog module - convert to domain types.
//!
//! API Reference: https://developer.spotify.com/documentation/web-api/reference/search
//!
//! Example search response (`type=artist`):
//! ```json
//! {
//!   "artists": {
//!     "href": "https://api.spotify.com/v1/search?query=coldplay&type=artist",
//!     "limit": 10, "offset": 0, "total": 120, "next": "...",
//!     "items": [{
//!       "id": "4gzpq5DPGxSnKTe4SA8HAU",
//!       "name": "Coldplay",
//!       "popularity": 88,
//!       "followers": {"href": null, "total": 43000000},
//!       "genres": ["permanent wave", "pop"],
//!       "images": [{"url": "https://i.scdn.co/image/ab67...", "height": 640, "width": 640}],
//!       "external_urls": {"spotify": "https://open.spotify.com/artist/4gzpq5DPGxSnKTe4SA8HAU"}
//!     }]
//!   }
//! }
//! ```
//!
//! Some fields are optional here even though Spotify documents them as
//! required; the adapter decides what is fatal.

use serde::{Deserialize, Serialize};

/// Top-level search response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    /// Present when `type=artist` was requested
    pub artists: Option<Paging<Artist>>,
}

/// Paged result container
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub total: Option<u32>,
    pub next: Option<String>,
}

/// Full artist object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Artist {
    /// Spotify artist ID (base-62)
    pub id: Option<String>,
    pub name: Option<String>,
    /// 0-100, derived from recent play counts
    pub popularity: Option<u32>,
    pub followers: Option<Followers>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Artist images, widest first
    #[serde(default)]
    pub images: Vec<Image>,
    pub external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Followers {
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// Client-credentials token response from the accounts service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds (usually 3600)
    pub expires_in: u64,
}

/// Error body returned by the Web API (`/v1/...`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

/// Error body returned by the accounts service (`/api/token`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================
