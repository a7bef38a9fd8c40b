//! External music catalog integration (Spotify Web API).
//!
//! # Architecture
//!
//! - **DTOs** (`dto.rs`) - Exact API response shapes
//! - **Adapter** (`adapter.rs`) - Converts DTOs to [`CatalogCandidate`](crate::sync::domain::CatalogCandidate)
//! - **Client** (`client.rs`) - HTTP transport, token handling, retry/backoff
//! - **Matching** (`matching.rs`) - Name scoring and confidence classification
//!
//! The sync pipeline only sees the [`ArtistMatcher`](crate::sync::traits::ArtistMatcher)
//! seam, so the provider can be swapped without touching reconciliation.
//!
//! # Usage
//!
//! ```ignore
//! use artist_sync::catalog::{CatalogMatcher, SpotifyClient, Thresholds};
//!
//! let client = SpotifyClient::new(&config.catalog)?;
//! let matcher = CatalogMatcher::new(client, Thresholds::default())?;
//! let result = matcher.match_artist("Coldplay").await?;
//! ```

pub mod dto;
mod adapter;
mod client;
pub mod matching;
#[cfg(test)]
mod test_server;

pub use adapter::to_candidates;
pub use client::SpotifyClient;
pub use matching::{CatalogMatcher, Thresholds, name_similarity, normalize_name};
