//! Adapter layer: Convert Spotify DTOs to domain models
//!
//! This is the ONLY place where DTO types are converted to domain types.
//! This isolates API changes - if Spotify changes their response format,
//! only this file and dto.rs need to change.

use super::dto;
use crate::sync::domain::{CatalogCandidate, CatalogError};

/// Public artist page used when `external_urls.spotify` is missing
const ARTIST_URL_BASE: &str = "https://open.spotify.com/artist/";

/// Convert a search response into catalog candidates.
///
/// A response without an `artists` page means no results. An item without
/// an id or name is malformed and fails the whole search.
pub fn to_candidates(response: dto::SearchResponse) -> Result<Vec<CatalogCandidate>, CatalogError> {
    let Some(paging) = response.artists else {
        return Ok(Vec::new());
    };

    paging.items.into_iter().map(to_candidate).collect()
}

/// Convert a single artist object
fn to_candidate(artist: dto::Artist) -> Result<CatalogCandidate, CatalogError> {
    let id = artist
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CatalogError::InvalidResponse("artist without id".to_string()))?;

    let name = artist.name.filter(|n| !n.trim().is_empty()).ok_or_else(|| {
        CatalogError::InvalidResponse(format!("artist {} without name", id))
    })?;

    let url = artist
        .external_urls
        .and_then(|u| u.spotify)
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| format!("{}{}", ARTIST_URL_BASE, id));

    // Spotify lists images widest first
    let image_url = artist.images.into_iter().next().map(|img| img.url);

    Ok(CatalogCandidate {
        id,
        name,
        image_url,
        url,
        followers: artist.followers.and_then(|f| f.total).unwrap_or(0),
        popularity: artist.popularity.unwrap_or(0).min(100),
    })
}
