//! Confidence-scored name matching.
//!
//! Candidates are ranked by lexical similarity to the queried name, with
//! catalog popularity and follower count breaking ties. The top candidate's
//! similarity decides the [`Confidence`] class.

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::sync::domain::{CatalogCandidate, CatalogError, Confidence, MatchResult};
use crate::sync::traits::{ArtistMatcher, CatalogSearch};

/// Default similarity for a high-confidence (auto-applied) match.
pub const DEFAULT_HIGH_THRESHOLD: f32 = 0.95;

/// Default minimum similarity for a medium-confidence (review) match.
pub const DEFAULT_MEDIUM_THRESHOLD: f32 = 0.75;

/// Similarity cut-offs for confidence classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub high: f32,
    pub medium: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: DEFAULT_HIGH_THRESHOLD,
            medium: DEFAULT_MEDIUM_THRESHOLD,
        }
    }
}

impl Thresholds {
    /// Check `0 < medium <= high <= 1`.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if !(self.medium > 0.0 && self.medium <= self.high && self.high <= 1.0) {
            return Err(CatalogError::InvalidConfig(format!(
                "thresholds must satisfy 0 < medium <= high <= 1 (medium={}, high={})",
                self.medium, self.high
            )));
        }
        Ok(())
    }

    /// Classify a similarity score.
    pub fn classify(&self, similarity: f32) -> Confidence {
        if similarity >= self.high {
            Confidence::High
        } else if similarity >= self.medium {
            Confidence::Medium
        } else {
            Confidence::NoMatch
        }
    }
}

/// Normalize an artist name for comparison.
///
/// - Lower-cases (Unicode aware)
/// - Drops a leading "the "
/// - Treats "&" as "and"
/// - Cuts featuring suffixes: "X feat. Y" ≈ "X"
/// - Removes punctuation and collapses whitespace
///
/// Word boundaries survive, so "Cold Play" and "Coldplay" stay distinct.
pub fn normalize_name(name: &str) -> String {
    let mut result = name.to_lowercase().replace('&', " and ");

    for pattern in [" (feat.", " (ft.", " feat.", " ft."] {
        if let Some(pos) = result.find(pattern) {
            result.truncate(pos);
        }
    }

    let cleaned = result
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>();
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();

    if let Some(pos) = words.iter().skip(1).position(|w| *w == "featuring") {
        words.truncate(pos + 1);
    }

    let mut start = 0;
    while words.len() - start > 1 && words[start] == "the" {
        start += 1;
    }

    words[start..].join(" ")
}

/// Similarity between a query and a candidate name (0.0 to 1.0).
pub fn name_similarity(query: &str, candidate: &str) -> f32 {
    let a = normalize_name(query);
    let b = normalize_name(candidate);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if a == b {
        return 1.0;
    }

    strsim::normalized_levenshtein(&a, &b) as f32
}

/// Order two scored candidates best-first.
fn rank(a: &(f32, CatalogCandidate), b: &(f32, CatalogCandidate)) -> Ordering {
    b.0.partial_cmp(&a.0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.1.popularity.cmp(&a.1.popularity))
        .then_with(|| b.1.followers.cmp(&a.1.followers))
}

/// Score candidates against a query, best first.
pub fn score_candidates(
    query: &str,
    candidates: Vec<CatalogCandidate>,
) -> Vec<(f32, CatalogCandidate)> {
    let mut scored: Vec<_> = candidates
        .into_iter()
        .map(|c| (name_similarity(query, &c.name), c))
        .collect();
    scored.sort_by(rank);
    scored
}

/// Pick and classify the best candidate for a query.
///
/// Below the medium threshold the candidate is dropped entirely.
pub fn select_best(
    query: &str,
    candidates: Vec<CatalogCandidate>,
    thresholds: &Thresholds,
) -> MatchResult {
    let Some((similarity, best)) = score_candidates(query, candidates).into_iter().next() else {
        return MatchResult::no_match();
    };

    match thresholds.classify(similarity) {
        Confidence::NoMatch => MatchResult {
            similarity,
            ..MatchResult::no_match()
        },
        confidence => MatchResult {
            candidate: Some(best),
            confidence,
            similarity,
        },
    }
}

/// The match engine: raw catalog search plus scoring.
pub struct CatalogMatcher<S> {
    search: S,
    thresholds: Thresholds,
}

impl<S: CatalogSearch> CatalogMatcher<S> {
    /// Create a matcher, rejecting inconsistent thresholds.
    pub fn new(search: S, thresholds: Thresholds) -> Result<Self, CatalogError> {
        thresholds.validate()?;
        Ok(Self { search, thresholds })
    }
}

#[async_trait]
impl<S: CatalogSearch> ArtistMatcher for CatalogMatcher<S> {
    async fn match_artist(&self, name: &str) -> Result<MatchResult, CatalogError> {
        let query = name.trim();
        if query.is_empty() {
            return Ok(MatchResult::no_match());
        }

        let candidates = self.search.search_artists(query).await?;
        Ok(select_best(query, candidates, &self.thresholds))
    }
}
