//! Batch report and the response contract returned to callers.

use serde::Serialize;

use super::domain::{BatchSummary, MatchOutcome};
use super::service::SyncError;

/// Everything a completed batch produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Who triggered the run
    pub principal: String,
    /// RFC 3339
    pub started_at: String,
    /// RFC 3339
    pub finished_at: String,
    pub summary: BatchSummary,
    /// One outcome per artist, in processing order
    pub results: Vec<MatchOutcome>,
}

impl SyncReport {
    /// Artists flagged for manual review.
    pub fn needs_review(&self) -> impl Iterator<Item = &MatchOutcome> {
        self.results.iter().filter(|o| o.needs_review())
    }
}

/// JSON-shaped response for a sync request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    #[serde(skip)]
    status: u16,
    pub success: bool,
    /// Who triggered the run (successful batches only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BatchSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<MatchOutcome>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SyncResponse {
    /// A successful batch.
    pub fn success(report: SyncReport) -> Self {
        Self {
            status: 200,
            success: true,
            principal: Some(report.principal),
            summary: Some(report.summary),
            results: Some(report.results),
            started_at: Some(report.started_at),
            finished_at: Some(report.finished_at),
            error: None,
            details: None,
        }
    }

    /// A batch that never ran or was aborted.
    pub fn failure(error: &SyncError) -> Self {
        let details = match error {
            SyncError::Unexpected(cause) => Some(cause.clone()),
            SyncError::Auth(_) | SyncError::DataAccess(_) | SyncError::Setup(_) => None,
        };

        Self {
            status: error.status_code(),
            success: false,
            principal: None,
            summary: None,
            results: None,
            started_at: None,
            finished_at: None,
            error: Some(error.public_message()),
            details,
        }
    }

    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

impl From<Result<SyncReport, SyncError>> for SyncResponse {
    fn from(result: Result<SyncReport, SyncError>) -> Self {
        match result {
            Ok(report) => Self::success(report),
            Err(e) => Self::failure(&e),
        }
    }
}
