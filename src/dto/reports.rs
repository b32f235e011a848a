use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Report, ReportLine};

/// Source orders are either named explicitly or selected by a date range
/// over their creation timestamp; exactly one selector is required.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateReportRequest {
    pub report_type: String,
    pub order_ids: Option<Vec<Uuid>>,
    /// Inclusive range start, `YYYY-MM-DD`.
    pub start: Option<String>,
    /// Inclusive range end, `YYYY-MM-DD`.
    pub end: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportSummary {
    pub report: Report,
    /// Username of the generating user, `None` once that user is deleted.
    pub username: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportSummaryList {
    pub items: Vec<ReportSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportWithLines {
    pub report: Report,
    pub lines: Vec<ReportLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportList {
    pub items: Vec<Report>,
}
