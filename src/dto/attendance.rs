//! Request and response shapes for attendance operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use super::pagination::{PageLimits, PaginationParams};
use crate::domain::calendar::{CalendarCell, CalendarGrid};
use crate::domain::entities::{AttendancePatch, AttendanceRecord, Presence};
use crate::domain::repositories::{AttendanceFilter, Page, Pagination};
use crate::domain::stats::{AttendanceStats, PresenceCounts, PresenceRates};
use crate::error::AppError;
use crate::utils::date_normalizer::normalize_date;

/// Input for creating one record.
///
/// Raw strings are accepted so that a form submission and a bulk-import row
/// go through the same validation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAttendanceRequest {
    #[validate(range(min = 1, message = "student_id must be a positive identifier"))]
    pub student_id: i64,

    /// `YYYY-MM-DD`, or a timestamp whose calendar date is used.
    pub date: String,

    /// One of `present`, `absent`, `late`, `justified`.
    pub presence: String,

    #[serde(default)]
    #[validate(range(min = 1, message = "academic_year_id must be a positive identifier"))]
    pub academic_year_id: Option<i64>,
}

impl CreateAttendanceRequest {
    pub fn new(student_id: i64, date: impl Into<String>, presence: impl Into<String>) -> Self {
        Self {
            student_id,
            date: date.into(),
            presence: presence.into(),
            academic_year_id: None,
        }
    }

    pub fn with_academic_year(mut self, academic_year_id: i64) -> Self {
        self.academic_year_id = Some(academic_year_id);
        self
    }
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAttendanceRequest {
    pub date: Option<String>,
    pub presence: Option<String>,
}

impl UpdateAttendanceRequest {
    /// Validates and normalizes into a typed patch.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an unknown presence, a malformed
    /// date, or a patch that changes nothing.
    pub fn into_patch(self) -> Result<AttendancePatch, AppError> {
        let presence = self
            .presence
            .as_deref()
            .map(str::parse::<Presence>)
            .transpose()?;
        let date = self.date.as_deref().map(normalize_date).transpose()?;

        let patch = AttendancePatch { date, presence };
        if patch.is_empty() {
            return Err(AppError::bad_request(
                "Update must change date or presence",
                serde_json::json!({ "fields": ["date", "presence"] }),
            ));
        }
        Ok(patch)
    }
}

/// Query parameters accepted by `list`. Unknown keys are ignored.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct AttendanceQueryParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub student_id: Option<i64>,

    #[serde(default)]
    pub presence: Option<String>,

    #[serde(default)]
    pub date: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub academic_year_id: Option<i64>,

    #[serde(default)]
    pub from: Option<String>,

    #[serde(default)]
    pub to: Option<String>,

    #[serde(flatten)]
    pub pagination: PaginationParams,
}

impl AttendanceQueryParams {
    /// Converts raw parameters into a typed filter and pagination window.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an unknown presence, malformed
    /// dates, or out-of-range pagination.
    pub fn into_query(self, limits: PageLimits) -> Result<(AttendanceFilter, Pagination), AppError> {
        let pagination = self.pagination.resolve(limits)?;

        let filter = AttendanceFilter {
            student_id: self.student_id,
            presence: self
                .presence
                .as_deref()
                .map(str::parse::<Presence>)
                .transpose()?,
            date: self.date.as_deref().map(normalize_date).transpose()?,
            academic_year_id: self.academic_year_id,
            from: self.from.as_deref().map(normalize_date).transpose()?,
            to: self.to.as_deref().map(normalize_date).transpose()?,
        };

        Ok((filter, pagination))
    }
}

/// Wire form of a record: `{ id, student_id, presence, date }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceResponse {
    pub id: i64,
    pub student_id: i64,
    pub presence: Presence,
    /// Serialized as `YYYY-MM-DD`, no time or offset.
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year_id: Option<i64>,
}

impl From<AttendanceRecord> for AttendanceResponse {
    fn from(record: AttendanceRecord) -> Self {
        Self {
            id: record.id,
            student_id: record.student_id,
            presence: record.presence,
            date: record.date,
            academic_year_id: record.academic_year_id,
        }
    }
}

/// `{ data, total, page, limit, total_pages }`.
pub type PageResponse = Page<AttendanceResponse>;

impl From<Page<AttendanceRecord>> for PageResponse {
    fn from(page: Page<AttendanceRecord>) -> Self {
        page.map(AttendanceResponse::from)
    }
}

/// Statistics rendered at a chosen precision.
///
/// `rates` is `null` when there are no records ("no data", not 0%).
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total: u64,
    pub counts: PresenceCounts,
    pub rates: Option<PresenceRates>,
}

impl StatsResponse {
    pub fn new(stats: &AttendanceStats, decimals: u32) -> Self {
        Self {
            total: stats.total,
            counts: stats.counts,
            rates: stats.rates().map(|r| r.rounded(decimals)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarCellResponse {
    pub date: NaiveDate,
    pub record_id: Option<i64>,
    pub presence: Option<Presence>,
    pub is_current_month: bool,
    pub is_today: bool,
}

impl From<&CalendarCell> for CalendarCellResponse {
    fn from(cell: &CalendarCell) -> Self {
        Self {
            date: cell.date,
            record_id: cell.record.as_ref().map(|r| r.id),
            presence: cell.record.as_ref().map(|r| r.presence),
            is_current_month: cell.is_current_month,
            is_today: cell.is_today,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<CalendarCellResponse>,
}

impl From<&CalendarGrid> for CalendarResponse {
    fn from(grid: &CalendarGrid) -> Self {
        Self {
            year: grid.month.year(),
            month: grid.month.month(),
            cells: grid.cells.iter().map(CalendarCellResponse::from).collect(),
        }
    }
}
