//! Repository trait for attendance record storage.

use crate::domain::entities::{AttendancePatch, AttendanceRecord, NewAttendance, Presence};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

/// Filter criteria for attendance queries.
///
/// Every field is optional; `None` leaves that dimension unconstrained.
/// `from`/`to` bound the date range inclusively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub student_id: Option<i64>,
    pub presence: Option<Presence>,
    pub date: Option<NaiveDate>,
    pub academic_year_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AttendanceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_student(mut self, student_id: i64) -> Self {
        self.student_id = Some(student_id);
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_academic_year(mut self, academic_year_id: i64) -> Self {
        self.academic_year_id = Some(academic_year_id);
        self
    }

    /// Adds inclusive date range filtering to the query.
    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Whether a record satisfies every constraint of this filter.
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.student_id.is_none_or(|id| record.student_id == id)
            && self.presence.is_none_or(|p| record.presence == p)
            && self.date.is_none_or(|d| record.date == d)
            && self
                .academic_year_id
                .is_none_or(|year| record.academic_year_id == Some(year))
            && self.from.is_none_or(|from| record.date >= from)
            && self.to.is_none_or(|to| record.date <= to)
    }
}

/// Validated 1-based pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    /// Builds a pagination window, bounding `limit` by `max_limit`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `page` is 0 or `limit` is outside
    /// `1..=max_limit`.
    pub fn new(page: u32, limit: u32, max_limit: u32) -> Result<Self, AppError> {
        if page == 0 {
            return Err(AppError::bad_request(
                "Page must be greater than 0",
                json!({ "field": "page", "page": page }),
            ));
        }

        if limit == 0 || limit > max_limit {
            return Err(AppError::bad_request(
                format!("Limit must be between 1 and {max_limit}"),
                json!({ "field": "limit", "limit": limit, "max": max_limit }),
            ));
        }

        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip for this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// One page of results plus the metadata needed to navigate the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, pagination: Pagination) -> Self {
        let limit = u64::from(pagination.limit());
        let total_pages = u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX);

        Self {
            data,
            total,
            page: pagination.page(),
            limit: pagination.limit(),
            total_pages,
        }
    }

    /// Whether a page after this one exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

/// Persistence contract for attendance records.
///
/// Implementations MUST enforce the one-record-per-`(student_id, date)`
/// invariant themselves (unique index, or check-and-insert under one lock).
/// The application-level duplicate check is only a fast pre-check: two
/// concurrent writers can both pass it, and only the store can reject the
/// second insert.
///
/// Mutations must be atomic: a cancelled or failed write leaves the record
/// either fully in its prior state or fully updated.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAttendanceRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryAttendanceRepository`] - Process-local store
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_attendance.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Finds the live record for a student on a calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Connectivity`] if the store is unreachable.
    async fn find_by_student_and_date(
        &self,
        student_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AppError>;

    /// Lists records matching `filter`, ordered by date then id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Connectivity`] if the store is unreachable.
    async fn query(
        &self,
        filter: AttendanceFilter,
        pagination: Pagination,
    ) -> Result<Page<AttendanceRecord>, AppError>;

    /// Inserts a new record and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Duplicate`] if a record already exists for the
    /// same student and date.
    async fn insert(&self, new_record: NewAttendance) -> Result<AttendanceRecord, AppError>;

    /// Partially updates a record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record has this id.
    /// Returns [`AppError::Duplicate`] if the new date collides with another
    /// record of the same student.
    async fn update(&self, id: i64, patch: AttendancePatch) -> Result<AttendanceRecord, AppError>;

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record has this id.
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}
