//! Read-only attendance reports: statistics and monthly calendars.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::domain::calendar::{CalendarGrid, CalendarMonth, GRID_CELLS, project_month};
use crate::domain::entities::AttendanceRecord;
use crate::domain::repositories::{AttendanceFilter, AttendanceRepository, Pagination};
use crate::domain::stats::AttendanceStats;
use crate::error::AppError;
use crate::utils::retry::{ReadRetryPolicy, retry_read};

const DEFAULT_PAGE_SIZE: u32 = 100;

/// Statistics for a whole selection plus the per-student breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CohortReport {
    pub overall: AttendanceStats,
    pub by_student: BTreeMap<i64, AttendanceStats>,
}

/// Service that reads attendance and derives presentation data from it.
///
/// Reads are retried with backoff on connectivity failures; nothing here
/// writes.
pub struct ReportService<R: AttendanceRepository> {
    repository: Arc<R>,
    retry: ReadRetryPolicy,
    page_size: u32,
}

impl<R: AttendanceRepository> ReportService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            retry: ReadRetryPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_retry_policy(mut self, retry: ReadRetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Page size used when walking the store. Clamped to at least 1.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Collects every record matching `filter`, page by page.
    ///
    /// # Errors
    ///
    /// Returns the repository error once read retries are exhausted.
    pub async fn fetch_all(&self, filter: AttendanceFilter) -> Result<Vec<AttendanceRecord>, AppError> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let pagination = Pagination::new(page, self.page_size, self.page_size)?;
            let result = retry_read(self.retry, || {
                self.repository.query(filter.clone(), pagination)
            })
            .await?;

            let has_next = result.has_next();
            records.extend(result.data);
            if !has_next {
                break;
            }
            page += 1;
        }

        tracing::debug!(count = records.len(), pages = page, "Fetched attendance for report");
        Ok(records)
    }

    /// Statistics for records matching `filter`.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_all`].
    pub async fn stats(&self, filter: AttendanceFilter) -> Result<AttendanceStats, AppError> {
        let records = self.fetch_all(filter).await?;
        Ok(AttendanceStats::from_records(&records))
    }

    /// Overall and per-student statistics for records matching `filter`.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_all`].
    pub async fn cohort_report(&self, filter: AttendanceFilter) -> Result<CohortReport, AppError> {
        let records = self.fetch_all(filter).await?;
        Ok(CohortReport {
            overall: AttendanceStats::from_records(&records),
            by_student: AttendanceStats::by_student(&records),
        })
    }

    /// Month grid for one student, including the leading and trailing days
    /// of neighbouring months that the grid shows.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_all`].
    pub async fn student_calendar(
        &self,
        student_id: i64,
        month: CalendarMonth,
        today: Option<NaiveDate>,
    ) -> Result<CalendarGrid, AppError> {
        let from = month.grid_start();
        let to = from + Days::new(GRID_CELLS as u64 - 1);

        let filter = AttendanceFilter::new()
            .with_student(student_id)
            .with_date_range(Some(from), Some(to));
        let records = self.fetch_all(filter).await?;

        Ok(project_month(month, &records, today))
    }
}
