//! Fast pre-insert check for an existing `(student_id, date)` record.
//!
//! The guard is a user-experience optimization, not a concurrency primitive.
//! Two writers can both pass it before either inserts; the repository's own
//! uniqueness constraint is what keeps the invariant.

use std::sync::Arc;

use crate::domain::entities::AttendanceRecord;
use crate::domain::repositories::AttendanceRepository;
use crate::error::AppError;
use crate::utils::date_normalizer::IntoCalendarDate;

/// Looks up the live record a new entry would collide with.
pub struct DuplicateGuard<R: AttendanceRepository> {
    repository: Arc<R>,
}

impl<R: AttendanceRepository> DuplicateGuard<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Returns the existing record for the student on that calendar date, if any.
    ///
    /// `date` may carry a time of day or an offset; only its calendar date is
    /// compared. Never writes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the date cannot be normalized.
    /// Propagates repository failures unchanged.
    pub async fn check(
        &self,
        student_id: i64,
        date: impl IntoCalendarDate,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let date = date.into_calendar_date()?;
        self.repository
            .find_by_student_and_date(student_id, date)
            .await
    }
}

impl<R: AttendanceRepository> Clone for DuplicateGuard<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
