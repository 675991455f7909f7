//! Attendance record creation, update, deletion and listing.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use validator::Validate;

use crate::domain::duplicate_guard::DuplicateGuard;
use crate::domain::entities::{Actor, AttendanceRecord, NewAttendance, Presence};
use crate::domain::repositories::{AttendanceFilter, AttendanceRepository, Page, Pagination};
use crate::dto::{AttendanceQueryParams, CreateAttendanceRequest, PageLimits, UpdateAttendanceRequest};
use crate::error::{AppError, DUPLICATE_RECORD_MESSAGE};
use crate::utils::date_normalizer::normalize_date;

/// Service for managing per-student daily attendance records.
///
/// Stateless apart from the injected repository: no caching, no background
/// work. Every failure is returned to the caller as an [`AppError`].
pub struct AttendanceService<R: AttendanceRepository> {
    repository: Arc<R>,
    guard: DuplicateGuard<R>,
    page_limits: PageLimits,
}

impl<R: AttendanceRepository> AttendanceService<R> {
    /// Creates a new attendance service with default page limits.
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            guard: DuplicateGuard::new(Arc::clone(&repository)),
            repository,
            page_limits: PageLimits::default(),
        }
    }

    pub fn with_page_limits(mut self, page_limits: PageLimits) -> Self {
        self.page_limits = page_limits;
        self
    }

    pub fn page_limits(&self) -> PageLimits {
        self.page_limits
    }

    /// Records a student's presence for one calendar date.
    ///
    /// # Flow
    ///
    /// 1. Reject actors without a managing role
    /// 2. Validate the presence value
    /// 3. Normalize the date to a calendar date
    /// 4. Ask the duplicate guard for an existing record
    /// 5. Insert; a uniqueness violation from the store (a concurrent writer
    ///    won the race after step 4) is reported as the same duplicate error
    ///
    /// Must not be retried blindly after [`AppError::Duplicate`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Permission`] if the actor cannot manage attendance.
    /// Returns [`AppError::Validation`] for an unknown presence, a malformed
    /// date or a non-positive id.
    /// Returns [`AppError::Duplicate`] if the student already has a record
    /// on that date.
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateAttendanceRequest,
    ) -> Result<AttendanceRecord, AppError> {
        actor.ensure_can_manage()?;
        request.validate()?;

        let presence: Presence = request.presence.parse()?;
        let date = normalize_date(&request.date)?;
        let student_id = request.student_id;

        if let Some(existing) = self.guard.check(student_id, date).await? {
            metrics::counter!("attendance_duplicate_rejections_total", "layer" => "guard")
                .increment(1);
            tracing::debug!(student_id, %date, existing_id = existing.id, "Duplicate attendance rejected by guard");
            return Err(duplicate_error(student_id, date, Some(existing.id)));
        }

        let new_record = NewAttendance {
            student_id,
            date,
            presence,
            academic_year_id: request.academic_year_id,
        };

        match self.repository.insert(new_record).await {
            Ok(record) => {
                metrics::counter!("attendance_records_created_total").increment(1);
                tracing::info!(id = record.id, student_id, %date, presence = %presence, "Attendance recorded");
                Ok(record)
            }
            Err(AppError::Duplicate { .. }) => {
                metrics::counter!("attendance_duplicate_rejections_total", "layer" => "store")
                    .increment(1);
                tracing::warn!(student_id, %date, "Concurrent attendance insert rejected by store");
                Err(duplicate_error(student_id, date, None))
            }
            Err(e) => Err(e),
        }
    }

    /// Changes the date and/or presence of an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Permission`] if the actor cannot manage attendance.
    /// Returns [`AppError::Validation`] for an unknown presence, a malformed
    /// date or an empty update; the stored record is left untouched.
    /// Returns [`AppError::NotFound`] if no record has this id.
    /// Returns [`AppError::Duplicate`] if the new date is already taken.
    pub async fn update(
        &self,
        actor: &Actor,
        id: i64,
        request: UpdateAttendanceRequest,
    ) -> Result<AttendanceRecord, AppError> {
        actor.ensure_can_manage()?;
        let patch = request.into_patch()?;

        let record = self.repository.update(id, patch).await?;
        tracing::info!(id, student_id = record.student_id, date = %record.date, presence = %record.presence, "Attendance updated");
        Ok(record)
    }

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Permission`] if the actor cannot manage attendance.
    /// Returns [`AppError::NotFound`] if no record has this id.
    pub async fn delete(&self, actor: &Actor, id: i64) -> Result<(), AppError> {
        actor.ensure_can_manage()?;

        self.repository.delete(id).await?;
        tracing::info!(id, "Attendance deleted");
        Ok(())
    }

    /// Lists records; filter and page shape pass through unchanged.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn list(
        &self,
        filter: AttendanceFilter,
        pagination: Pagination,
    ) -> Result<Page<AttendanceRecord>, AppError> {
        self.repository.query(filter, pagination).await
    }

    /// Lists records from raw query parameters, bounded by the page limits.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for malformed parameters.
    pub async fn list_params(
        &self,
        params: AttendanceQueryParams,
    ) -> Result<Page<AttendanceRecord>, AppError> {
        let (filter, pagination) = params.into_query(self.page_limits)?;
        self.list(filter, pagination).await
    }
}

fn duplicate_error(student_id: i64, date: NaiveDate, existing_id: Option<i64>) -> AppError {
    AppError::duplicate(
        DUPLICATE_RECORD_MESSAGE,
        json!({
            "student_id": student_id,
            "date": date.to_string(),
            "existing_id": existing_id,
        }),
    )
}
