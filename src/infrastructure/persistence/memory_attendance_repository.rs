//! Process-local attendance store.
//!
//! Backs tests and single-process tooling. The uniqueness check and the
//! insert run under the same write lock, so concurrent creators for one
//! `(student_id, date)` cannot both succeed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use tokio::sync::RwLock;

use crate::domain::entities::{AttendancePatch, AttendanceRecord, NewAttendance};
use crate::domain::repositories::{AttendanceFilter, AttendanceRepository, Page, Pagination};
use crate::error::{AppError, DUPLICATE_RECORD_MESSAGE};

#[derive(Debug)]
struct MemoryState {
    next_id: i64,
    records: BTreeMap<i64, AttendanceRecord>,
}

impl MemoryState {
    fn find(&self, student_id: i64, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.records
            .values()
            .find(|r| r.student_id == student_id && r.date == date)
    }
}

/// In-memory implementation of [`AttendanceRepository`].
#[derive(Debug)]
pub struct InMemoryAttendanceRepository {
    state: RwLock<MemoryState>,
}

impl Default for InMemoryAttendanceRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAttendanceRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_id: 1,
                records: BTreeMap::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn get(&self, id: i64) -> Option<AttendanceRecord> {
        self.state.read().await.records.get(&id).cloned()
    }
}

fn not_found(id: i64) -> AppError {
    AppError::not_found("Attendance record not found", json!({ "id": id }))
}

#[async_trait]
impl AttendanceRepository for InMemoryAttendanceRepository {
    async fn find_by_student_and_date(
        &self,
        student_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        Ok(self.state.read().await.find(student_id, date).cloned())
    }

    async fn query(
        &self,
        filter: AttendanceFilter,
        pagination: Pagination,
    ) -> Result<Page<AttendanceRecord>, AppError> {
        let state = self.state.read().await;

        let mut matching: Vec<&AttendanceRecord> =
            state.records.values().filter(|r| filter.matches(r)).collect();
        matching.sort_by_key(|r| (r.date, r.id));

        let total = matching.len() as u64;
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let data = matching
            .into_iter()
            .skip(offset)
            .take(pagination.limit() as usize)
            .cloned()
            .collect();

        Ok(Page::new(data, total, pagination))
    }

    async fn insert(&self, new_record: NewAttendance) -> Result<AttendanceRecord, AppError> {
        let mut state = self.state.write().await;

        if let Some(existing) = state.find(new_record.student_id, new_record.date) {
            return Err(AppError::duplicate(
                DUPLICATE_RECORD_MESSAGE,
                json!({
                    "student_id": new_record.student_id,
                    "date": new_record.date.to_string(),
                    "existing_id": existing.id,
                }),
            ));
        }

        let id = state.next_id;
        state.next_id += 1;

        let record = AttendanceRecord::new(
            id,
            new_record.student_id,
            new_record.date,
            new_record.presence,
            new_record.academic_year_id,
        );
        state.records.insert(id, record.clone());

        Ok(record)
    }

    async fn update(&self, id: i64, patch: AttendancePatch) -> Result<AttendanceRecord, AppError> {
        let mut state = self.state.write().await;

        let mut updated = state.records.get(&id).cloned().ok_or_else(|| not_found(id))?;
        updated.apply(&patch);

        if let Some(other) = state.find(updated.student_id, updated.date)
            && other.id != id
        {
            return Err(AppError::duplicate(
                DUPLICATE_RECORD_MESSAGE,
                json!({
                    "id": id,
                    "date": updated.date.to_string(),
                    "existing_id": other.id,
                }),
            ));
        }

        state.records.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.state
            .write()
            .await
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }
}
