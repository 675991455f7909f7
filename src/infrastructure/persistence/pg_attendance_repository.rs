//! PostgreSQL implementation of the attendance repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{AttendancePatch, AttendanceRecord, NewAttendance, Presence};
use crate::domain::repositories::{AttendanceFilter, AttendanceRepository, Page, Pagination};
use crate::error::{AppError, DUPLICATE_RECORD_MESSAGE};
use crate::utils::db_error::is_unique_violation_on_student_date;

const SELECT_COLUMNS: &str = "id, student_id, date, presence, academic_year_id";

/// Shared `WHERE` clause; every parameter may be `NULL` to disable it.
///
/// `$1` student, `$2` presence, `$3` date, `$4` academic year, `$5` from, `$6` to.
const FILTER_CLAUSE: &str = r#"
    WHERE ($1::bigint IS NULL OR student_id = $1)
      AND ($2::text IS NULL OR presence = $2)
      AND ($3::date IS NULL OR date = $3)
      AND ($4::bigint IS NULL OR academic_year_id = $4)
      AND ($5::date IS NULL OR date >= $5)
      AND ($6::date IS NULL OR date <= $6)
"#;

#[derive(Debug, sqlx::FromRow)]
struct AttendanceRow {
    id: i64,
    student_id: i64,
    date: NaiveDate,
    presence: String,
    academic_year_id: Option<i64>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let presence: Presence = row.presence.parse().map_err(|_| {
            tracing::error!(id = row.id, presence = %row.presence, "Unknown presence value in store");
            AppError::internal("Corrupt attendance record", json!({ "id": row.id }))
        })?;

        Ok(AttendanceRecord::new(
            row.id,
            row.student_id,
            row.date,
            presence,
            row.academic_year_id,
        ))
    }
}

/// PostgreSQL repository for attendance records.
///
/// The `(student_id, date)` uniqueness rule is enforced by the
/// `attendance_student_date_key` constraint, so concurrent inserts are
/// serialized by the database.
pub struct PgAttendanceRepository {
    pool: Arc<PgPool>,
}

impl PgAttendanceRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn map_write_error(e: sqlx::Error, student_id: i64, date: Option<NaiveDate>) -> AppError {
    if is_unique_violation_on_student_date(&e) {
        return AppError::duplicate(
            DUPLICATE_RECORD_MESSAGE,
            json!({
                "student_id": student_id,
                "date": date.map(|d| d.to_string()),
            }),
        );
    }
    AppError::from(e)
}

#[async_trait]
impl AttendanceRepository for PgAttendanceRepository {
    async fn find_by_student_and_date(
        &self,
        student_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM attendance_records WHERE student_id = $1 AND date = $2"
        );

        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(student_id)
            .bind(date)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn query(
        &self,
        filter: AttendanceFilter,
        pagination: Pagination,
    ) -> Result<Page<AttendanceRecord>, AppError> {
        let presence = filter.presence.map(|p| p.as_str());

        let count_sql = format!("SELECT COUNT(*) FROM attendance_records {FILTER_CLAUSE}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(filter.student_id)
            .bind(presence)
            .bind(filter.date)
            .bind(filter.academic_year_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(self.pool.as_ref())
            .await?;

        let select_sql = format!(
            "SELECT {SELECT_COLUMNS} FROM attendance_records {FILTER_CLAUSE} ORDER BY date, id LIMIT $7 OFFSET $8"
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&select_sql)
            .bind(filter.student_id)
            .bind(presence)
            .bind(filter.date)
            .bind(filter.academic_year_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(i64::from(pagination.limit()))
            .bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX))
            .fetch_all(self.pool.as_ref())
            .await?;

        let data = rows
            .into_iter()
            .map(AttendanceRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(
            data,
            u64::try_from(total).unwrap_or(0),
            pagination,
        ))
    }

    async fn insert(&self, new_record: NewAttendance) -> Result<AttendanceRecord, AppError> {
        let sql = format!(
            r#"
            INSERT INTO attendance_records (student_id, date, presence, academic_year_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {SELECT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(new_record.student_id)
            .bind(new_record.date)
            .bind(new_record.presence.as_str())
            .bind(new_record.academic_year_id)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| map_write_error(e, new_record.student_id, Some(new_record.date)))?;

        AttendanceRecord::try_from(row)
    }

    async fn update(&self, id: i64, patch: AttendancePatch) -> Result<AttendanceRecord, AppError> {
        let sql = format!(
            r#"
            UPDATE attendance_records
            SET date = COALESCE($2, date),
                presence = COALESCE($3, presence),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .bind(patch.date)
            .bind(patch.presence.map(|p| p.as_str()))
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| {
                if is_unique_violation_on_student_date(&e) {
                    AppError::duplicate(
                        DUPLICATE_RECORD_MESSAGE,
                        json!({ "id": id, "date": patch.date.map(|d| d.to_string()) }),
                    )
                } else {
                    AppError::from(e)
                }
            })?;

        match row {
            Some(row) => AttendanceRecord::try_from(row),
            None => Err(AppError::not_found(
                "Attendance record not found",
                json!({ "id": id }),
            )),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM attendance_records WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Attendance record not found",
                json!({ "id": id }),
            ));
        }

        Ok(())
    }
}
