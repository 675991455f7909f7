#![allow(dead_code)]

use attendance_core::application::services::{AttendanceService, ReportService};
use attendance_core::domain::entities::{Actor, Role};
use attendance_core::dto::CreateAttendanceRequest;
use attendance_core::infrastructure::persistence::InMemoryAttendanceRepository;
use attendance_core::utils::retry::ReadRetryPolicy;
use chrono::NaiveDate;
use sqlx::PgPool;
use std::sync::Arc;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn preceptor() -> Actor {
    Actor::new(Role::Preceptor)
}

pub fn teacher() -> Actor {
    Actor::new(Role::Teacher)
}

pub struct MemoryHarness {
    pub repository: Arc<InMemoryAttendanceRepository>,
    pub attendance: AttendanceService<InMemoryAttendanceRepository>,
    pub reports: ReportService<InMemoryAttendanceRepository>,
}

pub fn memory_harness() -> MemoryHarness {
    let repository = Arc::new(InMemoryAttendanceRepository::new());
    MemoryHarness {
        attendance: AttendanceService::new(Arc::clone(&repository)),
        reports: ReportService::new(Arc::clone(&repository))
            .with_retry_policy(ReadRetryPolicy::disabled())
            .with_page_size(3),
        repository,
    }
}

/// Records every `(student, date, presence)` through the service.
pub async fn seed(harness: &MemoryHarness, rows: &[(i64, &str, &str)]) {
    for (student_id, day, presence) in rows {
        harness
            .attendance
            .create(
                &preceptor(),
                CreateAttendanceRequest::new(*student_id, *day, *presence),
            )
            .await
            .unwrap();
    }
}

pub async fn insert_pg_record(pool: &PgPool, student_id: i64, day: NaiveDate, presence: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO attendance_records (student_id, date, presence) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(student_id)
    .bind(day)
    .bind(presence)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn count_pg_records(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM attendance_records")
        .fetch_one(pool)
        .await
        .unwrap()
}
