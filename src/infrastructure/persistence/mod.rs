//! Attendance repository implementations.
//!
//! # Repositories
//!
//! - [`PgAttendanceRepository`] - PostgreSQL storage, uniqueness enforced by a table constraint
//! - [`InMemoryAttendanceRepository`] - Process-local storage for tests and tooling

pub mod memory_attendance_repository;
pub mod pg_attendance_repository;

pub use memory_attendance_repository::InMemoryAttendanceRepository;
pub use pg_attendance_repository::PgAttendanceRepository;
