//! Application layer services implementing attendance workflows.
//!
//! Services coordinate validation, permission checks and repository calls.
//! They are generic over [`crate::domain::repositories::AttendanceRepository`]
//! so the same logic runs against PostgreSQL, the in-memory store, or a mock.
//!
//! # Available Services
//!
//! - [`services::attendance_service::AttendanceService`] - Record creation, update, deletion and listing
//! - [`services::report_service::ReportService`] - Statistics and monthly calendars

pub mod services;
