//! Business logic services for the application layer.

pub mod attendance_service;
pub mod report_service;

pub use attendance_service::AttendanceService;
pub use report_service::{CohortReport, ReportService};
