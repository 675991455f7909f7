//! Repository trait definitions for the domain layer.
//!
//! This module defines the storage contract for attendance records following
//! the Repository pattern. It is implemented by concrete repositories in the
//! infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod attendance_repository;

pub use attendance_repository::{AttendanceFilter, AttendanceRepository, Page, Pagination};

#[cfg(test)]
pub use attendance_repository::MockAttendanceRepository;
