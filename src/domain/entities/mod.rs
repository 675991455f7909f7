//! Core domain entities representing the attendance data model.
//!
//! Entities are plain data structures; the invariants they take part in are
//! enforced by the repositories and services that handle them.
//!
//! # Entity Types
//!
//! - [`AttendanceRecord`] - One student's presence on one calendar date
//! - [`Presence`] - Closed set of attendance categories
//! - [`Actor`] / [`Role`] - The caller on whose behalf a mutation runs
//!
//! # Design Pattern
//!
//! Separate structs are used for creation and partial updates:
//! - `NewAttendance` - For inserting records
//! - `AttendancePatch` - For partial updates

pub mod actor;
pub mod attendance;
pub mod presence;

pub use actor::{Actor, Role};
pub use attendance::{AttendancePatch, AttendanceRecord, NewAttendance};
pub use presence::{Presence, PresenceParseError};
