//! Domain layer containing attendance entities and pure logic.
//!
//! Nothing here depends on the persistence or presentation layers.
//!
//! # Architecture
//!
//! - [`entities`] - Records, presence values and actors
//! - [`repositories`] - Storage contract, filters and pagination
//! - [`duplicate_guard`] - Pre-insert lookup for an existing `(student, date)` record
//! - [`stats`] - Counts and percentages per presence category
//! - [`calendar`] - Six-week month grids
//!
//! # Uniqueness
//!
//! At most one record exists per student per calendar date. The
//! [`duplicate_guard::DuplicateGuard`] gives an early, friendly rejection;
//! the repository enforces the rule atomically at insert time.

pub mod calendar;
pub mod duplicate_guard;
pub mod entities;
pub mod repositories;
pub mod stats;
