//! Helpers shared across layers.
//!
//! - [`date_normalizer`] - Calendar-date normalization of caller input
//! - [`db_error`] - Classification of database errors
//! - [`retry`] - Backoff retries for reads

pub mod date_normalizer;
pub mod db_error;
pub mod retry;
