//! Data transfer objects for attendance operations.
//!
//! Raw caller input is parsed and validated here before it reaches the
//! services; typed results are turned into their wire form here.

pub mod attendance;
pub mod pagination;

pub use attendance::{
    AttendanceQueryParams, AttendanceResponse, CalendarCellResponse, CalendarResponse,
    CreateAttendanceRequest, PageResponse, StatsResponse, UpdateAttendanceRequest,
};
pub use pagination::{PageLimits, PaginationParams};
