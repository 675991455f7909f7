//! Month calendar projection.
//!
//! Sparse attendance records are laid onto a fixed grid of six Sunday-first
//! weeks. The grid always has [`GRID_CELLS`] cells, whatever weekday the month
//! starts on and however many days it has.

use std::collections::HashMap;

use chrono::{Datelike, Days, Local, NaiveDate};
use serde_json::json;

use crate::domain::entities::AttendanceRecord;
use crate::error::AppError;

pub const GRID_WEEKS: usize = 6;
pub const DAYS_PER_WEEK: usize = 7;
pub const GRID_CELLS: usize = GRID_WEEKS * DAYS_PER_WEEK;

/// A validated `(year, month)` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    year: i32,
    month: u32,
}

impl CalendarMonth {
    /// Validates a target month.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] unless `1 <= month <= 12` and
    /// `1 <= year <= 9999`.
    pub fn new(year: i32, month: u32) -> Result<Self, AppError> {
        if !(1..=12).contains(&month) {
            return Err(AppError::bad_request(
                "Month must be between 1 and 12",
                json!({ "field": "month", "month": month }),
            ));
        }
        if !(1..=9999).contains(&year) {
            return Err(AppError::bad_request(
                "Year must be between 1 and 9999",
                json!({ "field": "year", "year": year }),
            ));
        }
        Ok(Self { year, month })
    }

    /// The month a date falls in.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Range checked in `new`; `of` takes it from an existing date.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The Sunday on or before the first day of the month.
    pub fn grid_start(&self) -> NaiveDate {
        let first = self.first_day();
        let back = u64::from(first.weekday().num_days_from_sunday());
        first - Days::new(back)
    }
}

/// One day of the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub record: Option<AttendanceRecord>,
    pub is_current_month: bool,
    /// Presentational highlight only.
    pub is_today: bool,
}

/// Exactly [`GRID_CELLS`] consecutive days starting on a Sunday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    pub month: CalendarMonth,
    pub cells: Vec<CalendarCell>,
}

impl CalendarGrid {
    /// Rows of seven cells, Sunday first.
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(DAYS_PER_WEEK)
    }

    /// First and last date shown, for building a `from`/`to` query.
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        let start = self.month.grid_start();
        (start, start + Days::new(GRID_CELLS as u64 - 1))
    }

    pub fn current_month_cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.cells.iter().filter(|c| c.is_current_month)
    }

    pub fn today(&self) -> Option<&CalendarCell> {
        self.cells.iter().find(|c| c.is_today)
    }
}

/// Projects records onto the grid of `month`.
///
/// Records are matched by exact calendar date; records outside the grid are
/// ignored. If several records share a date the one with the lowest id is
/// attached. `today`, when it falls inside the grid, flags that single cell.
pub fn project_month<'a, I>(month: CalendarMonth, records: I, today: Option<NaiveDate>) -> CalendarGrid
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut by_date: HashMap<NaiveDate, &AttendanceRecord> = HashMap::new();
    for record in records {
        by_date
            .entry(record.date)
            .and_modify(|current| {
                if record.id < current.id {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let start = month.grid_start();
    let cells = (0..GRID_CELLS as u64)
        .map(|offset| {
            let date = start + Days::new(offset);
            CalendarCell {
                date,
                record: by_date.get(&date).map(|r| (*r).clone()),
                is_current_month: month.contains(date),
                is_today: today == Some(date),
            }
        })
        .collect();

    CalendarGrid { month, cells }
}

/// [`project_month`] with `today` taken from the local clock.
pub fn project_month_today<'a, I>(month: CalendarMonth, records: I) -> CalendarGrid
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    project_month(month, records, Some(Local::now().date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Presence;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn no_records() -> Vec<AttendanceRecord> {
        Vec::new()
    }

    #[test]
    fn test_month_validation() {
        assert!(CalendarMonth::new(2024, 0).is_err());
        assert!(CalendarMonth::new(2024, 13).is_err());
        assert!(CalendarMonth::new(0, 5).is_err());
        assert!(CalendarMonth::new(10_000, 5).is_err());
        assert!(CalendarMonth::new(2024, 12).is_ok());
    }

    #[test]
    fn test_grid_always_has_42_cells() {
        for year in [1, 1999, 2015, 2024, 2026, 9999] {
            for m in 1..=12 {
                let month = CalendarMonth::new(year, m).unwrap();
                let grid = project_month(month, &no_records(), None);
                assert_eq!(grid.cells.len(), GRID_CELLS, "{year}-{m}");
                assert_eq!(grid.cells[0].date.weekday(), Weekday::Sun);
                assert_eq!(grid.weeks().count(), GRID_WEEKS);
            }
        }
    }

    #[test]
    fn test_march_2024_boundaries() {
        let grid = project_month(CalendarMonth::new(2024, 3).unwrap(), &no_records(), None);

        assert_eq!(grid.cells[0].date, date(2024, 2, 25));
        assert!(!grid.cells[0].is_current_month);

        let first_of_march = grid.cells.iter().find(|c| c.date == date(2024, 3, 1)).unwrap();
        assert!(first_of_march.is_current_month);
        assert_eq!(grid.current_month_cells().count(), 31);
        assert_eq!(grid.range(), (date(2024, 2, 25), date(2024, 4, 6)));
    }

    #[test]
    fn test_month_starting_on_sunday_starts_grid_on_first() {
        // September 2024 starts on a Sunday.
        let grid = project_month(CalendarMonth::new(2024, 9).unwrap(), &no_records(), None);
        assert_eq!(grid.cells[0].date, date(2024, 9, 1));
        assert!(grid.cells[0].is_current_month);
        assert_eq!(grid.current_month_cells().count(), 30);
    }

    #[test]
    fn test_february_non_leap_starting_sunday() {
        // February 2015: 28 days, starts on Sunday; two trailing weeks of March.
        let grid = project_month(CalendarMonth::new(2015, 2).unwrap(), &no_records(), None);
        assert_eq!(grid.cells.len(), GRID_CELLS);
        assert_eq!(grid.current_month_cells().count(), 28);
        assert_eq!(grid.cells[41].date, date(2015, 3, 14));
    }

    #[test]
    fn test_records_attach_by_date() {
        let records = vec![
            AttendanceRecord::new(1, 42, date(2024, 3, 10), Presence::Present, None),
            AttendanceRecord::new(2, 42, date(2024, 2, 26), Presence::Absent, None),
            AttendanceRecord::new(3, 42, date(2024, 5, 1), Presence::Late, None),
        ];
        let grid = project_month(CalendarMonth::new(2024, 3).unwrap(), &records, None);

        let tenth = grid.cells.iter().find(|c| c.date == date(2024, 3, 10)).unwrap();
        assert_eq!(tenth.record.as_ref().map(|r| r.id), Some(1));

        let overflow = grid.cells.iter().find(|c| c.date == date(2024, 2, 26)).unwrap();
        assert_eq!(overflow.record.as_ref().map(|r| r.presence), Some(Presence::Absent));
        assert!(!overflow.is_current_month);

        let attached = grid.cells.iter().filter(|c| c.record.is_some()).count();
        assert_eq!(attached, 2);
    }

    #[test]
    fn test_lowest_id_wins_on_shared_date() {
        let records = vec![
            AttendanceRecord::new(8, 42, date(2024, 3, 4), Presence::Late, None),
            AttendanceRecord::new(5, 43, date(2024, 3, 4), Presence::Present, None),
        ];
        let grid = project_month(CalendarMonth::new(2024, 3).unwrap(), &records, None);
        let cell = grid.cells.iter().find(|c| c.date == date(2024, 3, 4)).unwrap();
        assert_eq!(cell.record.as_ref().map(|r| r.id), Some(5));
    }

    #[test]
    fn test_today_flag() {
        let month = CalendarMonth::new(2024, 3).unwrap();

        let grid = project_month(month, &no_records(), Some(date(2024, 3, 15)));
        assert_eq!(grid.cells.iter().filter(|c| c.is_today).count(), 1);
        assert_eq!(grid.today().map(|c| c.date), Some(date(2024, 3, 15)));

        let outside = project_month(month, &no_records(), Some(date(2025, 1, 1)));
        assert!(outside.today().is_none());
    }

    #[test]
    fn test_of_date() {
        let month = CalendarMonth::of(date(2024, 3, 10));
        assert_eq!((month.year(), month.month()), (2024, 3));
        assert_eq!(month.first_day(), date(2024, 3, 1));
    }

    #[test]
    fn test_project_month_today_flags_local_date() {
        let today = Local::now().date_naive();
        let grid = project_month_today(CalendarMonth::of(today), &no_records());

        // The clock may tick over midnight between the two reads.
        if let Some(cell) = grid.today() {
            assert!(cell.is_current_month);
            assert_eq!(grid.cells.iter().filter(|c| c.is_today).count(), 1);
        }
    }
}
