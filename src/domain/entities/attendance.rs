//! Attendance record entity: one student, one calendar date, one presence.

use chrono::NaiveDate;

use super::Presence;

/// A stored attendance record.
///
/// `date` is a calendar date with no time-of-day or timezone; the store keeps
/// at most one record per `(student_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub date: NaiveDate,
    pub presence: Presence,
    pub academic_year_id: Option<i64>,
}

impl AttendanceRecord {
    /// Creates a new AttendanceRecord instance.
    pub fn new(
        id: i64,
        student_id: i64,
        date: NaiveDate,
        presence: Presence,
        academic_year_id: Option<i64>,
    ) -> Self {
        Self {
            id,
            student_id,
            date,
            presence,
            academic_year_id,
        }
    }

    /// Applies a patch in place. Used by stores without server-side updates.
    pub fn apply(&mut self, patch: &AttendancePatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(presence) = patch.presence {
            self.presence = presence;
        }
    }
}

/// Input data for inserting a new record. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub student_id: i64,
    pub date: NaiveDate,
    pub presence: Presence,
    pub academic_year_id: Option<i64>,
}

/// Partial update for an existing record.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendancePatch {
    pub date: Option<NaiveDate>,
    pub presence: Option<Presence>,
}

impl AttendancePatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.presence.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_record_creation() {
        let record = AttendanceRecord::new(1, 42, date(2024, 3, 10), Presence::Present, None);

        assert_eq!(record.id, 1);
        assert_eq!(record.student_id, 42);
        assert_eq!(record.date, date(2024, 3, 10));
        assert_eq!(record.presence, Presence::Present);
        assert!(record.academic_year_id.is_none());
    }

    #[test]
    fn test_apply_patch_changes_only_given_fields() {
        let mut record = AttendanceRecord::new(1, 42, date(2024, 3, 10), Presence::Present, Some(3));

        record.apply(&AttendancePatch {
            date: None,
            presence: Some(Presence::Late),
        });
        assert_eq!(record.presence, Presence::Late);
        assert_eq!(record.date, date(2024, 3, 10));

        record.apply(&AttendancePatch {
            date: Some(date(2024, 3, 11)),
            presence: None,
        });
        assert_eq!(record.date, date(2024, 3, 11));
        assert_eq!(record.presence, Presence::Late);
        assert_eq!(record.id, 1);
        assert_eq!(record.academic_year_id, Some(3));
    }

    #[test]
    fn test_empty_patch() {
        assert!(AttendancePatch::default().is_empty());
        assert!(
            !AttendancePatch {
                date: None,
                presence: Some(Presence::Absent)
            }
            .is_empty()
        );
    }
}
