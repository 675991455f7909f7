//! Attendance statistics over a set of records.
//!
//! Rates are kept unrounded; rounding is a presentation concern applied with
//! [`PresenceRates::rounded`], so two callers can display different precisions
//! from the same aggregate.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::entities::{AttendanceRecord, Presence};

/// Number of records per presence category. Zero counts are kept, not omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PresenceCounts {
    pub present: u64,
    pub absent: u64,
    pub late: u64,
    pub justified: u64,
}

impl PresenceCounts {
    pub fn get(&self, presence: Presence) -> u64 {
        match presence {
            Presence::Present => self.present,
            Presence::Absent => self.absent,
            Presence::Late => self.late,
            Presence::Justified => self.justified,
        }
    }

    fn increment(&mut self, presence: Presence) {
        let slot = match presence {
            Presence::Present => &mut self.present,
            Presence::Absent => &mut self.absent,
            Presence::Late => &mut self.late,
            Presence::Justified => &mut self.justified,
        };
        *slot += 1;
    }

    /// `(category, count)` pairs for all four categories.
    pub fn iter(&self) -> impl Iterator<Item = (Presence, u64)> + '_ {
        Presence::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}

/// Percentage of records per presence category, in `0.0..=100.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PresenceRates {
    pub present: f64,
    pub absent: f64,
    pub late: f64,
    pub justified: f64,
}

impl PresenceRates {
    pub fn get(&self, presence: Presence) -> f64 {
        match presence {
            Presence::Present => self.present,
            Presence::Absent => self.absent,
            Presence::Late => self.late,
            Presence::Justified => self.justified,
        }
    }

    /// Rounds every rate to `decimals` places (0 for whole percentages).
    pub fn rounded(&self, decimals: u32) -> PresenceRates {
        PresenceRates {
            present: round_to(self.present, decimals),
            absent: round_to(self.absent, decimals),
            late: round_to(self.late, decimals),
            justified: round_to(self.justified, decimals),
        }
    }

    pub fn sum(&self) -> f64 {
        self.present + self.absent + self.late + self.justified
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Aggregate over one student's or one cohort's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceStats {
    pub total: u64,
    pub counts: PresenceCounts,
}

impl AttendanceStats {
    /// Counts records per presence category. Order of input is irrelevant.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AttendanceRecord>,
    {
        let mut stats = AttendanceStats::default();
        for record in records {
            stats.total += 1;
            stats.counts.increment(record.presence);
        }
        stats
    }

    /// Groups records by student and aggregates each group.
    pub fn by_student<'a, I>(records: I) -> BTreeMap<i64, AttendanceStats>
    where
        I: IntoIterator<Item = &'a AttendanceRecord>,
    {
        let mut groups: BTreeMap<i64, AttendanceStats> = BTreeMap::new();
        for record in records {
            let stats = groups.entry(record.student_id).or_default();
            stats.total += 1;
            stats.counts.increment(record.presence);
        }
        groups
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Unrounded percentage for one category; `None` when there is no data.
    pub fn rate(&self, presence: Presence) -> Option<f64> {
        self.percentage(self.counts.get(presence))
    }

    /// Unrounded percentages for all categories; `None` when there is no data.
    ///
    /// Callers must render `None` as an explicit "no data" state, not as 0%.
    pub fn rates(&self) -> Option<PresenceRates> {
        Some(PresenceRates {
            present: self.rate(Presence::Present)?,
            absent: self.rate(Presence::Absent)?,
            late: self.rate(Presence::Late)?,
            justified: self.rate(Presence::Justified)?,
        })
    }

    /// Share of days the student was in class, late arrivals included.
    pub fn attended_rate(&self) -> Option<f64> {
        self.percentage(self.counts.present + self.counts.late)
    }

    fn percentage(&self, count: u64) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(count as f64 / self.total as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn records(student_id: i64, presences: &[Presence]) -> Vec<AttendanceRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        presences
            .iter()
            .enumerate()
            .map(|(i, p)| {
                AttendanceRecord::new(
                    i as i64 + 1,
                    student_id,
                    start + chrono::Days::new(i as u64),
                    *p,
                    None,
                )
            })
            .collect()
    }

    fn tolerance(decimals: u32) -> f64 {
        // Each of the four rates may be off by half a display unit.
        4.0 * 0.5 * 10f64.powi(-(decimals as i32)) + f64::EPSILON * 100.0
    }

    #[test]
    fn test_empty_set_has_no_rates() {
        let stats = AttendanceStats::from_records(&Vec::<AttendanceRecord>::new());

        assert_eq!(stats.total, 0);
        assert!(stats.is_empty());
        assert_eq!(stats.counts, PresenceCounts::default());
        assert!(stats.rates().is_none());
        assert!(stats.rate(Presence::Present).is_none());
        assert!(stats.attended_rate().is_none());
    }

    #[test]
    fn test_single_present_record() {
        let stats = AttendanceStats::from_records(&records(42, &[Presence::Present]));
        let rates = stats.rates().unwrap();

        assert_eq!(stats.total, 1);
        assert_eq!(rates.present, 100.0);
        assert_eq!(rates.absent, 0.0);
        assert_eq!(rates.late, 0.0);
        assert_eq!(rates.justified, 0.0);
    }

    #[test]
    fn test_cohort_of_ten() {
        let mut presences = vec![Presence::Present; 8];
        presences.push(Presence::Absent);
        presences.push(Presence::Late);
        let stats = AttendanceStats::from_records(&records(1, &presences));
        let rates = stats.rates().unwrap();

        assert_eq!(stats.counts.get(Presence::Present), 8);
        assert_eq!(stats.counts.get(Presence::Justified), 0);
        assert!((rates.present - 80.0).abs() < 1e-9);
        assert!((rates.absent - 10.0).abs() < 1e-9);
        assert!((rates.late - 10.0).abs() < 1e-9);
        assert_eq!(rates.justified, 0.0);
        assert!((rates.sum() - 100.0).abs() < 1e-9);
        assert!((stats.attended_rate().unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_counts_include_zero_categories() {
        let stats = AttendanceStats::from_records(&records(1, &[Presence::Late]));
        let pairs: Vec<_> = stats.counts.iter().collect();

        assert_eq!(
            pairs,
            vec![
                (Presence::Present, 0),
                (Presence::Absent, 0),
                (Presence::Late, 1),
                (Presence::Justified, 0),
            ]
        );
    }

    #[test]
    fn test_rates_sum_to_hundred_at_display_precision() {
        // Thirds do not round cleanly.
        let stats = AttendanceStats::from_records(&records(
            1,
            &[Presence::Present, Presence::Absent, Presence::Justified],
        ));
        let rates = stats.rates().unwrap();

        for decimals in [0, 2] {
            let rounded = rates.rounded(decimals);
            assert!((rounded.sum() - 100.0).abs() <= tolerance(decimals));
        }
        assert_eq!(rates.rounded(2).present, 33.33);
        assert_eq!(rates.rounded(0).present, 33.0);
    }

    #[test]
    fn test_rounding_does_not_touch_unrounded_rates() {
        let stats = AttendanceStats::from_records(&records(
            1,
            &[Presence::Present, Presence::Present, Presence::Absent],
        ));
        let rates = stats.rates().unwrap();

        assert_eq!(rates.rounded(0).present, 67.0);
        assert_eq!(rates.rounded(2).present, 66.67);
        assert!((rates.present - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_by_student_groups_records() {
        let mut all = records(1, &[Presence::Present, Presence::Absent]);
        all.extend(records(2, &[Presence::Late]));

        let grouped = AttendanceStats::by_student(&all);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&1].total, 2);
        assert_eq!(grouped[&1].counts.absent, 1);
        assert_eq!(grouped[&2].counts.late, 1);
    }
}
