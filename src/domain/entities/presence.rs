//! Presence categories for a student on a given day.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Attendance category recorded for a student on one calendar date.
///
/// Closed set: any other value is rejected while parsing, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Present,
    Absent,
    Late,
    Justified,
}

/// Raised when a string is not one of the four presence categories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown presence value '{0}' (expected one of: present, absent, late, justified)")]
pub struct PresenceParseError(pub String);

impl From<PresenceParseError> for AppError {
    fn from(e: PresenceParseError) -> Self {
        AppError::bad_request(
            e.to_string(),
            json!({ "field": "presence", "value": e.0 }),
        )
    }
}

impl Presence {
    /// Every category, in display order.
    pub const ALL: [Presence; 4] = [
        Presence::Present,
        Presence::Absent,
        Presence::Late,
        Presence::Justified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Presence::Present => "present",
            Presence::Absent => "absent",
            Presence::Late => "late",
            Presence::Justified => "justified",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Presence {
    type Err = PresenceParseError;

    /// Parses the wire form. Surrounding whitespace and ASCII case are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Presence::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| PresenceParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_values() {
        assert_eq!("present".parse::<Presence>().unwrap(), Presence::Present);
        assert_eq!("absent".parse::<Presence>().unwrap(), Presence::Absent);
        assert_eq!("late".parse::<Presence>().unwrap(), Presence::Late);
        assert_eq!("justified".parse::<Presence>().unwrap(), Presence::Justified);
    }

    #[test]
    fn test_parse_ignores_case_and_whitespace() {
        assert_eq!(" Late ".parse::<Presence>().unwrap(), Presence::Late);
        assert_eq!("PRESENT".parse::<Presence>().unwrap(), Presence::Present);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "unknown".parse::<Presence>().unwrap_err();
        assert_eq!(err, PresenceParseError("unknown".to_string()));
        assert!("".parse::<Presence>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase() {
        assert_eq!(
            serde_json::to_string(&Presence::Justified).unwrap(),
            "\"justified\""
        );
        let parsed: Presence = serde_json::from_str("\"absent\"").unwrap();
        assert_eq!(parsed, Presence::Absent);
        assert!(serde_json::from_str::<Presence>("\"sick\"").is_err());
    }

    #[test]
    fn test_parse_error_is_validation_on_presence_field() {
        let err: AppError = "sick".parse::<Presence>().unwrap_err().into();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(err.details()["field"], "presence");
        assert_eq!(err.details()["value"], "sick");
    }
}
