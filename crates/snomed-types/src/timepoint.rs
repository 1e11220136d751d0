//! Point-in-time locators for branch snapshots.
//!
//! A [`BranchTimepoint`] addresses a branch either at its current head, at the
//! instant it was created, or at an exact instant written as
//! `yyyy-MM-ddTHH:mm:ss.SSSZ`.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// Human readable form of the accepted timestamp format.
pub const DATE_FORMAT_STRING: &str = "yyyy-MM-ddTHH:mm:ss.SSSZ";

/// Sentinel selecting the instant the branch was created.
pub const BRANCH_CREATION_TIMEPOINT: &str = "-";

const CHRONO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// The timepoint text was neither a timestamp nor the creation sentinel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Malformed branch timepoint '{value}', please use format {} or {}",
    DATE_FORMAT_STRING,
    BRANCH_CREATION_TIMEPOINT
)]
pub struct MalformedTimepoint {
    /// The rejected text.
    pub value: String,
}

/// Which snapshot of a branch is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timepoint {
    /// The latest state of the branch.
    Head,
    /// The instant the branch was created.
    BranchCreation,
    /// An exact instant.
    At(DateTime<Utc>),
}

impl Timepoint {
    /// Parses the textual form of a timepoint.
    ///
    /// Empty text selects the head. The text must otherwise be exactly the
    /// creation sentinel or a timestamp of exactly
    /// [`DATE_FORMAT_STRING`]'s width.
    pub fn parse(text: &str) -> Result<Self, MalformedTimepoint> {
        if text.is_empty() {
            return Ok(Self::Head);
        }
        if text == BRANCH_CREATION_TIMEPOINT {
            return Ok(Self::BranchCreation);
        }
        let malformed = || MalformedTimepoint {
            value: text.to_string(),
        };
        if text.len() != DATE_FORMAT_STRING.len() {
            return Err(malformed());
        }
        NaiveDateTime::parse_from_str(text, CHRONO_FORMAT)
            .map(|naive| Self::At(naive.and_utc()))
            .map_err(|_| malformed())
    }

    /// Formats an instant in the fixed timepoint format.
    pub fn format_instant(instant: &DateTime<Utc>) -> String {
        instant.format(CHRONO_FORMAT).to_string()
    }

    /// Returns the pinned instant, if any.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(instant) => Some(*instant),
            _ => None,
        }
    }
}

/// Renders the textual form accepted by [`Timepoint::parse`]; the head is
/// rendered as empty text.
impl fmt::Display for Timepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => Ok(()),
            Self::BranchCreation => f.write_str(BRANCH_CREATION_TIMEPOINT),
            Self::At(instant) => f.write_str(&Self::format_instant(instant)),
        }
    }
}

/// A branch path together with the snapshot of it being addressed.
///
/// # Examples
///
/// ```
/// use snomed_types::{BranchTimepoint, Timepoint};
///
/// let head = BranchTimepoint::parse("MAIN", None).unwrap();
/// assert_eq!(head.timepoint, Timepoint::Head);
///
/// let created = BranchTimepoint::parse("MAIN", Some("-")).unwrap();
/// assert!(created.is_branch_creation_timepoint());
///
/// let pinned = BranchTimepoint::parse("MAIN", Some("2025-01-01T10:30:00.250Z")).unwrap();
/// assert_eq!(pinned.timepoint.to_string(), "2025-01-01T10:30:00.250Z");
///
/// assert!(BranchTimepoint::parse("MAIN", Some("2025-01-01")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchTimepoint {
    /// Branch path.
    pub branch_path: String,
    /// Snapshot of the branch.
    pub timepoint: Timepoint,
}

impl BranchTimepoint {
    /// Addresses the head of `branch_path`.
    pub fn head(branch_path: impl Into<String>) -> Self {
        Self {
            branch_path: branch_path.into(),
            timepoint: Timepoint::Head,
        }
    }

    /// Addresses `branch_path` at an exact instant.
    pub fn at(branch_path: impl Into<String>, instant: DateTime<Utc>) -> Self {
        Self {
            branch_path: branch_path.into(),
            timepoint: Timepoint::At(instant),
        }
    }

    /// Parses an optional timepoint text for `branch_path`.
    pub fn parse(
        branch_path: impl Into<String>,
        timepoint: Option<&str>,
    ) -> Result<Self, MalformedTimepoint> {
        Ok(Self {
            branch_path: branch_path.into(),
            timepoint: Timepoint::parse(timepoint.unwrap_or_default())?,
        })
    }

    /// Returns true if this addresses the branch creation instant.
    pub fn is_branch_creation_timepoint(&self) -> bool {
        self.timepoint == Timepoint::BranchCreation
    }

    /// Returns the pinned instant, if any.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.timepoint.instant()
    }
}

impl fmt::Display for BranchTimepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timepoint {
            Timepoint::Head => f.write_str(&self.branch_path),
            _ => write!(f, "{}@{}", self.branch_path, self.timepoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_absent_and_empty_select_head() {
        assert_eq!(
            BranchTimepoint::parse("MAIN", None).unwrap().timepoint,
            Timepoint::Head
        );
        assert_eq!(
            BranchTimepoint::parse("MAIN", Some("")).unwrap().timepoint,
            Timepoint::Head
        );
    }

    #[test]
    fn test_sentinel_selects_branch_creation() {
        let timepoint = BranchTimepoint::parse("MAIN/SNOMEDCT-A", Some("-")).unwrap();
        assert!(timepoint.is_branch_creation_timepoint());
        assert_eq!(timepoint.instant(), None);
    }

    #[test]
    fn test_exact_format_parses_to_literal_instant() {
        let timepoint = Timepoint::parse("2025-01-01T10:30:00.250Z").unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 10, 30, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(timepoint, Timepoint::At(expected));
        assert_eq!(timepoint.to_string(), "2025-01-01T10:30:00.250Z");
    }

    #[test]
    fn test_round_trip_through_text() {
        let instant = Utc.with_ymd_and_hms(2024, 7, 1, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(7);
        let pinned = BranchTimepoint::at("MAIN", instant);
        let text = pinned.timepoint.to_string();
        assert_eq!(text, "2024-07-01T23:59:59.007Z");
        assert_eq!(BranchTimepoint::parse("MAIN", Some(&text)).unwrap(), pinned);
    }

    #[test]
    fn test_wrong_length_is_malformed() {
        let err = Timepoint::parse("2025-01-01T10:30:00Z").unwrap_err();
        assert_eq!(err.value, "2025-01-01T10:30:00Z");
        let message = err.to_string();
        assert!(message.contains(DATE_FORMAT_STRING));
        assert!(message.contains(" or -"));
    }

    #[test]
    fn test_right_length_but_unparsable_is_malformed() {
        assert!(Timepoint::parse("2025-13-01T10:30:00.250Z").is_err());
        assert!(Timepoint::parse("2025-01-01X10:30:00.250Z").is_err());
        assert!(Timepoint::parse("2025-01-01T10:30:00.250+").is_err());
        assert!(Timepoint::parse("--").is_err());
    }

    #[test]
    fn test_display_includes_branch() {
        assert_eq!(BranchTimepoint::head("MAIN").to_string(), "MAIN");
        assert_eq!(
            BranchTimepoint::parse("MAIN", Some("-")).unwrap().to_string(),
            "MAIN@-"
        );
    }
}
