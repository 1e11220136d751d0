//! Code system upgrade jobs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque identifier of an upgrade job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a new random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Status of an upgrade job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum UpgradeStatus {
    /// The upgrade has been accepted and not yet finished.
    Running,
    /// The upgrade finished without error.
    Completed,
    /// The upgrade stopped with an error.
    Failed,
}

impl UpgradeStatus {
    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One attempt at upgrading a code system to a new parent release.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpgradeJob {
    /// Short name of the code system being upgraded.
    pub code_system_short_name: String,
    /// Effective date of the parent version being adopted.
    pub new_dependant_version: u32,
    /// Current status.
    pub status: UpgradeStatus,
    /// Failure message when `status` is `Failed`.
    pub error_message: Option<String>,
    /// When the job was created.
    pub created: DateTime<Utc>,
    /// When the job reached a terminal status.
    pub finished: Option<DateTime<Utc>>,
}

impl UpgradeJob {
    /// Creates a running job.
    pub fn new(code_system_short_name: impl Into<String>, new_dependant_version: u32) -> Self {
        Self {
            code_system_short_name: code_system_short_name.into(),
            new_dependant_version,
            status: UpgradeStatus::Running,
            error_message: None,
            created: Utc::now(),
            finished: None,
        }
    }

    /// Returns true if this job is running towards the given target.
    ///
    /// Short names compare case-insensitively.
    pub fn is_running_for(&self, short_name: &str, new_dependant_version: u32) -> bool {
        self.status == UpgradeStatus::Running
            && self.new_dependant_version == new_dependant_version
            && self.code_system_short_name.eq_ignore_ascii_case(short_name)
    }
}
