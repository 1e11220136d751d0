//! Error types for the upgrade runner.

use std::path::PathBuf;

use snomed_upgrade::{CollaboratorError, UpgradeError};
use thiserror::Error;

/// Errors that stop the runner before an upgrade outcome is known.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// An environment variable held an unusable value.
    #[error("Invalid value '{value}' for {name}")]
    InvalidSetting {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The seed file could not be read.
    #[error("Failed to read seed file {path}: {source}")]
    SeedIo {
        /// Seed path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The seed file is not valid seed JSON.
    #[error("Failed to parse seed file: {0}")]
    SeedParse(#[from] serde_json::Error),

    /// A seed step was rejected by the store.
    #[error("Seed step {step} failed: {source}")]
    SeedStep {
        /// Zero based index of the failing step.
        step: usize,
        /// Store error.
        #[source]
        source: CollaboratorError,
    },

    /// The code system to upgrade is not in the seeded store.
    #[error("Code System '{0}' does not exist.")]
    UnknownCodeSystem(String),

    /// The upgrade could not be started.
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),

    /// Another upgrade of the same code system and version is running.
    #[error("An upgrade of {short_name} to {version} is already running as job {job}.")]
    AlreadyRunning {
        /// Code system short name.
        short_name: String,
        /// Requested parent version.
        version: u32,
        /// The running job.
        job: String,
    },

    /// The job disappeared from the registry while being polled.
    #[error("Upgrade job {0} is no longer tracked.")]
    JobLost(String),
}

/// Result alias for the runner.
pub type ServiceResult<T> = Result<T, ServiceError>;
