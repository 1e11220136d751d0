//! Error types for code system upgrades.

use thiserror::Error;

use crate::auth::Role;

/// A declared failure reported by a collaborator.
///
/// Displays as the bare message so it can be recorded on a job verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CollaboratorError {
    /// What went wrong.
    pub message: String,
}

impl CollaboratorError {
    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for collaborator calls.
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Errors raised by the upgrade workflow.
///
/// The `Display` text of every variant is what gets stored on a failed job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpgradeError {
    /// The caller lacks the role required on the branch.
    #[error("User '{username}' does not have the {role} role on branch '{branch_path}'.")]
    Forbidden {
        /// The caller.
        username: String,
        /// The role that was required.
        role: Role,
        /// The branch the role was required on.
        branch_path: String,
    },

    /// The request cannot be satisfied, e.g. an unknown target version.
    #[error("{0}")]
    InvalidUpgrade(String),

    /// The surrounding code systems are not arranged as an upgrade needs.
    #[error("{0}")]
    InvalidState(String),

    /// A job or other resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Another upgrade currently holds the branch.
    #[error("An upgrade is already in progress on branch '{branch_path}'.")]
    UpgradeInProgress {
        /// The contended branch.
        branch_path: String,
    },

    /// A collaborator reported a failure.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Result type for upgrade operations.
pub type UpgradeResult<T> = Result<T, UpgradeError>;
