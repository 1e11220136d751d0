//! Contracts the upgrade workflow requires from the rest of the server.
//!
//! Every method that can fail returns a [`CollaboratorError`]; the orchestrator
//! records its message on the job and re-raises it.

use std::sync::Arc;

use snomed_types::{Branch, BranchTimepoint, CodeSystem, CodeSystemVersion, IntegrityIssueReport, Metadata};

use crate::auth::PermissionCheck;
use crate::error::CollaboratorResult;

/// Code system persistence.
pub trait CodeSystemLookup: Send + Sync {
    /// Finds the code system whose working branch is `branch_path`.
    fn find_by_branch_path(&self, branch_path: &str) -> Option<CodeSystem>;

    /// Finds a published version of a code system.
    fn find_version(&self, short_name: &str, effective_date: u32) -> Option<CodeSystemVersion>;

    /// Saves a code system, replacing the stored one with the same short name.
    fn persist(&self, code_system: &CodeSystem) -> CollaboratorResult<()>;
}

/// Branch reads and metadata writes.
pub trait BranchLookup: Send + Sync {
    /// Returns the latest state of a branch.
    fn find_latest(&self, branch_path: &str) -> CollaboratorResult<Branch>;

    /// Replaces the metadata of a branch.
    fn update_metadata(&self, branch_path: &str, metadata: Metadata) -> CollaboratorResult<()>;
}

/// Branch rebasing.
pub trait BranchRebase: Send + Sync {
    /// Rebases `child_path` onto the snapshot of its parent addressed by
    /// `parent`, then deletes child content that the parent snapshot already
    /// holds.
    ///
    /// A child component is redundant only when the parent snapshot holds a
    /// component with the same id and an identical state. Matching ids alone
    /// are not enough: those are genuine extension edits and must survive.
    fn rebase_to_timepoint_removing_duplicates(
        &self,
        parent: &BranchTimepoint,
        child_path: &str,
        audit_message: &str,
    ) -> CollaboratorResult<()>;
}

/// Control over automated daily-build ingestion.
pub trait DailyBuildControl: Send + Sync {
    /// Removes daily-build content on the code system branch that has not
    /// been promoted.
    fn rollback_uncommitted_content(&self, code_system: &CodeSystem) -> CollaboratorResult<()>;
}

/// Content normalization passes run after a rebase.
pub trait ContentAutomations: Send + Sync {
    /// Adds inactivation indicators to descriptions of concepts that became
    /// inactive.
    fn propagate_description_inactivation(&self, code_system: &CodeSystem) -> CollaboratorResult<()>;

    /// Inactivates language reference set members of inactive descriptions.
    fn propagate_language_refset_inactivation(&self, code_system: &CodeSystem) -> CollaboratorResult<()>;

    /// Inactivates additional axioms of inactive concepts.
    fn propagate_additional_axiom_inactivation(&self, code_system: &CodeSystem) -> CollaboratorResult<()>;
}

/// Referential integrity checking.
pub trait IntegrityCheck: Send + Sync {
    /// Reports components changed on `branch` whose references do not resolve.
    fn find_unresolved_integrity_issues(&self, branch: &Branch) -> CollaboratorResult<IntegrityIssueReport>;
}

/// Everything the orchestrator calls out to.
#[derive(Clone)]
pub struct Collaborators {
    /// Code system persistence.
    pub code_systems: Arc<dyn CodeSystemLookup>,
    /// Branch reads and metadata writes.
    pub branches: Arc<dyn BranchLookup>,
    /// Branch rebasing.
    pub rebase: Arc<dyn BranchRebase>,
    /// Daily-build control.
    pub daily_build: Arc<dyn DailyBuildControl>,
    /// Content automations.
    pub automations: Arc<dyn ContentAutomations>,
    /// Integrity checking.
    pub integrity: Arc<dyn IntegrityCheck>,
    /// Authorization.
    pub permissions: Arc<dyn PermissionCheck>,
}

impl Collaborators {
    /// Uses one store for every concern except authorization.
    pub fn from_store<S>(store: Arc<S>, permissions: Arc<dyn PermissionCheck>) -> Self
    where
        S: CodeSystemLookup
            + BranchLookup
            + BranchRebase
            + DailyBuildControl
            + ContentAutomations
            + IntegrityCheck
            + 'static,
    {
        Self {
            code_systems: store.clone(),
            branches: store.clone(),
            rebase: store.clone(),
            daily_build: store.clone(),
            automations: store.clone(),
            integrity: store,
            permissions,
        }
    }
}
