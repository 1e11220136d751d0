//! Code system upgrade workflow.
//!
//! An upgrade moves an extension branch onto a newer published version of its
//! parent code system:
//!
//! 1. check the caller administers the extension branch
//! 2. validate the parent code system and target version exist
//! 3. suspend daily build (restored on every exit)
//! 4. rebase onto the parent version's base timepoint, dropping duplicates
//! 5. optionally run the content automations
//! 6. run the integrity check
//! 7. record the adopted release in the branch metadata
//!
//! Steps after the rebase are not compensated: a failure there leaves the
//! branch rebased, and the job failed.

use std::sync::Arc;

use snomed_types::{parent_path, BranchTimepoint, CodeSystem, CodeSystemVersion, JobId};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::auth::{Caller, Role};
use crate::claims::BranchClaims;
use crate::collaborators::Collaborators;
use crate::config::UpgradeConfig;
use crate::error::{UpgradeError, UpgradeResult};
use crate::lineage::record_adopted_release;
use crate::registry::UpgradeJobRegistry;
use crate::suspension::DailyBuildSuspension;

const UNEXPECTED_TERMINATION: &str = "Upgrade terminated unexpectedly.";
const NO_RUNTIME: &str = "Asynchronous upgrade requires a Tokio runtime.";

/// Drives code system upgrades and records their outcome on jobs.
pub struct CodeSystemUpgrader {
    collaborators: Collaborators,
    jobs: Arc<UpgradeJobRegistry>,
    claims: Arc<BranchClaims>,
    config: UpgradeConfig,
}

impl CodeSystemUpgrader {
    /// Creates an upgrader using the process-wide job registry and branch
    /// claims, so every upgrader built this way sees the others' jobs and
    /// branches.
    pub fn new(collaborators: Collaborators, config: UpgradeConfig) -> Self {
        Self::with_registry(collaborators, UpgradeJobRegistry::process(), config)
            .with_claims(BranchClaims::process())
    }

    /// Creates an upgrader recording jobs in `jobs`, with its own branch
    /// claims.
    pub fn with_registry(
        collaborators: Collaborators,
        jobs: Arc<UpgradeJobRegistry>,
        config: UpgradeConfig,
    ) -> Self {
        Self {
            collaborators,
            jobs,
            claims: Arc::new(BranchClaims::new()),
            config,
        }
    }

    /// Shares `claims` with other upgraders working on the same branches.
    pub fn with_claims(mut self, claims: Arc<BranchClaims>) -> Self {
        self.claims = claims;
        self
    }

    /// The job registry this upgrader reports to.
    pub fn jobs(&self) -> &Arc<UpgradeJobRegistry> {
        &self.jobs
    }

    /// Registers a running job for the target and returns its id.
    pub fn create_job(&self, short_name: &str, new_dependant_version: u32) -> JobId {
        self.jobs.create(short_name, new_dependant_version)
    }

    /// Returns the id of a job running towards the target, if any.
    pub fn find_running_job(&self, short_name: &str, new_dependant_version: u32) -> Option<JobId> {
        self.jobs.find_running(short_name, new_dependant_version)
    }

    /// Returns a snapshot of a job.
    pub fn get_job(&self, id: JobId) -> Option<snomed_types::UpgradeJob> {
        self.jobs.get(id)
    }

    /// Upgrades `code_system` to the parent version effective on
    /// `new_dependant_version`, on the calling thread.
    ///
    /// When `job_id` is given the job ends `Completed` or `Failed`; a failure
    /// stores the error's message on the job and is also returned.
    pub fn upgrade(
        &self,
        caller: &Caller,
        job_id: Option<JobId>,
        code_system: &CodeSystem,
        new_dependant_version: u32,
        content_automations: bool,
    ) -> UpgradeResult<()> {
        self.authorize(caller, job_id, code_system)?;
        self.run_upgrade(job_id, code_system, new_dependant_version, content_automations)
    }

    /// Upgrades on a blocking worker of the current Tokio runtime.
    ///
    /// Authorization is checked before the worker starts; everything else is
    /// reported only through the job, so callers poll it by id. Outside a
    /// Tokio runtime the job is failed and an `InvalidState` error returned.
    pub fn upgrade_async(
        self: &Arc<Self>,
        caller: &Caller,
        job_id: JobId,
        code_system: CodeSystem,
        new_dependant_version: u32,
        content_automations: bool,
    ) -> UpgradeResult<JoinHandle<()>> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                let err = UpgradeError::InvalidState(NO_RUNTIME.to_string());
                self.jobs.fail(job_id, err.to_string());
                return Err(err);
            }
        };
        self.authorize(caller, Some(job_id), &code_system)?;
        let upgrader = Arc::clone(self);
        Ok(runtime.spawn_blocking(move || {
            if let Err(e) = upgrader.run_upgrade(
                Some(job_id),
                &code_system,
                new_dependant_version,
                content_automations,
            ) {
                error!("Upgrade job {} for {} failed: {}", job_id, code_system, e);
            }
        }))
    }

    fn authorize(&self, caller: &Caller, job_id: Option<JobId>, code_system: &CodeSystem) -> UpgradeResult<()> {
        let branch_path = &code_system.branch_path;
        if self
            .collaborators
            .permissions
            .has_permission(caller, Role::Admin, branch_path)
        {
            return Ok(());
        }
        let err = UpgradeError::Forbidden {
            username: caller.username.clone(),
            role: Role::Admin,
            branch_path: branch_path.clone(),
        };
        if let Some(id) = job_id {
            self.jobs.fail(id, err.to_string());
        }
        Err(err)
    }

    fn run_upgrade(
        &self,
        job_id: Option<JobId>,
        code_system: &CodeSystem,
        new_dependant_version: u32,
        content_automations: bool,
    ) -> UpgradeResult<()> {
        let outcome = JobOutcome::new(&self.jobs, job_id);
        match self.upgrade_steps(code_system, new_dependant_version, content_automations) {
            Ok(()) => {
                outcome.complete();
                Ok(())
            }
            Err(e) => {
                outcome.fail(&e);
                Err(e)
            }
        }
    }

    fn upgrade_steps(
        &self,
        code_system: &CodeSystem,
        new_dependant_version: u32,
        content_automations: bool,
    ) -> UpgradeResult<()> {
        let (parent_code_system, new_parent_version) =
            self.validate(code_system, new_dependant_version)?;
        let branch_path = code_system.branch_path.as_str();
        let parent_path = parent_code_system.branch_path.as_str();

        let _claim = if self.config.serialize_per_branch {
            Some(self.claims.claim(branch_path)?)
        } else {
            None
        };
        let _suspension = DailyBuildSuspension::acquire(
            self.collaborators.code_systems.as_ref(),
            self.collaborators.daily_build.as_ref(),
            code_system,
        )?;

        let new_parent_version_branch = self
            .collaborators
            .branches
            .find_latest(&new_parent_version.branch_path)?;
        let new_parent_base = BranchTimepoint::at(parent_path, new_parent_version_branch.base);

        info!(
            "Running upgrade of {} to {} version {}.",
            code_system, parent_code_system, new_dependant_version
        );
        self.collaborators.rebase.rebase_to_timepoint_removing_duplicates(
            &new_parent_base,
            branch_path,
            &self.config.audit_message(parent_path, &new_parent_version.version),
        )?;
        info!(
            "Completed upgrade of {} to {} version {}.",
            code_system, parent_code_system, new_dependant_version
        );

        if content_automations {
            info!("Running upgrade content automations.");
            let automations = &self.collaborators.automations;
            automations.propagate_description_inactivation(code_system)?;
            automations.propagate_language_refset_inactivation(code_system)?;
            automations.propagate_additional_axiom_inactivation(code_system)?;
            info!("Completed upgrade content automations.");
        }

        info!("Running integrity check on {}", branch_path);
        let extension_branch = self.collaborators.branches.find_latest(branch_path)?;
        let report = self
            .collaborators
            .integrity
            .find_unresolved_integrity_issues(&extension_branch)?;
        info!("Completed integrity check on {}", branch_path);

        let mut metadata = extension_branch.metadata;
        record_adopted_release(&mut metadata, branch_path, &new_parent_version, &report);
        self.collaborators
            .branches
            .update_metadata(branch_path, metadata)?;

        info!("Upgrade completed on {}", branch_path);
        Ok(())
    }

    fn validate(
        &self,
        code_system: &CodeSystem,
        new_dependant_version: u32,
    ) -> UpgradeResult<(CodeSystem, CodeSystemVersion)> {
        let parent_path = parent_path(&code_system.branch_path).ok_or_else(|| {
            UpgradeError::InvalidUpgrade("The root Code System can not be upgraded.".to_string())
        })?;

        let parent_code_system = self
            .collaborators
            .code_systems
            .find_by_branch_path(parent_path)
            .ok_or_else(|| {
                UpgradeError::InvalidState(format!(
                    "The Code System to be upgraded must be on a branch which is the direct child of another Code System. \
                     There is no Code System on parent branch '{}'.",
                    parent_path
                ))
            })?;

        let new_parent_version = self
            .collaborators
            .code_systems
            .find_version(&parent_code_system.short_name, new_dependant_version)
            .ok_or_else(|| {
                UpgradeError::InvalidUpgrade(format!(
                    "Parent Code System {} has no version with effectiveTime '{}'.",
                    parent_code_system.short_name, new_dependant_version
                ))
            })?;

        Ok((parent_code_system, new_parent_version))
    }
}

/// Settles a job exactly once.
///
/// If neither `complete` nor `fail` is called, for instance because a
/// collaborator panicked, the job is failed on drop.
struct JobOutcome<'a> {
    jobs: &'a UpgradeJobRegistry,
    job_id: Option<JobId>,
    settled: bool,
}

impl<'a> JobOutcome<'a> {
    fn new(jobs: &'a UpgradeJobRegistry, job_id: Option<JobId>) -> Self {
        Self {
            jobs,
            job_id,
            settled: false,
        }
    }

    fn complete(mut self) {
        self.settled = true;
        if let Some(id) = self.job_id {
            self.jobs.complete(id);
        }
    }

    fn fail(mut self, err: &UpgradeError) {
        self.settled = true;
        if let Some(id) = self.job_id {
            self.jobs.fail(id, err.to_string());
        }
    }
}

impl Drop for JobOutcome<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(id) = self.job_id {
            error!("Upgrade job {} terminated unexpectedly", id);
            self.jobs.fail(id, UNEXPECTED_TERMINATION);
        }
    }
}
