//! Seed, start and watch one upgrade.

use std::sync::Arc;

use snomed_types::{Branch, UpgradeJob};
use snomed_upgrade::memory::InMemoryTerminologyStore;
use snomed_upgrade::{CodeSystemUpgrader, Collaborators, RoleBasedPermissions, UpgradeJobRegistry};
use tracing::info;

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::seed::Seed;

/// Terminal job plus the code system branch as the upgrade left it.
#[derive(Debug, Clone)]
pub struct UpgradeReport {
    /// The job in its terminal state.
    pub job: UpgradeJob,
    /// Latest state of the upgraded branch.
    pub branch: Branch,
}

/// Applies `seed` to a fresh store and upgrades the configured code system.
///
/// Returns once the job is `Completed` or `Failed`; a failed upgrade is a
/// report, not an error. Must be called inside a multi-threaded Tokio runtime.
pub async fn run(config: &ServiceConfig, seed: &Seed) -> ServiceResult<UpgradeReport> {
    let store = Arc::new(InMemoryTerminologyStore::new());
    seed.apply(&store)?;

    let code_system = store
        .code_system(&config.code_system)
        .ok_or_else(|| ServiceError::UnknownCodeSystem(config.code_system.clone()))?;
    let branch_path = code_system.branch_path.clone();

    let jobs = Arc::new(UpgradeJobRegistry::new());
    let upgrader = Arc::new(CodeSystemUpgrader::with_registry(
        Collaborators::from_store(Arc::clone(&store), Arc::new(RoleBasedPermissions)),
        Arc::clone(&jobs),
        seed.upgrade.clone(),
    ));

    let job_id = jobs
        .create_unless_running(&config.code_system, config.version)
        .map_err(|running| ServiceError::AlreadyRunning {
            short_name: config.code_system.clone(),
            version: config.version,
            job: running.to_string(),
        })?;
    info!(
        "Upgrade job {} started for {} to {} as {}",
        job_id, code_system, config.version, seed.caller.username
    );

    let _worker = upgrader.upgrade_async(
        &seed.caller,
        job_id,
        code_system,
        config.version,
        config.content_automations,
    )?;

    let job = loop {
        let job = jobs
            .get(job_id)
            .ok_or_else(|| ServiceError::JobLost(job_id.to_string()))?;
        if job.status.is_terminal() {
            break job;
        }
        tokio::time::sleep(config.poll_interval).await;
    };

    let branch = store
        .find_latest_branch(&branch_path)
        .map_err(|source| ServiceError::Upgrade(source.into()))?;
    Ok(UpgradeReport { job, branch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use snomed_types::well_known::{DEPENDENCY_PACKAGE, DEPENDENCY_RELEASE, PREVIOUS_DEPENDENCY_PACKAGE};
    use snomed_types::UpgradeStatus;
    use snomed_upgrade::{Caller, UpgradeError};

    fn bundled() -> (ServiceConfig, Seed) {
        let seed_path =
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seed/extension-upgrade.json");
        let config = ServiceConfig {
            seed_path,
            poll_interval: Duration::from_millis(5),
            ..ServiceConfig::default()
        };
        let seed = Seed::load(&config.seed_path).unwrap();
        (config, seed)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bundled_seed_upgrades() {
        let (config, seed) = bundled();

        let report = run(&config, &seed).await.unwrap();

        assert_eq!(report.job.status, UpgradeStatus::Completed);
        let metadata = &report.branch.metadata;
        assert_eq!(
            metadata.get_string(DEPENDENCY_PACKAGE),
            Some("SnomedCT_Release_INT_20250101")
        );
        assert_eq!(
            metadata.get_string(PREVIOUS_DEPENDENCY_PACKAGE),
            Some("SnomedCT_Release_INT_20240701")
        );
        assert_eq!(metadata.get_string(DEPENDENCY_RELEASE), Some("20250101"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_version_reported_as_failed_job() {
        let (mut config, seed) = bundled();
        config.version = 20260101;

        let report = run(&config, &seed).await.unwrap();

        assert_eq!(report.job.status, UpgradeStatus::Failed);
        assert_eq!(
            report.job.error_message.as_deref(),
            Some("Parent Code System SNOMEDCT has no version with effectiveTime '20260101'.")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_caller_without_admin_rejected() {
        let (config, mut seed) = bundled();
        seed.caller = Caller::new("author");

        let err = run(&config, &seed).await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Upgrade(UpgradeError::Forbidden { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_code_system() {
        let (mut config, seed) = bundled();
        config.code_system = "SNOMEDCT-Z".to_string();

        let err = run(&config, &seed).await.unwrap_err();

        assert_eq!(err.to_string(), "Code System 'SNOMEDCT-Z' does not exist.");
    }
}
