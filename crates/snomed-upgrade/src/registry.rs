//! In-memory registry of upgrade jobs.
//!
//! Jobs live for the lifetime of the process; nothing is evicted unless a
//! caller asks for it with [`UpgradeJobRegistry::purge_finished_before`].
//!
//! [`create`](UpgradeJobRegistry::create) and
//! [`find_running`](UpgradeJobRegistry::find_running) take the lock
//! separately, so two callers can both see no running job and both create
//! one. Use [`create_unless_running`](UpgradeJobRegistry::create_unless_running)
//! to check and create atomically.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use snomed_types::{JobId, UpgradeJob, UpgradeStatus};
use tracing::debug;

use crate::error::{UpgradeError, UpgradeResult};

static PROCESS_REGISTRY: OnceLock<Arc<UpgradeJobRegistry>> = OnceLock::new();

/// Concurrency-safe table of upgrade jobs keyed by id.
///
/// # Example
///
/// ```
/// use snomed_upgrade::UpgradeJobRegistry;
///
/// let registry = UpgradeJobRegistry::new();
/// let id = registry.create("SNOMEDCT-A", 20250101);
/// assert_eq!(registry.find_running("SNOMEDCT-A", 20250101), Some(id));
///
/// registry.complete(id);
/// assert_eq!(registry.find_running("SNOMEDCT-A", 20250101), None);
/// assert!(registry.get(id).is_some());
/// ```
#[derive(Debug, Default)]
pub struct UpgradeJobRegistry {
    jobs: RwLock<HashMap<JobId, UpgradeJob>>,
}

impl UpgradeJobRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry, creating it on first use.
    pub fn process() -> Arc<Self> {
        PROCESS_REGISTRY.get_or_init(|| Arc::new(Self::new())).clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, UpgradeJob>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, UpgradeJob>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new running job and returns its id.
    pub fn create(&self, short_name: &str, new_dependant_version: u32) -> JobId {
        let id = JobId::generate();
        self.write()
            .insert(id, UpgradeJob::new(short_name, new_dependant_version));
        debug!("Created upgrade job {} for {} to {}", id, short_name, new_dependant_version);
        id
    }

    /// Returns the id of a running job for the target, if there is one.
    pub fn find_running(&self, short_name: &str, new_dependant_version: u32) -> Option<JobId> {
        self.read()
            .iter()
            .find(|(_, job)| job.is_running_for(short_name, new_dependant_version))
            .map(|(id, _)| *id)
    }

    /// Registers a new running job unless one is already running for the
    /// target, checking and inserting under a single lock.
    ///
    /// Returns `Err` with the existing job id when one is running.
    pub fn create_unless_running(
        &self,
        short_name: &str,
        new_dependant_version: u32,
    ) -> Result<JobId, JobId> {
        let mut jobs = self.write();
        if let Some((existing, _)) = jobs
            .iter()
            .find(|(_, job)| job.is_running_for(short_name, new_dependant_version))
        {
            return Err(*existing);
        }
        let id = JobId::generate();
        jobs.insert(id, UpgradeJob::new(short_name, new_dependant_version));
        debug!("Created upgrade job {} for {} to {}", id, short_name, new_dependant_version);
        Ok(id)
    }

    /// Returns a snapshot of a job.
    pub fn get(&self, id: JobId) -> Option<UpgradeJob> {
        self.read().get(&id).cloned()
    }

    /// Returns a snapshot of a job or fails with `NotFound`.
    pub fn require_job(&self, id: JobId) -> UpgradeResult<UpgradeJob> {
        self.get(id)
            .ok_or_else(|| UpgradeError::NotFound("Upgrade job not found.".to_string()))
    }

    /// Marks a running job completed.
    pub fn complete(&self, id: JobId) {
        self.finish(id, UpgradeStatus::Completed, None);
    }

    /// Marks a running job failed with `message`.
    pub fn fail(&self, id: JobId, message: impl Into<String>) {
        self.finish(id, UpgradeStatus::Failed, Some(message.into()));
    }

    fn finish(&self, id: JobId, status: UpgradeStatus, error_message: Option<String>) {
        let mut jobs = self.write();
        match jobs.get_mut(&id) {
            Some(job) if !job.status.is_terminal() => {
                job.status = status;
                job.error_message = error_message;
                job.finished = Some(Utc::now());
            }
            Some(job) => debug!("Upgrade job {} already {:?}, ignoring {:?}", id, job.status, status),
            None => debug!("Upgrade job {} not registered, ignoring {:?}", id, status),
        }
    }

    /// Drops terminal jobs that finished before `cutoff`, returning how many
    /// were removed. Running jobs are never removed.
    pub fn purge_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|_, job| !matches!(job.finished, Some(finished) if finished < cutoff));
        before - jobs.len()
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no jobs are registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_create_registers_running_job() {
        let registry = UpgradeJobRegistry::new();
        let id = registry.create("SNOMEDCT-A", 20250101);

        let job = registry.get(id).unwrap();
        assert_eq!(job.status, UpgradeStatus::Running);
        assert_eq!(job.code_system_short_name, "SNOMEDCT-A");
        assert_eq!(job.new_dependant_version, 20250101);
        assert!(job.finished.is_none());
    }

    #[test]
    fn test_find_running_matches_both_fields() {
        let registry = UpgradeJobRegistry::new();
        let id = registry.create("SNOMEDCT-A", 20250101);
        registry.create("SNOMEDCT-B", 20240701);

        assert_eq!(registry.find_running("snomedct-a", 20250101), Some(id));
        assert_eq!(registry.find_running("SNOMEDCT-A", 20240701), None);
        assert_eq!(registry.find_running("SNOMEDCT-C", 20250101), None);
    }

    #[test]
    fn test_terminal_jobs_not_running_but_still_resolvable() {
        let registry = UpgradeJobRegistry::new();
        let completed = registry.create("SNOMEDCT-A", 20250101);
        registry.complete(completed);
        let failed = registry.create("SNOMEDCT-B", 20250101);
        registry.fail(failed, "boom");

        assert_eq!(registry.find_running("SNOMEDCT-A", 20250101), None);
        assert_eq!(registry.find_running("SNOMEDCT-B", 20250101), None);
        assert_eq!(registry.get(completed).unwrap().status, UpgradeStatus::Completed);

        let failed_job = registry.require_job(failed).unwrap();
        assert_eq!(failed_job.status, UpgradeStatus::Failed);
        assert_eq!(failed_job.error_message.as_deref(), Some("boom"));
        assert!(failed_job.finished.is_some());
    }

    #[test]
    fn test_terminal_status_is_final() {
        let registry = UpgradeJobRegistry::new();
        let id = registry.create("SNOMEDCT-A", 20250101);
        registry.fail(id, "first");
        registry.complete(id);
        registry.fail(id, "second");

        let job = registry.get(id).unwrap();
        assert_eq!(job.status, UpgradeStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("first"));
    }

    #[test]
    fn test_require_job_not_found() {
        let registry = UpgradeJobRegistry::new();
        let err = registry.require_job(JobId::generate()).unwrap_err();
        assert_eq!(err, UpgradeError::NotFound("Upgrade job not found.".to_string()));
    }

    #[test]
    fn test_create_unless_running_returns_existing() {
        let registry = UpgradeJobRegistry::new();
        let first = registry.create_unless_running("SNOMEDCT-A", 20250101).unwrap();
        assert_eq!(registry.create_unless_running("SNOMEDCT-A", 20250101), Err(first));

        registry.complete(first);
        let second = registry.create_unless_running("SNOMEDCT-A", 20250101).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_create_unless_running_is_atomic_across_threads() {
        let registry = Arc::new(UpgradeJobRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.create_unless_running("SNOMEDCT-A", 20250101).is_ok())
            })
            .collect();

        let created = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|created| *created)
            .count();
        assert_eq!(created, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_scans_and_creates() {
        let registry = Arc::new(UpgradeJobRegistry::new());
        let writers: Vec<_> = (0..4)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for version in 0..50 {
                        registry.create(&format!("CS-{i}"), version);
                    }
                })
            })
            .collect();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for version in 0..50 {
                        let _ = registry.find_running("CS-0", version);
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 200);
    }

    #[test]
    fn test_purge_only_removes_old_terminal_jobs() {
        let registry = UpgradeJobRegistry::new();
        let done = registry.create("SNOMEDCT-A", 20240701);
        registry.complete(done);
        let running = registry.create("SNOMEDCT-A", 20250101);

        let removed = registry.purge_finished_before(Utc::now() + chrono::Duration::seconds(1));
        assert_eq!(removed, 1);
        assert!(registry.get(done).is_none());
        assert!(registry.get(running).is_some());

        assert_eq!(registry.purge_finished_before(Utc::now() - chrono::Duration::days(1)), 0);
    }

    #[test]
    fn test_process_registry_is_shared() {
        let a = UpgradeJobRegistry::process();
        let b = UpgradeJobRegistry::process();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
