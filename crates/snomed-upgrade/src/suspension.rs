//! Scoped suspension of daily-build ingestion.

use snomed_types::CodeSystem;
use tracing::{error, info};

use crate::collaborators::{CodeSystemLookup, DailyBuildControl};
use crate::error::UpgradeResult;

/// Keeps daily build disabled on a code system while alive.
///
/// Acquiring persists `daily_build_available = false` and rolls back daily
/// build content that was not promoted. Dropping the guard restores and
/// persists the flag, whichever way the scope is left. Nothing happens
/// for a code system whose daily build was already off.
#[must_use = "daily build is restored as soon as the suspension is dropped"]
pub struct DailyBuildSuspension<'a> {
    code_systems: &'a dyn CodeSystemLookup,
    code_system: CodeSystem,
    suspended: bool,
}

impl<'a> DailyBuildSuspension<'a> {
    /// Suspends daily build on `code_system` if it is enabled.
    pub fn acquire(
        code_systems: &'a dyn CodeSystemLookup,
        daily_build: &dyn DailyBuildControl,
        code_system: &CodeSystem,
    ) -> UpgradeResult<Self> {
        let mut suspension = Self {
            code_systems,
            code_system: code_system.clone(),
            suspended: false,
        };
        if !code_system.daily_build_available {
            return Ok(suspension);
        }

        info!("Disabling daily build before upgrade.");
        suspension.code_system.daily_build_available = false;
        code_systems.persist(&suspension.code_system)?;
        suspension.suspended = true;

        info!("Rolling back any daily build content before upgrade.");
        daily_build.rollback_uncommitted_content(&suspension.code_system)?;
        Ok(suspension)
    }

    /// Returns true if this guard disabled daily build.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

impl Drop for DailyBuildSuspension<'_> {
    fn drop(&mut self) {
        if !self.suspended {
            return;
        }
        info!("Re-enabling daily build after upgrade.");
        self.code_system.daily_build_available = true;
        if let Err(e) = self.code_systems.persist(&self.code_system) {
            error!(
                "Failed to re-enable daily build on {}: {}",
                self.code_system.short_name, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollaboratorError, CollaboratorResult};
    use crate::memory::InMemoryTerminologyStore;

    struct FailingRollback;

    impl DailyBuildControl for FailingRollback {
        fn rollback_uncommitted_content(&self, _code_system: &CodeSystem) -> CollaboratorResult<()> {
            Err(CollaboratorError::new("Daily build rollback failed."))
        }
    }

    fn store_with(daily_build: bool) -> (InMemoryTerminologyStore, CodeSystem) {
        let store = InMemoryTerminologyStore::new();
        store.create_branch("MAIN").unwrap();
        store.create_branch("MAIN/SNOMEDCT-A").unwrap();
        let mut extension = CodeSystem::new("SNOMEDCT-A", "MAIN/SNOMEDCT-A");
        extension.daily_build_available = daily_build;
        store.persist_code_system(extension.clone()).unwrap();
        (store, extension)
    }

    fn flag(store: &InMemoryTerminologyStore) -> bool {
        store.code_system("SNOMEDCT-A").unwrap().daily_build_available
    }

    #[test]
    fn test_suspended_while_held() {
        let (store, extension) = store_with(true);

        let suspension = DailyBuildSuspension::acquire(&store, &store, &extension).unwrap();
        assert!(suspension.is_suspended());
        assert!(!flag(&store));
        assert_eq!(store.rollback_count("MAIN/SNOMEDCT-A"), 1);

        drop(suspension);
        assert!(flag(&store));
    }

    #[test]
    fn test_noop_when_daily_build_disabled() {
        let (store, extension) = store_with(false);

        let suspension = DailyBuildSuspension::acquire(&store, &store, &extension).unwrap();
        assert!(!suspension.is_suspended());
        drop(suspension);

        assert!(!flag(&store));
        assert_eq!(store.rollback_count("MAIN/SNOMEDCT-A"), 0);
        assert_eq!(store.code_system_persist_log().len(), 1);
    }

    #[test]
    fn test_failed_rollback_restores_flag() {
        let (store, extension) = store_with(true);

        let result = DailyBuildSuspension::acquire(&store, &FailingRollback, &extension);

        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("Daily build rollback failed.".to_string())
        );
        assert!(flag(&store));
    }
}
