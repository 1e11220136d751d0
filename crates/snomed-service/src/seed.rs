//! JSON seed for the in-memory terminology store.
//!
//! A seed is an ordered list of steps replayed against an empty store, so
//! branch timing (what the parent had committed when a version was taken)
//! follows the order of the file.

use std::path::Path;

use serde::Deserialize;
use snomed_types::{CodeSystem, Component};
use snomed_upgrade::memory::InMemoryTerminologyStore;
use snomed_upgrade::{Caller, CollaboratorResult, Role, UpgradeConfig};
use tracing::{debug, info};

use crate::error::{ServiceError, ServiceResult};

/// Store content plus the identity and settings for the upgrade.
#[derive(Debug, Clone, Deserialize)]
pub struct Seed {
    /// Orchestrator settings.
    #[serde(default)]
    pub upgrade: UpgradeConfig,
    /// Caller the upgrade runs as. Defaults to a global administrator.
    #[serde(default = "default_caller")]
    pub caller: Caller,
    /// Steps applied in order.
    pub steps: Vec<SeedStep>,
}

fn default_caller() -> Caller {
    Caller::new("snomed-upgrade").with_global_role(Role::Admin)
}

/// One store operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SeedStep {
    /// Creates a branch below an existing parent.
    CreateBranch {
        /// Branch path.
        path: String,
    },
    /// Saves a code system.
    PersistCodeSystem {
        /// The code system.
        code_system: CodeSystem,
    },
    /// Commits content to a branch.
    Commit {
        /// Branch path.
        branch: String,
        /// Saved components.
        components: Vec<Component>,
    },
    /// Commits daily build content to a branch.
    CommitDailyBuild {
        /// Branch path.
        branch: String,
        /// Saved components.
        components: Vec<Component>,
    },
    /// Publishes a code system version.
    CreateVersion {
        /// Code system short name.
        short_name: String,
        /// Effective date, YYYYMMDD.
        effective_date: u32,
        /// Version label.
        version: String,
        /// Release package file name.
        #[serde(default)]
        release_package: Option<String>,
    },
    /// Sets a string metadata entry on a branch.
    SetMetadata {
        /// Branch path.
        branch: String,
        /// Metadata key.
        key: String,
        /// Metadata value.
        value: String,
    },
}

impl Seed {
    /// Parses a seed from JSON text.
    pub fn from_json(json: &str) -> ServiceResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a seed file.
    pub fn load(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ServiceError::SeedIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Replays every step against `store`, stopping at the first failure.
    pub fn apply(&self, store: &InMemoryTerminologyStore) -> ServiceResult<()> {
        for (step, seed_step) in self.steps.iter().enumerate() {
            seed_step
                .apply(store)
                .map_err(|source| ServiceError::SeedStep { step, source })?;
        }
        info!("Applied {} seed steps", self.steps.len());
        Ok(())
    }
}

impl SeedStep {
    fn apply(&self, store: &InMemoryTerminologyStore) -> CollaboratorResult<()> {
        debug!("Seed step: {:?}", self);
        match self {
            Self::CreateBranch { path } => store.create_branch(path).map(drop),
            Self::PersistCodeSystem { code_system } => store.persist_code_system(code_system.clone()),
            Self::Commit { branch, components } => store.commit(branch, components.clone()).map(drop),
            Self::CommitDailyBuild { branch, components } => {
                store.commit_daily_build(branch, components.clone()).map(drop)
            }
            Self::CreateVersion {
                short_name,
                effective_date,
                version,
                release_package,
            } => store
                .create_version(short_name, *effective_date, version, release_package.as_deref())
                .map(drop),
            Self::SetMetadata { branch, key, value } => {
                let mut metadata = store.find_latest_branch(branch)?.metadata;
                metadata.put_string(key.as_str(), value.as_str());
                store.replace_metadata(branch, metadata)
            }
        }
    }
}
