//! # snomed-upgrade
//!
//! Upgrade orchestration for SNOMED CT extension code systems.
//!
//! An extension lives on a branch below its parent code system, for example
//! `MAIN/SNOMEDCT-A` below the International Edition on `MAIN`. Upgrading
//! moves the extension onto a newer published version of the parent without
//! losing extension edits or keeping content the parent now provides.
//!
//! The crate provides:
//!
//! - [`CodeSystemUpgrader`]: the upgrade workflow, synchronous or on a worker
//! - [`UpgradeJobRegistry`]: status tracking for upgrade jobs
//! - the collaborator traits the workflow calls out to, in [`collaborators`]
//! - [`memory::InMemoryTerminologyStore`], an in-memory implementation of
//!   every collaborator
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use snomed_types::{CodeSystem, UpgradeStatus};
//! use snomed_upgrade::memory::InMemoryTerminologyStore;
//! use snomed_upgrade::{
//!     Caller, CodeSystemUpgrader, Collaborators, Role, RoleBasedPermissions, UpgradeConfig,
//!     UpgradeJobRegistry,
//! };
//!
//! let store = Arc::new(InMemoryTerminologyStore::new());
//! store.create_branch("MAIN").unwrap();
//! store.persist_code_system(CodeSystem::new("SNOMEDCT", "MAIN")).unwrap();
//! store.create_branch("MAIN/SNOMEDCT-A").unwrap();
//! let extension = CodeSystem::new("SNOMEDCT-A", "MAIN/SNOMEDCT-A");
//! store.persist_code_system(extension.clone()).unwrap();
//! store.create_version("SNOMEDCT", 20250101, "2025-01-01", Some("SnomedCT_Release_INT_20250101")).unwrap();
//!
//! let upgrader = CodeSystemUpgrader::with_registry(
//!     Collaborators::from_store(store, Arc::new(RoleBasedPermissions)),
//!     Arc::new(UpgradeJobRegistry::new()),
//!     UpgradeConfig::default(),
//! );
//! let admin = Caller::new("admin").with_global_role(Role::Admin);
//!
//! let job = upgrader.create_job("SNOMEDCT-A", 20250101);
//! upgrader.upgrade(&admin, Some(job), &extension, 20250101, false).unwrap();
//! assert_eq!(upgrader.get_job(job).unwrap().status, UpgradeStatus::Completed);
//! ```

#![warn(missing_docs)]

mod auth;
mod claims;
pub mod collaborators;
mod config;
mod error;
pub mod lineage;
pub mod memory;
mod orchestrator;
mod registry;
mod suspension;

pub use auth::{Caller, PermissionCheck, Role, RoleBasedPermissions};
pub use claims::{BranchClaim, BranchClaims};
pub use collaborators::Collaborators;
pub use config::UpgradeConfig;
pub use error::{CollaboratorError, CollaboratorResult, UpgradeError, UpgradeResult};
pub use orchestrator::CodeSystemUpgrader;
pub use registry::UpgradeJobRegistry;
pub use suspension::DailyBuildSuspension;

// Re-export snomed-types for convenience
pub use snomed_types;
