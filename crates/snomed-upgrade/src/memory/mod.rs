//! In-memory implementations of the upgrade collaborators.
//!
//! [`InMemoryTerminologyStore`] keeps code systems, versions and branch
//! content history in process memory. It backs the tests and the
//! `snomed-upgrade` binary.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use snomed_types::{CodeSystem, Component, ComponentKind};
//! use snomed_upgrade::memory::InMemoryTerminologyStore;
//!
//! let store = Arc::new(InMemoryTerminologyStore::new());
//! store.create_branch("MAIN").unwrap();
//! store.persist_code_system(CodeSystem::new("SNOMEDCT", "MAIN")).unwrap();
//! store
//!     .commit("MAIN", vec![Component::new("404684003", ComponentKind::Concept, 900000000000207008)])
//!     .unwrap();
//! store
//!     .create_version("SNOMEDCT", 20250101, "2025-01-01", Some("SnomedCT_Release_INT_20250101"))
//!     .unwrap();
//!
//! assert!(store.component("MAIN/2025-01-01", "404684003").is_some());
//! ```

mod automations;
mod duplicates;
mod integrity;
mod store;

pub use duplicates::find_redundant_components;
pub use integrity::unresolved_references;
pub use store::InMemoryTerminologyStore;
