//! # snomed-service
//!
//! Runs one extension upgrade end to end against an in-memory terminology
//! store populated from a JSON seed.
//!
//! The `snomed-upgrade` binary reads its settings from the environment (see
//! [`ServiceConfig`]), applies the [`Seed`], starts the upgrade on a worker
//! and polls the job until it reaches a terminal status.

#![warn(missing_docs)]

mod config;
mod error;
mod runner;
mod seed;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use runner::{run, UpgradeReport};
pub use seed::{Seed, SeedStep};
