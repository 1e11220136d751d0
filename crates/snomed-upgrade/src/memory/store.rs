//! In-memory code system and branch store.
//!
//! Each branch keeps an ordered list of commits. The content visible on a
//! branch at an instant is its parent's content at the branch base overlaid
//! with the branch's own commits up to that instant. Historical views use the
//! branch's current base.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use snomed_types::{
    parent_path, version_branch_path, Branch, BranchTimepoint, CodeSystem, CodeSystemVersion,
    Component, Metadata, Timepoint,
};
use tracing::{debug, info};

use crate::collaborators::{BranchLookup, BranchRebase, CodeSystemLookup, DailyBuildControl};
use crate::error::{CollaboratorError, CollaboratorResult};

use super::duplicates::find_redundant_components;

#[derive(Debug, Clone)]
struct Commit {
    timestamp: DateTime<Utc>,
    saved: Vec<Component>,
    deleted: Vec<String>,
    daily_build: bool,
}

#[derive(Debug, Clone)]
pub(super) struct BranchState {
    branch: Branch,
    created: DateTime<Utc>,
    commits: Vec<Commit>,
}

impl BranchState {
    /// Content written on this branch itself up to `at`.
    pub(super) fn own_content(&self, at: DateTime<Utc>) -> BTreeMap<String, Component> {
        let mut content = BTreeMap::new();
        for commit in self.commits.iter().filter(|c| c.timestamp <= at) {
            for id in &commit.deleted {
                content.remove(id);
            }
            for component in &commit.saved {
                content.insert(component.id.clone(), component.clone());
            }
        }
        content
    }
}

#[derive(Debug, Default)]
pub(super) struct StoreState {
    code_systems: BTreeMap<String, CodeSystem>,
    versions: BTreeMap<(String, u32), CodeSystemVersion>,
    branches: BTreeMap<String, BranchState>,
    persist_log: Vec<CodeSystem>,
    rollbacks: BTreeMap<String, usize>,
    clock: Option<DateTime<Utc>>,
}

impl StoreState {
    /// Strictly increasing millisecond timestamps.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap_or_default();
        let next = match self.clock {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }

    pub(super) fn branch(&self, path: &str) -> CollaboratorResult<&BranchState> {
        self.branches
            .get(path)
            .ok_or_else(|| CollaboratorError::new(format!("Branch '{}' does not exist.", path)))
    }

    fn branch_mut(&mut self, path: &str) -> CollaboratorResult<&mut BranchState> {
        self.branches
            .get_mut(path)
            .ok_or_else(|| CollaboratorError::new(format!("Branch '{}' does not exist.", path)))
    }

    /// Content visible on `path` at `at`.
    pub(super) fn visible_content(
        &self,
        path: &str,
        at: DateTime<Utc>,
    ) -> CollaboratorResult<BTreeMap<String, Component>> {
        let state = self.branch(path)?;
        let mut content = match parent_path(path) {
            Some(parent) => self.visible_content(parent, at.min(state.branch.base))?,
            None => BTreeMap::new(),
        };
        content.extend(state.own_content(at));
        Ok(content)
    }

    /// Own and visible content of `path` at its head.
    pub(super) fn own_and_visible(
        &self,
        path: &str,
    ) -> CollaboratorResult<(BTreeMap<String, Component>, BTreeMap<String, Component>)> {
        let state = self.branch(path)?;
        let head = state.branch.head;
        Ok((state.own_content(head), self.visible_content(path, head)?))
    }

    pub(super) fn commit(
        &mut self,
        path: &str,
        saved: Vec<Component>,
        deleted: Vec<String>,
        daily_build: bool,
    ) -> CollaboratorResult<DateTime<Utc>> {
        self.branch(path)?;
        let timestamp = self.tick();
        let state = self.branch_mut(path)?;
        debug!(
            "Commit on {} at {}: {} saved, {} deleted",
            path,
            Timepoint::format_instant(&timestamp),
            saved.len(),
            deleted.len()
        );
        state.commits.push(Commit {
            timestamp,
            saved,
            deleted,
            daily_build,
        });
        state.branch.head = timestamp;
        Ok(timestamp)
    }

    fn persist_code_system(&mut self, code_system: CodeSystem) {
        self.persist_log.push(code_system.clone());
        self.code_systems
            .insert(code_system.short_name.clone(), code_system);
    }
}

/// Code systems, versions and branch content held in memory.
#[derive(Debug, Default)]
pub struct InMemoryTerminologyStore {
    state: RwLock<StoreState>,
}

impl InMemoryTerminologyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a branch based on the current head of its parent.
    pub fn create_branch(&self, path: &str) -> CollaboratorResult<Branch> {
        let mut state = self.write();
        if state.branches.contains_key(path) {
            return Err(CollaboratorError::new(format!("Branch '{}' already exists.", path)));
        }
        if let Some(parent) = parent_path(path) {
            state.branch(parent)?;
        }
        let created = state.tick();
        let branch = Branch::new(path, created);
        state.branches.insert(
            path.to_string(),
            BranchState {
                branch: branch.clone(),
                created,
                commits: Vec::new(),
            },
        );
        info!("Created branch {}", path);
        Ok(branch)
    }

    /// Saves a code system.
    pub fn persist_code_system(&self, code_system: CodeSystem) -> CollaboratorResult<()> {
        let mut state = self.write();
        state.branch(&code_system.branch_path)?;
        state.persist_code_system(code_system);
        Ok(())
    }

    /// Returns a code system by short name.
    pub fn code_system(&self, short_name: &str) -> Option<CodeSystem> {
        self.read().code_systems.get(short_name).cloned()
    }

    /// Every code system save, oldest first.
    pub fn code_system_persist_log(&self) -> Vec<CodeSystem> {
        self.read().persist_log.clone()
    }

    /// Commits authored content to a branch.
    pub fn commit(&self, path: &str, components: Vec<Component>) -> CollaboratorResult<DateTime<Utc>> {
        self.write().commit(path, components, Vec::new(), false)
    }

    /// Commits daily-build content that stays provisional until promoted.
    pub fn commit_daily_build(
        &self,
        path: &str,
        components: Vec<Component>,
    ) -> CollaboratorResult<DateTime<Utc>> {
        self.write().commit(path, components, Vec::new(), true)
    }

    /// Makes all daily-build content on a branch permanent.
    pub fn promote_daily_build(&self, path: &str) -> CollaboratorResult<usize> {
        let mut state = self.write();
        let branch = state.branch_mut(path)?;
        let mut promoted = 0;
        for commit in branch.commits.iter_mut().filter(|c| c.daily_build) {
            commit.daily_build = false;
            promoted += 1;
        }
        Ok(promoted)
    }

    /// Publishes a version of a code system on a new version branch frozen
    /// at the code system's current head.
    pub fn create_version(
        &self,
        short_name: &str,
        effective_date: u32,
        version: &str,
        release_package: Option<&str>,
    ) -> CollaboratorResult<CodeSystemVersion> {
        let code_system = self.code_system(short_name).ok_or_else(|| {
            CollaboratorError::new(format!("Code System '{}' does not exist.", short_name))
        })?;
        let key = (short_name.to_string(), effective_date);
        if self.read().versions.contains_key(&key) {
            return Err(CollaboratorError::new(format!(
                "Code System {} already has a version with effectiveTime '{}'.",
                short_name, effective_date
            )));
        }

        self.create_branch(&version_branch_path(&code_system.branch_path, effective_date))?;
        let mut code_system_version = CodeSystemVersion::new(&code_system, effective_date, version);
        code_system_version.release_package = release_package.map(str::to_owned);
        self.write()
            .versions
            .insert(key, code_system_version.clone());
        info!("Created version {}", code_system_version);
        Ok(code_system_version)
    }

    /// Latest state of a branch.
    pub fn find_latest_branch(&self, path: &str) -> CollaboratorResult<Branch> {
        self.read().branch(path).map(|state| state.branch.clone())
    }

    /// Replaces the metadata of a branch.
    pub fn replace_metadata(&self, path: &str, metadata: Metadata) -> CollaboratorResult<()> {
        let mut state = self.write();
        state.branch_mut(path)?.branch.metadata = metadata;
        Ok(())
    }

    /// Content visible at the head of a branch.
    pub fn visible_content(&self, path: &str) -> CollaboratorResult<BTreeMap<String, Component>> {
        let state = self.read();
        let head = state.branch(path)?.branch.head;
        state.visible_content(path, head)
    }

    /// Content written on the branch itself, at its head.
    pub fn own_content(&self, path: &str) -> CollaboratorResult<BTreeMap<String, Component>> {
        let state = self.read();
        let branch = state.branch(path)?;
        Ok(branch.own_content(branch.branch.head))
    }

    /// A component as visible at the head of a branch.
    pub fn component(&self, path: &str, id: &str) -> Option<Component> {
        self.visible_content(path).ok()?.remove(id)
    }

    /// Number of daily-build rollbacks run against a branch.
    pub fn rollback_count(&self, path: &str) -> usize {
        self.read().rollbacks.get(path).copied().unwrap_or(0)
    }
}

impl CodeSystemLookup for InMemoryTerminologyStore {
    fn find_by_branch_path(&self, branch_path: &str) -> Option<CodeSystem> {
        self.read()
            .code_systems
            .values()
            .find(|code_system| code_system.branch_path == branch_path)
            .cloned()
    }

    fn find_version(&self, short_name: &str, effective_date: u32) -> Option<CodeSystemVersion> {
        self.read()
            .versions
            .get(&(short_name.to_string(), effective_date))
            .cloned()
    }

    fn persist(&self, code_system: &CodeSystem) -> CollaboratorResult<()> {
        self.persist_code_system(code_system.clone())
    }
}

impl BranchLookup for InMemoryTerminologyStore {
    fn find_latest(&self, branch_path: &str) -> CollaboratorResult<Branch> {
        self.find_latest_branch(branch_path)
    }

    fn update_metadata(&self, branch_path: &str, metadata: Metadata) -> CollaboratorResult<()> {
        self.replace_metadata(branch_path, metadata)
    }
}

impl BranchRebase for InMemoryTerminologyStore {
    fn rebase_to_timepoint_removing_duplicates(
        &self,
        parent: &BranchTimepoint,
        child_path: &str,
        audit_message: &str,
    ) -> CollaboratorResult<()> {
        if parent_path(child_path) != Some(parent.branch_path.as_str()) {
            return Err(CollaboratorError::new(format!(
                "Branch '{}' is not a child of '{}'.",
                child_path, parent.branch_path
            )));
        }

        let mut state = self.write();
        let parent_state = state.branch(&parent.branch_path)?;
        let instant = match parent.timepoint {
            Timepoint::At(instant) => instant,
            Timepoint::Head => parent_state.branch.head,
            Timepoint::BranchCreation => parent_state.created,
        };

        let child = state.branch(child_path)?;
        if instant < child.branch.base {
            return Err(CollaboratorError::new(format!(
                "Cannot rebase '{}' to {} which is before its current base {}.",
                child_path,
                Timepoint::format_instant(&instant),
                Timepoint::format_instant(&child.branch.base)
            )));
        }
        let own = child.own_content(child.branch.head);
        let inherited = state.visible_content(&parent.branch_path, instant)?;
        let redundant = find_redundant_components(own.values(), &inherited);
        let removed = redundant.len();

        state.commit(child_path, Vec::new(), redundant, false)?;
        state.branch_mut(child_path)?.branch.base = instant;
        info!(
            "{} Rebased {} onto {}, removed {} duplicate components.",
            audit_message,
            child_path,
            BranchTimepoint::at(parent.branch_path.as_str(), instant),
            removed
        );
        Ok(())
    }
}

impl DailyBuildControl for InMemoryTerminologyStore {
    fn rollback_uncommitted_content(&self, code_system: &CodeSystem) -> CollaboratorResult<()> {
        let mut state = self.write();
        let branch = state.branch_mut(&code_system.branch_path)?;
        let before = branch.commits.len();
        branch.commits.retain(|commit| !commit.daily_build);
        let removed = before - branch.commits.len();
        *state
            .rollbacks
            .entry(code_system.branch_path.clone())
            .or_default() += 1;
        info!(
            "Rolled back {} daily build commits on {}",
            removed, code_system.branch_path
        );
        Ok(())
    }
}
