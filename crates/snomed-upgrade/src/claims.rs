//! Exclusive claims on branch paths.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::error::{UpgradeError, UpgradeResult};

static PROCESS_CLAIMS: OnceLock<Arc<BranchClaims>> = OnceLock::new();

/// Set of branch paths currently being upgraded.
#[derive(Debug, Default)]
pub struct BranchClaims {
    claimed: Mutex<HashSet<String>>,
}

impl BranchClaims {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The claim set shared by every upgrader built with
    /// [`CodeSystemUpgrader::new`](crate::CodeSystemUpgrader::new).
    pub fn process() -> Arc<Self> {
        PROCESS_CLAIMS.get_or_init(|| Arc::new(Self::new())).clone()
    }

    /// Claims `branch_path` until the returned guard is dropped.
    ///
    /// Fails with `UpgradeInProgress` if the path is already claimed.
    pub fn claim(&self, branch_path: &str) -> UpgradeResult<BranchClaim<'_>> {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        if !claimed.insert(branch_path.to_string()) {
            return Err(UpgradeError::UpgradeInProgress {
                branch_path: branch_path.to_string(),
            });
        }
        Ok(BranchClaim {
            claims: self,
            branch_path: branch_path.to_string(),
        })
    }

    /// Returns true if `branch_path` is claimed.
    pub fn is_claimed(&self, branch_path: &str) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(branch_path)
    }
}

/// Releases its branch path when dropped.
#[must_use = "the claim is released as soon as it is dropped"]
#[derive(Debug)]
pub struct BranchClaim<'a> {
    claims: &'a BranchClaims,
    branch_path: String,
}

impl Drop for BranchClaim<'_> {
    fn drop(&mut self) {
        self.claims
            .claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.branch_path);
    }
}
