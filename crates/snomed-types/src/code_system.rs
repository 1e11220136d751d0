//! Code systems and their published versions.

/// A terminology edition living on its own branch.
///
/// # Examples
///
/// ```
/// use snomed_types::CodeSystem;
///
/// let extension = CodeSystem::new("SNOMEDCT-A", "MAIN/SNOMEDCT-A");
/// assert_eq!(extension.parent_branch_path(), Some("MAIN"));
///
/// let international = CodeSystem::new("SNOMEDCT", "MAIN");
/// assert!(international.is_root());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeSystem {
    /// Unique short name, e.g. `SNOMEDCT-A`.
    pub short_name: String,
    /// Branch holding the working content of this code system.
    pub branch_path: String,
    /// Whether automated daily-build ingestion is enabled.
    #[cfg_attr(feature = "serde", serde(default))]
    pub daily_build_available: bool,
}

impl CodeSystem {
    /// Creates a code system with daily build disabled.
    pub fn new(short_name: impl Into<String>, branch_path: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            branch_path: branch_path.into(),
            daily_build_available: false,
        }
    }

    /// Path of the branch this code system depends on.
    pub fn parent_branch_path(&self) -> Option<&str> {
        crate::parent_path(&self.branch_path)
    }

    /// Returns true if this code system has no parent branch.
    pub fn is_root(&self) -> bool {
        self.parent_branch_path().is_none()
    }
}

impl std::fmt::Display for CodeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.short_name, self.branch_path)
    }
}

/// An immutable published release of a code system.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeSystemVersion {
    /// Short name of the owning code system.
    pub short_name: String,
    /// Effective date in YYYYMMDD format.
    pub effective_date: u32,
    /// Branch frozen at the moment the version was published.
    pub branch_path: String,
    /// Release package file name, if one was recorded.
    #[cfg_attr(feature = "serde", serde(default))]
    pub release_package: Option<String>,
    /// Human readable label.
    pub version: String,
}

impl CodeSystemVersion {
    /// Creates a version on the conventional version branch of `code_system`.
    pub fn new(code_system: &CodeSystem, effective_date: u32, version: impl Into<String>) -> Self {
        Self {
            short_name: code_system.short_name.clone(),
            effective_date,
            branch_path: version_branch_path(&code_system.branch_path, effective_date),
            release_package: None,
            version: version.into(),
        }
    }

    /// Builder style helper that sets the release package.
    pub fn with_release_package(mut self, package: impl Into<String>) -> Self {
        self.release_package = Some(package.into());
        self
    }
}

impl std::fmt::Display for CodeSystemVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.short_name, self.effective_date)
    }
}

/// Branch path a version with `effective_date` is published on,
/// e.g. `MAIN/2025-01-01`.
pub fn version_branch_path(code_system_branch: &str, effective_date: u32) -> String {
    let year = effective_date / 10_000;
    let month = (effective_date / 100) % 100;
    let day = effective_date % 100;
    format!("{code_system_branch}/{year:04}-{month:02}-{day:02}")
}
