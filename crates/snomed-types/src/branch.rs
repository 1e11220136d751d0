//! Branches and branch metadata.
//!
//! Branch paths form a tree: `MAIN` is the root, `MAIN/SNOMEDCT-A` is a child
//! of `MAIN`, and so on.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Returns the parent of a branch path, or `None` for a root path.
///
/// # Examples
///
/// ```
/// use snomed_types::parent_path;
///
/// assert_eq!(parent_path("MAIN/SNOMEDCT-A/PROJECT"), Some("MAIN/SNOMEDCT-A"));
/// assert_eq!(parent_path("MAIN"), None);
/// ```
pub fn parent_path(path: &str) -> Option<&str> {
    path.rfind('/')
        .map(|index| &path[..index])
        .filter(|parent| !parent.is_empty())
}

/// Returns true if `path` equals `ancestor` or lies below it.
pub fn is_same_or_descendant(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'/')
}

/// A branch as seen at its latest state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Branch {
    /// Branch path.
    pub path: String,
    /// Instant the branch diverged from, or was last rebased onto, its parent.
    pub base: DateTime<Utc>,
    /// Instant of the latest commit on this branch.
    pub head: DateTime<Utc>,
    /// Branch metadata.
    #[cfg_attr(feature = "serde", serde(default))]
    pub metadata: Metadata,
}

impl Branch {
    /// Creates a branch whose base and head are `created`.
    pub fn new(path: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            base: created,
            head: created,
            metadata: Metadata::default(),
        }
    }

    /// Parent branch path.
    pub fn parent_path(&self) -> Option<&str> {
        parent_path(&self.path)
    }
}

/// A single metadata value: either a string or a nested string map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum MetadataValue {
    /// Plain string value.
    String(String),
    /// Nested map of string values.
    Map(BTreeMap<String, String>),
}

/// Branch metadata: string keys mapping to strings or nested maps.
///
/// # Examples
///
/// ```
/// use snomed_types::Metadata;
///
/// let mut metadata = Metadata::default();
/// metadata.put_string("dependencyRelease", "20250101");
/// metadata.get_map_or_create("internal").insert("integrityIssue".into(), "true".into());
///
/// assert_eq!(metadata.get_string("dependencyRelease"), Some("20250101"));
/// assert_eq!(metadata.get_string("internal"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Metadata(BTreeMap<String, MetadataValue>);

impl Metadata {
    /// Returns a string value; nested maps are not strings.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(MetadataValue::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Sets a string value, replacing whatever was there.
    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0
            .insert(key.into(), MetadataValue::String(value.into()));
    }

    /// Returns a nested map.
    pub fn get_map(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        match self.0.get(key) {
            Some(MetadataValue::Map(map)) => Some(map),
            _ => None,
        }
    }

    /// Returns a nested map, creating it if absent.
    ///
    /// A string stored under `key` is replaced by an empty map.
    pub fn get_map_or_create(&mut self, key: &str) -> &mut BTreeMap<String, String> {
        let entry = self
            .0
            .entry(key.to_string())
            .or_insert_with(|| MetadataValue::Map(BTreeMap::new()));
        if let MetadataValue::String(_) = entry {
            *entry = MetadataValue::Map(BTreeMap::new());
        }
        match entry {
            MetadataValue::Map(map) => map,
            MetadataValue::String(_) => unreachable!("entry was replaced by a map"),
        }
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        self.0.remove(key)
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of top level keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
