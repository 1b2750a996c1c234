//! Index definition and serialization via Postcard.
//!
//! Low-overhead binary registry of exported packages.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{PackageName, Version};

/// Current index format version.
pub const INDEX_VERSION: u32 = 1;

/// Errors raised while loading, saving, or mutating the index.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Postcard(#[from] postcard::Error),

    #[error("Package definition error: {0}")]
    Package(String),

    #[error("Index version mismatch: found v{0}, expected v{1}. Re-export your packages to rebuild the index.")]
    VersionMismatch(u32, u32),
}

/// One pinned requirement recorded for a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Required package name.
    pub name: PackageName,
    /// Exact required version.
    pub version: Version,
}

/// Compact release info (one exported version).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Version string.
    pub version: Version,
    /// BLAKE3 revision of the recipe this release was exported from.
    pub revision: String,
    /// Link-library names this package exposes to consumers.
    #[serde(default)]
    pub libs: Vec<String>,
    /// Transitive pins of this release.
    #[serde(default)]
    pub requires: Vec<Requirement>,
}

/// Compact package entry in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Package name.
    pub name: PackageName,
    /// Package description.
    #[serde(default)]
    pub description: String,
    /// All exported releases (sorted by version descending).
    pub releases: Vec<ReleaseInfo>,
}

impl IndexEntry {
    /// Get the latest release (if any).
    pub fn latest(&self) -> Option<&ReleaseInfo> {
        self.releases.first()
    }

    /// Find a specific version - O(log n) binary search.
    ///
    /// Note: Releases are sorted descending (newest first), so we reverse the comparison.
    pub fn find_version(&self, version: impl AsRef<str>) -> Option<&ReleaseInfo> {
        let v = version.as_ref();
        self.releases
            .binary_search_by(|r| v.cmp(r.version.as_str()))
            .ok()
            .map(|idx| &self.releases[idx])
    }
}

/// Package index (binary format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageIndex {
    /// Index format version.
    pub version: u32,
    /// Unix timestamp of last update.
    pub updated_at: i64,
    /// Package entries, sorted by name.
    pub packages: Vec<IndexEntry>,
}

impl Default for PackageIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            updated_at: 0,
            packages: Vec::new(),
        }
    }

    /// Load and deserialize the index from disk.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let data = fs::read(path)?;
        let mut index = Self::from_bytes(&data)?;
        // Ensure sorted for O(log n) lookups
        index.ensure_sorted();
        Ok(index)
    }

    /// Load the index, or start an empty one if none exists yet.
    pub fn load_or_default(path: &Path) -> Result<Self, IndexError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Serialize to a Postcard file.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let buf = postcard::to_allocvec(self)?;
        fs::write(path, &buf)?;
        Ok(())
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, IndexError> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Deserialize from bytes, rejecting incompatible format versions.
    pub fn from_bytes(data: &[u8]) -> Result<Self, IndexError> {
        // Postcard serializes fields in order. First field of PackageIndex is
        // version: u32, so the header can be checked before a full decode.
        #[derive(Deserialize)]
        struct IndexHeader {
            version: u32,
        }

        let header: IndexHeader = postcard::from_bytes(data)
            .map_err(|_| IndexError::Postcard(postcard::Error::DeserializeBadVarint))?;

        if header.version != INDEX_VERSION {
            return Err(IndexError::VersionMismatch(header.version, INDEX_VERSION));
        }

        Ok(postcard::from_bytes(data)?)
    }

    /// Record the current time as the last-update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp();
    }

    /// Add a single release to a package, replacing any release with the
    /// same version.
    pub fn upsert_release(&mut self, name: &PackageName, description: &str, release: ReleaseInfo) {
        match self
            .packages
            .binary_search_by(|e| e.name.as_str().cmp(name.as_str()))
        {
            Ok(idx) => {
                let entry = &mut self.packages[idx];
                entry.description = description.to_string();
                if let Some(existing) = entry
                    .releases
                    .iter_mut()
                    .find(|r| r.version == release.version)
                {
                    *existing = release;
                } else {
                    entry.releases.push(release);
                }
                // Sort releases by version descending
                entry.releases.sort_by(|a, b| b.version.cmp(&a.version));
            }
            Err(idx) => {
                self.packages.insert(
                    idx,
                    IndexEntry {
                        name: name.clone(),
                        description: description.to_string(),
                        releases: vec![release],
                    },
                );
            }
        }
    }

    /// Remove one release, or a whole package when `version` is None.
    ///
    /// Returns true if anything was removed. Entries left with no releases
    /// are pruned.
    pub fn remove(&mut self, name: &PackageName, version: Option<&Version>) -> bool {
        let Ok(idx) = self
            .packages
            .binary_search_by(|e| e.name.as_str().cmp(name.as_str()))
        else {
            return false;
        };

        match version {
            None => {
                self.packages.remove(idx);
                true
            }
            Some(version) => {
                let entry = &mut self.packages[idx];
                let before = entry.releases.len();
                entry.releases.retain(|r| &r.version != version);
                let removed = entry.releases.len() != before;
                if entry.releases.is_empty() {
                    self.packages.remove(idx);
                }
                removed
            }
        }
    }

    /// Find a package by name - O(log n) binary search.
    pub fn find(&self, name: impl AsRef<str>) -> Option<&IndexEntry> {
        let n = name.as_ref();
        self.packages
            .binary_search_by(|e| e.name.as_str().cmp(n))
            .ok()
            .map(|idx| &self.packages[idx])
    }

    /// Search packages by query (matches name or description) - O(n) scan.
    pub fn search(&self, query: &str) -> Vec<&IndexEntry> {
        let query_lower = query.to_lowercase();
        self.packages
            .iter()
            .filter(|e| {
                e.name.as_str().contains(&query_lower)
                    || e.description.to_lowercase().contains(&query_lower)
            })
            .collect()
    }

    /// Ensure packages are sorted by name for binary search.
    /// Called after load and deserialization.
    fn ensure_sorted(&mut self) {
        self.packages.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn release(version: &str) -> ReleaseInfo {
        ReleaseInfo {
            version: Version::new(version),
            revision: format!("rev-{version}"),
            libs: vec![],
            requires: vec![],
        }
    }

    #[test]
    fn test_roundtrip() {
        let mut index = PackageIndex::new();
        index.upsert_release(
            &PackageName::new("glad"),
            "OpenGL loader",
            ReleaseInfo {
                version: Version::new("0.1.36"),
                revision: "deadbeef".to_string(),
                libs: vec!["glad".to_string()],
                requires: vec![],
            },
        );

        let bytes = index.to_bytes().unwrap();
        let restored = PackageIndex::from_bytes(&bytes).unwrap();

        assert_eq!(restored.packages.len(), 1);
        assert_eq!(restored.packages[0].name.as_str(), "glad");
        assert_eq!(restored.packages[0].releases[0].version, "0.1.36");
        assert_eq!(restored.packages[0].releases[0].libs, vec!["glad"]);
    }

    #[test]
    fn test_upsert_release() {
        let mut index = PackageIndex::new();
        let name = PackageName::new("glm");

        index.upsert_release(&name, "Header-only math", release("0.9.9.8"));
        index.upsert_release(&name, "Header-only math", release("0.9.9.9"));

        let entry = index.find("glm").unwrap();
        assert_eq!(entry.releases.len(), 2);
        assert_eq!(entry.latest().unwrap().version, "0.9.9.9");
        assert!(entry.find_version("0.9.9.8").is_some());
        assert!(entry.find_version("1.0.0").is_none());
    }

    #[test]
    fn test_version_check() {
        let mut index = PackageIndex::new();
        index.version = 99; // Force incompatible version
        let bytes = postcard::to_allocvec(&index).unwrap();

        let result = PackageIndex::from_bytes(&bytes);
        assert!(result.is_err());
        if let Err(IndexError::VersionMismatch(found, expected)) = result {
            assert_eq!(found, 99);
            assert_eq!(expected, INDEX_VERSION);
        } else {
            panic!("Expected VersionMismatch error");
        }
    }

    #[test]
    fn test_file_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.bin");

        let mut index = PackageIndex::new();
        index.updated_at = 1234567890;
        index.upsert_release(&PackageName::new("glad"), "OpenGL loader", release("0.1.36"));

        index.save(&path).unwrap();
        let loaded = PackageIndex::load(&path).unwrap();

        assert_eq!(loaded.updated_at, 1234567890);
        assert_eq!(loaded.packages[0].name.as_str(), "glad");

        // Missing index loads as empty via load_or_default
        let empty = PackageIndex::load_or_default(&dir.path().join("nope.bin")).unwrap();
        assert!(empty.packages.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut index = PackageIndex::new();
        let name = PackageName::new("glad");
        index.upsert_release(&name, "", release("0.1.35"));
        index.upsert_release(&name, "", release("0.1.36"));

        assert!(index.remove(&name, Some(&Version::new("0.1.35"))));
        assert_eq!(index.find("glad").unwrap().releases.len(), 1);

        assert!(index.remove(&name, None));
        assert!(index.find("glad").is_none());
        assert!(!index.remove(&name, None));
    }
}
