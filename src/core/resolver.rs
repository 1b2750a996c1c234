//! Pinned-dependency resolution against the package index.
//!
//! Requires are exact name/version pins; resolution walks transitive pins
//! recorded in the index, detects cycles and conflicting pins, and returns
//! dependencies in installation order (dependencies before dependents).
//! Resolution is pure for fixed inputs: identical requires against an
//! identical index always yield the identical graph.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::index::PackageIndex;
use crate::types::{PackageName, Version};

/// Errors raised during resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Package '{0}' not found in index")]
    NotFound(PackageName),

    #[error("Package '{name}' has no release {version}")]
    VersionNotFound { name: PackageName, version: Version },

    #[error("Version conflict for '{name}': pinned at both {first} and {second}")]
    Conflict {
        name: PackageName,
        first: Version,
        second: Version,
    },

    #[error("Circular dependency detected involving package: {0}")]
    Cycle(PackageName),

    #[error("Store entry for '{name}/{version}' missing at {path}; re-export the package")]
    StoreMissing {
        name: PackageName,
        version: Version,
        path: PathBuf,
    },
}

/// A requirement resolved to a concrete store entry.
#[derive(Debug, Clone)]
pub struct ResolvedDependency {
    /// Package name.
    pub name: PackageName,
    /// Resolved exact version.
    pub version: Version,
    /// Recipe revision of the store entry.
    pub revision: String,
    /// Root of the exported package tree in the store.
    pub root: PathBuf,
    /// Link-library names this package exposes.
    pub libs: Vec<String>,
}

impl ResolvedDependency {
    /// The package's header directory, if it ships one.
    pub fn include_dir(&self) -> Option<PathBuf> {
        existing_dir(self.root.join("include"))
    }

    /// The package's library directory, if it ships one.
    pub fn lib_dir(&self) -> Option<PathBuf> {
        existing_dir(self.root.join("lib"))
    }
}

fn existing_dir(path: PathBuf) -> Option<PathBuf> {
    path.is_dir().then_some(path)
}

/// Resolves pinned requires (and their transitive pins) against the index.
pub fn resolve(
    requires: &BTreeMap<PackageName, Version>,
    index: &PackageIndex,
    store_root: &Path,
) -> Result<Vec<ResolvedDependency>, ResolveError> {
    let mut order = Vec::new();
    let mut pinned = HashMap::new();
    let mut visiting = HashSet::new();

    for (name, version) in requires {
        resolve_recursive(
            name,
            version,
            index,
            store_root,
            &mut order,
            &mut pinned,
            &mut visiting,
        )?;
    }

    Ok(order)
}

fn resolve_recursive(
    name: &PackageName,
    version: &Version,
    index: &PackageIndex,
    store_root: &Path,
    order: &mut Vec<ResolvedDependency>,
    pinned: &mut HashMap<PackageName, Version>,
    visiting: &mut HashSet<PackageName>,
) -> Result<(), ResolveError> {
    if let Some(existing) = pinned.get(name) {
        if existing != version {
            return Err(ResolveError::Conflict {
                name: name.clone(),
                first: existing.clone(),
                second: version.clone(),
            });
        }
        return Ok(());
    }

    if visiting.contains(name) {
        return Err(ResolveError::Cycle(name.clone()));
    }
    visiting.insert(name.clone());

    let entry = index
        .find(name)
        .ok_or_else(|| ResolveError::NotFound(name.clone()))?;
    let release = entry
        .find_version(version)
        .ok_or_else(|| ResolveError::VersionNotFound {
            name: name.clone(),
            version: version.clone(),
        })?;

    for req in &release.requires {
        resolve_recursive(
            &req.name,
            &req.version,
            index,
            store_root,
            order,
            pinned,
            visiting,
        )?;
    }

    visiting.remove(name);

    let root = store_root.join(name.as_str()).join(version.as_str());
    if !root.is_dir() {
        return Err(ResolveError::StoreMissing {
            name: name.clone(),
            version: version.clone(),
            path: root,
        });
    }

    pinned.insert(name.clone(), version.clone());
    order.push(ResolvedDependency {
        name: name.clone(),
        version: version.clone(),
        revision: release.revision.clone(),
        root,
        libs: release.libs.clone(),
    });

    Ok(())
}
