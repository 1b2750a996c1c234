//! Packaging staging - executes copy rules against resolved package roots.
//!
//! A rule's `src` is rooted at a resolved dependency (first path component
//! names the package); files whose names match the rule's glob are copied
//! preserving their path relative to the source directory.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::core::manifest::CopyRule;
use crate::core::resolver::ResolvedDependency;

/// Errors raised while staging.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Copy source '{0}' does not name a resolved dependency")]
    UnknownPackage(String),

    #[error("Missing source path: {0}")]
    MissingSource(PathBuf),

    #[error("Invalid copy pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one executed copy rule.
#[derive(Debug, Clone)]
pub struct StagedRule {
    /// The rule's file-name glob.
    pub pattern: String,
    /// The rule's source directory.
    pub src: String,
    /// The rule's destination directory.
    pub dst: String,
    /// Number of files copied.
    pub files: usize,
}

/// Execute every copy rule against the resolved graph, staging into
/// `staging_root`. Re-running with identical inputs overwrites the same
/// files in place.
pub fn stage(
    rules: &[CopyRule],
    deps: &[ResolvedDependency],
    staging_root: &Path,
) -> Result<Vec<StagedRule>, StageError> {
    let mut report = Vec::with_capacity(rules.len());
    for rule in rules {
        report.push(stage_rule(rule, deps, staging_root)?);
    }
    Ok(report)
}

fn stage_rule(
    rule: &CopyRule,
    deps: &[ResolvedDependency],
    staging_root: &Path,
) -> Result<StagedRule, StageError> {
    let (package, subpath) = split_source(&rule.src);
    let needle = package.to_lowercase();
    let dep = deps
        .iter()
        .find(|d| d.name.as_str() == needle)
        .ok_or_else(|| StageError::UnknownPackage(rule.src.clone()))?;

    let src_dir = if subpath.is_empty() {
        dep.root.clone()
    } else {
        dep.root.join(subpath)
    };
    if !src_dir.is_dir() {
        return Err(StageError::MissingSource(src_dir));
    }

    let pattern = Pattern::new(&rule.pattern).map_err(|source| StageError::Pattern {
        pattern: rule.pattern.clone(),
        source,
    })?;

    let mut files = 0;
    for entry in WalkDir::new(&src_dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !pattern.matches(&file_name) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&src_dir) else {
            continue;
        };
        let dest = staging_root.join(&rule.dst).join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)?;
        files += 1;
    }

    debug!(
        pattern = %rule.pattern,
        src = %src_dir.display(),
        dst = %rule.dst,
        files,
        "staged copy rule"
    );

    Ok(StagedRule {
        pattern: rule.pattern.clone(),
        src: rule.src.clone(),
        dst: rule.dst.clone(),
        files,
    })
}

/// Split a rule source into (package, subpath).
fn split_source(src: &str) -> (&str, &str) {
    match src.split_once('/') {
        Some((package, subpath)) => (package, subpath),
        None => (src, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PackageName, Version};
    use tempfile::TempDir;

    fn glad_dep(store: &Path) -> ResolvedDependency {
        let root = store.join("glad").join("0.1.36");
        fs::create_dir_all(root.join("include").join("glad")).unwrap();
        fs::create_dir_all(root.join("include").join("KHR")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("include/glad/glad.h"), "// glad").unwrap();
        fs::write(root.join("include/KHR/khrplatform.h"), "// khr").unwrap();
        fs::write(root.join("src/glad.c"), "// impl").unwrap();

        ResolvedDependency {
            name: PackageName::new("glad"),
            version: Version::new("0.1.36"),
            revision: "r1".into(),
            root,
            libs: vec!["glad".into()],
        }
    }

    fn header_rule() -> CopyRule {
        CopyRule {
            pattern: "*.h".into(),
            src: "glad/include".into(),
            dst: "include".into(),
        }
    }

    #[test]
    fn test_stage_preserves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let deps = vec![glad_dep(dir.path())];
        let staging = dir.path().join("package");

        let report = stage(&[header_rule()], &deps, &staging).unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].files, 2);
        assert!(staging.join("include/glad/glad.h").exists());
        assert!(staging.join("include/KHR/khrplatform.h").exists());
        // The .c file does not match *.h
        assert!(!staging.join("include/glad.c").exists());
    }

    #[test]
    fn test_stage_sources_rule() {
        let dir = TempDir::new().unwrap();
        let deps = vec![glad_dep(dir.path())];
        let staging = dir.path().join("package");

        let rule = CopyRule {
            pattern: "*.c".into(),
            src: "glad/src".into(),
            dst: "src".into(),
        };
        let report = stage(&[rule], &deps, &staging).unwrap();

        assert_eq!(report[0].files, 1);
        assert!(staging.join("src/glad.c").exists());
    }

    #[test]
    fn test_stage_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let deps = vec![glad_dep(dir.path())];
        let staging = dir.path().join("package");

        let first = stage(&[header_rule()], &deps, &staging).unwrap();
        let second = stage(&[header_rule()], &deps, &staging).unwrap();

        assert_eq!(first[0].files, second[0].files);
        assert!(staging.join("include/glad/glad.h").exists());
    }

    #[test]
    fn test_unknown_package() {
        let dir = TempDir::new().unwrap();
        let deps = vec![glad_dep(dir.path())];

        let rule = CopyRule {
            pattern: "*.h".into(),
            src: "ghost/include".into(),
            dst: "include".into(),
        };
        let err = stage(&[rule], &deps, &dir.path().join("package")).unwrap_err();
        assert!(matches!(err, StageError::UnknownPackage(_)));
    }

    #[test]
    fn test_missing_source_path() {
        let dir = TempDir::new().unwrap();
        let deps = vec![glad_dep(dir.path())];

        let rule = CopyRule {
            pattern: "*.h".into(),
            src: "glad/headers".into(),
            dst: "include".into(),
        };
        let err = stage(&[rule], &deps, &dir.path().join("package")).unwrap_err();
        assert!(matches!(err, StageError::MissingSource(_)));
    }
}
