//! Package specifier parsing - `name` or `name@version`.

use anyhow::{Result, bail};

use crate::types::{PackageName, Version};

/// Parsed package specifier with optional version.
#[derive(Debug, Clone)]
pub struct PackageSpec {
    /// Package name.
    pub name: PackageName,
    /// Exact version, if one was given.
    pub version: Option<Version>,
}

impl PackageSpec {
    /// Parse a package specifier like `glad` or `glad@0.1.36`.
    pub fn parse(spec: &str) -> Result<Self> {
        if let Some((name, version)) = spec.split_once('@') {
            if name.is_empty() {
                bail!("Invalid package specifier: missing package name");
            }
            if version.is_empty() {
                bail!("Invalid package specifier: missing version after @");
            }

            Ok(Self {
                name: PackageName::new(name),
                version: Some(Version::new(version)),
            })
        } else {
            Ok(Self {
                name: PackageName::new(spec),
                version: None,
            })
        }
    }

    /// Check if this specifier requests a specific version.
    pub fn is_pinned(&self) -> bool {
        self.version.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let spec = PackageSpec::parse("glad").unwrap();
        assert_eq!(spec.name.as_str(), "glad");
        assert_eq!(spec.version, None);
        assert!(!spec.is_pinned());
    }

    #[test]
    fn test_parse_versioned() {
        let spec = PackageSpec::parse("glad@0.1.36").unwrap();
        assert_eq!(spec.name.as_str(), "glad");
        assert_eq!(spec.version, Some(Version::new("0.1.36")));
        assert!(spec.is_pinned());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(PackageSpec::parse("@1.0").is_err());
        assert!(PackageSpec::parse("glad@").is_err());
    }
}
