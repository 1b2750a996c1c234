//! Recipe (`quarry.toml`) parsing and validation, plus the lockfile.
//!
//! A recipe declares a project's identity, the settings axes it consumes,
//! its option schema, pinned requires, generators, and optional packaging
//! steps. The companion lockfile (`quarry.lock`) records the exact resolved
//! pins so that repeated resolution is reproducible.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::resolver::ResolvedDependency;
use crate::core::settings::SettingsTable;
use crate::io::generators;
use crate::types::{PackageName, Version};

/// Errors raised while loading or validating a recipe.
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Validation(String),
}

/// A boolean or free-form string option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean choice (e.g. the `shared` flag).
    Bool(bool),
    /// Free-form string choice.
    Str(String),
}

impl OptionValue {
    /// Parse a command-line override value: `true`/`false` become booleans,
    /// everything else stays a string.
    pub fn parse_cli(raw: &str) -> Self {
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            other => Self::Str(other.to_string()),
        }
    }
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// A declared option: the allowed value set and the default selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Allowed values for this option.
    pub choices: Vec<OptionValue>,
    /// Default value, which must be one of `choices`.
    pub default: OptionValue,
}

/// The `[recipe]` header section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeInfo {
    /// Package name (lowercase).
    pub name: PackageName,
    /// Package version.
    pub version: Version,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Settings axes this recipe consumes (e.g. `os`, `build_type`).
    #[serde(default)]
    pub settings: Vec<String>,
    /// Generators to run on install (e.g. `cmake`, `json`).
    #[serde(default)]
    pub generators: Vec<String>,
}

/// One `[[package.copy]]` staging rule.
///
/// `src` is rooted at a resolved dependency: its first path component names
/// the dependency, the remainder is a subpath of that package's store root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyRule {
    /// File-name glob (e.g. `*.h`), matched at any depth.
    pub pattern: String,
    /// Source directory, e.g. `glad/include`.
    pub src: String,
    /// Destination directory relative to the staging root, e.g. `include`.
    pub dst: String,
}

/// The `[package.info]` section: what consumers link against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackagingInfo {
    /// Link-library names exposed to consumers.
    #[serde(default)]
    pub libs: Vec<String>,
}

/// The `[package]` section: staging copy rules plus consumer info.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Packaging {
    /// Ordered copy rules executed by `quarry package`.
    #[serde(default)]
    pub copy: Vec<CopyRule>,
    /// Consumer-facing link information.
    #[serde(default)]
    pub info: PackagingInfo,
}

/// Top-level recipe parsed from a `quarry.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Identity, settings axes, and generators.
    pub recipe: RecipeInfo,
    /// Pinned dependencies: name -> exact version.
    #[serde(default)]
    pub requires: BTreeMap<PackageName, Version>,
    /// Option schema: name -> allowed values and default.
    #[serde(default)]
    pub options: BTreeMap<String, OptionSpec>,
    /// Optional packaging steps.
    #[serde(default)]
    pub package: Option<Packaging>,
}

impl Recipe {
    /// Parse a recipe from TOML text.
    pub fn parse(content: &str) -> Result<Self, RecipeError> {
        let recipe: Recipe = toml::from_str(content)?;
        Ok(recipe)
    }

    /// Load and parse a recipe from the given file path.
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// The recipe's package name.
    pub fn name(&self) -> &PackageName {
        &self.recipe.name
    }

    /// The recipe's version.
    pub fn version(&self) -> &Version {
        &self.recipe.version
    }

    /// Validate the recipe against the settings table and the generator
    /// registry.
    ///
    /// Checks: non-empty lowercase name, non-empty version, known settings
    /// axes, known generators, non-empty option choice sets with in-set
    /// defaults, and complete copy rules.
    pub fn validate(&self, table: &SettingsTable) -> Result<(), RecipeError> {
        let name = self.recipe.name.as_str();
        if name.is_empty() {
            return Err(RecipeError::Validation(
                "recipe name must not be empty".to_string(),
            ));
        }
        if name != name.to_lowercase() {
            return Err(RecipeError::Validation(format!(
                "recipe name '{name}' must be lowercase"
            )));
        }
        if self.recipe.version.as_str().is_empty() {
            return Err(RecipeError::Validation(
                "recipe version must not be empty".to_string(),
            ));
        }

        for axis in &self.recipe.settings {
            if !table.contains_axis(axis) {
                return Err(RecipeError::Validation(format!(
                    "unknown settings axis '{axis}'"
                )));
            }
        }

        for generator in &self.recipe.generators {
            if !generators::is_known(generator) {
                return Err(RecipeError::Validation(format!(
                    "unknown generator '{generator}'"
                )));
            }
        }

        for (option, spec) in &self.options {
            if spec.choices.is_empty() {
                return Err(RecipeError::Validation(format!(
                    "option '{option}' declares an empty choice set"
                )));
            }
            if !spec.choices.contains(&spec.default) {
                return Err(RecipeError::Validation(format!(
                    "default '{}' for option '{option}' is not among its choices",
                    spec.default
                )));
            }
        }

        if let Some(package) = &self.package {
            for rule in &package.copy {
                if rule.pattern.is_empty() || rule.src.is_empty() || rule.dst.is_empty() {
                    return Err(RecipeError::Validation(
                        "copy rules need pattern, src and dst".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Resolve the effective option values: declared defaults overlaid with
    /// `overrides`, each validated against the declared choice set.
    pub fn resolve_options(
        &self,
        overrides: &BTreeMap<String, OptionValue>,
    ) -> Result<BTreeMap<String, OptionValue>, RecipeError> {
        let mut resolved: BTreeMap<String, OptionValue> = self
            .options
            .iter()
            .map(|(name, spec)| (name.clone(), spec.default.clone()))
            .collect();

        for (name, value) in overrides {
            let Some(spec) = self.options.get(name) else {
                return Err(RecipeError::Validation(format!(
                    "unknown option '{name}'"
                )));
            };
            if !spec.choices.contains(value) {
                let allowed: Vec<String> =
                    spec.choices.iter().map(ToString::to_string).collect();
                return Err(RecipeError::Validation(format!(
                    "invalid value '{value}' for option '{name}' (allowed: {})",
                    allowed.join(", ")
                )));
            }
            resolved.insert(name.clone(), value.clone());
        }

        Ok(resolved)
    }
}

/// BLAKE3 revision of a recipe's exact text.
pub fn recipe_revision(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// A resolved lockfile recording exact pins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lockfile {
    /// Ordered list of locked packages (dependencies before dependents).
    #[serde(default)]
    pub package: Vec<LockPackage>,
}

/// A single entry in the lockfile representing one resolved package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockPackage {
    /// The package name as it appears in the index.
    pub name: PackageName,
    /// The exact resolved version.
    pub version: Version,
    /// Recipe revision of the store entry this resolution used.
    pub revision: String,
}

impl Lockfile {
    /// Build a lockfile from a resolved graph.
    pub fn from_graph(graph: &[ResolvedDependency]) -> Self {
        Self {
            package: graph
                .iter()
                .map(|dep| LockPackage {
                    name: dep.name.clone(),
                    version: dep.version.clone(),
                    revision: dep.revision.clone(),
                })
                .collect(),
        }
    }

    /// Load and parse a lockfile from the given file path.
    ///
    /// If the file does not exist, an empty lockfile is returned so that
    /// callers can treat the first resolution the same as subsequent ones.
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        if !path.exists() {
            return Ok(Lockfile::default());
        }
        let content = fs::read_to_string(path)?;
        let lock: Lockfile = toml::from_str(&content)?;
        Ok(lock)
    }

    /// Atomically persist this lockfile to disk at the given path.
    ///
    /// The file is first written to a temporary location and then renamed so
    /// that readers never observe a partially written lockfile.
    pub fn save(&self, path: &Path) -> Result<(), RecipeError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RecipeError::Validation(e.to_string()))?;

        let temp_path = path.with_extension("lock.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = r#"
        [recipe]
        name = "volume-viewer"
        version = "0.1"
        settings = ["os", "compiler", "build_type", "arch"]
        generators = ["cmake"]

        [requires]
        glm = "0.9.9.8"
        glad = "0.1.36"

        [options.shared]
        choices = [false, true]
        default = false

        [[package.copy]]
        pattern = "*.h"
        src = "glad/include"
        dst = "include"

        [[package.copy]]
        pattern = "*.c"
        src = "glad/src"
        dst = "src"

        [package.info]
        libs = ["glad"]
    "#;

    #[test]
    fn test_parse_canonical_recipe() {
        let recipe = Recipe::parse(CANONICAL).unwrap();
        assert_eq!(recipe.name().as_str(), "volume-viewer");
        assert_eq!(recipe.requires.len(), 2);
        assert_eq!(
            recipe.requires.get("glad").map(Version::as_str),
            Some("0.1.36")
        );
        assert_eq!(
            recipe.requires.get("glm").map(Version::as_str),
            Some("0.9.9.8")
        );
        let package = recipe.package.as_ref().unwrap();
        assert_eq!(package.copy.len(), 2);
        assert_eq!(package.info.libs, vec!["glad"]);
        recipe.validate(&SettingsTable::builtin()).unwrap();
    }

    #[test]
    fn test_default_must_be_among_choices() {
        let recipe = Recipe::parse(
            r#"
            [recipe]
            name = "x"
            version = "1.0"

            [options.shared]
            choices = [false, true]
            default = "maybe"
            "#,
        )
        .unwrap();
        let err = recipe.validate(&SettingsTable::builtin()).unwrap_err();
        assert!(err.to_string().contains("shared"));
    }

    #[test]
    fn test_unknown_settings_axis_rejected() {
        let recipe = Recipe::parse(
            r#"
            [recipe]
            name = "x"
            version = "1.0"
            settings = ["flavor"]
            "#,
        )
        .unwrap();
        let err = recipe.validate(&SettingsTable::builtin()).unwrap_err();
        assert!(err.to_string().contains("flavor"));
    }

    #[test]
    fn test_unknown_generator_rejected() {
        let recipe = Recipe::parse(
            r#"
            [recipe]
            name = "x"
            version = "1.0"
            generators = ["ninja-turtle"]
            "#,
        )
        .unwrap();
        assert!(recipe.validate(&SettingsTable::builtin()).is_err());
    }

    #[test]
    fn test_resolve_options_defaults_and_overrides() {
        let recipe = Recipe::parse(CANONICAL).unwrap();

        let resolved = recipe.resolve_options(&BTreeMap::new()).unwrap();
        assert_eq!(resolved.get("shared"), Some(&OptionValue::Bool(false)));

        let mut overrides = BTreeMap::new();
        overrides.insert("shared".to_string(), OptionValue::Bool(true));
        let resolved = recipe.resolve_options(&overrides).unwrap();
        assert_eq!(resolved.get("shared"), Some(&OptionValue::Bool(true)));
    }

    #[test]
    fn test_resolve_options_rejects_out_of_set_value() {
        let recipe = Recipe::parse(CANONICAL).unwrap();
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "shared".to_string(),
            OptionValue::Str("maybe".to_string()),
        );
        let err = recipe.resolve_options(&overrides).unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_resolve_options_rejects_unknown_option() {
        let recipe = Recipe::parse(CANONICAL).unwrap();
        let mut overrides = BTreeMap::new();
        overrides.insert("fpic".to_string(), OptionValue::Bool(true));
        assert!(recipe.resolve_options(&overrides).is_err());
    }

    #[test]
    fn test_option_value_parse_cli() {
        assert_eq!(OptionValue::parse_cli("true"), OptionValue::Bool(true));
        assert_eq!(OptionValue::parse_cli("false"), OptionValue::Bool(false));
        assert_eq!(
            OptionValue::parse_cli("libc++"),
            OptionValue::Str("libc++".to_string())
        );
    }

    #[test]
    fn test_revision_is_stable() {
        assert_eq!(recipe_revision(CANONICAL), recipe_revision(CANONICAL));
        assert_ne!(recipe_revision(CANONICAL), recipe_revision("other"));
    }

    #[test]
    fn test_lockfile_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quarry.lock");

        let lock = Lockfile {
            package: vec![LockPackage {
                name: PackageName::new("glad"),
                version: Version::new("0.1.36"),
                revision: "abc".to_string(),
            }],
        };
        lock.save(&path).unwrap();

        let loaded = Lockfile::load(&path).unwrap();
        assert_eq!(loaded, lock);

        // Missing file loads as empty
        let empty = Lockfile::load(&dir.path().join("missing.lock")).unwrap();
        assert!(empty.package.is_empty());
    }
}
