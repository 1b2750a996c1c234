//! Build-system integration file generation.
//!
//! Each generator named by a recipe emits one file into the output
//! directory describing the resolved dependency graph to a downstream
//! build system. Emission is idempotent: re-running with identical inputs
//! rewrites identical files.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::manifest::OptionValue;
use crate::core::resolver::ResolvedDependency;
use crate::core::settings::Settings;

/// Names of all known generators.
pub const GENERATORS: &[&str] = &["cmake", "json"];

/// Whether `name` is a known generator.
pub fn is_known(name: &str) -> bool {
    GENERATORS.contains(&name)
}

/// Errors raised while emitting generator files.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Unknown generator '{0}'")]
    Unknown(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Per-package slice of the build info.
#[derive(Debug, Clone, Serialize)]
pub struct PackageBuildInfo {
    /// Package name.
    pub name: String,
    /// Resolved version.
    pub version: String,
    /// Store root of the package tree.
    pub root: PathBuf,
    /// Header directories (present on disk).
    pub include_dirs: Vec<PathBuf>,
    /// Library directories (present on disk).
    pub lib_dirs: Vec<PathBuf>,
    /// Link-library names.
    pub libs: Vec<String>,
}

/// Aggregated view of the resolved graph handed to generators.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    /// Settings selection of the invocation.
    pub settings: BTreeMap<String, String>,
    /// Effective option values of the invocation.
    pub options: BTreeMap<String, OptionValue>,
    /// All include directories, in installation order.
    pub include_dirs: Vec<PathBuf>,
    /// All library directories, in installation order.
    pub lib_dirs: Vec<PathBuf>,
    /// All link-library names, in installation order.
    pub libs: Vec<String>,
    /// Per-package breakdown.
    pub packages: Vec<PackageBuildInfo>,
}

impl BuildInfo {
    /// Build the aggregate view from a resolved graph.
    pub fn from_graph(
        graph: &[ResolvedDependency],
        settings: &Settings,
        options: &BTreeMap<String, OptionValue>,
    ) -> Self {
        let packages: Vec<PackageBuildInfo> = graph
            .iter()
            .map(|dep| PackageBuildInfo {
                name: dep.name.as_str().to_string(),
                version: dep.version.as_str().to_string(),
                root: dep.root.clone(),
                include_dirs: dep.include_dir().into_iter().collect(),
                lib_dirs: dep.lib_dir().into_iter().collect(),
                libs: dep.libs.clone(),
            })
            .collect();

        Self {
            settings: settings.values().clone(),
            options: options.clone(),
            include_dirs: packages
                .iter()
                .flat_map(|p| p.include_dirs.iter().cloned())
                .collect(),
            lib_dirs: packages
                .iter()
                .flat_map(|p| p.lib_dirs.iter().cloned())
                .collect(),
            libs: packages
                .iter()
                .flat_map(|p| p.libs.iter().cloned())
                .collect(),
            packages,
        }
    }
}

trait Generator {
    /// File name this generator writes.
    fn filename(&self) -> &'static str;

    /// Render the file contents.
    fn render(&self, info: &BuildInfo) -> Result<String, GeneratorError>;
}

fn for_name(name: &str) -> Option<Box<dyn Generator>> {
    match name {
        "cmake" => Some(Box::new(CmakeGenerator)),
        "json" => Some(Box::new(JsonGenerator)),
        _ => None,
    }
}

/// Run every generator in `names`, writing into `out_dir`.
///
/// Returns the paths of the written files, one per generator.
pub fn emit(
    names: &[String],
    info: &BuildInfo,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, GeneratorError> {
    fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(names.len());
    for name in names {
        let generator =
            for_name(name).ok_or_else(|| GeneratorError::Unknown(name.to_string()))?;
        let content = generator.render(info)?;
        let path = out_dir.join(generator.filename());
        fs::write(&path, content)?;
        debug!(generator = %name, path = %path.display(), "emitted generator file");
        written.push(path);
    }

    Ok(written)
}

/// Emits `quarry_deps.cmake`, a CMake include file with aggregate and
/// per-package variables.
struct CmakeGenerator;

impl Generator for CmakeGenerator {
    fn filename(&self) -> &'static str {
        "quarry_deps.cmake"
    }

    fn render(&self, info: &BuildInfo) -> Result<String, GeneratorError> {
        let mut out = String::new();
        writeln!(out, "# Generated by quarry - do not edit.")?;
        writeln!(out)?;
        writeln!(out, "set(QUARRY_INCLUDE_DIRS \"{}\")", cmake_list(&info.include_dirs))?;
        writeln!(out, "set(QUARRY_LIB_DIRS \"{}\")", cmake_list(&info.lib_dirs))?;
        writeln!(out, "set(QUARRY_LIBS \"{}\")", info.libs.join(";"))?;

        if let Some(build_type) = info.settings.get("build_type") {
            writeln!(out, "set(QUARRY_BUILD_TYPE \"{build_type}\")")?;
        }
        if let Some(OptionValue::Bool(shared)) = info.options.get("shared") {
            writeln!(out, "set(QUARRY_SHARED {})", if *shared { "ON" } else { "OFF" })?;
        }

        for package in &info.packages {
            let var = cmake_var(&package.name);
            writeln!(out)?;
            writeln!(out, "set(QUARRY_{var}_VERSION \"{}\")", package.version)?;
            writeln!(out, "set(QUARRY_{var}_ROOT \"{}\")", package.root.display())?;
            writeln!(
                out,
                "set(QUARRY_{var}_INCLUDE_DIRS \"{}\")",
                cmake_list(&package.include_dirs)
            )?;
            writeln!(
                out,
                "set(QUARRY_{var}_LIB_DIRS \"{}\")",
                cmake_list(&package.lib_dirs)
            )?;
            writeln!(out, "set(QUARRY_{var}_LIBS \"{}\")", package.libs.join(";"))?;
        }

        Ok(out)
    }
}

/// Emits `quarry_deps.json`, the build info serialized as JSON.
struct JsonGenerator;

impl Generator for JsonGenerator {
    fn filename(&self) -> &'static str {
        "quarry_deps.json"
    }

    fn render(&self, info: &BuildInfo) -> Result<String, GeneratorError> {
        let mut content = serde_json::to_string_pretty(info)?;
        content.push('\n');
        Ok(content)
    }
}

/// CMake list: semicolon-separated.
fn cmake_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// CMake variable fragment: uppercased, non-alphanumerics become `_`.
fn cmake_var(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PackageName, Version};
    use std::fs;
    use tempfile::TempDir;

    fn fake_graph(store: &Path) -> Vec<ResolvedDependency> {
        let glad_root = store.join("glad").join("0.1.36");
        fs::create_dir_all(glad_root.join("include")).unwrap();
        fs::create_dir_all(glad_root.join("lib")).unwrap();

        let glm_root = store.join("glm").join("0.9.9.8");
        fs::create_dir_all(glm_root.join("include")).unwrap();

        vec![
            ResolvedDependency {
                name: PackageName::new("glad"),
                version: Version::new("0.1.36"),
                revision: "r1".into(),
                root: glad_root,
                libs: vec!["glad".into()],
            },
            ResolvedDependency {
                name: PackageName::new("glm"),
                version: Version::new("0.9.9.8"),
                revision: "r2".into(),
                root: glm_root,
                libs: vec![],
            },
        ]
    }

    fn build_info(store: &Path) -> BuildInfo {
        let mut settings = Settings::default();
        settings.set("build_type", "Release");
        let mut options = BTreeMap::new();
        options.insert("shared".to_string(), OptionValue::Bool(false));
        BuildInfo::from_graph(&fake_graph(store), &settings, &options)
    }

    #[test]
    fn test_build_info_aggregation() {
        let dir = TempDir::new().unwrap();
        let info = build_info(dir.path());

        assert_eq!(info.packages.len(), 2);
        assert_eq!(info.include_dirs.len(), 2);
        assert_eq!(info.lib_dirs.len(), 1); // glm ships no lib dir
        assert_eq!(info.libs, vec!["glad"]);
    }

    #[test]
    fn test_cmake_generator() {
        let dir = TempDir::new().unwrap();
        let info = build_info(dir.path());

        let content = CmakeGenerator.render(&info).unwrap();
        assert!(content.contains("set(QUARRY_LIBS \"glad\")"));
        assert!(content.contains("set(QUARRY_BUILD_TYPE \"Release\")"));
        assert!(content.contains("set(QUARRY_SHARED OFF)"));
        assert!(content.contains("set(QUARRY_GLAD_VERSION \"0.1.36\")"));
        assert!(content.contains("set(QUARRY_GLM_ROOT"));
    }

    #[test]
    fn test_json_generator_roundtrips() {
        let dir = TempDir::new().unwrap();
        let info = build_info(dir.path());

        let content = JsonGenerator.render(&info).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["libs"][0], "glad");
        assert_eq!(value["packages"][0]["name"], "glad");
        assert_eq!(value["options"]["shared"], false);
    }

    #[test]
    fn test_emit_writes_files_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("build");
        let info = build_info(dir.path());
        let names = vec!["cmake".to_string(), "json".to_string()];

        let first = emit(&names, &info, &out).unwrap();
        assert_eq!(first.len(), 2);
        assert!(out.join("quarry_deps.cmake").exists());

        let bytes = fs::read(out.join("quarry_deps.cmake")).unwrap();
        let second = emit(&names, &info, &out).unwrap();
        assert_eq!(first, second);
        assert_eq!(bytes, fs::read(out.join("quarry_deps.cmake")).unwrap());
    }

    #[test]
    fn test_unknown_generator() {
        let dir = TempDir::new().unwrap();
        let info = build_info(dir.path());
        let err = emit(&["ninja-turtle".to_string()], &info, dir.path()).unwrap_err();
        assert!(matches!(err, GeneratorError::Unknown(_)));
    }

    #[test]
    fn test_cmake_var() {
        assert_eq!(cmake_var("glad"), "GLAD");
        assert_eq!(cmake_var("my-lib"), "MY_LIB");
    }
}
