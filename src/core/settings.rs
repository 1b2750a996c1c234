//! Build-setting axes and concrete selections.
//!
//! The tool owns the table of valid axes and their allowed values. A recipe
//! declares which axes it consumes; an invocation supplies a concrete
//! selection assembled from host detection, an optional profile file, and
//! `-s key=value` overrides, which is then validated against the table.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::manifest::OptionValue;

/// Errors raised while assembling or validating a settings selection.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown settings axis '{0}'")]
    UnknownAxis(String),

    #[error("Invalid value '{value}' for settings axis '{axis}' (allowed: {allowed})")]
    InvalidValue {
        axis: String,
        value: String,
        allowed: String,
    },

    #[error("Recipe consumes settings axis '{0}' but no value was provided")]
    MissingAxis(String),

    #[error("Malformed assignment '{0}', expected key=value")]
    Malformed(String),
}

/// The table of valid settings axes and their allowed values.
#[derive(Debug, Clone)]
pub struct SettingsTable {
    axes: BTreeMap<String, Vec<String>>,
}

impl SettingsTable {
    /// The built-in axes: `os`, `compiler`, `build_type`, `arch`.
    pub fn builtin() -> Self {
        let mut axes = BTreeMap::new();
        axes.insert(
            "os".to_string(),
            vec!["Linux".into(), "Macos".into(), "Windows".into(), "FreeBSD".into()],
        );
        axes.insert(
            "compiler".to_string(),
            vec!["gcc".into(), "clang".into(), "apple-clang".into(), "msvc".into()],
        );
        axes.insert(
            "build_type".to_string(),
            vec![
                "Debug".into(),
                "Release".into(),
                "RelWithDebInfo".into(),
                "MinSizeRel".into(),
            ],
        );
        axes.insert(
            "arch".to_string(),
            vec!["x86_64".into(), "armv8".into(), "x86".into(), "wasm".into()],
        );
        Self { axes }
    }

    /// Whether `axis` is a known settings axis.
    pub fn contains_axis(&self, axis: &str) -> bool {
        self.axes.contains_key(axis)
    }

    /// Allowed values for `axis`, if it exists.
    pub fn allowed(&self, axis: &str) -> Option<&[String]> {
        self.axes.get(axis).map(Vec::as_slice)
    }

    /// Validate a single axis/value pair against the table.
    pub fn check(&self, axis: &str, value: &str) -> Result<(), SettingsError> {
        let Some(allowed) = self.axes.get(axis) else {
            return Err(SettingsError::UnknownAxis(axis.to_string()));
        };
        if !allowed.iter().any(|v| v == value) {
            return Err(SettingsError::InvalidValue {
                axis: axis.to_string(),
                value: value.to_string(),
                allowed: allowed.join(", "),
            });
        }
        Ok(())
    }
}

impl Default for SettingsTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A concrete settings selection (axis -> value).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Detect a selection from the running host.
    ///
    /// Axes that cannot be mapped to a known value are left unset and caught
    /// later by [`Settings::validate`] if the recipe consumes them.
    pub fn detect() -> Self {
        let mut settings = Self::default();
        if let Some(os) = host_os() {
            settings.set("os", os);
        }
        if let Some(arch) = host_arch() {
            settings.set("arch", arch);
        }
        let compiler = match settings.get("os") {
            Some("Macos") => "apple-clang",
            Some("Windows") => "msvc",
            _ => "gcc",
        };
        settings.set("compiler", compiler);
        settings.set("build_type", "Release");
        settings
    }

    /// Set one axis value, replacing any previous value.
    pub fn set(&mut self, axis: impl Into<String>, value: impl Into<String>) {
        self.values.insert(axis.into(), value.into());
    }

    /// Value of one axis, if set.
    pub fn get(&self, axis: &str) -> Option<&str> {
        self.values.get(axis).map(String::as_str)
    }

    /// All axis/value pairs, sorted by axis.
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Validate every set value against the table, and require a value for
    /// every axis in `required`.
    pub fn validate(&self, table: &SettingsTable, required: &[String]) -> Result<(), SettingsError> {
        for (axis, value) in &self.values {
            table.check(axis, value)?;
        }
        for axis in required {
            if !table.contains_axis(axis) {
                return Err(SettingsError::UnknownAxis(axis.clone()));
            }
            if !self.values.contains_key(axis) {
                return Err(SettingsError::MissingAxis(axis.clone()));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (axis, value) in &self.values {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{axis}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// A settings profile file: `[settings]` and `[options]` sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Axis values applied on top of host detection.
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    /// Option values applied before command-line overrides.
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
}

impl Profile {
    /// Load and parse a profile from the given file path.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        let profile: Profile = toml::from_str(&content)?;
        Ok(profile)
    }
}

/// Parse a `key=value` command-line assignment.
pub fn parse_assignment(raw: &str) -> Result<(String, String), SettingsError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() && !value.is_empty() => {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(SettingsError::Malformed(raw.to_string())),
    }
}

fn host_os() -> Option<&'static str> {
    match std::env::consts::OS {
        "linux" => Some("Linux"),
        "macos" => Some("Macos"),
        "windows" => Some("Windows"),
        "freebsd" => Some("FreeBSD"),
        _ => None,
    }
}

fn host_arch() -> Option<&'static str> {
    match std::env::consts::ARCH {
        "x86_64" => Some("x86_64"),
        "aarch64" => Some("armv8"),
        "x86" => Some("x86"),
        "wasm32" => Some("wasm"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = SettingsTable::builtin();
        assert!(table.contains_axis("os"));
        assert!(table.contains_axis("build_type"));
        assert!(table.check("os", "Linux").is_ok());
        assert!(table.check("os", "Amiga").is_err());
        assert!(table.check("flavor", "vanilla").is_err());
    }

    #[test]
    fn test_detect_covers_core_axes() {
        let settings = Settings::detect();
        assert_eq!(settings.get("build_type"), Some("Release"));
        assert!(settings.get("compiler").is_some());
    }

    #[test]
    fn test_validate_rejects_invalid_value() {
        let table = SettingsTable::builtin();
        let mut settings = Settings::default();
        settings.set("build_type", "Fastest");
        let err = settings.validate(&table, &[]).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
    }

    #[test]
    fn test_validate_requires_declared_axes() {
        let table = SettingsTable::builtin();
        let settings = Settings::default();
        let err = settings
            .validate(&table, &["build_type".to_string()])
            .unwrap_err();
        assert!(matches!(err, SettingsError::MissingAxis(_)));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("os=Linux").unwrap(),
            ("os".to_string(), "Linux".to_string())
        );
        assert!(parse_assignment("os").is_err());
        assert!(parse_assignment("=Linux").is_err());
        assert!(parse_assignment("os=").is_err());
    }

    #[test]
    fn test_profile_parse() {
        let profile: Profile = toml::from_str(
            r#"
            [settings]
            os = "Linux"
            build_type = "Debug"

            [options]
            shared = true
            "#,
        )
        .unwrap();
        assert_eq!(profile.settings.get("os"), Some(&"Linux".to_string()));
        assert_eq!(
            profile.options.get("shared"),
            Some(&OptionValue::Bool(true))
        );
    }
}
