//! quarry - a recipe-driven build-dependency manager
//!
//! Native projects declare their pinned dependencies, build-setting axes,
//! binary-shape options, and generators in a `quarry.toml` recipe. Resolving
//! the recipe against the local package index yields a dependency graph,
//! build-system integration files, and (for packaging recipes) a staged
//! install tree plus a link-library list.
//!
//! # Architecture
//!
//! - **Recipe model**: `quarry.toml` is parsed into [`Recipe`] and validated
//!   up front; option defaults must lie inside their declared choice sets and
//!   every settings axis must be known to the [`crate::core::settings::SettingsTable`].
//! - **Index + store**: exported packages live under `~/.quarry/store` and are
//!   looked up through a sorted binary index (`~/.quarry/index.bin`).
//! - **Newtypes**: [`PackageName`] and [`Version`] provide type-safe
//!   identifiers.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.quarry/
//! ├── store/      # Exported package trees by name/version
//! ├── profiles/   # Named settings profiles
//! └── index.bin   # Binary package index
//! ```

pub mod core;
pub mod io;
pub mod ops;
pub mod types;

// Re-exports for convenience
pub use crate::core::index;
pub use crate::core::manifest::{Lockfile, Recipe};
pub use crate::core::resolver;
pub use crate::core::settings::Settings;
pub use crate::types::{PackageName, Version};

use dirs::home_dir;
use std::path::PathBuf;

/// File name of a project recipe.
pub const RECIPE_FILE: &str = "quarry.toml";

/// File name of the resolution lockfile written next to a recipe.
pub const LOCK_FILE: &str = "quarry.lock";

/// Returns the primary configuration directory, or None if the user's home cannot be resolved.
pub fn try_quarry_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("QUARRY_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".quarry"))
}

/// Returns the canonical quarry home directory (`~/.quarry`).
///
/// # Panics
///
/// Panics if neither `QUARRY_HOME` is set nor the user's home directory can
/// be resolved.
pub fn quarry_home() -> PathBuf {
    try_quarry_home().expect("Could not determine home directory. Set QUARRY_HOME to override.")
}

/// Package store path: ~/.quarry/store
pub fn store_path() -> PathBuf {
    quarry_home().join("store")
}

/// Binary package index path: ~/.quarry/index.bin
pub fn index_path() -> PathBuf {
    quarry_home().join("index.bin")
}

/// Named settings profiles directory: ~/.quarry/profiles
pub fn profiles_dir() -> PathBuf {
    quarry_home().join("profiles")
}

/// Store location of one exported package version.
pub fn package_store_path(name: &PackageName, version: &Version) -> PathBuf {
    store_path().join(name.as_str()).join(version.as_str())
}
