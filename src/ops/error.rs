//! Domain-specific errors for recipe operations

use thiserror::Error;

use crate::core::index::IndexError;
use crate::core::manifest::RecipeError;
use crate::core::resolver::ResolveError;
use crate::core::settings::SettingsError;
use crate::io::generators::GeneratorError;
use crate::io::stage::StageError;

/// Failure of an install/package operation, covering the whole pipeline.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    #[error("Configuration failed: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to resolve dependencies: {0}")]
    Resolution(#[from] ResolveError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Generator failed: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Staging failed: {0}")]
    Stage(#[from] StageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lockfile check failed: {0}")]
    Frozen(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for InstallError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
