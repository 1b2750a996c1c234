//! Type-safe identifiers shared across the crate.

pub mod package;

pub use package::{PackageName, Version};
