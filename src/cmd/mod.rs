//! CLI command implementations.

pub mod completions;
pub mod export;
pub mod info;
pub mod install;
pub mod list;
pub mod package;
pub mod remove;
pub mod search;
