//! Install orchestration: recipe -> settings/options -> graph -> generators.
//!
//! `resolve_context` performs the read-only half of the pipeline shared by
//! `install`, `package`, and `info`; `install` and `stage_package` add the
//! filesystem-writing halves.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::index::PackageIndex;
use crate::core::manifest::{self, Lockfile, OptionValue, Recipe};
use crate::core::resolver::{self, ResolvedDependency};
use crate::core::settings::{Profile, Settings, SettingsTable};
use crate::io::generators::{self, BuildInfo};
use crate::io::stage::{self, StagedRule};
use crate::ops::InstallError;

/// Inputs of one install/package invocation.
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    /// Directory containing `quarry.toml`.
    pub recipe_dir: PathBuf,
    /// Directory for generated files (defaults to the recipe directory).
    pub out_dir: Option<PathBuf>,
    /// Optional settings profile file.
    pub profile: Option<PathBuf>,
    /// `-s key=value` settings overrides.
    pub settings: Vec<(String, String)>,
    /// `-o key=value` option overrides.
    pub options: Vec<(String, OptionValue)>,
    /// Fail if the lockfile is missing or out of sync.
    pub frozen: bool,
    /// Resolve and report without writing files.
    pub dry_run: bool,
}

/// Fully resolved invocation context shared by install/package/info.
#[derive(Debug)]
pub struct ResolvedContext {
    /// The validated recipe.
    pub recipe: Recipe,
    /// Revision of the recipe text.
    pub revision: String,
    /// Validated settings selection.
    pub settings: Settings,
    /// Effective option values.
    pub options: BTreeMap<String, OptionValue>,
    /// Resolved dependencies in installation order.
    pub graph: Vec<ResolvedDependency>,
}

/// Load, validate, and resolve a recipe without touching the filesystem
/// beyond reads.
pub fn resolve_context(req: &InstallRequest) -> Result<ResolvedContext, InstallError> {
    let table = SettingsTable::builtin();

    let recipe_path = req.recipe_dir.join(crate::RECIPE_FILE);
    let content = fs::read_to_string(&recipe_path)?;
    let recipe = Recipe::parse(&content)?;
    recipe.validate(&table)?;
    let revision = manifest::recipe_revision(&content);

    let mut settings = Settings::detect();
    let mut option_overrides: BTreeMap<String, OptionValue> = BTreeMap::new();
    if let Some(path) = &req.profile {
        let profile = Profile::load(path)?;
        for (axis, value) in profile.settings {
            settings.set(axis, value);
        }
        option_overrides.extend(profile.options);
    }
    for (axis, value) in &req.settings {
        settings.set(axis.clone(), value.clone());
    }
    settings.validate(&table, &recipe.recipe.settings)?;

    for (name, value) in &req.options {
        option_overrides.insert(name.clone(), value.clone());
    }
    let options = recipe.resolve_options(&option_overrides)?;

    let index = PackageIndex::load_or_default(&crate::index_path())?;
    let graph = resolver::resolve(&recipe.requires, &index, &crate::store_path())?;
    debug!(deps = graph.len(), recipe = %recipe.name(), "resolved dependency graph");

    Ok(ResolvedContext {
        recipe,
        revision,
        settings,
        options,
        graph,
    })
}

/// Outcome of a completed install.
#[derive(Debug)]
pub struct InstallOutcome {
    /// The resolved context the install ran against.
    pub ctx: ResolvedContext,
    /// Paths of the emitted generator files.
    pub generated: Vec<PathBuf>,
    /// Path of the written (or verified) lockfile.
    pub lockfile: PathBuf,
}

/// Resolve a recipe, emit its generator files, and write the lockfile.
pub fn install(req: &InstallRequest) -> Result<InstallOutcome, InstallError> {
    let ctx = resolve_context(req)?;

    let lock = Lockfile::from_graph(&ctx.graph);
    let lock_path = req.recipe_dir.join(crate::LOCK_FILE);
    if req.frozen {
        let existing = Lockfile::load(&lock_path)?;
        if existing != lock {
            return Err(InstallError::Frozen(format!(
                "{} does not match the resolved graph",
                lock_path.display()
            )));
        }
    }

    if req.dry_run {
        return Ok(InstallOutcome {
            ctx,
            generated: Vec::new(),
            lockfile: lock_path,
        });
    }

    let out_dir = req
        .out_dir
        .clone()
        .unwrap_or_else(|| req.recipe_dir.clone());
    let build_info = BuildInfo::from_graph(&ctx.graph, &ctx.settings, &ctx.options);
    let generated = generators::emit(&ctx.recipe.recipe.generators, &build_info, &out_dir)?;

    lock.save(&lock_path)?;
    info!(
        recipe = %ctx.recipe.name(),
        deps = ctx.graph.len(),
        generated = generated.len(),
        "install complete"
    );

    Ok(InstallOutcome {
        ctx,
        generated,
        lockfile: lock_path,
    })
}

/// Outcome of a completed packaging run.
#[derive(Debug)]
pub struct StageOutcome {
    /// Per-rule staging report.
    pub staged: Vec<StagedRule>,
    /// Link-library names the recipe exposes to consumers.
    pub libs: Vec<String>,
    /// Root of the staged tree.
    pub staging_dir: PathBuf,
}

/// Resolve a recipe and execute its packaging copy rules.
pub fn stage_package(
    req: &InstallRequest,
    staging_dir: Option<PathBuf>,
) -> Result<StageOutcome, InstallError> {
    let ctx = resolve_context(req)?;

    let Some(packaging) = &ctx.recipe.package else {
        return Err(InstallError::Other(format!(
            "recipe '{}' has no [package] section",
            ctx.recipe.name()
        )));
    };

    let staging_dir = staging_dir.unwrap_or_else(|| req.recipe_dir.join("package"));
    let staged = stage::stage(&packaging.copy, &ctx.graph, &staging_dir)?;
    info!(
        recipe = %ctx.recipe.name(),
        rules = staged.len(),
        "packaging staged"
    );

    Ok(StageOutcome {
        staged,
        libs: packaging.info.libs.clone(),
        staging_dir,
    })
}
