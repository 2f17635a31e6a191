//! CLI subcommands — init, validate, plan, build, dot.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::catalog::{self, command, Catalog};
use crate::core::registry::IndexRegistry;
use crate::core::types::PlanStep;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the built-in variation-graph catalog to a new project
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate a catalog without building anything
    Validate {
        /// Path to the catalog file
        #[arg(short, long, default_value = "indizar.yaml")]
        file: PathBuf,
    },

    /// Show the build plan for targets without executing it
    Plan {
        /// Path to the catalog file
        #[arg(short, long, default_value = "indizar.yaml")]
        file: PathBuf,

        /// Target artifacts (default: the catalog's targets)
        targets: Vec<String>,
    },

    /// Build targets and clean up intermediate files
    Build {
        /// Path to the catalog file
        #[arg(short, long, default_value = "indizar.yaml")]
        file: PathBuf,

        /// Target artifacts (default: the catalog's targets)
        targets: Vec<String>,

        /// Override the catalog's output prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Keep intermediate files under the output prefix
        #[arg(long)]
        keep_intermediates: bool,

        /// Directory for intermediate files
        #[arg(long)]
        temp_dir: Option<PathBuf>,
    },

    /// Emit the recipe graph as Graphviz dot
    Dot {
        /// Path to the catalog file
        #[arg(short, long, default_value = "indizar.yaml")]
        file: PathBuf,

        /// Highlight the plan for these targets
        targets: Vec<String>,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Plan { file, targets } => cmd_plan(&file, targets),
        Commands::Build {
            file,
            targets,
            prefix,
            keep_intermediates,
            temp_dir,
        } => cmd_build(&file, targets, prefix.as_deref(), keep_intermediates, temp_dir.as_deref()),
        Commands::Dot { file, targets } => cmd_dot(&file, targets),
    }
}

/// Parse and validate a catalog file, printing errors if invalid.
fn parse_and_validate(file: &Path) -> Result<Catalog, String> {
    let catalog = catalog::parse_catalog_file(file)?;
    let errors = catalog::validate_catalog(&catalog);
    if errors.is_empty() {
        return Ok(catalog);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(format!("{} validation error(s)", errors.len()))
}

/// CLI targets if given, else the catalog's default targets.
fn resolve_targets(catalog: &Catalog, cli_targets: Vec<String>) -> Result<Vec<String>, String> {
    let targets = if cli_targets.is_empty() {
        catalog.targets.clone()
    } else {
        cli_targets
    };
    if targets.is_empty() {
        return Err("no targets: pass them on the command line or set `targets:` in the catalog".to_string());
    }
    Ok(targets)
}

fn cmd_init(path: &Path) -> Result<(), String> {
    let catalog_path = path.join("indizar.yaml");
    if catalog_path.exists() {
        return Err(format!("{} already exists", catalog_path.display()));
    }
    std::fs::create_dir_all(path).map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    std::fs::write(&catalog_path, catalog::presets::VG_CATALOG_YAML)
        .map_err(|e| format!("cannot write {}: {}", catalog_path.display(), e))?;

    println!("Initialized indizar project at {}", path.display());
    println!("  Created: {}", catalog_path.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let catalog = parse_and_validate(file)?;
    println!(
        "OK: {} ({} artifacts, {} recipes, {} provided)",
        catalog.name,
        catalog.artifacts.len(),
        catalog.recipes.len(),
        catalog.provide.len()
    );
    Ok(())
}

fn cmd_plan(file: &Path, cli_targets: Vec<String>) -> Result<(), String> {
    let catalog = parse_and_validate(file)?;
    let targets = resolve_targets(&catalog, cli_targets)?;
    let registry = command::instantiate(&catalog).map_err(|e| e.to_string())?;
    let plan = registry.make_plan(&targets).map_err(|e| e.to_string())?;

    print_plan(&registry, &targets, &plan);
    Ok(())
}

/// Display a plan to stdout.
fn print_plan(registry: &IndexRegistry, targets: &[String], plan: &[PlanStep]) {
    println!("Plan for {}:", targets.join(", "));
    println!();
    if plan.is_empty() {
        println!("  nothing to build — all targets are already provided");
        return;
    }
    for (i, step) in plan.iter().enumerate() {
        let artifact = registry
            .get(&step.identifier)
            .expect("plan steps name registered artifacts");
        let inputs = artifact.recipes()[step.recipe].inputs().join(", ");
        if inputs.is_empty() {
            println!("  {}. {} (recipe {})", i + 1, step.identifier, step.recipe);
        } else {
            println!(
                "  {}. {} (recipe {} <- {})",
                i + 1,
                step.identifier,
                step.recipe,
                inputs
            );
        }
    }
    println!();
    println!(
        "Plan: {} step(s), {} artifact(s) already provided.",
        plan.len(),
        registry.completed_artifacts().len()
    );
}

fn cmd_build(
    file: &Path,
    cli_targets: Vec<String>,
    prefix: Option<&str>,
    keep_intermediates: bool,
    temp_dir: Option<&Path>,
) -> Result<(), String> {
    let catalog = parse_and_validate(file)?;
    let targets = resolve_targets(&catalog, cli_targets)?;
    let mut registry = command::instantiate(&catalog).map_err(|e| e.to_string())?;
    if let Some(prefix) = prefix {
        registry.set_output_prefix(prefix);
    }
    if keep_intermediates {
        registry.set_keep_intermediates(true);
    }
    if let Some(dir) = temp_dir {
        registry.set_temp_dir(dir);
    }

    let report = registry.make_indexes(&targets).map_err(|e| e.to_string())?;

    for identifier in &report.built {
        let artifact = registry
            .get(identifier)
            .expect("report lists registered artifacts");
        println!("built {}: {}", identifier, artifact.filenames().join(", "));
    }
    println!();
    println!(
        "Build complete: {} built, {} file(s) kept, {} intermediate file(s) removed.",
        report.built.len(),
        report.kept.len(),
        report.removed.len()
    );
    Ok(())
}

fn cmd_dot(file: &Path, targets: Vec<String>) -> Result<(), String> {
    let catalog = parse_and_validate(file)?;
    let registry = command::instantiate(&catalog).map_err(|e| e.to_string())?;
    let dot = registry.to_dot(&targets).map_err(|e| e.to_string())?;
    print!("{}", dot);
    Ok(())
}
