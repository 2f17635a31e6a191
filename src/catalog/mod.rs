//! YAML catalog — declarative artifacts, shell-command recipes, provided
//! inputs, and build options.
//!
//! A catalog is the CLI's front door to the registry. Artifact declarations
//! carry filename suffixes; recipes declare an output, ordered inputs, and a
//! shell command template expanded at execution time (see [`command`]).

pub mod command;
pub mod presets;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root catalog file (`indizar.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Human-readable catalog name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Artifact declarations (order-preserving; order defines registration)
    pub artifacts: IndexMap<String, ArtifactDecl>,

    /// Recipe declarations; order per output defines priority
    #[serde(default)]
    pub recipes: Vec<RecipeDecl>,

    /// Directly-provided input files per artifact
    #[serde(default)]
    pub provide: IndexMap<String, Vec<String>>,

    /// Default build targets
    #[serde(default)]
    pub targets: Vec<String>,

    /// Prefix for kept output files
    #[serde(default)]
    pub output_prefix: Option<String>,

    /// Keep intermediate files under the output prefix
    #[serde(default)]
    pub keep_intermediates: bool,
}

/// A declared artifact slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactDecl {
    /// Unique filename suffix
    pub suffix: String,
}

/// A declared recipe: a shell command producing one artifact from others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDecl {
    /// Output artifact identifier
    pub output: String,

    /// Input artifact identifiers, in the order templates reference them
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Shell command template (`{{inputs.N}}`, `{{output}}`, `{{prefix}}`,
    /// `{{suffix}}`)
    pub command: String,

    /// Produced filename templates; defaults to the primary
    /// `{{prefix}}.{{suffix}}`
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn error(message: String) -> ValidationError {
    ValidationError { message }
}

/// Parse a catalog file from disk.
pub fn parse_catalog_file(path: &Path) -> Result<Catalog, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_catalog(&content)
}

/// Parse a catalog from a YAML string.
pub fn parse_catalog(yaml: &str) -> Result<Catalog, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Validate a parsed catalog. Returns a list of errors (empty = valid).
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if catalog.version != "1.0" {
        errors.push(error(format!(
            "version must be \"1.0\", got \"{}\"",
            catalog.version
        )));
    }

    if catalog.name.is_empty() {
        errors.push(error("name must not be empty".to_string()));
    }

    for (id, decl) in &catalog.artifacts {
        if id.is_empty() {
            errors.push(error("artifact identifiers must not be empty".to_string()));
        }
        if decl.suffix.is_empty() {
            errors.push(error(format!("artifact '{}' has an empty suffix", id)));
        }
    }

    for (i, recipe) in catalog.recipes.iter().enumerate() {
        if !catalog.artifacts.contains_key(&recipe.output) {
            errors.push(error(format!(
                "recipe #{} outputs unknown artifact '{}'",
                i, recipe.output
            )));
        }
        for input in &recipe.inputs {
            if !catalog.artifacts.contains_key(input) {
                errors.push(error(format!(
                    "recipe #{} for '{}' consumes unknown artifact '{}'",
                    i, recipe.output, input
                )));
            }
        }
        if recipe.command.is_empty() {
            errors.push(error(format!(
                "recipe #{} for '{}' has an empty command",
                i, recipe.output
            )));
        }
        if let Err(e) = command::check_template(&recipe.command, recipe.inputs.len()) {
            errors.push(error(format!(
                "recipe #{} for '{}': {}",
                i, recipe.output, e
            )));
        }
        for template in &recipe.outputs {
            if let Err(e) = command::check_template(template, recipe.inputs.len()) {
                errors.push(error(format!(
                    "recipe #{} for '{}': {}",
                    i, recipe.output, e
                )));
            }
        }
    }

    for (id, filenames) in &catalog.provide {
        if !catalog.artifacts.contains_key(id) {
            errors.push(error(format!("provide references unknown artifact '{}'", id)));
        }
        if filenames.is_empty() {
            errors.push(error(format!(
                "provide for '{}' lists no filenames",
                id
            )));
        }
    }

    for target in &catalog.targets {
        if !catalog.artifacts.contains_key(target) {
            errors.push(error(format!("target references unknown artifact '{}'", target)));
        }
    }

    errors
}
