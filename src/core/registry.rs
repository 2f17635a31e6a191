//! The artifact registry — owns all artifacts and their recipes.
//!
//! Drivers register artifacts and recipes up front, provide input files,
//! configure output handling, then plan and build through the registry.
//! Registration enforces identifier and suffix uniqueness; recipe inputs
//! must already be registered.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;

use crate::core::errors::{BuildError, DynError, PlanError, RegistryError};
use crate::core::types::{Artifact, BuildReport, IndexRecipe, PlanStep, ResolvedInput};
use crate::core::{dot, executor, planner, resolver};

/// Default prefix for files the build keeps.
const DEFAULT_OUTPUT_PREFIX: &str = "index";

/// Owns artifacts and recipes; entry point for planning and building.
#[derive(Debug)]
pub struct IndexRegistry {
    artifacts: IndexMap<String, Artifact>,
    suffixes: HashSet<String>,
    output_prefix: String,
    keep_intermediates: bool,
    temp_dir: PathBuf,
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self {
            artifacts: IndexMap::new(),
            suffixes: HashSet::new(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            keep_intermediates: false,
            temp_dir: std::env::temp_dir(),
        }
    }
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact slot under a unique identifier and suffix.
    pub fn register_artifact(&mut self, identifier: &str, suffix: &str) -> Result<(), RegistryError> {
        if identifier.is_empty() {
            return Err(RegistryError::EmptyIdentifier);
        }
        if suffix.is_empty() {
            return Err(RegistryError::EmptySuffix {
                identifier: identifier.to_string(),
            });
        }
        if self.artifacts.contains_key(identifier) {
            return Err(RegistryError::DuplicateIdentifier {
                identifier: identifier.to_string(),
            });
        }
        if self.suffixes.contains(suffix) {
            return Err(RegistryError::DuplicateSuffix {
                identifier: identifier.to_string(),
                suffix: suffix.to_string(),
            });
        }
        self.suffixes.insert(suffix.to_string());
        self.artifacts
            .insert(identifier.to_string(), Artifact::new(identifier, suffix));
        debug!("registered artifact '{}' (suffix '{}')", identifier, suffix);
        Ok(())
    }

    /// Append a recipe to `output`'s recipe list. Registration order defines
    /// priority: the earliest registered recipe is tried first.
    pub fn register_recipe<F>(
        &mut self,
        output: &str,
        inputs: &[&str],
        run: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&[ResolvedInput], &str, &str) -> Result<Vec<String>, DynError> + 'static,
    {
        if !self.artifacts.contains_key(output) {
            return Err(RegistryError::UnknownIdentifier {
                identifier: output.to_string(),
            });
        }
        for input in inputs {
            if !self.artifacts.contains_key(*input) {
                return Err(RegistryError::UnknownIdentifier {
                    identifier: input.to_string(),
                });
            }
        }
        let inputs: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
        let artifact = self
            .artifacts
            .get_mut(output)
            .expect("output checked above");
        debug!(
            "registered recipe {} for '{}' <- [{}]",
            artifact.recipes().len(),
            output,
            inputs.join(", ")
        );
        artifact.add_recipe(IndexRecipe::new(inputs, Box::new(run)));
        Ok(())
    }

    /// Mark an artifact as directly provided and seed its filenames.
    pub fn provide(&mut self, identifier: &str, filenames: Vec<String>) -> Result<(), RegistryError> {
        if filenames.is_empty() {
            return Err(RegistryError::EmptyFilenames {
                identifier: identifier.to_string(),
            });
        }
        let artifact =
            self.artifacts
                .get_mut(identifier)
                .ok_or_else(|| RegistryError::UnknownIdentifier {
                    identifier: identifier.to_string(),
                })?;
        debug!("provided '{}' with {} file(s)", identifier, filenames.len());
        artifact.provide(filenames);
        Ok(())
    }

    /// Prefix used when materialising non-intermediate artifacts.
    pub fn set_output_prefix(&mut self, prefix: &str) {
        self.output_prefix = prefix.to_string();
    }

    pub fn output_prefix(&self) -> &str {
        &self.output_prefix
    }

    /// If true, every produced artifact lands under the output prefix and
    /// nothing is deleted afterwards.
    pub fn set_keep_intermediates(&mut self, keep: bool) {
        self.keep_intermediates = keep;
    }

    pub fn keep_intermediates(&self) -> bool {
        self.keep_intermediates
    }

    /// Directory for intermediate files. Defaults to the platform temp dir;
    /// the registry never reads environment variables beyond that default.
    pub fn set_temp_dir(&mut self, dir: &Path) {
        self.temp_dir = dir.to_path_buf();
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Identifiers of artifacts that currently hold filenames.
    pub fn completed_artifacts(&self) -> Vec<String> {
        self.artifacts
            .values()
            .filter(|a| a.is_finished())
            .map(|a| a.identifier().to_string())
            .collect()
    }

    pub fn get(&self, identifier: &str) -> Option<&Artifact> {
        self.artifacts.get(identifier)
    }

    pub(crate) fn get_mut(&mut self, identifier: &str) -> Option<&mut Artifact> {
        self.artifacts.get_mut(identifier)
    }

    /// Artifacts in registration order.
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Topological order over all registered artifacts.
    pub fn dependency_order(&self) -> Result<Vec<String>, RegistryError> {
        resolver::dependency_order(self)
    }

    /// Compute a plan producing `targets` from the currently provided inputs.
    pub fn make_plan(&self, targets: &[String]) -> Result<Vec<PlanStep>, PlanError> {
        planner::make_plan(self, targets)
    }

    /// Plan and execute, materialising `targets` and cleaning up
    /// intermediates unless retention is enabled.
    pub fn make_indexes(&mut self, targets: &[String]) -> Result<BuildReport, BuildError> {
        executor::make_indexes(self, targets)
    }

    /// Render the recipe graph as Graphviz dot, highlighting the plan for
    /// `targets` when non-empty.
    pub fn to_dot(&self, targets: &[String]) -> Result<String, PlanError> {
        dot::to_dot(self, targets)
    }
}
