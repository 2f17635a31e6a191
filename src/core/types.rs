//! Core data model — artifacts, recipes, plan steps, build reports.
//!
//! An artifact is a named output slot with a unique filename suffix. It is
//! either provided directly by the caller or produced by one of its recipes.
//! Recipes are opaque executors over resolved input filename lists.

use std::fmt;

use crate::core::errors::DynError;

// ============================================================================
// Recipes
// ============================================================================

/// Executor signature for a recipe.
///
/// Receives the resolved inputs (in the order declared at registration), the
/// output prefix chosen by the build loop, and the output artifact's suffix.
/// Returns the filenames it created or aliased.
pub type RecipeFn = Box<dyn Fn(&[ResolvedInput], &str, &str) -> Result<Vec<String>, DynError>>;

/// An input artifact as seen by a recipe executor: its identifier and the
/// filenames it currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    /// Input artifact identifier
    pub identifier: String,

    /// Filenames materialised for that artifact
    pub filenames: Vec<String>,
}

/// A rule for producing one artifact from zero or more others.
pub struct IndexRecipe {
    inputs: Vec<String>,
    run: RecipeFn,
}

impl IndexRecipe {
    pub(crate) fn new(inputs: Vec<String>, run: RecipeFn) -> Self {
        Self { inputs, run }
    }

    /// Input artifact identifiers, in declaration order.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Run the executor against resolved inputs.
    pub(crate) fn execute(
        &self,
        inputs: &[ResolvedInput],
        prefix: &str,
        suffix: &str,
    ) -> Result<Vec<String>, DynError> {
        (self.run)(inputs, prefix, suffix)
    }
}

impl fmt::Debug for IndexRecipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexRecipe")
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Artifacts
// ============================================================================

/// A named output slot the planner knows how to produce or consume.
#[derive(Debug)]
pub struct Artifact {
    identifier: String,
    suffix: String,
    filenames: Vec<String>,
    provided_directly: bool,
    recipes: Vec<IndexRecipe>,
}

impl Artifact {
    pub(crate) fn new(identifier: &str, suffix: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            suffix: suffix.to_string(),
            filenames: Vec::new(),
            provided_directly: false,
            recipes: Vec::new(),
        }
    }

    /// Unique identifier within the registry.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Unique filename suffix; outputs are named `{prefix}.{suffix}`.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Filenames materialised so far. Empty until provided or built.
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// An artifact is finished exactly when it holds at least one filename.
    pub fn is_finished(&self) -> bool {
        !self.filenames.is_empty()
    }

    /// True if the caller seeded the filenames rather than a recipe.
    pub fn provided_directly(&self) -> bool {
        self.provided_directly
    }

    /// Registered recipes, highest preference first.
    pub fn recipes(&self) -> &[IndexRecipe] {
        &self.recipes
    }

    pub(crate) fn provide(&mut self, filenames: Vec<String>) {
        self.filenames = filenames;
        self.provided_directly = true;
    }

    pub(crate) fn add_recipe(&mut self, recipe: IndexRecipe) {
        self.recipes.push(recipe);
    }

    pub(crate) fn set_filenames(&mut self, filenames: Vec<String>) {
        self.filenames = filenames;
    }
}

// ============================================================================
// Plans
// ============================================================================

/// One step of a build plan: an artifact and the recipe priority chosen
/// for it. Lower recipe indices are higher preference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanStep {
    /// Artifact identifier
    pub identifier: String,

    /// Index into the artifact's recipe list
    pub recipe: usize,
}

impl PlanStep {
    pub fn new(identifier: &str, recipe: usize) -> Self {
        Self {
            identifier: identifier.to_string(),
            recipe,
        }
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.identifier, self.recipe)
    }
}

// ============================================================================
// Build reports
// ============================================================================

/// What a build did: artifacts executed, files retained, files deleted.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Identifiers executed, in plan order
    pub built: Vec<String>,

    /// Files on disk after retention (non-intermediate artifacts)
    pub kept: Vec<String>,

    /// Intermediate files deleted during retention
    pub removed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_starts_unfinished() {
        let a = Artifact::new("xg", "xg");
        assert_eq!(a.identifier(), "xg");
        assert_eq!(a.suffix(), "xg");
        assert!(!a.is_finished());
        assert!(!a.provided_directly());
        assert!(a.recipes().is_empty());
    }

    #[test]
    fn test_artifact_provide_finishes() {
        let mut a = Artifact::new("ref-fasta", "fasta");
        a.provide(vec!["GRCh38.fasta".to_string()]);
        assert!(a.is_finished());
        assert!(a.provided_directly());
        assert_eq!(a.filenames(), ["GRCh38.fasta"]);
    }

    #[test]
    fn test_artifact_set_filenames_does_not_mark_provided() {
        let mut a = Artifact::new("vg", "vg");
        a.set_filenames(vec!["out.vg".to_string()]);
        assert!(a.is_finished());
        assert!(!a.provided_directly());
    }

    #[test]
    fn test_recipe_executes_closure() {
        let recipe = IndexRecipe::new(
            vec!["ref-fasta".to_string()],
            Box::new(|inputs, prefix, suffix| {
                assert_eq!(inputs[0].identifier, "ref-fasta");
                Ok(vec![format!("{}.{}", prefix, suffix)])
            }),
        );
        let resolved = vec![ResolvedInput {
            identifier: "ref-fasta".to_string(),
            filenames: vec!["ref.fasta".to_string()],
        }];
        let out = recipe.execute(&resolved, "idx", "vg").unwrap();
        assert_eq!(out, ["idx.vg"]);
    }

    #[test]
    fn test_recipe_debug_omits_closure() {
        let recipe = IndexRecipe::new(vec!["a".to_string()], Box::new(|_, _, _| Ok(vec![])));
        let dbg = format!("{:?}", recipe);
        assert!(dbg.contains("inputs"));
        assert!(dbg.contains("\"a\""));
    }

    #[test]
    fn test_plan_step_display() {
        let step = PlanStep::new("gcsa-lcp", 1);
        assert_eq!(step.to_string(), "gcsa-lcp@1");
    }

    #[test]
    fn test_plan_step_equality_and_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(PlanStep::new("vg", 0));
        set.insert(PlanStep::new("vg", 0));
        set.insert(PlanStep::new("vg", 1));
        assert_eq!(set.len(), 2);
    }
}
