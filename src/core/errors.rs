//! Error taxonomy for registration, planning, and execution.
//!
//! Registration errors are configuration bugs and should be treated as fatal
//! by drivers. `PlanError::InsufficientInput` is recoverable — diagnostics
//! tolerate it. Recipe failures abort the build; partial outputs are left on
//! disk for inspection.

use thiserror::Error;

/// Error type recipe executors may return.
pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while assembling or querying the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("artifacts must have a non-empty identifier")]
    EmptyIdentifier,

    #[error("artifact '{identifier}' must have a non-empty suffix")]
    EmptySuffix { identifier: String },

    #[error("registry already contains identifier '{identifier}'")]
    DuplicateIdentifier { identifier: String },

    #[error("registry already contains suffix '{suffix}' (while registering '{identifier}')")]
    DuplicateSuffix { identifier: String, suffix: String },

    #[error("unknown artifact identifier '{identifier}'")]
    UnknownIdentifier { identifier: String },

    #[error("artifact '{identifier}' cannot be provided with an empty filename list")]
    EmptyFilenames { identifier: String },

    #[error("artifact dependency graph is not a DAG (cycle involving: {})", .members.join(", "))]
    CyclicDependencies { members: Vec<String> },
}

/// Errors raised while computing a plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// No combination of recipes and provided inputs can produce the target.
    #[error("inputs [{}] are insufficient to create '{target}'", .inputs.join(", "))]
    InsufficientInput {
        /// The target that could not be satisfied
        target: String,
        /// Identifiers finished at planning time
        inputs: Vec<String>,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors raised while executing a plan.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("recipe {recipe} for '{identifier}' failed: {source}")]
    RecipeFailed {
        identifier: String,
        recipe: usize,
        #[source]
        source: DynError,
    },

    #[error("recipe {recipe} for '{identifier}' returned no filenames")]
    EmptyRecipeOutput { identifier: String, recipe: usize },
}
