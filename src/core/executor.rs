//! Build loop — walks a plan in dependency order and manages retention.
//!
//! Non-intermediate artifacts (provided or requested) are materialised under
//! the registry's output prefix. Intermediates land in the temp directory
//! under a content-addressed stem unless retention is enabled. After the plan
//! completes, files listed only on intermediate artifacts are deleted; the
//! keep and delete sets are computed over filename identity so aliasing
//! recipes never delete a file a kept artifact still lists.

use std::collections::HashSet;

use log::{info, warn};

use crate::core::errors::BuildError;
use crate::core::planner;
use crate::core::registry::IndexRegistry;
use crate::core::types::{Artifact, BuildReport, ResolvedInput};

/// Content-addressed filename stem for an intermediate artifact.
pub fn identifier_stem(identifier: &str) -> String {
    blake3::hash(identifier.as_bytes()).to_hex().to_string()
}

fn is_intermediate(artifact: &Artifact, targets: &HashSet<&str>) -> bool {
    !artifact.provided_directly() && !targets.contains(artifact.identifier())
}

/// Plan and execute, producing every target and cleaning up intermediates.
///
/// A failing recipe aborts the build; files produced by earlier steps are
/// left on disk for inspection.
pub fn make_indexes(
    registry: &mut IndexRegistry,
    targets: &[String],
) -> Result<BuildReport, BuildError> {
    let plan = planner::make_plan(registry, targets)?;
    let target_set: HashSet<&str> = targets.iter().map(|t| t.as_str()).collect();

    let mut report = BuildReport::default();
    for step in &plan {
        let (prefix, suffix, resolved) = {
            let artifact = registry
                .get(&step.identifier)
                .expect("plan steps name registered artifacts");
            let prefix = if registry.keep_intermediates() || !is_intermediate(artifact, &target_set)
            {
                registry.output_prefix().to_string()
            } else {
                registry
                    .temp_dir()
                    .join(identifier_stem(&step.identifier))
                    .to_string_lossy()
                    .into_owned()
            };
            let recipe = &artifact.recipes()[step.recipe];
            let resolved: Vec<ResolvedInput> = recipe
                .inputs()
                .iter()
                .map(|input| {
                    let input_artifact = registry
                        .get(input)
                        .expect("recipe inputs are validated at registration");
                    debug_assert!(
                        input_artifact.is_finished(),
                        "plan order materialises inputs before outputs"
                    );
                    ResolvedInput {
                        identifier: input.clone(),
                        filenames: input_artifact.filenames().to_vec(),
                    }
                })
                .collect();
            (prefix, artifact.suffix().to_string(), resolved)
        };

        info!("building '{}' (recipe {})", step.identifier, step.recipe);
        let produced = registry
            .get(&step.identifier)
            .expect("checked above")
            .recipes()[step.recipe]
            .execute(&resolved, &prefix, &suffix)
            .map_err(|source| BuildError::RecipeFailed {
                identifier: step.identifier.clone(),
                recipe: step.recipe,
                source,
            })?;
        if produced.is_empty() {
            return Err(BuildError::EmptyRecipeOutput {
                identifier: step.identifier.clone(),
                recipe: step.recipe,
            });
        }
        registry
            .get_mut(&step.identifier)
            .expect("checked above")
            .set_filenames(produced);
        report.built.push(step.identifier.clone());
    }

    if registry.keep_intermediates() {
        let mut seen = HashSet::new();
        for artifact in registry.artifacts() {
            for filename in artifact.filenames() {
                if seen.insert(filename.clone()) {
                    report.kept.push(filename.clone());
                }
            }
        }
        return Ok(report);
    }

    // Keep every file some non-intermediate artifact lists; delete the rest,
    // each file at most once
    let keep: HashSet<&str> = registry
        .artifacts()
        .filter(|a| !is_intermediate(a, &target_set))
        .flat_map(|a| a.filenames().iter().map(|f| f.as_str()))
        .collect();

    let mut delete: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for artifact in registry.artifacts() {
        for filename in artifact.filenames() {
            if !keep.contains(filename.as_str()) && seen.insert(filename.clone()) {
                delete.push(filename.clone());
            }
        }
    }

    report.kept = {
        let mut kept = Vec::new();
        let mut seen = HashSet::new();
        for artifact in registry.artifacts() {
            if is_intermediate(artifact, &target_set) {
                continue;
            }
            for filename in artifact.filenames() {
                if seen.insert(filename.clone()) {
                    kept.push(filename.clone());
                }
            }
        }
        kept
    };

    for filename in delete {
        match std::fs::remove_file(&filename) {
            Ok(()) => report.removed.push(filename),
            Err(e) => warn!("failed to remove intermediate file {}: {}", filename, e),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::DynError;
    use std::path::Path;

    /// Recipe that writes `{prefix}.{suffix}` with the given content.
    fn file_recipe(
        content: &'static str,
    ) -> impl Fn(&[ResolvedInput], &str, &str) -> Result<Vec<String>, DynError> {
        move |_, prefix, suffix| {
            let name = format!("{}.{}", prefix, suffix);
            std::fs::write(&name, content)?;
            Ok(vec![name])
        }
    }

    fn chain_registry(dir: &Path) -> IndexRegistry {
        let mut registry = IndexRegistry::new();
        registry.register_artifact("a", "a").unwrap();
        registry.register_artifact("b", "b").unwrap();
        registry.register_artifact("c", "c").unwrap();
        registry.register_recipe("b", &["a"], file_recipe("b")).unwrap();
        registry.register_recipe("c", &["b"], file_recipe("c")).unwrap();

        let input = dir.join("a.in");
        std::fs::write(&input, "a").unwrap();
        registry
            .provide("a", vec![input.to_string_lossy().into_owned()])
            .unwrap();
        registry.set_output_prefix(&dir.join("out").to_string_lossy());
        registry.set_temp_dir(dir);
        registry
    }

    #[test]
    fn test_intermediate_cleaned_up_after_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = chain_registry(dir.path());

        let report = registry.make_indexes(&["c".to_string()]).unwrap();
        assert_eq!(report.built, ["b", "c"]);

        let c_file = registry.get("c").unwrap().filenames()[0].clone();
        let b_file = registry.get("b").unwrap().filenames()[0].clone();
        assert!(Path::new(&c_file).exists());
        assert!(!Path::new(&b_file).exists());
        assert_eq!(report.removed, [b_file]);
    }

    #[test]
    fn test_intermediate_prefix_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = chain_registry(dir.path());
        registry.make_indexes(&["c".to_string()]).unwrap();

        let b_file = &registry.get("b").unwrap().filenames()[0];
        assert!(b_file.contains(&identifier_stem("b")));
        assert!(b_file.starts_with(&dir.path().to_string_lossy().into_owned()));
        let c_file = &registry.get("c").unwrap().filenames()[0];
        assert!(c_file.ends_with("out.c"));
    }

    #[test]
    fn test_keep_intermediates_keeps_everything_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = chain_registry(dir.path());
        registry.set_keep_intermediates(true);

        let report = registry.make_indexes(&["c".to_string()]).unwrap();
        assert!(report.removed.is_empty());

        let b_file = registry.get("b").unwrap().filenames()[0].clone();
        assert!(b_file.ends_with("out.b"), "got {}", b_file);
        assert!(Path::new(&b_file).exists());
        assert!(report.kept.contains(&b_file));
    }

    #[test]
    fn test_provided_inputs_survive_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = chain_registry(dir.path());
        registry.make_indexes(&["c".to_string()]).unwrap();

        let a_file = &registry.get("a").unwrap().filenames()[0];
        assert!(Path::new(a_file).exists());
    }

    #[test]
    fn test_alias_of_provided_input_not_deleted() {
        // b aliases a's file; b is intermediate but the file belongs to a
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IndexRegistry::new();
        registry.register_artifact("a", "a").unwrap();
        registry.register_artifact("b", "b").unwrap();
        registry.register_artifact("c", "c").unwrap();
        registry
            .register_recipe("b", &["a"], |inputs, _, _| Ok(inputs[0].filenames.clone()))
            .unwrap();
        registry.register_recipe("c", &["b"], file_recipe("c")).unwrap();

        let input = dir.path().join("a.in");
        std::fs::write(&input, "a").unwrap();
        registry
            .provide("a", vec![input.to_string_lossy().into_owned()])
            .unwrap();
        registry.set_output_prefix(&dir.path().join("out").to_string_lossy());
        registry.set_temp_dir(dir.path());

        let report = registry.make_indexes(&["c".to_string()]).unwrap();
        assert!(input.exists(), "aliased input file was deleted");
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_alias_target_keeps_intermediate_file() {
        // c (requested) aliases b's temp file: the file must survive
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IndexRegistry::new();
        registry.register_artifact("a", "a").unwrap();
        registry.register_artifact("b", "b").unwrap();
        registry.register_artifact("c", "c").unwrap();
        registry.register_recipe("b", &["a"], file_recipe("b")).unwrap();
        registry
            .register_recipe("c", &["b"], |inputs, _, _| Ok(inputs[0].filenames.clone()))
            .unwrap();

        let input = dir.path().join("a.in");
        std::fs::write(&input, "a").unwrap();
        registry
            .provide("a", vec![input.to_string_lossy().into_owned()])
            .unwrap();
        registry.set_output_prefix(&dir.path().join("out").to_string_lossy());
        registry.set_temp_dir(dir.path());

        let report = registry.make_indexes(&["c".to_string()]).unwrap();
        let c_file = registry.get("c").unwrap().filenames()[0].clone();
        assert_eq!(c_file, registry.get("b").unwrap().filenames()[0]);
        assert!(Path::new(&c_file).exists());
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_recipe_failure_aborts_and_leaves_partial_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IndexRegistry::new();
        registry.register_artifact("a", "a").unwrap();
        registry.register_artifact("b", "b").unwrap();
        registry.register_artifact("c", "c").unwrap();
        registry.register_recipe("b", &["a"], file_recipe("b")).unwrap();
        registry
            .register_recipe("c", &["b"], |_, _, _| Err("index construction failed".into()))
            .unwrap();

        let input = dir.path().join("a.in");
        std::fs::write(&input, "a").unwrap();
        registry
            .provide("a", vec![input.to_string_lossy().into_owned()])
            .unwrap();
        registry.set_output_prefix(&dir.path().join("out").to_string_lossy());
        registry.set_temp_dir(dir.path());

        let err = registry.make_indexes(&["c".to_string()]).unwrap_err();
        assert!(matches!(err, BuildError::RecipeFailed { ref identifier, recipe: 0, .. } if identifier == "c"));

        // b's partial output stays on disk for inspection
        let b_file = registry.get("b").unwrap().filenames()[0].clone();
        assert!(Path::new(&b_file).exists());
    }

    #[test]
    fn test_empty_recipe_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IndexRegistry::new();
        registry.register_artifact("a", "a").unwrap();
        registry.register_artifact("b", "b").unwrap();
        registry
            .register_recipe("b", &["a"], |_, _, _| Ok(vec![]))
            .unwrap();
        registry.provide("a", vec!["a.in".to_string()]).unwrap();
        registry.set_temp_dir(dir.path());

        let err = registry.make_indexes(&["b".to_string()]).unwrap_err();
        assert!(matches!(err, BuildError::EmptyRecipeOutput { .. }));
    }

    #[test]
    fn test_recipes_see_resolved_inputs_in_declared_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IndexRegistry::new();
        registry.register_artifact("fasta", "fasta").unwrap();
        registry.register_artifact("vcf", "vcf").unwrap();
        registry.register_artifact("vg", "vg").unwrap();
        registry
            .register_recipe("vg", &["fasta", "vcf"], |inputs, prefix, suffix| {
                assert_eq!(inputs[0].identifier, "fasta");
                assert_eq!(inputs[1].identifier, "vcf");
                assert_eq!(inputs[0].filenames, ["ref.fasta"]);
                assert_eq!(inputs[1].filenames, ["calls.vcf"]);
                let name = format!("{}.{}", prefix, suffix);
                std::fs::write(&name, "vg")?;
                Ok(vec![name])
            })
            .unwrap();
        registry.provide("fasta", vec!["ref.fasta".to_string()]).unwrap();
        registry.provide("vcf", vec!["calls.vcf".to_string()]).unwrap();
        registry.set_output_prefix(&dir.path().join("out").to_string_lossy());
        registry.set_temp_dir(dir.path());

        let report = registry.make_indexes(&["vg".to_string()]).unwrap();
        assert_eq!(report.built, ["vg"]);
    }

    #[test]
    fn test_multi_file_recipe_outputs_all_kept() {
        // gcsa-style recipe returning a primary file plus a sidecar
        let dir = tempfile::tempdir().unwrap();
        let mut registry = IndexRegistry::new();
        registry.register_artifact("pruned-vg", "pruned.vg").unwrap();
        registry.register_artifact("gcsa-lcp", "gcsa").unwrap();
        registry
            .register_recipe("gcsa-lcp", &["pruned-vg"], |_, prefix, suffix| {
                let gcsa = format!("{}.{}", prefix, suffix);
                let lcp = format!("{}.lcp", gcsa);
                std::fs::write(&gcsa, "gcsa")?;
                std::fs::write(&lcp, "lcp")?;
                Ok(vec![gcsa, lcp])
            })
            .unwrap();
        registry
            .provide("pruned-vg", vec!["pruned.vg".to_string()])
            .unwrap();
        registry.set_output_prefix(&dir.path().join("out").to_string_lossy());
        registry.set_temp_dir(dir.path());

        let report = registry.make_indexes(&["gcsa-lcp".to_string()]).unwrap();
        let files = registry.get("gcsa-lcp").unwrap().filenames().to_vec();
        assert_eq!(files.len(), 2);
        assert!(files[1].ends_with(".lcp"));
        assert!(files.iter().all(|f| Path::new(f).exists()));
        assert!(files.iter().all(|f| report.kept.contains(f)));
    }

    #[test]
    fn test_identifier_stem_is_stable_and_hex() {
        let s1 = identifier_stem("gcsa-lcp");
        let s2 = identifier_stem("gcsa-lcp");
        assert_eq!(s1, s2);
        assert_eq!(s1.len(), 64);
        assert!(s1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(identifier_stem("xg"), identifier_stem("vg"));
    }
}
