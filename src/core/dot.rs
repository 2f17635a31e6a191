//! Graphviz rendering of the recipe graph.
//!
//! Artifacts are boxes, recipes are circles labelled with their priority
//! index, edges flow inputs → recipe → output. With targets, the computed
//! plan is emboldened, targets are coloured, and everything off-plan is
//! dimmed. An unsatisfiable target set renders a diagnostic title instead of
//! failing.

use std::collections::{HashMap, HashSet};

use crate::core::errors::PlanError;
use crate::core::planner;
use crate::core::registry::IndexRegistry;
use crate::core::types::PlanStep;

/// Render the registry as a dot graph, highlighting the plan for `targets`
/// when non-empty.
pub fn to_dot(registry: &IndexRegistry, targets: &[String]) -> Result<String, PlanError> {
    let mut out = String::from("digraph recipegraph {\n");

    let target_set: HashSet<&str> = targets.iter().map(|t| t.as_str()).collect();
    let mut plan_steps: HashSet<PlanStep> = HashSet::new();
    let mut plan_artifacts: HashSet<&str> = HashSet::new();
    if !targets.is_empty() {
        match planner::make_plan(registry, targets) {
            Ok(plan) => {
                for step in plan {
                    plan_artifacts.insert(
                        registry
                            .get(&step.identifier)
                            .expect("plan steps name registered artifacts")
                            .identifier(),
                    );
                    plan_steps.insert(step);
                }
            }
            Err(PlanError::InsufficientInput { .. }) => {
                out.push_str("labelloc=\"t\";\n");
                out.push_str("label=\"Insufficient input to create targets\";\n");
            }
            Err(other) => return Err(other),
        }
    }

    let mut artifact_node: HashMap<&str, String> = HashMap::new();
    for (idx, artifact) in registry.artifacts().enumerate() {
        let node = format!("I{}", idx);
        out.push_str(&format!(
            "{}[label=\"{}\" shape=box",
            node,
            artifact.identifier()
        ));
        if artifact.is_finished() {
            out.push_str(" style=\"filled,bold\" fillcolor=lightgray");
        } else if target_set.contains(artifact.identifier()) {
            out.push_str(" style=\"filled,bold\" fillcolor=lightblue");
        } else if plan_artifacts.contains(artifact.identifier()) {
            out.push_str(" style=bold");
        }
        out.push_str("];\n");
        artifact_node.insert(artifact.identifier(), node);
    }

    let unselected_color = if targets.is_empty() { "black" } else { "gray33" };
    let mut recipe_idx = 0usize;
    for artifact in registry.artifacts() {
        for (priority, recipe) in artifact.recipes().iter().enumerate() {
            let node = format!("R{}", recipe_idx);
            recipe_idx += 1;
            let selected = plan_steps.contains(&PlanStep::new(artifact.identifier(), priority));
            if selected {
                out.push_str(&format!(
                    "{}[label=\"{}\" shape=circle style=bold];\n",
                    node, priority
                ));
                out.push_str(&format!(
                    "{} -> {}[style=bold];\n",
                    node,
                    artifact_node[artifact.identifier()]
                ));
            } else {
                out.push_str(&format!("{}[label=\"{}\" shape=circle];\n", node, priority));
                out.push_str(&format!(
                    "{} -> {} [color={}];\n",
                    node,
                    artifact_node[artifact.identifier()],
                    unselected_color
                ));
            }
            for input in recipe.inputs() {
                if selected {
                    out.push_str(&format!(
                        "{} -> {}[style=bold];\n",
                        artifact_node[input.as_str()],
                        node
                    ));
                } else {
                    out.push_str(&format!(
                        "{} -> {} [color={}];\n",
                        artifact_node[input.as_str()],
                        node,
                        unselected_color
                    ));
                }
            }
        }
    }

    out.push_str("}\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{DynError, RegistryError};
    use crate::core::types::ResolvedInput;

    fn ok_recipe(
        _: &[ResolvedInput],
        prefix: &str,
        suffix: &str,
    ) -> Result<Vec<String>, DynError> {
        Ok(vec![format!("{}.{}", prefix, suffix)])
    }

    fn pipeline_registry() -> IndexRegistry {
        let mut registry = IndexRegistry::new();
        registry.register_artifact("ref-fasta", "fasta").unwrap();
        registry.register_artifact("vg", "vg").unwrap();
        registry.register_artifact("xg", "xg").unwrap();
        registry.register_recipe("vg", &["ref-fasta"], ok_recipe).unwrap();
        registry.register_recipe("xg", &["vg"], ok_recipe).unwrap();
        registry
    }

    #[test]
    fn test_registry_only_render() {
        let mut registry = pipeline_registry();
        registry
            .provide("ref-fasta", vec!["ref.fasta".to_string()])
            .unwrap();

        let dot = to_dot(&registry, &[]).unwrap();
        assert!(dot.starts_with("digraph recipegraph {"));
        assert!(dot.ends_with("}\n"));
        // One box per artifact, deterministic numbering in registration order
        assert!(dot.contains("I0[label=\"ref-fasta\" shape=box"));
        assert!(dot.contains("I1[label=\"vg\" shape=box"));
        assert!(dot.contains("I2[label=\"xg\" shape=box"));
        // Provided artifact is filled
        assert!(dot.contains("I0[label=\"ref-fasta\" shape=box style=\"filled,bold\" fillcolor=lightgray]"));
        // Neutral edges without targets
        assert!(dot.contains("[color=black];"));
        assert!(!dot.contains("gray33"));
    }

    #[test]
    fn test_plan_highlighting() {
        let mut registry = pipeline_registry();
        registry
            .provide("ref-fasta", vec!["ref.fasta".to_string()])
            .unwrap();

        let dot = to_dot(&registry, &["xg".to_string()]).unwrap();
        // Target coloured distinctly
        assert!(dot.contains("I2[label=\"xg\" shape=box style=\"filled,bold\" fillcolor=lightblue]"));
        // Plan member bold, not coloured as target
        assert!(dot.contains("I1[label=\"vg\" shape=box style=bold]"));
        // Selected recipes and their edges bold
        assert!(dot.contains("R0[label=\"0\" shape=circle style=bold];"));
        assert!(dot.contains("R1[label=\"0\" shape=circle style=bold];"));
        assert!(dot.contains("[style=bold];"));
        // Off-plan edges are dimmed when targets are given
        assert!(dot.contains("gray33") || !dot.contains("color=black"));
    }

    #[test]
    fn test_unselected_alternative_stays_dim() {
        let mut registry = pipeline_registry();
        registry.register_artifact("gfa", "gfa").unwrap();
        registry.register_recipe("xg", &["gfa"], ok_recipe).unwrap();
        registry
            .provide("ref-fasta", vec!["ref.fasta".to_string()])
            .unwrap();

        let dot = to_dot(&registry, &["xg".to_string()]).unwrap();
        // The gfa alternative (priority 1 for xg) is not part of the plan
        assert!(dot.contains("R2[label=\"1\" shape=circle];"));
        assert!(dot.contains("[color=gray33];"));
    }

    #[test]
    fn test_insufficient_input_renders_title() {
        let registry = pipeline_registry();
        // Nothing provided: xg is unsatisfiable
        let dot = to_dot(&registry, &["xg".to_string()]).unwrap();
        assert!(dot.contains("label=\"Insufficient input to create targets\";"));
        assert!(dot.contains("labelloc=\"t\";"));
    }

    #[test]
    fn test_cycle_propagates_error() {
        let mut registry = IndexRegistry::new();
        registry.register_artifact("a", "a").unwrap();
        registry.register_artifact("b", "b").unwrap();
        registry.register_recipe("a", &["b"], ok_recipe).unwrap();
        registry.register_recipe("b", &["a"], ok_recipe).unwrap();

        let err = to_dot(&registry, &["a".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            PlanError::Registry(RegistryError::CyclicDependencies { .. })
        ));
    }

    #[test]
    fn test_recipe_nodes_count_all_alternatives() {
        let mut registry = pipeline_registry();
        registry.register_artifact("gfa", "gfa").unwrap();
        registry.register_recipe("xg", &["gfa"], ok_recipe).unwrap();

        let dot = to_dot(&registry, &[]).unwrap();
        assert!(dot.contains("R0["));
        assert!(dot.contains("R1["));
        assert!(dot.contains("R2["));
        assert!(!dot.contains("R3["));
    }
}
