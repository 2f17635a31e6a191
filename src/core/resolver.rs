//! Dependency ordering over the bipartite artifact/recipe graph.
//!
//! Every input of every recipe contributes an edge to the recipe's output
//! artifact; parallel edges (the same input feeding several recipes of one
//! output) are deduplicated. Kahn's algorithm yields a total order in which
//! every recipe's inputs precede its output. The order is stable for a given
//! registration sequence, which makes it usable both as the execution order
//! and as the planner's priority key.

use std::collections::{HashMap, VecDeque};

use crate::core::errors::RegistryError;
use crate::core::registry::IndexRegistry;

/// Compute a topological order over all registered artifact identifiers.
pub fn dependency_order(registry: &IndexRegistry) -> Result<Vec<String>, RegistryError> {
    let labels: Vec<&str> = registry.artifacts().map(|a| a.identifier()).collect();
    let index_of: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(idx, label)| (*label, idx))
        .collect();

    // Edges: recipe input -> recipe output, deduplicated per source
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); labels.len()];
    for (output_idx, artifact) in registry.artifacts().enumerate() {
        for recipe in artifact.recipes() {
            for input in recipe.inputs() {
                adjacency[index_of[input.as_str()]].push(output_idx);
            }
        }
    }
    for edges in &mut adjacency {
        edges.sort_unstable();
        edges.dedup();
    }

    let mut in_degree = vec![0usize; labels.len()];
    for edges in &adjacency {
        for &target in edges {
            in_degree[target] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..labels.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(labels.len());
    while let Some(current) = queue.pop_front() {
        order.push(current);
        for &target in &adjacency[current] {
            in_degree[target] -= 1;
            if in_degree[target] == 0 {
                queue.push_back(target);
            }
        }
    }

    if order.len() != labels.len() {
        let emitted: Vec<bool> = {
            let mut seen = vec![false; labels.len()];
            for &i in &order {
                seen[i] = true;
            }
            seen
        };
        let members = labels
            .iter()
            .enumerate()
            .filter(|(i, _)| !emitted[*i])
            .map(|(_, l)| l.to_string())
            .collect();
        return Err(RegistryError::CyclicDependencies { members });
    }

    Ok(order.into_iter().map(|i| labels[i].to_string()).collect())
}
