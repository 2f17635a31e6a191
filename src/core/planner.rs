//! Backtracking plan search over the recipe graph.
//!
//! Each target is resolved independently, top-down. A priority queue keyed by
//! dependency rank (greatest first, so the most-derived unresolved artifact
//! expands next) holds pending artifacts together with the artifact that
//! first requested them and a count of current requesters. A plan-path stack
//! records which recipe alternative each expanded artifact is attempting.
//! Hitting an artifact with no recipes and no provided files unwinds the path
//! to the nearest requester with an untried alternative, dropping queue
//! entries whose requester count reaches zero. Per-target paths are unioned,
//! sorted by dependency rank, and stripped of already-provided artifacts.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::core::errors::{PlanError, RegistryError};
use crate::core::registry::IndexRegistry;
use crate::core::resolver;
use crate::core::types::PlanStep;

/// Pending artifact: who asked for it first, and how many ask for it now.
///
/// Later co-requesters only bump the count; the first requester stays the
/// backtrack target even if it resolves before the others.
struct QueueEntry {
    requester: usize,
    requesters: usize,
}

/// One element of the tentative plan: artifact rank, the rank of the artifact
/// that requested it (or the sentinel for the target itself), and the recipe
/// alternative currently attempted.
struct PathElem {
    rank: usize,
    requester: usize,
    recipe: usize,
}

/// Compute an ordered plan producing every target from the provided inputs.
pub fn make_plan(registry: &IndexRegistry, targets: &[String]) -> Result<Vec<PlanStep>, PlanError> {
    let order = resolver::dependency_order(registry)?;
    let rank_of: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(rank, identifier)| (identifier.as_str(), rank))
        .collect();

    for target in targets {
        if !rank_of.contains_key(target.as_str()) {
            return Err(RegistryError::UnknownIdentifier {
                identifier: target.clone(),
            }
            .into());
        }
    }

    let mut steps: HashSet<PlanStep> = HashSet::new();
    for target in targets {
        let path = resolve_target(registry, &order, &rank_of, target)?;
        for elem in &path {
            steps.insert(PlanStep::new(&order[elem.rank], elem.recipe));
        }
    }

    let mut plan: Vec<PlanStep> = steps.into_iter().collect();
    plan.sort_by_key(|step| (rank_of[step.identifier.as_str()], step.recipe));
    plan.retain(|step| {
        !registry
            .get(&step.identifier)
            .expect("plan steps name registered artifacts")
            .is_finished()
    });
    Ok(plan)
}

/// Resolve a single target, returning the surviving plan path.
fn resolve_target(
    registry: &IndexRegistry,
    order: &[String],
    rank_of: &HashMap<&str, usize>,
    target: &str,
) -> Result<Vec<PathElem>, PlanError> {
    let artifact_at = |rank: usize| {
        registry
            .get(&order[rank])
            .expect("ranks index registered artifacts")
    };
    // Marks the target's own queue entry; never matches a real rank.
    let sentinel = order.len();

    let mut path: Vec<PathElem> = Vec::new();
    let mut queue: BTreeMap<usize, QueueEntry> = BTreeMap::new();
    queue.insert(
        rank_of[target],
        QueueEntry {
            requester: sentinel,
            requesters: 1,
        },
    );

    // Greatest rank first: the most-derived pending artifact expands next
    while let Some((rank, entry)) = queue.pop_last() {
        path.push(PathElem {
            rank,
            requester: entry.requester,
            recipe: 0,
        });

        let artifact = artifact_at(rank);
        if artifact.is_finished() {
            // Provided (or already built): nothing to expand
            continue;
        }
        if !artifact.recipes().is_empty() {
            enqueue_inputs(&mut queue, rank_of, artifact.recipes()[0].inputs(), rank);
            continue;
        }

        // Dead end: unwind to the nearest requester with an untried recipe
        loop {
            let exhausted = match path.last() {
                Some(elem) => elem.recipe == artifact_at(elem.rank).recipes().len(),
                None => false,
            };
            if !exhausted {
                break;
            }
            let requester = path.last().expect("checked above").requester;

            while path.last().map_or(false, |elem| elem.rank != requester) {
                let elem = path.pop().expect("checked by loop condition");
                let abandoned = artifact_at(elem.rank);
                if !abandoned.is_finished() && elem.recipe < abandoned.recipes().len() {
                    release_inputs(
                        &mut queue,
                        rank_of,
                        abandoned.recipes()[elem.recipe].inputs(),
                    );
                }
            }

            match path.last_mut() {
                Some(elem) => {
                    let requester_artifact = artifact_at(elem.rank);
                    if !requester_artifact.is_finished()
                        && elem.recipe < requester_artifact.recipes().len()
                    {
                        release_inputs(
                            &mut queue,
                            rank_of,
                            requester_artifact.recipes()[elem.recipe].inputs(),
                        );
                    }
                    elem.recipe += 1;
                }
                None => break,
            }
        }

        if let Some(elem) = path.last() {
            let recipe = &artifact_at(elem.rank).recipes()[elem.recipe];
            enqueue_inputs(&mut queue, rank_of, recipe.inputs(), elem.rank);
        }
    }

    if path.is_empty() {
        return Err(PlanError::InsufficientInput {
            target: target.to_string(),
            inputs: registry.completed_artifacts(),
        });
    }
    Ok(path)
}

/// Queue every input of a recipe, merging with entries other artifacts
/// already requested.
fn enqueue_inputs(
    queue: &mut BTreeMap<usize, QueueEntry>,
    rank_of: &HashMap<&str, usize>,
    inputs: &[String],
    requester: usize,
) {
    for input in inputs {
        queue
            .entry(rank_of[input.as_str()])
            .and_modify(|entry| entry.requesters += 1)
            .or_insert(QueueEntry {
                requester,
                requesters: 1,
            });
    }
}

/// Drop one requester from each queued input; entries nobody requests any
/// more leave the queue.
fn release_inputs(
    queue: &mut BTreeMap<usize, QueueEntry>,
    rank_of: &HashMap<&str, usize>,
    inputs: &[String],
) {
    for input in inputs {
        let rank = rank_of[input.as_str()];
        if let Some(entry) = queue.get_mut(&rank) {
            entry.requesters -= 1;
            if entry.requesters == 0 {
                queue.remove(&rank);
            }
        }
    }
}
