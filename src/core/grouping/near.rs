//! Near-duplicate grouping over perceptual hash distances.
//!
//! # Algorithm
//!
//! 1. Enumerate unordered pairs inside each candidate set, deduplicated
//!    globally by canonical `(min(id), max(id))` key
//! 2. Classify each pair's edge by its dHash/pHash Hamming distances:
//!    within the strict thresholds -> very-similar edge, else within the
//!    loose thresholds -> possibly-similar edge, else no edge
//! 3. Collect connected components of the very graph, then of the possible
//!    graph excluding every very member, keeping components of size >= 2
//!
//! BFS walks nodes and neighbors in sorted id order, so traversal (and the
//! resulting group order) is deterministic.

use super::types::{GroupCategory, GroupResult, SimilarityThresholds};
use super::build_groups;
use crate::core::hasher::{hamming_distance, PerceptualHashes};
use crate::core::model::PhotoItem;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// Output of near-duplicate grouping
#[derive(Debug, Clone)]
pub struct NearDuplicateGroups {
    pub very_similar: Vec<GroupResult>,
    pub possibly_similar: Vec<GroupResult>,
    /// Unique pairs compared
    pub comparisons: u64,
}

type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Group candidate sets into very-similar and possibly-similar components.
///
/// `perceptual_hashes` must cover every member of every candidate set;
/// pairs with a missing hash are skipped rather than failing the scan.
pub fn group_near_duplicates(
    candidate_sets: &[Vec<PhotoItem>],
    perceptual_hashes: &HashMap<String, PerceptualHashes>,
    thresholds: &SimilarityThresholds,
) -> NearDuplicateGroups {
    let id_to_item: HashMap<&str, &PhotoItem> = candidate_sets
        .iter()
        .flatten()
        .map(|item| (item.id.as_str(), item))
        .collect();

    let mut comparisons: u64 = 0;
    let mut edges_very: Adjacency = BTreeMap::new();
    let mut edges_possible: Adjacency = BTreeMap::new();
    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();

    for candidates in candidate_sets {
        for (index, left) in candidates.iter().enumerate() {
            for right in &candidates[index + 1..] {
                let pair = if left.id < right.id {
                    (left.id.clone(), right.id.clone())
                } else {
                    (right.id.clone(), left.id.clone())
                };
                if !seen_pairs.insert(pair) {
                    continue;
                }

                let (Some(left_hashes), Some(right_hashes)) = (
                    perceptual_hashes.get(&left.id),
                    perceptual_hashes.get(&right.id),
                ) else {
                    continue;
                };

                comparisons += 1;
                let dhash_distance = hamming_distance(left_hashes.dhash, right_hashes.dhash);
                let phash_distance = hamming_distance(left_hashes.phash, right_hashes.phash);

                if dhash_distance <= thresholds.dhash_very
                    || phash_distance <= thresholds.phash_very
                {
                    add_edge(&mut edges_very, &left.id, &right.id);
                } else if dhash_distance <= thresholds.dhash_possible
                    || phash_distance <= thresholds.phash_possible
                {
                    add_edge(&mut edges_possible, &left.id, &right.id);
                }
            }
        }
    }

    let (very_components, very_ids) = connected_components(&edges_very, &id_to_item, &BTreeSet::new());
    let (possible_components, _) = connected_components(&edges_possible, &id_to_item, &very_ids);

    NearDuplicateGroups {
        very_similar: build_groups(
            very_components,
            GroupCategory::VerySimilar,
            &explain(thresholds, GroupCategory::VerySimilar),
        ),
        possibly_similar: build_groups(
            possible_components,
            GroupCategory::PossiblySimilar,
            &explain(thresholds, GroupCategory::PossiblySimilar),
        ),
        comparisons,
    }
}

fn add_edge(edges: &mut Adjacency, left: &str, right: &str) {
    edges
        .entry(left.to_string())
        .or_default()
        .insert(right.to_string());
    edges
        .entry(right.to_string())
        .or_default()
        .insert(left.to_string());
}

/// BFS components of size >= 2, excluding the given node ids.
///
/// Returns the components and the set of grouped node ids.
fn connected_components(
    edges: &Adjacency,
    id_to_item: &HashMap<&str, &PhotoItem>,
    exclude: &BTreeSet<String>,
) -> (Vec<Vec<PhotoItem>>, BTreeSet<String>) {
    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut components = Vec::new();
    let mut grouped_ids: BTreeSet<String> = BTreeSet::new();

    for node in edges.keys() {
        if visited.contains(node) || exclude.contains(node) {
            continue;
        }

        let mut queue = VecDeque::from([node.clone()]);
        visited.insert(node.clone());
        let mut component_ids = Vec::new();

        while let Some(current) = queue.pop_front() {
            if exclude.contains(&current) {
                continue;
            }
            component_ids.push(current.clone());
            if let Some(neighbors) = edges.get(&current) {
                for neighbor in neighbors {
                    if !visited.contains(neighbor) {
                        visited.insert(neighbor.clone());
                        queue.push_back(neighbor.clone());
                    }
                }
            }
        }

        if component_ids.len() < 2 {
            continue;
        }
        let members: Vec<PhotoItem> = component_ids
            .iter()
            .filter_map(|id| id_to_item.get(id.as_str()).map(|item| (*item).clone()))
            .collect();
        if members.len() >= 2 {
            components.push(members);
            grouped_ids.extend(component_ids);
        }
    }

    (components, grouped_ids)
}

fn explain(thresholds: &SimilarityThresholds, category: GroupCategory) -> String {
    match category {
        GroupCategory::VerySimilar => format!(
            "Perceptual hash match (dHash ≤ {} or pHash ≤ {}).",
            thresholds.dhash_very, thresholds.phash_very
        ),
        _ => format!(
            "Perceptual hash similarity (dHash ≤ {} or pHash ≤ {}).",
            thresholds.dhash_possible, thresholds.phash_possible
        ),
    }
}
