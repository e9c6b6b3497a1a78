//! # Candidates Module
//!
//! Narrows items into small comparable buckets before any pairwise work.
//!
//! Items are bucketed by capture date, aspect-ratio class and megapixel
//! class; only buckets with at least two members survive. The output is a
//! pure function of the input set: bucket keys ascend lexicographically and
//! members sort by `(create_time, id)`, so permuting the input changes
//! nothing.

use crate::core::model::PhotoItem;
use std::collections::BTreeMap;

/// Bucket items into candidate sets of at least two members
pub fn build_candidate_sets(items: &[PhotoItem]) -> Vec<Vec<PhotoItem>> {
    let mut buckets: BTreeMap<String, Vec<PhotoItem>> = BTreeMap::new();
    for item in items {
        buckets.entry(bucket_key(item)).or_default().push(item.clone());
    }

    let mut candidate_sets = Vec::new();
    for (_, mut bucket) in buckets {
        if bucket.len() < 2 {
            continue;
        }
        bucket.sort_by(|a, b| (a.create_time, &a.id).cmp(&(b.create_time, &b.id)));
        candidate_sets.push(bucket);
    }
    candidate_sets
}

/// `"{date}:{aspect}:{resolution}"`, e.g. `"2024-03-01:landscape:12mp"`
fn bucket_key(item: &PhotoItem) -> String {
    format!(
        "{}:{}:{}",
        item.create_time.format("%Y-%m-%d"),
        aspect_ratio_class(item.width, item.height),
        resolution_bucket(item.width, item.height),
    )
}

fn aspect_ratio_class(width: Option<u32>, height: Option<u32>) -> &'static str {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => {
            let ratio = f64::from(w) / f64::from(h);
            if ratio >= 1.2 {
                "landscape"
            } else if ratio <= 0.8 {
                "portrait"
            } else {
                "square"
            }
        }
        _ => "unknown",
    }
}

fn resolution_bucket(width: Option<u32>, height: Option<u32>) -> String {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => {
            let megapixels = u64::from(w) * u64::from(h) / 1_000_000;
            format!("{megapixels}mp")
        }
        _ => "unknown".to_string(),
    }
}
