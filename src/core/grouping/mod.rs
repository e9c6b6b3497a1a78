//! # Grouping Module
//!
//! Turns hashes into explained duplicate groups.
//!
//! ## Categories
//! | Category | Meaning |
//! |---|---|
//! | EXACT | identical SHA-256 content digests |
//! | VERY_SIMILAR | dHash or pHash within the strict thresholds |
//! | POSSIBLY_SIMILAR | dHash or pHash within the loose thresholds |
//!
//! A photo belongs to at most one category: exact membership preempts the
//! perceptual tiers (the orchestrator excludes exact members before
//! perceptual hashing), and very-similar membership preempts
//! possibly-similar.

mod near;
mod types;

pub use near::{group_near_duplicates, NearDuplicateGroups};
pub use types::{
    GroupCategory, GroupRepresentativePair, GroupResult, PhotoItemSummary, SimilarityThresholds,
};

use crate::core::model::PhotoItem;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;

/// Group byte-identical items by their SHA-256 digest.
///
/// Only items present in `byte_hashes` participate. Groups are emitted in
/// ascending digest order so equal inputs always produce the same output.
pub fn group_exact_duplicates(
    items: &[PhotoItem],
    byte_hashes: &BTreeMap<String, String>,
) -> Vec<GroupResult> {
    let mut buckets: BTreeMap<&str, Vec<PhotoItem>> = BTreeMap::new();
    for item in items {
        if let Some(digest) = byte_hashes.get(&item.id) {
            buckets.entry(digest).or_default().push(item.clone());
        }
    }

    let components: Vec<Vec<PhotoItem>> = buckets
        .into_values()
        .filter(|bucket| bucket.len() >= 2)
        .collect();

    build_groups(
        components,
        GroupCategory::Exact,
        "Byte-identical content (SHA-256 match).",
    )
}

/// Earliest and latest members of a component by `(create_time, id)`
pub fn select_representative_pair(items: &[PhotoItem]) -> GroupRepresentativePair {
    let mut ordered: Vec<&PhotoItem> = items.iter().collect();
    ordered.sort_by(|a, b| (a.create_time, &a.id).cmp(&(b.create_time, &b.id)));
    GroupRepresentativePair {
        earliest: PhotoItemSummary::from(ordered[0]),
        latest: PhotoItemSummary::from(ordered[ordered.len() - 1]),
    }
}

/// Emit one `GroupResult` per component, members sorted by
/// `(create_time, id)`
pub(crate) fn build_groups(
    components: Vec<Vec<PhotoItem>>,
    category: GroupCategory,
    explanation: &str,
) -> Vec<GroupResult> {
    components
        .into_iter()
        .map(|mut component| {
            component.sort_by(|a, b| (a.create_time, &a.id).cmp(&(b.create_time, &b.id)));
            let representative_pair = select_representative_pair(&component);
            GroupResult {
                group_id: stable_group_id(category, &component),
                category,
                more_count: component.len().saturating_sub(2),
                explanation: explanation.to_string(),
                google_photos_deep_links: component
                    .iter()
                    .filter_map(|item| item.deep_link.clone())
                    .collect(),
                representative_pair,
                items: component.iter().map(PhotoItemSummary::from).collect(),
            }
        })
        .collect()
}

/// `"{category}-{first 12 hex of SHA-1 over member ids joined by '|'}"`.
///
/// Stable across runs because members are already in canonical order.
fn stable_group_id(category: GroupCategory, items: &[PhotoItem]) -> String {
    let joined = items
        .iter()
        .map(|item| item.id.as_str())
        .collect::<Vec<_>>()
        .join("|");
    let digest = format!("{:x}", Sha1::digest(joined.as_bytes()));
    format!("{}-{}", category.slug(), &digest[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn photo(id: &str, create_time: DateTime<Utc>) -> PhotoItem {
        PhotoItem::new(id, create_time)
            .with_dimensions(120, 80)
            .with_download_url(format!("https://photos.google.com/{id}"))
    }

    fn digests(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(id, digest)| (id.to_string(), digest.to_string()))
            .collect()
    }

    #[test]
    fn groups_items_sharing_a_digest() {
        let items = vec![photo("dup1", base_time()), photo("dup2", base_time())];
        let byte_hashes = digests(&[("dup1", "aaaa"), ("dup2", "aaaa")]);

        let groups = group_exact_duplicates(&items, &byte_hashes);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].category, GroupCategory::Exact);
        assert_eq!(member_ids(&groups[0]), vec!["dup1", "dup2"]);
        assert_eq!(groups[0].explanation, "Byte-identical content (SHA-256 match).");
    }

    #[test]
    fn unique_digests_produce_no_groups() {
        let items = vec![photo("a", base_time()), photo("b", base_time())];
        let byte_hashes = digests(&[("a", "aaaa"), ("b", "bbbb")]);

        assert!(group_exact_duplicates(&items, &byte_hashes).is_empty());
    }

    #[test]
    fn items_without_digests_are_ignored() {
        let items = vec![
            photo("hashed1", base_time()),
            photo("hashed2", base_time()),
            photo("no-url", base_time()),
        ];
        let byte_hashes = digests(&[("hashed1", "cccc"), ("hashed2", "cccc")]);

        let groups = group_exact_duplicates(&items, &byte_hashes);

        assert_eq!(groups.len(), 1);
        assert_eq!(member_ids(&groups[0]), vec!["hashed1", "hashed2"]);
    }

    #[test]
    fn groups_emit_in_digest_order() {
        let items = vec![
            photo("z1", base_time()),
            photo("z2", base_time()),
            photo("a1", base_time()),
            photo("a2", base_time()),
        ];
        let byte_hashes = digests(&[
            ("z1", "ffff"),
            ("z2", "ffff"),
            ("a1", "0000"),
            ("a2", "0000"),
        ]);

        let groups = group_exact_duplicates(&items, &byte_hashes);

        assert_eq!(member_ids(&groups[0]), vec!["a1", "a2"]);
        assert_eq!(member_ids(&groups[1]), vec!["z1", "z2"]);
    }

    #[test]
    fn representative_pair_picks_earliest_and_latest() {
        let items = vec![
            photo("alpha", base_time() + Duration::minutes(2)),
            photo("beta", base_time()),
            photo("gamma", base_time() + Duration::minutes(5)),
        ];

        let pair = select_representative_pair(&items);

        assert_eq!(pair.earliest.id, "beta");
        assert_eq!(pair.latest.id, "gamma");
    }

    #[test]
    fn representative_pair_breaks_time_ties_by_id() {
        let items = vec![photo("b", base_time()), photo("a", base_time())];

        let pair = select_representative_pair(&items);

        assert_eq!(pair.earliest.id, "a");
        assert_eq!(pair.latest.id, "b");
    }

    #[test]
    fn two_member_group_fills_both_slots() {
        let items = vec![photo("x", base_time()), photo("y", base_time())];
        let groups = build_groups(vec![items], GroupCategory::Exact, "why");

        let pair = &groups[0].representative_pair;
        assert_eq!(pair.earliest.id, "x");
        assert_eq!(pair.latest.id, "y");
        assert_eq!(groups[0].more_count, 0);
    }

    #[test]
    fn more_count_is_len_minus_two() {
        let items: Vec<PhotoItem> = (0..5)
            .map(|i| photo(&format!("p{i}"), base_time() + Duration::minutes(i)))
            .collect();

        let groups = build_groups(vec![items], GroupCategory::VerySimilar, "why");

        assert_eq!(groups[0].more_count, 3);
    }

    #[test]
    fn group_id_is_stable_and_category_prefixed() {
        let items = vec![photo("a", base_time()), photo("b", base_time())];

        let first = build_groups(vec![items.clone()], GroupCategory::VerySimilar, "why");
        let second = build_groups(vec![items], GroupCategory::VerySimilar, "why");

        assert_eq!(first[0].group_id, second[0].group_id);
        assert!(first[0].group_id.starts_with("very_similar-"));
        // prefix + 12 hex chars
        assert_eq!(first[0].group_id.len(), "very_similar-".len() + 12);
    }

    #[test]
    fn deep_links_keep_member_order_and_skip_nulls() {
        let with_link = photo("a", base_time()).with_deep_link("https://photos.google.com/photo/a");
        let without_link = photo("b", base_time() + Duration::minutes(1));
        let later_link = photo("c", base_time() + Duration::minutes(2))
            .with_deep_link("https://photos.google.com/photo/c");

        let groups = build_groups(
            vec![vec![later_link, without_link, with_link]],
            GroupCategory::Exact,
            "why",
        );

        assert_eq!(
            groups[0].google_photos_deep_links,
            vec![
                "https://photos.google.com/photo/a".to_string(),
                "https://photos.google.com/photo/c".to_string(),
            ]
        );
    }

    fn member_ids(group: &GroupResult) -> Vec<&str> {
        group.items.iter().map(|i| i.id.as_str()).collect()
    }
}
