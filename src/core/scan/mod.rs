//! # Scan Module
//!
//! Orchestrates the full detection pipeline for one scan.
//!
//! ## Pipeline Stages
//! 1. **Candidate narrowing** - bucket items into comparable sets
//! 2. **Byte hashing** - SHA-256 for every item with a download URL
//! 3. **Exact grouping** - equivalence classes over digests
//! 4. **Perceptual hashing** - dHash/pHash + similarity grouping over the
//!    candidate sets that remain after dropping URL-less items and exact
//!    members
//!
//! The scan runs strictly sequentially on the calling thread and returns a
//! single [`ScanResult`]. Stage timings, work counters and the cost
//! estimate ride along; progress events go out through the events module.

mod types;

pub use types::{CostEstimate, ScanResult, StageCounts, StageMetrics, StageTimings};

use crate::config::ScanSettings;
use crate::core::candidates::build_candidate_sets;
use crate::core::download::DownloadManager;
use crate::core::grouping::{group_exact_duplicates, group_near_duplicates};
use crate::core::hasher::{HashingService, PerceptualHashes};
use crate::core::model::PhotoItem;
use crate::events::{null_sender, Event, EventSender, ScanEvent, ScanStage};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Run one scan without progress reporting
pub fn run_scan(
    items: Vec<PhotoItem>,
    settings: &ScanSettings,
    downloads: DownloadManager,
) -> crate::Result<ScanResult> {
    run_scan_with_events(items, settings, downloads, &null_sender())
}

/// Run one scan, emitting progress events as stages advance
pub fn run_scan_with_events(
    items: Vec<PhotoItem>,
    settings: &ScanSettings,
    downloads: DownloadManager,
    events: &EventSender,
) -> crate::Result<ScanResult> {
    let run_id = Uuid::new_v4().as_simple().to_string();
    let span = tracing::info_span!("scan", run_id = %run_id);
    let _guard = span.enter();

    let mut hashing = HashingService::new(downloads);
    let mut timings = StageTimings::default();
    let mut counts = StageCounts {
        selected_images: items.len() as u64,
        ..StageCounts::default()
    };

    events.send(Event::Scan(ScanEvent::Started {
        run_id: run_id.clone(),
        total_items: items.len(),
    }));

    // Stage 1: candidate narrowing
    events.send(stage_started(ScanStage::CandidateNarrowing));
    let start = Instant::now();
    let candidate_sets = build_candidate_sets(&items);
    timings.candidate_narrowing_ms = elapsed_ms(start);
    counts.candidate_sets = candidate_sets.len() as u64;
    counts.candidate_items = candidate_sets.iter().map(|set| set.len() as u64).sum();
    events.send(stage_completed(
        ScanStage::CandidateNarrowing,
        timings.candidate_narrowing_ms,
    ));
    debug!(
        candidate_sets = counts.candidate_sets,
        candidate_items = counts.candidate_items,
        "candidate narrowing complete"
    );

    // Stage 2: byte hashing for every item with a download URL
    events.send(stage_started(ScanStage::ByteHashing));
    let start = Instant::now();
    let downloadable: Vec<&PhotoItem> = items
        .iter()
        .filter(|item| item.download_url.is_some())
        .collect();
    let mut byte_hashes: BTreeMap<String, String> = BTreeMap::new();
    for (index, &item) in downloadable.iter().enumerate() {
        byte_hashes.insert(item.id.clone(), hashing.get_byte_hash(item)?);
        events.send(Event::Scan(ScanEvent::HashProgress {
            stage: ScanStage::ByteHashing,
            completed: index + 1,
            total: downloadable.len(),
        }));
    }
    timings.byte_hashing_ms = elapsed_ms(start);
    counts.byte_hashes = hashing.byte_hash_count();
    events.send(stage_completed(ScanStage::ByteHashing, timings.byte_hashing_ms));

    // Stage 3: exact grouping
    events.send(stage_started(ScanStage::ExactGrouping));
    let start = Instant::now();
    let groups_exact = group_exact_duplicates(&items, &byte_hashes);
    timings.exact_grouping_ms = elapsed_ms(start);
    events.send(stage_completed(ScanStage::ExactGrouping, timings.exact_grouping_ms));

    // Items whose digest appears at least twice stay out of the perceptual
    // stages: they are already grouped exactly.
    let mut digest_multiplicity: HashMap<&str, u32> = HashMap::new();
    for digest in byte_hashes.values() {
        *digest_multiplicity.entry(digest.as_str()).or_default() += 1;
    }
    let exact_duplicate_ids: std::collections::HashSet<&str> = byte_hashes
        .iter()
        .filter(|(_, digest)| digest_multiplicity[digest.as_str()] >= 2)
        .map(|(id, _)| id.as_str())
        .collect();

    let hashable_candidate_sets: Vec<Vec<PhotoItem>> = candidate_sets
        .into_iter()
        .map(|set| {
            set.into_iter()
                .filter(|item| {
                    item.download_url.is_some() && !exact_duplicate_ids.contains(item.id.as_str())
                })
                .collect::<Vec<_>>()
        })
        .filter(|set: &Vec<PhotoItem>| set.len() >= 2)
        .collect();

    // Stage 4: perceptual hashing + near-duplicate grouping
    events.send(stage_started(ScanStage::PerceptualHashing));
    let start = Instant::now();
    let hashable_total: usize = hashable_candidate_sets.iter().map(Vec::len).sum();
    let mut perceptual_hashes: HashMap<String, PerceptualHashes> = HashMap::new();
    let mut completed = 0;
    for item in hashable_candidate_sets.iter().flatten() {
        perceptual_hashes.insert(item.id.clone(), hashing.get_perceptual_hashes(item)?);
        completed += 1;
        events.send(Event::Scan(ScanEvent::HashProgress {
            stage: ScanStage::PerceptualHashing,
            completed,
            total: hashable_total,
        }));
    }
    let near = group_near_duplicates(
        &hashable_candidate_sets,
        &perceptual_hashes,
        &settings.thresholds(),
    );
    timings.perceptual_hashing_ms = elapsed_ms(start);
    counts.perceptual_hashes = hashing.perceptual_hash_count();
    counts.comparisons_executed = near.comparisons;
    counts.downloads_performed = hashing.download_count();
    events.send(stage_completed(
        ScanStage::PerceptualHashing,
        timings.perceptual_hashing_ms,
    ));

    let cost_estimate = estimate_costs(settings, &counts);
    let result = ScanResult {
        run_id,
        input_count: items.len(),
        stage_metrics: StageMetrics {
            timings_ms: timings,
            counts,
        },
        cost_estimate,
        groups_exact,
        groups_very_similar: near.very_similar,
        groups_possibly_similar: near.possibly_similar,
    };

    events.send(Event::Scan(ScanEvent::Completed {
        groups_found: result.total_groups(),
    }));
    info!(
        run_id = %result.run_id,
        groups = result.total_groups(),
        comparisons = counts.comparisons_executed,
        "scan complete"
    );
    Ok(result)
}

fn estimate_costs(settings: &ScanSettings, counts: &StageCounts) -> CostEstimate {
    let download_cost = counts.downloads_performed as f64 * settings.scan_cost_per_download;
    let hash_cost = counts.byte_hashes as f64 * settings.scan_cost_per_byte_hash
        + counts.perceptual_hashes as f64 * settings.scan_cost_per_perceptual_hash;
    let comparison_cost = counts.comparisons_executed as f64 * settings.scan_cost_per_comparison;
    CostEstimate {
        total_cost: round6(download_cost + hash_cost + comparison_cost),
        download_cost: round6(download_cost),
        hash_cost: round6(hash_cost),
        comparison_cost: round6(comparison_cost),
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    (start.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn stage_started(stage: ScanStage) -> Event {
    Event::Scan(ScanEvent::StageStarted { stage })
}

fn stage_completed(stage: ScanStage, elapsed_ms: f64) -> Event {
    Event::Scan(ScanEvent::StageCompleted { stage, elapsed_ms })
}
