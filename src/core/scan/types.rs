//! Scan result types.

use crate::core::grouping::GroupResult;
use serde::{Deserialize, Serialize};

/// Wall-clock stage timings in milliseconds, rounded to 2 decimals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub candidate_narrowing_ms: f64,
    pub byte_hashing_ms: f64,
    pub exact_grouping_ms: f64,
    pub perceptual_hashing_ms: f64,
}

/// Work counters collected across the scan's stages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub selected_images: u64,
    pub candidate_sets: u64,
    pub candidate_items: u64,
    pub byte_hashes: u64,
    pub perceptual_hashes: u64,
    pub comparisons_executed: u64,
    pub downloads_performed: u64,
}

/// Timings and counters for one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageMetrics {
    pub timings_ms: StageTimings,
    pub counts: StageCounts,
}

/// Estimated cost of the scan's work, each value rounded to 6 decimals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub total_cost: f64,
    pub download_cost: f64,
    pub hash_cost: f64,
    pub comparison_cost: f64,
}

/// Everything a scan returns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub run_id: String,
    pub input_count: usize,
    pub stage_metrics: StageMetrics,
    pub cost_estimate: CostEstimate,
    pub groups_exact: Vec<GroupResult>,
    pub groups_very_similar: Vec<GroupResult>,
    pub groups_possibly_similar: Vec<GroupResult>,
}

impl ScanResult {
    /// Total number of groups across all three categories
    pub fn total_groups(&self) -> usize {
        self.groups_exact.len() + self.groups_very_similar.len() + self.groups_possibly_similar.len()
    }
}
