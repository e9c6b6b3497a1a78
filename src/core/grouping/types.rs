//! Result types for duplicate grouping.

use crate::core::model::PhotoItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a duplicate group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupCategory {
    /// Byte-identical content
    Exact,
    /// Perceptual distance within the strict thresholds
    VerySimilar,
    /// Perceptual distance within the loose thresholds only
    PossiblySimilar,
}

impl GroupCategory {
    /// Lowercase form used in stable group ids
    pub fn slug(&self) -> &'static str {
        match self {
            GroupCategory::Exact => "exact",
            GroupCategory::VerySimilar => "very_similar",
            GroupCategory::PossiblySimilar => "possibly_similar",
        }
    }
}

impl std::fmt::Display for GroupCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupCategory::Exact => write!(f, "Exact Duplicates"),
            GroupCategory::VerySimilar => write!(f, "Very Similar"),
            GroupCategory::PossiblySimilar => write!(f, "Possibly Similar"),
        }
    }
}

/// Hamming-distance cutoffs for the two similarity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityThresholds {
    pub dhash_very: u32,
    pub dhash_possible: u32,
    pub phash_very: u32,
    pub phash_possible: u32,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            dhash_very: 5,
            dhash_possible: 10,
            phash_very: 6,
            phash_possible: 12,
        }
    }
}

/// Summary projection of a photo item carried inside group results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoItemSummary {
    pub id: String,
    pub create_time: DateTime<Utc>,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub google_photos_deep_link: Option<String>,
}

impl From<&PhotoItem> for PhotoItemSummary {
    fn from(item: &PhotoItem) -> Self {
        Self {
            id: item.id.clone(),
            create_time: item.create_time,
            filename: item.filename.clone(),
            mime_type: item.mime_type.clone(),
            width: item.width,
            height: item.height,
            google_photos_deep_link: item.deep_link.clone(),
        }
    }
}

/// Earliest and latest members of a group by `(create_time, id)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRepresentativePair {
    pub earliest: PhotoItemSummary,
    pub latest: PhotoItemSummary,
}

/// One emitted duplicate group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResult {
    pub group_id: String,
    pub category: GroupCategory,
    pub items: Vec<PhotoItemSummary>,
    pub representative_pair: GroupRepresentativePair,
    pub more_count: usize,
    pub explanation: String,
    pub google_photos_deep_links: Vec<String>,
}
