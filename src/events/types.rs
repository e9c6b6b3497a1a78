//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};

/// All events emitted by the scan pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scan lifecycle and stage events
    Scan(ScanEvent),
}

/// The sequential stages of one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStage {
    /// Bucketing items into comparable candidate sets
    CandidateNarrowing,
    /// SHA-256 content digests for exact-duplicate detection
    ByteHashing,
    /// Grouping byte-identical items
    ExactGrouping,
    /// dHash/pHash computation and similarity grouping
    PerceptualHashing,
}

impl std::fmt::Display for ScanStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStage::CandidateNarrowing => write!(f, "candidate narrowing"),
            ScanStage::ByteHashing => write!(f, "byte hashing"),
            ScanStage::ExactGrouping => write!(f, "exact grouping"),
            ScanStage::PerceptualHashing => write!(f, "perceptual hashing"),
        }
    }
}

/// Events during one scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// The scan has started
    Started { run_id: String, total_items: usize },
    /// A pipeline stage has started
    StageStarted { stage: ScanStage },
    /// Progress update inside a hashing stage
    HashProgress {
        stage: ScanStage,
        completed: usize,
        total: usize,
    },
    /// A pipeline stage has completed
    StageCompleted { stage: ScanStage, elapsed_ms: f64 },
    /// The scan has completed
    Completed { groups_found: usize },
}
