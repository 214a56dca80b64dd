//! File-integrity-monitoring models

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to the monitored file.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FimAction {
    Added,
    Modified,
    Deleted,
    Unknown,
}

impl FimAction {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "added" => FimAction::Added,
            "modified" => FimAction::Modified,
            "deleted" => FimAction::Deleted,
            _ => FimAction::Unknown,
        }
    }
}

/// One finding from a FIM scan, used as assistant prompt payload and for
/// per-agent result views.
#[derive(Debug, Clone, Serialize)]
pub struct FimFinding {
    pub path: String,
    pub action: FimAction,
    pub timestamp: Option<DateTime<Utc>>,
    pub checksum_after: Option<String>,
    pub size_after: Option<u64>,
}
