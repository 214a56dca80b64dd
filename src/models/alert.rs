//! Canonical alert record

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SeverityBand;

/// Canonical intrusion/log alert, produced by the event normalizer.
///
/// Immutable once built; lifecycle is request-scoped. All downstream
/// components (filter, classifier, aggregator) operate only on this shape,
/// never on the raw search payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlertRecord {
    pub id: String,
    pub rule_id: String,
    pub rule_description: String,
    /// Source-provided integer severity score, conventionally 0-16.
    /// Missing or negative values normalize to 0.
    pub rule_level: u32,
    pub rule_groups: Vec<String>,
    /// Zero-padded to width 3.
    pub agent_id: String,
    pub agent_name: String,
    /// None when the source timestamp could not be parsed; such records are
    /// skipped by the day dimension only.
    pub timestamp: Option<DateTime<Utc>>,
    /// Opaque pass-through for display and summarization.
    pub raw: serde_json::Value,
}

/// An alert paired with its classified band.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassifiedAlert {
    pub record: AlertRecord,
    pub band: SeverityBand,
}
