//! Canonical vulnerability record

use serde::Serialize;

use super::VulnSeverity;

/// Canonical vulnerability scan finding, produced by the event normalizer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VulnerabilityRecord {
    pub id: String,
    /// Provider-supplied label, never re-derived from `score_base`.
    pub severity: VulnSeverity,
    /// CVSS-like numeric score, reported independently of `severity`.
    pub score_base: Option<f64>,
    pub package_name: String,
    /// Zero-padded to width 3.
    pub agent_id: String,
    pub agent_name: String,
    pub scanner_reference: String,
    /// Set when the provider label and the score's CVSS band disagree.
    /// The disagreement is flagged, never reconciled.
    pub severity_disagrees: bool,
}
