//! Severity taxonomy

use serde::{Deserialize, Serialize};

/// Ordered severity band assigned by the classifier.
///
/// `Unknown` exists only for vulnerability records whose provider label is
/// missing or unrecognized; alert classification never produces it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityBand {
    Unknown = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl SeverityBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::Unknown => "Unknown",
            SeverityBand::Low => "Low",
            SeverityBand::Medium => "Medium",
            SeverityBand::High => "High",
            SeverityBand::Critical => "Critical",
        }
    }

    /// High-severity means High or Critical; used by the compliance scorer.
    pub fn is_high_severity(&self) -> bool {
        matches!(self, SeverityBand::High | SeverityBand::Critical)
    }
}

/// Provider-supplied vulnerability severity label.
///
/// Sourced directly from the scanner and never re-derived from the numeric
/// score; the two are reported independently and may disagree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VulnSeverity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl VulnSeverity {
    /// Parse a provider label; trims whitespace, case-insensitive,
    /// anything unrecognized collapses to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => VulnSeverity::Critical,
            "high" => VulnSeverity::High,
            "medium" => VulnSeverity::Medium,
            "low" => VulnSeverity::Low,
            _ => VulnSeverity::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VulnSeverity::Critical => "Critical",
            VulnSeverity::High => "High",
            VulnSeverity::Medium => "Medium",
            VulnSeverity::Low => "Low",
            VulnSeverity::Unknown => "Unknown",
        }
    }

    pub fn band(&self) -> SeverityBand {
        match self {
            VulnSeverity::Critical => SeverityBand::Critical,
            VulnSeverity::High => SeverityBand::High,
            VulnSeverity::Medium => SeverityBand::Medium,
            VulnSeverity::Low => SeverityBand::Low,
            VulnSeverity::Unknown => SeverityBand::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_total_order() {
        assert!(SeverityBand::Critical > SeverityBand::High);
        assert!(SeverityBand::High > SeverityBand::Medium);
        assert!(SeverityBand::Medium > SeverityBand::Low);
        assert!(SeverityBand::Low > SeverityBand::Unknown);
    }

    #[test]
    fn test_vuln_label_parse() {
        assert_eq!(VulnSeverity::from_label("  High "), VulnSeverity::High);
        assert_eq!(VulnSeverity::from_label("CRITICAL"), VulnSeverity::Critical);
        assert_eq!(VulnSeverity::from_label("negligible"), VulnSeverity::Unknown);
        assert_eq!(VulnSeverity::from_label(""), VulnSeverity::Unknown);
    }
}
