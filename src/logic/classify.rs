//! Severity classifier
//!
//! Owns the single canonical alert-level threshold table. Upstream views used
//! to carry their own divergent cut points; every consumer now goes through
//! `classify_alert_level` so the bands stay consistent across the dashboard.

use crate::models::{SeverityBand, VulnSeverity};

/// Alert-level cut points, applied in descending order.
pub const CRITICAL_FLOOR: u32 = 15;
pub const HIGH_FLOOR: u32 = 12;
pub const MEDIUM_FLOOR: u32 = 7;

/// Classify an alert by its normalized rule level.
///
/// Pure; the normalizer has already collapsed missing/negative levels to 0.
pub fn classify_alert_level(level: u32) -> SeverityBand {
    if level >= CRITICAL_FLOOR {
        SeverityBand::Critical
    } else if level >= HIGH_FLOOR {
        SeverityBand::High
    } else if level >= MEDIUM_FLOOR {
        SeverityBand::Medium
    } else {
        SeverityBand::Low
    }
}

/// Classify a vulnerability by its provider label. The numeric score plays
/// no part here; label/score disagreement is flagged at normalization time.
pub fn classify_vulnerability(severity: VulnSeverity) -> SeverityBand {
    severity.band()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_levels() {
        assert_eq!(classify_alert_level(15), SeverityBand::Critical);
        assert_eq!(classify_alert_level(14), SeverityBand::High);
        assert_eq!(classify_alert_level(12), SeverityBand::High);
        assert_eq!(classify_alert_level(11), SeverityBand::Medium);
        assert_eq!(classify_alert_level(7), SeverityBand::Medium);
        assert_eq!(classify_alert_level(6), SeverityBand::Low);
        assert_eq!(classify_alert_level(0), SeverityBand::Low);
    }

    #[test]
    fn test_exactly_one_band() {
        for level in 0..=20 {
            let band = classify_alert_level(level);
            assert_ne!(band, SeverityBand::Unknown);
        }
    }

    #[test]
    fn test_vulnerability_label_passthrough() {
        assert_eq!(
            classify_vulnerability(VulnSeverity::Critical),
            SeverityBand::Critical
        );
        assert_eq!(
            classify_vulnerability(VulnSeverity::Unknown),
            SeverityBand::Unknown
        );
    }
}
