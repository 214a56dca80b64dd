//! Compliance scorer
//!
//! Derives a single health percentage and qualitative band from classified
//! severity counts. Recomputed whenever the filtered record set changes;
//! pure, no side effects.

use serde::Serialize;

use crate::models::SeverityBand;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ComplianceBand {
    Excellent,
    Good,
    NeedsImprovement,
    Critical,
}

impl ComplianceBand {
    fn for_percentage(percentage: u8) -> Self {
        if percentage >= 90 {
            ComplianceBand::Excellent
        } else if percentage >= 75 {
            ComplianceBand::Good
        } else if percentage >= 50 {
            ComplianceBand::NeedsImprovement
        } else {
            ComplianceBand::Critical
        }
    }
}

/// An empty record set is a distinguishable "no data" state, not a true 0%:
/// the two mean different things to an operator.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComplianceSummary {
    NoData,
    Scored { percentage: u8, band: ComplianceBand },
}

pub fn score<I>(bands: I) -> ComplianceSummary
where
    I: IntoIterator<Item = SeverityBand>,
{
    let mut total: u64 = 0;
    let mut high: u64 = 0;
    for band in bands {
        total += 1;
        if band.is_high_severity() {
            high += 1;
        }
    }

    if total == 0 {
        return ComplianceSummary::NoData;
    }

    let percentage = (((total - high) as f64 / total as f64) * 100.0).round() as u8;
    ComplianceSummary::Scored {
        percentage,
        band: ComplianceBand::for_percentage(percentage),
    }
}
