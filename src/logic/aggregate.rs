//! Aggregator
//!
//! Grouped counts, top-N rankings, and the zero-filled trailing daily series
//! over a filtered, classified record set. Output ordering is deterministic:
//! descending count, ties broken by ascending key.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};

use crate::models::{AggregateBucket, ClassifiedAlert, VulnerabilityRecord};

pub const DEFAULT_TOP_N: usize = 5;

/// Trailing window of the daily series, including today.
pub const DAILY_WINDOW_DAYS: u64 = 10;

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Grouping dimension for alert aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Agent,
    Rule,
    Day,
    Severity,
}

/// Grouping dimension for vulnerability aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VulnDimension {
    Agent,
    Package,
    Severity,
}

/// Fold records into buckets by an extracted key. A `None` key skips the
/// record; only the day dimension ever produces one.
pub fn count_by<T, F>(records: &[T], key_fn: F) -> Vec<AggregateBucket>
where
    F: Fn(&T) -> Option<String>,
{
    let mut counts: HashMap<String, u64> = HashMap::new();
    for record in records {
        if let Some(key) = key_fn(record) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    let mut buckets: Vec<AggregateBucket> = counts
        .into_iter()
        .map(|(key, count)| AggregateBucket { key, count })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    buckets
}

pub fn aggregate(records: &[ClassifiedAlert], dimension: Dimension) -> Vec<AggregateBucket> {
    match dimension {
        Dimension::Agent => count_by(records, |r| Some(r.record.agent_name.clone())),
        Dimension::Rule => count_by(records, |r| Some(r.record.rule_description.clone())),
        Dimension::Day => count_by(records, |r| {
            r.record
                .timestamp
                .map(|ts| ts.date_naive().format(DAY_KEY_FORMAT).to_string())
        }),
        Dimension::Severity => count_by(records, |r| Some(r.band.as_str().to_string())),
    }
}

/// First `n` buckets of the aggregation.
pub fn top_n(records: &[ClassifiedAlert], dimension: Dimension, n: usize) -> Vec<AggregateBucket> {
    let mut buckets = aggregate(records, dimension);
    buckets.truncate(n);
    buckets
}

pub fn aggregate_vulnerabilities(
    records: &[VulnerabilityRecord],
    dimension: VulnDimension,
) -> Vec<AggregateBucket> {
    match dimension {
        VulnDimension::Agent => count_by(records, |r| Some(r.agent_name.clone())),
        VulnDimension::Package => count_by(records, |r| Some(r.package_name.clone())),
        VulnDimension::Severity => count_by(records, |r| Some(r.severity.as_str().to_string())),
    }
}

pub fn top_n_vulnerabilities(
    records: &[VulnerabilityRecord],
    dimension: VulnDimension,
    n: usize,
) -> Vec<AggregateBucket> {
    let mut buckets = aggregate_vulnerabilities(records, dimension);
    buckets.truncate(n);
    buckets
}

/// Time-series variant: one bucket per calendar day for the trailing window
/// ending at `today`, zero-filled so charts render a continuous axis.
/// Oldest day first.
pub fn daily_series(records: &[ClassifiedAlert], today: NaiveDate) -> Vec<AggregateBucket> {
    let mut counts: HashMap<NaiveDate, u64> = HashMap::new();
    for record in records {
        if let Some(ts) = record.record.timestamp {
            *counts.entry(ts.date_naive()).or_insert(0) += 1;
        }
    }

    (0..DAILY_WINDOW_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|day| AggregateBucket {
            key: day.format(DAY_KEY_FORMAT).to_string(),
            count: counts.get(&day).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::classify::classify_alert_level;
    use crate::logic::normalize::pad_agent_id;
    use crate::models::AlertRecord;
    use chrono::{TimeZone, Utc};

    fn alert(agent: &str, rule: &str, level: u32, day: Option<u32>) -> ClassifiedAlert {
        let record = AlertRecord {
            id: String::new(),
            rule_id: "100".to_string(),
            rule_description: rule.to_string(),
            rule_level: level,
            rule_groups: vec![],
            agent_id: pad_agent_id(agent),
            agent_name: format!("host-{agent}"),
            timestamp: day.map(|d| Utc.with_ymd_and_hms(2024, 3, d, 10, 0, 0).unwrap()),
            raw: serde_json::Value::Null,
        };
        let band = classify_alert_level(record.rule_level);
        ClassifiedAlert { record, band }
    }

    fn fixture() -> Vec<ClassifiedAlert> {
        vec![
            alert("1", "Brute force", 10, Some(14)),
            alert("1", "Brute force", 10, Some(14)),
            alert("2", "Rootkit check", 15, Some(13)),
            alert("2", "Brute force", 7, Some(12)),
            alert("3", "Integrity checksum changed", 7, None),
        ]
    }

    #[test]
    fn test_sum_invariant_all_dimensions() {
        let records = fixture();
        for dim in [Dimension::Agent, Dimension::Rule, Dimension::Severity] {
            let total: u64 = aggregate(&records, dim).iter().map(|b| b.count).sum();
            assert_eq!(total, records.len() as u64, "dimension {dim:?}");
        }
        // Day skips the single record without a parseable timestamp.
        let total: u64 = aggregate(&records, Dimension::Day).iter().map(|b| b.count).sum();
        assert_eq!(total, records.len() as u64 - 1);
    }

    #[test]
    fn test_ordering_count_desc_key_asc() {
        let records = fixture();
        let buckets = aggregate(&records, Dimension::Agent);
        // host-1 and host-2 tie at 2; the lexicographically smaller key wins.
        assert_eq!(buckets[0].key, "host-1");
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[1].key, "host-2");
        assert_eq!(buckets[2].key, "host-3");
    }

    #[test]
    fn test_tie_break_is_lexicographic() {
        let records = vec![
            alert("1", "b rule", 3, None),
            alert("1", "a rule", 3, None),
        ];
        let buckets = aggregate(&records, Dimension::Rule);
        assert_eq!(buckets[0].key, "a rule");
        assert_eq!(buckets[1].key, "b rule");
    }

    #[test]
    fn test_top_n_truncates() {
        let records = fixture();
        assert_eq!(top_n(&records, Dimension::Rule, 1).len(), 1);
        assert_eq!(top_n(&records, Dimension::Rule, 1)[0].key, "Brute force");
    }

    #[test]
    fn test_daily_series_window_has_no_gaps() {
        let records = fixture();
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let series = daily_series(&records, today);

        assert_eq!(series.len(), DAILY_WINDOW_DAYS as usize);
        assert_eq!(series.first().unwrap().key, "2024-03-05");
        assert_eq!(series.last().unwrap().key, "2024-03-14");
        assert_eq!(series.last().unwrap().count, 2);
        // Every day present, including empty ones.
        assert!(series.iter().any(|b| b.key == "2024-03-08" && b.count == 0));
    }

    #[test]
    fn test_severity_dimension_uses_classified_band() {
        let records = fixture();
        let buckets = aggregate(&records, Dimension::Severity);
        let critical = buckets.iter().find(|b| b.key == "Critical").unwrap();
        assert_eq!(critical.count, 1);
        let medium = buckets.iter().find(|b| b.key == "Medium").unwrap();
        assert_eq!(medium.count, 2);
    }
}
