//! Event normalizer
//!
//! Maps the raw search payloads coming back from the monitoring backend
//! (nested, optional-everywhere `_source` documents) into the canonical
//! record shapes. Every downstream component operates on canonical records
//! only. Malformed records are defaulted, never dropped, so aggregate totals
//! stay consistent with the input count.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::clients::monitor::{RawAssignment, RawFimFinding, RawHit};
use crate::models::{
    AgentAssignment, AlertRecord, FimAction, FimFinding, VulnSeverity, VulnerabilityRecord,
};

/// Width the monitoring backend uses for agent ids ("7" and "007" are the
/// same agent).
const AGENT_ID_WIDTH: usize = 3;

/// Normalize an agent id to the fixed-width zero-padded form.
pub fn pad_agent_id(raw: &str) -> String {
    let trimmed = raw.trim();
    format!("{:0>width$}", trimmed, width = AGENT_ID_WIDTH)
}

pub fn normalize_alerts(hits: Vec<RawHit>) -> Vec<AlertRecord> {
    hits.iter().map(normalize_alert).collect()
}

pub fn normalize_alert(hit: &RawHit) -> AlertRecord {
    let source = &hit.source;

    let rule_level = source
        .pointer("/rule/level")
        .and_then(Value::as_i64)
        .unwrap_or(0)
        .max(0) as u32;

    let rule_groups = source
        .pointer("/rule/groups")
        .and_then(Value::as_array)
        .map(|groups| {
            groups
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    AlertRecord {
        id: hit.id.clone().unwrap_or_default(),
        rule_id: string_at(source, "/rule/id"),
        rule_description: source
            .pointer("/rule/description")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("No Title")
            .to_string(),
        rule_level,
        rule_groups,
        agent_id: pad_agent_id(&string_at(source, "/agent/id")),
        agent_name: source
            .pointer("/agent/name")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Unknown")
            .to_string(),
        timestamp: source
            .pointer("/timestamp")
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        raw: source.clone(),
    }
}

pub fn normalize_vulnerabilities(hits: Vec<RawHit>) -> Vec<VulnerabilityRecord> {
    hits.iter().map(normalize_vulnerability).collect()
}

pub fn normalize_vulnerability(hit: &RawHit) -> VulnerabilityRecord {
    let source = &hit.source;

    let severity = source
        .pointer("/vulnerability/severity")
        .and_then(Value::as_str)
        .map(VulnSeverity::from_label)
        .unwrap_or(VulnSeverity::Unknown);

    let score_base = source
        .pointer("/vulnerability/score/base")
        .and_then(Value::as_f64);

    let id = source
        .pointer("/vulnerability/cve")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| hit.id.clone())
        .unwrap_or_default();

    let severity_disagrees = match (severity, score_base) {
        (VulnSeverity::Unknown, _) | (_, None) => false,
        (label, Some(score)) => cvss_band(score) != label,
    };
    if severity_disagrees {
        tracing::debug!(
            cve = %id,
            label = severity.as_str(),
            score = score_base.unwrap_or_default(),
            "vulnerability severity label disagrees with its score"
        );
    }

    VulnerabilityRecord {
        id,
        severity,
        score_base,
        package_name: source
            .pointer("/vulnerability/package/name")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Unknown")
            .to_string(),
        agent_id: pad_agent_id(&string_at(source, "/agent/id")),
        agent_name: source
            .pointer("/agent/name")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Unknown")
            .to_string(),
        scanner_reference: string_at(source, "/vulnerability/reference"),
        severity_disagrees,
    }
}

pub fn normalize_assignments(raw: Vec<RawAssignment>, user_email: &str) -> Vec<AgentAssignment> {
    raw.into_iter()
        .map(|a| AgentAssignment {
            user_email: user_email.to_string(),
            agent_id: pad_agent_id(&a.agent_id),
            agent_name: a.agent_name,
        })
        .collect()
}

pub fn normalize_fim_findings(raw: Vec<RawFimFinding>) -> Vec<FimFinding> {
    raw.into_iter()
        .map(|f| FimFinding {
            path: f.file,
            action: FimAction::from_label(&f.event),
            timestamp: f.date.as_deref().and_then(parse_timestamp),
            checksum_after: f.sha1_after,
            size_after: f.size_after,
        })
        .collect()
}

/// Parse the backend's timestamp formats. RFC 3339 first, then the
/// colon-less offset variant it emits on some indices, then a bare
/// date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Read a string-or-number field as a string; missing becomes "".
fn string_at(source: &Value, pointer: &str) -> String {
    match source.pointer(pointer) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// CVSS-style band for the numeric score, used only to flag disagreement
/// with the provider label.
fn cvss_band(score: f64) -> VulnSeverity {
    if score >= 9.0 {
        VulnSeverity::Critical
    } else if score >= 7.0 {
        VulnSeverity::High
    } else if score >= 4.0 {
        VulnSeverity::Medium
    } else {
        VulnSeverity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(source: Value) -> RawHit {
        RawHit {
            id: Some("abc123".to_string()),
            source,
        }
    }

    #[test]
    fn test_pad_agent_id() {
        assert_eq!(pad_agent_id("7"), "007");
        assert_eq!(pad_agent_id(" 42 "), "042");
        assert_eq!(pad_agent_id("007"), "007");
        assert_eq!(pad_agent_id("1234"), "1234");
    }

    #[test]
    fn test_normalize_full_alert() {
        let record = normalize_alert(&hit(json!({
            "timestamp": "2024-02-05T12:34:56.789+0000",
            "rule": {
                "id": 5710,
                "level": 10,
                "description": "sshd: Attempt to login using a non-existent user",
                "groups": ["syslog", "sshd", "authentication_failed"]
            },
            "agent": { "id": "3", "name": "web-01" }
        })));

        assert_eq!(record.id, "abc123");
        assert_eq!(record.rule_id, "5710");
        assert_eq!(record.rule_level, 10);
        assert_eq!(record.agent_id, "003");
        assert_eq!(record.agent_name, "web-01");
        assert_eq!(record.rule_groups.len(), 3);
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_malformed_alert_is_defaulted_not_dropped() {
        let record = normalize_alert(&hit(json!({ "data": { "srcip": "10.0.0.9" } })));
        assert_eq!(record.rule_level, 0);
        assert_eq!(record.rule_description, "No Title");
        assert_eq!(record.agent_id, "000");
        assert_eq!(record.agent_name, "Unknown");
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn test_negative_level_treated_as_zero() {
        let record = normalize_alert(&hit(json!({ "rule": { "level": -3 } })));
        assert_eq!(record.rule_level, 0);
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2024-02-05T12:34:56Z").is_some());
        assert!(parse_timestamp("2024-02-05T12:34:56.789+0000").is_some());
        assert!(parse_timestamp("2024-02-05 12:34:56").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_vulnerability_disagreement_flagged() {
        let record = normalize_vulnerability(&hit(json!({
            "vulnerability": {
                "cve": "CVE-2023-4863",
                "severity": "Low",
                "score": { "base": 9.8 },
                "package": { "name": "libwebp" },
                "reference": "https://nvd.nist.gov/vuln/detail/CVE-2023-4863"
            },
            "agent": { "id": "12", "name": "build-02" }
        })));

        assert_eq!(record.severity, VulnSeverity::Low);
        assert_eq!(record.score_base, Some(9.8));
        assert!(record.severity_disagrees);
    }

    #[test]
    fn test_vulnerability_unknown_severity_never_disagrees() {
        let record = normalize_vulnerability(&hit(json!({
            "vulnerability": { "severity": "whatever", "score": { "base": 9.8 } }
        })));
        assert_eq!(record.severity, VulnSeverity::Unknown);
        assert!(!record.severity_disagrees);
    }
}
