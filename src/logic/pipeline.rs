//! Fetch-cycle orchestration
//!
//! One fetch cycle runs normalize -> filter -> classify to completion before
//! any aggregation or scoring begins, so buckets are never computed over a
//! partially filtered set. Cycles carry a monotonically increasing token;
//! when cycles race, the last request wins and a stale cycle's results are
//! discarded instead of overwriting the snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::clients::monitor::{MonitorClient, SearchRequest};
use crate::logic::access::ViewerScope;
use crate::logic::aggregate::{
    aggregate, aggregate_vulnerabilities, daily_series, top_n, top_n_vulnerabilities, Dimension,
    VulnDimension, DEFAULT_TOP_N,
};
use crate::logic::classify::classify_alert_level;
use crate::logic::compliance::{self, ComplianceSummary};
use crate::logic::mitre::{self, MitreEntry};
use crate::logic::normalize::{normalize_alerts, normalize_assignments, normalize_vulnerabilities};
use crate::middleware::auth::ViewerContext;
use crate::models::{AggregateBucket, AlertRecord, ClassifiedAlert, VulnerabilityRecord};

/// Monotonic token source for "last request wins".
#[derive(Debug, Default)]
pub struct RequestTracker {
    seq: AtomicU64,
}

impl RequestTracker {
    pub fn begin(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.seq.load(Ordering::SeqCst) == token
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlertsOverview {
    /// True when the upstream fetch failed and the view degraded to an empty
    /// working set (non-fatal banner).
    pub degraded: bool,
    pub total: u64,
    pub severity: Vec<AggregateBucket>,
    pub top_agents: Vec<AggregateBucket>,
    pub top_rules: Vec<AggregateBucket>,
    pub daily: Vec<AggregateBucket>,
    pub compliance: ComplianceSummary,
    pub mitre_references: Vec<MitreEntry>,
    pub tactic_distribution: Vec<AggregateBucket>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VulnerabilitiesOverview {
    pub degraded: bool,
    pub total: u64,
    pub severity: Vec<AggregateBucket>,
    pub top_agents: Vec<AggregateBucket>,
    pub top_packages: Vec<AggregateBucket>,
    pub compliance: ComplianceSummary,
    /// Records whose provider label disagrees with their numeric score.
    pub severity_disagreements: u64,
}

pub fn classify_alerts(records: Vec<AlertRecord>) -> Vec<ClassifiedAlert> {
    records
        .into_iter()
        .map(|record| {
            let band = classify_alert_level(record.rule_level);
            ClassifiedAlert { record, band }
        })
        .collect()
}

/// Pure view assembly over an already filtered and classified record set.
/// Deterministic: the same input always yields the same buckets.
pub fn build_alerts_overview(
    records: &[ClassifiedAlert],
    degraded: bool,
    today: NaiveDate,
) -> AlertsOverview {
    let top_rules = top_n(records, Dimension::Rule, DEFAULT_TOP_N);
    let mitre_references = mitre::cross_reference(top_rules.iter().map(|b| b.key.as_str()));
    let tactic_distribution = mitre::tactic_distribution(&top_rules);

    AlertsOverview {
        degraded,
        total: records.len() as u64,
        severity: aggregate(records, Dimension::Severity),
        top_agents: top_n(records, Dimension::Agent, DEFAULT_TOP_N),
        top_rules,
        daily: daily_series(records, today),
        compliance: compliance::score(records.iter().map(|c| c.band)),
        mitre_references,
        tactic_distribution,
    }
}

pub fn build_vulnerabilities_overview(
    records: &[VulnerabilityRecord],
    degraded: bool,
) -> VulnerabilitiesOverview {
    VulnerabilitiesOverview {
        degraded,
        total: records.len() as u64,
        severity: aggregate_vulnerabilities(records, VulnDimension::Severity),
        top_agents: top_n_vulnerabilities(records, VulnDimension::Agent, DEFAULT_TOP_N),
        top_packages: top_n_vulnerabilities(records, VulnDimension::Package, DEFAULT_TOP_N),
        compliance: compliance::score(records.iter().map(|r| r.severity.band())),
        severity_disagreements: records.iter().filter(|r| r.severity_disagrees).count() as u64,
    }
}

/// Orchestrates fetch cycles and owns the published view snapshots.
pub struct ViewService {
    monitor: Arc<MonitorClient>,
    page_size: usize,
    alert_cycles: RequestTracker,
    vuln_cycles: RequestTracker,
    alerts_snapshot: RwLock<Option<AlertsOverview>>,
    vulns_snapshot: RwLock<Option<VulnerabilitiesOverview>>,
}

impl ViewService {
    pub fn new(monitor: Arc<MonitorClient>, page_size: usize) -> Self {
        Self {
            monitor,
            page_size,
            alert_cycles: RequestTracker::default(),
            vuln_cycles: RequestTracker::default(),
            alerts_snapshot: RwLock::new(None),
            vulns_snapshot: RwLock::new(None),
        }
    }

    /// Resolve what the viewer may see. An unresolved identity or a failed
    /// assignment lookup denies everything; access never fails open.
    pub async fn viewer_scope(&self, viewer: &ViewerContext) -> ViewerScope {
        if viewer.role.is_admin() {
            return ViewerScope::Unrestricted;
        }
        match self.monitor.assigned_agents(&viewer.email).await {
            Ok(raw) => {
                let assignments = normalize_assignments(raw, &viewer.email);
                ViewerScope::for_viewer(viewer.role, &assignments)
            }
            Err(e) => {
                tracing::warn!(
                    viewer = %viewer.email,
                    error = %e,
                    "assignment lookup failed; denying scope"
                );
                ViewerScope::denied()
            }
        }
    }

    pub async fn alerts_overview(&self, scope: &ViewerScope) -> AlertsOverview {
        let token = self.alert_cycles.begin();

        let (hits, degraded) = match self
            .monitor
            .search_alerts(&SearchRequest::recent(self.page_size))
            .await
        {
            Ok(hits) => (hits, false),
            Err(e) => {
                tracing::warn!(error = %e, "alert fetch failed; degrading to empty set");
                (vec![], true)
            }
        };

        let records = normalize_alerts(hits);
        let visible = scope.filter_alerts(records);
        let classified = classify_alerts(visible);
        let view = build_alerts_overview(&classified, degraded, Utc::now().date_naive());

        self.publish_alerts(token, view)
    }

    pub async fn vulnerabilities_overview(&self, scope: &ViewerScope) -> VulnerabilitiesOverview {
        let token = self.vuln_cycles.begin();

        let (hits, degraded) = match self
            .monitor
            .search_vulnerabilities(&SearchRequest::recent(self.page_size))
            .await
        {
            Ok(hits) => (hits, false),
            Err(e) => {
                tracing::warn!(error = %e, "vulnerability fetch failed; degrading to empty set");
                (vec![], true)
            }
        };

        let records = normalize_vulnerabilities(hits);
        let visible = scope.filter_vulnerabilities(records);
        let view = build_vulnerabilities_overview(&visible, degraded);

        self.publish_vulnerabilities(token, view)
    }

    fn publish_alerts(&self, token: u64, view: AlertsOverview) -> AlertsOverview {
        if self.alert_cycles.is_current(token) {
            *self.alerts_snapshot.write() = Some(view.clone());
            return view;
        }
        tracing::debug!(token, "stale alert fetch cycle discarded");
        self.alerts_snapshot.read().clone().unwrap_or(view)
    }

    fn publish_vulnerabilities(
        &self,
        token: u64,
        view: VulnerabilitiesOverview,
    ) -> VulnerabilitiesOverview {
        if self.vuln_cycles.is_current(token) {
            *self.vulns_snapshot.write() = Some(view.clone());
            return view;
        }
        tracing::debug!(token, "stale vulnerability fetch cycle discarded");
        self.vulns_snapshot.read().clone().unwrap_or(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::monitor::MonitorConfig;
    use crate::logic::normalize::pad_agent_id;

    fn alert(agent: &str, rule: &str, level: u32) -> AlertRecord {
        AlertRecord {
            id: String::new(),
            rule_id: "100".to_string(),
            rule_description: rule.to_string(),
            rule_level: level,
            rule_groups: vec![],
            agent_id: pad_agent_id(agent),
            agent_name: format!("host-{agent}"),
            timestamp: None,
            raw: serde_json::Value::Null,
        }
    }

    fn offline_service() -> ViewService {
        let monitor = Arc::new(MonitorClient::new(MonitorConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_token: None,
            timeout_seconds: 1,
        }));
        ViewService::new(monitor, 500)
    }

    #[test]
    fn test_tracker_tokens_are_monotonic() {
        let tracker = RequestTracker::default();
        let t1 = tracker.begin();
        let t2 = tracker.begin();
        assert!(t2 > t1);
        assert!(tracker.is_current(t2));
        assert!(!tracker.is_current(t1));
    }

    #[test]
    fn test_refetch_is_deterministic() {
        let records = classify_alerts(vec![
            alert("1", "sshd: brute force trying to get access (T1110)", 10),
            alert("2", "Rootkit signature detected", 15),
            alert("1", "sshd: brute force trying to get access (T1110)", 10),
        ]);
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();

        let first = build_alerts_overview(&records, false, today);
        let second = build_alerts_overview(&records, false, today);
        assert_eq!(first, second);
    }

    #[test]
    fn test_overview_wires_mitre_from_top_rules() {
        let records = classify_alerts(vec![alert(
            "1",
            "Multiple SSH brute force attempts (T1110)",
            10,
        )]);
        let view = build_alerts_overview(
            &records,
            false,
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
        );
        assert_eq!(view.mitre_references.len(), 1);
        assert_eq!(view.mitre_references[0].id, "T1110");
    }

    #[test]
    fn test_last_request_wins() {
        let service = offline_service();

        let stale = service.alert_cycles.begin();
        let fresh = service.alert_cycles.begin();

        let fresh_view = build_alerts_overview(
            &classify_alerts(vec![alert("1", "newer fetch", 3)]),
            false,
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
        );
        let stale_view = build_alerts_overview(
            &classify_alerts(vec![alert("2", "older fetch", 3)]),
            false,
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
        );

        // Newer cycle completes first and is published.
        let published = service.publish_alerts(fresh, fresh_view.clone());
        assert_eq!(published, fresh_view);

        // Stale cycle completes later; its result is discarded.
        let served = service.publish_alerts(stale, stale_view);
        assert_eq!(served, fresh_view);
        assert_eq!(*service.alerts_snapshot.read(), Some(fresh_view));
    }

    #[test]
    fn test_degraded_view_is_empty_but_well_formed() {
        let view = build_alerts_overview(
            &[],
            true,
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
        );
        assert!(view.degraded);
        assert_eq!(view.total, 0);
        assert_eq!(view.compliance, ComplianceSummary::NoData);
        assert_eq!(view.daily.len(), 10);
        assert!(view.daily.iter().all(|b| b.count == 0));
    }
}
