//! Agent ownership filter
//!
//! Restricts the working set to agents the viewer may see. Runs before
//! aggregation and compliance scoring so no counts leak from unauthorized
//! records. Fails closed: an analyst without assignments sees nothing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{AgentAssignment, AlertRecord, VulnerabilityRecord};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewerRole {
    Admin,
    Analyst,
}

impl ViewerRole {
    /// Parse a role claim. Anything unrecognized degrades to the less
    /// privileged role.
    pub fn from_claim(claim: &str) -> Self {
        if claim.trim().eq_ignore_ascii_case("admin") {
            ViewerRole::Admin
        } else {
            ViewerRole::Analyst
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, ViewerRole::Admin)
    }
}

/// The set of agents a viewer is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerScope {
    Unrestricted,
    Agents(HashSet<String>),
}

impl ViewerScope {
    /// Build a scope from the viewer's role and assignments. Assignment
    /// agent ids must already be normalized (zero-padded width 3).
    pub fn for_viewer(role: ViewerRole, assignments: &[AgentAssignment]) -> Self {
        if role.is_admin() {
            return ViewerScope::Unrestricted;
        }
        ViewerScope::Agents(
            assignments
                .iter()
                .map(|a| a.agent_id.clone())
                .collect(),
        )
    }

    /// Empty scope for viewers whose identity could not be resolved.
    pub fn denied() -> Self {
        ViewerScope::Agents(HashSet::new())
    }

    pub fn allows(&self, agent_id: &str) -> bool {
        match self {
            ViewerScope::Unrestricted => true,
            ViewerScope::Agents(ids) => ids.contains(agent_id),
        }
    }

    pub fn filter_alerts(&self, records: Vec<AlertRecord>) -> Vec<AlertRecord> {
        match self {
            ViewerScope::Unrestricted => records,
            ViewerScope::Agents(_) => records
                .into_iter()
                .filter(|r| self.allows(&r.agent_id))
                .collect(),
        }
    }

    pub fn filter_vulnerabilities(
        &self,
        records: Vec<VulnerabilityRecord>,
    ) -> Vec<VulnerabilityRecord> {
        match self {
            ViewerScope::Unrestricted => records,
            ViewerScope::Agents(_) => records
                .into_iter()
                .filter(|r| self.allows(&r.agent_id))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::normalize::pad_agent_id;

    fn assignment(email: &str, agent_id: &str) -> AgentAssignment {
        AgentAssignment {
            user_email: email.to_string(),
            agent_id: pad_agent_id(agent_id),
            agent_name: format!("host-{agent_id}"),
        }
    }

    fn alert(agent_id: &str) -> AlertRecord {
        AlertRecord {
            id: String::new(),
            rule_id: "5710".to_string(),
            rule_description: "sshd: attempt to login using a non-existent user".to_string(),
            rule_level: 5,
            rule_groups: vec!["sshd".to_string()],
            agent_id: pad_agent_id(agent_id),
            agent_name: format!("host-{agent_id}"),
            timestamp: None,
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_admin_sees_everything() {
        let scope = ViewerScope::for_viewer(ViewerRole::Admin, &[]);
        let records = vec![alert("1"), alert("2"), alert("3")];
        assert_eq!(scope.filter_alerts(records).len(), 3);
    }

    #[test]
    fn test_analyst_restricted_to_assignments() {
        let assignments = vec![assignment("ana@example.com", "2")];
        let scope = ViewerScope::for_viewer(ViewerRole::Analyst, &assignments);
        let kept = scope.filter_alerts(vec![alert("1"), alert("2"), alert("3")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].agent_id, "002");
    }

    #[test]
    fn test_zero_assignments_fails_closed() {
        let scope = ViewerScope::for_viewer(ViewerRole::Analyst, &[]);
        let records: Vec<AlertRecord> = (0..100).map(|i| alert(&i.to_string())).collect();
        assert!(scope.filter_alerts(records).is_empty());
    }

    #[test]
    fn test_denied_scope_allows_nothing() {
        assert!(!ViewerScope::denied().allows("001"));
    }

    #[test]
    fn test_role_claim_fails_toward_analyst() {
        assert_eq!(ViewerRole::from_claim("ADMIN"), ViewerRole::Admin);
        assert_eq!(ViewerRole::from_claim("superuser"), ViewerRole::Analyst);
        assert_eq!(ViewerRole::from_claim(""), ViewerRole::Analyst);
    }
}
