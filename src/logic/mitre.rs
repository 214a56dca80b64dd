//! MITRE ATT&CK cross-referencer
//!
//! Extracts technique/tactic identifiers embedded in rule text and joins
//! them against a static reference table. Extraction runs over the top-N
//! rule descriptions, not the full record set, which bounds cost.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::AggregateBucket;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MitreKind {
    Technique,
    Tactic,
    Mitigation,
    Software,
    Group,
}

/// One row of the static ATT&CK reference table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MitreEntry {
    pub id: &'static str,
    pub kind: MitreKind,
    pub name: &'static str,
    pub url: Option<&'static str>,
    pub description: Option<&'static str>,
}

/// Identifier grammar: `TA` + four digits is a tactic; one of `{T,G,S,M}` +
/// four digits is a technique/group/software/mitigation.
static MITRE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:TA\d{4}|[TGSM]\d{4})\b").expect("mitre id pattern"));

macro_rules! entry {
    ($id:literal, $kind:expr, $name:literal, $url:literal) => {
        (
            $id,
            MitreEntry {
                id: $id,
                kind: $kind,
                name: $name,
                url: Some($url),
                description: None,
            },
        )
    };
    ($id:literal, $kind:expr, $name:literal, $url:literal, $desc:literal) => {
        (
            $id,
            MitreEntry {
                id: $id,
                kind: $kind,
                name: $name,
                url: Some($url),
                description: Some($desc),
            },
        )
    };
}

/// Static reference data, loaded once, read-only.
pub static MITRE_TABLE: Lazy<HashMap<&'static str, MitreEntry>> = Lazy::new(|| {
    use MitreKind::*;

    HashMap::from([
        // Techniques
        entry!(
            "T1110",
            Technique,
            "Brute Force",
            "https://attack.mitre.org/techniques/T1110/",
            "Adversaries may use brute force techniques to gain access to accounts when passwords are unknown or when password hashes are obtained."
        ),
        entry!(
            "T1078",
            Technique,
            "Valid Accounts",
            "https://attack.mitre.org/techniques/T1078/",
            "Adversaries may obtain and abuse credentials of existing accounts as a means of gaining access."
        ),
        entry!(
            "T1021",
            Technique,
            "Remote Services",
            "https://attack.mitre.org/techniques/T1021/"
        ),
        entry!(
            "T1059",
            Technique,
            "Command and Scripting Interpreter",
            "https://attack.mitre.org/techniques/T1059/",
            "Adversaries may abuse command and script interpreters to execute commands, scripts, or binaries."
        ),
        entry!(
            "T1003",
            Technique,
            "OS Credential Dumping",
            "https://attack.mitre.org/techniques/T1003/",
            "Adversaries may attempt to dump credentials to obtain account login and credential material."
        ),
        entry!(
            "T1055",
            Technique,
            "Process Injection",
            "https://attack.mitre.org/techniques/T1055/"
        ),
        entry!(
            "T1068",
            Technique,
            "Exploitation for Privilege Escalation",
            "https://attack.mitre.org/techniques/T1068/"
        ),
        entry!(
            "T1071",
            Technique,
            "Application Layer Protocol",
            "https://attack.mitre.org/techniques/T1071/"
        ),
        entry!(
            "T1098",
            Technique,
            "Account Manipulation",
            "https://attack.mitre.org/techniques/T1098/"
        ),
        entry!(
            "T1105",
            Technique,
            "Ingress Tool Transfer",
            "https://attack.mitre.org/techniques/T1105/"
        ),
        entry!(
            "T1133",
            Technique,
            "External Remote Services",
            "https://attack.mitre.org/techniques/T1133/"
        ),
        entry!(
            "T1136",
            Technique,
            "Create Account",
            "https://attack.mitre.org/techniques/T1136/"
        ),
        entry!(
            "T1190",
            Technique,
            "Exploit Public-Facing Application",
            "https://attack.mitre.org/techniques/T1190/",
            "Adversaries may attempt to exploit a weakness in an Internet-facing host or system."
        ),
        entry!(
            "T1486",
            Technique,
            "Data Encrypted for Impact",
            "https://attack.mitre.org/techniques/T1486/"
        ),
        entry!(
            "T1543",
            Technique,
            "Create or Modify System Process",
            "https://attack.mitre.org/techniques/T1543/"
        ),
        entry!(
            "T1547",
            Technique,
            "Boot or Logon Autostart Execution",
            "https://attack.mitre.org/techniques/T1547/"
        ),
        entry!(
            "T1562",
            Technique,
            "Impair Defenses",
            "https://attack.mitre.org/techniques/T1562/"
        ),
        entry!(
            "T1566",
            Technique,
            "Phishing",
            "https://attack.mitre.org/techniques/T1566/",
            "Adversaries may send phishing messages to gain access to victim systems."
        ),
        entry!(
            "T1595",
            Technique,
            "Active Scanning",
            "https://attack.mitre.org/techniques/T1595/"
        ),
        entry!(
            "T1041",
            Technique,
            "Exfiltration Over C2 Channel",
            "https://attack.mitre.org/techniques/T1041/"
        ),
        // Tactics
        entry!(
            "TA0001",
            Tactic,
            "Initial Access",
            "https://attack.mitre.org/tactics/TA0001/"
        ),
        entry!(
            "TA0002",
            Tactic,
            "Execution",
            "https://attack.mitre.org/tactics/TA0002/"
        ),
        entry!(
            "TA0003",
            Tactic,
            "Persistence",
            "https://attack.mitre.org/tactics/TA0003/"
        ),
        entry!(
            "TA0004",
            Tactic,
            "Privilege Escalation",
            "https://attack.mitre.org/tactics/TA0004/"
        ),
        entry!(
            "TA0005",
            Tactic,
            "Defense Evasion",
            "https://attack.mitre.org/tactics/TA0005/"
        ),
        entry!(
            "TA0006",
            Tactic,
            "Credential Access",
            "https://attack.mitre.org/tactics/TA0006/"
        ),
        entry!(
            "TA0007",
            Tactic,
            "Discovery",
            "https://attack.mitre.org/tactics/TA0007/"
        ),
        entry!(
            "TA0008",
            Tactic,
            "Lateral Movement",
            "https://attack.mitre.org/tactics/TA0008/"
        ),
        entry!(
            "TA0010",
            Tactic,
            "Exfiltration",
            "https://attack.mitre.org/tactics/TA0010/"
        ),
        entry!(
            "TA0011",
            Tactic,
            "Command and Control",
            "https://attack.mitre.org/tactics/TA0011/"
        ),
        entry!(
            "TA0040",
            Tactic,
            "Impact",
            "https://attack.mitre.org/tactics/TA0040/"
        ),
        // Mitigations
        entry!(
            "M1032",
            Mitigation,
            "Multi-factor Authentication",
            "https://attack.mitre.org/mitigations/M1032/"
        ),
        entry!(
            "M1017",
            Mitigation,
            "User Training",
            "https://attack.mitre.org/mitigations/M1017/"
        ),
        entry!(
            "M1030",
            Mitigation,
            "Network Segmentation",
            "https://attack.mitre.org/mitigations/M1030/"
        ),
        entry!(
            "M1042",
            Mitigation,
            "Disable or Remove Feature or Program",
            "https://attack.mitre.org/mitigations/M1042/"
        ),
        // Software
        entry!(
            "S0154",
            Software,
            "Cobalt Strike",
            "https://attack.mitre.org/software/S0154/"
        ),
        entry!(
            "S0002",
            Software,
            "Mimikatz",
            "https://attack.mitre.org/software/S0002/"
        ),
        entry!(
            "S0029",
            Software,
            "PsExec",
            "https://attack.mitre.org/software/S0029/"
        ),
        // Groups
        entry!(
            "G0016",
            Group,
            "APT29",
            "https://attack.mitre.org/groups/G0016/"
        ),
        entry!(
            "G0007",
            Group,
            "APT28",
            "https://attack.mitre.org/groups/G0007/"
        ),
        entry!(
            "G0035",
            Group,
            "Dragonfly",
            "https://attack.mitre.org/groups/G0035/"
        ),
    ])
});

/// Pull ATT&CK identifiers out of free text, normalized to uppercase.
pub fn extract_ids(text: &str) -> BTreeSet<String> {
    MITRE_ID
        .find_iter(text)
        .map(|m| m.as_str().to_uppercase())
        .collect()
}

/// Set-membership join against the reference table. Entries with no match
/// are silently dropped.
pub fn lookup<'a, I>(ids: I) -> Vec<MitreEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter()
        .filter_map(|id| MITRE_TABLE.get(id).cloned())
        .collect()
}

/// Extract and join over a set of top rule descriptions.
pub fn cross_reference<'a, I>(rule_descriptions: I) -> Vec<MitreEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ids = BTreeSet::new();
    for text in rule_descriptions {
        ids.extend(extract_ids(text));
    }
    lookup(ids.iter().map(String::as_str))
}

/// Keyword buckets for the coarse tactic distribution. First match wins.
const TACTIC_KEYWORDS: &[(&str, &str)] = &[
    ("brute", "Credential Access"),
    ("password", "Credential Access"),
    ("authentication", "Credential Access"),
    ("login", "Credential Access"),
    ("credential", "Credential Access"),
    ("sql injection", "Initial Access"),
    ("xss", "Initial Access"),
    ("exploit", "Initial Access"),
    ("web attack", "Initial Access"),
    ("phishing", "Initial Access"),
    ("malware", "Execution"),
    ("trojan", "Execution"),
    ("shellcode", "Execution"),
    ("script", "Execution"),
    ("rootkit", "Defense Evasion"),
    ("hidden", "Defense Evasion"),
    ("integrity", "Defense Evasion"),
    ("syscheck", "Defense Evasion"),
    ("privilege", "Privilege Escalation"),
    ("sudo", "Privilege Escalation"),
    ("escalation", "Privilege Escalation"),
    ("scan", "Reconnaissance"),
    ("probe", "Reconnaissance"),
    ("beacon", "Command and Control"),
    ("c2", "Command and Control"),
    ("exfil", "Exfiltration"),
    ("denial of service", "Impact"),
    ("dos attack", "Impact"),
];

const TACTIC_FALLBACK: &str = "Uncategorized";

/// Best-effort keyword classification of top rules into coarse tactic
/// buckets. Independent of the id-based join; approximate, not
/// authoritative.
pub fn tactic_distribution(top_rules: &[AggregateBucket]) -> Vec<AggregateBucket> {
    let mut counts: HashMap<&'static str, u64> = HashMap::new();
    for bucket in top_rules {
        let lowered = bucket.key.to_lowercase();
        let tactic = TACTIC_KEYWORDS
            .iter()
            .find(|(needle, _)| lowered.contains(needle))
            .map(|(_, tactic)| *tactic)
            .unwrap_or(TACTIC_FALLBACK);
        *counts.entry(tactic).or_insert(0) += bucket.count;
    }

    let mut buckets: Vec<AggregateBucket> = counts
        .into_iter()
        .map(|(key, count)| AggregateBucket::new(key, count))
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_technique_id() {
        let ids = extract_ids("Multiple SSH brute force attempts (T1110)");
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("T1110"));
    }

    #[test]
    fn test_extraction_is_case_insensitive() {
        let ids = extract_ids("suspicious activity matching t1110 and ta0006");
        assert!(ids.contains("T1110"));
        assert!(ids.contains("TA0006"));
    }

    #[test]
    fn test_extract_all_kinds() {
        let ids = extract_ids("T1003 via S0002, seen from G0016, mitigate with M1032");
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_no_partial_matches() {
        assert!(extract_ids("T110 T11100 XT1110").is_empty());
    }

    #[test]
    fn test_join_drops_unknown_ids() {
        let entries = lookup(["T1110", "T9999"]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Brute Force");
    }

    #[test]
    fn test_cross_reference_unions_rules() {
        let entries = cross_reference([
            "sshd: brute force trying to get access (T1110)",
            "PAM: multiple failed logins (T1110, T1078)",
        ]);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_tactic_distribution_keywords() {
        let top = vec![
            AggregateBucket::new("sshd: brute force trying to get access", 12),
            AggregateBucket::new("Web attack returned code 200", 4),
            AggregateBucket::new("Something nobody has a keyword for", 1),
        ];
        let dist = tactic_distribution(&top);
        assert_eq!(dist[0].key, "Credential Access");
        assert_eq!(dist[0].count, 12);
        assert!(dist.iter().any(|b| b.key == "Initial Access" && b.count == 4));
        assert!(dist.iter().any(|b| b.key == "Uncategorized" && b.count == 1));
    }
}
