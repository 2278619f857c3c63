//! Loads the policy document: an ordered list of discard policies plus
//! the enforcement point they are installed on.
//!
//! ```json
//! { "discard_policies": [ { "tp_dst": "80", "nw_proto": "tcp" } ],
//!   "firewall_switch_id": 1 }
//! ```
//!
//! Field names may be canonical (`transport-destination-port`) or the
//! short OpenFlow form (`tp_dst`). Values may be strings or numbers.

use std::path::Path;
use std::sync::Arc;

use domain::common::entity::EnforcementPointId;
use domain::policy::entity::{FieldName, Policy, PolicySet};
use domain::policy::enumeration::EnumerationTables;
use domain::policy::parser::try_parse_field;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::{ConfigError, check_limit};
use crate::constants::{DEFAULT_ENFORCEMENT_POINT, MAX_POLICIES};

const POLICIES_KEYS: [&str; 2] = ["discard_policies", "policies"];
const ENFORCEMENT_POINT_KEYS: [&str; 2] = ["firewall_switch_id", "enforcement_point"];

/// Reads policy documents from disk.
///
/// Holds the enumeration tables only to warn about values the compiler
/// will drop; the raw text is kept either way.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    tables: Arc<EnumerationTables>,
}

impl PolicyStore {
    pub fn new(tables: Arc<EnumerationTables>) -> Self {
        Self { tables }
    }

    /// Load the policy document, falling back to an empty set on the
    /// default enforcement point if it is missing or malformed.
    pub fn load(&self, path: &Path) -> PolicySet {
        match self.try_load(path) {
            Ok(set) => set,
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "failed to load policies, no rules will be installed"
                );
                PolicySet::empty(EnforcementPointId(DEFAULT_ENFORCEMENT_POINT))
            }
        }
    }

    /// Load the policy document. `.yaml`/`.yml` files are read as YAML,
    /// everything else as JSON.
    pub fn try_load(&self, path: &Path) -> Result<PolicySet, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                });
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let malformed = |reason: String| ConfigError::Malformed {
            path: path.display().to_string(),
            reason,
        };

        let document: Value = if is_yaml(path) {
            serde_yaml_ng::from_str(&content).map_err(|e| malformed(e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?
        };

        let set = self.from_document(&document).map_err(malformed)?;
        tracing::info!(
            path = %path.display(),
            switch = %set.enforcement_point(),
            policies = set.len(),
            "policies loaded"
        );
        Ok(set)
    }

    /// Build a policy set from an already-parsed document.
    pub fn from_document(&self, document: &Value) -> Result<PolicySet, String> {
        let root = document
            .as_object()
            .ok_or_else(|| "document root must be an object".to_string())?;

        let policies = lookup(root, &POLICIES_KEYS)
            .ok_or_else(|| format!("missing '{}'", POLICIES_KEYS[0]))?
            .as_array()
            .ok_or_else(|| format!("'{}' must be a list", POLICIES_KEYS[0]))?;

        check_limit(POLICIES_KEYS[0], policies.len(), MAX_POLICIES).map_err(|e| e.to_string())?;

        let point = lookup(root, &ENFORCEMENT_POINT_KEYS)
            .ok_or_else(|| format!("missing '{}'", ENFORCEMENT_POINT_KEYS[0]))?;
        let point = EnforcementPointId::deserialize(point)
            .map_err(|e| format!("invalid '{}': {e}", ENFORCEMENT_POINT_KEYS[0]))?;

        let policies = policies
            .iter()
            .enumerate()
            .map(|(index, raw)| self.policy_from_value(index, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PolicySet::new(point, policies))
    }

    fn policy_from_value(&self, index: usize, raw: &Value) -> Result<Policy, String> {
        let entries = raw
            .as_object()
            .ok_or_else(|| format!("policy {index} must be an object"))?;

        let mut policy = Policy::new();
        for (key, value) in entries {
            let Ok(field) = key.parse::<FieldName>() else {
                tracing::debug!(policy = index, field = %key, "ignoring unrecognized policy field");
                continue;
            };

            // Canonical name wins over the short form regardless of key order.
            let canonical = key.trim().eq_ignore_ascii_case(field.as_str());
            if policy.contains(field) {
                tracing::warn!(
                    policy = index,
                    field = %field,
                    key = %key,
                    "policy field given under both names, using the canonical one"
                );
                if !canonical {
                    continue;
                }
            }

            let Some(text) = value_text(value) else {
                tracing::warn!(
                    policy = index,
                    field = %field,
                    value = %value,
                    "policy field value must be a string or number, ignoring"
                );
                continue;
            };

            if let Err(e) = try_parse_field(field, &text, &self.tables) {
                tracing::warn!(
                    policy = index,
                    field = %field,
                    error = %e,
                    "policy field will be dropped at compile time"
                );
            }
            policy = policy.with(field, text);
        }

        Ok(policy)
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new(Arc::new(EnumerationTables::standard()))
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

fn lookup<'a>(root: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| root.get(*k))
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_doc(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn store() -> PolicyStore {
        PolicyStore::default()
    }

    // ── Successful loads ──────────────────────────────────────────

    #[test]
    fn loads_canonical_json_document() {
        let file = write_doc(
            ".json",
            r#"{
                "discard_policies": [
                    {"transport-destination-port": "80", "transport-protocol": "tcp"},
                    {"link-layer-source-address": "00:00:00:00:00:01"}
                ],
                "firewall_switch_id": 1
            }"#,
        );
        let set = store().try_load(file.path()).unwrap();

        assert_eq!(set.enforcement_point(), EnforcementPointId(1));
        assert_eq!(set.len(), 2);
        assert_eq!(set.policies()[0].get(FieldName::DstPort), Some("80"));
        assert_eq!(set.policies()[0].get(FieldName::Protocol), Some("tcp"));
        assert_eq!(
            set.policies()[1].get(FieldName::SrcMac),
            Some("00:00:00:00:00:01")
        );
    }

    #[test]
    fn accepts_openflow_names_and_numbers() {
        let file = write_doc(
            ".json",
            r#"{"discard_policies": [{"tp_dst": 5001, "nw_proto": "udp", "dl_type": "ipv4"}],
                "firewall_switch_id": 3}"#,
        );
        let set = store().try_load(file.path()).unwrap();
        let policy = &set.policies()[0];
        assert_eq!(policy.get(FieldName::DstPort), Some("5001"));
        assert_eq!(policy.get(FieldName::Protocol), Some("udp"));
        assert_eq!(policy.get(FieldName::EtherType), Some("ipv4"));
        assert_eq!(set.enforcement_point(), EnforcementPointId(3));
    }

    #[test]
    fn accepts_aliases_and_dpid_text() {
        let file = write_doc(
            ".json",
            r#"{"policies": [], "enforcement_point": "00-00-00-00-00-02"}"#,
        );
        let set = store().try_load(file.path()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.enforcement_point(), EnforcementPointId(2));
    }

    #[test]
    fn canonical_name_wins_over_short_name() {
        let file = write_doc(
            ".json",
            r#"{"discard_policies":[{"tp_dst":"80","transport-destination-port":"443"}],"firewall_switch_id":1}"#,
        );
        let set = store().try_load(file.path()).unwrap();
        assert_eq!(
            set.policies()[0].get(FieldName::DstPort),
            Some("443")
        );

        let file = write_doc(
            ".yaml",
            "discard_policies:\n  - transport-destination-port: 443\n    tp_dst: 80\nfirewall_switch_id: 1\n",
        );
        let set = store().try_load(file.path()).unwrap();
        assert_eq!(
            set.policies()[0].get(FieldName::DstPort),
            Some("443")
        );
    }

    #[test]
    fn loads_yaml_by_extension() {
        let file = write_doc(
            ".yaml",
            "discard_policies:\n  - nw_src: 10.0.0.1\n    tp_dst: 22\nfirewall_switch_id: 1\n",
        );
        let set = store().try_load(file.path()).unwrap();
        assert_eq!(set.policies()[0].get(FieldName::SrcIp), Some("10.0.0.1"));
        assert_eq!(set.policies()[0].get(FieldName::DstPort), Some("22"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let file = write_doc(
            ".json",
            r#"{"discard_policies": [{"tp_dst": "80", "comment": "web"}], "firewall_switch_id": 1}"#,
        );
        let set = store().try_load(file.path()).unwrap();
        assert_eq!(set.policies()[0].len(), 1);
    }

    #[test]
    fn unparseable_values_are_kept_raw() {
        let file = write_doc(
            ".json",
            r#"{"discard_policies": [{"tp_dst": "http"}], "firewall_switch_id": 1}"#,
        );
        let set = store().try_load(file.path()).unwrap();
        assert_eq!(set.policies()[0].get(FieldName::DstPort), Some("http"));
    }

    #[test]
    fn non_scalar_values_are_skipped() {
        let file = write_doc(
            ".json",
            r#"{"discard_policies": [{"tp_dst": ["80"], "nw_proto": "tcp"}], "firewall_switch_id": 1}"#,
        );
        let set = store().try_load(file.path()).unwrap();
        assert!(!set.policies()[0].contains(FieldName::DstPort));
        assert!(set.policies()[0].contains(FieldName::Protocol));
    }

    #[test]
    fn policy_order_is_preserved() {
        let file = write_doc(
            ".json",
            r#"{"discard_policies": [{"tp_dst": "1"}, {"tp_dst": "2"}, {"tp_dst": "3"}],
                "firewall_switch_id": 1}"#,
        );
        let set = store().try_load(file.path()).unwrap();
        let ports: Vec<&str> = set
            .policies()
            .iter()
            .filter_map(|p| p.get(FieldName::DstPort))
            .collect();
        assert_eq!(ports, vec!["1", "2", "3"]);
    }

    // ── Failures ──────────────────────────────────────────────────

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = store()
            .try_load(&dir.path().join("absent.json"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn invalid_json_is_malformed() {
        let file = write_doc(".json", "{ not json");
        assert!(store().try_load(file.path()).unwrap_err().is_malformed());
    }

    #[test]
    fn missing_keys_are_malformed() {
        let file = write_doc(".json", r#"{"discard_policies": []}"#);
        assert!(store().try_load(file.path()).unwrap_err().is_malformed());

        let file = write_doc(".json", r#"{"firewall_switch_id": 1}"#);
        assert!(store().try_load(file.path()).unwrap_err().is_malformed());
    }

    #[test]
    fn non_object_policy_is_malformed() {
        let file = write_doc(
            ".json",
            r#"{"discard_policies": ["tp_dst=80"], "firewall_switch_id": 1}"#,
        );
        assert!(store().try_load(file.path()).unwrap_err().is_malformed());
    }

    #[test]
    fn too_many_policies_is_malformed() {
        let policies = vec![serde_json::json!({"tp_dst": "80"}); MAX_POLICIES + 1];
        let doc = serde_json::json!({"discard_policies": policies, "firewall_switch_id": 1});
        let file = write_doc(".json", &doc.to_string());
        assert!(store().try_load(file.path()).unwrap_err().is_malformed());
    }

    // ── Fallback ──────────────────────────────────────────────────

    #[test]
    fn load_falls_back_to_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let set = store().load(&dir.path().join("absent.json"));
        assert!(set.is_empty());
        assert_eq!(
            set.enforcement_point(),
            EnforcementPointId(DEFAULT_ENFORCEMENT_POINT)
        );

        let file = write_doc(".json", "[]");
        let set = store().load(file.path());
        assert!(set.is_empty());
        assert_eq!(
            set.enforcement_point(),
            EnforcementPointId(DEFAULT_ENFORCEMENT_POINT)
        );
    }
}
