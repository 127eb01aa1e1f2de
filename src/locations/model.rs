use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level location as returned by `GET /locations`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed view of a VPN credential record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VpnCredential {
    pub id: Option<i64>,
    pub fqdn: Option<String>,
    pub pre_shared_key: Option<String>,
}

impl VpnCredential {
    pub fn from_record(record: &Map<String, Value>) -> Self {
        Self {
            id: id_field(record),
            fqdn: string_field(record, "fqdn"),
            pre_shared_key: string_field(record, "preSharedKey"),
        }
    }
}

/// Typed view of a sub-location record.
///
/// Built leniently: a wrongly typed value reads as absent instead of
/// rejecting the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sublocation {
    pub id: Option<i64>,
    pub name: String,
    pub country: Option<String>,
    pub tz: Option<String>,
    pub auth_required: Option<bool>,
    pub surrogate_ip: Option<bool>,
    pub surrogate_ip_enforced_for_known_browsers: Option<bool>,
    pub xff_forward_enabled: Option<bool>,
    pub ip_addresses: Vec<String>,
    pub profile: Option<String>,
}

impl Sublocation {
    pub fn from_record(record: &Map<String, Value>) -> Self {
        Self {
            id: id_field(record),
            name: string_field(record, "name").unwrap_or_default(),
            country: string_field(record, "country"),
            tz: string_field(record, "tz"),
            auth_required: bool_field(record, "authRequired"),
            surrogate_ip: bool_field(record, "surrogateIP"),
            surrogate_ip_enforced_for_known_browsers: bool_field(
                record,
                "surrogateIPEnforcedForKnownBrowsers",
            ),
            xff_forward_enabled: bool_field(record, "xffForwardEnabled"),
            ip_addresses: string_list_field(record, "ipAddresses"),
            profile: string_field(record, "profile"),
        }
    }

    /// Whether the update workflow should patch this sub-location
    pub fn needs_update(&self, marker: &str) -> bool {
        self.name.contains(marker) && self.auth_required == Some(true)
    }
}

fn id_field(record: &Map<String, Value>) -> Option<i64> {
    match record.get("id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn string_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(record: &Map<String, Value>, key: &str) -> Option<bool> {
    record.get(key).and_then(Value::as_bool)
}

/// Non-lists read as empty; non-string entries are rendered as JSON
fn string_list_field(record: &Map<String, Value>, key: &str) -> Vec<String> {
    match record.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Everything gathered for one location during an export.
///
/// Credentials and sub-locations are kept exactly as the API returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    pub location_id: i64,
    pub location_name: String,
    pub location_detail: Map<String, Value>,
    pub vpn_credentials: Vec<Map<String, Value>>,
    pub sublocations: Vec<Map<String, Value>>,
}

impl LocationReport {
    pub fn vpn_credential_views(&self) -> Vec<VpnCredential> {
        self.vpn_credentials
            .iter()
            .map(VpnCredential::from_record)
            .collect()
    }

    pub fn sublocation_views(&self) -> Vec<Sublocation> {
        self.sublocations.iter().map(Sublocation::from_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test records must be objects"),
        }
    }

    #[test]
    fn test_sublocation_wire_names() {
        let sub = Sublocation::from_record(&record(json!({
            "id": 42,
            "name": "Whitelist-HQ",
            "tz": "FRANCE_EUROPE_PARIS",
            "authRequired": true,
            "surrogateIP": false,
            "surrogateIPEnforcedForKnownBrowsers": true,
            "xffForwardEnabled": true,
            "ipAddresses": ["10.0.0.1-10.0.0.9"],
            "profile": "GUESTWIFI",
            "parentId": 7
        })));

        assert_eq!(sub.id, Some(42));
        assert_eq!(sub.auth_required, Some(true));
        assert_eq!(sub.surrogate_ip, Some(false));
        assert_eq!(sub.surrogate_ip_enforced_for_known_browsers, Some(true));
        assert_eq!(sub.xff_forward_enabled, Some(true));
        assert_eq!(sub.ip_addresses, vec!["10.0.0.1-10.0.0.9"]);
        assert_eq!(sub.profile.as_deref(), Some("GUESTWIFI"));
        assert_eq!(sub.country, None);
    }

    #[test]
    fn test_wrongly_typed_values_read_as_absent() {
        let sub = Sublocation::from_record(&record(json!({
            "id": 12,
            "name": null,
            "country": 7,
            "tz": 5,
            "authRequired": "yes",
            "ipAddresses": "10.0.0.1"
        })));

        assert_eq!(sub.id, Some(12));
        assert_eq!(sub.name, "");
        assert_eq!(sub.country, None);
        assert_eq!(sub.tz, None);
        assert_eq!(sub.auth_required, None);
        assert!(sub.ip_addresses.is_empty());
    }

    #[test]
    fn test_ip_addresses_keep_non_string_entries() {
        let sub = Sublocation::from_record(&record(json!({
            "id": 1,
            "ipAddresses": ["10.0.0.1", null, 3]
        })));
        assert_eq!(sub.ip_addresses, vec!["10.0.0.1", "3"]);
    }

    #[test]
    fn test_needs_update() {
        let mut sub = Sublocation {
            id: Some(1),
            name: "Whitelist-HQ".into(),
            auth_required: Some(true),
            ..Default::default()
        };
        assert!(sub.needs_update("Whitelist"));

        sub.auth_required = None;
        assert!(!sub.needs_update("Whitelist"));

        sub.name = "Branch-Office".into();
        sub.auth_required = Some(true);
        assert!(!sub.needs_update("Whitelist"));
    }

    #[test]
    fn test_vpn_credential_wire_names() {
        let cred = VpnCredential::from_record(&record(json!({
            "id": 5,
            "type": "UFQDN",
            "fqdn": "paris@example.com",
            "preSharedKey": "s3cret"
        })));
        assert_eq!(cred.id, Some(5));
        assert_eq!(cred.fqdn.as_deref(), Some("paris@example.com"));
        assert_eq!(cred.pre_shared_key.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_report_keeps_raw_records() {
        let raw = record(json!({"id": 11, "name": "Guest", "ipAddresses": null}));
        let report = LocationReport {
            location_id: 1,
            location_name: "Paris".into(),
            sublocations: vec![raw.clone()],
            ..Default::default()
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["sublocations"][0], Value::Object(raw));
        assert_eq!(report.sublocation_views()[0].name, "Guest");
    }
}
