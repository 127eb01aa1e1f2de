//! Default-filling of sub-location records before they are written back.
//!
//! The API rejects a `PUT` that lacks any of these fields, so each missing
//! or empty one receives a fixed default. Existing valid values and fields
//! outside this list are never touched.

use ordermap::OrderSet;
use serde_json::{json, Map, Value};

pub const DEFAULT_PROFILE: &str = "CORPORATE";
pub const DEFAULT_TIME_ZONE: &str = "FRANCE_EUROPE_PARIS";
pub const DEFAULT_COUNTRY: &str = "FRANCE";
pub const DEFAULT_IP_RANGE: &str = "0.0.0.0-0.0.0.0";

pub const FIELD_PROFILE: &str = "profile";
pub const FIELD_TIME_ZONE: &str = "tz";
pub const FIELD_COUNTRY: &str = "country";
pub const FIELD_IP_ADDRESSES: &str = "ipAddresses";
pub const FIELD_SURROGATE_IP: &str = "surrogateIP";
pub const FIELD_AUTH_REQUIRED: &str = "authRequired";
pub const FIELD_SURROGATE_IP_ENFORCED: &str = "surrogateIPEnforcedForKnownBrowsers";
pub const FIELD_XFF_FORWARD: &str = "xffForwardEnabled";

const STRING_DEFAULTS: [(&str, &str); 3] = [
    (FIELD_PROFILE, DEFAULT_PROFILE),
    (FIELD_TIME_ZONE, DEFAULT_TIME_ZONE),
    (FIELD_COUNTRY, DEFAULT_COUNTRY),
];

const FLAG_FIELDS: [&str; 4] = [
    FIELD_SURROGATE_IP,
    FIELD_AUTH_REQUIRED,
    FIELD_SURROGATE_IP_ENFORCED,
    FIELD_XFF_FORWARD,
];

/// A record after default-filling, with the fields that were defaulted
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedRecord {
    pub record: Map<String, Value>,
    pub defaulted: OrderSet<&'static str>,
}

/// Fill every required field that is missing or empty
pub fn sanitize(mut record: Map<String, Value>) -> SanitizedRecord {
    let mut defaulted = OrderSet::new();

    for (field, default) in STRING_DEFAULTS {
        let valid = matches!(record.get(field), Some(Value::String(s)) if !s.is_empty());
        if !valid {
            record.insert(field.to_string(), json!(default));
            defaulted.insert(field);
        }
    }

    let ips_valid =
        matches!(record.get(FIELD_IP_ADDRESSES), Some(Value::Array(items)) if !items.is_empty());
    if !ips_valid {
        record.insert(FIELD_IP_ADDRESSES.to_string(), json!([DEFAULT_IP_RANGE]));
        defaulted.insert(FIELD_IP_ADDRESSES);
    }

    for field in FLAG_FIELDS {
        if !matches!(record.get(field), Some(Value::Bool(_))) {
            record.insert(field.to_string(), Value::Bool(false));
            defaulted.insert(field);
        }
    }

    SanitizedRecord { record, defaulted }
}

/// Turn off authentication and surrogate IP on a record
pub fn disable_authentication(record: &mut Map<String, Value>) {
    for field in [
        FIELD_AUTH_REQUIRED,
        FIELD_SURROGATE_IP,
        FIELD_SURROGATE_IP_ENFORCED,
    ] {
        record.insert(field.to_string(), Value::Bool(false));
    }
}
