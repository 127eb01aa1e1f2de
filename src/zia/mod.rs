pub mod auth;
pub mod client;
pub mod executor;

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Per-call socket timeout; the retry budget bounds everything else.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the HTTP client shared by every call of a run.
///
/// The cookie store carries the `JSESSIONID` obtained at login.
pub fn create_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .cookie_store(true)
        .use_rustls_tls()
        .build()
}

/// Build the API root for a ZIA cloud, e.g. `zscaler.net`
pub fn base_url_for_cloud(cloud: &str) -> String {
    format!("https://zsapi.{}/api/v1", cloud.trim_end_matches('/'))
}

/// Extract an array payload, treating `null` as empty
pub fn extract_array(response: Value) -> Option<Vec<Value>> {
    match response {
        Value::Array(items) => Some(items),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}
