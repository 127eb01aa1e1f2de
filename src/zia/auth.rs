use crate::utils::errors::{Result, ZiaCliError};
use crate::zia::executor::{ApiRequest, RequestExecutor, Transport};
use serde_json::json;

/// Credentials for `POST /authenticatedSession`
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Obfuscate the API key with the millisecond timestamp sent alongside it.
///
/// The last six digits of the timestamp index into the key, followed by the
/// digits of that number shifted right by one, each offset by two.
pub fn obfuscate_api_key(api_key: &str, timestamp_ms: i64) -> Result<String> {
    let key: Vec<char> = api_key.chars().collect();
    if key.len() < 12 {
        return Err(ZiaCliError::Auth(
            "API key must be at least 12 characters".to_string(),
        ));
    }

    let now = timestamp_ms.to_string();
    let tail = &now[now.len().saturating_sub(6)..];
    let high: u32 = tail
        .parse()
        .map_err(|_| ZiaCliError::Auth(format!("Invalid timestamp: {timestamp_ms}")))?;
    let shifted = format!("{:06}", high >> 1);

    let mut obfuscated = String::with_capacity(12);
    for digit in tail.chars().filter_map(|c| c.to_digit(10)) {
        obfuscated.push(key[digit as usize]);
    }
    for digit in shifted.chars().filter_map(|c| c.to_digit(10)) {
        obfuscated.push(key[digit as usize + 2]);
    }

    Ok(obfuscated)
}

pub struct ZiaAuth<'a, T: Transport> {
    executor: &'a RequestExecutor<T>,
    base_url: &'a str,
}

impl<'a, T: Transport> ZiaAuth<'a, T> {
    pub fn new(executor: &'a RequestExecutor<T>, base_url: &'a str) -> Self {
        Self { executor, base_url }
    }

    fn session_url(&self) -> String {
        format!("{}/authenticatedSession", self.base_url)
    }

    /// Open a session; the cookie lands in the transport's cookie store
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let payload = json!({
            "apiKey": obfuscate_api_key(&credentials.api_key, timestamp)?,
            "username": credentials.username,
            "password": credentials.password,
            "timestamp": timestamp,
        });

        self.executor
            .execute(&ApiRequest::post(self.session_url(), Some(payload)).fail_fast())
            .await
            .map_err(|e| ZiaCliError::Auth(format!("Login failed: {e}")))?;

        tracing::info!("Authenticated as {}", credentials.username);
        Ok(())
    }

    /// Close the session, ignoring an already expired one
    pub async fn logout(&self) -> Result<()> {
        self.executor
            .execute(&ApiRequest::delete(self.session_url()).optional())
            .await?;
        tracing::debug!("Session closed");
        Ok(())
    }
}
