//! Resilient request execution against the ZIA API.
//!
//! Every HTTP call of a run goes through [`RequestExecutor::execute`], which
//! backs off exponentially on HTTP 429, retries other failures up to the
//! policy budget and reports a 404 on optional resources as absent data.

use crate::utils::errors::{Result, ZiaCliError};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const STATUS_NOT_FOUND: u16 = 404;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single request without any retry logic
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<RawResponse>;
}

/// Production transport backed by `reqwest`
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<RawResponse> {
        let mut request = self.client.request(method, url);
        if let Some(payload) = body {
            request = request
                .header("Content-Type", "application/json")
                .json(payload);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}

/// Retry behaviour for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first call
    pub max_retries: u32,
    /// Backoff base for rate-limited calls
    #[serde(with = "duration_secs")]
    pub base_delay: Duration,
    /// Pause before retrying any other failure
    #[serde(with = "duration_secs")]
    pub error_delay: Duration,
    /// Whether 4xx statuses other than 429 are worth retrying
    pub retry_client_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            base_delay: Duration::from_secs(10),
            error_delay: Duration::from_secs(1),
            retry_client_errors: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (0-based) after a rate-limited response
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    fn should_retry(&self, error: &ZiaCliError) -> bool {
        self.retry_client_errors || !error.is_client_error()
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// A single logical API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    /// A 404 means "no data" rather than a failure
    pub absent_ok: bool,
    /// 4xx statuses other than 429 are final whatever the policy says
    pub fail_fast: bool,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
            absent_ok: false,
            fail_fast: false,
        }
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::PUT,
            url: url.into(),
            body: Some(body),
            absent_ok: false,
            fail_fast: false,
        }
    }

    pub fn post(url: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body,
            absent_ok: false,
            fail_fast: false,
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            url: url.into(),
            body: None,
            absent_ok: false,
            fail_fast: false,
        }
    }

    /// Mark the target as an optional sub-resource
    pub fn optional(mut self) -> Self {
        self.absent_ok = true;
        self
    }

    /// Never retry a client error on this request
    pub fn fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }
}

pub struct RequestExecutor<T: Transport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> RequestExecutor<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run a request to completion.
    ///
    /// Returns `Ok(None)` only for a 404 on an optional request. An empty
    /// success body is reported as `Value::Null`.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Option<Value>> {
        let max_attempts = self.policy.max_attempts();
        let mut last_error = ZiaCliError::RateLimited;

        for attempt in 0..max_attempts {
            let has_next = attempt + 1 < max_attempts;
            let outcome = self
                .transport
                .send(request.method.clone(), &request.url, request.body.as_ref())
                .await;

            let response = match outcome {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        "{} {} failed (attempt {}/{max_attempts}): {e}",
                        request.method,
                        request.url,
                        attempt + 1
                    );
                    last_error = e;
                    if has_next {
                        tokio::time::sleep(self.policy.error_delay).await;
                    }
                    continue;
                }
            };

            if response.status == STATUS_TOO_MANY_REQUESTS {
                last_error = ZiaCliError::RateLimited;
                if has_next {
                    let delay = self.policy.backoff_delay(attempt);
                    tracing::warn!(
                        "Rate limit hit on {} (attempt {}/{max_attempts}), waiting {:?}",
                        request.url,
                        attempt + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            if response.status == STATUS_NOT_FOUND && request.absent_ok {
                tracing::debug!("{} not present, treating as empty", request.url);
                return Ok(None);
            }

            if response.is_success() {
                return parse_body(&response.body).map(Some);
            }

            let error = ZiaCliError::Api {
                status: response.status,
                body: response.body,
            };
            let definitive = request.fail_fast && error.is_client_error();
            if definitive || !self.policy.should_retry(&error) {
                return Err(error);
            }
            tracing::warn!(
                "{} {} failed (attempt {}/{max_attempts}): {error}",
                request.method,
                request.url,
                attempt + 1
            );
            last_error = error;
            if has_next {
                tokio::time::sleep(self.policy.error_delay).await;
            }
        }

        Err(ZiaCliError::RetriesExhausted {
            method: request.method.to_string(),
            url: request.url.clone(),
            attempts: max_attempts,
            last: Box::new(last_error),
        })
    }
}

fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}
