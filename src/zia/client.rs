use crate::locations::model::Location;
use crate::utils::errors::{Result, ZiaCliError};
use crate::zia::auth::{Credentials, ZiaAuth};
use crate::zia::executor::{ApiRequest, HttpTransport, RequestExecutor, RetryPolicy, Transport};
use serde_json::{Map, Value};

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_MAX_PAGES: usize = 1000;

pub struct ZiaClient<T: Transport = HttpTransport> {
    executor: RequestExecutor<T>,
    base_url: String,
    page_size: usize,
    max_pages: usize,
}

impl ZiaClient<HttpTransport> {
    /// Client over a fresh `reqwest` session
    pub fn connect(base_url: String, policy: RetryPolicy) -> Result<Self> {
        let http = super::create_http_client()?;
        Ok(Self::with_transport(
            HttpTransport::new(http),
            base_url,
            policy,
        ))
    }
}

impl<T: Transport> ZiaClient<T> {
    pub fn with_transport(transport: T, base_url: String, policy: RetryPolicy) -> Self {
        Self {
            executor: RequestExecutor::new(transport, policy),
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Get API base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        ZiaAuth::new(&self.executor, &self.base_url)
            .login(credentials)
            .await
    }

    pub async fn logout(&self) -> Result<()> {
        ZiaAuth::new(&self.executor, &self.base_url).logout().await
    }

    /// Fetch every page of a collection endpoint.
    ///
    /// Stops on a short page, or on a page identical to the previous one
    /// (a server ignoring `page`). More than `max_pages` pages is an error.
    async fn get_paginated(&self, path: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut previous: Option<Vec<Value>> = None;
        let mut page = 1;

        loop {
            if page > self.max_pages {
                return Err(ZiaCliError::UnexpectedPayload(format!(
                    "{path} returned more than {} full pages",
                    self.max_pages
                )));
            }

            let url = format!(
                "{}?page={page}&pageSize={}",
                self.url(path),
                self.page_size
            );
            let response = self
                .executor
                .execute(&ApiRequest::get(url))
                .await?
                .unwrap_or(Value::Null);

            let batch = super::extract_array(response).ok_or_else(|| {
                ZiaCliError::UnexpectedPayload(format!("{path} page {page} is not a list"))
            })?;
            let count = batch.len();
            tracing::trace!("{path} page {page}: {count} items");

            if previous.as_ref() == Some(&batch) {
                tracing::warn!("{path} page {page} repeats page {}, stopping", page - 1);
                break;
            }

            items.extend(batch.iter().cloned());
            if count < self.page_size {
                break;
            }
            previous = Some(batch);
            page += 1;
        }

        Ok(items)
    }

    /// List all locations; entries without a usable id are skipped
    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        let items = self.get_paginated("locations").await?;
        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Location>(item) {
                Ok(location) => Some(location),
                Err(e) => {
                    tracing::warn!("Skipping unreadable location entry: {e}");
                    None
                }
            })
            .collect())
    }

    /// Full record of a location or sub-location
    pub async fn get_location(&self, id: i64) -> Result<Map<String, Value>> {
        let response = self
            .executor
            .execute(&ApiRequest::get(self.url(&format!("locations/{id}"))))
            .await?;

        match response {
            Some(Value::Object(record)) => Ok(record),
            Some(Value::Null) | None => Ok(Map::new()),
            Some(other) => Err(ZiaCliError::UnexpectedPayload(format!(
                "location {id} is not an object: {other}"
            ))),
        }
    }

    /// VPN credentials of a location; a missing resource yields an empty list
    pub async fn get_vpn_credentials(&self, location_id: i64) -> Result<Vec<Map<String, Value>>> {
        let request = ApiRequest::get(self.url(&format!("locations/{location_id}/vpnCredentials")))
            .optional();

        match self.executor.execute(&request).await? {
            None => Ok(Vec::new()),
            Some(response) => {
                let items = super::extract_array(response).ok_or_else(|| {
                    ZiaCliError::UnexpectedPayload(format!(
                        "VPN credentials of location {location_id} are not a list"
                    ))
                })?;
                Ok(records(items, "VPN credential"))
            }
        }
    }

    /// All sub-location records of a location, as returned by the API
    pub async fn list_sublocations(&self, location_id: i64) -> Result<Vec<Map<String, Value>>> {
        let items = self
            .get_paginated(&format!("locations/{location_id}/sublocations"))
            .await?;
        Ok(records(items, "sub-location"))
    }

    /// Write back a full location or sub-location record
    pub async fn update_location(&self, id: i64, record: &Map<String, Value>) -> Result<Value> {
        let request = ApiRequest::put(
            self.url(&format!("locations/{id}")),
            Value::Object(record.clone()),
        );
        Ok(self.executor.execute(&request).await?.unwrap_or(Value::Null))
    }

    /// Activate pending configuration changes
    pub async fn activate(&self) -> Result<Value> {
        let request = ApiRequest::post(self.url("status/activate"), None);
        Ok(self.executor.execute(&request).await?.unwrap_or(Value::Null))
    }
}

/// Keep the object entries of a list, dropping anything else
fn records(items: Vec<Value>, what: &str) -> Vec<Map<String, Value>> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(record),
            other => {
                tracing::warn!("Skipping {what} entry that is not an object: {other}");
                None
            }
        })
        .collect()
}
