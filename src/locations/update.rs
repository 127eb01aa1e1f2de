use crate::locations::model::{Location, Sublocation};
use crate::locations::sanitize::{disable_authentication, sanitize};
use crate::utils::errors::{degrade, Result};
use crate::zia::client::ZiaClient;
use crate::zia::executor::Transport;
use std::time::Duration;

pub const DEFAULT_MARKER: &str = "Whitelist";
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Substring a sub-location name must contain to be patched
    pub marker: String,
    /// Pause after each location's batch
    pub pause: Duration,
    pub dry_run: bool,
    pub activate: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            pause: DEFAULT_PAUSE,
            dry_run: false,
            activate: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub locations: usize,
    pub scanned: usize,
    pub matched: usize,
    pub updated: usize,
    /// Matches a dry run would have written
    pub would_update: usize,
    pub failed: usize,
    pub skipped: usize,
    pub fields_defaulted: usize,
    pub activated: bool,
}

impl UpdateSummary {
    pub fn rows(&self) -> Vec<(String, String)> {
        vec![
            ("Locations".into(), self.locations.to_string()),
            ("Sub-locations scanned".into(), self.scanned.to_string()),
            ("Matched".into(), self.matched.to_string()),
            ("Updated".into(), self.updated.to_string()),
            ("Would update".into(), self.would_update.to_string()),
            ("Failed".into(), self.failed.to_string()),
            ("Skipped".into(), self.skipped.to_string()),
            ("Fields defaulted".into(), self.fields_defaulted.to_string()),
            ("Activated".into(), self.activated.to_string()),
        ]
    }
}

enum PatchOutcome {
    Updated,
    WouldUpdate,
    Skipped,
    Failed,
}

pub struct SublocationUpdater<'a, T: Transport> {
    client: &'a ZiaClient<T>,
    options: UpdateOptions,
}

impl<'a, T: Transport> SublocationUpdater<'a, T> {
    pub fn new(client: &'a ZiaClient<T>, options: UpdateOptions) -> Self {
        Self { client, options }
    }

    /// Patch every matching sub-location of every location
    pub async fn run(&self) -> Result<UpdateSummary> {
        let locations = self.client.list_locations().await?;
        tracing::info!("Total locations fetched: {}", locations.len());

        let mut summary = UpdateSummary::default();
        for location in &locations {
            self.process_location(location, &mut summary).await;
            summary.locations += 1;
            tokio::time::sleep(self.options.pause).await;
        }

        if self.options.activate && summary.updated > 0 && !self.options.dry_run {
            match self.client.activate().await {
                Ok(_) => {
                    summary.activated = true;
                    tracing::info!("Configuration changes activated");
                }
                Err(e) => tracing::error!("Activation failed: {e}"),
            }
        }

        Ok(summary)
    }

    /// Patch the matching sub-locations of one location
    pub async fn process_location(&self, location: &Location, summary: &mut UpdateSummary) {
        tracing::info!(
            "Checking sub-locations for {} (ID: {})",
            location.name,
            location.id
        );

        let sublocations = degrade(
            self.client.list_sublocations(location.id).await,
            &format!("Sub-locations of location {} ({})", location.name, location.id),
        );

        for record in &sublocations {
            let sub = Sublocation::from_record(record);
            summary.scanned += 1;
            if !sub.needs_update(&self.options.marker) {
                tracing::debug!("No update needed for {}", sub.name);
                continue;
            }

            summary.matched += 1;
            let Some(id) = sub.id else {
                tracing::warn!("Sub-location {} has no usable id, skipping", sub.name);
                summary.skipped += 1;
                continue;
            };
            tracing::info!("Detected {} (ID: {id})", sub.name);
            match self.patch(id, &sub.name, summary).await {
                PatchOutcome::Updated => summary.updated += 1,
                PatchOutcome::WouldUpdate => summary.would_update += 1,
                PatchOutcome::Skipped => summary.skipped += 1,
                PatchOutcome::Failed => summary.failed += 1,
            }
        }
    }

    async fn patch(&self, id: i64, name: &str, summary: &mut UpdateSummary) -> PatchOutcome {
        let record = match self.client.get_location(id).await {
            Ok(record) if !record.is_empty() => record,
            Ok(_) => {
                tracing::warn!("Sub-location {name} returned an empty record, skipping");
                return PatchOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!("Failed to get sub-location details for {name}: {e}");
                return PatchOutcome::Skipped;
            }
        };

        let mut record = record;
        disable_authentication(&mut record);
        let sanitized = sanitize(record);
        if !sanitized.defaulted.is_empty() {
            let fields: Vec<&str> = sanitized.defaulted.iter().copied().collect();
            tracing::info!("Filled {} on {name}", fields.join(", "));
            summary.fields_defaulted += fields.len();
        }

        if self.options.dry_run {
            tracing::info!("Dry run: would update {name} (ID: {id})");
            return PatchOutcome::WouldUpdate;
        }

        match self.client.update_location(id, &sanitized.record).await {
            Ok(_) => {
                tracing::info!("Updated {name}");
                PatchOutcome::Updated
            }
            Err(e) => {
                tracing::error!("Failed to update {name}: {e}");
                PatchOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zia::executor::fake::ScriptedTransport;
    use crate::zia::executor::{RawResponse, RetryPolicy};
    use reqwest::Method;
    use serde_json::{json, Value};

    const BASE: &str = "https://zsapi.example.net/api/v1";

    fn client(transport: ScriptedTransport) -> ZiaClient<ScriptedTransport> {
        let policy = RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_secs(10),
            error_delay: Duration::from_secs(1),
            retry_client_errors: true,
        };
        ZiaClient::with_transport(transport, BASE.to_string(), policy)
    }

    fn options() -> UpdateOptions {
        UpdateOptions::default()
    }

    fn script_one_location(transport: &ScriptedTransport, subs: Value) {
        transport.push_json(
            Method::GET,
            &format!("{BASE}/locations?page=1&pageSize=100"),
            200,
            json!([{"id": 1, "name": "Paris"}]),
        );
        transport.push_json(
            Method::GET,
            &format!("{BASE}/locations/1/sublocations?page=1&pageSize=100"),
            200,
            subs,
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitelist_sublocation_is_patched() {
        let transport = ScriptedTransport::new();
        script_one_location(
            &transport,
            json!([{"id": 11, "name": "Whitelist-HQ", "authRequired": true}]),
        );
        transport.push_json(
            Method::GET,
            &format!("{BASE}/locations/11"),
            200,
            json!({
                "id": 11,
                "name": "Whitelist-HQ",
                "authRequired": true,
                "surrogateIP": true,
                "surrogateIPEnforcedForKnownBrowsers": true,
                "country": "GERMANY",
                "parentId": 1
            }),
        );
        transport.push_json(
            Method::PUT,
            &format!("{BASE}/locations/11"),
            200,
            json!({"id": 11}),
        );
        let client = client(transport);

        let summary = SublocationUpdater::new(&client, options())
            .run()
            .await
            .unwrap();

        assert_eq!(summary.matched, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failed, 0);
        assert!(!summary.activated);

        let puts = client
            .executor()
            .transport()
            .calls_to(Method::PUT, &format!("{BASE}/locations/11"));
        assert_eq!(puts.len(), 1);
        let body = puts[0].body.clone().unwrap();
        assert_eq!(body["authRequired"], json!(false));
        assert_eq!(body["surrogateIP"], json!(false));
        assert_eq!(body["surrogateIPEnforcedForKnownBrowsers"], json!(false));
        assert_eq!(body["xffForwardEnabled"], json!(false));
        assert_eq!(body["profile"], json!("CORPORATE"));
        assert_eq!(body["tz"], json!("FRANCE_EUROPE_PARIS"));
        assert_eq!(body["ipAddresses"], json!(["0.0.0.0-0.0.0.0"]));
        // Present values are kept
        assert_eq!(body["country"], json!("GERMANY"));
        assert_eq!(body["parentId"], json!(1));
        // profile, tz, ipAddresses, xffForwardEnabled
        assert_eq!(summary.fields_defaulted, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_sibling_does_not_block_the_batch() {
        let transport = ScriptedTransport::new();
        script_one_location(
            &transport,
            json!([
                {"id": 11, "name": "Whitelist-HQ", "authRequired": true},
                {"id": 12, "name": "Whitelist-Lab", "authRequired": "yes", "country": 7},
                {"name": "Whitelist-Orphan", "authRequired": true}
            ]),
        );
        transport.push_json(
            Method::GET,
            &format!("{BASE}/locations/11"),
            200,
            json!({"id": 11, "name": "Whitelist-HQ", "authRequired": true}),
        );
        transport.push_json(Method::PUT, &format!("{BASE}/locations/11"), 200, json!({}));
        let client = client(transport);

        let summary = SublocationUpdater::new(&client, options())
            .run()
            .await
            .unwrap();

        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.matched, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            client
                .executor()
                .transport()
                .calls_to(Method::PUT, &format!("{BASE}/locations/11"))
                .len(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_matching_sublocations_are_untouched() {
        let transport = ScriptedTransport::new();
        script_one_location(
            &transport,
            json!([
                {"id": 12, "name": "Branch-Office", "authRequired": false},
                {"id": 13, "name": "Whitelist-Lab", "authRequired": false},
                {"id": 14, "name": "Guest", "authRequired": true}
            ]),
        );
        let client = client(transport);

        let summary = SublocationUpdater::new(&client, options())
            .run()
            .await
            .unwrap();

        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.matched, 0);
        let calls = client.executor().transport().calls();
        assert!(calls.iter().all(|call| call.method == Method::GET));
        assert!(!calls
            .iter()
            .any(|call| call.url.ends_with("/locations/12")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_put_does_not_stop_the_batch() {
        let transport = ScriptedTransport::new();
        script_one_location(
            &transport,
            json!([
                {"id": 21, "name": "Whitelist-A", "authRequired": true},
                {"id": 22, "name": "Whitelist-B", "authRequired": true}
            ]),
        );
        for id in [21, 22] {
            transport.push_json(
                Method::GET,
                &format!("{BASE}/locations/{id}"),
                200,
                json!({"id": id, "name": format!("sub-{id}"), "authRequired": true}),
            );
        }
        for _ in 0..2 {
            transport.push(
                Method::PUT,
                &format!("{BASE}/locations/21"),
                Ok(RawResponse::new(500, "error")),
            );
        }
        transport.push_json(Method::PUT, &format!("{BASE}/locations/22"), 200, json!({}));
        let client = client(transport);

        let summary = SublocationUpdater::new(&client, options())
            .run()
            .await
            .unwrap();

        assert_eq!(summary.matched, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.updated, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_record_is_skipped() {
        let transport = ScriptedTransport::new();
        script_one_location(
            &transport,
            json!([{"id": 31, "name": "Whitelist-HQ", "authRequired": true}]),
        );
        let client = client(transport);

        let summary = SublocationUpdater::new(&client, options())
            .run()
            .await
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.updated, 0);
        assert!(client
            .executor()
            .transport()
            .calls_to(Method::PUT, &format!("{BASE}/locations/31"))
            .is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_skips_writes() {
        let transport = ScriptedTransport::new();
        script_one_location(
            &transport,
            json!([{"id": 11, "name": "Whitelist-HQ", "authRequired": true}]),
        );
        transport.push_json(
            Method::GET,
            &format!("{BASE}/locations/11"),
            200,
            json!({"id": 11, "name": "Whitelist-HQ", "authRequired": true}),
        );
        let client = client(transport);
        let options = UpdateOptions {
            dry_run: true,
            activate: true,
            ..options()
        };

        let summary = SublocationUpdater::new(&client, options)
            .run()
            .await
            .unwrap();

        assert_eq!(summary.matched, 1);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.would_update, 1);
        assert!(!summary.activated);
        assert!(client
            .executor()
            .transport()
            .calls()
            .iter()
            .all(|call| call.method == Method::GET));
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_after_updates() {
        let transport = ScriptedTransport::new();
        script_one_location(
            &transport,
            json!([{"id": 11, "name": "Whitelist-HQ", "authRequired": true}]),
        );
        transport.push_json(
            Method::GET,
            &format!("{BASE}/locations/11"),
            200,
            json!({"id": 11, "name": "Whitelist-HQ", "authRequired": true}),
        );
        transport.push_json(Method::PUT, &format!("{BASE}/locations/11"), 200, json!({}));
        transport.push_json(
            Method::POST,
            &format!("{BASE}/status/activate"),
            200,
            json!({"status": "ACTIVE"}),
        );
        let client = client(transport);
        let options = UpdateOptions {
            activate: true,
            ..options()
        };

        let summary = SublocationUpdater::new(&client, options)
            .run()
            .await
            .unwrap();

        assert!(summary.activated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_locations() {
        let transport = ScriptedTransport::new();
        transport.push_json(
            Method::GET,
            &format!("{BASE}/locations?page=1&pageSize=100"),
            200,
            json!([{"id": 1, "name": "Paris"}, {"id": 2, "name": "Lyon"}]),
        );
        for id in [1, 2] {
            transport.push_json(
                Method::GET,
                &format!("{BASE}/locations/{id}/sublocations?page=1&pageSize=100"),
                200,
                json!([]),
            );
        }
        let client = client(transport);

        let start = tokio::time::Instant::now();
        let summary = SublocationUpdater::new(&client, options())
            .run()
            .await
            .unwrap();

        assert_eq!(summary.locations, 2);
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }
}
