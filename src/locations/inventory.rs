use crate::locations::export::ReportWriter;
use crate::locations::model::{Location, LocationReport};
use crate::utils::errors::{degrade, Result};
use crate::zia::client::ZiaClient;
use crate::zia::executor::Transport;

/// Gather details, VPN credentials and sub-locations for one location.
///
/// Each lookup degrades to an empty value on failure so one bad call never
/// loses the rest of the report.
pub async fn fetch_location_report<T: Transport>(
    client: &ZiaClient<T>,
    location: &Location,
) -> LocationReport {
    let id = location.id;
    let name = &location.name;

    let location_detail = degrade(
        client.get_location(id).await,
        &format!("Details of location {name} ({id})"),
    );
    let vpn_credentials = degrade(
        client.get_vpn_credentials(id).await,
        &format!("VPN credentials of location {name} ({id})"),
    );
    let sublocations = degrade(
        client.list_sublocations(id).await,
        &format!("Sub-locations of location {name} ({id})"),
    );

    tracing::debug!(
        "Location {name} ({id}): {} VPN credentials, {} sub-locations",
        vpn_credentials.len(),
        sublocations.len()
    );

    LocationReport {
        location_id: id,
        location_name: name.clone(),
        location_detail,
        vpn_credentials,
        sublocations,
    }
}

/// Export every location, writing each report as soon as it is complete
pub async fn export_all<T: Transport>(
    client: &ZiaClient<T>,
    writer: &ReportWriter,
) -> Result<Vec<LocationReport>> {
    tracing::info!("Fetching locations");
    let locations = client.list_locations().await?;
    let total = locations.len();
    tracing::info!("Total locations fetched: {total}");

    let mut reports = Vec::with_capacity(total);
    for (index, location) in locations.iter().enumerate() {
        tracing::info!(
            "[{}/{total}] Fetching details for {} (ID: {})",
            index + 1,
            location.name,
            location.id
        );

        let report = fetch_location_report(client, location).await;
        writer.write_location(&report)?;
        reports.push(report);
    }

    writer.write_merged(&reports)?;
    writer.write_csv(&reports)?;

    Ok(reports)
}
