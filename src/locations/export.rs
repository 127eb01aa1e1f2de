use crate::locations::model::{LocationReport, Sublocation, VpnCredential};
use crate::utils::errors::Result;
use crate::utils::paths::ZiaPaths;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MERGED_JSON_FILE: &str = "all_locations_data.json";
pub const CSV_FILE: &str = "locations_vpn_credentials.csv";

pub const CSV_HEADERS: [&str; 13] = [
    "Location ID",
    "Location Name",
    "VPN FQDN",
    "Pre-Shared Key",
    "Sublocation ID",
    "Sublocation Name",
    "Country",
    "Time Zone",
    "Auth Required",
    "Surrogate IP",
    "XFF Forward Enabled",
    "IP Addresses",
    "Profile",
];

/// Writes export snapshots into one output directory
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: &Path) -> Result<Self> {
        ZiaPaths::ensure_dir_exists(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn location_path(&self, location_id: i64) -> PathBuf {
        self.output_dir.join(format!("location_{location_id}.json"))
    }

    pub fn merged_path(&self) -> PathBuf {
        self.output_dir.join(MERGED_JSON_FILE)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(CSV_FILE)
    }

    /// Write `location_<id>.json`
    pub fn write_location(&self, report: &LocationReport) -> Result<PathBuf> {
        let path = self.location_path(report.location_id);
        write_json(&path, report)?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Write the merged array of every report
    pub fn write_merged(&self, reports: &[LocationReport]) -> Result<PathBuf> {
        let path = self.merged_path();
        write_json(&path, reports)?;
        tracing::info!("Merged JSON written: {}", path.display());
        Ok(path)
    }

    pub fn write_csv(&self, reports: &[LocationReport]) -> Result<PathBuf> {
        let path = self.csv_path();
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(CSV_HEADERS)?;
        for row in csv_rows(reports) {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        tracing::info!("CSV generation completed: {}", path.display());
        Ok(path)
    }
}

fn write_json<S: Serialize + ?Sized>(path: &Path, value: &S) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn flag(value: Option<bool>) -> String {
    value.map(|b| b.to_string()).unwrap_or_default()
}

fn vpn_columns(vpn: Option<&VpnCredential>) -> [String; 2] {
    match vpn {
        Some(cred) => [
            cred.fqdn.clone().unwrap_or_default(),
            cred.pre_shared_key.clone().unwrap_or_default(),
        ],
        None => Default::default(),
    }
}

fn sublocation_columns(sub: Option<&Sublocation>) -> [String; 9] {
    match sub {
        Some(sub) => [
            sub.id.map(|id| id.to_string()).unwrap_or_default(),
            sub.name.clone(),
            sub.country.clone().unwrap_or_default(),
            sub.tz.clone().unwrap_or_default(),
            flag(sub.auth_required),
            flag(sub.surrogate_ip),
            flag(sub.xff_forward_enabled),
            sub.ip_addresses.join(", "),
            sub.profile.clone().unwrap_or_default(),
        ],
        None => Default::default(),
    }
}

/// Flatten reports into CSV rows.
///
/// Each sub-location is paired with every VPN credential. A side with no
/// entries contributes one blank slot, so a location always yields a row.
pub fn csv_rows(reports: &[LocationReport]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for report in reports {
        let vpn_views = report.vpn_credential_views();
        let sub_views = report.sublocation_views();
        let vpns: Vec<Option<&VpnCredential>> = if vpn_views.is_empty() {
            vec![None]
        } else {
            vpn_views.iter().map(Some).collect()
        };
        let subs: Vec<Option<&Sublocation>> = if sub_views.is_empty() {
            vec![None]
        } else {
            sub_views.iter().map(Some).collect()
        };

        for sub in &subs {
            for vpn in &vpns {
                let mut row = Vec::with_capacity(CSV_HEADERS.len());
                row.push(report.location_id.to_string());
                row.push(report.location_name.clone());
                row.extend(vpn_columns(*vpn));
                row.extend(sublocation_columns(*sub));
                rows.push(row);
            }
        }
    }

    rows
}
