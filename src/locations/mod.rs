pub mod export;
pub mod inventory;
pub mod model;
pub mod sanitize;
pub mod update;

pub use export::{csv_rows, ReportWriter};
pub use inventory::{export_all, fetch_location_report};
pub use model::{Location, LocationReport, Sublocation, VpnCredential};
pub use sanitize::{sanitize, SanitizedRecord};
pub use update::{SublocationUpdater, UpdateOptions, UpdateSummary};
