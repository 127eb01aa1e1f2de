pub mod cli;
pub mod locations;
pub mod utils;
pub mod zia;

pub use cli::{args, commands};
pub use locations::{
    csv_rows, export_all, sanitize, LocationReport, ReportWriter, SanitizedRecord,
    SublocationUpdater, UpdateOptions, UpdateSummary,
};
pub use utils::{config, errors, paths};
pub use zia::{client, executor};
