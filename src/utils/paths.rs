use crate::utils::errors::{Result, ZiaCliError};
use std::fs;
use std::path::{Path, PathBuf};

pub struct ZiaPaths;
const PROGRAM_NAME: &str = "zia-locations";

/// Default directory for export snapshots, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "zia_outputs";

impl ZiaPaths {
    /// Get the config directory: ~/.config/zia-locations/
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(PROGRAM_NAME))
            .ok_or_else(|| ZiaCliError::Config("Cannot determine config directory".to_string()))
    }

    /// Get the default config file: ~/.config/zia-locations/config.yaml
    pub fn default_config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }

    /// Expand a leading `~/` to the home directory
    pub fn expand_home(path: &str) -> Result<PathBuf> {
        match path.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .ok_or_else(|| ZiaCliError::Config("Cannot determine home directory".to_string())),
            None => Ok(PathBuf::from(path)),
        }
    }

    /// Ensure a directory exists
    pub fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }
}
