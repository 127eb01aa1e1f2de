use crate::cli::args::Cli;
use crate::locations::update::{DEFAULT_MARKER, DEFAULT_PAUSE};
use crate::utils::errors::{Result, ZiaCliError};
use crate::utils::paths::{ZiaPaths, DEFAULT_OUTPUT_DIR};
use crate::zia::executor::RetryPolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CLOUD: &str = "zscaler.net";

/// Settings read from the YAML config file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub cloud: Option<String>,
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub api_key: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub marker: Option<String>,
    pub pause_ms: Option<u64>,
    pub retry: Option<RetryPolicy>,
}

impl FileConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a config file; a missing default file is not an error
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                return Err(ZiaCliError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        tracing::debug!("Loading config from {}", path.display());
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Load the file named by `--config`, or the default one if present
    pub fn load_for(cli: &Cli) -> Result<Self> {
        match &cli.config {
            Some(path) => Self::load(&ZiaPaths::expand_home(path)?, true),
            None => match ZiaPaths::default_config_file() {
                Ok(path) => Self::load(&path, false),
                Err(_) => Ok(Self::default()),
            },
        }
    }
}

/// Effective settings for a run: flags and environment over file over defaults
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub username: Option<String>,
    pub api_key: Option<String>,
    pub password: Option<String>,
    pub retry: RetryPolicy,
    pub output_dir: PathBuf,
    pub marker: String,
    pub pause: Duration,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self> {
        let base_url = match cli.base_url.clone().or(file.base_url) {
            Some(url) => url,
            None => {
                let cloud = cli
                    .cloud
                    .clone()
                    .or(file.cloud)
                    .unwrap_or_else(|| DEFAULT_CLOUD.to_string());
                crate::zia::base_url_for_cloud(&cloud)
            }
        };
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ZiaCliError::Config(format!(
                "Base URL must start with http:// or https://: {base_url}"
            )));
        }

        let mut retry = file.retry.unwrap_or_default();
        if let Some(max_retries) = cli.max_retries {
            retry.max_retries = max_retries;
        }
        if let Some(secs) = cli.base_delay_secs {
            retry.base_delay = Duration::try_from_secs_f64(secs).map_err(|e| {
                ZiaCliError::InvalidInput(format!("Invalid --base-delay-secs {secs}: {e}"))
            })?;
        }
        if cli.no_retry_client_errors {
            retry.retry_client_errors = false;
        }

        Ok(Self {
            base_url,
            username: cli.username.clone().or(file.username),
            api_key: cli.api_key.clone().or(file.api_key),
            password: cli.password.clone(),
            retry,
            output_dir: file
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            marker: file.marker.unwrap_or_else(|| DEFAULT_MARKER.to_string()),
            pause: file
                .pause_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_PAUSE),
        })
    }
}
