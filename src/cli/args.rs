use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "zia-locations")]
#[command(version = "1.0.0")]
#[command(about = "Export ZIA locations and bulk-patch sub-locations")]
#[command(long_about = None)]
pub struct Cli {
    /// ZIA cloud name (API host is zsapi.<cloud>)
    #[arg(long, env = "ZIA_CLOUD")]
    pub cloud: Option<String>,

    /// Full API base URL, overrides --cloud
    #[arg(long, env = "ZIA_BASE_URL")]
    pub base_url: Option<String>,

    /// Admin username
    #[arg(long, env = "ZIA_USERNAME")]
    pub username: Option<String>,

    /// API key
    #[arg(long, env = "ZIA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Admin password (prompted when not set)
    #[arg(long, env = "ZIA_PASSWORD", hide_env_values = true, hide = true)]
    pub password: Option<String>,

    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    /// Retries after the first call of each request
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Base delay in seconds for rate-limit backoff (doubles on every retry)
    #[arg(long)]
    pub base_delay_secs: Option<f64>,

    /// Fail immediately on 4xx responses other than 429
    #[arg(long)]
    pub no_retry_client_errors: bool,

    /// Enable verbose logging (repeat for more verbosity: -v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output raw tab-separated values (no formatting)
    #[arg(short, long)]
    pub raw: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export locations, VPN credentials and sub-locations to JSON and CSV
    Export {
        /// Output directory
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,
    },
    /// Disable authentication on sub-locations whose name contains a marker
    UpdateSublocations {
        /// Name substring selecting sub-locations to patch
        #[arg(long)]
        marker: Option<String>,
        /// Pause in milliseconds after each location
        #[arg(long)]
        pause_ms: Option<u64>,
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
        /// Activate configuration changes after updating
        #[arg(long)]
        activate: bool,
    },
    /// Generate shell completion scripts
    Completion {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate bash completion script
    Bash,
    /// Generate zsh completion script
    Zsh,
    /// Generate fish completion script
    Fish,
    /// Generate PowerShell completion script
    PowerShell,
}

impl CompletionCommands {
    pub fn shell(&self) -> Shell {
        match self {
            CompletionCommands::Bash => Shell::Bash,
            CompletionCommands::Zsh => Shell::Zsh,
            CompletionCommands::Fish => Shell::Fish,
            CompletionCommands::PowerShell => Shell::PowerShell,
        }
    }
}
