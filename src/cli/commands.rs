use crate::cli::args::*;
use crate::cli::completions::handle_completion_command;
use crate::locations::export::ReportWriter;
use crate::locations::inventory::export_all;
use crate::locations::update::{SublocationUpdater, UpdateOptions};
use crate::utils::config::{FileConfig, Settings};
use crate::utils::errors::{Result, ZiaCliError};
use crate::utils::output::OutputFormat;
use crate::zia::auth::Credentials;
use crate::zia::client::ZiaClient;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

pub async fn handle_command(cli: Cli) -> Result<()> {
    // Initialize logging - always to stderr
    if !cli.quiet {
        let log_level = match cli.verbose {
            0 => "zia_locations=warn",  // Default: warnings only
            1 => "zia_locations=info",  // -v: info level
            2 => "zia_locations=debug", // -vv: debug level
            _ => "zia_locations=trace", // -vvv+: trace level
        };

        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(log_level)
            .init();
    }

    // Create output formatter
    let output = OutputFormat::new(cli.raw);

    if let Commands::Completion { ref command } = cli.command {
        return handle_completion_command(command);
    }

    let settings = Settings::resolve(&cli, FileConfig::load_for(&cli)?)?;

    match cli.command {
        Commands::Export { output_dir } => {
            handle_export_command(&settings, output_dir, &output).await
        }
        Commands::UpdateSublocations {
            marker,
            pause_ms,
            dry_run,
            activate,
        } => {
            let options = UpdateOptions {
                marker: marker.unwrap_or_else(|| settings.marker.clone()),
                pause: pause_ms.map(Duration::from_millis).unwrap_or(settings.pause),
                dry_run,
                activate,
            };
            handle_update_command(&settings, options, &output).await
        }
        Commands::Completion { .. } => Ok(()),
    }
}

async fn handle_export_command(
    settings: &Settings,
    output_dir: Option<PathBuf>,
    output: &OutputFormat,
) -> Result<()> {
    let output_dir = output_dir.unwrap_or_else(|| settings.output_dir.clone());
    let writer = ReportWriter::new(&output_dir)?;

    let client = connect(settings).await?;
    let result = export_all(&client, &writer).await;
    close(&client).await;
    let reports = result?;

    let sublocations: usize = reports.iter().map(|r| r.sublocations.len()).sum();
    let credentials: usize = reports.iter().map(|r| r.vpn_credentials.len()).sum();
    output.print_key_value(&[
        ("Locations".to_string(), reports.len().to_string()),
        ("VPN credentials".to_string(), credentials.to_string()),
        ("Sub-locations".to_string(), sublocations.to_string()),
        (
            "Merged JSON".to_string(),
            writer.merged_path().display().to_string(),
        ),
        ("CSV".to_string(), writer.csv_path().display().to_string()),
    ]);
    Ok(())
}

async fn handle_update_command(
    settings: &Settings,
    options: UpdateOptions,
    output: &OutputFormat,
) -> Result<()> {
    if options.marker.is_empty() {
        return Err(ZiaCliError::InvalidInput(
            "Marker must not be empty, it would select every sub-location".to_string(),
        ));
    }

    let client = connect(settings).await?;
    let result = SublocationUpdater::new(&client, options).run().await;
    close(&client).await;
    let summary = result?;

    output.print_key_value(&summary.rows());
    Ok(())
}

/// Build the client for a run and open its session
async fn connect(settings: &Settings) -> Result<ZiaClient> {
    let credentials = credentials(settings)?;
    let client = ZiaClient::connect(settings.base_url.clone(), settings.retry.clone())?;
    tracing::debug!("Using API at {}", client.base_url());
    client.login(&credentials).await?;
    Ok(client)
}

async fn close(client: &ZiaClient) {
    if let Err(e) = client.logout().await {
        tracing::warn!("Failed to close session: {e}");
    }
}

fn credentials(settings: &Settings) -> Result<Credentials> {
    let username = settings.username.clone().ok_or_else(|| {
        ZiaCliError::Config("Username required (--username or ZIA_USERNAME)".to_string())
    })?;
    let api_key = settings.api_key.clone().ok_or_else(|| {
        ZiaCliError::Config("API key required (--api-key or ZIA_API_KEY)".to_string())
    })?;
    let password = match &settings.password {
        Some(password) => password.clone(),
        None => rpassword::prompt_password(format!("Password for {username}: "))
            .map_err(|e| ZiaCliError::Auth(format!("Failed to read password: {e}")))?,
    };

    Ok(Credentials {
        username,
        password,
        api_key,
    })
}
