//! Dubclient - Upload Client for a Video Dubbing Service
//!
//! This is the main entry point for the dubclient application, which submits
//! a video to a dubbing backend and saves the dubbed result.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use dubclient::cli::{Args, Commands};
use dubclient::config::Config;
use dubclient::handler::SubmissionOutcome;
use dubclient::logging;
use dubclient::view::TerminalView;
use dubclient::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let args = Args::parse();

    // Configuration comes first: it says where the log file goes
    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => Some(PathBuf::from("config.toml")).filter(|p| p.exists()),
    };
    let mut config = match &config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let _log_guard = logging::init(&config.logging, args.verbose)?;
    match &config_path {
        Some(path) => info!("Starting dubclient with {}", path.display()),
        None => info!("Starting dubclient with default configuration"),
    }

    match args.command {
        Commands::Dub { input, target_lang, output, backend_url } => {
            if let Some(url) = backend_url {
                config.backend.base_url = url;
            }

            let workflow = Workflow::new(config)?;
            let view = TerminalView::new();
            let outcome = workflow
                .dub_file(input.as_deref(), target_lang.as_deref(), output.as_deref(), &view)
                .await;
            workflow.teardown();

            // the view has already alerted; only the exit status is left to report
            let outcome = outcome?;
            if let SubmissionOutcome::Displayed { bytes, .. } = &outcome {
                info!("Dub completed ({} bytes)", bytes);
            }
            return Ok(ExitCode::from(outcome.exit_status()));
        }
        Commands::Languages => {
            let default = config.ui.default_language.clone();
            let workflow = Workflow::new(config)?;

            println!("\nTarget Languages:");
            println!("{:<8} {:<20} {:<8}", "Code", "Language", "Default");
            println!("{}", "-".repeat(38));

            for language in workflow.languages() {
                let marker = if language.code == default { "*" } else { "" };
                println!("{:<8} {:<20} {:<8}", language.code, language.label, marker);
            }
        }
        Commands::Check { backend_url } => {
            if let Some(url) = backend_url {
                config.backend.base_url = url;
            }

            let workflow = Workflow::new(config.clone())?;
            workflow.check_backend().await?;
            println!("Dubbing backend is reachable at {}", config.backend.base_url);
        }
        Commands::InitConfig { path } => {
            if path.exists() {
                anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
            }
            Config::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
