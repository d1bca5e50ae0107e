use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use site_crew::input::{self, InputError};
use site_crew::{
    Blueprints, CrewConfig, CrewError, Mode, Orchestrator, Retrying, RigReasoner, RunReport,
    Settings,
};

/// Build or edit a website from a plain-language request read on stdin.
#[derive(Debug, Parser)]
#[command(name = "site-crew", version)]
struct Args {
    /// Workflow selection.
    #[arg(long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,

    /// Directory the site is written to (relative to --base-dir).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory relative paths resolve against. Defaults to the working directory.
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// TOML settings file.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Directory with build.yaml / edit.yaml / router.yaml overrides.
    #[arg(long)]
    blueprint_dir: Option<PathBuf>,

    /// Write a JSON run report here.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<CrewError>() {
                Some(crew_err) => {
                    error!(phase = %crew_err.phase(), "run failed");
                    eprintln!("\nAn error occurred during {}:", crew_err.phase());
                    eprintln!("{crew_err}");
                }
                None => eprintln!("\nError: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<CrewConfig> {
    let settings = match &args.settings {
        Some(path) => Settings::load(path).map_err(CrewError::from)?,
        None => Settings::default(),
    };
    let mut config = CrewConfig::from_env(settings).map_err(CrewError::from)?;
    if let Some(base_dir) = &args.base_dir {
        config.set_base_dir(base_dir.clone());
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    Ok(config)
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = load_config(&args)?;
    let blueprints = match &args.blueprint_dir {
        Some(dir) => Blueprints::with_overrides(dir),
        None => Blueprints::builtin(),
    }
    .map_err(CrewError::from)?;

    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    if interactive {
        eprintln!("Hi, how can I help you today? What website do you want me to build for you today?");
        eprintln!("(Enter your description, then press Enter twice or Ctrl+D when done)\n");
    }
    let raw = input::read_request(stdin.lock(), interactive)?;
    let request = match input::validate(&raw) {
        Ok(Some(request)) => request,
        Ok(None) => {
            eprintln!("No website description provided. Exiting.");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e @ InputError::TooLong { .. }) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        model = %config.model,
        base_url = %config.base_url,
        output_dir = %config.output_path().display(),
        mode = ?args.mode,
        "site-crew starting"
    );
    let reasoner = RigReasoner::new(&config)?;
    let service = Arc::new(Retrying::new(reasoner, config.max_retries));
    let orchestrator = Orchestrator::new(config, blueprints, service);

    let report = orchestrator.run(request, args.mode).await?;
    print_summary(&report);

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write run report to {}", path.display()))?;
        info!(path = %path.display(), "run report written");
    }
    Ok(ExitCode::SUCCESS)
}

fn print_summary(report: &RunReport) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("GENERATION COMPLETE");
    println!("{rule}");
    if report.output.raw.trim().is_empty() {
        println!(
            "Site generation completed. Your website is ready in the '{}' directory.",
            report.output_dir.display()
        );
    } else {
        println!("{}", report.output.raw.trim());
    }
    println!("\n{rule}");
}
