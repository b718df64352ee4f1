//! Plan Preview CLI Application
//!
//! This is the command-line interface for the plan preview engine.
//! It uses the plan-preview library and adds:
//! - Plan (TOML/JSON) and driver profile (JSON) loading
//! - Application configuration (config.toml)
//! - Parallel preview of several plans
//! - Report generation (TXT/JSON)

use anyhow::{Context, Result};
use clap::Parser;
use plan_preview::{PlanPreviewer, RecordingSink};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

mod config;
mod profiles;
mod report;

use config::{AppConfig, OutputFormat};
use profiles::FileProfileProvider;
use report::PreviewReport;

/// Plan Preview - Locate segment ends and trigger points of experiment plans
#[derive(Parser, Debug)]
#[command(name = "plan-preview-cli")]
#[command(about = "Preview experiment plans against recorded driver profiles", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a plan file, TOML or JSON (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    plan: Vec<PathBuf>,

    /// Path to a driver profile JSON file (can be repeated)
    #[arg(long, value_name = "FILE")]
    profile: Vec<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report format (overrides the config file)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Plan Preview CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using preview library v{}", plan_preview::VERSION);

    let config = merge_config(&args)?;
    if config.input.plans.is_empty() {
        // No arguments - show help
        println!("Plan Preview - No input specified");
        println!("\nQuick Start:");
        println!("  plan-preview-cli --plan anneal.toml --profile furnace.json");
        println!("  plan-preview-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }
    config.validate()?;

    let provider = FileProfileProvider::load(config.input.profiles.as_slice())?;
    log::info!("Loaded {} driver profiles", provider.len());

    let previewer = PlanPreviewer::with_config(config.preview.clone());
    let reports = config
        .input
        .plans
        .par_iter()
        .map(|path| preview_plan(path, &previewer, &provider))
        .collect::<Result<Vec<_>>>()?;

    let rendered = report::render(&reports, config.output.format)?;
    match &config.output.output_file {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Combine the config file (if any) with command line arguments; arguments win
fn merge_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    config.input.plans.extend(args.plan.iter().cloned());
    config.input.profiles.extend(args.profile.iter().cloned());
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(output) = &args.output {
        config.output.output_file = Some(output.clone());
    }
    Ok(config)
}

/// Load and preview one plan
fn preview_plan(
    path: &Path,
    previewer: &PlanPreviewer,
    provider: &FileProfileProvider,
) -> Result<PreviewReport> {
    let plan = profiles::load_plan(path)?;

    let mut sink = RecordingSink::new();
    let outcome = previewer.update(&plan, provider, &mut sink);
    log::info!("Previewed '{}': {:?}", plan.name, outcome);

    Ok(PreviewReport::new(plan.name, &outcome, sink.into_calls()))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
