use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use livesync_patcher::config::PlatformList;
use livesync_patcher::{
    load_from_path, PatchOptions, PatchReport, PatchStatus, Patcher, PatcherConfig, Platform,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "livesync-patcher")]
#[command(about = "Patch app platform trees for a live-reloading dev server", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root holding the `platforms/` directory
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Comma-delimited platforms to patch (default: android,ios,windows,electron)
    #[arg(short, long, global = true)]
    platforms: Option<String>,

    /// TOML config file; command-line flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the start page and point platform manifests at it
    Prepatch,

    /// Embed live server addresses and relax security policies
    Patch {
        /// Live server as NAME=ORIGIN; a bare NAME marks the server absent
        #[arg(short, long = "server", value_name = "NAME=ORIGIN")]
        servers: Vec<String>,

        /// Page each server serves, relative to the platform's www directory
        #[arg(short, long)]
        index: Option<String>,

        /// Load the first server found instead of asking
        #[arg(short, long)]
        force_load: bool,
    },

    /// Print a platform's web root relative to the project root
    WebRoot {
        platform: Platform,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Prepatch => {
            let patcher = build_patcher(&config)?;
            let report = patcher.prepatch().context("prepatch failed")?;
            print_report(&report)
        }

        Commands::Patch {
            servers,
            index,
            force_load,
        } => {
            let mut patcher = build_patcher(&config)?;
            let options = patch_options(config.patch.clone(), &servers, index, force_load)?;
            let report = patcher.patch(&options).context("patch failed")?;
            print_report(&report)
        }

        Commands::WebRoot { platform } => {
            let patcher = build_patcher(&config)?;
            println!("{}", patcher.web_root(platform).display());
            Ok(())
        }
    }
}

/// Config file values with the global flags layered on top.
fn load_config(cli: &Cli) -> Result<PatcherConfig> {
    let mut config = match &cli.config {
        Some(path) => load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PatcherConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(platforms) = &cli.platforms {
        config.platforms = Some(PlatformList::Delimited(platforms.clone()));
    }
    config.validate().context("Invalid options")?;
    Ok(config)
}

fn build_patcher(config: &PatcherConfig) -> Result<Patcher> {
    let patcher = Patcher::from_config(config)?;
    tracing::debug!(
        root = %patcher.root().display(),
        platforms = ?patcher.platforms(),
        "patcher ready"
    );
    Ok(patcher)
}

fn patch_options(
    mut options: PatchOptions,
    servers: &[String],
    index: Option<String>,
    force_load: bool,
) -> Result<PatchOptions> {
    for server in servers {
        options = match server.split_once('=') {
            Some((name, origin)) if !name.trim().is_empty() => {
                options.with_server(name.trim(), origin.trim())
            }
            Some(_) => anyhow::bail!("Invalid --server '{server}': expected NAME=ORIGIN"),
            None => options.without_server(server.trim()),
        };
    }
    if let Some(index) = index {
        options = options.with_index(index);
    }
    if force_load {
        options = options.with_force_load(true);
    }
    Ok(options)
}

fn print_report(report: &PatchReport) -> Result<()> {
    if report.is_empty() {
        println!("{}", "No matching files found".yellow());
        return Ok(());
    }

    for outcome in report.iter() {
        match &outcome.status {
            PatchStatus::Applied | PatchStatus::Unchanged => println!("{} {}", "✓".green(), outcome),
            PatchStatus::Skipped { .. } => println!("{} {}", "⊘".cyan(), outcome),
            PatchStatus::Failed { .. } => eprintln!("{} {}", "✗".red(), outcome),
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} patched", report.applied().to_string().green());
    println!("  {} already patched", report.unchanged().to_string().yellow());
    println!("  {} skipped", report.skipped().to_string().cyan());
    println!("  {} failed", report.failed().to_string().red());

    if report.failed() > 0 {
        std::process::exit(1);
    }
    Ok(())
}
