//! siteqa - QA front end for the marketing site
//!
//! Runs the accessibility and visual-regression suites through a headless
//! browser, runs the Lighthouse audit, and manages screenshot baselines.

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{audit, baseline, spec, test};

/// QA harness for the marketing site
#[derive(Parser)]
#[command(name = "siteqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run browser test suites
    Test(test::TestArgs),

    /// Run the Lighthouse audit
    Audit(audit::AuditArgs),

    /// Manage screenshot baselines
    #[command(subcommand)]
    Baseline(baseline::BaselineCommands),

    /// Inspect test specs
    #[command(subcommand)]
    Spec(spec::SpecCommands),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let passed = match cli.command {
        Commands::Test(args) => test::execute(args, cli.format).await?,
        Commands::Audit(args) => audit::execute(args, cli.format).await?,
        Commands::Baseline(cmd) => baseline::execute(cmd, cli.format).await?,
        Commands::Spec(cmd) => spec::execute(cmd, cli.format)?,
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}
