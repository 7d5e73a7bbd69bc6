//! `siteqa baseline` - screenshot baseline management
//!
//! Baselines only ever change through this explicit path (or `test
//! --update-baselines`); normal test runs treat them as read-only.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use siteqa_harness::{VisualComparator, VisualConfig};

use crate::output::{print_list, print_success, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum BaselineCommands {
    /// List the baselines on disk
    List(BaselineDirArgs),

    /// Re-run the visual suite and accept its screenshots as new baselines
    Update(UpdateArgs),
}

#[derive(Args)]
pub struct BaselineDirArgs {
    /// Committed baseline screenshots
    #[arg(long, default_value = "baselines")]
    pub baseline_dir: PathBuf,

    /// Where results, screenshots and diff images land
    #[arg(long, default_value = "qa-results")]
    pub results_dir: PathBuf,
}

#[derive(Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub dirs: BaselineDirArgs,

    /// Only update baselines whose name contains this substring
    #[arg(long)]
    pub name: Option<String>,

    /// URL the site is served at
    #[arg(long, default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Target an already-running server instead of starting one
    #[arg(long)]
    pub no_server: bool,

    /// Shell command that starts the preview server
    #[arg(long, default_value = "npm run preview")]
    pub server_command: String,

    /// Site project root
    #[arg(long)]
    pub site_dir: Option<PathBuf>,
}

#[derive(Serialize)]
struct BaselineRow {
    name: String,
}

impl TableDisplay for BaselineRow {
    fn headers() -> Vec<&'static str> {
        vec!["Baseline"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone()]
    }
}

impl BaselineDirArgs {
    fn visual_config(&self, update_baselines: bool) -> VisualConfig {
        VisualConfig {
            baseline_dir: self.baseline_dir.clone(),
            actual_dir: self.results_dir.join("screenshots"),
            diff_dir: self.results_dir.join("diffs"),
            update_baselines,
        }
    }
}

pub async fn execute(cmd: BaselineCommands, format: OutputFormat) -> Result<bool> {
    match cmd {
        BaselineCommands::List(args) => {
            let comparator = VisualComparator::new(args.visual_config(false))?;
            let rows: Vec<BaselineRow> = comparator
                .list_baselines()?
                .into_iter()
                .map(|name| BaselineRow { name })
                .collect();
            print_list(&rows, format);
            Ok(true)
        }
        BaselineCommands::Update(args) => update(args, format).await,
    }
}

/// Runs the visual suite with baseline updating on: drifted or missing
/// baselines are replaced by this run's captures, so the run itself always
/// passes unless the browser fails outright.
async fn update(args: UpdateArgs, format: OutputFormat) -> Result<bool> {
    let test_args = crate::commands::test::TestArgs {
        suite: crate::commands::test::Suite::Visual,
        tag: None,
        name: args.name,
        specs: None,
        update_baselines: true,
        base_url: args.base_url,
        no_server: args.no_server,
        server_command: args.server_command,
        site_dir: args.site_dir,
        baseline_dir: args.dirs.baseline_dir.clone(),
        results_dir: args.dirs.results_dir,
    };

    let passed = crate::commands::test::execute(test_args, format).await?;
    if passed {
        print_success(&format!(
            "baselines under {} refreshed",
            args.dirs.baseline_dir.display()
        ));
    }
    Ok(passed)
}
