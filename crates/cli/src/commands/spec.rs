//! `siteqa spec` - inspect test specs

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use siteqa_harness::{suites, TestSpec};

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum SpecCommands {
    /// List built-in and discovered specs
    List(ListArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Directory of additional YAML spec files
    #[arg(long)]
    pub specs: Option<PathBuf>,
}

#[derive(Serialize)]
struct SpecRow {
    name: String,
    tags: String,
    viewport: String,
    steps: usize,
    screenshots: usize,
}

impl TableDisplay for SpecRow {
    fn headers() -> Vec<&'static str> {
        vec!["Spec", "Tags", "Viewport", "Steps", "Screenshots"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.tags.clone(),
            self.viewport.clone(),
            self.steps.to_string(),
            self.screenshots.to_string(),
        ]
    }
}

fn spec_row(spec: &TestSpec) -> SpecRow {
    SpecRow {
        name: spec.name.clone(),
        tags: spec.tags.join(", "),
        viewport: spec
            .viewport
            .map(|v| format!("{}x{}", v.width, v.height))
            .unwrap_or_else(|| "default".to_string()),
        steps: spec.steps.len(),
        screenshots: spec.screenshots().len(),
    }
}

pub fn execute(cmd: SpecCommands, format: OutputFormat) -> Result<bool> {
    match cmd {
        SpecCommands::List(args) => {
            let mut specs = suites::all();
            if let Some(dir) = &args.specs {
                specs.extend(TestSpec::load_all(dir)?);
            }
            let rows: Vec<SpecRow> = specs.iter().map(spec_row).collect();
            print_list(&rows, format);
            Ok(true)
        }
    }
}
