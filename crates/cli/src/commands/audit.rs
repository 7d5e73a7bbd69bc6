//! `siteqa audit` - run the Lighthouse audit

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use siteqa_audit::config::{AuditConfig, Bound, Severity, UploadTarget};
use siteqa_audit::runner::{AuditRunner, AuditSummary};

use crate::output::{print_error, print_list, print_success, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct AuditArgs {
    /// Audit configuration file (defaults apply when absent)
    #[arg(long, default_value = "audit.toml")]
    pub config: PathBuf,

    /// Write report JSON here instead of the configured upload target
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// One assertion outcome flattened for display.
#[derive(Serialize)]
struct AssertionRow {
    url: String,
    metric: String,
    severity: String,
    bound: String,
    observed: String,
    status: String,
}

impl TableDisplay for AssertionRow {
    fn headers() -> Vec<&'static str> {
        vec!["URL", "Metric", "Severity", "Bound", "Observed", "Status"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.url.clone(),
            self.metric.clone(),
            self.severity.clone(),
            self.bound.clone(),
            self.observed.clone(),
            self.status.clone(),
        ]
    }
}

fn assertion_rows(summary: &AuditSummary) -> Vec<AssertionRow> {
    let mut rows = Vec::new();
    for url in &summary.urls {
        for outcome in &url.outcomes {
            let severity = match outcome.severity {
                Severity::Error => "error",
                Severity::Warn => "warn",
            };
            let bound = match outcome.bound {
                Bound::MinScore(s) => format!(">= {}", s),
                Bound::MaxNumericValue(v) => format!("<= {}", v),
            };
            let observed = outcome
                .observed
                .map(|v| format!("{:.3}", v))
                .unwrap_or_else(|| "-".to_string());
            let status = if outcome.passed {
                "pass".green().to_string()
            } else {
                match outcome.severity {
                    Severity::Error => "fail".red().to_string(),
                    Severity::Warn => "warn".yellow().to_string(),
                }
            };
            rows.push(AssertionRow {
                url: url.url.clone(),
                metric: outcome.key.clone(),
                severity: severity.to_string(),
                bound,
                observed,
                status,
            });
        }
    }
    rows
}

/// Returns whether the audit passed (warnings never fail it).
pub async fn execute(args: AuditArgs, format: OutputFormat) -> Result<bool> {
    let mut config = AuditConfig::load(&args.config)?;
    if let Some(output_dir) = args.output {
        config.upload.target = UploadTarget::Filesystem { output_dir };
    }

    let runner = AuditRunner::new(config)?;
    let summary = runner.run().await?;

    print_list(&assertion_rows(&summary), format);

    let failures: usize = summary.urls.iter().map(|u| u.failures).sum();
    let warnings: usize = summary.urls.iter().map(|u| u.warnings).sum();
    if summary.passed() {
        print_success(&format!(
            "audit passed for {} URL(s), {} warning(s)",
            summary.urls.len(),
            warnings
        ));
    } else {
        print_error(&format!(
            "audit failed: {} error-severity assertion(s) violated",
            failures
        ));
    }

    Ok(summary.passed())
}
