//! Audit orchestration
//!
//! Brings the site up, samples every configured URL with Lighthouse, takes
//! the median per metric, evaluates the assertion rules and persists the
//! summary. A server that never becomes ready aborts the whole audit; a
//! failed error-severity assertion fails it after all URLs are measured.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use siteqa_harness::SiteServer;

use crate::assertions::{self, AssertionOutcome};
use crate::config::{AssertConfig, AuditConfig, UploadTarget};
use crate::error::{AuditError, AuditResult};
use crate::lighthouse::LighthouseRunner;
use crate::report::{LighthouseReport, MedianReport};

/// Where reports land when no explicit output directory is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "qa-results/audit";

/// Evaluated audit of one URL.
#[derive(Debug, Clone, Serialize)]
pub struct UrlSummary {
    pub url: String,
    pub runs: usize,
    pub outcomes: Vec<AssertionOutcome>,
    /// Error-severity failures
    pub failures: usize,
    /// Warn-severity failures
    pub warnings: usize,
}

/// Evaluated audit of the whole run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    pub generated_at: DateTime<Utc>,
    pub urls: Vec<UrlSummary>,
}

impl AuditSummary {
    /// Warnings never fail an audit; error-severity failures always do.
    pub fn passed(&self) -> bool {
        self.urls.iter().all(|u| u.failures == 0)
    }
}

pub struct AuditRunner {
    config: AuditConfig,
}

impl AuditRunner {
    /// Validates the configuration up front.
    pub fn new(config: AuditConfig) -> AuditResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the full audit: collect, aggregate, assert, persist.
    pub async fn run(&self) -> AuditResult<AuditSummary> {
        let lighthouse = LighthouseRunner::new(&self.config.collect)?;

        let server = SiteServer::start(&self.config.collect.server_config()).await?;
        let collected = self.collect(&lighthouse).await;
        server.stop().await;
        let per_url = collected?;

        let urls = per_url
            .iter()
            .map(|(url, reports)| summarize_url(url, reports, &self.config.assert))
            .collect();
        let summary = AuditSummary {
            generated_at: Utc::now(),
            urls,
        };

        for url in &summary.urls {
            for outcome in url.outcomes.iter().filter(|o| !o.passed) {
                match outcome.severity {
                    crate::config::Severity::Error => {
                        error!(url = %url.url, key = %outcome.key, "{}", outcome.message)
                    }
                    crate::config::Severity::Warn => {
                        warn!(url = %url.url, key = %outcome.key, "{}", outcome.message)
                    }
                }
            }
        }

        self.persist(&summary)?;

        info!(
            urls = summary.urls.len(),
            passed = summary.passed(),
            "audit finished"
        );
        Ok(summary)
    }

    /// Sample every URL `number_of_runs` times.
    async fn collect(
        &self,
        lighthouse: &LighthouseRunner,
    ) -> AuditResult<Vec<(String, Vec<LighthouseReport>)>> {
        let total = self.config.collect.number_of_runs;
        let mut per_url = Vec::new();

        for url in &self.config.collect.urls {
            let mut reports = Vec::new();
            for run in 1..=total {
                info!(url = %url, run, total, "collecting");
                reports.push(lighthouse.run_once(url).await?);
            }
            if reports.is_empty() {
                return Err(AuditError::NoReports(url.clone()));
            }
            per_url.push((url.clone(), reports));
        }

        Ok(per_url)
    }

    /// Persist per the upload target.
    fn persist(&self, summary: &AuditSummary) -> AuditResult<()> {
        match &self.config.upload.target {
            UploadTarget::Disabled => {
                info!("report upload disabled");
                Ok(())
            }
            UploadTarget::Filesystem { output_dir } => self.write_reports(output_dir, summary),
            UploadTarget::TemporaryPublicStorage => {
                // No hosted storage in this setup; keep the reports local
                info!(dir = DEFAULT_OUTPUT_DIR, "writing reports locally");
                self.write_reports(Path::new(DEFAULT_OUTPUT_DIR), summary)
            }
        }
    }

    fn write_reports(&self, dir: &Path, summary: &AuditSummary) -> AuditResult<()> {
        std::fs::create_dir_all(dir)?;
        for (i, url) in summary.urls.iter().enumerate() {
            let path = dir.join(format!("audit-{}.json", i + 1));
            std::fs::write(&path, serde_json::to_string_pretty(url)?)?;
            info!(url = %url.url, path = %path.display(), "report written");
        }
        Ok(())
    }
}

/// Aggregate one URL's sampled reports and evaluate the rules against the
/// medians.
fn summarize_url(url: &str, reports: &[LighthouseReport], assert: &AssertConfig) -> UrlSummary {
    let keys: Vec<&str> = assert.assertions.keys().map(|k| k.as_str()).collect();
    let median = MedianReport::aggregate(url, reports, keys);
    let outcomes = assertions::evaluate_assertions(assert, &median);
    let failures = assertions::failures(&outcomes).len();
    let warnings = assertions::warnings(&outcomes).len();

    UrlSummary {
        url: url.to_string(),
        runs: reports.len(),
        outcomes,
        failures,
        warnings,
    }
}
