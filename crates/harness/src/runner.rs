//! Suite orchestration
//!
//! Starts the site server, runs every spec through the browser driver,
//! interprets the event stream, compares captured screenshots against their
//! baselines and aggregates the outcomes. Tests are independent: one failure
//! never stops the rest of the suite. Within a test, steps are sequential
//! and the first failing step ends it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::axe::{AxeResults, AxeViolation};
use crate::browser::{BrowserConfig, BrowserDriver, BrowserEvent};
use crate::error::{HarnessError, HarnessResult};
use crate::server::{ServerConfig, SiteServer};
use crate::spec::TestSpec;
use crate::visual::{VisualComparator, VisualConfig, VisualDiff};

/// Everything a suite run needs.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Server to start for the run; `None` targets an already-running one
    pub server: Option<ServerConfig>,
    pub browser: BrowserConfig,
    pub visual: VisualConfig,
    /// Where the suite result JSON lands
    pub results_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            server: Some(ServerConfig::default()),
            browser: BrowserConfig::default(),
            visual: VisualConfig::default(),
            results_dir: PathBuf::from("qa-results"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed,
    /// Precondition not met; never counts as a failure
    Skipped,
}

/// Outcome of one spec.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    pub outcome: TestOutcome,
    pub duration_ms: u64,
    /// Steps that ran to completion
    pub steps_completed: usize,
    pub visual_diffs: Vec<VisualDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a whole suite run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteResult {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl SuiteResult {
    fn new(results: Vec<TestResult>, duration_ms: u64) -> Self {
        let count = |o: TestOutcome| results.iter().filter(|r| r.outcome == o).count();
        Self {
            generated_at: Utc::now(),
            total: results.len(),
            passed: count(TestOutcome::Passed),
            failed: count(TestOutcome::Failed),
            skipped: count(TestOutcome::Skipped),
            duration_ms,
            results,
        }
    }

    /// Skips do not fail a run.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

pub struct SuiteRunner {
    config: RunnerConfig,
    browser: BrowserDriver,
    visual: VisualComparator,
}

impl SuiteRunner {
    pub fn new(config: RunnerConfig) -> HarnessResult<Self> {
        let browser = BrowserDriver::new(config.browser.clone())?;
        let visual = VisualComparator::new(config.visual.clone())?;
        Ok(Self {
            config,
            browser,
            visual,
        })
    }

    /// Run every spec and aggregate. A server that never comes up is fatal
    /// for the whole run; individual test failures are not.
    pub async fn run(&self, specs: &[TestSpec]) -> HarnessResult<SuiteResult> {
        let start = Instant::now();

        let server = match &self.config.server {
            Some(cfg) => Some(SiteServer::start(cfg).await?),
            None => None,
        };

        let mut results = Vec::with_capacity(specs.len());
        for spec in specs {
            let result = self.run_one(spec).await;
            match result.outcome {
                TestOutcome::Passed => info!(test = %result.name, "passed"),
                TestOutcome::Skipped => info!(test = %result.name, "skipped"),
                TestOutcome::Failed => {
                    error!(test = %result.name, error = result.error.as_deref().unwrap_or(""), "failed")
                }
            }
            results.push(result);
        }

        if let Some(server) = server {
            server.stop().await;
        }

        let suite = SuiteResult::new(results, start.elapsed().as_millis() as u64);
        info!(
            total = suite.total,
            passed = suite.passed,
            failed = suite.failed,
            skipped = suite.skipped,
            "suite finished"
        );
        Ok(suite)
    }

    /// Run a single spec to a [`TestResult`]. Never returns `Err`: driver
    /// failures become failed results so the rest of the suite still runs.
    pub async fn run_one(&self, spec: &TestSpec) -> TestResult {
        let start = Instant::now();
        info!(test = %spec.name, "running");

        let events = match self.browser.run(spec).await {
            Ok(events) => events,
            Err(e) => {
                return TestResult {
                    name: spec.name.clone(),
                    outcome: TestOutcome::Failed,
                    duration_ms: start.elapsed().as_millis() as u64,
                    steps_completed: 0,
                    visual_diffs: vec![],
                    error: Some(e.to_string()),
                }
            }
        };

        let summary = summarize_events(&events);

        if let Some(selector) = &summary.skipped_on {
            debug!(test = %spec.name, selector, "precondition not met");
            return TestResult {
                name: spec.name.clone(),
                outcome: TestOutcome::Skipped,
                duration_ms: start.elapsed().as_millis() as u64,
                steps_completed: summary.steps_completed,
                visual_diffs: vec![],
                error: None,
            };
        }

        let mut failures = Vec::new();

        if let Some((step, reason)) = &summary.step_error {
            failures.push(
                HarnessError::StepFailed {
                    step: step.clone(),
                    reason: reason.clone(),
                }
                .to_string(),
            );
        }

        for (scope, violations) in &summary.axe_failures {
            failures.push(
                HarnessError::AccessibilityViolations {
                    scope: scope.clone(),
                    count: violations.len(),
                }
                .to_string(),
            );
            let results = AxeResults {
                violations: violations.clone(),
            };
            for line in results.summarize() {
                failures.push(format!("  {}", line));
            }
        }

        let visual_diffs = self.compare_screenshots(spec, &summary.screenshots, &mut failures);

        let outcome = if failures.is_empty() {
            TestOutcome::Passed
        } else {
            TestOutcome::Failed
        };

        TestResult {
            name: spec.name.clone(),
            outcome,
            duration_ms: start.elapsed().as_millis() as u64,
            steps_completed: summary.steps_completed,
            visual_diffs,
            error: if failures.is_empty() {
                None
            } else {
                Some(failures.join("\n"))
            },
        }
    }

    /// Compare every screenshot the run captured against its baseline.
    fn compare_screenshots(
        &self,
        spec: &TestSpec,
        captured: &[String],
        failures: &mut Vec<String>,
    ) -> Vec<VisualDiff> {
        let budgets: HashMap<String, u32> = spec.screenshots().into_iter().collect();
        let mut diffs = Vec::new();

        for name in captured {
            let budget = budgets.get(name).copied().unwrap_or(spec.max_diff_pixels);
            match self.visual.compare(name, budget) {
                Ok(diff) => {
                    if !diff.matches {
                        failures.push(
                            HarnessError::ScreenshotMismatch {
                                name: name.clone(),
                                diff_pixels: diff.diff_pixels,
                                max_diff_pixels: budget,
                            }
                            .to_string(),
                        );
                    }
                    diffs.push(diff);
                }
                Err(e) => {
                    warn!(name, "comparison failed: {}", e);
                    failures.push(e.to_string());
                }
            }
        }

        diffs
    }

    /// Persist the suite result JSON under the results directory.
    pub fn write_results(&self, suite: &SuiteResult) -> HarnessResult<PathBuf> {
        std::fs::create_dir_all(&self.config.results_dir)?;
        let path = self.config.results_dir.join("results.json");
        let json = serde_json::to_string_pretty(suite)?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), "results written");
        Ok(path)
    }
}

/// What a finished browser run amounted to, before visual comparison.
#[derive(Debug, Default)]
struct RunSummary {
    steps_completed: usize,
    skipped_on: Option<String>,
    axe_failures: Vec<(String, Vec<AxeViolation>)>,
    screenshots: Vec<String>,
    step_error: Option<(String, String)>,
}

fn summarize_events(events: &[BrowserEvent]) -> RunSummary {
    let mut summary = RunSummary::default();

    for event in events {
        match event {
            BrowserEvent::StepDone { .. } => summary.steps_completed += 1,
            BrowserEvent::Skipped { selector } => {
                summary.skipped_on = Some(selector.clone());
            }
            BrowserEvent::AxeResults { scope, violations } => {
                if !violations.is_empty() {
                    summary
                        .axe_failures
                        .push((scope.clone(), violations.clone()));
                }
            }
            BrowserEvent::ScreenshotTaken { name, .. } => {
                summary.screenshots.push(name.clone());
            }
            BrowserEvent::TestError { label, message } => {
                summary.step_error = Some((label.clone(), message.clone()));
            }
            BrowserEvent::Done => {}
        }
    }

    summary
}
