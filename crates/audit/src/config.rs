//! Audit configuration
//!
//! Typed equivalent of the Lighthouse CI rc file: how to bring the site up,
//! which URLs to sample how often, the assertion rules the median scores are
//! held to, and where reports go. Every default matches the values the site
//! has shipped with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AuditError, AuditResult};

/// Complete audit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// How measurements are collected
    pub collect: CollectConfig,

    /// Assertion rules applied to the aggregated measurements
    pub assert: AssertConfig,

    /// Where reports are persisted
    pub upload: UploadConfig,
}

/// Collection phase configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Shell command that serves the built site
    pub start_server_command: String,

    /// Server output line that signals readiness (regex)
    pub ready_pattern: String,

    /// How long to wait for the ready pattern
    pub ready_timeout_ms: u64,

    /// URLs to audit
    pub urls: Vec<String>,

    /// Lighthouse runs per URL; scores are aggregated by median
    pub number_of_runs: u32,

    /// Emulation preset
    pub preset: AuditPreset,

    /// Categories to collect; empty means all
    pub only_categories: Vec<AuditCategory>,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            start_server_command: "npm run preview".to_string(),
            ready_pattern: "Accepting connections".to_string(),
            ready_timeout_ms: 30_000,
            urls: vec!["http://localhost:8000/".to_string()],
            number_of_runs: 3,
            preset: AuditPreset::Desktop,
            only_categories: vec![
                AuditCategory::Performance,
                AuditCategory::Accessibility,
                AuditCategory::BestPractices,
                AuditCategory::Seo,
            ],
        }
    }
}

impl CollectConfig {
    /// The server lifecycle this collect phase implies.
    pub fn server_config(&self) -> siteqa_harness::ServerConfig {
        siteqa_harness::ServerConfig {
            command: self.start_server_command.clone(),
            workdir: None,
            ready_pattern: Some(self.ready_pattern.clone()),
            ready_timeout: Duration::from_millis(self.ready_timeout_ms),
            base_url: self
                .urls
                .first()
                .cloned()
                .unwrap_or_else(|| "http://localhost:8000/".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditPreset {
    /// Desktop emulation (`--preset=desktop`)
    Desktop,
    /// Lighthouse's default mobile emulation
    Mobile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditCategory {
    Performance,
    Accessibility,
    BestPractices,
    Seo,
}

impl AuditCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCategory::Performance => "performance",
            AuditCategory::Accessibility => "accessibility",
            AuditCategory::BestPractices => "best-practices",
            AuditCategory::Seo => "seo",
        }
    }
}

/// Assertion phase configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssertConfig {
    /// Rules keyed by metric: `categories:<id>` addresses a category score,
    /// anything else a Lighthouse audit's numeric value
    pub assertions: BTreeMap<String, AssertionRule>,
}

impl Default for AssertConfig {
    fn default() -> Self {
        let mut assertions = BTreeMap::new();

        // Category scores are gating: a regression here blocks the build
        for category in ["performance", "accessibility", "best-practices", "seo"] {
            assertions.insert(
                format!("categories:{}", category),
                AssertionRule {
                    severity: Severity::Error,
                    bound: Bound::MinScore(0.9),
                },
            );
        }

        // Timing metrics are advisory, in milliseconds
        for (audit, max) in [
            ("first-contentful-paint", 2000.0),
            ("largest-contentful-paint", 2500.0),
            ("speed-index", 3000.0),
            ("interactive", 3500.0),
        ] {
            assertions.insert(
                audit.to_string(),
                AssertionRule {
                    severity: Severity::Warn,
                    bound: Bound::MaxNumericValue(max),
                },
            );
        }

        // CLS is unitless
        assertions.insert(
            "cumulative-layout-shift".to_string(),
            AssertionRule {
                severity: Severity::Warn,
                bound: Bound::MaxNumericValue(0.1),
            },
        );

        Self { assertions }
    }
}

/// One assertion rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssertionRule {
    pub severity: Severity,
    pub bound: Bound,
}

/// Error-severity failures gate CI; warnings are logged and move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// Score fraction the metric must reach, in `[0, 1]`
    MinScore(f64),

    /// Numeric ceiling the metric must stay under (ms for timings)
    MaxNumericValue(f64),
}

/// Upload phase configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub target: UploadTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadTarget {
    /// Accepted for parity with hosted CI; reports land in the default
    /// results directory
    #[default]
    TemporaryPublicStorage,

    /// Write report JSON under a chosen directory
    Filesystem { output_dir: PathBuf },

    Disabled,
}

impl AuditConfig {
    /// Load configuration from a TOML file, defaulting when absent.
    pub fn load(path: &std::path::Path) -> AuditResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject configurations that cannot produce a meaningful audit.
    pub fn validate(&self) -> AuditResult<()> {
        if self.collect.urls.is_empty() {
            return Err(AuditError::Config("no urls to audit".to_string()));
        }
        if self.collect.number_of_runs < 1 {
            return Err(AuditError::Config(
                "number_of_runs must be at least 1".to_string(),
            ));
        }
        if self.collect.ready_timeout_ms == 0 {
            return Err(AuditError::Config(
                "ready_timeout_ms must be positive".to_string(),
            ));
        }

        for (key, rule) in &self.assert.assertions {
            match rule.bound {
                Bound::MinScore(score) => {
                    if !(0.0..=1.0).contains(&score) {
                        return Err(AuditError::Config(format!(
                            "{}: min_score {} outside [0, 1]",
                            key, score
                        )));
                    }
                }
                Bound::MaxNumericValue(max) => {
                    if !max.is_finite() || max < 0.0 {
                        return Err(AuditError::Config(format!(
                            "{}: max_numeric_value {} must be finite and non-negative",
                            key, max
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
