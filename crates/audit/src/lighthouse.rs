//! Lighthouse CLI driver
//!
//! One `npx lighthouse` invocation per measurement, JSON report on stdout.
//! No retry logic here: sampling noise is handled by running N times and
//! taking the median upstream.

use std::process::Stdio;
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::config::{AuditCategory, AuditPreset, CollectConfig};
use crate::error::{AuditError, AuditResult};
use crate::report::LighthouseReport;

pub struct LighthouseRunner {
    preset: AuditPreset,
    only_categories: Vec<AuditCategory>,
}

impl LighthouseRunner {
    pub fn new(collect: &CollectConfig) -> AuditResult<Self> {
        Self::check_installed()?;
        Ok(Self {
            preset: collect.preset,
            only_categories: collect.only_categories.clone(),
        })
    }

    /// Check that the Lighthouse CLI is available.
    fn check_installed() -> AuditResult<()> {
        let output = std::process::Command::new("npx")
            .args(["lighthouse", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(AuditError::LighthouseNotFound),
        }
    }

    /// Take one measurement of `url`.
    pub async fn run_once(&self, url: &str) -> AuditResult<LighthouseReport> {
        let args = self.build_args(url);
        debug!(url, "running lighthouse");

        let output = TokioCommand::new("npx").args(&args).output().await?;

        if !output.status.success() {
            return Err(AuditError::Lighthouse {
                url: url.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let report: LighthouseReport = serde_json::from_slice(&output.stdout)?;
        Ok(report)
    }

    fn build_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "lighthouse".to_string(),
            url.to_string(),
            "--output=json".to_string(),
            "--output-path=stdout".to_string(),
            "--quiet".to_string(),
            "--chrome-flags=--headless".to_string(),
        ];

        if !self.only_categories.is_empty() {
            let joined = self
                .only_categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(",");
            args.push(format!("--only-categories={}", joined));
        }

        // Mobile emulation is Lighthouse's default and takes no flag
        if self.preset == AuditPreset::Desktop {
            args.push("--preset=desktop".to_string());
        }

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(preset: AuditPreset, categories: Vec<AuditCategory>) -> LighthouseRunner {
        LighthouseRunner {
            preset,
            only_categories: categories,
        }
    }

    #[test]
    fn test_default_args() {
        let collect = CollectConfig::default();
        let runner = runner(collect.preset, collect.only_categories);
        let args = runner.build_args("http://localhost:8000/");

        assert_eq!(args[0], "lighthouse");
        assert_eq!(args[1], "http://localhost:8000/");
        assert!(args.contains(&"--output=json".to_string()));
        assert!(args.contains(&"--output-path=stdout".to_string()));
        assert!(args
            .contains(&"--only-categories=performance,accessibility,best-practices,seo".to_string()));
        assert!(args.contains(&"--preset=desktop".to_string()));
    }

    #[test]
    fn test_mobile_preset_omits_flag() {
        let runner = runner(AuditPreset::Mobile, vec![]);
        let args = runner.build_args("http://localhost:8000/");
        assert!(!args.iter().any(|a| a.starts_with("--preset")));
        assert!(!args.iter().any(|a| a.starts_with("--only-categories")));
    }
}
