//! Error types for the audit layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Invalid audit config: {0}")]
    Config(String),

    #[error("Lighthouse not found. Install with: npm install -g lighthouse")]
    LighthouseNotFound,

    #[error("Lighthouse failed for {url}: {reason}")]
    Lighthouse { url: String, reason: String },

    #[error("No reports collected for {0}")]
    NoReports(String),

    #[error("Server error: {0}")]
    Server(#[from] siteqa_harness::HarnessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type AuditResult<T> = Result<T, AuditError>;
