//! Error types for the QA harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Server not ready: pattern {pattern:?} not seen within {timeout_ms}ms")]
    ServerReadyTimeout { pattern: String, timeout_ms: u64 },

    #[error("Server health check failed after {0} attempts")]
    ServerHealthCheck(usize),

    #[error("Invalid ready pattern: {0}")]
    ReadyPattern(#[from] regex::Error),

    #[error("Playwright not found. Install with: npm install playwright axe-core")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Accessibility violations in {scope}: {count} rule(s) violated")]
    AccessibilityViolations { scope: String, count: usize },

    #[error("Screenshot mismatch: {name} has {diff_pixels} differing pixels (max allowed: {max_diff_pixels})")]
    ScreenshotMismatch {
        name: String,
        diff_pixels: u64,
        max_diff_pixels: u32,
    },

    #[error("Baseline not found: {0}")]
    BaselineNotFound(String),

    #[error("Visual comparison failed: {0}")]
    Visual(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
