//! axe-core scan options and results
//!
//! Typed view of what an axe-core run returns, plus the option set we hand
//! to the in-page scanner. A scan passes only when its violations array is
//! empty; incomplete and inapplicable results never fail a test.

use serde::{Deserialize, Serialize};

/// WCAG 2.0/2.1 level A and AA, the bar the whole site is held to.
pub const WCAG_AA_TAGS: &[&str] = &["wcag2a", "wcag2aa", "wcag21a", "wcag21aa"];

/// WCAG 2.0 A/AA only, for scoped scans of individual regions.
pub const WCAG_CORE_TAGS: &[&str] = &["wcag2a", "wcag2aa"];

/// Rules checked on every page regardless of tag selection.
pub const IMAGE_ALT_RULE: &str = "image-alt";
pub const COLOR_CONTRAST_RULE: &str = "color-contrast";
pub const LANDMARK_RULES: &[&str] = &["landmark-one-main", "page-has-heading-one", "region"];

/// What the scanner should run. Mirrors axe's `runOnly` semantics: a rule
/// list takes precedence over a tag list, and an empty option set means the
/// full default rule set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AxeOptions {
    /// CSS selector scoping the scan to part of the page
    pub include: Option<String>,
    /// Tag filter (e.g. "wcag2aa")
    pub tags: Vec<String>,
    /// Explicit rule filter (e.g. "image-alt"), overrides `tags`
    pub rules: Vec<String>,
}

impl AxeOptions {
    /// The axe `runOnly` object for these options, or `None` for a full run.
    pub fn run_only(&self) -> Option<serde_json::Value> {
        if !self.rules.is_empty() {
            Some(serde_json::json!({
                "type": "rule",
                "values": self.rules,
            }))
        } else if !self.tags.is_empty() {
            Some(serde_json::json!({
                "type": "tag",
                "values": self.tags,
            }))
        } else {
            None
        }
    }
}

/// One rule that failed, with every element it failed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxeViolation {
    /// Rule id, e.g. "color-contrast"
    pub id: String,
    /// Severity: "minor", "moderate", "serious" or "critical"
    #[serde(default)]
    pub impact: Option<String>,
    /// What the rule checks
    #[serde(default)]
    pub description: String,
    /// Short remediation hint
    #[serde(default)]
    pub help: String,
    /// Link to the full rule documentation
    #[serde(default, rename = "helpUrl")]
    pub help_url: String,
    /// Tags the rule belongs to
    #[serde(default)]
    pub tags: Vec<String>,
    /// Offending elements
    #[serde(default)]
    pub nodes: Vec<AxeNode>,
}

/// An element a rule failed on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxeNode {
    /// Selector path to the element
    #[serde(default)]
    pub target: Vec<String>,
    /// Outer HTML snippet of the element
    #[serde(default)]
    pub html: String,
}

/// Result of one axe scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxeResults {
    #[serde(default)]
    pub violations: Vec<AxeViolation>,
}

impl AxeResults {
    /// The only passing state is zero violations.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// One line per violated rule, for test failure messages.
    pub fn summarize(&self) -> Vec<String> {
        self.violations
            .iter()
            .map(|v| {
                format!(
                    "{} [{}]: {} ({} node(s))",
                    v.id,
                    v.impact.as_deref().unwrap_or("unknown"),
                    v.help,
                    v.nodes.len()
                )
            })
            .collect()
    }
}
