//! Declarative test specifications
//!
//! A [`TestSpec`] is an ordered list of browser steps plus the viewport it
//! runs under and the screenshot tolerance that applies to it. Specs are
//! built in Rust for the two shipped suites and can also be written as YAML
//! files and discovered from a directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HarnessError, HarnessResult};

/// Differing-pixel budget applied when neither the spec nor the step sets one.
pub const DEFAULT_MAX_DIFF_PIXELS: u32 = 100;

/// A complete test: one browser session executing `steps` in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport the browser context starts with (runner default when absent)
    #[serde(default)]
    pub viewport: Option<Viewport>,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,

    /// Screenshot tolerance for steps that do not set their own
    #[serde(default = "default_max_diff_pixels")]
    pub max_diff_pixels: u32,
}

fn default_max_diff_pixels() -> u32 {
    DEFAULT_MAX_DIFF_PIXELS
}

/// Viewport size in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// iPhone SE, the most common mobile size the site is used at.
    pub const MOBILE: Viewport = Viewport { width: 375, height: 667 };

    /// iPad portrait.
    pub const TABLET: Viewport = Viewport { width: 768, height: 1024 };

    /// Desktop FHD.
    pub const DESKTOP: Viewport = Viewport { width: 1920, height: 1080 };
}

/// A single step in a test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a path relative to the base URL
    Navigate { url: String },

    /// Resize the page mid-test (breakpoint scenarios)
    SetViewport { width: u32, height: u32 },

    /// Wait for the first match of `selector` to become visible
    WaitVisible {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Wait for the first match of `selector` to be hidden or absent
    WaitHidden {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Scroll the first match of `selector` into view if it is not already
    ScrollIntoView { selector: String },

    /// Press a key (e.g. "Tab" for keyboard-navigation checks)
    Press { key: String },

    /// Skip the whole test (not fail it) when `selector` matches nothing.
    /// Used for optional page content such as forms.
    SkipUnless { selector: String },

    /// Run an axe-core accessibility scan and fail on any violation.
    /// `rules` takes precedence over `tags` when both are set; with neither,
    /// the full default rule set runs. `include` scopes the scan to a region.
    AxeCheck {
        #[serde(default)]
        include: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        rules: Vec<String>,
    },

    /// Capture a screenshot of the first match of `selector` (the viewport
    /// when absent) and compare it against the baseline named `name`
    Screenshot {
        name: String,
        #[serde(default)]
        selector: Option<String>,
        #[serde(default)]
        max_diff_pixels: Option<u32>,
    },
}

fn default_wait_timeout() -> u64 {
    5000
}

impl TestStep {
    /// Short label used in logs and step reports.
    pub fn label(&self) -> String {
        match self {
            TestStep::Navigate { url } => format!("navigate:{}", url),
            TestStep::SetViewport { width, height } => format!("viewport:{}x{}", width, height),
            TestStep::WaitVisible { selector, .. } => format!("wait-visible:{}", selector),
            TestStep::WaitHidden { selector, .. } => format!("wait-hidden:{}", selector),
            TestStep::ScrollIntoView { selector } => format!("scroll:{}", selector),
            TestStep::Press { key } => format!("press:{}", key),
            TestStep::SkipUnless { selector } => format!("skip-unless:{}", selector),
            TestStep::AxeCheck { include, .. } => format!(
                "axe:{}",
                include.as_deref().unwrap_or("document")
            ),
            TestStep::Screenshot { name, .. } => format!("screenshot:{}", name),
        }
    }
}

impl TestSpec {
    /// Parse a test spec from a YAML string.
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        serde_yaml::from_str(yaml).map_err(HarnessError::from)
    }

    /// Parse a test spec from a YAML file.
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all test specs from a directory (recursively, `.yaml`/`.yml`).
    pub fn load_all(dir: &Path) -> HarnessResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let spec = Self::from_file(entry.path())?;
            specs.push(spec);
        }

        Ok(specs)
    }

    /// Filter specs by tag.
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs
            .iter()
            .filter(|s| s.tags.contains(&tag.to_string()))
            .collect()
    }

    /// Screenshot names this spec captures, with the tolerance that applies
    /// to each (per-step override, else the spec default).
    pub fn screenshots(&self) -> Vec<(String, u32)> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                TestStep::Screenshot {
                    name,
                    max_diff_pixels,
                    ..
                } => Some((name.clone(), max_diff_pixels.unwrap_or(self.max_diff_pixels))),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_spec() {
        let yaml = r#"
name: hero-mobile
description: Hero section renders correctly on mobile
tags:
  - visual
viewport:
  width: 375
  height: 667
steps:
  - action: navigate
    url: /
  - action: wait_visible
    selector: section
  - action: screenshot
    name: hero-mobile
    selector: section
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "hero-mobile");
        assert_eq!(spec.steps.len(), 3);
        assert_eq!(spec.viewport, Some(Viewport::MOBILE));
        assert_eq!(spec.max_diff_pixels, DEFAULT_MAX_DIFF_PIXELS);
    }

    #[test]
    fn test_parse_axe_spec() {
        let yaml = r#"
name: homepage-wcag
tags: [a11y]
steps:
  - action: navigate
    url: /
  - action: axe_check
    tags: [wcag2a, wcag2aa]
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        match &spec.steps[1] {
            TestStep::AxeCheck {
                include,
                tags,
                rules,
            } => {
                assert!(include.is_none());
                assert_eq!(tags, &["wcag2a", "wcag2aa"]);
                assert!(rules.is_empty());
            }
            other => panic!("expected axe_check, got {:?}", other),
        }
    }

    #[test]
    fn test_skip_unless_parses() {
        let yaml = r#"
name: forms-labels
steps:
  - action: navigate
    url: /
  - action: skip_unless
    selector: form
  - action: axe_check
    include: form
    tags: [wcag2a, wcag2aa]
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert!(matches!(
            spec.steps[1],
            TestStep::SkipUnless { ref selector } if selector == "form"
        ));
    }

    #[test]
    fn test_screenshot_tolerances() {
        let spec = TestSpec {
            name: "breakpoints".into(),
            description: String::new(),
            tags: vec![],
            viewport: None,
            steps: vec![
                TestStep::Screenshot {
                    name: "nav-desktop".into(),
                    selector: Some(".desktop-nav".into()),
                    max_diff_pixels: Some(20),
                },
                TestStep::Screenshot {
                    name: "programs-grid-768px".into(),
                    selector: Some(".programs-grid".into()),
                    max_diff_pixels: None,
                },
            ],
            max_diff_pixels: 100,
        };

        let shots = spec.screenshots();
        assert_eq!(shots[0], ("nav-desktop".to_string(), 20));
        assert_eq!(shots[1], ("programs-grid-768px".to_string(), 100));
    }

    #[test]
    fn test_filter_by_tag() {
        let a = TestSpec::from_yaml("name: a\ntags: [a11y]\nsteps: []").unwrap();
        let b = TestSpec::from_yaml("name: b\ntags: [visual]\nsteps: []").unwrap();
        let specs = vec![a, b];

        let filtered = TestSpec::filter_by_tag(&specs, "a11y");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "a");
    }

    #[test]
    fn test_step_labels() {
        assert_eq!(
            TestStep::Navigate { url: "/".into() }.label(),
            "navigate:/"
        );
        assert_eq!(
            TestStep::SetViewport {
                width: 1023,
                height: 800
            }
            .label(),
            "viewport:1023x800"
        );
        assert_eq!(
            TestStep::SkipUnless {
                selector: "form".into()
            }
            .label(),
            "skip-unless:form"
        );
    }
}
