//! Accessibility suite
//!
//! WCAG 2.1 AA coverage: a full-page scan plus scoped scans of the regions
//! users interact with most. Every test passes only with zero violations.

use super::selectors;
use crate::axe::{
    COLOR_CONTRAST_RULE, IMAGE_ALT_RULE, LANDMARK_RULES, WCAG_AA_TAGS, WCAG_CORE_TAGS,
};
use crate::spec::{TestSpec, TestStep, DEFAULT_MAX_DIFF_PIXELS};

/// The full accessibility suite, in execution order.
pub fn accessibility() -> Vec<TestSpec> {
    vec![
        homepage_wcag(),
        header_keyboard_nav(),
        forms_labels(),
        image_alt_text(),
        color_contrast(),
        document_structure(),
    ]
}

fn a11y(name: &str, description: &str, steps: Vec<TestStep>) -> TestSpec {
    TestSpec {
        name: name.to_string(),
        description: description.to_string(),
        tags: vec!["a11y".to_string()],
        viewport: None,
        steps,
        max_diff_pixels: DEFAULT_MAX_DIFF_PIXELS,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Whole homepage against WCAG 2.0/2.1 A and AA.
fn homepage_wcag() -> TestSpec {
    a11y(
        "homepage-wcag",
        "Homepage has no automatically detectable WCAG A/AA issues",
        vec![
            TestStep::Navigate { url: "/".into() },
            TestStep::AxeCheck {
                include: None,
                tags: strings(WCAG_AA_TAGS),
                rules: vec![],
            },
        ],
    )
}

/// Header scanned after a keyboard interaction, so focus styling is live.
fn header_keyboard_nav() -> TestSpec {
    a11y(
        "header-keyboard-nav",
        "Navigation header is accessible, including keyboard focus state",
        vec![
            TestStep::Navigate { url: "/".into() },
            TestStep::Press { key: "Tab".into() },
            TestStep::AxeCheck {
                include: Some(selectors::HEADER.into()),
                tags: strings(WCAG_CORE_TAGS),
                rules: vec![],
            },
        ],
    )
}

/// Skips (not fails) on pages without a form.
fn forms_labels() -> TestSpec {
    a11y(
        "forms-labels",
        "Form controls are labelled",
        vec![
            TestStep::Navigate { url: "/".into() },
            TestStep::SkipUnless {
                selector: selectors::FORM.into(),
            },
            TestStep::AxeCheck {
                include: Some(selectors::FORM.into()),
                tags: strings(WCAG_CORE_TAGS),
                rules: vec![],
            },
        ],
    )
}

fn image_alt_text() -> TestSpec {
    a11y(
        "image-alt-text",
        "Every image has alternate text",
        vec![
            TestStep::Navigate { url: "/".into() },
            TestStep::AxeCheck {
                include: None,
                tags: vec![],
                rules: strings(&[IMAGE_ALT_RULE]),
            },
        ],
    )
}

fn color_contrast() -> TestSpec {
    a11y(
        "color-contrast",
        "Text meets minimum contrast ratios",
        vec![
            TestStep::Navigate { url: "/".into() },
            TestStep::AxeCheck {
                include: None,
                tags: vec![],
                rules: strings(&[COLOR_CONTRAST_RULE]),
            },
        ],
    )
}

/// Landmarks, a single main, a top-level heading.
fn document_structure() -> TestSpec {
    a11y(
        "document-structure",
        "Page exposes proper landmark structure",
        vec![
            TestStep::Navigate { url: "/".into() },
            TestStep::AxeCheck {
                include: None,
                tags: vec![],
                rules: strings(LANDMARK_RULES),
            },
        ],
    )
}
