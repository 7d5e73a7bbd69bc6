//! Built-in test suites
//!
//! The production QA coverage for the site, expressed as [`TestSpec`]s so
//! they run through the same pipeline as YAML-defined tests.

pub mod selectors;

mod accessibility;
mod visual_regression;

pub use accessibility::accessibility;
pub use visual_regression::visual_regression;

use crate::spec::TestSpec;

/// Both suites, accessibility first.
pub fn all() -> Vec<TestSpec> {
    let mut specs = accessibility();
    specs.extend(visual_regression());
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axe::WCAG_AA_TAGS;
    use crate::spec::{TestStep, Viewport};
    use std::collections::HashSet;

    fn find<'a>(specs: &'a [TestSpec], name: &str) -> &'a TestSpec {
        specs
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("no spec named {}", name))
    }

    #[test]
    fn test_spec_names_are_unique() {
        let specs = all();
        let names: HashSet<_> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), specs.len());
    }

    #[test]
    fn test_screenshot_names_are_unique() {
        let mut seen = HashSet::new();
        for spec in all() {
            for (name, _) in spec.screenshots() {
                assert!(seen.insert(name.clone()), "duplicate screenshot {}", name);
            }
        }
    }

    #[test]
    fn test_every_a11y_spec_scans() {
        for spec in accessibility() {
            assert!(spec.tags.contains(&"a11y".to_string()), "{}", spec.name);
            assert!(
                spec.steps
                    .iter()
                    .any(|s| matches!(s, TestStep::AxeCheck { .. })),
                "{} has no axe step",
                spec.name
            );
        }
    }

    #[test]
    fn test_homepage_scan_covers_wcag_21_aa() {
        let specs = accessibility();
        let spec = find(&specs, "homepage-wcag");
        match &spec.steps[1] {
            TestStep::AxeCheck {
                include,
                tags,
                rules,
            } => {
                assert!(include.is_none());
                assert!(rules.is_empty());
                let expected: Vec<String> = WCAG_AA_TAGS.iter().map(|s| s.to_string()).collect();
                assert_eq!(tags, &expected);
            }
            other => panic!("expected axe_check, got {:?}", other),
        }
    }

    #[test]
    fn test_forms_skip_precedes_scan() {
        let specs = accessibility();
        let spec = find(&specs, "forms-labels");
        let skip_pos = spec
            .steps
            .iter()
            .position(|s| matches!(s, TestStep::SkipUnless { .. }))
            .unwrap();
        let scan_pos = spec
            .steps
            .iter()
            .position(|s| matches!(s, TestStep::AxeCheck { .. }))
            .unwrap();
        assert!(skip_pos < scan_pos);
    }

    #[test]
    fn test_every_visual_spec_screenshots() {
        for spec in visual_regression() {
            assert!(spec.tags.contains(&"visual".to_string()), "{}", spec.name);
            assert!(!spec.screenshots().is_empty(), "{} captures nothing", spec.name);
        }
    }

    #[test]
    fn test_hero_budget_is_100_pixels() {
        let specs = visual_regression();
        for name in ["hero-mobile", "hero-desktop"] {
            let spec = find(&specs, name);
            assert_eq!(spec.screenshots(), vec![(name.to_string(), 100)]);
        }
    }

    #[test]
    fn test_hero_viewports() {
        let specs = visual_regression();
        assert_eq!(find(&specs, "hero-mobile").viewport, Some(Viewport::MOBILE));
        assert_eq!(find(&specs, "hero-desktop").viewport, Some(Viewport::DESKTOP));
    }

    #[test]
    fn test_nav_breakpoint_straddles_1024() {
        let specs = visual_regression();
        let spec = find(&specs, "nav-breakpoint");

        let widths: Vec<u32> = spec
            .steps
            .iter()
            .filter_map(|s| match s {
                TestStep::SetViewport { width, .. } => Some(*width),
                _ => None,
            })
            .collect();
        assert_eq!(widths, vec![1023, 1024]);

        // Both directions asserted at each width
        let visible: Vec<&str> = spec
            .steps
            .iter()
            .filter_map(|s| match s {
                TestStep::WaitVisible { selector, .. } => Some(selector.as_str()),
                _ => None,
            })
            .collect();
        let hidden: Vec<&str> = spec
            .steps
            .iter()
            .filter_map(|s| match s {
                TestStep::WaitHidden { selector, .. } => Some(selector.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(visible, vec![".mobile-menu-toggle", ".desktop-nav"]);
        assert_eq!(hidden, vec![".desktop-nav", ".mobile-menu-toggle"]);

        // The baselines capture the toggle and the nav themselves, not the
        // whole header: that is what the tight budget is sized for.
        let shot_selectors: Vec<&str> = spec
            .steps
            .iter()
            .filter_map(|s| match s {
                TestStep::Screenshot { selector, .. } => selector.as_deref(),
                _ => None,
            })
            .collect();
        assert_eq!(shot_selectors, vec![".mobile-menu-toggle", ".desktop-nav"]);
    }

    #[test]
    fn test_grid_breakpoint_straddles_768() {
        let specs = visual_regression();
        let spec = find(&specs, "grid-breakpoint");

        let widths: Vec<u32> = spec
            .steps
            .iter()
            .filter_map(|s| match s {
                TestStep::SetViewport { width, .. } => Some(*width),
                _ => None,
            })
            .collect();
        assert_eq!(widths, vec![767, 768]);

        let shots: Vec<String> = spec.screenshots().into_iter().map(|(n, _)| n).collect();
        assert_eq!(shots, vec!["programs-grid-767px", "programs-grid-768px"]);

        // Each shot waits for the grid after scrolling it into view
        let waits = spec
            .steps
            .iter()
            .filter(|s| {
                matches!(s, TestStep::WaitVisible { selector, .. } if selector == ".programs-grid")
            })
            .count();
        assert_eq!(waits, 2);
    }

    #[test]
    fn test_every_spec_navigates_first() {
        for spec in all() {
            assert!(
                matches!(spec.steps.first(), Some(TestStep::Navigate { .. })),
                "{} does not start with a navigation",
                spec.name
            );
        }
    }
}
