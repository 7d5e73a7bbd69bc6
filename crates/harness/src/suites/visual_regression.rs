//! Visual regression suite
//!
//! Screenshots of the page regions that matter, at the viewports they are
//! most used at, with per-region pixel budgets. The two breakpoint tests pin
//! the exact widths the layout is supposed to change at: off by one pixel is
//! a regression.

use super::selectors;
use crate::spec::{TestSpec, TestStep, Viewport};

/// Pixel budget for large regions (hero, programs grid).
const LARGE_REGION_BUDGET: u32 = 100;

/// Pixel budget for chrome (header, footer), which should barely move.
const CHROME_BUDGET: u32 = 50;

/// Pixel budget for the breakpoint shots. Tight: layout state is binary.
const BREAKPOINT_BUDGET: u32 = 20;

/// Width at and above which the desktop navigation shows.
const NAV_BREAKPOINT: u32 = 1024;

/// Width at and above which the programs grid goes multi-column.
const GRID_BREAKPOINT: u32 = 768;

/// The full visual regression suite, in execution order.
pub fn visual_regression() -> Vec<TestSpec> {
    vec![
        hero("hero-mobile", Viewport::MOBILE),
        hero("hero-desktop", Viewport::DESKTOP),
        header("header-mobile", Viewport::MOBILE),
        header("header-desktop", Viewport::DESKTOP),
        region_shot(
            "programs-grid-desktop",
            "Programs grid layout on desktop",
            selectors::PROGRAMS_GRID,
            LARGE_REGION_BUDGET,
        ),
        region_shot(
            "footer-desktop",
            "Footer layout on desktop",
            selectors::FOOTER,
            CHROME_BUDGET,
        ),
        nav_breakpoint(),
        grid_breakpoint(),
    ]
}

fn visual(
    name: &str,
    description: &str,
    viewport: Option<Viewport>,
    steps: Vec<TestStep>,
    max_diff_pixels: u32,
) -> TestSpec {
    TestSpec {
        name: name.to_string(),
        description: description.to_string(),
        tags: vec!["visual".to_string()],
        viewport,
        steps,
        max_diff_pixels,
    }
}

/// Hero banner at the given viewport.
fn hero(name: &str, viewport: Viewport) -> TestSpec {
    visual(
        name,
        "Hero section renders consistently",
        Some(viewport),
        vec![
            TestStep::Navigate { url: "/".into() },
            TestStep::WaitVisible {
                selector: selectors::HERO.into(),
                timeout_ms: 5000,
            },
            TestStep::Screenshot {
                name: name.to_string(),
                selector: Some(selectors::HERO.into()),
                max_diff_pixels: None,
            },
        ],
        LARGE_REGION_BUDGET,
    )
}

/// Navigation header at the given viewport.
fn header(name: &str, viewport: Viewport) -> TestSpec {
    visual(
        name,
        "Navigation header renders consistently",
        Some(viewport),
        vec![
            TestStep::Navigate { url: "/".into() },
            TestStep::WaitVisible {
                selector: selectors::HEADER.into(),
                timeout_ms: 5000,
            },
            TestStep::Screenshot {
                name: name.to_string(),
                selector: Some(selectors::HEADER.into()),
                max_diff_pixels: None,
            },
        ],
        CHROME_BUDGET,
    )
}

/// A below-the-fold region: scroll it into view before the shot.
fn region_shot(name: &str, description: &str, selector: &str, budget: u32) -> TestSpec {
    visual(
        name,
        description,
        Some(Viewport::DESKTOP),
        vec![
            TestStep::Navigate { url: "/".into() },
            TestStep::ScrollIntoView {
                selector: selector.to_string(),
            },
            TestStep::WaitVisible {
                selector: selector.to_string(),
                timeout_ms: 5000,
            },
            TestStep::Screenshot {
                name: name.to_string(),
                selector: Some(selector.to_string()),
                max_diff_pixels: None,
            },
        ],
        budget,
    )
}

/// One pixel below the breakpoint shows the hamburger, at it the desktop
/// nav. Both directions are asserted so a half-applied media query fails.
fn nav_breakpoint() -> TestSpec {
    visual(
        "nav-breakpoint",
        "Navigation collapses exactly at the breakpoint",
        None,
        vec![
            TestStep::Navigate { url: "/".into() },
            TestStep::SetViewport {
                width: NAV_BREAKPOINT - 1,
                height: 800,
            },
            TestStep::WaitVisible {
                selector: selectors::MOBILE_MENU_TOGGLE.into(),
                timeout_ms: 5000,
            },
            TestStep::WaitHidden {
                selector: selectors::DESKTOP_NAV.into(),
                timeout_ms: 5000,
            },
            TestStep::Screenshot {
                name: "nav-mobile-toggle".into(),
                selector: Some(selectors::MOBILE_MENU_TOGGLE.into()),
                max_diff_pixels: None,
            },
            TestStep::SetViewport {
                width: NAV_BREAKPOINT,
                height: 800,
            },
            TestStep::WaitVisible {
                selector: selectors::DESKTOP_NAV.into(),
                timeout_ms: 5000,
            },
            TestStep::WaitHidden {
                selector: selectors::MOBILE_MENU_TOGGLE.into(),
                timeout_ms: 5000,
            },
            TestStep::Screenshot {
                name: "nav-desktop".into(),
                selector: Some(selectors::DESKTOP_NAV.into()),
                max_diff_pixels: None,
            },
        ],
        BREAKPOINT_BUDGET,
    )
}

/// The grid stacks below 768 and goes multi-column at 768.
fn grid_breakpoint() -> TestSpec {
    visual(
        "grid-breakpoint",
        "Programs grid reflows exactly at the breakpoint",
        None,
        vec![
            TestStep::Navigate { url: "/".into() },
            TestStep::SetViewport {
                width: GRID_BREAKPOINT - 1,
                height: 1000,
            },
            TestStep::ScrollIntoView {
                selector: selectors::PROGRAMS_GRID.into(),
            },
            TestStep::WaitVisible {
                selector: selectors::PROGRAMS_GRID.into(),
                timeout_ms: 5000,
            },
            TestStep::Screenshot {
                name: "programs-grid-767px".into(),
                selector: Some(selectors::PROGRAMS_GRID.into()),
                max_diff_pixels: None,
            },
            TestStep::SetViewport {
                width: GRID_BREAKPOINT,
                height: 1000,
            },
            TestStep::ScrollIntoView {
                selector: selectors::PROGRAMS_GRID.into(),
            },
            TestStep::WaitVisible {
                selector: selectors::PROGRAMS_GRID.into(),
                timeout_ms: 5000,
            },
            TestStep::Screenshot {
                name: "programs-grid-768px".into(),
                selector: Some(selectors::PROGRAMS_GRID.into()),
                max_diff_pixels: None,
            },
        ],
        LARGE_REGION_BUDGET,
    )
}
