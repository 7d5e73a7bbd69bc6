//! Browser-driven QA harness for the marketing site
//!
//! Drives Playwright from Rust to run the two production suites against a
//! local preview of the site: axe-core accessibility scans and screenshot
//! comparison against committed baselines. Tests are declarative
//! [`TestSpec`]s, either built in (see [`suites`]) or loaded from YAML.
//!
//! A suite run starts the preview server, executes every spec in its own
//! browser session, and aggregates pass/fail/skip outcomes; results and
//! diff artifacts land under `qa-results/`.

pub mod axe;
pub mod browser;
pub mod error;
pub mod runner;
pub mod server;
pub mod spec;
pub mod suites;
pub mod visual;

pub use axe::{AxeOptions, AxeResults, AxeViolation};
pub use browser::{Browser, BrowserConfig, BrowserDriver, BrowserEvent};
pub use error::{HarnessError, HarnessResult};
pub use runner::{RunnerConfig, SuiteResult, SuiteRunner, TestOutcome, TestResult};
pub use server::{ServerConfig, SiteServer};
pub use spec::{TestSpec, TestStep, Viewport};
pub use visual::{VisualComparator, VisualConfig, VisualDiff};
