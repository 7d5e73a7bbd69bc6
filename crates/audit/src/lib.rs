//! Lighthouse audit layer for the marketing site
//!
//! Typed equivalent of a Lighthouse CI setup: an [`AuditConfig`] describes
//! how to bring the site up, which URLs to sample how often, and the
//! assertion rules the scores are held to. The [`AuditRunner`] starts the
//! preview server, takes N Lighthouse measurements per URL, aggregates them
//! by median and evaluates the rules: error-severity violations fail the
//! audit, warnings are recorded and move on.

pub mod assertions;
pub mod config;
pub mod error;
pub mod lighthouse;
pub mod report;
pub mod runner;

pub use assertions::AssertionOutcome;
pub use config::{AssertionRule, AuditConfig, Bound, Severity};
pub use error::{AuditError, AuditResult};
pub use report::{LighthouseReport, MedianReport};
pub use runner::{AuditRunner, AuditSummary, UrlSummary};
