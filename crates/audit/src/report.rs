//! Lighthouse report model
//!
//! Minimal serde mapping of a Lighthouse JSON report (LHR): just the
//! categories and audits assertions can address. Aggregation across sampled
//! runs is by median, which is what makes `number_of_runs = 3` worthwhile on
//! a noisy machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix addressing a category score instead of an audit.
pub const CATEGORY_PREFIX: &str = "categories:";

/// One Lighthouse run over one URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseReport {
    #[serde(default)]
    pub requested_url: String,

    #[serde(default)]
    pub fetch_time: String,

    /// Category id to result, score in `0..=1`
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryResult>,

    /// Audit id to result
    #[serde(default)]
    pub audits: BTreeMap<String, AuditMetric>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResult {
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMetric {
    #[serde(default)]
    pub score: Option<f64>,

    #[serde(default)]
    pub numeric_value: Option<f64>,

    #[serde(default)]
    pub display_value: Option<String>,
}

impl LighthouseReport {
    /// Look up the value an assertion key addresses: `categories:<id>` is
    /// that category's score, anything else an audit's numeric value.
    pub fn metric(&self, key: &str) -> Option<f64> {
        match key.strip_prefix(CATEGORY_PREFIX) {
            Some(category) => self.categories.get(category).and_then(|c| c.score),
            None => self.audits.get(key).and_then(|a| a.numeric_value),
        }
    }
}

/// Per-metric medians across a URL's sampled runs.
#[derive(Debug, Clone, Serialize)]
pub struct MedianReport {
    pub url: String,
    pub runs: usize,
    metrics: BTreeMap<String, f64>,
}

impl MedianReport {
    /// Aggregate `reports` over the metrics named by `keys`. A metric absent
    /// from every run stays absent here, which assertion evaluation treats
    /// as a failure rather than a silent pass.
    pub fn aggregate<'a>(
        url: &str,
        reports: &[LighthouseReport],
        keys: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut metrics = BTreeMap::new();

        for key in keys {
            let mut values: Vec<f64> = reports.iter().filter_map(|r| r.metric(key)).collect();
            if let Some(m) = median(&mut values) {
                metrics.insert(key.to_string(), m);
            }
        }

        Self {
            url: url.to_string(),
            runs: reports.len(),
            metrics,
        }
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }
}

/// Median in place; even lengths average the middle pair.
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(perf: f64, lcp: f64) -> LighthouseReport {
        let mut categories = BTreeMap::new();
        categories.insert("performance".to_string(), CategoryResult { score: Some(perf) });

        let mut audits = BTreeMap::new();
        audits.insert(
            "largest-contentful-paint".to_string(),
            AuditMetric {
                score: Some(0.9),
                numeric_value: Some(lcp),
                display_value: Some(format!("{:.1} s", lcp / 1000.0)),
            },
        );

        LighthouseReport {
            requested_url: "http://localhost:8000/".to_string(),
            fetch_time: "2024-01-01T00:00:00.000Z".to_string(),
            categories,
            audits,
        }
    }

    #[test]
    fn test_parse_lhr_subset() {
        let json = r#"{
            "requestedUrl": "http://localhost:8000/",
            "fetchTime": "2024-05-14T10:00:00.000Z",
            "lighthouseVersion": "11.4.0",
            "categories": {
                "performance": { "id": "performance", "title": "Performance", "score": 0.96 },
                "seo": { "id": "seo", "title": "SEO", "score": 1 }
            },
            "audits": {
                "first-contentful-paint": {
                    "id": "first-contentful-paint",
                    "score": 0.98,
                    "numericValue": 812.5,
                    "numericUnit": "millisecond",
                    "displayValue": "0.8 s"
                }
            }
        }"#;

        let report: LighthouseReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.metric("categories:performance"), Some(0.96));
        assert_eq!(report.metric("categories:seo"), Some(1.0));
        assert_eq!(report.metric("first-contentful-paint"), Some(812.5));
        assert_eq!(report.metric("categories:missing"), None);
        assert_eq!(report.metric("speed-index"), None);
    }

    #[test]
    fn test_median_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn test_median_even_averages() {
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_median_empty() {
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_aggregate_takes_median_per_metric() {
        let reports = vec![report(0.91, 2400.0), report(0.85, 2100.0), report(0.95, 2600.0)];
        let agg = MedianReport::aggregate(
            "http://localhost:8000/",
            &reports,
            ["categories:performance", "largest-contentful-paint"],
        );

        assert_eq!(agg.runs, 3);
        assert_eq!(agg.metric("categories:performance"), Some(0.91));
        assert_eq!(agg.metric("largest-contentful-paint"), Some(2400.0));
    }

    #[test]
    fn test_aggregate_skips_absent_metrics() {
        let reports = vec![report(0.9, 2000.0)];
        let agg = MedianReport::aggregate("u", &reports, ["categories:pwa"]);
        assert_eq!(agg.metric("categories:pwa"), None);
    }

    #[test]
    fn test_aggregate_ignores_runs_missing_a_metric() {
        let mut partial = report(0.9, 2000.0);
        partial.audits.clear();
        let reports = vec![partial, report(0.9, 2200.0), report(0.9, 2300.0)];

        let agg = MedianReport::aggregate("u", &reports, ["largest-contentful-paint"]);
        // Median of the two present values
        assert_eq!(agg.metric("largest-contentful-paint"), Some(2250.0));
    }
}
