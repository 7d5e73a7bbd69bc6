//! Screenshot comparison against committed baselines
//!
//! Captured screenshots are compared pixel-by-pixel against the versioned
//! baselines. A comparison passes when the differing-pixel count stays
//! within the test's budget; a byte-identical file short-circuits via hash.
//! Failures leave a red-highlighted diff image behind for review.

use image::{GenericImageView, Rgba, RgbaImage};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{HarnessError, HarnessResult};

/// Per-channel difference treated as equal. Absorbs anti-aliasing and font
/// rendering wobble between runs without hiding real changes.
const CHANNEL_TOLERANCE: u8 = 5;

/// Where baselines and captured screenshots live.
#[derive(Debug, Clone)]
pub struct VisualConfig {
    /// Committed reference images
    pub baseline_dir: PathBuf,

    /// Screenshots captured by the current run
    pub actual_dir: PathBuf,

    /// Diff images for failed comparisons
    pub diff_dir: PathBuf,

    /// Accept the current run's screenshots as the new baselines
    pub update_baselines: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("baselines"),
            actual_dir: PathBuf::from("qa-results/screenshots"),
            diff_dir: PathBuf::from("qa-results/diffs"),
            update_baselines: false,
        }
    }
}

/// Outcome of one screenshot comparison.
#[derive(Debug, Clone, Serialize)]
pub struct VisualDiff {
    pub name: String,
    pub matches: bool,
    /// Pixels that differ beyond the channel tolerance
    pub diff_pixels: u64,
    /// Budget the comparison was held to
    pub max_diff_pixels: u32,
    /// Union area of the two images
    pub total_pixels: u64,
    /// Size mismatch fails the comparison regardless of the budget
    pub dimensions_differ: bool,
    /// Written only for failed comparisons
    pub diff_image: Option<PathBuf>,
}

pub struct VisualComparator {
    config: VisualConfig,
}

impl VisualComparator {
    pub fn new(config: VisualConfig) -> HarnessResult<Self> {
        std::fs::create_dir_all(&config.baseline_dir)?;
        std::fs::create_dir_all(&config.actual_dir)?;
        std::fs::create_dir_all(&config.diff_dir)?;
        Ok(Self { config })
    }

    /// Compare the captured screenshot `name` against its baseline.
    ///
    /// A missing baseline is an error unless `update_baselines` is set, in
    /// which case the capture is adopted as the baseline and passes.
    pub fn compare(&self, name: &str, max_diff_pixels: u32) -> HarnessResult<VisualDiff> {
        let actual_path = self.actual_path(name);
        let baseline_path = self.baseline_path(name);

        if !actual_path.exists() {
            return Err(HarnessError::Visual(format!(
                "no screenshot captured for {}",
                name
            )));
        }

        if !baseline_path.exists() {
            if self.config.update_baselines {
                std::fs::copy(&actual_path, &baseline_path)?;
                info!(name, "baseline created");
                return Ok(self.exact_match(name, max_diff_pixels, &actual_path)?);
            }
            return Err(HarnessError::BaselineNotFound(name.to_string()));
        }

        // Identical bytes need no decode
        if file_hash(&actual_path)? == file_hash(&baseline_path)? {
            debug!(name, "hash match, skipping pixel compare");
            return Ok(self.exact_match(name, max_diff_pixels, &actual_path)?);
        }

        let baseline = image::open(&baseline_path)?.to_rgba8();
        let actual = image::open(&actual_path)?.to_rgba8();

        let dimensions_differ = baseline.dimensions() != actual.dimensions();
        let (diff_pixels, diff_image) = diff_images(&baseline, &actual);
        let total_pixels = (baseline.width().max(actual.width()) as u64)
            * (baseline.height().max(actual.height()) as u64);

        let mut matches = !dimensions_differ && diff_pixels <= max_diff_pixels as u64;

        // In update mode a drifted screenshot becomes the new baseline and
        // the comparison is reported as passing.
        let mut diff_image_path = None;
        if !matches {
            if self.config.update_baselines {
                std::fs::copy(&actual_path, &baseline_path)?;
                info!(name, diff_pixels, "baseline updated");
                matches = true;
            } else {
                let path = self.config.diff_dir.join(format!("{}.png", name));
                diff_image.save(&path)?;
                diff_image_path = Some(path);
            }
        }

        Ok(VisualDiff {
            name: name.to_string(),
            matches,
            diff_pixels,
            max_diff_pixels,
            total_pixels,
            dimensions_differ,
            diff_image: diff_image_path,
        })
    }

    /// Adopt the current run's screenshot as the baseline for `name`.
    pub fn update_baseline(&self, name: &str) -> HarnessResult<()> {
        let actual_path = self.actual_path(name);
        if !actual_path.exists() {
            return Err(HarnessError::Visual(format!(
                "no screenshot captured for {}",
                name
            )));
        }
        std::fs::copy(&actual_path, self.baseline_path(name))?;
        info!(name, "baseline updated");
        Ok(())
    }

    /// Baseline names currently on disk.
    pub fn list_baselines(&self) -> HarnessResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.config.baseline_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn actual_path(&self, name: &str) -> PathBuf {
        self.config.actual_dir.join(format!("{}.png", name))
    }

    fn baseline_path(&self, name: &str) -> PathBuf {
        self.config.baseline_dir.join(format!("{}.png", name))
    }

    fn exact_match(
        &self,
        name: &str,
        max_diff_pixels: u32,
        actual_path: &Path,
    ) -> HarnessResult<VisualDiff> {
        let (w, h) = image::image_dimensions(actual_path)?;
        Ok(VisualDiff {
            name: name.to_string(),
            matches: true,
            diff_pixels: 0,
            max_diff_pixels,
            total_pixels: w as u64 * h as u64,
            dimensions_differ: false,
            diff_image: None,
        })
    }
}

/// Count differing pixels and paint them red on a copy of the baseline.
/// Any area one image has and the other does not counts as differing.
pub fn diff_images(baseline: &RgbaImage, actual: &RgbaImage) -> (u64, RgbaImage) {
    let width = baseline.width().max(actual.width());
    let height = baseline.height().max(actual.height());

    let mut diff_pixels = 0u64;
    let mut diff_image = RgbaImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let in_baseline = x < baseline.width() && y < baseline.height();
            let in_actual = x < actual.width() && y < actual.height();

            let differs = match (in_baseline, in_actual) {
                (true, true) => {
                    !channels_match(baseline.get_pixel(x, y), actual.get_pixel(x, y))
                }
                _ => true,
            };

            if differs {
                diff_pixels += 1;
                diff_image.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            } else {
                diff_image.put_pixel(x, y, *baseline.get_pixel(x, y));
            }
        }
    }

    (diff_pixels, diff_image)
}

fn channels_match(a: &Rgba<u8>, b: &Rgba<u8>) -> bool {
    a.0.iter()
        .zip(b.0.iter())
        .all(|(ca, cb)| ca.abs_diff(*cb) <= CHANNEL_TOLERANCE)
}

fn file_hash(path: &Path) -> HarnessResult<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    fn comparator(temp: &TempDir, update: bool) -> VisualComparator {
        VisualComparator::new(VisualConfig {
            baseline_dir: temp.path().join("baselines"),
            actual_dir: temp.path().join("actual"),
            diff_dir: temp.path().join("diffs"),
            update_baselines: update,
        })
        .unwrap()
    }

    fn save(comparator: &VisualComparator, dir: &str, name: &str, img: &RgbaImage) {
        let base = match dir {
            "baseline" => &comparator.config.baseline_dir,
            _ => &comparator.config.actual_dir,
        };
        img.save(base.join(format!("{}.png", name))).unwrap();
    }

    #[test]
    fn test_identical_images_match() {
        let temp = TempDir::new().unwrap();
        let cmp = comparator(&temp, false);
        let img = solid(100, 50, [10, 120, 200, 255]);
        save(&cmp, "baseline", "hero", &img);
        save(&cmp, "actual", "hero", &img);

        let diff = cmp.compare("hero", 0).unwrap();
        assert!(diff.matches);
        assert_eq!(diff.diff_pixels, 0);
        assert!(diff.diff_image.is_none());
    }

    #[test]
    fn test_diff_within_budget_passes() {
        let temp = TempDir::new().unwrap();
        let cmp = comparator(&temp, false);
        let baseline = solid(100, 50, [10, 120, 200, 255]);
        let mut actual = baseline.clone();
        for x in 0..60 {
            actual.put_pixel(x, 0, Rgba([255, 255, 255, 255]));
        }
        save(&cmp, "baseline", "hero", &baseline);
        save(&cmp, "actual", "hero", &actual);

        let diff = cmp.compare("hero", 100).unwrap();
        assert!(diff.matches);
        assert_eq!(diff.diff_pixels, 60);
    }

    #[test]
    fn test_diff_over_budget_fails_and_writes_diff_image() {
        let temp = TempDir::new().unwrap();
        let cmp = comparator(&temp, false);
        let baseline = solid(100, 50, [10, 120, 200, 255]);
        let mut actual = baseline.clone();
        for x in 0..100 {
            for y in 0..2 {
                actual.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        save(&cmp, "baseline", "hero", &baseline);
        save(&cmp, "actual", "hero", &actual);

        let diff = cmp.compare("hero", 100).unwrap();
        assert!(!diff.matches);
        assert_eq!(diff.diff_pixels, 200);
        let diff_path = diff.diff_image.unwrap();
        assert!(diff_path.exists());

        let diff_img = image::open(diff_path).unwrap().to_rgba8();
        assert_eq!(*diff_img.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*diff_img.get_pixel(0, 10), Rgba([10, 120, 200, 255]));
    }

    #[test_case(5, 0 ; "wobble at the tolerance is ignored")]
    #[test_case(6, 100 ; "wobble past the tolerance counts every pixel")]
    fn test_channel_tolerance_boundary(delta: u8, expected_diff: u64) {
        let temp = TempDir::new().unwrap();
        let cmp = comparator(&temp, false);
        let baseline = solid(10, 10, [100, 100, 100, 255]);
        let actual = solid(10, 10, [100 + delta, 100, 100, 255]);
        save(&cmp, "baseline", "nav", &baseline);
        save(&cmp, "actual", "nav", &actual);

        let diff = cmp.compare("nav", 1000).unwrap();
        assert_eq!(diff.diff_pixels, expected_diff);
    }

    #[test]
    fn test_dimension_mismatch_fails_regardless_of_budget() {
        let temp = TempDir::new().unwrap();
        let cmp = comparator(&temp, false);
        save(&cmp, "baseline", "footer", &solid(100, 50, [0, 0, 0, 255]));
        save(&cmp, "actual", "footer", &solid(100, 52, [0, 0, 0, 255]));

        let diff = cmp.compare("footer", 1_000_000).unwrap();
        assert!(!diff.matches);
        assert!(diff.dimensions_differ);
        // Only the two extra rows differ
        assert_eq!(diff.diff_pixels, 200);
    }

    #[test]
    fn test_missing_baseline_is_an_error() {
        let temp = TempDir::new().unwrap();
        let cmp = comparator(&temp, false);
        save(&cmp, "actual", "new-shot", &solid(10, 10, [0, 0, 0, 255]));

        let err = cmp.compare("new-shot", 100).err().unwrap();
        assert!(matches!(err, HarnessError::BaselineNotFound(name) if name == "new-shot"));
    }

    #[test]
    fn test_update_mode_adopts_missing_baseline() {
        let temp = TempDir::new().unwrap();
        let cmp = comparator(&temp, true);
        save(&cmp, "actual", "new-shot", &solid(10, 10, [0, 0, 0, 255]));

        let diff = cmp.compare("new-shot", 100).unwrap();
        assert!(diff.matches);
        assert!(cmp.config.baseline_dir.join("new-shot.png").exists());
    }

    #[test]
    fn test_update_mode_accepts_drift() {
        let temp = TempDir::new().unwrap();
        let cmp = comparator(&temp, true);
        save(&cmp, "baseline", "hero", &solid(10, 10, [0, 0, 0, 255]));
        save(&cmp, "actual", "hero", &solid(10, 10, [255, 255, 255, 255]));

        let diff = cmp.compare("hero", 0).unwrap();
        assert!(diff.matches);
        assert_eq!(diff.diff_pixels, 100);
        assert!(diff.diff_image.is_none());

        // Baseline now holds the new capture
        let updated = image::open(cmp.config.baseline_dir.join("hero.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(*updated.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_missing_capture_is_an_error() {
        let temp = TempDir::new().unwrap();
        let cmp = comparator(&temp, false);
        save(&cmp, "baseline", "hero", &solid(10, 10, [0, 0, 0, 255]));

        let err = cmp.compare("hero", 100).err().unwrap();
        assert!(matches!(err, HarnessError::Visual(_)));
    }

    #[test]
    fn test_compare_is_deterministic() {
        let temp = TempDir::new().unwrap();
        let cmp = comparator(&temp, false);
        let baseline = solid(50, 50, [10, 20, 30, 255]);
        let mut actual = baseline.clone();
        for x in 0..30 {
            actual.put_pixel(x, 25, Rgba([200, 0, 0, 255]));
        }
        save(&cmp, "baseline", "grid", &baseline);
        save(&cmp, "actual", "grid", &actual);

        let first = cmp.compare("grid", 10).unwrap();
        let second = cmp.compare("grid", 10).unwrap();
        assert_eq!(first.diff_pixels, second.diff_pixels);
        assert_eq!(first.matches, second.matches);
        assert_eq!(first.diff_pixels, 30);
    }

    #[test]
    fn test_list_baselines_sorted() {
        let temp = TempDir::new().unwrap();
        let cmp = comparator(&temp, false);
        save(&cmp, "baseline", "nav-desktop", &solid(1, 1, [0, 0, 0, 255]));
        save(&cmp, "baseline", "hero-mobile", &solid(1, 1, [0, 0, 0, 255]));

        assert_eq!(cmp.list_baselines().unwrap(), vec!["hero-mobile", "nav-desktop"]);
    }
}
