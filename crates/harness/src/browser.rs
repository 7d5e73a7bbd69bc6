//! Playwright browser automation
//!
//! Each test is compiled into one Node script so every step shares a single
//! page session (an axe scan must see the page the preceding navigation
//! loaded, and a breakpoint screenshot must see the resized viewport). The
//! script reports back over stdout as prefixed JSON event lines which are
//! parsed into [`BrowserEvent`]s.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::axe::{AxeOptions, AxeViolation};
use crate::error::{HarnessError, HarnessResult};
use crate::spec::{TestSpec, TestStep, Viewport};

/// Marker the generated script prefixes every event line with.
const EVENT_PREFIX: &str = "SITEQA_EVENT:";

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for the browser driver
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Base URL the server listens on
    pub base_url: String,

    /// Directory screenshots are written to
    pub screenshot_dir: PathBuf,

    /// Viewport for specs that do not set their own
    pub default_viewport: Viewport,

    /// Browser engine to drive
    pub browser: Browser,

    pub headless: bool,

    /// Site project root; `playwright` and `axe-core` resolve from its
    /// node_modules
    pub work_dir: PathBuf,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            screenshot_dir: PathBuf::from("qa-results/screenshots"),
            default_viewport: Viewport::DESKTOP,
            browser: Browser::Chromium,
            headless: true,
            work_dir: PathBuf::from("."),
        }
    }
}

/// What the generated script reports back while running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BrowserEvent {
    /// A step completed
    StepDone { label: String },

    /// A `skip_unless` precondition failed; the rest of the test did not run
    Skipped { selector: String },

    /// An axe scan finished
    AxeResults {
        scope: String,
        violations: Vec<AxeViolation>,
    },

    /// A screenshot was written to disk
    ScreenshotTaken { name: String, path: PathBuf },

    /// A step threw; the test is failed at that step
    TestError { label: String, message: String },

    /// The whole test ran to completion
    Done,
}

/// Drives Playwright through generated Node scripts.
pub struct BrowserDriver {
    config: BrowserConfig,
}

impl BrowserDriver {
    pub fn new(config: BrowserConfig) -> HarnessResult<Self> {
        Self::check_installed()?;
        std::fs::create_dir_all(&config.screenshot_dir)?;
        Ok(Self { config })
    }

    /// Check that Playwright is available.
    fn check_installed() -> HarnessResult<()> {
        let output = std::process::Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(HarnessError::PlaywrightNotFound),
        }
    }

    /// Run a whole test spec in one browser session and collect its events.
    pub async fn run(&self, spec: &TestSpec) -> HarnessResult<Vec<BrowserEvent>> {
        let script = self.build_script(spec);

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join(format!("{}.js", spec.name));
        std::fs::write(&script_path, &script)?;

        debug!(test = %spec.name, script = %script_path.display(), "running browser script");

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(&self.config.work_dir)
            .env("NODE_PATH", self.config.work_dir.join("node_modules"))
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let events = parse_events(&stdout);

        // A step failure surfaces as a test_error event with exit code 1;
        // anything else nonzero is an infrastructure problem.
        let has_error_event = events
            .iter()
            .any(|e| matches!(e, BrowserEvent::TestError { .. }));
        if !output.status.success() && !has_error_event {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::Playwright(format!(
                "script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }

        Ok(events)
    }

    /// Build the Node script for a test spec.
    pub fn build_script(&self, spec: &TestSpec) -> String {
        let viewport = spec.viewport.unwrap_or(self.config.default_viewport);

        let mut script = String::new();
        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');
const axeSource = require('axe-core').source;

const emit = (payload) => console.log('{prefix}' + JSON.stringify(payload));

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = '{base_url}';
  let label = '';

  try {{
"#,
            prefix = EVENT_PREFIX,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = viewport.width,
            height = viewport.height,
            base_url = js_str(&self.config.base_url),
        ));

        for (i, step) in spec.steps.iter().enumerate() {
            let label = step.label();
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, label));
            script.push_str(&format!("    label = '{}';\n", js_str(&label)));
            script.push_str(&self.step_to_js(step, i));
            script.push('\n');
            script.push_str(&format!(
                "    emit({{ event: 'step_done', label: '{}' }});\n",
                js_str(&label)
            ));
        }

        script.push_str(
            r#"
    emit({ event: 'done' });
  } catch (error) {
    emit({ event: 'test_error', label, message: error.message });
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Where the screenshot for `name` lands. The script runs with the site
    /// dir as its working directory, while the comparator resolves
    /// `actual_dir` against the harness process, so a relative screenshot
    /// dir must be pinned to the harness cwd before it goes into the script.
    fn screenshot_path(&self, name: &str) -> PathBuf {
        let path = self.config.screenshot_dir.join(format!("{}.png", name));
        if path.is_absolute() {
            return path;
        }
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path,
        }
    }

    /// Convert one step to JavaScript.
    fn step_to_js(&self, step: &TestStep, step_index: usize) -> String {
        match step {
            TestStep::Navigate { url } => {
                format!("    await page.goto(baseUrl + '{}');", js_str(url))
            }
            TestStep::SetViewport { width, height } => {
                format!(
                    "    await page.setViewportSize({{ width: {}, height: {} }});",
                    width, height
                )
            }
            TestStep::WaitVisible {
                selector,
                timeout_ms,
            } => {
                format!(
                    "    await page.locator('{}').first().waitFor({{ state: 'visible', timeout: {} }});",
                    js_str(selector),
                    timeout_ms
                )
            }
            TestStep::WaitHidden {
                selector,
                timeout_ms,
            } => {
                // 'hidden' also matches an element removed by the breakpoint
                format!(
                    "    await page.locator('{}').first().waitFor({{ state: 'hidden', timeout: {} }});",
                    js_str(selector),
                    timeout_ms
                )
            }
            TestStep::ScrollIntoView { selector } => {
                format!(
                    "    await page.locator('{}').first().scrollIntoViewIfNeeded();",
                    js_str(selector)
                )
            }
            TestStep::Press { key } => {
                format!("    await page.keyboard.press('{}');", js_str(key))
            }
            TestStep::SkipUnless { selector } => {
                // Returning inside the try still closes the browser in finally.
                format!(
                    r#"    if (await page.locator('{sel}').count() === 0) {{
      emit({{ event: 'skipped', selector: '{sel}' }});
      return;
    }}"#,
                    sel = js_str(selector)
                )
            }
            TestStep::AxeCheck {
                include,
                tags,
                rules,
            } => {
                let options = AxeOptions {
                    include: include.clone(),
                    tags: tags.clone(),
                    rules: rules.clone(),
                };
                let ctx = serde_json::json!({
                    "include": options.include,
                    "runOnly": options.run_only(),
                });
                let scope = include.as_deref().unwrap_or("document");
                format!(
                    r#"    await page.evaluate(src => window.eval(src), axeSource);
    const axeResults_{i} = await page.evaluate(async (ctx) => {{
      const opts = ctx.runOnly ? {{ runOnly: ctx.runOnly }} : {{}};
      return await window.axe.run(ctx.include ?? document, opts);
    }}, {ctx});
    emit({{ event: 'axe_results', scope: '{scope}', violations: axeResults_{i}.violations }});"#,
                    i = step_index,
                    ctx = ctx,
                    scope = js_str(scope),
                )
            }
            TestStep::Screenshot { name, selector, .. } => {
                let path = self.screenshot_path(name);
                let path_str = js_str(&path.to_string_lossy());

                let capture = match selector {
                    Some(sel) => format!(
                        "    await page.locator('{}').first().screenshot({{ path: '{}' }});",
                        js_str(sel),
                        path_str
                    ),
                    None => format!("    await page.screenshot({{ path: '{}' }});", path_str),
                };
                format!(
                    "{}\n    emit({{ event: 'screenshot_taken', name: '{}', path: '{}' }});",
                    capture,
                    js_str(name),
                    path_str
                )
            }
        }
    }
}

/// Escape a Rust string for embedding in single-quoted JavaScript.
fn js_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Pull the prefixed event lines out of script output.
fn parse_events(stdout: &str) -> Vec<BrowserEvent> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix(EVENT_PREFIX))
        .filter_map(|json| match serde_json::from_str(json) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("unparseable event line: {} ({})", json, e);
                None
            }
        })
        .collect()
}
