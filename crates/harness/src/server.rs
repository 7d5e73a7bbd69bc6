//! Site server lifecycle
//!
//! Starts the static-site preview server as a subprocess, waits until it is
//! accepting connections, and tears it down when the run is over. Readiness
//! is detected by scanning the child's output for a configured pattern; when
//! no pattern is set we fall back to polling the base URL over HTTP.

use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{HarnessError, HarnessResult};

/// How the site server is started and when it counts as ready.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Shell command that starts the server
    pub command: String,

    /// Working directory for the command (the site project root)
    pub workdir: Option<std::path::PathBuf>,

    /// Output line pattern that signals readiness
    pub ready_pattern: Option<String>,

    /// How long to wait for readiness before giving up
    pub ready_timeout: Duration,

    /// URL the server listens on once up
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: "npm run preview".to_string(),
            workdir: None,
            ready_pattern: Some("Accepting connections".to_string()),
            ready_timeout: Duration::from_millis(30_000),
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

/// A running site server. Stop it with [`SiteServer::stop`]; dropping the
/// handle kills the child as a backstop.
pub struct SiteServer {
    child: Child,
    /// URL tests navigate against
    pub base_url: String,
}

impl SiteServer {
    /// Spawn the server and wait until it is ready to serve requests.
    ///
    /// Fatal on timeout: if the server never reports ready the whole run is
    /// aborted rather than letting every test fail on navigation.
    pub async fn start(config: &ServerConfig) -> HarnessResult<Self> {
        info!(command = %config.command, "starting site server");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&config.command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &config.workdir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| HarnessError::ServerStartup(format!("{}: {}", config.command, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HarnessError::ServerStartup("no stdout handle".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| HarnessError::ServerStartup("no stderr handle".to_string()))?;

        // Forward both streams into one channel so the ready scan sees
        // whichever one the server logs to.
        let (line_tx, line_rx) = mpsc::channel::<String>(64);

        let tx = line_tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "site_server", "{}", line);
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "site_server", "{}", line);
                if line_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        match &config.ready_pattern {
            Some(pattern) => {
                wait_for_pattern(line_rx, pattern, config.ready_timeout).await?;
            }
            None => {
                wait_for_http(&config.base_url, config.ready_timeout).await?;
            }
        }

        info!(base_url = %config.base_url, "site server ready");

        Ok(Self {
            child,
            base_url: config.base_url.clone(),
        })
    }

    /// Stop the server gracefully, escalating to SIGKILL if it lingers.
    pub async fn stop(mut self) {
        if let Some(pid) = self.child.id() {
            debug!(pid, "stopping site server");
            let _ = nix::sys::signal::kill(
                nix::unistd::Pid::from_raw(pid as i32),
                nix::sys::signal::Signal::SIGTERM,
            );

            match tokio::time::timeout(Duration::from_secs(5), self.child.wait()).await {
                Ok(Ok(status)) => debug!(%status, "site server exited"),
                Ok(Err(e)) => warn!("error waiting for site server: {}", e),
                Err(_) => {
                    warn!("site server ignored SIGTERM, killing");
                    let _ = self.child.kill().await;
                }
            }
        }
    }
}

/// Scan server output for `pattern` until `timeout` elapses.
async fn wait_for_pattern(
    mut lines: mpsc::Receiver<String>,
    pattern: &str,
    timeout: Duration,
) -> HarnessResult<()> {
    let re = Regex::new(pattern)?;
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let line = match tokio::time::timeout_at(deadline, lines.recv()).await {
            Ok(Some(line)) => line,
            // Channel closed: the server exited before reporting ready.
            Ok(None) => {
                return Err(HarnessError::ServerReadyTimeout {
                    pattern: pattern.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
            Err(_) => {
                return Err(HarnessError::ServerReadyTimeout {
                    pattern: pattern.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };

        if re.is_match(&line) {
            debug!(%line, "ready pattern matched");
            return Ok(());
        }
    }
}

/// Poll `base_url` until it answers or `timeout` elapses.
async fn wait_for_http(base_url: &str, timeout: Duration) -> HarnessResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let deadline = tokio::time::Instant::now() + timeout;
    let mut attempts = 0usize;

    while tokio::time::Instant::now() < deadline {
        attempts += 1;
        match client.get(base_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(attempts, "server answered health probe");
                return Ok(());
            }
            Ok(resp) => debug!(status = %resp.status(), "health probe rejected"),
            Err(e) => debug!("health probe failed: {}", e),
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    Err(HarnessError::ServerHealthCheck(attempts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.command, "npm run preview");
        assert_eq!(config.ready_pattern.as_deref(), Some("Accepting connections"));
        assert_eq!(config.ready_timeout, Duration::from_millis(30_000));
        assert_eq!(config.base_url, "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_ready_pattern_matches() {
        let config = ServerConfig {
            command: "echo 'Serving!' && echo 'Accepting connections at http://localhost:8000' && sleep 30".to_string(),
            ready_timeout: Duration::from_secs(5),
            ..ServerConfig::default()
        };

        let server = SiteServer::start(&config).await.unwrap();
        server.stop().await;
    }

    #[tokio::test]
    async fn test_ready_timeout_is_fatal() {
        let config = ServerConfig {
            command: "echo 'still warming up' && sleep 30".to_string(),
            ready_timeout: Duration::from_millis(300),
            ..ServerConfig::default()
        };

        let err = SiteServer::start(&config).await.err().unwrap();
        assert!(matches!(
            err,
            HarnessError::ServerReadyTimeout { timeout_ms: 300, .. }
        ));
    }

    #[tokio::test]
    async fn test_early_exit_reported_as_timeout() {
        let config = ServerConfig {
            command: "echo 'bind failed' && exit 1".to_string(),
            ready_timeout: Duration::from_secs(5),
            ..ServerConfig::default()
        };

        let err = SiteServer::start(&config).await.err().unwrap();
        assert!(matches!(err, HarnessError::ServerReadyTimeout { .. }));
    }

    #[tokio::test]
    async fn test_pattern_seen_on_stderr() {
        let config = ServerConfig {
            command: "echo 'Accepting connections' 1>&2 && sleep 30".to_string(),
            ready_timeout: Duration::from_secs(5),
            ..ServerConfig::default()
        };

        let server = SiteServer::start(&config).await.unwrap();
        server.stop().await;
    }
}
