//! Rendered fetches for sites whose content only exists after scripts run.
//!
//! The browser itself is an external program. [`CommandRenderer`] runs a
//! configured headless-browser command line with the URL appended, e.g.
//! `chromium --headless --disable-gpu --dump-dom`, and returns its stdout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::Fetcher;
use crate::errors::{HeraldError, HeraldResult};

#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRenderer {
    /// Build from a whitespace-separated command line
    pub fn from_command_line(command: &str, timeout: Duration) -> HeraldResult<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| HeraldError::Config("render command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
            timeout,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Fetcher for CommandRenderer {
    async fn fetch(&self, url: &str) -> HeraldResult<Vec<u8>> {
        let network = |message: String| HeraldError::Network {
            url: url.to_string(),
            message,
        };

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| network(format!("renderer timed out after {:?}", self.timeout)))?
            .map_err(|e| network(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(network(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        tracing::debug!(url, bytes = output.stdout.len(), "rendered");
        Ok(output.stdout)
    }
}
