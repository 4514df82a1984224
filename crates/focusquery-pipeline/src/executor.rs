//! Script execution against the host application.
//!
//! The executor is the single out-of-process collaborator of the pipeline:
//! it accepts one emitted script and returns the host's raw JSON payload.
//! Cancellation does not propagate into the host — dropping the future only
//! stops waiting; the host-side run may continue to completion.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use focusquery_script::Script;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to launch the script runner: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("script runner exited with {status}: {stderr}")]
    Host { status: String, stderr: String },

    #[error("script runner produced non-UTF-8 output")]
    Output(#[from] std::string::FromUtf8Error),
}

/// One-shot, synchronous-from-the-pipeline's-view script execution.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn run(&self, script: &Script) -> Result<String, ExecutorError>;
}

/// Executes scripts through the system OSA runner (`osascript -l
/// JavaScript`). The script text is fed via stdin; `-e` has argv length
/// limits that long generated scripts can exceed.
#[derive(Debug, Clone)]
pub struct OsaExecutor {
    runner: PathBuf,
}

impl OsaExecutor {
    pub fn new() -> Self {
        Self {
            runner: PathBuf::from("osascript"),
        }
    }

    /// Override the runner binary (tests, non-standard installs).
    pub fn with_runner(runner: impl Into<PathBuf>) -> Self {
        Self {
            runner: runner.into(),
        }
    }
}

impl Default for OsaExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptExecutor for OsaExecutor {
    async fn run(&self, script: &Script) -> Result<String, ExecutorError> {
        let mut child = Command::new(&self.runner)
            .arg("-l")
            .arg("JavaScript")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.text.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(ExecutorError::Host {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8(output.stdout)?.trim().to_string())
    }
}
