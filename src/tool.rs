//! External tool invocation with a hard deadline.
//!
//! Both `pdftoppm` (page rasterization) and `soffice` (deck-to-HTML
//! fallback) are optional system binaries. A missing binary maps to
//! [`ToolError::Unavailable`] and a hung one is killed after the configured
//! timeout, so a stuck converter can never wedge an analysis session.

use crate::error::ToolError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

/// Outcome of a completed (non-timed-out) tool run.
///
/// Both converters write their results to files and use stdout for nothing
/// useful, so only stderr is captured; tools emit warnings there even on a
/// zero exit.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub stderr: Vec<u8>,
}

/// Run `command`, killing the process if it exceeds `timeout_secs`.
///
/// A non-zero exit status is an error carrying the captured stderr, so
/// callers can log what the tool actually complained about.
pub(crate) async fn run_with_timeout(
    mut command: Command,
    tool: &str,
    timeout_secs: u64,
) -> Result<ToolOutput, ToolError> {
    command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());
    debug!(tool, timeout_secs, "Spawning external tool");

    let mut child = command.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ToolError::Unavailable {
            tool: tool.to_string(),
            detail: "binary not found on PATH".to_string(),
        },
        _ => ToolError::Unavailable {
            tool: tool.to_string(),
            detail: e.to_string(),
        },
    })?;

    let mut stderr_pipe = child.stderr.take();

    let waited = tokio::time::timeout(Duration::from_secs(timeout_secs), async {
        let mut stderr = Vec::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_end(&mut stderr).await;
        }
        (child.wait().await, stderr)
    })
    .await;

    match waited {
        Ok((Ok(status), stderr)) => {
            if status.success() {
                Ok(ToolOutput { stderr })
            } else {
                Err(ToolError::Failed {
                    tool: tool.to_string(),
                    code: status.code(),
                    stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
                })
            }
        }
        Ok((Err(e), _)) => Err(ToolError::Unavailable {
            tool: tool.to_string(),
            detail: format!("wait failed: {e}"),
        }),
        Err(_) => {
            // The deadline fired with the child still running.
            let _ = child.kill().await;
            let _ = child.wait().await;
            Err(ToolError::Timeout {
                tool: tool.to_string(),
                secs: timeout_secs,
            })
        }
    }
}
