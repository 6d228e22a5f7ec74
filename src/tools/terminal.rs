//! Terminal tool - runs shell commands with a wall-clock timeout

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::core::{types::truncate_chars, ToolError, ToolResult};

/// Default timeout for shell commands
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Executes shell commands through `sh -c` (`cmd /C` on Windows)
#[derive(Debug, Clone)]
pub struct TerminalTool {
    enabled: bool,
    timeout_secs: u64,
}

impl TerminalTool {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the default timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Run a command with the configured timeout
    pub async fn execute(&self, command: &str) -> ToolResult {
        self.run(command, self.timeout_secs).await
    }

    /// Run a command, killing it once `timeout_secs` elapse.
    ///
    /// Success means exit code 0. Output is trimmed stdout; on failure the
    /// error is trimmed stderr, or the exit status when stderr is empty.
    pub async fn run(&self, command: &str, timeout_secs: u64) -> ToolResult {
        if !self.enabled {
            return ToolError::Disabled { tool: "Terminal" }.into();
        }

        tracing::info!("Executing command: {}", command);

        let (shell, shell_arg) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout also reaches background children
        #[cfg(unix)]
        cmd.process_group(0);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ToolError::execution(format!("Failed to execute command: {}", e)).into()
            }
        };
        let pid = child.id();

        let limit = Duration::from_secs(timeout_secs);
        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return ToolError::execution(format!("Failed to execute command: {}", e)).into()
            }
            Err(_) => {
                tracing::warn!("Command timed out after {}s: {}", timeout_secs, command);
                kill_process_group(pid);
                return ToolError::Timeout {
                    what: "Command",
                    secs: timeout_secs,
                }
                .into();
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        tracing::debug!(
            success = output.status.success(),
            "Command result: {}",
            truncate_chars(&stdout, 100)
        );

        if output.status.success() {
            ToolResult::success(stdout)
        } else if stderr.is_empty() {
            let status = match output.status.code() {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            };
            ToolResult::failure(stdout, format!("Command exited with {}", status))
        } else {
            ToolResult::failure(stdout, stderr)
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // SAFETY: killpg only sends a signal; a group that already exited yields ESRCH
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

impl Default for TerminalTool {
    fn default() -> Self {
        Self::new(true)
    }
}
