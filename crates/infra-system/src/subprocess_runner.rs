// Subprocess command runner
// Spawns isolated child processes with environment allowlisting

use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use hostprobe_core::port::command_runner::{CommandOutput, CommandRunner, RunnerError};

/// Fallback bound applied when a caller passes no explicit timeout; no
/// invocation ever runs unbounded.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Subprocess-backed command runner.
///
/// Children get a scrubbed environment (allowlist only) and piped stdio;
/// non-zero exits are reported inside CommandOutput, not as errors.
pub struct SubprocessRunner {
    env_allowlist: Vec<String>,
    default_timeout: Duration,
}

impl SubprocessRunner {
    pub fn new(env_allowlist: Vec<String>, default_timeout: Option<Duration>) -> Self {
        Self {
            env_allowlist,
            default_timeout: default_timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }

    /// Filter the process environment down to the allowlist.
    fn filtered_env(&self) -> HashMap<String, String> {
        std::env::vars()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect()
    }
}

impl Default for SubprocessRunner {
    fn default() -> Self {
        Self::new(
            vec![
                "PATH".to_string(),
                "HOME".to_string(),
                "LANG".to_string(),
            ],
            None,
        )
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout_override: Option<Duration>,
    ) -> Result<CommandOutput, RunnerError> {
        let bound = timeout_override.unwrap_or(self.default_timeout);
        let started = Instant::now();

        let child = Command::new(program)
            .args(args)
            .env_clear()
            .envs(self.filtered_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RunnerError::SpawnFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let output = match timeout(bound, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(RunnerError::Io {
                    program: program.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(RunnerError::Timeout {
                    program: program.to_string(),
                    timeout_ms: bound.as_millis() as u64,
                })
            }
        };

        let duration_ms = started.elapsed().as_millis() as i64;
        debug!(
            program = %program,
            args = ?args,
            exit_code = ?output.status.code(),
            duration_ms = %duration_ms,
            "command completed"
        );

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            duration_ms,
        })
    }
}
