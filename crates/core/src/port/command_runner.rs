// Command Runner Port - injected external-command execution capability

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Captured output of one external command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// None when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub duration_ms: i64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn trimmed_stdout(&self) -> &str {
        self.stdout.trim()
    }
}

/// Runner-level failures. A non-zero exit is NOT a runner error: exit codes
/// carry meaning for some probes (e.g. `yum check-update`), so they come
/// back inside `CommandOutput`.
#[derive(Error, Debug, Clone)]
pub enum RunnerError {
    #[error("failed to spawn '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("command '{program}' timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("io error while running '{program}': {reason}")]
    Io { program: String, reason: String },
}

/// Executes a command line and returns captured output/status.
///
/// Every invocation is bounded: `None` means "use the adapter's configured
/// default timeout", never "unbounded".
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, RunnerError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted runner keyed by the full command line ("program arg1 arg2").
    /// Unscripted command lines fail with SpawnFailed.
    #[derive(Default)]
    pub struct ScriptedRunner {
        responses: Mutex<HashMap<String, Result<CommandOutput, RunnerError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn script(&self, cmdline: &str, response: Result<CommandOutput, RunnerError>) {
            self.responses
                .lock()
                .unwrap()
                .insert(cmdline.to_string(), response);
        }

        /// Script a successful invocation producing `stdout`.
        pub fn script_stdout(&self, cmdline: &str, stdout: &str) {
            self.script_exit(cmdline, stdout, 0);
        }

        pub fn script_exit(&self, cmdline: &str, stdout: &str, exit_code: i32) {
            self.script(
                cmdline,
                Ok(CommandOutput {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code: Some(exit_code),
                    duration_ms: 1,
                }),
            );
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(
            &self,
            program: &str,
            args: &[&str],
            _timeout: Option<Duration>,
        ) -> Result<CommandOutput, RunnerError> {
            let mut cmdline = program.to_string();
            for arg in args {
                cmdline.push(' ');
                cmdline.push_str(arg);
            }
            self.calls.lock().unwrap().push(cmdline.clone());

            match self.responses.lock().unwrap().get(&cmdline) {
                Some(Ok(output)) => Ok(output.clone()),
                Some(Err(err)) => Err(err.clone()),
                None => Err(RunnerError::SpawnFailed {
                    program: program.to_string(),
                    reason: format!("not scripted: {cmdline}"),
                }),
            }
        }
    }
}
