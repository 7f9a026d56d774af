// Probe implementations, grouped by telemetry area

pub mod cpu;
pub mod disk;
pub mod host;
pub mod identity;
pub mod maintenance;
pub mod memory;
pub mod network;
pub mod process;
pub mod raw;
pub mod session;

use std::sync::Arc;

use async_trait::async_trait;

use super::args::ProbeArgs;
use super::probe::Probe;
use crate::domain::ProbeResult;
use crate::error::{ProbeError, Result};
use crate::port::command_runner::{CommandOutput, CommandRunner};

/// Run a command through the injected runner, requiring a zero exit.
pub(crate) async fn run_ok(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput> {
    let output = runner.run(program, args, None).await?;
    expect_success(&output, program)?;
    Ok(output)
}

pub(crate) fn expect_success(output: &CommandOutput, program: &str) -> Result<()> {
    if output.success() {
        Ok(())
    } else {
        Err(ProbeError::CommandExit {
            program: program.to_string(),
            code: output.exit_code.unwrap_or(-1),
        })
    }
}

/// Probe that runs a fixed command line and returns trimmed stdout.
/// Covers arch, hostname, uname and pstree on POSIX hosts.
pub struct CommandTextProbe {
    runner: Arc<dyn CommandRunner>,
    program: &'static str,
    args: &'static [&'static str],
}

impl CommandTextProbe {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        program: &'static str,
        args: &'static [&'static str],
    ) -> Self {
        Self {
            runner,
            program,
            args,
        }
    }
}

#[async_trait]
impl Probe for CommandTextProbe {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        let output = run_ok(self.runner.as_ref(), self.program, self.args).await?;
        Ok(ProbeResult::text(output.trimmed_stdout()))
    }
}
