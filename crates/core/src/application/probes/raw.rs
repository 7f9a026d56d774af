// Raw command pass-through
//
// Deliberately NOT part of the default probe set: arbitrary command
// execution is an injection-grade capability, so the registry only exposes
// it behind an explicit opt-in (RegistryOptions::allow_raw_exec).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::application::args::ProbeArgs;
use crate::application::probe::Probe;
use crate::domain::ProbeResult;
use crate::error::Result;
use crate::port::command_runner::CommandRunner;

pub struct RawExecProbe {
    runner: Arc<dyn CommandRunner>,
}

impl RawExecProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for RawExecProbe {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let command = args.require_str("command")?;
        let argv = args.str_list("args");
        let argv_refs: Vec<&str> = argv.iter().map(String::as_str).collect();

        warn!(command = %command, "raw command pass-through invoked");
        let output = self.runner.run(command, &argv_refs, None).await?;

        Ok(ProbeResult::record(vec![
            (
                "exit_code",
                ProbeResult::Int(i64::from(output.exit_code.unwrap_or(-1))),
            ),
            ("stdout", ProbeResult::Text(output.stdout)),
            ("stderr", ProbeResult::Text(output.stderr)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::command_runner::mocks::ScriptedRunner;
    use serde_json::json;

    #[tokio::test]
    async fn test_raw_exec_reports_exit_and_streams() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_exit("ls -l /tmp", "total 0\n", 0);

        let probe = RawExecProbe::new(runner);
        let result = probe
            .run(&ProbeArgs::new(json!({"command": "ls", "args": ["-l", "/tmp"]})))
            .await
            .unwrap();

        assert_eq!(
            result,
            ProbeResult::record(vec![
                ("exit_code", ProbeResult::Int(0)),
                ("stdout", ProbeResult::text("total 0\n")),
                ("stderr", ProbeResult::text("")),
            ])
        );
    }

    #[tokio::test]
    async fn test_raw_exec_requires_command() {
        let probe = RawExecProbe::new(Arc::new(ScriptedRunner::new()));
        assert!(probe.run(&ProbeArgs::none()).await.is_err());
    }
}
