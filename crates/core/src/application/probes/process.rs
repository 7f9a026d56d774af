// Process probes: top snapshot through the state root, and pstree

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::run_ok;
use crate::application::args::ProbeArgs;
use crate::application::probe::Probe;
use crate::domain::{ColumnSchema, HeaderSkip, ProbeResult, TableSpec};
use crate::error::Result;
use crate::port::command_runner::CommandRunner;
use crate::port::state_store::StateStore;

/// `top -b -n 1` process table: 12 fields. Headers end at the first blank
/// line, followed by one column-header line. The final field absorbs
/// command lines with embedded spaces.
pub const PROCESSES: TableSpec = TableSpec {
    schema: ColumnSchema::new(&[
        "pid", "user", "pr", "ni", "virt", "res", "shr", "s", "cpu", "mem", "time", "command",
    ]),
    skip: HeaderSkip::PastBlank { extra: 1 },
    stop_at_blank: false,
};

pub(crate) const SNAPSHOT_KEY: &str = "top-output";

/// Settle delay before reading the snapshot back, letting the write flush.
const SNAPSHOT_SETTLE: Duration = Duration::from_millis(25);

/// Process-table snapshot probe. Tool output goes through a scoped file
/// under the state root which is overwritten on every run, never
/// accumulated.
pub struct TopProbe {
    runner: Arc<dyn CommandRunner>,
    store: Arc<dyn StateStore>,
}

impl TopProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, store: Arc<dyn StateStore>) -> Self {
        Self { runner, store }
    }
}

#[async_trait]
impl Probe for TopProbe {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let output = run_ok(self.runner.as_ref(), "top", &["-b", "-n", "1"]).await?;

        self.store.write(SNAPSHOT_KEY, &output.stdout)?;
        tokio::time::sleep(SNAPSHOT_SETTLE).await;
        let text = self.store.read(SNAPSHOT_KEY)?.unwrap_or_default();

        if args.bool_or("parse", true) {
            Ok(ProbeResult::Table(PROCESSES.parse(&text)))
        } else {
            Ok(ProbeResult::text(text.trim()))
        }
    }
}

/// Process tree, POSIX only.
pub struct PstreeProbe {
    runner: Arc<dyn CommandRunner>,
}

impl PstreeProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for PstreeProbe {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        let output = run_ok(self.runner.as_ref(), "pstree", &[]).await?;
        Ok(ProbeResult::text(output.trimmed_stdout()))
    }
}
