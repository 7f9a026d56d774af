// Maintenance probes: cache/swap reset, reboot, flag-gated update check
//
// These require root on the target host; failures surface as probe errors
// and are never fatal to the process.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{expect_success, run_ok};
use crate::application::args::ProbeArgs;
use crate::application::probe::Probe;
use crate::application::rate_gate::RateGate;
use crate::domain::{PlatformKind, ProbeResult};
use crate::error::{ProbeError, Result};
use crate::port::command_runner::CommandRunner;
use crate::port::management_query::ManagementQuery;

pub struct DropCacheProbe {
    runner: Arc<dyn CommandRunner>,
}

impl DropCacheProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for DropCacheProbe {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        // Redirection into the sysctl file needs a shell.
        run_ok(
            self.runner.as_ref(),
            "sh",
            &["-c", "echo 1 > /proc/sys/vm/drop_caches"],
        )
        .await?;
        Ok(ProbeResult::Bool(true))
    }
}

pub struct ClearSwapProbe {
    runner: Arc<dyn CommandRunner>,
}

impl ClearSwapProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for ClearSwapProbe {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        run_ok(self.runner.as_ref(), "swapoff", &["-a"]).await?;
        run_ok(self.runner.as_ref(), "swapon", &["-a"]).await?;
        Ok(ProbeResult::Bool(true))
    }
}

const RESTART_SCRIPT_NAME: &str = "reboot.sh";
const RESTART_SCRIPT: &str = "#!/bin/bash\n/sbin/shutdown -r now\n";

/// Reboot via a restart script materialized once under the state root.
pub struct RebootProbe {
    runner: Arc<dyn CommandRunner>,
    store: Arc<dyn crate::port::state_store::StateStore>,
}

impl RebootProbe {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        store: Arc<dyn crate::port::state_store::StateStore>,
    ) -> Self {
        Self { runner, store }
    }
}

#[async_trait]
impl Probe for RebootProbe {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        let script = self.store.ensure_script(RESTART_SCRIPT_NAME, RESTART_SCRIPT)?;
        let script = script.to_string_lossy().into_owned();
        warn!(script = %script, "reboot requested");
        // Shutdown may tear the process down before the command returns
        // cleanly, so the exit status is not inspected.
        self.runner.run(&script, &[], None).await?;
        Ok(ProbeResult::Bool(true))
    }
}

pub(crate) const UPDATES_FLAG: &str = "check-updates";

/// Count upgraded + newly-installed packages from an apt dist-upgrade
/// simulation summary line, e.g.
/// "5 upgraded, 3 newly installed, 0 to remove and 2 not upgraded."
pub(crate) fn parse_apt_upgrades(text: &str) -> u64 {
    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let is_summary = tokens
            .get(1)
            .map(|t| t.starts_with("upgraded"))
            .unwrap_or(false)
            && line.contains("newly");
        if !is_summary {
            continue;
        }

        let upgraded: u64 = tokens[0].parse().unwrap_or(0);
        let newly: u64 = tokens
            .iter()
            .position(|t| *t == "newly")
            .and_then(|idx| idx.checked_sub(1))
            .and_then(|idx| tokens[idx].parse().ok())
            .unwrap_or(0);
        return upgraded + newly;
    }
    0
}

/// Update-availability probe, gated by a trigger flag.
///
/// Without the flag the probe returns the "-1" sentinel. With it, the
/// platform-specific check runs exactly once and the flag is consumed;
/// subsequent calls revert to the sentinel until externally re-armed.
pub struct UpdatesProbe {
    gate: RateGate,
    runner: Arc<dyn CommandRunner>,
    query: Option<Arc<dyn ManagementQuery>>,
    kind: PlatformKind,
}

impl UpdatesProbe {
    pub fn new(
        gate: RateGate,
        runner: Arc<dyn CommandRunner>,
        query: Option<Arc<dyn ManagementQuery>>,
        kind: PlatformKind,
    ) -> Self {
        Self {
            gate,
            runner,
            query,
            kind,
        }
    }

    async fn check(&self) -> Result<&'static str> {
        match self.kind {
            PlatformKind::Ubuntu => {
                let output = run_ok(
                    self.runner.as_ref(),
                    "apt-get",
                    &["-s", "dist-upgrade"],
                )
                .await?;
                Ok(if parse_apt_upgrades(&output.stdout) > 0 {
                    "1"
                } else {
                    "0"
                })
            }
            PlatformKind::Centos => {
                // yum exit code 100 means updates are available.
                let output = self
                    .runner
                    .run("yum", &["check-update"], None)
                    .await?;
                match output.exit_code {
                    Some(100) => Ok("1"),
                    Some(0) => Ok("0"),
                    _ => {
                        expect_success(&output, "yum")?;
                        Ok("0")
                    }
                }
            }
            PlatformKind::ManagedOs => {
                let query = self.query.as_ref().ok_or_else(|| {
                    ProbeError::Config("management interface not wired".to_string())
                })?;
                let pending = query.pending_updates().await?;
                Ok(if pending > 0 { "1" } else { "0" })
            }
            // No package-manager strategy for generic/unknown hosts.
            _ => Ok("-1"),
        }
    }
}

#[async_trait]
impl Probe for UpdatesProbe {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        if !self.gate.consume()? {
            return Ok(ProbeResult::text("-1"));
        }
        let verdict = self.check().await?;
        info!(verdict = %verdict, "update check executed");
        Ok(ProbeResult::text(verdict))
    }
}
