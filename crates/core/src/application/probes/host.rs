// Host identity probes: uptime, distro and managed OS-info fields
//
// arch / hostname / uname / pstree on POSIX hosts are CommandTextProbe
// instances wired in the registry.

use std::sync::Arc;

use async_trait::async_trait;

use super::run_ok;
use crate::application::args::ProbeArgs;
use crate::application::probe::Probe;
use crate::domain::{Platform, ProbeResult};
use crate::error::Result;
use crate::port::command_runner::CommandRunner;
use crate::port::management_query::ManagementQuery;

/// `uptime <option>`, default "-p" for human-readable form.
pub struct PosixUptime {
    runner: Arc<dyn CommandRunner>,
}

impl PosixUptime {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for PosixUptime {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let option = args.str_or("option", "-p");
        let output = run_ok(self.runner.as_ref(), "uptime", &[option.as_str()]).await?;
        Ok(ProbeResult::text(output.trimmed_stdout()))
    }
}

/// Which OS-info field a managed strategy maps to.
#[derive(Debug, Clone, Copy)]
pub enum OsField {
    Arch,
    Hostname,
    Uname,
    Uptime,
}

/// Managed strategy for arch / hostname / uname / uptime: one field of the
/// management API's OS-info record, shaped like the POSIX command output.
pub struct ManagedOsField {
    query: Arc<dyn ManagementQuery>,
    field: OsField,
}

impl ManagedOsField {
    pub fn new(query: Arc<dyn ManagementQuery>, field: OsField) -> Self {
        Self { query, field }
    }
}

#[async_trait]
impl Probe for ManagedOsField {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        let info = self.query.os_info().await?;
        let value = match self.field {
            OsField::Arch => info.arch,
            OsField::Hostname => info.hostname,
            OsField::Uname => format!("{} {}", info.os_name, info.os_version),
            OsField::Uptime => info.uptime,
        };
        Ok(ProbeResult::Text(value))
    }
}

/// Detected distro identifier, upper-cased; boolean false when the platform
/// detection found none.
pub struct DistroProbe {
    platform: Platform,
}

impl DistroProbe {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl Probe for DistroProbe {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        match &self.platform.distro_id {
            Some(id) => Ok(ProbeResult::Text(id.to_uppercase())),
            None => Ok(ProbeResult::Bool(false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlatformKind;
    use crate::port::command_runner::mocks::ScriptedRunner;
    use crate::port::management_query::mocks::FixedManagementQuery;
    use serde_json::json;

    #[tokio::test]
    async fn test_uptime_default_option() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_stdout("uptime -p", "up 3 days, 4 hours\n");

        let result = PosixUptime::new(runner).run(&ProbeArgs::none()).await.unwrap();
        assert_eq!(result, ProbeResult::text("up 3 days, 4 hours"));
    }

    #[tokio::test]
    async fn test_uptime_custom_option() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_stdout("uptime -s", "2026-08-25 08:00:01\n");

        let result = PosixUptime::new(runner)
            .run(&ProbeArgs::new(json!({"option": "-s"})))
            .await
            .unwrap();
        assert_eq!(result, ProbeResult::text("2026-08-25 08:00:01"));
    }

    #[tokio::test]
    async fn test_managed_uname_joins_name_and_version() {
        let query = Arc::new(FixedManagementQuery::default());
        let result = ManagedOsField::new(query, OsField::Uname)
            .run(&ProbeArgs::none())
            .await
            .unwrap();
        assert_eq!(result, ProbeResult::text("Managed OS 10.0"));
    }

    #[tokio::test]
    async fn test_distro_known_and_unknown() {
        let known = DistroProbe::new(Platform::with_distro(PlatformKind::Ubuntu, "ubuntu"));
        assert_eq!(
            known.run(&ProbeArgs::none()).await.unwrap(),
            ProbeResult::text("UBUNTU")
        );

        let unknown = DistroProbe::new(Platform::new(PlatformKind::Unknown));
        assert_eq!(
            unknown.run(&ProbeArgs::none()).await.unwrap(),
            ProbeResult::Bool(false)
        );
    }
}
