// Probe Registry - typed name -> strategy table, resolved once per process
//
// Replaces dynamic dispatch by method-name string with compile-time-checked
// probe implementations, while preserving the batch-by-name calling
// convention at the dispatch boundary.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::probe::Probe;
use super::probes;
use super::probes::host::OsField;
use super::rate_gate::RateGate;
use crate::domain::{Platform, PlatformKind};
use crate::error::{ProbeError, Result};
use crate::port::command_runner::CommandRunner;
use crate::port::management_query::ManagementQuery;
use crate::port::state_store::StateStore;
use crate::port::token_provider::TokenProvider;

/// Probe names, the stable external calling convention.
pub mod names {
    pub const MEMORY_STATS: &str = "memory_stats";
    pub const MEMORY_TOTAL: &str = "memory_total";
    pub const DISK_SPACE: &str = "disk_space";
    pub const TOTAL_DISK_SPACE: &str = "total_disk_space";
    pub const CPU_USAGE: &str = "cpu_usage";
    pub const CPU_INFO: &str = "cpu_info";
    pub const MACHINE_ID: &str = "machine_id";
    pub const NETSTAT: &str = "netstat";
    pub const ARCH: &str = "arch";
    pub const HOSTNAME: &str = "hostname";
    pub const UNAME: &str = "uname";
    pub const PSTREE: &str = "pstree";
    pub const LOGINS: &str = "logins";
    pub const TOP: &str = "top";
    pub const LOAD: &str = "load";
    pub const DISKS: &str = "disks";
    pub const UPTIME: &str = "uptime";
    pub const PING: &str = "ping";
    pub const DISTRO: &str = "distro";
    pub const DROP_CACHE: &str = "drop_cache";
    pub const CLEAR_SWAP: &str = "clear_swap";
    pub const REBOOT: &str = "reboot";
    pub const SYSTEM_UPDATES: &str = "system_updates";
    pub const RAW_EXEC: &str = "raw_exec";
}

/// Injected external capabilities shared by the probe strategies.
#[derive(Clone)]
pub struct Capabilities {
    pub runner: Arc<dyn CommandRunner>,
    /// Required only when the detected platform is the managed OS.
    pub query: Option<Arc<dyn ManagementQuery>>,
    pub store: Arc<dyn StateStore>,
    pub tokens: Arc<dyn TokenProvider>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryOptions {
    /// Expose the raw command pass-through. Off by default.
    pub allow_raw_exec: bool,
}

pub struct RegistryBuilder {
    platform: Platform,
    probes: HashMap<&'static str, Arc<dyn Probe>>,
    known: HashSet<&'static str>,
}

impl RegistryBuilder {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            probes: HashMap::new(),
            known: HashSet::new(),
        }
    }

    /// Register `probe` for `name` on the given platform kinds. The strategy
    /// is bound here, against the process-wide detected kind; lookups never
    /// re-check the platform.
    pub fn register(
        &mut self,
        name: &'static str,
        kinds: &[PlatformKind],
        probe: Arc<dyn Probe>,
    ) -> &mut Self {
        self.known.insert(name);
        if kinds.contains(&self.platform.kind) {
            self.probes.entry(name).or_insert(probe);
        }
        self
    }

    pub fn build(self) -> ProbeRegistry {
        debug!(
            platform = %self.platform.kind,
            probes = self.probes.len(),
            "probe registry built"
        );
        ProbeRegistry {
            platform: self.platform,
            probes: self.probes,
            known: self.known,
        }
    }
}

/// Maps probe name to the strategy selected for the detected platform.
pub struct ProbeRegistry {
    platform: Platform,
    probes: HashMap<&'static str, Arc<dyn Probe>>,
    known: HashSet<&'static str>,
}

impl std::fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("platform", &self.platform)
            .field("probes", &self.probes.keys().collect::<Vec<_>>())
            .field("known", &self.known)
            .finish()
    }
}

impl ProbeRegistry {
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Probe>> {
        if let Some(probe) = self.probes.get(name) {
            return Ok(probe.clone());
        }
        if self.known.contains(name) {
            Err(ProbeError::UnsupportedPlatform {
                probe: name.to_string(),
                platform: self.platform.kind,
            })
        } else {
            Err(ProbeError::UnknownProbe(name.to_string()))
        }
    }

    /// Names resolvable on this platform, sorted for stable output.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.probes.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Wire the full default probe set against the detected platform.
pub fn build_default_registry(
    platform: Platform,
    caps: Capabilities,
    options: RegistryOptions,
) -> Result<ProbeRegistry> {
    if platform.kind == PlatformKind::ManagedOs && caps.query.is_none() {
        return Err(ProbeError::Config(
            "managed platform requires a ManagementQuery adapter".to_string(),
        ));
    }

    let runner = &caps.runner;
    let mut builder = RegistryBuilder::new(platform.clone());

    builder
        .register(
            names::MEMORY_STATS,
            PlatformKind::POSIX,
            Arc::new(probes::memory::PosixMemoryStats::new(runner.clone())),
        )
        .register(
            names::MEMORY_TOTAL,
            PlatformKind::POSIX,
            Arc::new(probes::memory::PosixMemoryTotal::new(runner.clone())),
        )
        .register(
            names::DISK_SPACE,
            PlatformKind::POSIX,
            Arc::new(probes::disk::PosixDiskSpace::new(runner.clone())),
        )
        .register(
            names::TOTAL_DISK_SPACE,
            PlatformKind::POSIX,
            Arc::new(probes::disk::PosixTotalDiskSpace::new(runner.clone())),
        )
        .register(
            names::CPU_USAGE,
            PlatformKind::POSIX,
            Arc::new(probes::cpu::PosixCpuUsage::new(runner.clone())),
        )
        .register(
            names::CPU_INFO,
            PlatformKind::POSIX,
            Arc::new(probes::cpu::CpuInfoProbe::new(runner.clone())),
        )
        .register(
            names::NETSTAT,
            PlatformKind::POSIX,
            Arc::new(probes::network::NetstatProbe::new(runner.clone())),
        )
        .register(
            names::ARCH,
            PlatformKind::POSIX,
            Arc::new(probes::CommandTextProbe::new(runner.clone(), "arch", &[])),
        )
        .register(
            names::HOSTNAME,
            PlatformKind::POSIX,
            Arc::new(probes::CommandTextProbe::new(
                runner.clone(),
                "hostname",
                &[],
            )),
        )
        .register(
            names::UNAME,
            PlatformKind::POSIX,
            Arc::new(probes::CommandTextProbe::new(
                runner.clone(),
                "uname",
                &["-rs"],
            )),
        )
        .register(
            names::PSTREE,
            PlatformKind::POSIX,
            Arc::new(probes::CommandTextProbe::new(runner.clone(), "pstree", &[])),
        )
        .register(
            names::LOGINS,
            PlatformKind::POSIX,
            Arc::new(probes::session::LoginsProbe::new(runner.clone())),
        )
        .register(
            names::TOP,
            PlatformKind::POSIX,
            Arc::new(probes::process::TopProbe::new(
                runner.clone(),
                caps.store.clone(),
            )),
        )
        .register(
            names::LOAD,
            PlatformKind::POSIX,
            Arc::new(probes::cpu::LoadProbe::new(runner.clone())),
        )
        .register(
            names::DISKS,
            PlatformKind::POSIX,
            Arc::new(probes::disk::DisksProbe::new(runner.clone())),
        )
        .register(
            names::UPTIME,
            PlatformKind::POSIX,
            Arc::new(probes::host::PosixUptime::new(runner.clone())),
        )
        .register(
            names::DROP_CACHE,
            PlatformKind::POSIX,
            Arc::new(probes::maintenance::DropCacheProbe::new(runner.clone())),
        )
        .register(
            names::CLEAR_SWAP,
            PlatformKind::POSIX,
            Arc::new(probes::maintenance::ClearSwapProbe::new(runner.clone())),
        )
        .register(
            names::REBOOT,
            PlatformKind::POSIX,
            Arc::new(probes::maintenance::RebootProbe::new(
                runner.clone(),
                caps.store.clone(),
            )),
        );

    if let Some(query) = &caps.query {
        builder
            .register(
                names::MEMORY_STATS,
                PlatformKind::MANAGED,
                Arc::new(probes::memory::ManagedMemoryStats::new(query.clone())),
            )
            .register(
                names::MEMORY_TOTAL,
                PlatformKind::MANAGED,
                Arc::new(probes::memory::ManagedMemoryTotal::new(query.clone())),
            )
            .register(
                names::DISK_SPACE,
                PlatformKind::MANAGED,
                Arc::new(probes::disk::ManagedDiskSpace::new(query.clone())),
            )
            .register(
                names::TOTAL_DISK_SPACE,
                PlatformKind::MANAGED,
                Arc::new(probes::disk::ManagedTotalDiskSpace::new(query.clone())),
            )
            .register(
                names::CPU_USAGE,
                PlatformKind::MANAGED,
                Arc::new(probes::cpu::ManagedCpuUsage::new(query.clone())),
            )
            .register(
                names::ARCH,
                PlatformKind::MANAGED,
                Arc::new(probes::host::ManagedOsField::new(
                    query.clone(),
                    OsField::Arch,
                )),
            )
            .register(
                names::HOSTNAME,
                PlatformKind::MANAGED,
                Arc::new(probes::host::ManagedOsField::new(
                    query.clone(),
                    OsField::Hostname,
                )),
            )
            .register(
                names::UNAME,
                PlatformKind::MANAGED,
                Arc::new(probes::host::ManagedOsField::new(
                    query.clone(),
                    OsField::Uname,
                )),
            )
            .register(
                names::UPTIME,
                PlatformKind::MANAGED,
                Arc::new(probes::host::ManagedOsField::new(
                    query.clone(),
                    OsField::Uptime,
                )),
            );
    }

    // Platform-agnostic probes.
    builder
        .register(
            names::MACHINE_ID,
            PlatformKind::ALL,
            Arc::new(probes::identity::MachineIdProbe::new(
                caps.store.clone(),
                runner.clone(),
                caps.tokens.clone(),
                platform.kind.is_posix(),
            )),
        )
        .register(names::PING, PlatformKind::ALL, Arc::new(probes::network::PingProbe))
        .register(
            names::DISTRO,
            PlatformKind::ALL,
            Arc::new(probes::host::DistroProbe::new(platform.clone())),
        )
        .register(
            names::SYSTEM_UPDATES,
            PlatformKind::ALL,
            Arc::new(probes::maintenance::UpdatesProbe::new(
                RateGate::new(caps.store.clone(), probes::maintenance::UPDATES_FLAG),
                runner.clone(),
                caps.query.clone(),
                platform.kind,
            )),
        );

    if options.allow_raw_exec {
        builder.register(
            names::RAW_EXEC,
            PlatformKind::ALL,
            Arc::new(probes::raw::RawExecProbe::new(runner.clone())),
        );
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::command_runner::mocks::ScriptedRunner;
    use crate::port::management_query::mocks::FixedManagementQuery;
    use crate::port::state_store::mocks::MemoryStateStore;
    use crate::port::token_provider::mocks::FixedTokenProvider;

    fn caps(query: Option<Arc<dyn ManagementQuery>>) -> Capabilities {
        Capabilities {
            runner: Arc::new(ScriptedRunner::new()),
            query,
            store: Arc::new(MemoryStateStore::new()),
            tokens: Arc::new(FixedTokenProvider("00".repeat(20))),
        }
    }

    #[test]
    fn test_unknown_probe() {
        let registry = build_default_registry(
            Platform::new(PlatformKind::Ubuntu),
            caps(None),
            RegistryOptions::default(),
        )
        .unwrap();
        assert!(matches!(
            registry.resolve("no_such_probe"),
            Err(ProbeError::UnknownProbe(_))
        ));
    }

    #[test]
    fn test_posix_only_probe_unsupported_on_managed() {
        let registry = build_default_registry(
            Platform::new(PlatformKind::ManagedOs),
            caps(Some(Arc::new(FixedManagementQuery::default()))),
            RegistryOptions::default(),
        )
        .unwrap();
        assert!(registry.resolve(names::MEMORY_STATS).is_ok());
        assert!(matches!(
            registry.resolve(names::NETSTAT),
            Err(ProbeError::UnsupportedPlatform { .. })
        ));
    }

    #[test]
    fn test_managed_platform_requires_query_adapter() {
        let err = build_default_registry(
            Platform::new(PlatformKind::ManagedOs),
            caps(None),
            RegistryOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }

    #[test]
    fn test_raw_exec_is_opt_in() {
        let default = build_default_registry(
            Platform::new(PlatformKind::Ubuntu),
            caps(None),
            RegistryOptions::default(),
        )
        .unwrap();
        assert!(matches!(
            default.resolve(names::RAW_EXEC),
            Err(ProbeError::UnknownProbe(_))
        ));

        let opted_in = build_default_registry(
            Platform::new(PlatformKind::Ubuntu),
            caps(None),
            RegistryOptions {
                allow_raw_exec: true,
            },
        )
        .unwrap();
        assert!(opted_in.resolve(names::RAW_EXEC).is_ok());
    }

    #[test]
    fn test_posix_registry_covers_full_default_surface() {
        let registry = build_default_registry(
            Platform::new(PlatformKind::Centos),
            caps(None),
            RegistryOptions::default(),
        )
        .unwrap();
        for name in [
            names::MEMORY_STATS,
            names::MEMORY_TOTAL,
            names::DISK_SPACE,
            names::TOTAL_DISK_SPACE,
            names::CPU_USAGE,
            names::MACHINE_ID,
            names::NETSTAT,
            names::ARCH,
            names::HOSTNAME,
            names::UNAME,
            names::PSTREE,
            names::LOGINS,
            names::TOP,
            names::LOAD,
            names::DISKS,
            names::UPTIME,
            names::PING,
            names::DISTRO,
            names::DROP_CACHE,
            names::CLEAR_SWAP,
            names::REBOOT,
            names::SYSTEM_UPDATES,
        ] {
            assert!(registry.resolve(name).is_ok(), "missing probe: {name}");
        }
    }
}
