// Machine identity: created at most once per state root, then immutable

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::application::args::ProbeArgs;
use crate::application::probe::Probe;
use crate::domain::ProbeResult;
use crate::error::Result;
use crate::port::command_runner::CommandRunner;
use crate::port::state_store::StateStore;
use crate::port::token_provider::TokenProvider;

pub(crate) const MACHINE_ID_KEY: &str = "machine-id";

/// Host-provided stable identifier files, tried in order before generating
/// a random token.
const HOST_ID_SOURCES: &[&str] = &["/var/lib/dbus/machine-id", "/etc/machine-id"];

/// Stable per-host token probe.
///
/// Resolution order: persisted value under the state root, then a
/// platform-provided identifier file, then a generated random 40-hex token.
/// The value is persisted before first return and read-through cached;
/// concurrent first-time callers may race on the write, but whole-file
/// replacement keeps the stored value self-consistent.
pub struct MachineIdProbe {
    store: Arc<dyn StateStore>,
    runner: Arc<dyn CommandRunner>,
    tokens: Arc<dyn TokenProvider>,
    read_host_files: bool,
    cached: OnceLock<String>,
}

impl MachineIdProbe {
    pub fn new(
        store: Arc<dyn StateStore>,
        runner: Arc<dyn CommandRunner>,
        tokens: Arc<dyn TokenProvider>,
        read_host_files: bool,
    ) -> Self {
        Self {
            store,
            runner,
            tokens,
            read_host_files,
            cached: OnceLock::new(),
        }
    }

    async fn host_identifier(&self) -> Option<String> {
        for source in HOST_ID_SOURCES {
            match self.runner.run("cat", &[source], None).await {
                Ok(output) if output.success() => {
                    let id = output.trimmed_stdout().to_string();
                    if !id.is_empty() {
                        debug!(source = %source, "machine id derived from host file");
                        return Some(id);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn remember(&self, id: String) -> ProbeResult {
        let _ = self.cached.set(id.clone());
        ProbeResult::Text(id)
    }
}

#[async_trait]
impl Probe for MachineIdProbe {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        if let Some(id) = self.cached.get() {
            return Ok(ProbeResult::Text(id.clone()));
        }

        if let Some(stored) = self.store.read(MACHINE_ID_KEY)? {
            let stored = stored.trim().to_string();
            if !stored.is_empty() {
                return Ok(self.remember(stored));
            }
        }

        let id = if self.read_host_files {
            self.host_identifier().await
        } else {
            None
        };
        let id = match id {
            Some(id) => id,
            None => {
                let generated = self.tokens.generate();
                info!("generated new machine identity");
                generated
            }
        };

        self.store.write(MACHINE_ID_KEY, &id)?;
        Ok(self.remember(id))
    }
}
