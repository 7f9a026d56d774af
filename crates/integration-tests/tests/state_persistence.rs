//! Persisted-state properties across process "restarts": a restart is
//! modeled as rebuilding the whole registry over the same state root.

use std::sync::Arc;

use tempfile::TempDir;

use hostprobe_core::application::{
    build_default_registry, names, BatchSpec, Capabilities, Dispatcher, RegistryOptions,
};
use hostprobe_core::domain::{Platform, PlatformKind};
use hostprobe_core::port::command_runner::mocks::ScriptedRunner;
use hostprobe_core::port::token_provider::RandTokenProvider;
use hostprobe_infra_system::FsStateStore;

const APT_NO_UPDATES: &str =
    "0 upgraded, 0 newly installed, 0 to remove and 0 not upgraded.\n";

fn fresh_agent(state_root: &std::path::Path) -> (Arc<ScriptedRunner>, Dispatcher) {
    let runner = Arc::new(ScriptedRunner::new());
    let registry = build_default_registry(
        Platform::with_distro(PlatformKind::Ubuntu, "ubuntu"),
        Capabilities {
            runner: runner.clone(),
            query: None,
            store: Arc::new(FsStateStore::new(state_root).unwrap()),
            tokens: Arc::new(RandTokenProvider),
        },
        RegistryOptions::default(),
    )
    .unwrap();
    (runner, Dispatcher::new(Arc::new(registry)))
}

async fn machine_id(dispatcher: &Dispatcher) -> String {
    let report = dispatcher
        .invoke_batch(&[BatchSpec::bare(names::MACHINE_ID)])
        .await;
    let value = serde_json::to_value(&report).unwrap();
    value["machine_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_machine_identity_survives_restart() {
    let dir = TempDir::new().unwrap();

    // First run: host identifier files unreadable, a random token is
    // generated and persisted.
    let (_runner, dispatcher) = fresh_agent(dir.path());
    let first = machine_id(&dispatcher).await;
    assert_eq!(first.len(), 40);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit()));

    // Within the same run the value is read-through cached.
    assert_eq!(machine_id(&dispatcher).await, first);

    // "Restart": a fresh registry over the same state root reads the
    // persisted identity and never regenerates it.
    let (_runner, restarted) = fresh_agent(dir.path());
    assert_eq!(machine_id(&restarted).await, first);

    let on_disk = std::fs::read_to_string(dir.path().join("machine-id")).unwrap();
    assert_eq!(on_disk.trim(), first);
}

#[tokio::test]
async fn test_machine_identity_prefers_host_identifier() {
    let dir = TempDir::new().unwrap();
    let (runner, dispatcher) = fresh_agent(dir.path());
    runner.script_stdout(
        "cat /var/lib/dbus/machine-id",
        "0123456789abcdef0123456789abcdef\n",
    );

    assert_eq!(
        machine_id(&dispatcher).await,
        "0123456789abcdef0123456789abcdef"
    );
}

async fn system_updates(dispatcher: &Dispatcher) -> String {
    let report = dispatcher
        .invoke_batch(&[BatchSpec::bare(names::SYSTEM_UPDATES)])
        .await;
    let value = serde_json::to_value(&report).unwrap();
    value["system_updates"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_update_gate_cycle_over_flag_file() {
    let dir = TempDir::new().unwrap();
    let (runner, dispatcher) = fresh_agent(dir.path());
    runner.script_stdout("apt-get -s dist-upgrade", APT_NO_UPDATES);

    // Unarmed gate: sentinel, the check never runs.
    assert_eq!(system_updates(&dispatcher).await, "-1");
    assert!(runner.calls().is_empty());

    // External trigger arms the gate through the shared state root.
    std::fs::write(dir.path().join("check-updates"), "").unwrap();
    assert_eq!(system_updates(&dispatcher).await, "0");
    assert!(!dir.path().join("check-updates").exists());

    // The flag was consumed; immediate re-poll reverts to the sentinel.
    assert_eq!(system_updates(&dispatcher).await, "-1");
}

#[tokio::test]
async fn test_update_gate_survives_restart_while_armed() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("check-updates"), "").unwrap();

    let (runner, dispatcher) = fresh_agent(dir.path());
    runner.script_stdout("apt-get -s dist-upgrade", APT_NO_UPDATES);
    assert_eq!(system_updates(&dispatcher).await, "0");
}
