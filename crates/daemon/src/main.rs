//! Hostprobe Agent - Main Entry Point
//! One-shot telemetry collection: wires the adapters, runs a probe batch,
//! prints the report as JSON on stdout.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import workspace crates
use hostprobe_core::application::{
    build_default_registry, names, BatchSpec, Capabilities, Dispatcher, RegistryOptions,
};
use hostprobe_core::port::token_provider::RandTokenProvider;
use hostprobe_infra_system::{detect_platform, FsStateStore, SubprocessRunner};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_STATE_ROOT: &str = "~/.hostprobe";

/// Probes collected when no names are passed on the command line.
const DEFAULT_BATCH: &[&str] = &[
    names::MACHINE_ID,
    names::HOSTNAME,
    names::UNAME,
    names::ARCH,
    names::DISTRO,
    names::UPTIME,
    names::LOAD,
    names::CPU_USAGE,
    names::MEMORY_STATS,
    names::MEMORY_TOTAL,
    names::DISK_SPACE,
    names::TOTAL_DISK_SPACE,
];

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("HOSTPROBE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("hostprobe=info"))
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            // Development: pretty formatting, kept off stdout so the report
            // stays machine-readable
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    info!("Hostprobe Agent v{} starting...", VERSION);

    // 2. Load configuration
    let state_root = std::env::var("HOSTPROBE_STATE_ROOT")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_STATE_ROOT).into_owned());

    let cmd_timeout = std::env::var("HOSTPROBE_CMD_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis);

    let allow_raw_exec = std::env::var("HOSTPROBE_ALLOW_RAW_EXEC")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    // 3. Detect platform (once, immutable for the process)
    let platform = detect_platform();
    info!(platform = %platform.kind, state_root = %state_root, "platform resolved");

    // 4. Setup dependencies (DI wiring)
    let runner = Arc::new(SubprocessRunner::new(
        vec!["PATH".to_string(), "HOME".to_string(), "LANG".to_string()],
        cmd_timeout,
    ));
    let store = Arc::new(FsStateStore::new(&state_root).context("state root unavailable")?);
    let tokens = Arc::new(RandTokenProvider);

    // A managed-OS query adapter is supplied at integration time; this agent
    // binary only ships the POSIX wiring.
    let registry = build_default_registry(
        platform,
        Capabilities {
            runner,
            query: None,
            store,
            tokens,
        },
        RegistryOptions { allow_raw_exec },
    )
    .context("probe registry wiring failed")?;
    let dispatcher = Dispatcher::new(Arc::new(registry));

    // 5. Build the batch: probe names from argv, or the default set
    let requested: Vec<String> = std::env::args().skip(1).collect();
    let specs: Vec<BatchSpec> = if requested.is_empty() {
        DEFAULT_BATCH.iter().copied().map(BatchSpec::bare).collect()
    } else {
        requested.into_iter().map(BatchSpec::bare).collect()
    };

    // 6. Collect and report
    info!(probes = specs.len(), "collecting telemetry batch");
    let report = dispatcher.invoke_batch(&specs).await;
    if report.failed_count() > 0 {
        tracing::warn!(
            failed = report.failed_count(),
            total = report.entries.len(),
            "batch completed with failures"
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
