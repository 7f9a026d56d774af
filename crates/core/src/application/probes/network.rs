// Network probes: connection table and TCP ping

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use super::run_ok;
use crate::application::args::ProbeArgs;
use crate::application::probe::Probe;
use crate::domain::{ColumnSchema, HeaderSkip, ProbeResult, TableSpec};
use crate::error::Result;
use crate::port::command_runner::CommandRunner;

/// `netstat -pant` table: 8 fields, two header lines. The final field
/// absorbs process names containing spaces.
pub const CONNECTIONS: TableSpec = TableSpec {
    schema: ColumnSchema::new(&[
        "proto",
        "recv_q",
        "send_q",
        "local_address",
        "foreign_address",
        "state",
        "pid_program",
        "process_name",
    ]),
    skip: HeaderSkip::Lines(2),
    stop_at_blank: false,
};

pub struct NetstatProbe {
    runner: Arc<dyn CommandRunner>,
}

impl NetstatProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for NetstatProbe {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let output = run_ok(self.runner.as_ref(), "netstat", &["-pant"]).await?;
        if args.bool_or("parse", true) {
            Ok(ProbeResult::Table(CONNECTIONS.parse(&output.stdout)))
        } else {
            Ok(ProbeResult::text(output.trimmed_stdout()))
        }
    }
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP connect latency probe. The only network operation is a single
/// outbound connect capped at 5 seconds; any failure maps to the -1
/// sentinel rather than an error.
pub struct PingProbe;

#[async_trait]
impl Probe for PingProbe {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let host = args.require_str("host")?;
        let port = args.u16_or("port", 80);

        let started = Instant::now();
        match timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => {
                drop(stream);
                let ms = started.elapsed().as_secs_f64() * 1000.0;
                Ok(ProbeResult::Float((ms * 100.0).round() / 100.0))
            }
            Ok(Err(e)) => {
                debug!(host = %host, port = %port, error = %e, "tcp ping failed");
                Ok(ProbeResult::Float(-1.0))
            }
            Err(_) => {
                debug!(host = %host, port = %port, "tcp ping timed out");
                Ok(ProbeResult::Float(-1.0))
            }
        }
    }
}
