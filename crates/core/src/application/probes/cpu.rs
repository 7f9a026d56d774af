// CPU probes: usage percentage, lscpu key/value info and load averages

use std::sync::Arc;

use async_trait::async_trait;

use super::run_ok;
use crate::application::args::ProbeArgs;
use crate::application::probe::Probe;
use crate::domain::ProbeResult;
use crate::error::{ProbeError, Result};
use crate::port::command_runner::CommandRunner;
use crate::port::management_query::ManagementQuery;

/// Parse the leading numeric prefix of a token like "12.5%us," or "12.5".
fn leading_number(token: &str) -> f64 {
    let digits: String = token
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().unwrap_or(0.0)
}

/// Sum user + system time from the last "Cpu(s)" summary line of a two-pass
/// batch `top` run. The second pass reflects actual utilization; the first
/// is a since-boot average.
pub(crate) fn parse_cpu_usage(top_output: &str) -> Result<f64> {
    let line = top_output
        .lines()
        .filter(|l| l.contains("Cpu(s)"))
        .next_back()
        .ok_or_else(|| ProbeError::Parse("no Cpu(s) line in top output".to_string()))?;

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let us = tokens.get(1).map(|t| leading_number(t)).unwrap_or(0.0);
    let sy = tokens.get(3).map(|t| leading_number(t)).unwrap_or(0.0);
    Ok(us + sy)
}

pub struct PosixCpuUsage {
    runner: Arc<dyn CommandRunner>,
}

impl PosixCpuUsage {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for PosixCpuUsage {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        let output = run_ok(
            self.runner.as_ref(),
            "top",
            &["-b", "-n", "2", "-d", "0.5"],
        )
        .await?;
        let pct = parse_cpu_usage(&output.stdout)?;
        Ok(ProbeResult::text(format!("{pct:.1}")))
    }
}

pub struct ManagedCpuUsage {
    query: Arc<dyn ManagementQuery>,
}

impl ManagedCpuUsage {
    pub fn new(query: Arc<dyn ManagementQuery>) -> Self {
        Self { query }
    }
}

#[async_trait]
impl Probe for ManagedCpuUsage {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        let pct = self.query.cpu_load_percent().await?;
        Ok(ProbeResult::text(format!("{pct:.1}")))
    }
}

/// `lscpu` key/value info, POSIX only.
pub struct CpuInfoProbe {
    runner: Arc<dyn CommandRunner>,
}

impl CpuInfoProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for CpuInfoProbe {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let output = run_ok(self.runner.as_ref(), "lscpu", &[]).await?;
        if !args.bool_or("parse", true) {
            return Ok(ProbeResult::text(output.trimmed_stdout()));
        }

        let fields = output
            .stdout
            .lines()
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                Some((
                    key.trim().to_string(),
                    ProbeResult::text(value.trim()),
                ))
            })
            .collect();
        Ok(ProbeResult::Record(fields))
    }
}

/// Load averages plus process counts and last PID from /proc/loadavg.
/// Fixed 5-token line; missing tokens default to "0.00" / 0.
pub struct LoadProbe {
    runner: Arc<dyn CommandRunner>,
}

impl LoadProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

pub(crate) fn parse_loadavg(text: &str) -> ProbeResult {
    let parts: Vec<&str> = text.split_whitespace().collect();

    let avg = |idx: usize| -> String {
        parts
            .get(idx)
            .and_then(|t| t.parse::<f64>().ok())
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "0.00".to_string())
    };
    let (curr, totl) = parts
        .get(3)
        .and_then(|t| t.split_once('/'))
        .map(|(c, t)| {
            (
                c.parse::<i64>().unwrap_or(0),
                t.parse::<i64>().unwrap_or(0),
            )
        })
        .unwrap_or((0, 0));
    let last_pid = parts
        .get(4)
        .and_then(|t| t.parse::<i64>().ok())
        .unwrap_or(0);

    ProbeResult::record(vec![
        ("1m", ProbeResult::Text(avg(0))),
        ("5m", ProbeResult::Text(avg(1))),
        ("15m", ProbeResult::Text(avg(2))),
        ("curr_proc", ProbeResult::Int(curr)),
        ("totl_proc", ProbeResult::Int(totl)),
        ("last_pid", ProbeResult::Int(last_pid)),
    ])
}

#[async_trait]
impl Probe for LoadProbe {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let output = run_ok(self.runner.as_ref(), "cat", &["/proc/loadavg"]).await?;
        if args.bool_or("parse", true) {
            Ok(parse_loadavg(&output.stdout))
        } else {
            Ok(ProbeResult::text(output.trimmed_stdout()))
        }
    }
}
