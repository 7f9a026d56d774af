// Memory probes: usage percentages and total, POSIX + managed strategies

use std::sync::Arc;

use async_trait::async_trait;

use super::run_ok;
use crate::application::args::ProbeArgs;
use crate::application::probe::Probe;
use crate::domain::ProbeResult;
use crate::error::{ProbeError, Result};
use crate::port::command_runner::CommandRunner;
use crate::port::management_query::ManagementQuery;

/// Parsed /proc/meminfo sample, all values in kB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MemSample {
    pub total: u64,
    pub free: u64,
    pub buffers: u64,
    pub cached: u64,
}

pub(crate) fn parse_meminfo(text: &str) -> MemSample {
    let mut sample = MemSample::default();
    for line in text.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = rest
            .split_whitespace()
            .next()
            .and_then(|t| t.parse::<u64>().ok())
            .unwrap_or(0);
        match key.trim() {
            "MemTotal" => sample.total = value,
            "MemFree" => sample.free = value,
            "Buffers" => sample.buffers = value,
            "Cached" => sample.cached = value,
            _ => {}
        }
    }
    sample
}

/// Derive {used, cache, free} integer percentages, rounded half-up.
///
///   used  = round((total - (buffers + cache + free)) * 100 / total)
///   cache = round((cache + buffers) * 100 / total)
///   free  = round(free * 100 / total)
pub(crate) fn percent_record(sample: MemSample) -> Result<ProbeResult> {
    if sample.total == 0 {
        return Err(ProbeError::Parse(
            "memory sample reports zero total".to_string(),
        ));
    }
    let total = sample.total as f64;
    let pct = |n: i64| ((n as f64) * 100.0 / total).round() as i64;

    let used = sample.total as i64 - (sample.buffers + sample.cached + sample.free) as i64;
    Ok(ProbeResult::record(vec![
        ("used", ProbeResult::Int(pct(used))),
        (
            "cache",
            ProbeResult::Int(pct((sample.cached + sample.buffers) as i64)),
        ),
        ("free", ProbeResult::Int(pct(sample.free as i64))),
    ]))
}

async fn posix_sample(runner: &dyn CommandRunner) -> Result<MemSample> {
    let output = run_ok(runner, "cat", &["/proc/meminfo"]).await?;
    Ok(parse_meminfo(&output.stdout))
}

pub struct PosixMemoryStats {
    runner: Arc<dyn CommandRunner>,
}

impl PosixMemoryStats {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for PosixMemoryStats {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        percent_record(posix_sample(self.runner.as_ref()).await?)
    }
}

pub struct ManagedMemoryStats {
    query: Arc<dyn ManagementQuery>,
}

impl ManagedMemoryStats {
    pub fn new(query: Arc<dyn ManagementQuery>) -> Self {
        Self { query }
    }
}

#[async_trait]
impl Probe for ManagedMemoryStats {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        let mem = self.query.memory().await?;
        // The management API reports no separate buffer pool.
        percent_record(MemSample {
            total: mem.total_kb,
            free: mem.free_kb,
            buffers: 0,
            cached: mem.cache_kb,
        })
    }
}

pub struct PosixMemoryTotal {
    runner: Arc<dyn CommandRunner>,
}

impl PosixMemoryTotal {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for PosixMemoryTotal {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        let sample = posix_sample(self.runner.as_ref()).await?;
        Ok(ProbeResult::Int(sample.total as i64))
    }
}

pub struct ManagedMemoryTotal {
    query: Arc<dyn ManagementQuery>,
}

impl ManagedMemoryTotal {
    pub fn new(query: Arc<dyn ManagementQuery>) -> Self {
        Self { query }
    }
}

#[async_trait]
impl Probe for ManagedMemoryTotal {
    async fn run(&self, _args: &ProbeArgs) -> Result<ProbeResult> {
        let mem = self.query.memory().await?;
        Ok(ProbeResult::Int(mem.total_kb as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::command_runner::mocks::ScriptedRunner;

    const MEMINFO_FIXTURE: &str = "\
MemTotal:        1000000 kB
MemFree:          200000 kB
MemAvailable:     350000 kB
Buffers:           50000 kB
Cached:           150000 kB
SwapCached:            0 kB
";

    #[test]
    fn test_parse_meminfo() {
        let sample = parse_meminfo(MEMINFO_FIXTURE);
        assert_eq!(
            sample,
            MemSample {
                total: 1_000_000,
                free: 200_000,
                buffers: 50_000,
                cached: 150_000,
            }
        );
    }

    #[test]
    fn test_percentages_sum_to_hundred_on_fixture() {
        let result = percent_record(parse_meminfo(MEMINFO_FIXTURE)).unwrap();
        assert_eq!(
            result,
            ProbeResult::record(vec![
                ("used", ProbeResult::Int(60)),
                ("cache", ProbeResult::Int(20)),
                ("free", ProbeResult::Int(20)),
            ])
        );
    }

    #[test]
    fn test_rounding_is_half_up() {
        // free = 125 / 1000 -> 12.5% -> 13
        let result = percent_record(MemSample {
            total: 1000,
            free: 125,
            buffers: 0,
            cached: 0,
        })
        .unwrap();
        if let ProbeResult::Record(fields) = result {
            assert_eq!(fields[2], ("free".to_string(), ProbeResult::Int(13)));
        } else {
            panic!("expected record");
        }
    }

    #[test]
    fn test_zero_total_is_parse_failure() {
        let err = percent_record(MemSample::default()).unwrap_err();
        assert!(matches!(err, ProbeError::Parse(_)));
    }

    #[tokio::test]
    async fn test_posix_memory_total() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_stdout("cat /proc/meminfo", MEMINFO_FIXTURE);

        let probe = PosixMemoryTotal::new(runner);
        let result = probe.run(&ProbeArgs::none()).await.unwrap();
        assert_eq!(result, ProbeResult::Int(1_000_000));
    }

    #[tokio::test]
    async fn test_managed_stats_share_posix_shape() {
        let query = Arc::new(crate::port::management_query::mocks::FixedManagementQuery::default());
        let result = ManagedMemoryStats::new(query)
            .run(&ProbeArgs::none())
            .await
            .unwrap();
        assert_eq!(
            result,
            ProbeResult::record(vec![
                ("used", ProbeResult::Int(60)),
                ("cache", ProbeResult::Int(20)),
                ("free", ProbeResult::Int(20)),
            ])
        );
    }
}
