// Disk probes: free-space percentage, totals and the filesystem table

use std::sync::Arc;

use async_trait::async_trait;

use super::run_ok;
use crate::application::args::ProbeArgs;
use crate::application::probe::Probe;
use crate::domain::{ColumnSchema, HeaderSkip, ProbeResult, TableSpec};
use crate::error::{ProbeError, Result};
use crate::port::command_runner::CommandRunner;
use crate::port::management_query::ManagementQuery;

/// `df -h --output=...` table: 7 fields, one header line.
pub const DISKS: TableSpec = TableSpec {
    schema: ColumnSchema::new(&[
        "filesystem",
        "type",
        "size",
        "used",
        "avail",
        "used_percent",
        "mounted",
    ]),
    skip: HeaderSkip::Lines(1),
    stop_at_blank: false,
};

const DF_OUTPUT_COLUMNS: &str = "--output=source,fstype,size,used,avail,pcent,target";

/// Free-space percentage: floor(free / total * 100) when 0 < free < total,
/// otherwise 0.
pub(crate) fn free_percent(total_bytes: u64, free_bytes: u64) -> i64 {
    if free_bytes > 0 && total_bytes > 0 && free_bytes < total_bytes {
        (free_bytes as f64 / total_bytes as f64 * 100.0).floor() as i64
    } else {
        0
    }
}

/// Query one mount point with portable `df` and return (total, free) bytes.
async fn df_bytes(runner: &dyn CommandRunner, path: &str) -> Result<(u64, u64)> {
    let output = run_ok(runner, "df", &["-P", "-k", path]).await?;
    let line = output
        .stdout
        .lines()
        .nth(1)
        .ok_or_else(|| ProbeError::Parse(format!("df produced no data row for '{path}'")))?;

    // POSIX df: filesystem, 1024-blocks, used, available, capacity, mount
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let kilobytes = |idx: usize| -> u64 {
        tokens
            .get(idx)
            .and_then(|t| t.parse::<u64>().ok())
            .unwrap_or(0)
    };
    Ok((kilobytes(1) * 1024, kilobytes(3) * 1024))
}

pub struct PosixDiskSpace {
    runner: Arc<dyn CommandRunner>,
}

impl PosixDiskSpace {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for PosixDiskSpace {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let path = args.str_or("path", "/");
        let (total, free) = df_bytes(self.runner.as_ref(), &path).await?;
        Ok(ProbeResult::Int(free_percent(total, free)))
    }
}

pub struct PosixTotalDiskSpace {
    runner: Arc<dyn CommandRunner>,
}

impl PosixTotalDiskSpace {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for PosixTotalDiskSpace {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let path = args.str_or("path", "/");
        let (total, _free) = df_bytes(self.runner.as_ref(), &path).await?;
        Ok(ProbeResult::Int(total as i64))
    }
}

async fn managed_disk(
    query: &dyn ManagementQuery,
    path: &str,
) -> Result<crate::port::management_query::ManagedDisk> {
    query
        .logical_disk(path)
        .await?
        .ok_or_else(|| ProbeError::Parse(format!("no logical disk named '{path}'")))
}

pub struct ManagedDiskSpace {
    query: Arc<dyn ManagementQuery>,
}

impl ManagedDiskSpace {
    pub fn new(query: Arc<dyn ManagementQuery>) -> Self {
        Self { query }
    }
}

#[async_trait]
impl Probe for ManagedDiskSpace {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let path = args.str_or("path", "/");
        let disk = managed_disk(self.query.as_ref(), &path).await?;
        Ok(ProbeResult::Int(free_percent(
            disk.total_bytes,
            disk.free_bytes,
        )))
    }
}

pub struct ManagedTotalDiskSpace {
    query: Arc<dyn ManagementQuery>,
}

impl ManagedTotalDiskSpace {
    pub fn new(query: Arc<dyn ManagementQuery>) -> Self {
        Self { query }
    }
}

#[async_trait]
impl Probe for ManagedTotalDiskSpace {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let path = args.str_or("path", "/");
        let disk = managed_disk(self.query.as_ref(), &path).await?;
        Ok(ProbeResult::Int(disk.total_bytes as i64))
    }
}

/// Filesystem table probe (`disks`), POSIX only.
pub struct DisksProbe {
    runner: Arc<dyn CommandRunner>,
}

impl DisksProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for DisksProbe {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let output = run_ok(
            self.runner.as_ref(),
            "df",
            &[
                "-h",
                DF_OUTPUT_COLUMNS,
                "-x",
                "tmpfs",
                "-x",
                "devtmpfs",
            ],
        )
        .await?;

        if args.bool_or("parse", true) {
            Ok(ProbeResult::Table(DISKS.parse(&output.stdout)))
        } else {
            Ok(ProbeResult::text(output.trimmed_stdout()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::command_runner::mocks::ScriptedRunner;
    use serde_json::json;

    const DF_P_FIXTURE: &str = "\
Filesystem     1024-blocks     Used Available Capacity Mounted on
/dev/vda1         10000000  6000000   4000000      60% /
";

    const DF_H_FIXTURE: &str = "\
Filesystem     Type  Size  Used Avail Use% Mounted on
/dev/vda1      ext4   20G   12G  6.7G  65% /
/dev/vdb1      xfs   100G   20G   81G  20% /srv/data
";

    #[test]
    fn test_free_percent_bounds() {
        assert_eq!(free_percent(1000, 400), 40);
        assert_eq!(free_percent(1000, 0), 0);
        assert_eq!(free_percent(0, 400), 0);
        // free >= total clamps to 0, never above 100
        assert_eq!(free_percent(1000, 1000), 0);
        assert_eq!(free_percent(1000, 2000), 0);
        assert_eq!(free_percent(3, 1), 33);
    }

    #[tokio::test]
    async fn test_disk_space_from_df() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_stdout("df -P -k /", DF_P_FIXTURE);

        let result = PosixDiskSpace::new(runner)
            .run(&ProbeArgs::none())
            .await
            .unwrap();
        assert_eq!(result, ProbeResult::Int(40));
    }

    #[tokio::test]
    async fn test_total_disk_space_bytes() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_stdout("df -P -k /srv", DF_P_FIXTURE);

        let result = PosixTotalDiskSpace::new(runner)
            .run(&ProbeArgs::new(json!({"path": "/srv"})))
            .await
            .unwrap();
        assert_eq!(result, ProbeResult::Int(10_000_000 * 1024));
    }

    #[tokio::test]
    async fn test_disks_table() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_stdout(
            "df -h --output=source,fstype,size,used,avail,pcent,target -x tmpfs -x devtmpfs",
            DF_H_FIXTURE,
        );

        let result = DisksProbe::new(runner).run(&ProbeArgs::none()).await.unwrap();
        let rows = result.as_table().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("filesystem"), Some("/dev/vdb1"));
        assert_eq!(rows[1].get("mounted"), Some("/srv/data"));
    }

    #[tokio::test]
    async fn test_managed_disk_space() {
        let query = Arc::new(crate::port::management_query::mocks::FixedManagementQuery::default());
        let result = ManagedDiskSpace::new(query)
            .run(&ProbeArgs::new(json!({"path": "C:"})))
            .await
            .unwrap();
        assert_eq!(result, ProbeResult::Int(40));
    }
}
