// Management Query Port - abstract access to the managed-OS management API
//
// The concrete adapter (COM-style automation on the managed platform) is an
// external dependency supplied at integration time; the core only maps its
// fields into the same ProbeResult shapes the POSIX strategies produce.

use async_trait::async_trait;
use thiserror::Error;

/// Physical memory sample, all fields in kB to match /proc/meminfo units.
#[derive(Debug, Clone)]
pub struct ManagedMemory {
    pub total_kb: u64,
    pub free_kb: u64,
    pub cache_kb: u64,
}

/// One logical disk as reported by the management API.
#[derive(Debug, Clone)]
pub struct ManagedDisk {
    pub name: String,
    pub total_bytes: u64,
    pub free_bytes: u64,
}

/// Operating system identity fields.
#[derive(Debug, Clone)]
pub struct ManagedOsInfo {
    pub os_name: String,
    pub os_version: String,
    pub arch: String,
    pub hostname: String,
    /// Already formatted as "up N days, H hours, M minutes".
    pub uptime: String,
}

#[derive(Error, Debug, Clone)]
pub enum QueryError {
    #[error("management query '{query}' failed: {reason}")]
    Failed { query: String, reason: String },

    #[error("management interface unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ManagementQuery: Send + Sync {
    async fn memory(&self) -> Result<ManagedMemory, QueryError>;

    /// Look up a logical disk by name (e.g. "C:"). None if no such disk.
    async fn logical_disk(&self, name: &str) -> Result<Option<ManagedDisk>, QueryError>;

    /// Current processor load, 0.0 - 100.0.
    async fn cpu_load_percent(&self) -> Result<f64, QueryError>;

    async fn os_info(&self) -> Result<ManagedOsInfo, QueryError>;

    /// Number of pending software updates.
    async fn pending_updates(&self) -> Result<u32, QueryError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Fixed-value management query for tests.
    #[derive(Debug, Clone)]
    pub struct FixedManagementQuery {
        pub memory: ManagedMemory,
        pub disks: Vec<ManagedDisk>,
        pub cpu_load: f64,
        pub os: ManagedOsInfo,
        pub pending: u32,
    }

    impl Default for FixedManagementQuery {
        fn default() -> Self {
            Self {
                memory: ManagedMemory {
                    total_kb: 1_000_000,
                    free_kb: 200_000,
                    cache_kb: 200_000,
                },
                disks: vec![ManagedDisk {
                    name: "C:".to_string(),
                    total_bytes: 100_000_000_000,
                    free_bytes: 40_000_000_000,
                }],
                cpu_load: 7.0,
                os: ManagedOsInfo {
                    os_name: "Managed OS".to_string(),
                    os_version: "10.0".to_string(),
                    arch: "64-bit".to_string(),
                    hostname: "managed-host".to_string(),
                    uptime: "up 3 days, 4 hours, 5 minutes".to_string(),
                },
                pending: 0,
            }
        }
    }

    #[async_trait]
    impl ManagementQuery for FixedManagementQuery {
        async fn memory(&self) -> Result<ManagedMemory, QueryError> {
            Ok(self.memory.clone())
        }

        async fn logical_disk(&self, name: &str) -> Result<Option<ManagedDisk>, QueryError> {
            Ok(self.disks.iter().find(|d| d.name == name).cloned())
        }

        async fn cpu_load_percent(&self) -> Result<f64, QueryError> {
            Ok(self.cpu_load)
        }

        async fn os_info(&self) -> Result<ManagedOsInfo, QueryError> {
            Ok(self.os.clone())
        }

        async fn pending_updates(&self) -> Result<u32, QueryError> {
            Ok(self.pending)
        }
    }
}
