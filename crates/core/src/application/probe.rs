// Probe trait - one registered implementation per relevant platform kind

use async_trait::async_trait;

use super::args::ProbeArgs;
use crate::domain::ProbeResult;
use crate::error::Result;

/// A single telemetry probe strategy.
///
/// Implementations are registered against the platform kinds they serve;
/// the registry resolves the concrete strategy once against the detected
/// kind. Output shape per probe name is identical across strategies.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult>;
}
