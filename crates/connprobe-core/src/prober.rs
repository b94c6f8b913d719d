use async_trait::async_trait;

use crate::report::ProbeReport;
use crate::stage::ProbeFailure;

/// Runs the fixed probe sequence against one target.
#[async_trait]
pub trait Prober: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> Result<ProbeReport, ProbeFailure>;
}
