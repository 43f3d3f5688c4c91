use async_trait::async_trait;
use eyre::Result;
use lookout_core::config::{OutputFormat, RuntimeConfig};

use super::Command;
use crate::render;
use crate::replay::{FrameSource, replay_source};

/// Replays frames and reports only how many were accepted or rejected.
///
/// Rejected frames are expected in captured streams, so they never make the
/// command fail.
pub struct CheckCommand {
    pub source: FrameSource,
    pub format: OutputFormat,
    pub runtime: RuntimeConfig,
}

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self) -> Result<()> {
        let report = replay_source(&self.source, &self.runtime).await?;

        let mut stdout = std::io::stdout().lock();
        render::write_stats(
            &mut stdout,
            report.frames,
            &report.snapshot.stats,
            self.format,
        )?;
        Ok(())
    }
}
