use async_trait::async_trait;
use eyre::Result;
use lookout_core::config::{OutputFormat, RuntimeConfig};

use super::Command;
use crate::render;
use crate::replay::{FrameSource, replay_source};

pub struct ReplayCommand {
    pub source: FrameSource,
    pub format: OutputFormat,
    pub runtime: RuntimeConfig,
}

#[async_trait]
impl Command for ReplayCommand {
    async fn execute(&self) -> Result<()> {
        let report = replay_source(&self.source, &self.runtime).await?;

        let mut stdout = std::io::stdout().lock();
        render::write_timeline(&mut stdout, &report.snapshot, self.format)?;
        Ok(())
    }
}
