//! Feeding newline-delimited frames through a timeline actor.

use lookout_core::config::RuntimeConfig;
use lookout_core::runtime::{self, TimelineHandle};
use lookout_core::timeline::{TimelineReducer, TimelineSnapshot};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::error::Error;

/// Where frames are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSource {
    Stdin,
    File(PathBuf),
}

impl FrameSource {
    /// `None` and `-` both mean stdin.
    pub fn from_arg(input: Option<&Path>) -> Self {
        match input {
            Some(path) if path != Path::new("-") => FrameSource::File(path.to_path_buf()),
            _ => FrameSource::Stdin,
        }
    }
}

/// Result of replaying one source to the end.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// Non-blank lines handed to the reducer.
    pub frames: u64,
    pub snapshot: TimelineSnapshot,
}

pub async fn replay_source(
    source: &FrameSource,
    config: &RuntimeConfig,
) -> Result<ReplayReport, Error> {
    let handle = runtime::spawn(TimelineReducer::new(), config);

    let frames = match source {
        FrameSource::Stdin => feed(BufReader::new(tokio::io::stdin()), &handle).await?,
        FrameSource::File(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                Error::Config(format!("Cannot open frame file {}: {e}", path.display()))
            })?;
            feed(BufReader::new(file), &handle).await?
        }
    };

    let snapshot = handle.snapshot().await?;
    handle.shutdown().await?;

    tracing::debug!(
        target: "lookout::replay",
        frames,
        items = snapshot.items.len(),
        rejected = snapshot.stats.rejected(),
        "Replay finished"
    );

    Ok(ReplayReport { frames, snapshot })
}

/// Submit every non-blank line of `reader` in order. Returns the line count submitted.
pub async fn feed<R>(reader: R, handle: &TimelineHandle) -> Result<u64, Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut frames = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        handle.ingest_raw(line).await?;
        frames += 1;
    }

    Ok(frames)
}
