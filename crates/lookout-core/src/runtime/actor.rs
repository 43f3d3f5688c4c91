use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::timeline::{Change, Outcome, TimelineReducer, TimelineSnapshot};

pub(crate) enum TimelineCmd {
    Ingest {
        frame: Value,
        reply: oneshot::Sender<Outcome>,
    },
    IngestRaw {
        raw: String,
        reply: oneshot::Sender<Outcome>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<TimelineSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<broadcast::Receiver<TimelineUpdate>>,
    },
    Shutdown,
}

/// Published after every command that changed the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "update", rename_all = "snake_case")]
pub enum TimelineUpdate {
    Applied { revision: u64, changes: Vec<Change> },
    Reset { revision: u64 },
}

impl TimelineUpdate {
    pub fn revision(&self) -> u64 {
        match self {
            TimelineUpdate::Applied { revision, .. } | TimelineUpdate::Reset { revision } => {
                *revision
            }
        }
    }
}

/// Producer side of a running [`TimelineActor`]. Clone freely.
#[derive(Debug, Clone)]
pub struct TimelineHandle {
    cmd_tx: mpsc::Sender<TimelineCmd>,
}

impl TimelineHandle {
    pub async fn ingest(&self, frame: Value) -> Result<Outcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TimelineCmd::Ingest {
            frame,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| Error::ChannelClosed)
    }

    pub async fn ingest_raw(&self, raw: impl Into<String>) -> Result<Outcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TimelineCmd::IngestRaw {
            raw: raw.into(),
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| Error::ChannelClosed)
    }

    pub async fn reset(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TimelineCmd::Reset { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| Error::ChannelClosed)
    }

    pub async fn snapshot(&self) -> Result<TimelineSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TimelineCmd::Snapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| Error::ChannelClosed)
    }

    pub async fn subscribe(&self) -> Result<broadcast::Receiver<TimelineUpdate>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TimelineCmd::Subscribe { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Ask the actor to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(TimelineCmd::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }

    async fn send(&self, cmd: TimelineCmd) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| Error::ChannelClosed)
    }
}

/// Sole owner of a [`TimelineReducer`]; applies commands one at a time.
pub struct TimelineActor {
    reducer: TimelineReducer,
    updates: broadcast::Sender<TimelineUpdate>,
}

impl TimelineActor {
    pub fn new(reducer: TimelineReducer, update_buffer: usize) -> Self {
        let (updates, _) = broadcast::channel(update_buffer.max(1));
        Self { reducer, updates }
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<TimelineCmd>) {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                TimelineCmd::Ingest { frame, reply } => {
                    let outcome = self.reducer.ingest(&frame);
                    self.publish(&outcome);
                    let _ = reply.send(outcome);
                }
                TimelineCmd::IngestRaw { raw, reply } => {
                    let outcome = self.reducer.ingest_str(&raw);
                    self.publish(&outcome);
                    let _ = reply.send(outcome);
                }
                TimelineCmd::Reset { reply } => {
                    self.reducer.reset();
                    let _ = self.updates.send(TimelineUpdate::Reset {
                        revision: self.reducer.revision(),
                    });
                    let _ = reply.send(());
                }
                TimelineCmd::Snapshot { reply } => {
                    let _ = reply.send(self.reducer.snapshot());
                }
                TimelineCmd::Subscribe { reply } => {
                    let _ = reply.send(self.updates.subscribe());
                }
                TimelineCmd::Shutdown => break,
            }
        }

        tracing::debug!(
            target: "lookout::runtime",
            revision = self.reducer.revision(),
            items = self.reducer.timeline().len(),
            "Timeline actor stopped"
        );
    }

    fn publish(&self, outcome: &Outcome) {
        let Outcome::Applied(changes) = outcome else {
            return;
        };
        // No subscribers is not an error.
        let _ = self.updates.send(TimelineUpdate::Applied {
            revision: self.reducer.revision(),
            changes: changes.clone(),
        });
    }
}

/// Start an actor on the current tokio runtime.
pub fn spawn(reducer: TimelineReducer, config: &RuntimeConfig) -> TimelineHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer.max(1));
    let actor = TimelineActor::new(reducer, config.update_buffer);

    tokio::spawn(actor.run(cmd_rx));

    TimelineHandle { cmd_tx }
}
