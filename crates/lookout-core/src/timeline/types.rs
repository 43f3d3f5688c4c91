use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strum::{Display, EnumString};
use uuid::Uuid;

/// Namespace for item identifiers. Fixed so that ids survive process restarts.
const ITEM_NAMESPACE: Uuid = Uuid::from_u128(0x6c6f_6f6b_6f75_7400_8000_0000_0000_0001);

pub type Timestamp = DateTime<Utc>;

/// Stable identifier of a timeline item.
///
/// Derived from the originating run and the position the item takes when it
/// is first created, so replaying identical frames yields identical ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn derive(run_id: &str, kind: ItemKindTag, ordinal: usize) -> Self {
        let name = format!("{run_id}/{kind}/{ordinal}");
        Self(Uuid::new_v5(&ITEM_NAMESPACE, name.as_bytes()))
    }

    pub fn derive_for_tool(run_id: &str, tool_call_id: &str, ordinal: usize) -> Self {
        let name = format!("{run_id}/{}/{tool_call_id}/{ordinal}", ItemKindTag::ToolCall);
        Self(Uuid::new_v5(&ITEM_NAMESPACE, name.as_bytes()))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Discriminant of [`super::item::ActivityKind`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemKindTag {
    Lifecycle,
    Thinking,
    Assistant,
    ToolCall,
    Compaction,
}

/// The two streamed-text item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TextStream {
    Thinking,
    Assistant,
}

impl TextStream {
    pub fn tag(self) -> ItemKindTag {
        match self {
            TextStream::Thinking => ItemKindTag::Thinking,
            TextStream::Assistant => ItemKindTag::Assistant,
        }
    }
}

/// Source of "now" for item creation and durations.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock()
            && let Ok(delta) = chrono::Duration::from_std(by)
        {
            *now += delta;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Elapsed time between two instants, clamped at zero when the clock went backwards.
pub fn elapsed(from: Timestamp, to: Timestamp) -> Duration {
    (to - from).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_is_deterministic() {
        let a = ItemId::derive("run-1", ItemKindTag::Lifecycle, 0);
        let b = ItemId::derive("run-1", ItemKindTag::Lifecycle, 0);
        assert_eq!(a, b);
        assert_ne!(a, ItemId::derive("run-1", ItemKindTag::Lifecycle, 1));
        assert_ne!(a, ItemId::derive("run-2", ItemKindTag::Lifecycle, 0));
        assert_ne!(a, ItemId::derive("run-1", ItemKindTag::Compaction, 0));
    }

    #[test]
    fn test_tool_item_id_includes_call_id() {
        let a = ItemId::derive_for_tool("run-1", "t1", 3);
        let b = ItemId::derive_for_tool("run-1", "t2", 3);
        assert_ne!(a, b);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::default();
        let start = clock.now();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(elapsed(start, clock.now()), Duration::from_millis(1500));
    }

    #[test]
    fn test_elapsed_clamps_negative() {
        let clock = ManualClock::default();
        let later = clock.now() + chrono::Duration::seconds(5);
        assert_eq!(elapsed(later, clock.now()), Duration::ZERO);
    }
}
