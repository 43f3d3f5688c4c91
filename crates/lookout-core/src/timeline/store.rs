//! Timeline - ordered storage for activity items

use indexmap::IndexMap;

use super::item::ActivityItem;
use super::types::ItemId;

/// Ordered, append-mostly item storage.
///
/// Items keep the position they were appended at for as long as the timeline
/// lives; the only way to remove anything is [`Timeline::clear`].
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    /// All items in creation order with O(1) id and position access
    items: IndexMap<ItemId, ActivityItem>,
    /// Revision number for dirty tracking
    revision: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current revision number for dirty tracking
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position the next appended item will take.
    pub fn next_position(&self) -> usize {
        self.items.len()
    }

    /// Append an item and return its position
    pub fn push(&mut self, item: ActivityItem) -> usize {
        let (position, previous) = self.items.insert_full(item.id, item);
        if previous.is_some() {
            tracing::warn!(
                target: "lookout::timeline",
                position,
                "Replaced an item with a colliding id"
            );
        }
        self.revision += 1;
        position
    }

    pub fn get(&self, position: usize) -> Option<&ActivityItem> {
        self.items.get_index(position).map(|(_, item)| item)
    }

    pub fn get_by_id(&self, id: &ItemId) -> Option<&ActivityItem> {
        self.items.get(id)
    }

    pub fn position_of(&self, id: &ItemId) -> Option<usize> {
        self.items.get_index_of(id)
    }

    /// Mutate the item at `position` in place.
    pub fn update<R>(
        &mut self,
        position: usize,
        f: impl FnOnce(&mut ActivityItem) -> R,
    ) -> Option<R> {
        let (_, item) = self.items.get_index_mut(position)?;
        let result = f(item);
        self.revision += 1;
        Some(result)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityItem> + '_ {
        self.items.values()
    }

    pub fn last(&self) -> Option<&ActivityItem> {
        self.items.last().map(|(_, item)| item)
    }

    pub fn to_vec(&self) -> Vec<ActivityItem> {
        self.items.values().cloned().collect()
    }

    /// Drop every item
    pub fn clear(&mut self) {
        self.items.clear();
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::item::{ActivityKind, CompactionStatus};
    use crate::timeline::types::ItemKindTag;
    use chrono::{DateTime, Utc};

    fn compaction(ordinal: usize) -> ActivityItem {
        ActivityItem {
            id: ItemId::derive("run-1", ItemKindTag::Compaction, ordinal),
            run_id: "run-1".to_string(),
            kind: ActivityKind::Compaction {
                phase: CompactionStatus::Started,
            },
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_push_returns_stable_positions() {
        let mut timeline = Timeline::new();
        assert_eq!(timeline.push(compaction(0)), 0);
        assert_eq!(timeline.push(compaction(1)), 1);
        assert_eq!(timeline.next_position(), 2);

        let id = compaction(0).id;
        assert_eq!(timeline.position_of(&id), Some(0));
        assert!(timeline.get_by_id(&id).is_some());
    }

    #[test]
    fn test_update_mutates_in_place_and_bumps_revision() {
        let mut timeline = Timeline::new();
        timeline.push(compaction(0));
        timeline.push(compaction(1));
        let before = timeline.revision();

        timeline.update(0, |item| {
            item.kind = ActivityKind::Compaction {
                phase: CompactionStatus::Ended,
            };
        });

        assert_eq!(timeline.revision(), before + 1);
        assert_eq!(timeline.len(), 2);
        assert_eq!(
            timeline.get(0).map(|item| item.kind.clone()),
            Some(ActivityKind::Compaction {
                phase: CompactionStatus::Ended
            })
        );
    }

    #[test]
    fn test_update_out_of_range_is_none() {
        let mut timeline = Timeline::new();
        let revision = timeline.revision();
        assert_eq!(timeline.update(3, |_| ()), None);
        assert_eq!(timeline.revision(), revision);
    }

    #[test]
    fn test_clear() {
        let mut timeline = Timeline::new();
        timeline.push(compaction(0));
        timeline.clear();
        assert!(timeline.is_empty());
        assert!(timeline.last().is_none());
    }
}
