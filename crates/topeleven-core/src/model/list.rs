//! Position-indexed views of one list.
//!
//! [`SlotMap`] is the occupancy bitmap shared by the allocator, the mover and
//! the reconciler. [`RankedList`] pairs it with the full [`ListEntry`] rows so
//! direct items and references are handled by one code path.

use serde::Serialize;

use super::entry::{EntryHandle, ListEntry, ListId};
use super::position::{Position, SLOT_COUNT};

/// Which of the eleven slots are taken.
///
/// Out-of-range positions are ignored: they occupy no slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotMap {
    taken: u16,
}

impl SlotMap {
    #[must_use]
    pub const fn new() -> Self {
        Self { taken: 0 }
    }

    /// Build from raw stored positions.
    pub fn from_positions(positions: impl IntoIterator<Item = i64>) -> Self {
        let mut map = Self::new();
        for raw in positions {
            if let Ok(position) = Position::new(raw) {
                map.claim(position);
            }
        }
        map
    }

    const fn bit(position: Position) -> u16 {
        1 << (position.get() - 1)
    }

    #[must_use]
    pub const fn is_taken(&self, position: Position) -> bool {
        self.taken & Self::bit(position) != 0
    }

    /// Raw-position variant of [`SlotMap::is_taken`]; out-of-range is never taken.
    #[must_use]
    pub fn is_taken_raw(&self, raw: i64) -> bool {
        Position::new(raw).is_ok_and(|position| self.is_taken(position))
    }

    pub const fn claim(&mut self, position: Position) {
        self.taken |= Self::bit(position);
    }

    pub const fn release(&mut self, position: Position) {
        self.taken &= !Self::bit(position);
    }

    #[must_use]
    pub const fn len(&self) -> u32 {
        self.taken.count_ones()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.taken == 0
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len() == SLOT_COUNT as u32
    }

    /// Smallest free slot, if any.
    #[must_use]
    pub fn lowest_free(&self) -> Option<Position> {
        Position::all().find(|position| !self.is_taken(*position))
    }

    /// First free slot strictly after `raw`, probing up to the last slot.
    #[must_use]
    pub fn first_free_after(&self, raw: i64) -> Option<Position> {
        Position::all().find(|position| position.as_i64() > raw && !self.is_taken(*position))
    }
}

/// Every entry of one list, ordered by rank.
///
/// Entries sharing a position (drift) are ordered by creation time, then
/// handle, so the "earliest created" entry is always first. Unranked entries
/// sort last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedList {
    pub list: ListId,
    pub entries: Vec<ListEntry>,
}

impl RankedList {
    #[must_use]
    pub fn new(list: ListId, mut entries: Vec<ListEntry>) -> Self {
        entries.sort_by_key(|entry| {
            (
                entry.position().is_none(),
                entry.position(),
                entry.created_at_us(),
                entry.handle(),
            )
        });
        Self { list, entries }
    }

    #[must_use]
    pub fn slots(&self) -> SlotMap {
        SlotMap::from_positions(self.entries.iter().filter_map(ListEntry::position))
    }

    #[must_use]
    pub fn find(&self, handle: EntryHandle) -> Option<&ListEntry> {
        self.entries.iter().find(|entry| entry.handle() == handle)
    }

    /// Entries currently holding `raw`, earliest created first.
    pub fn occupants(&self, raw: i64) -> impl Iterator<Item = &ListEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.position() == Some(raw))
    }

    /// Entry at `raw` other than `except`, earliest created first.
    #[must_use]
    pub fn occupant_other_than(&self, raw: i64, except: EntryHandle) -> Option<&ListEntry> {
        self.occupants(raw).find(|entry| entry.handle() != except)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Position, RankedList, SlotMap};
    use crate::model::{EntryHandle, ListEntry, ListId, Placement, RankItem, Reference};

    fn pos(raw: i64) -> Position {
        Position::new(raw).expect("valid position")
    }

    fn item(id: i64, position: Option<i64>, created: i64) -> RankItem {
        RankItem {
            id,
            title: format!("item {id}"),
            description: None,
            url: None,
            images: vec![],
            position,
            owner: "ana".into(),
            placement: Placement::Main(1),
            created_at_us: created,
            updated_at_us: created,
        }
    }

    #[test]
    fn lowest_free_skips_taken_slots() {
        let map = SlotMap::from_positions([1, 2, 3, 5, 7]);
        assert_eq!(map.lowest_free(), Some(pos(4)));
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn out_of_range_positions_take_no_slot() {
        let map = SlotMap::from_positions([0, 12, -4]);
        assert!(map.is_empty());
        assert!(!map.is_taken_raw(12));
    }

    #[test]
    fn full_map_has_no_free_slot() {
        let map = SlotMap::from_positions(1..=11);
        assert!(map.is_full());
        assert_eq!(map.lowest_free(), None);
        assert_eq!(map.first_free_after(0), None);
    }

    #[test]
    fn first_free_after_probes_forward_only() {
        let mut map = SlotMap::from_positions([4, 5, 6]);
        assert_eq!(map.first_free_after(4), Some(pos(7)));
        map.claim(pos(7));
        assert_eq!(map.first_free_after(4), Some(pos(8)));
        map.release(pos(5));
        assert_eq!(map.first_free_after(4), Some(pos(5)));
        assert_eq!(map.first_free_after(11), None);
    }

    #[test]
    fn ranked_list_orders_by_position_then_creation() {
        let list = RankedList::new(
            ListId::Main(1),
            vec![
                ListEntry::DirectItem(item(1, None, 1)),
                ListEntry::DirectItem(item(2, Some(4), 20)),
                ListEntry::ReferenceEntry {
                    reference: Reference {
                        id: 9,
                        main_category_id: 1,
                        rank_item_id: 5,
                        position: Some(4),
                        created_at_us: 10,
                    },
                    target: item(5, Some(1), 0),
                },
                ListEntry::DirectItem(item(3, Some(2), 30)),
            ],
        );

        let handles: Vec<EntryHandle> = list.entries.iter().map(ListEntry::handle).collect();
        assert_eq!(
            handles,
            vec![
                EntryHandle::Item(3),
                EntryHandle::Reference(9),
                EntryHandle::Item(2),
                EntryHandle::Item(1),
            ]
        );
        assert_eq!(
            list.occupant_other_than(4, EntryHandle::Reference(9))
                .map(ListEntry::handle),
            Some(EntryHandle::Item(2))
        );
        assert_eq!(list.slots().len(), 2);
    }
}
