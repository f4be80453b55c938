use std::collections::BTreeSet;
use std::ops::Bound;

use rustc_hash::FxHashMap;

use crate::game::cell::{Cell, CellId};
use crate::game::coord::Position;
use crate::game::registry::CellTypeKey;

/// Storage and secondary indexes for the cells of one grid.
///
/// Three views over the same set of live cells:
///
/// - **cells:** `CellId -> Cell`, the owning map
/// - **positions:** `Position -> CellId`, at most one live cell per slot
/// - **groups:** `CellTypeKey -> {CellId}`, so the scheduler only visits the
///   cells of the type it is running
///
/// Groups are `BTreeSet`s keyed by monotonic ids, so walking a group is
/// creation order and cells created mid-walk are still reached by a cursor
/// walk (`next_in_group`).
///
/// # Invariants
///
/// - every id in `positions` and `groups` is a key of `cells`
/// - `cells[id].pos` maps back to `id` in `positions`
#[derive(Clone, Debug, Default)]
pub struct CellCollection {
    cells: FxHashMap<CellId, Cell>,
    positions: FxHashMap<Position, CellId>,
    groups: FxHashMap<CellTypeKey, BTreeSet<CellId>>,
}

impl CellCollection {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.positions.clear();
        self.groups.clear();
    }

    // ========================================================================
    // Insert / remove
    // ========================================================================

    /// Insert a cell. Any cell already at its position is evicted and returned.
    pub fn insert(&mut self, cell: Cell) -> Option<Cell> {
        let evicted = self.positions.get(&cell.pos).copied().and_then(|old| self.remove(old));
        self.positions.insert(cell.pos, cell.id);
        self.groups.entry(cell.kind).or_default().insert(cell.id);
        self.cells.insert(cell.id, cell);
        evicted
    }

    pub fn remove(&mut self, id: CellId) -> Option<Cell> {
        let cell = self.cells.remove(&id)?;
        if self.positions.get(&cell.pos) == Some(&id) {
            self.positions.remove(&cell.pos);
        }
        if let Some(group) = self.groups.get_mut(&cell.kind) {
            group.remove(&id);
        }
        Some(cell)
    }

    /// Move a live cell to `pos`, evicting whatever was there.
    pub fn relocate(&mut self, id: CellId, pos: Position) -> Option<Cell> {
        let old = self.cells.get(&id)?.pos;
        if old == pos {
            return None;
        }
        let evicted = match self.positions.get(&pos).copied() {
            Some(other) if other != id => self.remove(other),
            _ => None,
        };
        if self.positions.get(&old) == Some(&id) {
            self.positions.remove(&old);
        }
        self.positions.insert(pos, id);
        if let Some(cell) = self.cells.get_mut(&id) {
            cell.pos = pos;
        }
        evicted
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(&id)
    }

    #[inline]
    pub fn id_at(&self, pos: Position) -> Option<CellId> {
        self.positions.get(&pos).copied()
    }

    #[inline]
    pub fn at(&self, pos: Position) -> Option<&Cell> {
        self.id_at(pos).and_then(|id| self.cells.get(&id))
    }

    /// Live cells in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.values_mut()
    }

    /// Ids of one type in creation order.
    pub fn group(&self, kind: CellTypeKey) -> impl Iterator<Item = CellId> + '_ {
        self.groups.get(&kind).into_iter().flat_map(|g| g.iter().copied())
    }

    /// First id of `kind` strictly after `after` (or the first one).
    pub fn next_in_group(&self, kind: CellTypeKey, after: Option<CellId>) -> Option<CellId> {
        let group = self.groups.get(&kind)?;
        let lower = match after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };
        group.range((lower, Bound::Unbounded)).next().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::coord::Direction;

    fn cell(id: u64, x: i32, y: i32, kind: u16) -> Cell {
        Cell::new(CellId(id), Position::new(x, y), CellTypeKey(kind), Direction::Right, None)
    }

    #[test]
    fn test_insert_evicts_occupant() {
        let mut collection = CellCollection::new();
        assert!(collection.insert(cell(1, 0, 0, 0)).is_none());
        let evicted = collection.insert(cell(2, 0, 0, 1)).unwrap();
        assert_eq!(evicted.id, CellId(1));
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.group(CellTypeKey(0)).count(), 0);
        assert_eq!(collection.id_at(Position::new(0, 0)), Some(CellId(2)));
    }

    #[test]
    fn test_relocate_updates_index() {
        let mut collection = CellCollection::new();
        collection.insert(cell(1, 0, 0, 0));
        collection.relocate(CellId(1), Position::new(3, 2));
        assert!(collection.at(Position::new(0, 0)).is_none());
        assert_eq!(collection.at(Position::new(3, 2)).unwrap().id, CellId(1));
    }

    #[test]
    fn test_group_cursor_sees_later_ids() {
        let mut collection = CellCollection::new();
        collection.insert(cell(1, 0, 0, 7));
        collection.insert(cell(4, 1, 0, 7));
        let first = collection.next_in_group(CellTypeKey(7), None);
        assert_eq!(first, Some(CellId(1)));
        collection.insert(cell(9, 2, 0, 7));
        let second = collection.next_in_group(CellTypeKey(7), first);
        let third = collection.next_in_group(CellTypeKey(7), second);
        assert_eq!((second, third), (Some(CellId(4)), Some(CellId(9))));
        assert_eq!(collection.next_in_group(CellTypeKey(7), third), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut collection = CellCollection::new();
        collection.insert(cell(1, 0, 0, 0));
        assert!(collection.remove(CellId(1)).is_some());
        assert!(collection.remove(CellId(1)).is_none());
        assert!(collection.is_empty());
    }
}
