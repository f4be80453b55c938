/// Change tracking for reversible edits.
///
/// Edits (not simulation ticks) record the occupant a position had before the
/// edit burst touched it. Only the first record per position and batch
/// counts, so dragging over the same slot several times undoes to the state
/// before the drag.

use std::collections::BTreeMap;

use tracing::debug;

use crate::game::cell::CellData;
use crate::game::coord::Position;
use crate::game::grid::CellGrid;

/// Prior occupants of the positions touched by one edit burst.
/// `None` means the slot was empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellChange {
    cells: BTreeMap<Position, Option<CellData>>,
}

impl CellChange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `prior` for `pos` unless this batch already has a record for it.
    pub fn add_cell(&mut self, pos: Position, prior: Option<CellData>) {
        self.cells.entry(pos).or_insert(prior);
    }

    pub fn get(&self, pos: Position) -> Option<Option<CellData>> {
        self.cells.get(&pos).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Restore every recorded position, calling `on_restored` after each one.
    pub fn undo_on(&self, grid: &mut CellGrid, mut on_restored: impl FnMut(Position, Option<CellData>)) {
        for (&pos, &prior) in &self.cells {
            match prior {
                Some((kind, direction)) => {
                    grid.load_cell(pos, kind, direction);
                }
                None => {
                    grid.rm(pos);
                }
            }
            on_restored(pos, prior);
        }
    }
}

/// LIFO of finished edit batches plus the batch being recorded.
#[derive(Clone, Debug, Default)]
pub struct UndoStack {
    stack: Vec<CellChange>,
    current: CellChange,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cell(&mut self, pos: Position, prior: Option<CellData>) {
        self.current.add_cell(pos, prior);
    }

    /// Record whatever currently occupies `pos` on `grid`. Call before editing it.
    pub fn record(&mut self, grid: &CellGrid, pos: Position) {
        self.add_cell(pos, grid.cell_at(pos).map(|c| c.data()));
    }

    /// Close the current batch. Empty batches are kept, so every finished
    /// burst takes exactly one undo step.
    pub fn finish(&mut self) {
        let batch = std::mem::take(&mut self.current);
        debug!("Undo batch closed with {} positions", batch.len());
        self.stack.push(batch);
    }

    /// Pop and apply the newest batch. Returns `false` when there is nothing to undo.
    pub fn undo_on(&mut self, grid: &mut CellGrid, on_restored: impl FnMut(Position, Option<CellData>)) -> bool {
        let Some(batch) = self.stack.pop() else {
            return false;
        };
        batch.undo_on(grid, on_restored);
        true
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current(&self) -> &CellChange {
        &self.current
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.current = CellChange::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::game::cells::core::{MOVER, PUSH, WALL};
    use crate::game::coord::Direction;
    use crate::game::registry::Registry;

    fn grid() -> CellGrid {
        CellGrid::new(Arc::new(Registry::with_builtins()), 4, 4)
    }

    #[test]
    fn test_first_record_wins() {
        let grid = grid();
        let wall = grid.registry().key_of(WALL).unwrap();
        let mut change = CellChange::new();
        change.add_cell(Position::ZERO, None);
        change.add_cell(Position::ZERO, Some((wall, Direction::Up)));
        assert_eq!(change.get(Position::ZERO), Some(None));
        assert_eq!(change.len(), 1);
    }

    #[test]
    fn test_undo_restores_burst() {
        let mut grid = grid();
        grid.place(Position::new(1, 1), WALL, Direction::Left);
        let mut undo = UndoStack::new();

        // Drag over (1,1) twice and (2,1) once.
        for (x, id) in [(1, PUSH), (1, MOVER), (2, MOVER)] {
            let pos = Position::new(x, 1);
            undo.record(&grid, pos);
            grid.place(pos, id, Direction::Right);
        }
        undo.finish();

        let mut restored = Vec::new();
        assert!(undo.undo_on(&mut grid, |pos, prior| restored.push((pos, prior.is_some()))));

        assert_eq!(grid.type_id_at(Position::new(1, 1)), Some(WALL));
        assert_eq!(grid.cell_at(Position::new(1, 1)).unwrap().direction, Direction::Left);
        assert!(grid.cell_at(Position::new(2, 1)).is_none());
        assert_eq!(restored, vec![(Position::new(1, 1), true), (Position::new(2, 1), false)]);
    }

    #[test]
    fn test_empty_stack_reports_nothing_to_undo() {
        let mut grid = grid();
        let mut undo = UndoStack::new();
        assert!(!undo.undo_on(&mut grid, |_, _| {}));

        undo.finish();
        assert_eq!(undo.depth(), 1);
        assert!(undo.undo_on(&mut grid, |_, _| {}));
        assert_eq!(undo.depth(), 0);
    }
}
