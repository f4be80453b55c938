/// Per-instance cell state.
///
/// A `Cell` is plain data owned by the grid's `CellCollection`. Behaviour lives
/// on the cell's type (see `behavior`), so cells can be cloned into snapshots
/// and undo batches freely.

use serde::{Deserialize, Serialize};

use crate::game::coord::{Direction, Position};
use crate::game::registry::CellTypeKey;

/// Stable identity of a live cell. Ids are handed out monotonically by the grid
/// and never reused, so iteration by id is creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u64);

/// `(type, direction)` pair: everything needed to recreate a cell elsewhere.
pub type CellData = (CellTypeKey, Direction);

/// Extra state only some behaviours use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellState {
    /// Piston: toggled by a cell entering from behind.
    pub extended: bool,
    /// Piston: the head has actually been placed.
    pub actually_extended: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub pos: Position,
    pub direction: Direction,
    pub kind: CellTypeKey,
    /// Set on the copy handed back by `CellGrid::rm`; live cells are never deleted.
    pub deleted: bool,
    /// Tick in which the cell was disabled. Disabled iff equal to the current tick.
    pub disabled_in: Option<u64>,
    /// Tick in which the cell last ran its update.
    pub updated_in: Option<u64>,
    /// Tick the cell was created in, `None` when loaded before the first tick.
    pub generated_in: Option<u64>,
    /// Position at the start of the current tick (animation / diffing).
    pub old_position: Position,
    /// Quarter turns applied during the current tick.
    pub rotation_offset: i32,
    pub state: CellState,
}

impl Cell {
    pub(crate) fn new(id: CellId, pos: Position, kind: CellTypeKey, direction: Direction, generated_in: Option<u64>) -> Self {
        Self {
            id,
            pos,
            direction,
            kind,
            deleted: false,
            disabled_in: None,
            updated_in: None,
            generated_in,
            old_position: pos,
            rotation_offset: 0,
            state: CellState::default(),
        }
    }

    #[inline]
    pub fn data(&self) -> CellData {
        (self.kind, self.direction)
    }

    #[inline]
    pub fn is_disabled(&self, tick: u64) -> bool {
        self.disabled_in == Some(tick)
    }

    #[inline]
    pub fn is_updated(&self, tick: u64) -> bool {
        self.updated_in == Some(tick)
    }

    /// True while the tick that created this cell is still running.
    #[inline]
    pub fn is_generated(&self, tick: u64) -> bool {
        self.generated_in == Some(tick)
    }
}
