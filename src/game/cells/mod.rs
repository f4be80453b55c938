/// Built-in cell packs.
///
/// - **core**: the classic cells every level code format knows
/// - **utils**: orientator, disabler, jell, random rotator, pistons, nuke
/// - **tunneling**: cells that redirect pushes passing through them
///
/// Each pack registers its types and slots in `register` and implements the
/// scheduled updates of its behaviours as free functions over `CellGrid`.

pub mod core;
pub mod tunneling;
pub mod utils;

use crate::game::cell::CellId;
use crate::game::coord::{Direction, Position};
use crate::game::grid::CellGrid;

/// Position and facing of a live cell.
#[inline]
pub(crate) fn pose(grid: &CellGrid, id: CellId) -> Option<(Position, Direction)> {
    grid.cell(id).map(|c| (c.pos, c.direction))
}
