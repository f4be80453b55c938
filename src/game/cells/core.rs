use crate::game::behavior::Behavior;
use crate::game::cell::{CellData, CellId};
use crate::game::cell_type::{flip_identity, merge_keep, never, never_disable, CellType, UpdateKind};
use crate::game::coord::Direction;
use crate::game::grid::CellGrid;
use crate::game::registry::Registry;

use super::pose;

pub const GENERATOR: &str = "jm.core.generator";
pub const MOVER: &str = "jm.core.mover";
pub const CW_ROTATOR: &str = "jm.core.cw_rotator";
pub const CCW_ROTATOR: &str = "jm.core.ccw_rotator";
pub const PUSH: &str = "jm.core.push";
pub const SLIDE: &str = "jm.core.slide";
pub const ARROW: &str = "jm.core.arrow";
pub const ENEMY: &str = "jm.core.enemy";
pub const TRASH: &str = "jm.core.trash";
pub const WALL: &str = "jm.core.wall";
pub const BORDER: &str = "_";
pub const UNKNOWN: &str = "?";

/// Type list indexed by the V1/V3 formats. The order is part of both formats.
pub const LEGACY_CELLS: [&str; 9] = [GENERATOR, CW_ROTATOR, CCW_ROTATOR, MOVER, SLIDE, PUSH, WALL, ENEMY, TRASH];

pub fn register(registry: &mut Registry) {
    registry.register_cell(
        CellType::new(GENERATOR, "Generator", Behavior::Generator)
            .raw_id(0)
            .description("Generates the cell behind to the front.")
            .updates(UpdateKind::Directional, 1.0),
    );
    registry.register_cell(
        CellType::new(MOVER, "Mover", Behavior::Mover)
            .raw_id(1)
            .description("Moves forward one cell and pushes all cells in the way.")
            .updates(UpdateKind::Directional, 3.0),
    );
    registry.register_cell(
        CellType::new(CW_ROTATOR, "Clockwise Rotator", Behavior::Rotator(1))
            .raw_id(2)
            .texture("cwRotator")
            .description("Rotates all four touching cells clockwise.")
            .flip_with(flip_rotator)
            .updates(UpdateKind::Random, 2.0),
    );
    registry.register_cell(
        CellType::new(CCW_ROTATOR, "Counterclockwise Rotator", Behavior::Rotator(-1))
            .raw_id(3)
            .texture("ccwRotator")
            .description("Rotates all four touching cells counterclockwise.")
            .flip_with(flip_rotator)
            .updates(UpdateKind::Random, 2.0),
    );
    registry.register_cell(
        CellType::new(PUSH, "Push", Behavior::Plain)
            .raw_id(4)
            .description("A simple cell that does nothing. Can be pushed in all directions.")
            .flip_with(flip_identity),
    );
    registry.register_cell(
        CellType::new(SLIDE, "Slide", Behavior::Slide)
            .raw_id(5)
            .description("A cell that can only be pushed in two directions.")
            .flip_with(flip_identity),
    );
    registry.register_cell(
        CellType::new(ARROW, "Arrow", Behavior::Arrow)
            .raw_id(6)
            .description("A cell that can only be pushed in one direction."),
    );
    registry.register_cell(
        CellType::new(ENEMY, "Enemy", Behavior::Enemy)
            .raw_id(7)
            .description("When pushed, destroys the pushing cell and dies itself.")
            .flip_with(flip_identity),
    );
    registry.register_cell(
        CellType::new(TRASH, "Trash", Behavior::Trash)
            .raw_id(8)
            .description("Deletes all incoming cells. Does not die itself.")
            .flip_with(flip_identity),
    );
    registry.register_cell(
        CellType::new(WALL, "Wall", Behavior::Wall)
            .raw_id(9)
            .description("Can't be pushed nor rotated.")
            .flip_with(flip_identity)
            .on_rotate(never)
            .on_disable(never_disable),
    );
    registry.register_cell(
        CellType::new(BORDER, "Border", Behavior::Border)
            .texture("border")
            .description("Behaves like the border of the grid. Can't be pushed nor rotated.")
            .flip_with(flip_identity)
            .merge_with(merge_keep)
            .on_rotate(never)
            .on_disable(never_disable),
    );
    registry.register_cell(
        CellType::new(UNKNOWN, "Unknown", Behavior::Plain)
            .texture("unknown")
            .description("Placeholder for cell types this build does not know.")
            .flip_with(flip_identity),
    );

    registry.add_slot(&[GENERATOR]);
    registry.add_slot(&[MOVER]);
    registry.add_slot(&[CW_ROTATOR, CCW_ROTATOR]);
    registry.add_slot(&[PUSH, SLIDE, ARROW]);
    registry.add_slot(&[ENEMY, TRASH]);
    registry.add_slot(&[WALL, BORDER]);
}

/// Mirroring a rotator reverses its spin.
fn flip_rotator(registry: &Registry, (kind, dir): CellData, _: bool) -> CellData {
    let other = if registry.get(kind).id == CW_ROTATOR { CCW_ROTATOR } else { CW_ROTATOR };
    (registry.key_of(other).unwrap_or(kind), dir)
}

// ============================================================================
// Updates
// ============================================================================

/// Clone the cell behind onto the slot ahead, pushing the slot ahead first.
pub(crate) fn update_generator(grid: &mut CellGrid, id: CellId) {
    let Some((pos, facing)) = pose(grid, id) else { return };

    let Some((source_pos, _)) = grid.cell_to(pos, facing.opposite(), 0) else { return };
    let Some(source) = grid.cell_at(source_pos) else { return };
    let (source_kind, source_dir) = (source.kind, source.direction);

    let Some((target_pos, target_dir)) = grid.cell_to(pos, facing, 0) else { return };
    if let Some(target) = grid.id_at(target_pos) {
        if !grid.push_cell(target, target_dir, 1, 0).vacated() {
            return;
        }
    }

    let direction = source_dir.rotate(target_dir as i32 - facing as i32);
    if let Some(new_id) = grid.load_cell(target_pos, source_kind, direction) {
        if let Some(cell) = grid.cell_mut(new_id) {
            cell.old_position = pos;
        }
    }
}

/// Movers push themselves forward without their own bias bonus.
pub(crate) fn update_mover(grid: &mut CellGrid, id: CellId) {
    let Some((_, facing)) = pose(grid, id) else { return };
    grid.base_push(id, facing, 1, 0);
}

pub(crate) fn update_rotator(grid: &mut CellGrid, id: CellId, turns: i32) {
    for dir in Direction::ALL {
        let Some((pos, _)) = pose(grid, id) else { return };
        if let Some((target, _)) = grid.cell_to(pos, dir, 0) {
            grid.rotate(target, turns);
        }
    }
}
