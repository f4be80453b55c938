/// Utility pack: cells that manipulate their neighbours rather than move.
///
/// Jell and Nuke skip the tick they were created in, so a freshly spread
/// cell does not spread again within the same pass.

use rand::Rng;

use crate::game::behavior::Behavior;
use crate::game::cell::CellId;
use crate::game::cell_type::{flip_identity, CellType, UpdateKind};
use crate::game::coord::Direction;
use crate::game::grid::CellGrid;
use crate::game::registry::Registry;

use super::pose;

pub const ORIENTATOR: &str = "jm.utils.orientator";
pub const DISABLER: &str = "jm.utils.disabler";
pub const JELL: &str = "jm.utils.jell";
pub const RANDOM_ROTATOR: &str = "jm.utils.random";
pub const PISTON: &str = "jm.utils.piston";
pub const PISTON_HEAD: &str = "jm.utils.piston_head";
pub const STICKY_PISTON: &str = "jm.utils.sticky_piston";
pub const STICKY_PISTON_HEAD: &str = "jm.utils.sticky_piston_head";
pub const NUKE: &str = "jm.utils.nuke";

/// Nuke tries at most this many random directions per tick.
const NUKE_ATTEMPTS: usize = 2;

pub fn register(registry: &mut Registry) {
    registry.register_cell(
        CellType::new(ORIENTATOR, "Orientator", Behavior::Orientator)
            .raw_id(10)
            .description("Rotates all four touching cells in the direction it is looking.")
            .updates(UpdateKind::Directional, 2.5),
    );
    registry.register_cell(
        CellType::new(DISABLER, "Disabler", Behavior::Disabler)
            .raw_id(11)
            .description("Prevents the four touching cells from executing their action.")
            .updates(UpdateKind::Random, 0.0),
    );
    registry.register_cell(
        CellType::new(JELL, "Jell Cell", Behavior::Jell)
            .description("Turns all touching cells into Jell cells.")
            .updates(UpdateKind::Random, -127.0),
    );
    registry.register_cell(
        CellType::new(RANDOM_ROTATOR, "Random Rotator", Behavior::RandomRotator)
            .description("Rotates the cell in front of it clockwise or counter-clockwise at random.")
            .updates(UpdateKind::Directional, 2.1),
    );
    registry.register_cell(
        CellType::new(PISTON, "Piston", Behavior::Piston { sticky: false })
            .raw_id(12)
            .texture("pistonOff")
            .description("Extends or retracts when a cell enters from behind, deleting that cell.")
            .updates(UpdateKind::Directional, 5.0),
    );
    registry.register_cell(
        CellType::new(PISTON_HEAD, "Piston Head", Behavior::PistonHead)
            .texture("pistonHead")
            .description("Placeholder where a piston extends. Can't be moved or rotated."),
    );
    registry.register_cell(
        CellType::new(STICKY_PISTON, "Sticky Piston", Behavior::Piston { sticky: true })
            .raw_id(13)
            .texture("pistonSticky")
            .description("Like a piston, but pulls the cell in front back when retracting.")
            .updates(UpdateKind::Directional, 5.0),
    );
    registry.register_cell(
        CellType::new(STICKY_PISTON_HEAD, "Sticky Piston Head", Behavior::PistonHead)
            .texture("pistonStickyHead")
            .description("Placeholder where a sticky piston extends. Can't be moved or rotated."),
    );
    registry.register_cell(
        CellType::new(NUKE, "Nuke", Behavior::Nuke)
            .description("Duplicates itself in a random direction.")
            .flip_with(flip_identity)
            .updates(UpdateKind::Directional, 4.0),
    );

    registry.add_slot(&[ORIENTATOR, DISABLER]);
    registry.add_slot(&[JELL, RANDOM_ROTATOR, NUKE]);
    registry.add_slot(&[PISTON, STICKY_PISTON]);
}

// ============================================================================
// Updates
// ============================================================================

/// Turn the four direct neighbours to face the same way, bypassing their
/// own rotation logic but not their vetoes.
pub(crate) fn update_orientator(grid: &mut CellGrid, id: CellId) {
    let Some((pos, facing)) = pose(grid, id) else { return };
    for neighbor in pos.neighbors() {
        grid.set_rotation(neighbor, facing);
    }
}

pub(crate) fn update_disabler(grid: &mut CellGrid, id: CellId) {
    let Some((pos, _)) = pose(grid, id) else { return };
    for neighbor in pos.neighbors() {
        grid.disable(neighbor);
    }
}

/// Convert every touching cell of another type into jell, keeping its facing.
pub(crate) fn update_jell(grid: &mut CellGrid, id: CellId) {
    let tick = grid.tick_count;
    let Some(cell) = grid.cell(id) else { return };
    if cell.is_generated(tick) {
        return;
    }
    let (pos, kind) = (cell.pos, cell.kind);

    let targets: Vec<_> = pos
        .neighbors()
        .into_iter()
        .filter_map(|p| grid.cell_at(p))
        .filter(|c| c.kind != kind)
        .map(|c| (c.pos, c.direction))
        .collect();
    for (target, direction) in targets {
        grid.load_cell(target, kind, direction);
    }
}

pub(crate) fn update_random_rotator(grid: &mut CellGrid, id: CellId) {
    let Some((pos, facing)) = pose(grid, id) else { return };
    let Some((target, _)) = grid.cell_to(pos, facing, 0) else { return };
    if grid.cell_at(target).is_none() {
        return;
    }
    let offset = if grid.rng.random_bool(0.5) { 1 } else { -1 };
    grid.rotate(target, offset);
}

/// Extend: push the slot ahead and place a head there.
/// Retract: remove our own head; a sticky piston also pulls the cell beyond it.
pub(crate) fn update_piston(grid: &mut CellGrid, id: CellId, sticky: bool) {
    let Some(cell) = grid.cell(id) else { return };
    let (pos, facing, extended) = (cell.pos, cell.direction, cell.state.extended);
    let head_id = if sticky { STICKY_PISTON_HEAD } else { PISTON_HEAD };
    let Some(head_kind) = grid.registry().key_of(head_id) else { return };

    let Some((head_pos, head_dir)) = grid.cell_to(pos, facing, 0) else { return };
    let occupant = grid.cell_at(head_pos).map(|c| (c.id, c.kind, c.direction));

    if extended {
        if let Some((occupant, kind, _)) = occupant {
            if kind == head_kind {
                return;
            }
            if !grid.push_cell(occupant, head_dir, 1, 0).vacated() {
                return;
            }
        }
        set_actually_extended(grid, id, true);
        grid.load_cell(head_pos, head_kind, head_dir);
    } else {
        if let Some((head, kind, direction)) = occupant {
            if kind == head_kind && direction == head_dir {
                let front = grid.cell_to(head_pos, head_dir, 0);
                grid.rm_cell(head);
                if sticky {
                    if let Some((front_pos, front_dir)) = front {
                        if let Some(pulled) = grid.id_at(front_pos) {
                            grid.push_cell(pulled, front_dir.opposite(), 1, 0);
                        }
                    }
                }
            }
        }
        set_actually_extended(grid, id, false);
    }
}

fn set_actually_extended(grid: &mut CellGrid, id: CellId, value: bool) {
    if let Some(cell) = grid.cell_mut(id) {
        cell.state.actually_extended = value;
    }
}

/// Copy itself into one of up to two random directions.
pub(crate) fn update_nuke(grid: &mut CellGrid, id: CellId) {
    let tick = grid.tick_count;
    let Some(cell) = grid.cell(id) else { return };
    if cell.is_generated(tick) {
        return;
    }
    let (pos, kind) = (cell.pos, cell.kind);

    let mut dirs: Vec<Direction> = Direction::ALL.to_vec();
    for _ in 0..NUKE_ATTEMPTS {
        if dirs.is_empty() {
            break;
        }
        let dir = dirs.remove(grid.rng.random_range(0..dirs.len()));

        let Some((target, target_dir)) = grid.cell_to(pos, dir, 0) else { continue };
        if let Some(occupant) = grid.id_at(target) {
            if !grid.push_cell(occupant, target_dir, 1, 0).vacated() {
                continue;
            }
        }
        grid.load_cell(target, kind, target_dir);
        break;
    }
}
