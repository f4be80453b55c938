/// The per-tick update scheduler.
///
/// One tick runs every scheduled cell type in ascending update order:
///
/// - **Directional** types run four sub-passes in the fixed order
///   Right, Left, Up, Down. Each sub-pass snapshots the cells of that type
///   facing that way and sorts them front of travel first, so a moving chain
///   frees its slot before the cell behind it acts.
/// - **Random** types run one pass in creation order; cells created during
///   the pass are visited too.
///
/// A cell runs at most once per tick and not at all in a tick it is disabled.
/// An extension behaviour that fails or panics is logged and skipped.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use cellmachine_macros::profile;
use tracing::warn;

use crate::game::behavior::{Behavior, BehaviorError};
use crate::game::cell::CellId;
use crate::game::cell_type::UpdateKind;
use crate::game::cells::{self, utils};
use crate::game::coord::{Direction, Position};
use crate::game::events::TickEvent;
use crate::game::grid::CellGrid;
use crate::game::registry::CellTypeKey;

#[cfg(test)]
mod tests;

/// Priority of the directional sub-passes.
pub const DIRECTIONAL_ORDER: [Direction; 4] = [Direction::Right, Direction::Left, Direction::Up, Direction::Down];

/// Sort key putting the cell furthest along `dir` first.
#[inline]
pub fn front_first_key(dir: Direction, pos: Position) -> i32 {
    match dir {
        Direction::Right => -pos.x,
        Direction::Left => pos.x,
        Direction::Up => -pos.y,
        Direction::Down => pos.y,
    }
}

impl CellGrid {
    /// Run one tick.
    #[profile]
    pub fn do_step(&mut self) {
        self.initial = false;
        let tick = self.tick_count;
        self.emit(TickEvent::Started { tick });

        self.snapshot_motion();
        self.run_update_pass();

        self.tick_count += 1;
        crate::profile_log!(self.tick_count, "Tick {} done, {} cells", tick, self.cell_count());
        self.emit(TickEvent::Ended { tick });
    }

    /// Run `ticks` ticks back to back.
    pub fn run_ticks(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.do_step();
        }
    }

    /// Record where every cell starts the tick.
    fn snapshot_motion(&mut self) {
        for cell in self.collection.iter_mut() {
            cell.old_position = cell.pos;
            cell.rotation_offset = 0;
        }
    }

    fn run_update_pass(&mut self) {
        let registry = Arc::clone(self.registry());
        for &(kind, update_kind) in registry.update_order() {
            match update_kind {
                UpdateKind::Directional => self.run_directional(kind),
                UpdateKind::Random => self.run_random(kind),
            }
        }
    }

    fn run_directional(&mut self, kind: CellTypeKey) {
        for dir in DIRECTIONAL_ORDER {
            let mut batch: Vec<(CellId, Position)> = self
                .collection
                .group(kind)
                .filter_map(|id| self.collection.get(id))
                .filter(|cell| cell.direction == dir)
                .map(|cell| (cell.id, cell.pos))
                .collect();
            batch.sort_by_key(|&(_, pos)| front_first_key(dir, pos));

            for (id, _) in batch {
                self.update_if_eligible(id);
            }
        }
    }

    fn run_random(&mut self, kind: CellTypeKey) {
        let mut cursor = None;
        while let Some(id) = self.collection.next_in_group(kind, cursor) {
            cursor = Some(id);
            self.update_if_eligible(id);
        }
    }

    fn update_if_eligible(&mut self, id: CellId) {
        let tick = self.tick_count;
        let Some(cell) = self.cell(id) else { return };
        if cell.is_disabled(tick) || cell.is_updated(tick) {
            return;
        }

        if let Err(err) = self.update_cell(id) {
            let type_id = self
                .cell(id)
                .map(|c| self.registry().get(c.kind).id.clone())
                .unwrap_or_default();
            warn!("Update of cell {:?} ({}) failed in tick {}: {}", id, type_id, tick, err);
        }

        if let Some(cell) = self.cell_mut(id) {
            cell.updated_in = Some(tick);
        }
    }

    /// Dispatch one cell's update to its behaviour.
    pub fn update_cell(&mut self, id: CellId) -> Result<(), BehaviorError> {
        let Some(cell) = self.cell(id) else {
            return Err(BehaviorError::MissingCell(id));
        };
        let kind = cell.kind;
        let registry = Arc::clone(self.registry());

        match &registry.get(kind).behavior {
            Behavior::Generator => cells::core::update_generator(self, id),
            Behavior::Mover => cells::core::update_mover(self, id),
            Behavior::Rotator(turns) => cells::core::update_rotator(self, id, *turns),
            Behavior::Orientator => utils::update_orientator(self, id),
            Behavior::Disabler => utils::update_disabler(self, id),
            Behavior::Jell => utils::update_jell(self, id),
            Behavior::RandomRotator => utils::update_random_rotator(self, id),
            Behavior::Piston { sticky } => utils::update_piston(self, id, *sticky),
            Behavior::Nuke => utils::update_nuke(self, id),
            Behavior::Custom(behavior) => {
                let behavior = Arc::clone(behavior);
                match catch_unwind(AssertUnwindSafe(|| behavior.update(self, id))) {
                    Ok(result) => return result,
                    Err(_) => {
                        return Err(BehaviorError::Failed(format!("{} panicked", behavior.name())));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}
