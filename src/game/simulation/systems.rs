/// Host systems: editor command handling and the tick driver.

use bevy::prelude::*;
use cellmachine_macros::profile;

use crate::game::level_code;

use super::events::*;
use super::resources::*;

// ============================================================================
// Editor Commands
// ============================================================================

/// Apply queued editor commands in a fixed order: level loads, placements,
/// undo, then run-state changes.
#[profile]
pub fn apply_edits(
    mut sim: ResMut<Simulation>,
    registry: Res<SimRegistry>,
    mut loads: MessageReader<LoadLevel>,
    mut places: MessageReader<PlaceCell>,
    mut undos: MessageReader<UndoEdit>,
    mut run_state: MessageReader<SetRunning>,
    mut steps: MessageReader<StepOnce>,
) {
    let sim = &mut *sim;

    for event in loads.read() {
        match level_code::import(&registry.0, &event.code) {
            Ok(grid) => {
                info!(
                    "Loaded level '{}': {}x{}, {} cells",
                    grid.name,
                    grid.size.width,
                    grid.size.height,
                    grid.cell_count()
                );
                sim.replace_grid(grid);
            }
            Err(e) => error!("Failed to load level: {}", e),
        }
    }

    let mut edited = false;
    for event in places.read() {
        sim.undo.record(&sim.grid, event.pos);
        edited = true;
        match &event.type_id {
            Some(type_id) => {
                if sim.grid.place(event.pos, type_id, event.direction).is_none() {
                    warn!("Cannot place '{}' at {}", type_id, event.pos);
                }
            }
            None => {
                sim.grid.rm(event.pos);
            }
        }
    }
    if edited {
        sim.undo.finish();
    }

    for _ in undos.read() {
        if !sim.undo.undo_on(&mut sim.grid, |_, _| {}) {
            debug!("Nothing to undo");
        }
    }

    if let Some(event) = run_state.read().last() {
        sim.running = event.running;
    }
    sim.pending_steps += steps.read().count() as u32;
}

// ============================================================================
// Tick Driver
// ============================================================================

/// Advance the grid by one tick while running, or once per pending `StepOnce`.
#[profile(16)]
pub fn run_tick(
    mut sim: ResMut<Simulation>,
    mut started: MessageWriter<TickStarted>,
    mut ended: MessageWriter<TickEnded>,
) {
    if !sim.running {
        if sim.pending_steps == 0 {
            return;
        }
        sim.pending_steps -= 1;
    }

    let tick = sim.tick();
    started.write(TickStarted { tick });
    sim.grid.do_step();
    ended.write(TickEnded { tick });
}

/// Log simulation status periodically
pub fn log_status(#[allow(unused_variables)] sim: Res<Simulation>) {
    use crate::profile_log;

    profile_log!(sim.tick(), "[SIM STATUS] Tick: {} | Cells: {} | Undo depth: {}",
        sim.tick(), sim.grid.cell_count(), sim.undo.depth());
}
