/// Bevy host for the cell grid.
///
/// This module is organized into:
/// - **resources**: the `Simulation` (grid, undo stack, run state) and registry
/// - **events**: editor commands and tick notifications
/// - **systems**: command handling and the tick driver
///
/// Each app update runs `SimSet::Input` then `SimSet::Tick`, so edits made in
/// an update are visible to the tick that follows them.

use bevy::prelude::*;

use crate::game::config::SimConfig;

// Module declarations
pub mod events;
pub mod resources;
pub mod systems;


// Re-export commonly used items
pub use events::*;
pub use resources::*;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SimSet {
    Input, // Editor commands
    Tick,  // Grid step and notifications
}

/// Main simulation plugin. Uses the `SimConfig`, `SimRegistry` and
/// `Simulation` resources already in the app, creating defaults otherwise.
pub struct CellMachinePlugin;

impl Plugin for CellMachinePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimConfig>();
        app.init_resource::<SimRegistry>();
        if !app.world().contains_resource::<Simulation>() {
            let config = app.world().resource::<SimConfig>().clone();
            let registry = app.world().resource::<SimRegistry>().0.clone();
            app.insert_resource(Simulation::from_config(&config, registry));
        }

        // Register messages
        app.add_message::<PlaceCell>();
        app.add_message::<LoadLevel>();
        app.add_message::<UndoEdit>();
        app.add_message::<StepOnce>();
        app.add_message::<SetRunning>();
        app.add_message::<TickStarted>();
        app.add_message::<TickEnded>();

        // Configure System Sets
        app.configure_sets(Update, (SimSet::Input, SimSet::Tick).chain());

        app.add_systems(Update, (
            systems::apply_edits.in_set(SimSet::Input),
            systems::run_tick.in_set(SimSet::Tick),
            systems::log_status.in_set(SimSet::Tick).after(systems::run_tick),
        ));
    }
}
