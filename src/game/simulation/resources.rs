/// Resources shared by the host systems.

use std::sync::Arc;

use bevy::prelude::*;

use crate::game::config::SimConfig;
use crate::game::grid::CellGrid;
use crate::game::registry::Registry;
use crate::game::undo::UndoStack;

// ============================================================================
// Simulation State
// ============================================================================

/// The grid being simulated plus the editor state around it.
#[derive(Resource)]
pub struct Simulation {
    pub grid: CellGrid,
    pub undo: UndoStack,
    /// Tick every update while set.
    pub running: bool,
    /// Single ticks requested through `StepOnce` and not yet run.
    pub pending_steps: u32,
}

impl Simulation {
    pub fn new(grid: CellGrid) -> Self {
        Self { grid, undo: UndoStack::new(), running: false, pending_steps: 0 }
    }

    /// Empty grid sized, bordered and seeded from `config`.
    pub fn from_config(config: &SimConfig, registry: Arc<Registry>) -> Self {
        let grid = CellGrid::new(registry, config.default_width, config.default_height)
            .with_border(config.border_mode)
            .with_seed(config.seed);
        Self::new(grid)
    }

    /// Swap in a new grid. Undo history belongs to the old one and is dropped.
    pub fn replace_grid(&mut self, grid: CellGrid) {
        self.grid = grid;
        self.undo.clear();
        self.pending_steps = 0;
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.grid.tick_count
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Registry new grids are built with. Shared with every grid it creates.
#[derive(Resource, Clone)]
pub struct SimRegistry(pub Arc<Registry>);

impl Default for SimRegistry {
    fn default() -> Self {
        Self(Arc::new(Registry::with_builtins()))
    }
}
