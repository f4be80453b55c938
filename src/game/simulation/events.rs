/// Messages into and out of the simulation.
///
/// Editor commands are applied in `SimSet::Input`; tick notifications are
/// written from `SimSet::Tick` and are read-only for observers.

use bevy::prelude::*;

use crate::game::coord::{Direction, Position};

// ============================================================================
// Editor Commands
// ============================================================================

/// Place a cell (or clear the slot when `type_id` is `None`). All placements
/// received in one update form a single undo step.
#[derive(Message, Debug, Clone)]
pub struct PlaceCell {
    pub pos: Position,
    pub type_id: Option<String>,
    pub direction: Direction,
}

/// Replace the grid with one decoded from a level code.
#[derive(Message, Debug, Clone)]
pub struct LoadLevel {
    pub code: String,
}

/// Revert the most recent batch of placements.
#[derive(Message, Debug, Clone, Copy)]
pub struct UndoEdit;

/// Run exactly one tick, even while paused.
#[derive(Message, Debug, Clone, Copy)]
pub struct StepOnce;

#[derive(Message, Debug, Clone, Copy)]
pub struct SetRunning {
    pub running: bool,
}

// ============================================================================
// Tick Notifications
// ============================================================================

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickStarted {
    pub tick: u64,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEnded {
    pub tick: u64,
}
