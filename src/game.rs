//! Typed directional cell grid simulation.
//!
//! Cells sit on an integer grid, face one of four directions and follow the
//! behaviour of their registered type. A tick runs every scheduled type in
//! update order; movement resolves through push chains. Grids round-trip
//! through level codes and sync over a small binary protocol.

pub mod behavior;
pub mod cell;
pub mod cell_type;
pub mod cells;
pub mod collection;
pub mod config;
pub mod coord;
pub mod events;
pub mod grid;
pub mod level_code;
pub mod multiplayer;
pub mod push;
pub mod registry;
pub mod scheduler;
pub mod simulation;
pub mod undo;

pub use coord::{Direction, Position, Rect, Size};
pub use grid::{BorderMode, CellGrid, Tile};
pub use registry::Registry;
pub use simulation::CellMachinePlugin;
