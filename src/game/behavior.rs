/// Per-type behaviour.
///
/// The built-in behaviours are a closed enum dispatched by `match` in the push
/// resolver (`push.rs`) and the scheduler (`scheduler.rs`). Types added by
/// callers use `Behavior::Custom` with a `CellBehavior` implementation.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::game::cell::CellId;
use crate::game::coord::Direction;
use crate::game::grid::CellGrid;
use crate::game::push::{Movement, PushOutcome};

#[derive(Clone)]
pub enum Behavior {
    /// Pushable in every direction, no update (push, unknown).
    Plain,
    Generator,
    Mover,
    /// Rotates the four touching cells by the given quarter turns.
    Rotator(i32),
    Slide,
    Arrow,
    Enemy,
    Trash,
    Wall,
    Border,
    Orientator,
    Disabler,
    Jell,
    RandomRotator,
    Piston { sticky: bool },
    PistonHead,
    Nuke,
    Redirector,
    Tunnel,
    Crossway,
    Crossdirector,
    Custom(Arc<dyn CellBehavior>),
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Plain => write!(f, "Plain"),
            Behavior::Generator => write!(f, "Generator"),
            Behavior::Mover => write!(f, "Mover"),
            Behavior::Rotator(turns) => write!(f, "Rotator({turns})"),
            Behavior::Slide => write!(f, "Slide"),
            Behavior::Arrow => write!(f, "Arrow"),
            Behavior::Enemy => write!(f, "Enemy"),
            Behavior::Trash => write!(f, "Trash"),
            Behavior::Wall => write!(f, "Wall"),
            Behavior::Border => write!(f, "Border"),
            Behavior::Orientator => write!(f, "Orientator"),
            Behavior::Disabler => write!(f, "Disabler"),
            Behavior::Jell => write!(f, "Jell"),
            Behavior::RandomRotator => write!(f, "RandomRotator"),
            Behavior::Piston { sticky } => write!(f, "Piston {{ sticky: {sticky} }}"),
            Behavior::PistonHead => write!(f, "PistonHead"),
            Behavior::Nuke => write!(f, "Nuke"),
            Behavior::Redirector => write!(f, "Redirector"),
            Behavior::Tunnel => write!(f, "Tunnel"),
            Behavior::Crossway => write!(f, "Crossway"),
            Behavior::Crossdirector => write!(f, "Crossdirector"),
            Behavior::Custom(behavior) => write!(f, "Custom({})", behavior.name()),
        }
    }
}

/// Error raised by an extension behaviour during its update.
/// The scheduler logs it and moves on to the next cell.
#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("cell {0:?} vanished during its own update")]
    MissingCell(CellId),
    #[error("{0}")]
    Failed(String),
}

/// Behaviour for cell types registered from outside the crate.
pub trait CellBehavior: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Scheduled update. Errors and panics are contained to this cell.
    fn update(&self, grid: &mut CellGrid, cell: CellId) -> Result<(), BehaviorError>;

    /// Override push resolution. `None` falls back to the standard push.
    /// Recursive pushes should pass `depth + 1` on so looping chains still end.
    fn push(
        &self,
        _grid: &mut CellGrid,
        _cell: CellId,
        _dir: Direction,
        _bias: i32,
        _depth: usize,
    ) -> Option<PushOutcome> {
        None
    }

    /// Override where a cell entering this one ends up. The outer `None`
    /// keeps the entering cell in this slot; `Some(None)` means there is
    /// nowhere to go.
    fn exit_point(
        &self,
        _grid: &CellGrid,
        _cell: CellId,
        _dir: Direction,
        _depth: usize,
    ) -> Option<Option<Movement>> {
        None
    }
}
