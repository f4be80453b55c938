/// Push resolution.
///
/// A push walks one step in the push direction, asks the occupant of that slot
/// where an entering cell actually ends up (`exit_point`, which lets tunnels and
/// redirectors bend the path), then recursively pushes whatever sits there.
///
/// # Outcomes
///
/// Internally a push has four outcomes. `Absorbed` is only ever seen by the
/// cell directly touching an absorber (Trash, Enemy, a piston hit from
/// behind): that cell is removed and reports `Consumed` to its own pusher.
///
/// | target reports | pusher does                 | pusher reports |
/// |----------------|-----------------------------|----------------|
/// | `Moved`        | moves into the freed slot   | `Moved`        |
/// | `Consumed`     | moves into the freed slot   | `Consumed`     |
/// | `Absorbed`     | is removed                  | `Consumed`     |
/// | `Blocked`      | stays                       | `Blocked`      |
///
/// Recursion (both pushes and exit-point lookups) is bounded by the number of
/// live cells; hitting the bound means the chain loops and resolves `Blocked`.

use std::sync::Arc;

use tracing::trace;

use crate::game::behavior::Behavior;
use crate::game::cell::CellId;
use crate::game::coord::{Direction, Position};
use crate::game::grid::{BorderMode, CellGrid};

/// Public tri-state result of a push.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PushResult {
    /// Nothing moved.
    Blocked,
    /// The chain advanced one slot.
    Moved,
    /// Something in the chain was destroyed and the slot ahead is free.
    Consumed,
}

/// Detailed result of pushing one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PushOutcome {
    Blocked,
    Moved,
    /// The pushed cell destroys whatever pushes it.
    Absorbed,
    /// A cell further along was destroyed; this one moved into the gap.
    Consumed,
}

impl PushOutcome {
    /// Did the slot that was pushed into become free?
    #[inline]
    pub fn vacated(self) -> bool {
        matches!(self, PushOutcome::Moved | PushOutcome::Consumed)
    }
}

impl From<PushOutcome> for PushResult {
    fn from(outcome: PushOutcome) -> Self {
        match outcome {
            PushOutcome::Blocked => PushResult::Blocked,
            PushOutcome::Moved => PushResult::Moved,
            PushOutcome::Absorbed | PushOutcome::Consumed => PushResult::Consumed,
        }
    }
}

/// Where a cell entering a slot ends up, and which way it is travelling then.
pub type Movement = (Position, Direction);

impl CellGrid {
    /// Push the cell at `pos` in `dir` with force `bias`.
    /// An empty slot cannot be pushed and reports `Blocked`.
    pub fn push(&mut self, pos: Position, dir: Direction, bias: i32) -> PushResult {
        match self.id_at(pos) {
            Some(id) => self.push_cell(id, dir, bias, 0).into(),
            None => PushResult::Blocked,
        }
    }

    #[inline]
    fn depth_exceeded(&self, depth: usize) -> bool {
        depth > self.cell_count() + 1
    }

    /// Push with the per-type overrides applied.
    pub fn push_cell(&mut self, id: CellId, dir: Direction, bias: i32, depth: usize) -> PushOutcome {
        if self.depth_exceeded(depth) {
            trace!("Push chain through {:?} loops, treating as blocked", id);
            return PushOutcome::Blocked;
        }
        let Some(cell) = self.cell(id) else {
            return PushOutcome::Blocked;
        };
        let disabled = cell.is_disabled(self.tick_count);
        let facing = cell.direction;
        let state = cell.state;
        let kind = cell.kind;
        let registry = Arc::clone(self.registry());

        match &registry.get(kind).behavior {
            Behavior::Mover if !disabled => {
                let bias = if dir == facing {
                    bias + 1
                } else if dir == facing.opposite() {
                    bias - 1
                } else {
                    bias
                };
                self.base_push(id, dir, bias, depth)
            }
            Behavior::Slide if !disabled && !dir.is_parallel(facing) => PushOutcome::Blocked,
            Behavior::Arrow if !disabled && dir != facing => PushOutcome::Blocked,
            Behavior::Enemy if !disabled => {
                self.rm_cell(id);
                PushOutcome::Absorbed
            }
            Behavior::Trash if !disabled => PushOutcome::Absorbed,
            Behavior::Wall | Behavior::Border | Behavior::PistonHead => PushOutcome::Blocked,
            Behavior::Piston { .. } => {
                if dir == facing {
                    if let Some(cell) = self.cell_mut(id) {
                        cell.state.extended = !cell.state.extended;
                    }
                    PushOutcome::Absorbed
                } else if state.extended || state.actually_extended {
                    PushOutcome::Blocked
                } else {
                    self.base_push(id, dir, bias, depth)
                }
            }
            Behavior::Custom(behavior) => match behavior.push(self, id, dir, bias, depth) {
                Some(outcome) => outcome,
                None => self.base_push(id, dir, bias, depth),
            },
            _ => self.base_push(id, dir, bias, depth),
        }
    }

    /// Push without per-type overrides: the movement every cell shares.
    pub fn base_push(&mut self, id: CellId, dir: Direction, bias: i32, depth: usize) -> PushOutcome {
        if bias < 1 {
            return PushOutcome::Blocked;
        }
        let Some(pos) = self.cell(id).map(|c| c.pos) else {
            return PushOutcome::Blocked;
        };

        let Some((target, push_dir)) = self.cell_to(pos, dir, depth) else {
            if self.border_mode == BorderMode::Delete {
                self.rm_cell(id);
                return PushOutcome::Consumed;
            }
            return PushOutcome::Blocked;
        };

        let outcome = match self.id_at(target) {
            None => PushOutcome::Moved,
            Some(occupant) if occupant == id => return PushOutcome::Blocked,
            Some(occupant) => self.push_cell(occupant, push_dir, bias, depth + 1),
        };

        match outcome {
            PushOutcome::Moved | PushOutcome::Consumed => {
                if self.cell(id).is_none() {
                    return PushOutcome::Consumed;
                }
                self.move_turning(id, target, dir, push_dir);
                outcome
            }
            PushOutcome::Absorbed => {
                self.rm_cell(id);
                PushOutcome::Consumed
            }
            PushOutcome::Blocked => PushOutcome::Blocked,
        }
    }

    /// Move a cell, turning it by however much a redirect bent its path.
    fn move_turning(&mut self, id: CellId, target: Position, requested: Direction, actual: Direction) {
        self.move_cell(id, target);
        if requested != actual {
            if let Some(cell) = self.cell_mut(id) {
                cell.direction = cell.direction.rotate(actual as i32 - requested as i32);
            }
        }
    }

    /// The slot a cell at `pos` travelling `dir` would enter.
    ///
    /// Steps once, applies the border policy, then asks the occupant (if any)
    /// for its exit point. `None` means there is nowhere to go.
    pub fn cell_to(&self, pos: Position, dir: Direction, depth: usize) -> Option<Movement> {
        let mut next = pos.step(dir);
        if !self.in_bounds(next) {
            if self.border_mode != BorderMode::Wrap {
                return None;
            }
            next = self.size.wrap(next);
        }
        match self.id_at(next) {
            None => Some((next, dir)),
            Some(occupant) => self.exit_point(occupant, dir, depth + 1),
        }
    }

    /// Where a cell entering `id`'s slot while travelling `dir` ends up.
    pub fn exit_point(&self, id: CellId, dir: Direction, depth: usize) -> Option<Movement> {
        if self.depth_exceeded(depth) {
            return None;
        }
        let cell = self.cell(id)?;
        let (pos, facing) = (cell.pos, cell.direction);

        match self.registry().get(cell.kind).behavior {
            Behavior::Border => match self.border_mode {
                BorderMode::Wrap => self.cell_to(pos, dir, depth),
                _ => None,
            },
            Behavior::Redirector => {
                if dir == facing.rotate(2) {
                    self.cell_to(pos, facing.rotate(1), depth)
                } else if dir == facing.rotate(3) {
                    self.cell_to(pos, facing, depth)
                } else {
                    Some((pos, dir))
                }
            }
            Behavior::Tunnel => {
                if dir.is_parallel(facing) {
                    self.cell_to(pos, dir, depth)
                } else {
                    Some((pos, dir))
                }
            }
            Behavior::Crossway => self.cell_to(pos, dir, depth),
            Behavior::Custom(ref behavior) => behavior
                .exit_point(self, id, dir, depth)
                .unwrap_or(Some((pos, dir))),
            Behavior::Crossdirector => match facing.turns_to(dir) {
                0 => self.cell_to(pos, facing.rotate(3), depth),
                1 => self.cell_to(pos, facing.rotate(2), depth),
                2 => self.cell_to(pos, facing.rotate(1), depth),
                _ => self.cell_to(pos, facing, depth),
            },
            _ => Some((pos, dir)),
        }
    }
}
