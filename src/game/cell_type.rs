/// Cell type descriptors.
///
/// A `CellType` is immutable once registered. It pairs a `Behavior` with the
/// data the scheduler and editing tools need: update class and priority,
/// flip/merge transforms and rotate/disable vetoes.

use serde::{Deserialize, Serialize};

use crate::game::behavior::Behavior;
use crate::game::cell::{Cell, CellData};
use crate::game::coord::Direction;
use crate::game::registry::Registry;

// ============================================================================
// Scheduling
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateKind {
    /// Four sub-passes (Right, Left, Up, Down), front of travel first.
    Directional,
    /// One pass in creation order.
    Random,
}

/// When a type runs during a tick. Lower `order` runs earlier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateSchedule {
    pub kind: UpdateKind,
    pub order: f32,
}

// ============================================================================
// Hooks
// ============================================================================

/// Returns the `(type, direction)` a cell becomes when mirrored.
/// `horizontal` mirrors across the vertical axis (Right <-> Left).
pub type FlipFn = fn(&Registry, CellData, bool) -> CellData;
/// Combines the existing cell (first) with an incoming pasted cell (second).
pub type MergeFn = fn(&Registry, CellData, CellData) -> CellData;
/// Return `false` to veto rotating `cell` to the given direction.
pub type RotateHook = fn(&Cell, Direction) -> bool;
/// Return `false` to veto disabling `cell`.
pub type DisableHook = fn(&Cell) -> bool;

/// Mirror Right <-> Left (horizontal) or Up <-> Down (vertical).
pub fn flip_one_way(_: &Registry, (kind, dir): CellData, horizontal: bool) -> CellData {
    let flipped = match (horizontal, dir) {
        (true, Direction::Right) => Direction::Left,
        (true, Direction::Left) => Direction::Right,
        (false, Direction::Up) => Direction::Down,
        (false, Direction::Down) => Direction::Up,
        (_, other) => other,
    };
    (kind, flipped)
}

/// Mirror for diagonal cells (redirectors), which swap adjacent sides.
pub fn flip_two_way(_: &Registry, (kind, dir): CellData, horizontal: bool) -> CellData {
    let flipped = if horizontal {
        match dir {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Left,
        }
    } else {
        match dir {
            Direction::Right => Direction::Up,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Up => Direction::Right,
        }
    };
    (kind, flipped)
}

/// Symmetric cells look the same mirrored.
pub fn flip_identity(_: &Registry, data: CellData, _: bool) -> CellData {
    data
}

/// Keep whatever is already on the grid.
pub fn merge_keep(_: &Registry, existing: CellData, _: CellData) -> CellData {
    existing
}

pub fn never(_: &Cell, _: Direction) -> bool {
    false
}

pub fn never_disable(_: &Cell) -> bool {
    false
}

// ============================================================================
// CellType
// ============================================================================

#[derive(Clone, Debug)]
pub struct CellType {
    /// Namespaced identifier, e.g. `jm.core.mover`.
    pub id: String,
    /// Single-byte id used by the binary J1 format.
    pub raw_id: Option<u8>,
    pub name: String,
    pub description: String,
    pub texture: String,
    pub behavior: Behavior,
    pub update: Option<UpdateSchedule>,
    pub flip: Option<FlipFn>,
    pub merge: Option<MergeFn>,
    pub on_rotate: Option<RotateHook>,
    pub on_disable: Option<DisableHook>,
}

impl CellType {
    pub fn new(id: impl Into<String>, name: impl Into<String>, behavior: Behavior) -> Self {
        let id = id.into();
        Self {
            texture: id.rsplit('.').next().unwrap_or_default().to_string(),
            id,
            raw_id: None,
            name: name.into(),
            description: String::new(),
            behavior,
            update: None,
            flip: None,
            merge: None,
            on_rotate: None,
            on_disable: None,
        }
    }

    pub fn raw_id(mut self, raw_id: u8) -> Self {
        self.raw_id = Some(raw_id);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = texture.into();
        self
    }

    pub fn updates(mut self, kind: UpdateKind, order: f32) -> Self {
        self.update = Some(UpdateSchedule { kind, order });
        self
    }

    pub fn flip_with(mut self, flip: FlipFn) -> Self {
        self.flip = Some(flip);
        self
    }

    pub fn merge_with(mut self, merge: MergeFn) -> Self {
        self.merge = Some(merge);
        self
    }

    pub fn on_rotate(mut self, hook: RotateHook) -> Self {
        self.on_rotate = Some(hook);
        self
    }

    pub fn on_disable(mut self, hook: DisableHook) -> Self {
        self.on_disable = Some(hook);
        self
    }

    /// Mirrored `(type, direction)` for `cell`.
    pub fn flipped(&self, registry: &Registry, cell: CellData, horizontal: bool) -> CellData {
        match self.flip {
            Some(flip) => flip(registry, cell, horizontal),
            None => flip_one_way(registry, cell, horizontal),
        }
    }

    /// Result of pasting `incoming` over `existing` (a cell of this type).
    /// Without a merge hook the incoming cell wins.
    pub fn merged(&self, registry: &Registry, existing: CellData, incoming: CellData) -> CellData {
        match self.merge {
            Some(merge) => merge(registry, existing, incoming),
            None => incoming,
        }
    }

    /// Texture selector; pistons swap texture while extended.
    pub fn texture_for(&self, cell: &Cell) -> &str {
        match self.behavior {
            Behavior::Piston { .. } if cell.state.actually_extended => "pistonOn",
            _ => &self.texture,
        }
    }
}
