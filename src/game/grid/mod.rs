/// The cell grid: storage, tick counter, border policy and the primitive
/// mutations every behaviour is built from.
///
/// # Mutation primitives
///
/// - `load_cell` creates a cell, replacing any occupant
/// - `rm` / `rm_cell` remove a cell (idempotent)
/// - `rotate` / `set_rotation` / `disable` apply per-type vetoes
/// - `push` resolves a push chain (see `push.rs`)
///
/// `do_step` (see the `scheduler` module) runs one tick. Editing helpers such as
/// area copies and flips live in `grid/actions.rs`.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::behavior::Behavior;
use crate::game::cell::{Cell, CellId};
use crate::game::collection::CellCollection;
use crate::game::coord::{Direction, Position, Size};
use crate::game::events::{TickEvent, TickListener};
use crate::game::level_code::{self, LevelCodeError};
use crate::game::registry::{CellTypeKey, Registry};

mod actions;
mod generate;

/// Seed used when a grid is created without an explicit one.
pub const DEFAULT_SEED: u64 = 0x6a65_6c6c;

/// What happens at the edge of a bounded grid.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorderMode {
    /// Behaves like a wall.
    #[default]
    Default = 0,
    /// Toroidal: leaving one side enters the opposite one.
    Wrap = 1,
    /// Behaves like a trash cell.
    Delete = 2,
}

impl BorderMode {
    /// Level code value; anything outside `0..=2` falls back to `Default`.
    pub fn from_code(value: i64) -> BorderMode {
        match value {
            1 => BorderMode::Wrap,
            2 => BorderMode::Delete,
            _ => BorderMode::Default,
        }
    }

    pub fn as_code(self) -> u8 {
        self as u8
    }
}

/// Static per-slot markings (not cells).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// The player may place cells here in puzzle mode.
    Placeable,
}

#[derive(Clone)]
pub struct CellGrid {
    registry: Arc<Registry>,
    pub size: Size,
    /// Unbounded grids accept any position; `size` is then only a hint.
    pub infinite: bool,
    pub border_mode: BorderMode,
    pub name: String,
    pub description: String,
    pub tiles: FxHashMap<Position, Tile>,
    pub(crate) collection: CellCollection,
    pub tick_count: u64,
    /// True until the first tick starts.
    pub initial: bool,
    next_id: u64,
    pub(crate) rng: StdRng,
    listeners: Vec<Arc<dyn TickListener>>,
}

impl std::fmt::Debug for CellGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellGrid")
            .field("size", &self.size)
            .field("infinite", &self.infinite)
            .field("border_mode", &self.border_mode)
            .field("cells", &self.collection.len())
            .field("tick_count", &self.tick_count)
            .finish()
    }
}

impl CellGrid {
    pub fn new(registry: Arc<Registry>, width: i32, height: i32) -> Self {
        Self {
            registry,
            size: Size::new(width, height),
            infinite: false,
            border_mode: BorderMode::Default,
            name: String::new(),
            description: String::new(),
            tiles: FxHashMap::default(),
            collection: CellCollection::new(),
            tick_count: 0,
            initial: true,
            next_id: 0,
            rng: StdRng::seed_from_u64(DEFAULT_SEED),
            listeners: Vec::new(),
        }
    }

    pub fn new_infinite(registry: Arc<Registry>) -> Self {
        let mut grid = Self::new(registry, 0, 0);
        grid.infinite = true;
        grid
    }

    /// Reseed the RNG used by random-choice cells.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn with_border(mut self, border_mode: BorderMode) -> Self {
        self.border_mode = border_mode;
        self
    }

    /// Decode a level code with any format registered in `registry`.
    pub fn from_level_code(registry: &Arc<Registry>, code: &str) -> Result<CellGrid, LevelCodeError> {
        level_code::import(registry, code)
    }

    /// Encode this grid with the named level code format.
    pub fn export(&self, format: &str) -> Result<String, LevelCodeError> {
        level_code::export(self, format)
    }

    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Drop every cell and tile and start over at tick 0 with a new size.
    pub fn reset(&mut self, width: i32, height: i32) {
        self.size = Size::new(width, height);
        self.collection.clear();
        self.tiles.clear();
        self.tick_count = 0;
        self.initial = true;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        self.infinite || self.size.contains(pos)
    }

    #[inline]
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.collection.get(id)
    }

    #[inline]
    pub(crate) fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.collection.get_mut(id)
    }

    #[inline]
    pub fn cell_at(&self, pos: Position) -> Option<&Cell> {
        self.collection.at(pos)
    }

    #[inline]
    pub fn id_at(&self, pos: Position) -> Option<CellId> {
        self.collection.id_at(pos)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.collection.iter()
    }

    /// Live cells sorted row-major from the bottom row, for stable output.
    pub fn cells_sorted(&self) -> Vec<&Cell> {
        let mut cells: Vec<&Cell> = self.collection.iter().collect();
        cells.sort_by_key(|c| (c.pos.y, c.pos.x));
        cells
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.collection.len()
    }

    /// Type id of the cell at `pos`, if any.
    pub fn type_id_at(&self, pos: Position) -> Option<&str> {
        self.cell_at(pos).map(|c| self.registry.get(c.kind).id.as_str())
    }

    pub fn tile(&self, pos: Position) -> Option<Tile> {
        self.tiles.get(&pos).copied()
    }

    pub fn set_tile(&mut self, pos: Position, tile: Option<Tile>) {
        match tile {
            Some(tile) => {
                self.tiles.insert(pos, tile);
            }
            None => {
                self.tiles.remove(&pos);
            }
        }
    }

    // ========================================================================
    // Mutation primitives
    // ========================================================================

    /// Create a cell at `pos`, removing any occupant first.
    /// Returns `None` when `pos` is outside a bounded grid.
    pub fn load_cell(&mut self, pos: Position, kind: CellTypeKey, direction: Direction) -> Option<CellId> {
        if !self.in_bounds(pos) || self.registry.try_get(kind).is_none() {
            return None;
        }
        let id = CellId(self.next_id);
        self.next_id += 1;
        let generated_in = if self.initial { None } else { Some(self.tick_count) };
        self.collection.insert(Cell::new(id, pos, kind, direction, generated_in));
        Some(id)
    }

    /// `load_cell` by type id.
    pub fn place(&mut self, pos: Position, type_id: &str, direction: Direction) -> Option<CellId> {
        let kind = self.registry.key_of(type_id)?;
        self.load_cell(pos, kind, direction)
    }

    /// Remove the cell at `pos`. The returned copy is marked deleted.
    pub fn rm(&mut self, pos: Position) -> Option<Cell> {
        let id = self.collection.id_at(pos)?;
        self.rm_cell(id)
    }

    /// Remove a cell by id. Removing an already removed cell is a no-op.
    pub fn rm_cell(&mut self, id: CellId) -> Option<Cell> {
        let mut cell = self.collection.remove(id)?;
        cell.deleted = true;
        Some(cell)
    }

    pub(crate) fn move_cell(&mut self, id: CellId, pos: Position) {
        if let Some(evicted) = self.collection.relocate(id, pos) {
            debug!("Cell {:?} moved onto {:?}, evicting {:?}", id, pos, evicted.id);
        }
    }

    /// Whether the cell's behaviour and type allow turning it to `direction`.
    fn can_rotate(&self, cell: &Cell, direction: Direction) -> bool {
        let cell_type = self.registry.get(cell.kind);
        let behavior_allows = match cell_type.behavior {
            Behavior::Orientator | Behavior::PistonHead => false,
            Behavior::Piston { .. } => !cell.state.extended,
            _ => true,
        };
        behavior_allows && cell_type.on_rotate.map_or(true, |hook| hook(cell, direction))
    }

    /// Rotate the cell at `pos` by `offset` quarter turns (clockwise positive).
    pub fn rotate(&mut self, pos: Position, offset: i32) {
        let Some(cell) = self.collection.at(pos) else { return };
        let direction = cell.direction.rotate(offset);
        if !self.can_rotate(cell, direction) {
            return;
        }
        let id = cell.id;
        if let Some(cell) = self.collection.get_mut(id) {
            cell.direction = direction;
            cell.rotation_offset += offset;
        }
    }

    /// Turn the cell at `pos` to face `direction`; the recorded offset is the
    /// shortest signed turn in `-1..=2`.
    pub fn set_rotation(&mut self, pos: Position, direction: Direction) {
        let Some(cell) = self.collection.at(pos) else { return };
        if !self.can_rotate(cell, direction) {
            return;
        }
        let diff = cell.direction.turns_to(direction);
        let offset = if diff > 2 { diff - 4 } else { diff };
        let id = cell.id;
        if let Some(cell) = self.collection.get_mut(id) {
            cell.direction = direction;
            cell.rotation_offset = offset;
        }
    }

    /// Disable the cell at `pos` for the current tick only.
    pub fn disable(&mut self, pos: Position) {
        let Some(cell) = self.collection.at(pos) else { return };
        let cell_type = self.registry.get(cell.kind);
        if matches!(cell_type.behavior, Behavior::Disabler) {
            return;
        }
        if let Some(hook) = cell_type.on_disable {
            if !hook(cell) {
                return;
            }
        }
        let (id, tick) = (cell.id, self.tick_count);
        if let Some(cell) = self.collection.get_mut(id) {
            cell.disabled_in = Some(tick);
        }
    }

    /// True if the cell at `pos` is disabled in the current tick.
    pub fn is_disabled(&self, pos: Position) -> bool {
        self.cell_at(pos).is_some_and(|c| c.is_disabled(self.tick_count))
    }

    // ========================================================================
    // Tick listeners
    // ========================================================================

    pub fn add_listener(&mut self, listener: Arc<dyn TickListener>) {
        self.listeners.push(listener);
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub(crate) fn emit(&self, event: TickEvent) {
        for listener in &self.listeners {
            listener.on_tick(event);
        }
    }
}
