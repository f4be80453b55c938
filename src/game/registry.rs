/// Registry of cell types, palette slots and level code formats.
///
/// Built once at startup (`Registry::with_builtins`) and shared read-only
/// behind an `Arc` by every grid created from it. Registration order matters:
/// types with equal update order run in the order they were registered.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::game::cell_type::{CellType, UpdateKind};
use crate::game::cells;
use crate::game::level_code::{self, LevelCodeFormat};

/// Index of a registered cell type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellTypeKey(pub u16);

/// A cyclable palette of cell types (editor convenience).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub cells: SmallVec<[CellTypeKey; 4]>,
}

#[derive(Default)]
pub struct Registry {
    cells: Vec<CellType>,
    by_id: FxHashMap<String, CellTypeKey>,
    by_raw_id: FxHashMap<u8, CellTypeKey>,
    slots: Vec<Slot>,
    level_codes: BTreeMap<String, LevelCodeFormat>,
    update_order: Vec<(CellTypeKey, UpdateKind)>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("cells", &self.cells.len())
            .field("slots", &self.slots.len())
            .field("level_codes", &self.level_codes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// An empty registry. Most callers want `with_builtins`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Core, utility and tunneling packs plus the V1/V3/J1 level codes.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        cells::core::register(&mut registry);
        cells::utils::register(&mut registry);
        cells::tunneling::register(&mut registry);
        level_code::register_builtin_formats(&mut registry);
        debug!(
            "Registry ready: {} cell types, {} level code formats",
            registry.cells.len(),
            registry.level_codes.len()
        );
        registry
    }

    // ========================================================================
    // Cell types
    // ========================================================================

    /// Register a type. Re-registering an id replaces the old descriptor in place
    /// and keeps its key.
    pub fn register_cell(&mut self, cell_type: CellType) -> CellTypeKey {
        let key = match self.by_id.get(&cell_type.id) {
            Some(&key) => {
                self.cells[key.0 as usize] = cell_type;
                key
            }
            None => {
                let key = CellTypeKey(self.cells.len() as u16);
                self.by_id.insert(cell_type.id.clone(), key);
                self.cells.push(cell_type);
                key
            }
        };

        if let Some(raw_id) = self.cells[key.0 as usize].raw_id {
            self.by_raw_id.insert(raw_id, key);
        }
        self.rebuild_update_order();
        key
    }

    fn rebuild_update_order(&mut self) {
        let mut scheduled: Vec<(CellTypeKey, UpdateKind, f32)> = self
            .cells
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.update.map(|u| (CellTypeKey(i as u16), u.kind, u.order)))
            .collect();
        // Stable: ties keep registration order.
        scheduled.sort_by(|a, b| a.2.total_cmp(&b.2));
        self.update_order = scheduled.into_iter().map(|(k, kind, _)| (k, kind)).collect();
    }

    #[inline]
    pub fn get(&self, key: CellTypeKey) -> &CellType {
        &self.cells[key.0 as usize]
    }

    pub fn try_get(&self, key: CellTypeKey) -> Option<&CellType> {
        self.cells.get(key.0 as usize)
    }

    pub fn key_of(&self, id: &str) -> Option<CellTypeKey> {
        self.by_id.get(id).copied()
    }

    pub fn by_id(&self, id: &str) -> Option<&CellType> {
        self.key_of(id).map(|k| self.get(k))
    }

    pub fn key_of_raw(&self, raw_id: u8) -> Option<CellTypeKey> {
        self.by_raw_id.get(&raw_id).copied()
    }

    /// Key of the `?` placeholder used for ids this build does not know.
    pub fn unknown_key(&self) -> Option<CellTypeKey> {
        self.key_of(cells::core::UNKNOWN)
    }

    /// Resolve an id, falling back to the unknown placeholder.
    pub fn key_or_unknown(&self, id: &str) -> Option<CellTypeKey> {
        self.key_of(id).or_else(|| self.unknown_key())
    }

    pub fn cell_types(&self) -> impl Iterator<Item = (CellTypeKey, &CellType)> {
        self.cells.iter().enumerate().map(|(i, t)| (CellTypeKey(i as u16), t))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Scheduled `(type, kind)` pairs in ascending update order.
    pub fn update_order(&self) -> &[(CellTypeKey, UpdateKind)] {
        &self.update_order
    }

    // ========================================================================
    // Slots
    // ========================================================================

    /// Add a palette slot from type ids; unknown ids are skipped.
    pub fn add_slot(&mut self, ids: &[&str]) {
        let cells: SmallVec<[CellTypeKey; 4]> = ids.iter().filter_map(|id| self.key_of(id)).collect();
        if !cells.is_empty() {
            self.slots.push(Slot { cells });
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    // ========================================================================
    // Level codes
    // ========================================================================

    pub fn register_level_code(&mut self, format: LevelCodeFormat) {
        self.level_codes.insert(format.id.clone(), format);
    }

    pub fn level_code(&self, id: &str) -> Option<&LevelCodeFormat> {
        self.level_codes.get(id)
    }

    pub fn level_codes(&self) -> impl Iterator<Item = &LevelCodeFormat> {
        self.level_codes.values()
    }
}
