/// Editing actions on whole grids and rectangular areas.
///
/// Whole-grid transforms (`rotate_cw`, `flip_horizontal`, ...) return a new
/// grid sharing this grid's registry and border mode; area actions mutate in
/// place. Only type and direction survive a transform, like a level code.

use crate::game::cell::CellData;
use crate::game::coord::{Direction, Position, Rect, Size};
use crate::game::registry::CellTypeKey;

use super::{CellGrid, Tile};

impl CellGrid {
    /// An empty grid with the same registry, border mode and metadata.
    fn blank_like(&self, size: Size) -> CellGrid {
        let mut grid = CellGrid::new(self.registry().clone(), size.width, size.height);
        grid.border_mode = self.border_mode;
        grid.name = self.name.clone();
        grid.description = self.description.clone();
        grid
    }

    fn transformed(&self, size: Size, map: impl Fn(Position, CellData) -> (Position, CellData)) -> CellGrid {
        let mut grid = self.blank_like(size);
        for cell in self.cells_sorted() {
            let (pos, (kind, direction)) = map(cell.pos, cell.data());
            grid.load_cell(pos, kind, direction);
        }
        grid
    }

    /// Copy the cells inside `area` into a new grid of the area's size.
    /// Positions are rebased so the area's bottom-left corner becomes `(0, 0)`.
    pub fn clone_area(&self, area: Rect) -> CellGrid {
        let mut grid = self.blank_like(Size::new(area.width, area.height));
        for pos in area.positions() {
            if let Some(cell) = self.cell_at(pos) {
                let local = Position::new(pos.x - area.left, pos.y - area.bottom);
                grid.load_cell(local, cell.kind, cell.direction);
            }
        }
        grid
    }

    /// Paste `selection` with its origin at `at`. With `smart_merge`, an
    /// occupied slot combines both cells through the existing cell's merge hook.
    pub fn insert(&mut self, selection: &CellGrid, at: Position, smart_merge: bool) {
        for cell in selection.cells_sorted() {
            let pos = cell.pos.offset(at.x, at.y);
            let incoming = cell.data();
            let (kind, direction) = match self.cell_at(pos) {
                Some(existing) if smart_merge => {
                    let registry = self.registry();
                    registry.get(existing.kind).merged(registry, existing.data(), incoming)
                }
                _ => incoming,
            };
            self.load_cell(pos, kind, direction);
        }
    }

    /// Remove every cell inside `area`.
    pub fn clear(&mut self, area: Rect) {
        for pos in area.positions() {
            self.rm(pos);
        }
    }

    /// Shift every cell inside `area` one slot towards `dir`. Cells shifted
    /// out of a bounded grid are lost.
    pub fn move_area(&mut self, area: Rect, dir: Direction) {
        let mut positions: Vec<Position> = area.positions().collect();
        // Leading edge first so no cell lands on one that has not moved yet.
        positions.sort_by_key(|p| -(p.x * dir.offset().0 + p.y * dir.offset().1));

        for pos in positions {
            if let Some(cell) = self.rm(pos) {
                self.load_cell(pos.step(dir), cell.kind, cell.direction);
            }
        }
    }

    /// The whole grid turned a quarter clockwise.
    pub fn rotate_cw(&self) -> CellGrid {
        let Size { width, height } = self.size;
        self.transformed(Size::new(height, width), |pos, (kind, dir)| {
            (Position::new(pos.y, width - pos.x - 1), (kind, dir.rotate(1)))
        })
    }

    /// The whole grid turned a quarter counter-clockwise.
    pub fn rotate_ccw(&self) -> CellGrid {
        let Size { width, height } = self.size;
        self.transformed(Size::new(height, width), |pos, (kind, dir)| {
            (Position::new(height - pos.y - 1, pos.x), (kind, dir.rotate(-1)))
        })
    }

    /// Mirror left to right; each type decides how its facing mirrors.
    pub fn flip_horizontal(&self) -> CellGrid {
        let registry = self.registry().clone();
        let width = self.size.width;
        self.transformed(self.size, |pos, data| {
            let flipped = registry.get(data.0).flipped(&registry, data, true);
            (Position::new(width - pos.x - 1, pos.y), flipped)
        })
    }

    /// Mirror top to bottom.
    pub fn flip_vertical(&self) -> CellGrid {
        let registry = self.registry().clone();
        let height = self.size.height;
        self.transformed(self.size, |pos, data| {
            let flipped = registry.get(data.0).flipped(&registry, data, false);
            (Position::new(pos.x, height - pos.y - 1), flipped)
        })
    }

    /// Fill `area` with one cell type. Stops at the first slot that cannot
    /// take a cell and returns `false`.
    pub fn fill_cell(&mut self, area: Rect, kind: CellTypeKey, direction: Direction) -> bool {
        area.positions().all(|pos| self.load_cell(pos, kind, direction).is_some())
    }

    pub fn fill_tile(&mut self, area: Rect, tile: Tile) {
        for pos in area.positions() {
            self.tiles.insert(pos, tile);
        }
    }
}
