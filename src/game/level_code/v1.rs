//! `V1;width;height;x.y,...;type.dir.x.y,...;description;name`

use std::sync::Arc;

use crate::game::coord::{Direction, Position, Size};
use crate::game::grid::{CellGrid, Tile};

use super::{escape_text, field, legacy_keys, parse_int, text_field, LevelCodeError, ParseError};

fn int32(text: &str) -> Result<i32, ParseError> {
    let value = parse_int(text)?;
    i32::try_from(value).map_err(|_| ParseError::BadInteger(text.to_string()))
}

/// Split a `.`-separated tuple and parse each component.
fn tuple(text: &str) -> Result<Vec<i32>, ParseError> {
    text.split('.').map(int32).collect()
}

fn component(values: &[i32], index: usize) -> Result<i32, ParseError> {
    values.get(index).copied().ok_or(ParseError::UnexpectedEnd)
}

pub(super) fn import(parts: &[&str], grid: &mut CellGrid) -> Result<(), ParseError> {
    grid.size = Size::new(int32(field(parts, 1)?)?, int32(field(parts, 2)?)?);
    let registry = Arc::clone(grid.registry());
    let legacy = legacy_keys(&registry)?;

    let placeables = field(parts, 3)?;
    if !placeables.is_empty() {
        for entry in placeables.split(',') {
            let values = tuple(entry)?;
            let pos = Position::new(component(&values, 0)?, component(&values, 1)?);
            if !grid.size.contains(pos) {
                return Err(ParseError::OutOfBounds(pos));
            }
            grid.tiles.insert(pos, Tile::Placeable);
        }
    }

    let cells = field(parts, 4)?;
    if !cells.is_empty() {
        for entry in cells.split(',') {
            let values = tuple(entry)?;
            let index = component(&values, 0)?;
            let kind = usize::try_from(index)
                .ok()
                .and_then(|i| legacy.get(i).copied())
                .ok_or(ParseError::UnknownCellIndex(index as u64))?;
            let direction = Direction::from_i32(component(&values, 1)?);
            let pos = Position::new(component(&values, 2)?, component(&values, 3)?);
            grid.load_cell(pos, kind, direction).ok_or(ParseError::OutOfBounds(pos))?;
        }
    }

    grid.description = text_field(parts, 5);
    grid.name = text_field(parts, 6);
    Ok(())
}

/// Cells outside the legacy type list are not representable and are skipped.
pub(super) fn export(grid: &CellGrid) -> Result<String, LevelCodeError> {
    let legacy = legacy_keys(grid.registry())?;

    let mut placeables: Vec<Position> = grid
        .tiles
        .iter()
        .filter(|(pos, tile)| **tile == Tile::Placeable && grid.size.contains(**pos))
        .map(|(pos, _)| *pos)
        .collect();
    placeables.sort_by_key(|p| (p.y, p.x));
    let placeables: Vec<String> = placeables.iter().map(|p| format!("{}.{}", p.x, p.y)).collect();

    let cells: Vec<String> = grid
        .cells_sorted()
        .into_iter()
        .filter(|cell| grid.size.contains(cell.pos))
        .filter_map(|cell| {
            let index = legacy.iter().position(|k| *k == cell.kind)?;
            Some(format!("{}.{}.{}.{}", index, cell.direction.as_u8(), cell.pos.x, cell.pos.y))
        })
        .collect();

    Ok(format!(
        "V1;{};{};{};{};{};{}",
        grid.size.width,
        grid.size.height,
        placeables.join(","),
        cells.join(","),
        escape_text(&grid.description),
        escape_text(&grid.name)
    ))
}
