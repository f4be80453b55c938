//! Text J1: `J1;width;height;types;cells;description;name`.
//!
//! `types` is a comma-separated table of cell type ids, where `.x` stands for
//! `jm.core.x` and `..x` for `jm.utils.x`. Each cell token is an optional `:`
//! (placeable tile) and one base-85 digit holding `4 * type + direction + 1`,
//! with 0 meaning empty. A token may be followed by a repeat count, written
//! `>c` for one digit or `<cc>` for more, storing `count - 4`.

use std::sync::Arc;

use crate::game::coord::{Direction, Size};
use crate::game::grid::{CellGrid, Tile};
use crate::game::registry::CellTypeKey;

use super::numeral::J1;
use super::{escape_text, field, key_or_unknown, text_field, to_dimension, LevelCodeError, ParseError};

const CORE_PREFIX: &str = "jm.core.";
const UTILS_PREFIX: &str = "jm.utils.";
/// Largest type table whose values still fit in a single digit.
const MAX_TYPES: usize = 21;
const MIN_REPEAT: usize = 5;
const REPEAT_BIAS: u64 = 4;

fn expand_id(short: &str) -> String {
    if let Some(rest) = short.strip_prefix("..") {
        format!("{UTILS_PREFIX}{rest}")
    } else if let Some(rest) = short.strip_prefix('.') {
        format!("{CORE_PREFIX}{rest}")
    } else {
        short.to_string()
    }
}

fn shorten_id(id: &str) -> String {
    if let Some(rest) = id.strip_prefix(CORE_PREFIX) {
        format!(".{rest}")
    } else if let Some(rest) = id.strip_prefix(UTILS_PREFIX) {
        format!("..{rest}")
    } else {
        id.to_string()
    }
}

pub(super) fn import(parts: &[&str], grid: &mut CellGrid) -> Result<(), ParseError> {
    let width_text = field(parts, 1)?;
    let height_text = field(parts, 2)?;
    grid.size = Size::new(
        to_dimension(J1.decode(width_text)?, width_text)?,
        to_dimension(J1.decode(height_text)?, height_text)?,
    );

    let registry = Arc::clone(grid.registry());
    let table: Vec<&str> = field(parts, 3)?.split(',').collect();
    let data: Vec<char> = field(parts, 4)?.chars().collect();

    let mut index = 0usize;
    let mut i = 0;
    while i < data.len() {
        let placeable = data[i] == ':';
        if placeable {
            i += 1;
        }
        let value = J1.digit(*data.get(i).ok_or(ParseError::UnexpectedEnd)?)?;
        i += 1;

        let count = match data.get(i) {
            Some('>') => {
                let digit = *data.get(i + 1).ok_or(ParseError::UnexpectedEnd)?;
                i += 2;
                J1.digit(digit)?.saturating_add(REPEAT_BIAS)
            }
            Some('<') => {
                let start = i + 1;
                let end = data[start..]
                    .iter()
                    .position(|&c| c == '>')
                    .map(|offset| start + offset)
                    .ok_or(ParseError::UnexpectedEnd)?;
                i = end + 1;
                J1.decode(&String::from_iter(&data[start..end]))?.saturating_add(REPEAT_BIAS)
            }
            _ => 1,
        };

        let cell = match value.checked_sub(1) {
            Some(value) => {
                let type_index = (value / 4) as usize;
                let short = table
                    .get(type_index)
                    .filter(|id| !id.is_empty())
                    .ok_or(ParseError::UnknownCellIndex(type_index as u64))?;
                let kind = key_or_unknown(&registry, &expand_id(short))?;
                Some((kind, Direction::from_i32((value % 4) as i32)))
            }
            None => None,
        };
        for _ in 0..count {
            fill_slot(grid, index, placeable, cell)?;
            index += 1;
        }
    }

    grid.description = text_field(parts, 5);
    grid.name = text_field(parts, 6);
    Ok(())
}

fn fill_slot(
    grid: &mut CellGrid,
    index: usize,
    placeable: bool,
    cell: Option<(CellTypeKey, Direction)>,
) -> Result<(), ParseError> {
    let pos = grid.size.position_of(index);
    if index >= grid.size.area() {
        return Err(ParseError::OutOfBounds(pos));
    }
    if placeable {
        grid.tiles.insert(pos, Tile::Placeable);
    }
    if let Some((kind, direction)) = cell {
        grid.load_cell(pos, kind, direction).ok_or(ParseError::OutOfBounds(pos))?;
    }
    Ok(())
}

pub(super) fn export(grid: &CellGrid) -> Result<String, LevelCodeError> {
    let registry = grid.registry();
    let size = grid.size;
    let unsupported = |reason: String| LevelCodeError::ExportUnsupported { format: "J1T".to_string(), reason };

    let mut table: Vec<CellTypeKey> = Vec::new();
    let mut tokens: Vec<String> = Vec::with_capacity(size.area());
    for index in 0..size.area() {
        let pos = size.position_of(index);
        let mut token = String::new();
        if grid.tile(pos) == Some(Tile::Placeable) {
            token.push(':');
        }
        let value = match grid.cell_at(pos) {
            Some(cell) => {
                let type_index = match table.iter().position(|k| *k == cell.kind) {
                    Some(type_index) => type_index,
                    None => {
                        table.push(cell.kind);
                        table.len() - 1
                    }
                };
                if type_index >= MAX_TYPES {
                    return Err(unsupported(format!("more than {MAX_TYPES} cell types")));
                }
                4 * type_index as u64 + cell.direction.as_u8() as u64 + 1
            }
            None => 0,
        };
        token.push(J1.char_for(value));
        tokens.push(token);
    }

    let mut ids = Vec::with_capacity(table.len());
    for key in &table {
        let id = &registry.get(*key).id;
        if id.contains(|c: char| c == ',' || c == ';') {
            return Err(unsupported(format!("cell type id '{id}' contains a separator")));
        }
        ids.push(shorten_id(id));
    }

    let mut cells = String::new();
    for run in tokens.chunk_by(|a, b| a == b) {
        let token = &run[0];
        if run.len() >= MIN_REPEAT {
            let count = J1.encode(run.len() as u64 - REPEAT_BIAS);
            if count.chars().count() == 1 {
                cells.push_str(&format!("{token}>{count}"));
            } else {
                cells.push_str(&format!("{token}<{count}>"));
            }
        } else {
            cells.push_str(&token.repeat(run.len()));
        }
    }

    Ok(format!(
        "J1;{};{};{};{};{};{}",
        J1.encode(size.width as u64),
        J1.encode(size.height as u64),
        ids.join(","),
        cells,
        escape_text(&grid.description),
        escape_text(&grid.name)
    ))
}
