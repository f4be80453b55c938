/// V3 codes: `V3;width;height;cells;description;name;border`.
///
/// Every slot is one base-74 value, row-major from the bottom row:
/// `72` empty, `73` empty placeable, otherwise
/// `placeable + 2 * legacy_index + 18 * direction`.
///
/// Back-references repeat the value `offset + 1` slots back, `length` times:
///
/// ```text
/// v)ol       single-digit offset and length
/// v(oo)l     multi-digit offset, single-digit length
/// v(oo(ll)   multi-digit offset and length
/// ```
///
/// The encoder only ever writes offset 0 (plain runs), but the decoder takes
/// any offset.

use std::sync::Arc;

use crate::game::coord::{Direction, Size};
use crate::game::grid::{BorderMode, CellGrid, Tile};
use crate::game::registry::CellTypeKey;

use super::numeral::V3;
use super::{escape_text, field, legacy_keys, parse_int, text_field, to_dimension, LevelCodeError, ParseError};

const EMPTY: u64 = 72;
const EMPTY_PLACEABLE: u64 = 73;
/// Runs longer than this are written as back-references.
const MAX_LITERAL_RUN: usize = 3;

pub(super) fn import(parts: &[&str], grid: &mut CellGrid) -> Result<(), ParseError> {
    let width_text = field(parts, 1)?;
    let height_text = field(parts, 2)?;
    grid.size = Size::new(
        to_dimension(V3.decode(width_text)?, width_text)?,
        to_dimension(V3.decode(height_text)?, height_text)?,
    );
    grid.infinite = width_text.starts_with('0');

    let registry = Arc::clone(grid.registry());
    let legacy = legacy_keys(&registry)?;

    let cells: Vec<char> = field(parts, 3)?.chars().collect();
    let mut values: Vec<u64> = Vec::new();
    let mut i = 0;
    while i < cells.len() {
        match cells[i] {
            ')' => {
                let offset = V3.digit(char_at(&cells, i + 1)?)?;
                let length = V3.digit(char_at(&cells, i + 2)?)?;
                i += 3;
                repeat(grid, &legacy, &mut values, offset, length)?;
            }
            '(' => {
                i += 1;
                let start = i;
                while char_at(&cells, i)? != ')' && cells[i] != '(' {
                    i += 1;
                }
                let offset = V3.decode(&String::from_iter(&cells[start..i]))?;

                let length = if cells[i] == ')' {
                    let length = V3.digit(char_at(&cells, i + 1)?)?;
                    i += 2;
                    length
                } else {
                    i += 1;
                    let start = i;
                    while char_at(&cells, i)? != ')' {
                        i += 1;
                    }
                    let length = V3.decode(&String::from_iter(&cells[start..i]))?;
                    i += 1;
                    length
                };
                repeat(grid, &legacy, &mut values, offset, length)?;
            }
            c => {
                let value = V3.digit(c)?;
                set_cell(grid, &legacy, value, values.len())?;
                values.push(value);
                i += 1;
            }
        }
    }

    grid.description = text_field(parts, 4);
    grid.name = text_field(parts, 5);
    grid.border_mode = parts
        .get(6)
        .and_then(|text| parse_int(text).ok())
        .map_or(BorderMode::Default, BorderMode::from_code);
    Ok(())
}

fn char_at(cells: &[char], index: usize) -> Result<char, ParseError> {
    cells.get(index).copied().ok_or(ParseError::UnexpectedEnd)
}

fn repeat(
    grid: &mut CellGrid,
    legacy: &[CellTypeKey],
    values: &mut Vec<u64>,
    offset: u64,
    length: u64,
) -> Result<(), ParseError> {
    for _ in 0..length {
        let index = values.len();
        let source = index
            .checked_sub((offset as usize).saturating_add(1))
            .ok_or_else(|| ParseError::OutOfBounds(grid.size.position_of(index)))?;
        let value = values[source];
        set_cell(grid, legacy, value, index)?;
        values.push(value);
    }
    Ok(())
}

fn set_cell(grid: &mut CellGrid, legacy: &[CellTypeKey], value: u64, index: usize) -> Result<(), ParseError> {
    let pos = grid.size.position_of(index);
    if index >= grid.size.area() {
        return Err(ParseError::OutOfBounds(pos));
    }
    if value % 2 == 1 {
        if !grid.size.contains(pos) {
            return Err(ParseError::OutOfBounds(pos));
        }
        grid.tiles.insert(pos, Tile::Placeable);
    }
    if value < EMPTY {
        let kind = legacy[((value / 2) % 9) as usize];
        let direction = Direction::from_i32((value / 18) as i32);
        grid.load_cell(pos, kind, direction).ok_or(ParseError::OutOfBounds(pos))?;
    }
    Ok(())
}

pub(super) fn export(grid: &CellGrid) -> Result<String, LevelCodeError> {
    let legacy = legacy_keys(grid.registry())?;
    let size = grid.size;

    let mut values: Vec<u64> = (0..size.area())
        .map(|i| match grid.tile(size.position_of(i)) {
            Some(Tile::Placeable) => EMPTY_PLACEABLE,
            None => EMPTY,
        })
        .collect();
    for cell in grid.cells() {
        let Some(index) = legacy.iter().position(|k| *k == cell.kind) else { continue };
        if !size.contains(cell.pos) {
            continue;
        }
        let slot = &mut values[size.index_of(cell.pos)];
        *slot = *slot - EMPTY + 2 * index as u64 + 18 * cell.direction.as_u8() as u64;
    }

    // a leading zero on the width marks an infinite grid
    let marker = if grid.infinite { "0" } else { "" };
    let mut code = format!("V3;{marker}{};{};", V3.encode(size.width as u64), V3.encode(size.height as u64));
    for run in values.chunk_by(|a, b| a == b) {
        let digit = V3.encode(run[0]);
        if run.len() > MAX_LITERAL_RUN {
            let length = V3.encode(run.len() as u64 - 1);
            if length.chars().count() > 1 {
                code.push_str(&format!("{digit}(0({length})"));
            } else {
                code.push_str(&format!("{digit})0{length}"));
            }
        } else {
            code.push_str(&digit.repeat(run.len()));
        }
    }

    code.push_str(&format!(
        ";{};{};{}",
        escape_text(&grid.description),
        escape_text(&grid.name),
        grid.border_mode.as_code()
    ));
    Ok(code)
}
