/// Binary J1: `J1;width;height;base64(deflate(cells))`.
///
/// Slots are scanned from the top row down, left to right. Each slot is
/// one entry in the inflated byte stream:
///
/// - `E` empty
/// - `C` raw type id byte, direction byte
/// - `c` type id string, `0x01`, direction byte
///
/// optionally followed by `P` when the tile is placeable. Directions are
/// written as `'A' + direction`.

use std::io::{Read, Write};
use std::sync::Arc;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::game::coord::{Direction, Position, Size};
use crate::game::grid::{CellGrid, Tile};

use super::numeral::BASE64_DIGITS;
use super::{field, key_or_unknown, to_dimension, LevelCodeError, ParseError};

const EMPTY: u8 = b'E';
const RAW_ID: u8 = b'C';
const STRING_ID: u8 = b'c';
const STRING_END: u8 = 0x01;
const PLACEABLE: u8 = b'P';
const DIRECTION_BASE: u8 = b'A';

/// Longest possible slot entry: `c`, a 256-byte id, `0x01`, direction, `P`.
const MAX_ENTRY_LEN: usize = 260;
/// Inflated streams never grow past this, whatever the grid size.
const MAX_INFLATED_LEN: usize = 64 << 20;

/// Accepts codes with or without trailing `=` padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn byte_at(data: &[u8], index: usize) -> Result<u8, ParseError> {
    data.get(index).copied().ok_or(ParseError::UnexpectedEnd)
}

pub(super) fn import(parts: &[&str], grid: &mut CellGrid) -> Result<(), ParseError> {
    let width_text = field(parts, 1)?;
    let height_text = field(parts, 2)?;
    grid.size = Size::new(
        to_dimension(BASE64_DIGITS.decode(width_text)?, width_text)?,
        to_dimension(BASE64_DIGITS.decode(height_text)?, height_text)?,
    );

    let compressed = LENIENT.decode(field(parts, 3)?.trim())?;
    let limit = grid.size.area().saturating_mul(MAX_ENTRY_LEN).min(MAX_INFLATED_LEN);
    let mut data = Vec::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(limit as u64 + 1)
        .read_to_end(&mut data)?;
    if data.len() > limit {
        return Err(ParseError::TooLarge { limit });
    }

    let registry = Arc::clone(grid.registry());
    let (mut x, mut y) = (0, grid.size.height - 1);
    let mut i = 0;
    while i < data.len() {
        let pos = Position::new(x, y);
        if y < 0 {
            return Err(ParseError::OutOfBounds(pos));
        }

        let tag = data[i];
        i += 1;
        let kind = match tag {
            EMPTY => None,
            RAW_ID => {
                let raw_id = byte_at(&data, i)?;
                i += 1;
                Some(match registry.key_of_raw(raw_id) {
                    Some(kind) => kind,
                    None => key_or_unknown(&registry, &format!("#{raw_id}"))?,
                })
            }
            STRING_ID => {
                let end = data[i..]
                    .iter()
                    .position(|&b| b == STRING_END)
                    .map(|offset| i + offset)
                    .ok_or(ParseError::UnexpectedEnd)?;
                let id = String::from_utf8_lossy(&data[i..end]).into_owned();
                i = end + 1;
                Some(key_or_unknown(&registry, &id)?)
            }
            other => return Err(ParseError::BadTag(other)),
        };

        if let Some(kind) = kind {
            let direction = Direction::from_i32(byte_at(&data, i)? as i32 - DIRECTION_BASE as i32);
            i += 1;
            grid.load_cell(pos, kind, direction).ok_or(ParseError::OutOfBounds(pos))?;
        }
        if data.get(i) == Some(&PLACEABLE) {
            grid.tiles.insert(pos, Tile::Placeable);
            i += 1;
        }

        x += 1;
        if x >= grid.size.width {
            x = 0;
            y -= 1;
        }
    }
    Ok(())
}

pub(super) fn export(grid: &CellGrid) -> Result<String, LevelCodeError> {
    let registry = grid.registry();
    let mut data = Vec::with_capacity(grid.size.area() * 2);

    for y in (0..grid.size.height).rev() {
        for x in 0..grid.size.width {
            let pos = Position::new(x, y);
            match grid.cell_at(pos) {
                Some(cell) => {
                    let cell_type = registry.get(cell.kind);
                    match cell_type.raw_id {
                        Some(raw_id) => data.extend_from_slice(&[RAW_ID, raw_id]),
                        None => {
                            data.push(STRING_ID);
                            data.extend_from_slice(cell_type.id.as_bytes());
                            data.push(STRING_END);
                        }
                    }
                    data.push(DIRECTION_BASE + cell.direction.as_u8());
                }
                None => data.push(EMPTY),
            }
            if grid.tile(pos) == Some(Tile::Placeable) {
                data.push(PLACEABLE);
            }
        }
    }

    let compress = || -> std::io::Result<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(9));
        encoder.write_all(&data)?;
        encoder.finish()
    };
    let compressed = compress().map_err(|err| LevelCodeError::ExportUnsupported {
        format: "J1".to_string(),
        reason: err.to_string(),
    })?;

    Ok(format!(
        "J1;{};{};{}",
        BASE64_DIGITS.encode(grid.size.width as u64),
        BASE64_DIGITS.encode(grid.size.height as u64),
        STANDARD.encode(compressed)
    ))
}
