use tracing::{debug, warn};

use crate::game::cell::Cell;
use crate::game::coord::{Direction, Position, Size};
use crate::game::grid::CellGrid;
use crate::game::registry::CellTypeKey;

use super::binary_io::{InputStream, OutputStream};
use super::{MultiplayerSession, ProtocolError};

const REQUEST_GRID: u8 = 0;
const GRID_RELOAD: u8 = 1;
const SET_CELL: u8 = 2;

/// Longest type id accepted off the wire.
pub const MAX_TYPE_ID_LEN: usize = 256;

/// One slot on the wire: a type id and direction. An empty id means no cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireCell {
    pub type_id: String,
    pub direction: Direction,
}

impl WireCell {
    pub fn new(type_id: impl Into<String>, direction: Direction) -> Self {
        Self { type_id: type_id.into(), direction }
    }

    fn of(grid: &CellGrid, cell: &Cell) -> Self {
        Self::new(grid.registry().get(cell.kind).id.clone(), cell.direction)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Client asks for the whole grid. No payload.
    RequestGrid,
    /// Full grid, row-major from the bottom row.
    GridReload { width: u16, height: u16, cells: Vec<Option<WireCell>> },
    /// One slot changed; `None` removes its cell.
    SetCell { x: u16, y: u16, cell: Option<WireCell> },
}

fn write_slot(out: &mut OutputStream, cell: &Option<WireCell>) -> Result<(), ProtocolError> {
    match cell {
        Some(cell) => {
            out.write_string(&cell.type_id)?;
            out.write_u8(cell.direction.as_u8());
        }
        None => {
            out.write_string("")?;
            out.write_u8(0);
        }
    }
    Ok(())
}

fn read_slot(input: &mut InputStream) -> Result<Option<WireCell>, ProtocolError> {
    let type_id = input.read_string(MAX_TYPE_ID_LEN)?;
    let direction = Direction::from_u8(input.read_u8()?);
    Ok((!type_id.is_empty()).then(|| WireCell { type_id, direction }))
}

fn to_u16(value: i32) -> Result<u16, ProtocolError> {
    u16::try_from(value).map_err(|_| ProtocolError::OutOfRange(value))
}

impl Message {
    pub fn name(&self) -> &'static str {
        match self {
            Message::RequestGrid => "RequestGrid",
            Message::GridReload { .. } => "GridReload",
            Message::SetCell { .. } => "SetCell",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = OutputStream::new();
        match self {
            Message::RequestGrid => out.write_u8(REQUEST_GRID),
            Message::GridReload { width, height, cells } => {
                out.write_u8(GRID_RELOAD);
                out.write_u16(*width);
                out.write_u16(*height);
                out.write_array(cells, write_slot)?;
            }
            Message::SetCell { x, y, cell } => {
                out.write_u8(SET_CELL);
                out.write_u16(*x);
                out.write_u16(*y);
                write_slot(&mut out, cell)?;
            }
        }
        Ok(out.into_bytes())
    }

    /// Trailing bytes after a complete message are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Message, ProtocolError> {
        let mut input = InputStream::new(bytes);
        let message = match input.read_u8()? {
            REQUEST_GRID => Message::RequestGrid,
            GRID_RELOAD => {
                let width = input.read_u16()?;
                let height = input.read_u16()?;
                let area = width as usize * height as usize;
                let cells = input.read_array(area, |input, _| read_slot(input))?;
                Message::GridReload { width, height, cells }
            }
            SET_CELL => {
                let x = input.read_u16()?;
                let y = input.read_u16()?;
                let cell = read_slot(&mut input)?;
                Message::SetCell { x, y, cell }
            }
            other => return Err(ProtocolError::UnknownMessage(other)),
        };
        if input.remaining() > 0 {
            debug!("Ignoring {} trailing bytes after message", input.remaining());
        }
        Ok(message)
    }

    /// Full snapshot of a bounded grid.
    pub fn from_grid(grid: &CellGrid) -> Result<Message, ProtocolError> {
        let width = to_u16(grid.size.width)?;
        let height = to_u16(grid.size.height)?;
        let cells = (0..grid.size.area())
            .map(|i| grid.cell_at(grid.size.position_of(i)).map(|cell| WireCell::of(grid, cell)))
            .collect();
        Ok(Message::GridReload { width, height, cells })
    }

    /// Update for the slot at `pos` as it currently is in `grid`.
    pub fn set_cell(grid: &CellGrid, pos: Position) -> Result<Message, ProtocolError> {
        Ok(Message::SetCell {
            x: to_u16(pos.x)?,
            y: to_u16(pos.y)?,
            cell: grid.cell_at(pos).map(|cell| WireCell::of(grid, cell)),
        })
    }

    /// Reply a peer expects, if any. Only `RequestGrid` has one.
    pub fn respond(&self, grid: &CellGrid) -> Result<Option<Message>, ProtocolError> {
        match self {
            Message::RequestGrid => Message::from_grid(grid).map(Some),
            _ => Ok(None),
        }
    }

    /// Apply a received update. Returns `false` when the session is not
    /// syncing or the message carries no grid state.
    pub fn apply_to(&self, session: &MultiplayerSession, grid: &mut CellGrid) -> Result<bool, ProtocolError> {
        if !session.sync {
            return Ok(false);
        }
        match self {
            Message::RequestGrid => Ok(false),
            Message::GridReload { width, height, cells } => {
                let size = Size::new(*width as i32, *height as i32);
                grid.size = size;
                grid.infinite = false;

                let outside: Vec<Position> =
                    grid.cells().map(|cell| cell.pos).filter(|pos| !size.contains(*pos)).collect();
                for pos in outside {
                    grid.rm(pos);
                }
                for (i, cell) in cells.iter().enumerate() {
                    load_slot(grid, size.position_of(i), cell.as_ref())?;
                }
                debug!("Grid reloaded from peer: {}x{}", width, height);
                Ok(true)
            }
            Message::SetCell { x, y, cell } => {
                load_slot(grid, Position::new(*x as i32, *y as i32), cell.as_ref())?;
                Ok(true)
            }
        }
    }
}

fn resolve(grid: &CellGrid, type_id: &str) -> Result<CellTypeKey, ProtocolError> {
    if let Some(kind) = grid.registry().key_of(type_id) {
        return Ok(kind);
    }
    warn!("Peer sent unknown cell type '{}'", type_id);
    grid.registry()
        .key_or_unknown(type_id)
        .ok_or_else(|| ProtocolError::UnknownCellType(type_id.to_string()))
}

fn load_slot(grid: &mut CellGrid, pos: Position, cell: Option<&WireCell>) -> Result<(), ProtocolError> {
    match cell {
        Some(cell) => {
            let kind = resolve(grid, &cell.type_id)?;
            grid.load_cell(pos, kind, cell.direction).ok_or(ProtocolError::OutOfBounds(pos))?;
        }
        None => {
            grid.rm(pos);
        }
    }
    Ok(())
}
