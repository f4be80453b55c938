/// Binary grid sync protocol.
///
/// Messages are a leading id byte and a big-endian payload:
/// - `0` request the full grid (no payload)
/// - `1` full grid: u16 width, u16 height, array of (type id, u8 direction)
/// - `2` one slot: u16 x, u16 y, type id, u8 direction
///
/// Strings and arrays carry a u32 length prefix; an empty type id means an
/// empty slot. Transport is left to the host.

use thiserror::Error;
use tracing::debug;

use crate::game::coord::Position;
use crate::game::grid::CellGrid;

pub mod binary_io;
pub mod protocol;

#[cfg(test)]
mod tests;

pub use binary_io::{InputStream, OutputStream};
pub use protocol::{Message, WireCell};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("message truncated: needed {needed} bytes, {remaining} left")]
    Truncated { needed: usize, remaining: usize },
    #[error("string is not valid UTF-8")]
    BadUtf8,
    #[error("length {len} exceeds the limit of {max}")]
    TooLong { len: usize, max: usize },
    #[error("unknown message id {0}")]
    UnknownMessage(u8),
    #[error("cell type '{0}' is not registered")]
    UnknownCellType(String),
    #[error("{0} does not fit in a u16 wire field")]
    OutOfRange(i32),
    #[error("position {0} is outside the grid")]
    OutOfBounds(Position),
}

/// One side of a sync connection. While `sync` is off, incoming updates are
/// dropped and local edits are not sent.
#[derive(Clone, Debug)]
pub struct MultiplayerSession {
    pub sync: bool,
}

impl Default for MultiplayerSession {
    fn default() -> Self {
        Self { sync: true }
    }
}

impl MultiplayerSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes asking the peer for its grid.
    pub fn request_grid(&self) -> Result<Vec<u8>, ProtocolError> {
        Message::RequestGrid.encode()
    }

    /// Bytes announcing the current state of `pos`, or `None` while not syncing.
    pub fn place_cell(&self, grid: &CellGrid, pos: Position) -> Result<Option<Vec<u8>>, ProtocolError> {
        if !self.sync {
            return Ok(None);
        }
        Message::set_cell(grid, pos)?.encode().map(Some)
    }

    /// Handle one incoming message: apply it to `grid` and return the encoded
    /// reply, if the message expects one.
    pub fn receive(&self, bytes: &[u8], grid: &mut CellGrid) -> Result<Option<Vec<u8>>, ProtocolError> {
        let message = Message::decode(bytes)?;
        if message.apply_to(self, grid)? {
            debug!("Applied {} from peer", message.name());
        }
        match message.respond(grid)? {
            Some(reply) => reply.encode().map(Some),
            None => Ok(None),
        }
    }
}
