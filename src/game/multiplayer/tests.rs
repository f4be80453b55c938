use std::sync::Arc;

use super::*;
use crate::game::cells::core::{MOVER, UNKNOWN, WALL};
use crate::game::coord::Direction;
use crate::game::registry::Registry;

fn grid(width: i32, height: i32) -> CellGrid {
    CellGrid::new(Arc::new(Registry::with_builtins()), width, height)
}

#[test]
fn test_streams_are_big_endian() {
    let mut out = OutputStream::new();
    out.write_u16(0x0102);
    out.write_i32(-2);
    out.write_string("ab").unwrap();
    assert_eq!(out.bytes(), &[1, 2, 0xff, 0xff, 0xff, 0xfe, 0, 0, 0, 2, b'a', b'b']);

    let bytes = out.into_bytes();
    let mut input = InputStream::new(&bytes);
    assert_eq!(input.read_u16(), Ok(0x0102));
    assert_eq!(input.read_i32(), Ok(-2));
    assert_eq!(input.read_string(16), Ok("ab".to_string()));
    assert_eq!(input.remaining(), 0);
    assert_eq!(input.read_u8(), Err(ProtocolError::Truncated { needed: 1, remaining: 0 }));
}

#[test]
fn test_string_limits_and_utf8() {
    let bytes = [0, 0, 0, 3, b'a', b'b', b'c'];
    assert!(matches!(InputStream::new(&bytes).read_string(2), Err(ProtocolError::TooLong { len: 3, max: 2 })));

    let bytes = [0, 0, 0, 1, 0xff];
    assert_eq!(InputStream::new(&bytes).read_string(8), Err(ProtocolError::BadUtf8));
}

#[test]
fn test_set_cell_wire_layout() {
    let message = Message::SetCell { x: 1, y: 258, cell: Some(WireCell::new("ab", Direction::Up)) };
    let bytes = message.encode().unwrap();
    assert_eq!(bytes, vec![2, 0, 1, 1, 2, 0, 0, 0, 2, b'a', b'b', 3]);
    assert_eq!(Message::decode(&bytes), Ok(message));

    let removal = Message::SetCell { x: 0, y: 0, cell: None };
    assert_eq!(removal.encode().unwrap(), vec![2, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn test_decode_rejects_bad_messages() {
    assert_eq!(Message::decode(&[9]), Err(ProtocolError::UnknownMessage(9)));
    assert!(matches!(Message::decode(&[]), Err(ProtocolError::Truncated { .. })));
    assert!(matches!(Message::decode(&[2, 0, 1]), Err(ProtocolError::Truncated { .. })));
    // a 1x1 reload claiming two slots
    assert!(matches!(
        Message::decode(&[1, 0, 1, 0, 1, 0, 0, 0, 2]),
        Err(ProtocolError::TooLong { len: 2, max: 1 })
    ));
}

#[test]
fn test_request_grid_is_answered_with_full_reload() {
    let mut server = grid(2, 2);
    server.place(Position::new(1, 0), MOVER, Direction::Left);
    server.place(Position::new(0, 1), WALL, Direction::Right);

    let session = MultiplayerSession::new();
    let request = session.request_grid().unwrap();
    assert_eq!(request, vec![0]);

    let reply = session.receive(&request, &mut server).unwrap().unwrap();
    let mut client = grid(5, 5);
    client.place(Position::new(4, 4), WALL, Direction::Right);
    assert_eq!(session.receive(&reply, &mut client).unwrap(), None);

    assert_eq!(client.size, server.size);
    assert_eq!(client.cell_count(), 2);
    assert_eq!(client.type_id_at(Position::new(1, 0)), Some(MOVER));
    assert_eq!(client.cell_at(Position::new(1, 0)).map(|c| c.direction), Some(Direction::Left));
    assert_eq!(client.type_id_at(Position::new(0, 1)), Some(WALL));
}

#[test]
fn test_set_cell_applies_and_removes() {
    let session = MultiplayerSession::new();
    let mut source = grid(3, 3);
    let mut mirror = grid(3, 3);
    let pos = Position::new(2, 1);

    source.place(pos, WALL, Direction::Down);
    let bytes = session.place_cell(&source, pos).unwrap().unwrap();
    session.receive(&bytes, &mut mirror).unwrap();
    assert_eq!(mirror.type_id_at(pos), Some(WALL));

    source.rm(pos);
    let bytes = session.place_cell(&source, pos).unwrap().unwrap();
    session.receive(&bytes, &mut mirror).unwrap();
    assert_eq!(mirror.cell_at(pos), None);
}

#[test]
fn test_sync_off_drops_traffic() {
    let session = MultiplayerSession { sync: false };
    let mut grid = grid(2, 2);
    assert_eq!(session.place_cell(&grid, Position::new(0, 0)), Ok(None));

    let message = Message::SetCell { x: 0, y: 0, cell: Some(WireCell::new(MOVER, Direction::Right)) };
    assert_eq!(message.apply_to(&session, &mut grid), Ok(false));
    assert_eq!(grid.cell_count(), 0);
}

#[test]
fn test_unknown_types_and_bounds() {
    let session = MultiplayerSession::new();
    let mut grid = grid(2, 2);

    let message = Message::SetCell { x: 0, y: 0, cell: Some(WireCell::new("other.mod.cell", Direction::Up)) };
    assert_eq!(message.apply_to(&session, &mut grid), Ok(true));
    assert_eq!(grid.type_id_at(Position::new(0, 0)), Some(UNKNOWN));

    let message = Message::SetCell { x: 7, y: 0, cell: Some(WireCell::new(MOVER, Direction::Up)) };
    assert_eq!(
        message.apply_to(&session, &mut grid),
        Err(ProtocolError::OutOfBounds(Position::new(7, 0)))
    );
}

#[test]
fn test_oversized_grids_cannot_be_sent() {
    let grid = grid(70_000, 1);
    assert_eq!(Message::from_grid(&grid), Err(ProtocolError::OutOfRange(70_000)));
}

#[test]
fn test_huge_reload_length_is_truncated_not_allocated() {
    let mut bytes = vec![1, 0xff, 0xff, 0xff, 0xff];
    bytes.extend_from_slice(&(65535u32 * 65535).to_be_bytes());
    assert!(matches!(Message::decode(&bytes), Err(ProtocolError::Truncated { .. })));

    // two slots announced, one present
    let mut bytes = vec![1, 0, 2, 0, 1, 0, 0, 0, 2];
    bytes.extend_from_slice(&[0, 0, 0, 0, 0]);
    assert!(matches!(Message::decode(&bytes), Err(ProtocolError::Truncated { .. })));
}
