/// Tests for tick ordering and the built-in cell updates.

use super::*;
use std::sync::Mutex;

use crate::game::behavior::CellBehavior;
use crate::game::cell_type::CellType;
use crate::game::cells::core::{CW_ROTATOR, ENEMY, GENERATOR, MOVER, PUSH, TRASH, WALL};
use crate::game::cells::tunneling::{REDIRECTOR, TUNNEL};
use crate::game::cells::utils::{
    DISABLER, JELL, NUKE, ORIENTATOR, PISTON, PISTON_HEAD, RANDOM_ROTATOR, STICKY_PISTON, STICKY_PISTON_HEAD,
};
use crate::game::grid::BorderMode;
use crate::game::registry::Registry;

fn grid(width: i32, height: i32) -> CellGrid {
    CellGrid::new(Arc::new(Registry::with_builtins()), width, height)
}

fn at(x: i32, y: i32) -> Position {
    Position::new(x, y)
}

/// `(x, y, type id, direction)` of every cell, bottom row first.
fn snapshot(grid: &CellGrid) -> Vec<(i32, i32, String, Direction)> {
    grid.cells_sorted()
        .into_iter()
        .map(|c| (c.pos.x, c.pos.y, grid.registry().get(c.kind).id.clone(), c.direction))
        .collect()
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_front_first_key_orders_by_travel() {
    let mut xs = vec![at(0, 0), at(2, 0), at(1, 0)];
    xs.sort_by_key(|p| front_first_key(Direction::Right, *p));
    assert_eq!(xs, vec![at(2, 0), at(1, 0), at(0, 0)]);

    xs.sort_by_key(|p| front_first_key(Direction::Left, *p));
    assert_eq!(xs, vec![at(0, 0), at(1, 0), at(2, 0)]);
}

#[test]
fn test_step_advances_counter_and_clears_initial() {
    let mut grid = grid(2, 2);
    assert!(grid.initial);
    grid.do_step();
    assert!(!grid.initial);
    assert_eq!(grid.tick_count, 1);
    grid.run_ticks(3);
    assert_eq!(grid.tick_count, 4);
}

#[test]
fn test_tick_events_bracket_each_tick() {
    let mut grid = grid(2, 2);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    grid.add_listener(Arc::new(move |event: TickEvent| sink.lock().unwrap().push(event)));

    grid.run_ticks(2);

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            TickEvent::Started { tick: 0 },
            TickEvent::Ended { tick: 0 },
            TickEvent::Started { tick: 1 },
            TickEvent::Ended { tick: 1 },
        ]
    );
}

#[test]
fn test_mover_pushes_chain() {
    let mut grid = grid(5, 1);
    grid.place(at(0, 0), MOVER, Direction::Right);
    grid.place(at(1, 0), PUSH, Direction::Right);
    grid.place(at(2, 0), PUSH, Direction::Up);

    grid.do_step();

    assert_eq!(
        snapshot(&grid),
        vec![
            (1, 0, MOVER.to_string(), Direction::Right),
            (2, 0, PUSH.to_string(), Direction::Right),
            (3, 0, PUSH.to_string(), Direction::Up),
        ]
    );
    let mover = grid.cell_at(at(1, 0)).unwrap();
    assert_eq!(mover.old_position, at(0, 0));
}

#[test]
fn test_wall_blocks_chain() {
    let mut grid = grid(4, 1);
    grid.place(at(0, 0), MOVER, Direction::Right);
    grid.place(at(1, 0), PUSH, Direction::Right);
    grid.place(at(2, 0), WALL, Direction::Right);

    let before = snapshot(&grid);
    grid.run_ticks(3);
    assert_eq!(snapshot(&grid), before);
}

#[test]
fn test_adjacent_movers_each_move_once() {
    let mut grid = grid(6, 1);
    grid.place(at(0, 0), MOVER, Direction::Right);
    grid.place(at(1, 0), MOVER, Direction::Right);

    grid.do_step();

    let xs: Vec<i32> = grid.cells_sorted().iter().map(|c| c.pos.x).collect();
    assert_eq!(xs, vec![1, 2]);
}

#[test]
fn test_opposing_movers_stall() {
    let mut grid = grid(5, 1);
    grid.place(at(1, 0), MOVER, Direction::Right);
    grid.place(at(2, 0), PUSH, Direction::Right);
    grid.place(at(3, 0), MOVER, Direction::Left);

    let before = snapshot(&grid);
    grid.do_step();
    assert_eq!(snapshot(&grid), before);
}

#[test]
fn test_trash_eats_pushed_cell() {
    let mut grid = grid(4, 1);
    grid.place(at(0, 0), MOVER, Direction::Right);
    grid.place(at(1, 0), PUSH, Direction::Right);
    grid.place(at(2, 0), TRASH, Direction::Right);

    grid.do_step();

    assert_eq!(
        snapshot(&grid),
        vec![(1, 0, MOVER.to_string(), Direction::Right), (2, 0, TRASH.to_string(), Direction::Right)]
    );
}

#[test]
fn test_enemy_dies_with_its_pusher() {
    let mut grid = grid(3, 1);
    grid.place(at(0, 0), MOVER, Direction::Right);
    grid.place(at(1, 0), ENEMY, Direction::Right);

    grid.do_step();
    assert_eq!(grid.cell_count(), 0);
}

#[test]
fn test_disable_lasts_one_tick() {
    let mut grid = grid(5, 1);
    grid.place(at(0, 0), MOVER, Direction::Right);
    grid.disable(at(0, 0));

    grid.do_step();
    assert!(grid.cell_at(at(0, 0)).is_some());

    grid.do_step();
    assert!(grid.cell_at(at(1, 0)).is_some());
}

#[test]
fn test_disabler_freezes_neighbours() {
    let mut grid = grid(4, 2);
    grid.place(at(0, 1), DISABLER, Direction::Right);
    grid.place(at(0, 0), MOVER, Direction::Right);

    grid.run_ticks(3);
    assert_eq!(grid.type_id_at(at(0, 0)), Some(MOVER));
}

#[test]
fn test_delete_border_removes_leaving_cell() {
    let mut grid = grid(3, 1).with_border(BorderMode::Delete);
    grid.place(at(1, 0), MOVER, Direction::Right);
    grid.place(at(2, 0), PUSH, Direction::Right);

    grid.do_step();

    assert_eq!(snapshot(&grid), vec![(2, 0, MOVER.to_string(), Direction::Right)]);
}

#[test]
fn test_wrap_border_moves_mover_around() {
    let mut grid = grid(3, 1).with_border(BorderMode::Wrap);
    grid.place(at(2, 0), MOVER, Direction::Right);

    grid.do_step();
    assert_eq!(grid.type_id_at(at(0, 0)), Some(MOVER));
}

// ============================================================================
// Core cells
// ============================================================================

#[test]
fn test_generator_copies_cell_behind() {
    let mut grid = grid(4, 1);
    grid.place(at(0, 0), PUSH, Direction::Up);
    grid.place(at(1, 0), GENERATOR, Direction::Right);

    grid.do_step();
    let generated = grid.cell_at(at(2, 0)).unwrap();
    assert_eq!(grid.registry().get(generated.kind).id, PUSH);
    assert_eq!(generated.direction, Direction::Up);
    assert_eq!(generated.old_position, at(1, 0));
    assert_eq!(generated.generated_in, Some(0));

    grid.do_step();
    assert_eq!(grid.cell_count(), 4);
    assert_eq!(grid.type_id_at(at(3, 0)), Some(PUSH));
}

#[test]
fn test_generator_without_source_does_nothing() {
    let mut grid = grid(3, 1);
    grid.place(at(1, 0), GENERATOR, Direction::Right);
    grid.do_step();
    assert_eq!(grid.cell_count(), 1);
}

#[test]
fn test_rotator_turns_neighbours() {
    let mut grid = grid(3, 3);
    grid.place(at(1, 1), CW_ROTATOR, Direction::Right);
    grid.place(at(1, 0), MOVER, Direction::Right);
    grid.place(at(2, 1), WALL, Direction::Right);

    grid.do_step();

    let mover = grid.cell_at(at(1, 0)).unwrap();
    assert_eq!(mover.direction, Direction::Down);
    assert_eq!(mover.rotation_offset, 1);
    assert_eq!(grid.cell_at(at(2, 1)).unwrap().direction, Direction::Right);
}

// ============================================================================
// Utility cells
// ============================================================================

#[test]
fn test_orientator_aligns_neighbours() {
    let mut grid = grid(3, 3);
    grid.place(at(1, 1), ORIENTATOR, Direction::Up);
    grid.place(at(1, 0), PUSH, Direction::Right);
    grid.place(at(0, 1), WALL, Direction::Right);

    grid.do_step();

    assert_eq!(grid.cell_at(at(1, 0)).unwrap().direction, Direction::Up);
    assert_eq!(grid.cell_at(at(0, 1)).unwrap().direction, Direction::Right);
}

#[test]
fn test_jell_spreads_once_per_tick() {
    let mut grid = grid(3, 3);
    grid.place(at(1, 1), JELL, Direction::Right);
    grid.place(at(1, 0), PUSH, Direction::Up);
    grid.place(at(0, 0), PUSH, Direction::Up);

    grid.do_step();
    assert_eq!(grid.type_id_at(at(1, 0)), Some(JELL));
    assert_eq!(grid.cell_at(at(1, 0)).unwrap().direction, Direction::Up);
    assert_eq!(grid.type_id_at(at(0, 0)), Some(PUSH));

    grid.do_step();
    assert_eq!(grid.type_id_at(at(0, 0)), Some(JELL));
}

#[test]
fn test_random_rotator_turns_front_cell_a_quarter() {
    let mut grid = grid(3, 1);
    grid.place(at(0, 0), RANDOM_ROTATOR, Direction::Right);
    grid.place(at(1, 0), PUSH, Direction::Right);

    grid.do_step();
    let direction = grid.cell_at(at(1, 0)).unwrap().direction;
    assert!(matches!(direction, Direction::Up | Direction::Down), "got {direction:?}");
}

#[test]
fn test_nuke_copies_itself_once() {
    let mut grid = grid(3, 3);
    grid.place(at(1, 1), NUKE, Direction::Right);

    grid.do_step();
    assert_eq!(grid.cell_count(), 2);
}

#[test]
fn test_piston_extends_when_hit_from_behind() {
    let mut grid = grid(4, 1);
    grid.place(at(0, 0), MOVER, Direction::Right);
    grid.place(at(1, 0), PISTON, Direction::Right);

    grid.do_step();

    assert!(grid.cell_at(at(0, 0)).is_none());
    let piston = grid.cell_at(at(1, 0)).unwrap();
    assert!(piston.state.extended);
    assert!(piston.state.actually_extended);
    assert_eq!(grid.registry().get(piston.kind).texture_for(piston), "pistonOn");
    assert_eq!(grid.type_id_at(at(2, 0)), Some(PISTON_HEAD));

    grid.rotate(at(1, 0), 1);
    assert_eq!(grid.cell_at(at(1, 0)).unwrap().direction, Direction::Right);
}

#[test]
fn test_sticky_piston_pulls_on_retract() {
    let mut grid = grid(4, 1);
    let piston = grid.place(at(0, 0), STICKY_PISTON, Direction::Right).unwrap();
    grid.place(at(1, 0), PUSH, Direction::Right);
    grid.cell_mut(piston).unwrap().state.extended = true;

    grid.do_step();
    assert_eq!(grid.type_id_at(at(1, 0)), Some(STICKY_PISTON_HEAD));
    assert_eq!(grid.type_id_at(at(2, 0)), Some(PUSH));

    grid.cell_mut(piston).unwrap().state.extended = false;
    grid.do_step();
    assert_eq!(grid.type_id_at(at(1, 0)), Some(PUSH));
    assert!(grid.cell_at(at(2, 0)).is_none());
    assert!(!grid.cell(piston).unwrap().state.actually_extended);
}

// ============================================================================
// Tunneling cells
// ============================================================================

#[test]
fn test_mover_jumps_through_tunnel() {
    let mut grid = grid(4, 1);
    grid.place(at(0, 0), MOVER, Direction::Right);
    grid.place(at(1, 0), TUNNEL, Direction::Right);

    grid.do_step();
    assert_eq!(grid.type_id_at(at(2, 0)), Some(MOVER));
    assert_eq!(grid.type_id_at(at(1, 0)), Some(TUNNEL));
}

#[test]
fn test_mover_turns_through_redirector() {
    let mut grid = grid(3, 3);
    grid.place(at(0, 0), MOVER, Direction::Right);
    grid.place(at(1, 0), REDIRECTOR, Direction::Left);

    grid.do_step();
    let mover = grid.cell_at(at(1, 1)).unwrap();
    assert_eq!(mover.direction, Direction::Up);
}

// ============================================================================
// Determinism and extension cells
// ============================================================================

#[test]
fn test_cloned_grid_replays_identically() {
    let mut grid = grid(12, 12).with_seed(99);
    for (x, y, id) in [(2, 2, NUKE), (8, 3, RANDOM_ROTATOR), (9, 3, PUSH), (5, 9, MOVER), (1, 7, GENERATOR)] {
        grid.place(at(x, y), id, Direction::Right);
    }
    let mut copy = grid.clone();

    grid.run_ticks(12);
    copy.run_ticks(12);
    assert_eq!(snapshot(&grid), snapshot(&copy));
}

struct Exploding;

impl CellBehavior for Exploding {
    fn name(&self) -> &str {
        "exploding"
    }

    fn update(&self, _: &mut CellGrid, _: CellId) -> Result<(), BehaviorError> {
        panic!("boom");
    }
}

struct Failing;

impl CellBehavior for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn update(&self, _: &mut CellGrid, _: CellId) -> Result<(), BehaviorError> {
        Err(BehaviorError::Failed("nope".into()))
    }
}

/// Blocks every push, like a wall that can still be rotated.
struct Anchor;

impl CellBehavior for Anchor {
    fn name(&self) -> &str {
        "anchor"
    }

    fn update(&self, grid: &mut CellGrid, cell: CellId) -> Result<(), BehaviorError> {
        let pos = grid.cell(cell).ok_or(BehaviorError::MissingCell(cell))?.pos;
        grid.rotate(pos, 1);
        Ok(())
    }

    fn push(&self, _: &mut CellGrid, _: CellId, _: Direction, _: i32, _: usize) -> Option<crate::game::push::PushOutcome> {
        Some(crate::game::push::PushOutcome::Blocked)
    }
}

/// Pushes pass straight through it, like a crossway.
struct Hollow;

impl CellBehavior for Hollow {
    fn name(&self) -> &str {
        "hollow"
    }

    fn update(&self, _: &mut CellGrid, _: CellId) -> Result<(), BehaviorError> {
        Ok(())
    }

    fn exit_point(
        &self,
        grid: &CellGrid,
        cell: CellId,
        dir: Direction,
        depth: usize,
    ) -> Option<Option<crate::game::push::Movement>> {
        let pos = grid.cell(cell)?.pos;
        Some(grid.cell_to(pos, dir, depth))
    }
}

fn registry_with_extensions() -> Arc<Registry> {
    let mut registry = Registry::with_builtins();
    registry.register_cell(
        CellType::new("test.exploding", "Exploding", Behavior::Custom(Arc::new(Exploding)))
            .updates(UpdateKind::Directional, 0.5),
    );
    registry.register_cell(
        CellType::new("test.failing", "Failing", Behavior::Custom(Arc::new(Failing)))
            .updates(UpdateKind::Random, 0.5),
    );
    registry.register_cell(
        CellType::new("test.anchor", "Anchor", Behavior::Custom(Arc::new(Anchor)))
            .updates(UpdateKind::Random, 0.6),
    );
    registry.register_cell(CellType::new("test.hollow", "Hollow", Behavior::Custom(Arc::new(Hollow))));
    Arc::new(registry)
}

#[test]
fn test_custom_exit_point_lets_pushes_through() {
    let mut grid = CellGrid::new(registry_with_extensions(), 4, 1);
    grid.place(at(0, 0), MOVER, Direction::Right);
    grid.place(at(1, 0), "test.hollow", Direction::Right);

    grid.do_step();
    assert_eq!(grid.type_id_at(at(2, 0)), Some(MOVER));
    assert_eq!(grid.type_id_at(at(1, 0)), Some("test.hollow"));

    // a hollow cell against the edge leads nowhere
    grid.rm(at(2, 0));
    grid.place(at(3, 0), "test.hollow", Direction::Right);
    grid.place(at(2, 0), PUSH, Direction::Right);
    assert_eq!(grid.push(at(2, 0), Direction::Right, 1), crate::game::push::PushResult::Blocked);
}

#[test]
fn test_misbehaving_extension_is_isolated() {
    let mut grid = CellGrid::new(registry_with_extensions(), 5, 3);
    grid.place(at(0, 0), "test.exploding", Direction::Right);
    grid.place(at(0, 1), "test.failing", Direction::Right);
    grid.place(at(0, 2), MOVER, Direction::Right);

    grid.do_step();

    assert_eq!(grid.tick_count, 1);
    assert_eq!(grid.type_id_at(at(1, 2)), Some(MOVER));
    assert_eq!(grid.type_id_at(at(0, 0)), Some("test.exploding"));
}

#[test]
fn test_extension_push_override_and_update() {
    let mut grid = CellGrid::new(registry_with_extensions(), 4, 1);
    grid.place(at(0, 0), MOVER, Direction::Right);
    grid.place(at(1, 0), "test.anchor", Direction::Right);

    grid.do_step();

    assert_eq!(grid.type_id_at(at(0, 0)), Some(MOVER));
    assert_eq!(grid.cell_at(at(1, 0)).unwrap().direction, Direction::Down);
}

#[test]
fn test_rotator_leaves_tunnel_alone() {
    let mut grid = grid(3, 2);
    grid.place(at(1, 1), CW_ROTATOR, Direction::Right);
    grid.place(at(1, 0), TUNNEL, Direction::Right);
    grid.place(at(0, 1), PUSH, Direction::Right);

    grid.do_step();

    assert_eq!(grid.cell_at(at(1, 0)).map(|c| c.direction), Some(Direction::Right));
    assert_eq!(grid.cell_at(at(0, 1)).map(|c| c.direction), Some(Direction::Down));
}
