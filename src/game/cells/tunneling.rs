/// Tunneling pack: cells a push passes through instead of moving.
///
/// None of these cells update on their own. Their effect lives entirely in
/// `exit_point` (see `push.rs`), which tells a push where it lands and which
/// way it travels after entering the cell.

use crate::game::behavior::Behavior;
use crate::game::cell::CellData;
use crate::game::cell_type::{flip_identity, flip_two_way, never, CellType};
use crate::game::coord::Direction;
use crate::game::registry::Registry;

pub const REDIRECTOR: &str = "jm.tunneling.redirector";
pub const TUNNEL: &str = "jm.tunneling.tunnel";
pub const CROSSWAY: &str = "jm.tunneling.crossway";
pub const CROSSDIRECTOR: &str = "jm.tunneling.crossdirector";

pub fn register(registry: &mut Registry) {
    registry.register_cell(
        CellType::new(REDIRECTOR, "Redirector", Behavior::Redirector)
            .raw_id(14)
            .description("Bends pushes entering from its two open sides by a quarter turn.")
            .flip_with(flip_two_way)
            .on_rotate(never),
    );
    registry.register_cell(
        CellType::new(TUNNEL, "Tunnel", Behavior::Tunnel)
            .raw_id(15)
            .description("Lets pushes along its axis pass straight through.")
            .flip_with(flip_identity)
            .merge_with(merge_tunnel)
            .on_rotate(never),
    );
    registry.register_cell(
        CellType::new(CROSSWAY, "Crossway", Behavior::Crossway)
            .raw_id(16)
            .description("Lets pushes pass straight through from any side.")
            .flip_with(flip_identity),
    );
    registry.register_cell(
        CellType::new(CROSSDIRECTOR, "Crossdirector", Behavior::Crossdirector)
            .raw_id(17)
            .description("Bends every push entering it by a quarter turn.")
            .flip_with(flip_two_way)
            .on_rotate(never),
    );

    registry.add_slot(&[TUNNEL, CROSSWAY]);
    registry.add_slot(&[REDIRECTOR, CROSSDIRECTOR]);
}

/// Two tunnels on crossing axes merge into a crossway.
fn merge_tunnel(registry: &Registry, existing: CellData, incoming: CellData) -> CellData {
    let (existing_kind, existing_dir) = existing;
    let (incoming_kind, incoming_dir) = incoming;
    if incoming_kind == existing_kind && !existing_dir.is_parallel(incoming_dir) {
        if let Some(crossway) = registry.key_of(CROSSWAY) {
            return (crossway, Direction::Right);
        }
    }
    incoming
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing_tunnels_merge_into_crossway() {
        let registry = Registry::with_builtins();
        let tunnel = registry.key_of(TUNNEL).unwrap();
        let crossway = registry.key_of(CROSSWAY).unwrap();
        let merged = registry.get(tunnel).merged(&registry, (tunnel, Direction::Right), (tunnel, Direction::Up));
        assert_eq!(merged, (crossway, Direction::Right));
    }

    #[test]
    fn test_parallel_tunnels_keep_incoming() {
        let registry = Registry::with_builtins();
        let tunnel = registry.key_of(TUNNEL).unwrap();
        let merged = registry.get(tunnel).merged(&registry, (tunnel, Direction::Right), (tunnel, Direction::Left));
        assert_eq!(merged, (tunnel, Direction::Left));
    }

    #[test]
    fn test_tunneling_cells_do_not_update() {
        let registry = Registry::with_builtins();
        for id in [REDIRECTOR, TUNNEL, CROSSWAY, CROSSDIRECTOR] {
            assert!(registry.by_id(id).unwrap().update.is_none(), "{id} should be passive");
        }
    }
}
