use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::game::coord::{Direction, Position};
use crate::game::registry::CellTypeKey;

use super::CellGrid;

impl CellGrid {
    /// Scatter cells over the empty slots of a bounded grid. Each slot is
    /// filled with probability `density`, drawing a type uniformly from
    /// `palette` and a random facing. The same seed always yields the same grid.
    ///
    /// Returns the number of cells placed.
    pub fn generate_random(&mut self, palette: &[CellTypeKey], density: f64, seed: u64) -> usize {
        if palette.is_empty() || self.infinite {
            return 0;
        }
        let density = density.clamp(0.0, 1.0);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut placed = 0;

        for y in 0..self.size.height {
            for x in 0..self.size.width {
                let pos = Position::new(x, y);
                if self.id_at(pos).is_some() || !rng.random_bool(density) {
                    continue;
                }
                let kind = palette[rng.random_range(0..palette.len())];
                let direction = Direction::from_u8(rng.random_range(0..4));
                if self.load_cell(pos, kind, direction).is_some() {
                    placed += 1;
                }
            }
        }

        info!(
            "Generated {} random cells on {}x{} (density {:.2}, seed {})",
            placed, self.size.width, self.size.height, density, seed
        );
        placed
    }
}
