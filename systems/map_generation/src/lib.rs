#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural terrain generation for new boards.
//!
//! The generator runs entirely on a private [`TerrainGrid`] and hands back one
//! [`MapData`] per board tile. Every random decision flows from a single
//! ChaCha stream seeded by [`GeneratorParams::seed`], so a seed and a board
//! size always reproduce the same map.

mod automata;
mod overlays;
mod regions;
mod rivers;
mod terrain;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tile_defence_core::{BoardSize, GeneratorParams, MapData, TileContent};
use tracing::debug;

pub use regions::{partition, regions_of, Region};
pub use rivers::bresenham_line;
pub use terrain::{Cell, Terrain, TerrainGrid};

/// Smallest interior extent the automata can meaningfully work on.
const MIN_INTERIOR: u32 = 3;

/// Deterministic map generator configured by [`GeneratorParams`].
#[derive(Clone, Debug)]
pub struct MapGenerator {
    params: GeneratorParams,
}

impl MapGenerator {
    /// Creates a generator that uses the provided tuning knobs.
    #[must_use]
    pub fn new(params: GeneratorParams) -> Self {
        Self { params }
    }

    /// Parameters the generator was created with.
    #[must_use]
    pub fn params(&self) -> &GeneratorParams {
        &self.params
    }

    /// Produces the interior terrain before resource flavours are assigned.
    ///
    /// The pipeline fills and smooths water and ground, removes small regions
    /// and links the surviving lakes with rivers, then grows mountains and
    /// resources on the remaining ground.
    #[must_use]
    pub fn terrain(&self, width: u32, height: u32) -> TerrainGrid {
        let params = &self.params;
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let mut grid = TerrainGrid::new(width, height, Terrain::Water);

        automata::random_fill(&mut grid, params, &mut rng);
        automata::smooth_terrain(&mut grid, params);
        debug!(
            water = grid.count(Terrain::Water),
            ground = grid.count(Terrain::Ground),
            "terrain smoothed"
        );

        regions::simplify(&mut grid, params.region_threshold);
        debug!(water = grid.count(Terrain::Water), "regions simplified");

        automata::fill_mountains(&mut grid, params, &mut rng);
        automata::smooth_mountains(&mut grid, params);
        automata::fill_resources(&mut grid, params, &mut rng);
        automata::smooth_resources(&mut grid, params);
        debug!(
            mountains = grid.count(Terrain::Mountain),
            resources = grid.count(Terrain::Resource),
            "overlays grown"
        );

        grid
    }

    /// Generates one cell per board tile in row-major order.
    ///
    /// The interior is wrapped in `border_size` rings of plain ground. Boards
    /// too small to hold an interior of at least three cells per axis come
    /// back as plain ground everywhere.
    #[must_use]
    pub fn generate(&self, size: BoardSize) -> Vec<MapData> {
        let border = self.params.border_size;
        let mut map = vec![MapData::of(TileContent::PLAIN); size.tile_count()];

        let width = size.columns().saturating_sub(border.saturating_mul(2));
        let height = size.rows().saturating_sub(border.saturating_mul(2));
        if width < MIN_INTERIOR || height < MIN_INTERIOR {
            debug!(
                columns = size.columns(),
                rows = size.rows(),
                "board too small for terrain, generating plain ground"
            );
            return map;
        }

        let grid = self.terrain(width, height);
        let mut write = |(x, y): Cell, content: TileContent| {
            let column = u32::try_from(x).unwrap_or(0) + border;
            let row = u32::try_from(y).unwrap_or(0) + border;
            let index = row as usize * size.columns() as usize + column as usize;
            if let Some(slot) = map.get_mut(index) {
                *slot = MapData::of(content);
            }
        };

        for cell in grid.cells() {
            let content = match grid.get(cell) {
                Some(Terrain::Water) => TileContent::Water,
                Some(Terrain::Mountain) => TileContent::Mountain,
                _ => TileContent::PLAIN,
            };
            write(cell, content);
        }
        for (cell, kind) in overlays::resource_variations(&grid) {
            write(cell, TileContent::Resource(kind));
        }

        debug!(
            seed = self.params.seed,
            columns = size.columns(),
            rows = size.rows(),
            "map generated"
        );
        map
    }
}
