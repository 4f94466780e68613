//! Random fill and cellular-automata smoothing passes.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tile_defence_core::GeneratorParams;

use crate::terrain::{surrounding, Cell, Terrain, TerrainGrid};

/// Seeds the interior: the outermost ring is water, every other cell is
/// ground with `ground_fill_percent` probability.
pub(crate) fn random_fill(grid: &mut TerrainGrid, params: &GeneratorParams, rng: &mut ChaCha8Rng) {
    let (width, height) = (grid.width(), grid.height());
    for (x, y) in grid.cells().collect::<Vec<_>>() {
        let terrain = if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            Terrain::Water
        } else if rng.gen_range(0..100) < params.ground_fill_percent {
            Terrain::Ground
        } else {
            Terrain::Water
        };
        grid.set((x, y), terrain);
    }
}

/// Applies one smoothing rule `iterations` times.
///
/// `rule` inspects the snapshot (or the live grid when the backlog is off)
/// and returns the replacement terrain for a cell, or `None` to keep it.
fn smooth<F>(grid: &mut TerrainGrid, iterations: u32, use_backlog: bool, mut rule: F)
where
    F: FnMut(&TerrainGrid, Cell) -> Option<Terrain>,
{
    for _ in 0..iterations {
        if use_backlog {
            let snapshot = grid.clone();
            for cell in snapshot.cells() {
                if let Some(terrain) = rule(&snapshot, cell) {
                    grid.set(cell, terrain);
                }
            }
        } else {
            for cell in grid.cells().collect::<Vec<_>>() {
                if let Some(terrain) = rule(grid, cell) {
                    grid.set(cell, terrain);
                }
            }
        }
    }
}

/// Counts water among the eight neighbours. Orthogonal neighbours beyond the
/// edge count as water so the outer ring stays wet.
pub(crate) fn count_water(grid: &TerrainGrid, (x, y): Cell) -> u32 {
    surrounding((x, y))
        .filter(|&(nx, ny)| match grid.get((nx, ny)) {
            Some(terrain) => terrain == Terrain::Water,
            None => nx == x || ny == y,
        })
        .count() as u32
}

/// Smooths the water/ground split.
pub(crate) fn smooth_terrain(grid: &mut TerrainGrid, params: &GeneratorParams) {
    let threshold = params.water_count_threshold;
    smooth(grid, params.iterations, params.use_backlog, |source, cell| {
        let water = count_water(source, cell);
        if water > threshold {
            Some(Terrain::Water)
        } else if water < threshold {
            Some(Terrain::Ground)
        } else {
            None
        }
    });
}

/// Scatters mountains over ground, denser toward the far columns.
pub(crate) fn fill_mountains(
    grid: &mut TerrainGrid,
    params: &GeneratorParams,
    rng: &mut ChaCha8Rng,
) {
    scatter(grid, Terrain::Mountain, params.mountain_fill_percent, rng);
}

/// Scatters resources over ground, denser toward the far columns.
pub(crate) fn fill_resources(
    grid: &mut TerrainGrid,
    params: &GeneratorParams,
    rng: &mut ChaCha8Rng,
) {
    scatter(grid, Terrain::Resource, params.resource_fill_percent, rng);
}

fn scatter(grid: &mut TerrainGrid, terrain: Terrain, percent: u32, rng: &mut ChaCha8Rng) {
    let width = grid.width().max(1) as f32;
    for (x, y) in grid.cells().collect::<Vec<_>>() {
        if !grid.is((x, y), Terrain::Ground) {
            continue;
        }
        let chance = (percent as f32 * x as f32 / width) as u32;
        if rng.gen_range(0..100) < chance {
            grid.set((x, y), terrain);
        }
    }
}

/// Counts mountain neighbours, or zero when water lies within `radius`.
pub(crate) fn count_mountains(grid: &TerrainGrid, (x, y): Cell, radius: i32) -> u32 {
    for nx in x - radius..=x + radius {
        for ny in y - radius..=y + radius {
            if grid.is((nx, ny), Terrain::Water) {
                return 0;
            }
        }
    }
    surrounding((x, y))
        .filter(|&cell| grid.is(cell, Terrain::Mountain))
        .count() as u32
}

/// Grows mountain ranges on dry land.
pub(crate) fn smooth_mountains(grid: &mut TerrainGrid, params: &GeneratorParams) {
    let threshold = params.mountain_count_threshold;
    let radius = i32::try_from(params.mountain_distance_to_water).unwrap_or(i32::MAX / 2);
    smooth(
        grid,
        params.mountain_iterations,
        params.use_backlog,
        |source, cell| {
            if source.is(cell, Terrain::Water) {
                return None;
            }
            let mountains = count_mountains(source, cell, radius);
            if mountains > threshold {
                Some(Terrain::Mountain)
            } else if mountains < threshold {
                Some(Terrain::Ground)
            } else {
                None
            }
        },
    );
}

/// Grows resource fields around water and other resources.
pub(crate) fn smooth_resources(grid: &mut TerrainGrid, params: &GeneratorParams) {
    let threshold = params.resource_count_threshold;
    smooth(
        grid,
        params.resource_iterations,
        params.use_backlog,
        |source, cell| {
            if !(source.is(cell, Terrain::Ground) || source.is(cell, Terrain::Resource)) {
                return None;
            }
            let nearby = surrounding(cell)
                .filter(|&neighbor| {
                    source.is(neighbor, Terrain::Water) || source.is(neighbor, Terrain::Resource)
                })
                .count() as u32;
            if nearby > threshold {
                Some(Terrain::Resource)
            } else if nearby < threshold {
                Some(Terrain::Ground)
            } else {
                None
            }
        },
    );
}
