//! Multi-source breadth-first path search with a hard-terrain fallback.

use std::collections::VecDeque;

use tile_defence_core::{Direction, PathError};
use tracing::{debug, info};

use crate::tile::{grow_path_to, is_walkable, Tile};

const ALTERNATIVE_ORDER: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
];
const REGULAR_ORDER: [Direction; 4] = [
    Direction::West,
    Direction::East,
    Direction::South,
    Direction::North,
];

/// Outcome of a successful search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SearchReport {
    /// Whether the hard-terrain fallback ran.
    pub(crate) second_search: bool,
}

fn expand(tiles: &mut [Tile], frontier: &mut VecDeque<usize>, allow_hard_terrain: bool) {
    while let Some(current) = frontier.pop_front() {
        let order = if tiles[current].is_alternative() {
            ALTERNATIVE_ORDER
        } else {
            REGULAR_ORDER
        };
        for direction in order {
            if let Some(grown) = grow_path_to(tiles, current, direction, allow_hard_terrain) {
                frontier.push_back(grown);
            }
        }
    }
}

/// Rebuilds distances, successors, and exit points for every tile.
///
/// Destinations seed the first pass, which treats walls and towers as
/// obstacles. When that pass leaves a walkable tile unreached while the board
/// holds hard terrain, a second pass resumes from the hard-terrain tiles the
/// first pass touched and may walk through them. Results of the first pass
/// are never overwritten and there is no third pass.
pub(crate) fn find_paths(
    tiles: &mut [Tile],
    frontier: &mut VecDeque<usize>,
) -> Result<SearchReport, PathError> {
    frontier.clear();
    for (index, tile) in tiles.iter_mut().enumerate() {
        if tile.content().content().is_destination() {
            tile.become_destination();
            frontier.push_back(index);
        } else {
            tile.clear_path();
        }
    }
    if frontier.is_empty() {
        return Err(PathError::NoDestination);
    }
    let destinations = frontier.len();

    expand(tiles, frontier, false);
    for tile in tiles.iter_mut() {
        tile.mark_reached_directly();
    }

    let stranded = tiles
        .iter()
        .position(|tile| is_walkable(tile.content().content()) && !tile.has_path());
    let has_hard_terrain = tiles
        .iter()
        .any(|tile| tile.content().content().is_hard_terrain());

    let second_search = match stranded {
        Some(index) if has_hard_terrain => {
            tiles[index].flag_second_search();
            let mut seeds: Vec<usize> = tiles
                .iter()
                .enumerate()
                .filter(|(_, tile)| tile.content().content().is_hard_terrain() && tile.has_path())
                .map(|(index, _)| index)
                .collect();
            seeds.sort_by_key(|&seed| tiles[seed].distance());
            info!(
                tile = ?tiles[index].coord(),
                seeds = seeds.len(),
                "walkable tile stranded, searching through hard terrain"
            );
            frontier.extend(seeds);
            expand(tiles, frontier, true);
            true
        }
        _ => false,
    };

    debug!(
        destinations,
        reached = tiles.iter().filter(|tile| tile.has_path()).count(),
        second_search,
        "paths recomputed"
    );
    Ok(SearchReport { second_search })
}
