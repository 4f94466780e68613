//! Flood-fill region extraction, noise removal, and lake connection.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::{
    rivers::carve_river,
    terrain::{orthogonal, Cell, Terrain, TerrainGrid},
};

/// Maximal 4-connected group of cells sharing one terrain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    /// Terrain shared by every cell of the region.
    pub terrain: Terrain,
    /// Cells in discovery order.
    pub cells: Vec<Cell>,
}

/// Extracts every region of the provided terrain.
///
/// Regions are discovered in scan order and flooded with 4-connectivity, so
/// diagonal contact does not join two regions.
#[must_use]
pub fn regions_of(grid: &TerrainGrid, terrain: Terrain) -> Vec<Region> {
    let width = usize::try_from(grid.width()).unwrap_or(0);
    let height = usize::try_from(grid.height()).unwrap_or(0);
    let slot = |(x, y): Cell| usize::try_from(x).unwrap_or(0) * height + usize::try_from(y).unwrap_or(0);
    let mut visited = vec![false; width * height];
    let mut regions = Vec::new();

    for cell in grid.cells() {
        if !grid.is(cell, terrain) || visited[slot(cell)] {
            continue;
        }

        let mut cells = Vec::new();
        let mut queue = VecDeque::from([cell]);
        visited[slot(cell)] = true;
        while let Some(current) = queue.pop_front() {
            cells.push(current);
            for neighbor in orthogonal(current) {
                if grid.is(neighbor, terrain) && !visited[slot(neighbor)] {
                    visited[slot(neighbor)] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        regions.push(Region { terrain, cells });
    }

    regions
}

/// Splits the whole grid into regions of every terrain.
#[must_use]
pub fn partition(grid: &TerrainGrid) -> Vec<Region> {
    [
        Terrain::Water,
        Terrain::Ground,
        Terrain::Mountain,
        Terrain::Resource,
    ]
    .into_iter()
    .flat_map(|terrain| regions_of(grid, terrain))
    .collect()
}

#[derive(Debug)]
struct Lake {
    edge: Vec<Cell>,
    connected: BTreeSet<usize>,
}

impl Lake {
    fn new(region: &Region, grid: &TerrainGrid) -> Self {
        let edge = region
            .cells
            .iter()
            .copied()
            .filter(|&cell| {
                orthogonal(cell)
                    .into_iter()
                    .any(|neighbor| matches!(grid.get(neighbor), Some(t) if t != Terrain::Water))
            })
            .collect();
        Self {
            edge,
            connected: BTreeSet::new(),
        }
    }
}

/// Closest pair of edge cells between two lakes.
#[derive(Clone, Copy, Debug)]
struct Bridge {
    distance: i64,
    from_lake: usize,
    to_lake: usize,
    from: Cell,
    to: Cell,
}

fn closest_between(lakes: &[Lake], from_lake: usize, to_lake: usize, best: &mut Option<Bridge>) {
    for &from in &lakes[from_lake].edge {
        for &to in &lakes[to_lake].edge {
            let dx = i64::from(from.0 - to.0);
            let dy = i64::from(from.1 - to.1);
            let distance = dx * dx + dy * dy;
            if best.map_or(true, |current| distance < current.distance) {
                *best = Some(Bridge {
                    distance,
                    from_lake,
                    to_lake,
                    from,
                    to,
                });
            }
        }
    }
}

fn connect(grid: &mut TerrainGrid, lakes: &mut [Lake], bridge: Bridge) {
    let _ = lakes[bridge.from_lake].connected.insert(bridge.to_lake);
    let _ = lakes[bridge.to_lake].connected.insert(bridge.from_lake);
    carve_river(grid, bridge.from, bridge.to);
}

/// Removes noise and links every surviving lake with rivers.
///
/// Ground regions smaller than `threshold` flood, then water regions smaller
/// than `threshold` dry out. Each lake without a river is linked to its
/// nearest neighbour, and a fixed-point pass keeps joining the closest pair of
/// lake groups until only one group remains.
pub(crate) fn simplify(grid: &mut TerrainGrid, threshold: usize) {
    for region in regions_of(grid, Terrain::Ground) {
        if region.cells.len() < threshold {
            for cell in region.cells {
                grid.set(cell, Terrain::Water);
            }
        }
    }

    let mut lakes = Vec::new();
    for region in regions_of(grid, Terrain::Water) {
        if region.cells.len() < threshold {
            for cell in region.cells {
                grid.set(cell, Terrain::Ground);
            }
        } else {
            lakes.push(region);
        }
    }

    let mut lakes: Vec<Lake> = lakes.iter().map(|region| Lake::new(region, &*grid)).collect();
    debug!(lakes = lakes.len(), "connecting lakes");
    connect_closest(grid, &mut lakes);
    connect_all(grid, &mut lakes);
}

fn connect_closest(grid: &mut TerrainGrid, lakes: &mut [Lake]) {
    for from_lake in 0..lakes.len() {
        if !lakes[from_lake].connected.is_empty() {
            continue;
        }
        let mut best = None;
        for to_lake in 0..lakes.len() {
            if to_lake != from_lake {
                closest_between(lakes, from_lake, to_lake, &mut best);
            }
        }
        if let Some(bridge) = best {
            connect(grid, lakes, bridge);
        }
    }
}

fn groups(lakes: &[Lake]) -> Vec<Vec<usize>> {
    let mut seen = vec![false; lakes.len()];
    let mut groups = Vec::new();
    for start in 0..lakes.len() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut group = vec![start];
        let mut cursor = 0;
        while cursor < group.len() {
            for &next in &lakes[group[cursor]].connected {
                if !seen[next] {
                    seen[next] = true;
                    group.push(next);
                }
            }
            cursor += 1;
        }
        groups.push(group);
    }
    groups
}

fn connect_all(grid: &mut TerrainGrid, lakes: &mut [Lake]) {
    // Each round at least halves the number of groups.
    for _ in 0..=lakes.len() {
        let groups = groups(lakes);
        if groups.len() <= 1 {
            return;
        }

        let mut connected_any = false;
        for (index, group) in groups.iter().enumerate() {
            let mut best = None;
            for (other_index, other) in groups.iter().enumerate() {
                if other_index == index {
                    continue;
                }
                for &from_lake in group {
                    for &to_lake in other {
                        closest_between(lakes, from_lake, to_lake, &mut best);
                    }
                }
            }
            if let Some(bridge) = best {
                connect(grid, lakes, bridge);
                connected_any = true;
            }
        }

        if !connected_any {
            return;
        }
    }
}
