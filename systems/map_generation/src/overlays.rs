//! Resource flavour assignment.

use tile_defence_core::ResourceKind;

use crate::terrain::{Cell, Terrain, TerrainGrid};

/// Assigns a flavour to every resource cell.
///
/// Cells are visited column by column. A resource touching water becomes a
/// forest and one touching a mountain becomes metal, whichever neighbour the
/// scan meets first. Otherwise it inherits from the first already assigned
/// resource neighbour and falls back to crystal.
#[must_use]
pub(crate) fn resource_variations(grid: &TerrainGrid) -> Vec<(Cell, ResourceKind)> {
    let mut assigned: Vec<(Cell, ResourceKind)> = Vec::new();
    let mut kinds: Vec<Option<ResourceKind>> = vec![None; grid.cells().count()];

    for (x, y) in grid.cells() {
        if !grid.is((x, y), Terrain::Resource) {
            continue;
        }

        let block = || (x - 1..=x + 1).flat_map(move |nx| (y - 1..=y + 1).map(move |ny| (nx, ny)));

        let from_terrain = block().find_map(|cell| match grid.get(cell) {
            Some(Terrain::Water) => Some(ResourceKind::Forest),
            Some(Terrain::Mountain) => Some(ResourceKind::Metal),
            _ => None,
        });
        let kind = from_terrain
            .or_else(|| {
                block()
                    .filter(|cell| *cell != (x, y) && grid.is(*cell, Terrain::Resource))
                    .find_map(|cell| grid.index(cell).and_then(|index| kinds[index]))
            })
            .unwrap_or(ResourceKind::Crystal);
        if let Some(index) = grid.index((x, y)) {
            kinds[index] = Some(kind);
        }
        assigned.push(((x, y), kind));
    }

    assigned
}
