//! Grid topology and per-tile path bookkeeping.

use glam::Vec2;
use tile_defence_core::{Direction, Neighbor, TileContent, TileCoord, INFINITE_DISTANCE};

use crate::content::PlacedContent;

/// Single cell of the board.
///
/// Neighbour links are indices into the board's tile array and are set once
/// while the grid is built.
#[derive(Debug)]
pub struct Tile {
    coord: TileCoord,
    center: Vec2,
    neighbors: [Option<usize>; 8],
    pub(crate) content: PlacedContent,
    distance: u32,
    next_on_path: Option<usize>,
    path_direction: Direction,
    exit_point: Vec2,
    is_alternative: bool,
    reached_directly: bool,
    caused_second_search: bool,
}

impl Tile {
    pub(crate) fn new(coord: TileCoord, center: Vec2, content: PlacedContent) -> Self {
        let column_even = coord.column() % 2 == 0;
        let row_even = coord.row() % 2 == 0;
        Self {
            coord,
            center,
            neighbors: [None; 8],
            content,
            distance: INFINITE_DISTANCE,
            next_on_path: None,
            path_direction: Direction::North,
            exit_point: center,
            is_alternative: column_even != row_even,
            reached_directly: false,
            caused_second_search: false,
        }
    }

    /// Grid coordinate of the tile.
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Board-space centre of the tile.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Content currently placed on the tile.
    #[must_use]
    pub const fn content(&self) -> &PlacedContent {
        &self.content
    }

    /// Index of the neighbour in the provided slot, if the tile has one.
    #[must_use]
    pub const fn neighbor(&self, neighbor: Neighbor) -> Option<usize> {
        self.neighbors[neighbor.slot()]
    }

    /// Steps to the nearest destination, or [`INFINITE_DISTANCE`].
    #[must_use]
    pub const fn distance(&self) -> u32 {
        self.distance
    }

    /// Whether the last search reached the tile.
    #[must_use]
    pub const fn has_path(&self) -> bool {
        self.distance != INFINITE_DISTANCE
    }

    /// Index of the tile to step onto next.
    #[must_use]
    pub const fn next_on_path(&self) -> Option<usize> {
        self.next_on_path
    }

    /// Heading taken when leaving the tile along its path.
    #[must_use]
    pub const fn path_direction(&self) -> Direction {
        self.path_direction
    }

    /// Point on the tile edge where walkers leave it.
    #[must_use]
    pub const fn exit_point(&self) -> Vec2 {
        self.exit_point
    }

    /// Whether the tile scans its neighbours north-first.
    #[must_use]
    pub const fn is_alternative(&self) -> bool {
        self.is_alternative
    }

    /// Whether the tile was reached without crossing hard terrain.
    #[must_use]
    pub const fn reached_directly(&self) -> bool {
        self.reached_directly
    }

    /// Whether the tile triggered the hard-terrain fallback search.
    #[must_use]
    pub const fn caused_second_search(&self) -> bool {
        self.caused_second_search
    }

    pub(crate) fn clear_path(&mut self) {
        self.distance = INFINITE_DISTANCE;
        self.next_on_path = None;
        self.reached_directly = false;
        self.caused_second_search = false;
    }

    pub(crate) fn become_destination(&mut self) {
        self.distance = 0;
        self.next_on_path = None;
        self.exit_point = self.center;
        self.reached_directly = false;
        self.caused_second_search = false;
    }

    pub(crate) fn mark_reached_directly(&mut self) {
        self.reached_directly = self.has_path();
    }

    pub(crate) fn flag_second_search(&mut self) {
        self.caused_second_search = true;
    }
}

/// Links `tile` with the tile to its west.
///
/// # Panics
///
/// Panics if either side of the link was already defined.
pub(crate) fn connect_east_west(tiles: &mut [Tile], tile: usize, west: usize) {
    assert!(
        tiles[west].neighbor(Neighbor::East).is_none() && tiles[tile].neighbor(Neighbor::West).is_none(),
        "redefined east/west neighbours"
    );
    tiles[west].neighbors[Neighbor::East.slot()] = Some(tile);
    tiles[tile].neighbors[Neighbor::West.slot()] = Some(west);
}

/// Links `tile` with the tile to its south.
///
/// # Panics
///
/// Panics if either side of the link was already defined.
pub(crate) fn connect_north_south(tiles: &mut [Tile], tile: usize, south: usize) {
    assert!(
        tiles[south].neighbor(Neighbor::North).is_none() && tiles[tile].neighbor(Neighbor::South).is_none(),
        "redefined north/south neighbours"
    );
    tiles[south].neighbors[Neighbor::North.slot()] = Some(tile);
    tiles[tile].neighbors[Neighbor::South.slot()] = Some(south);
}

/// Links `tile` with the diagonal neighbours of the tile to its south.
///
/// Requires the east/west links of `south` to exist already.
///
/// # Panics
///
/// Panics if any side of a diagonal link was already defined.
pub(crate) fn connect_diagonals(tiles: &mut [Tile], tile: usize, south: usize) {
    if let Some(south_east) = tiles[south].neighbor(Neighbor::East) {
        assert!(
            tiles[south_east].neighbor(Neighbor::NorthWest).is_none()
                && tiles[tile].neighbor(Neighbor::SouthEast).is_none(),
            "redefined diagonal neighbours"
        );
        tiles[south_east].neighbors[Neighbor::NorthWest.slot()] = Some(tile);
        tiles[tile].neighbors[Neighbor::SouthEast.slot()] = Some(south_east);
    }
    if let Some(south_west) = tiles[south].neighbor(Neighbor::West) {
        assert!(
            tiles[south_west].neighbor(Neighbor::NorthEast).is_none()
                && tiles[tile].neighbor(Neighbor::SouthWest).is_none(),
            "redefined diagonal neighbours"
        );
        tiles[south_west].neighbors[Neighbor::NorthEast.slot()] = Some(tile);
        tiles[tile].neighbors[Neighbor::SouthWest.slot()] = Some(south_west);
    }
}

/// Extends the path of `from` onto its neighbour in direction `toward`.
///
/// The neighbour always records the distance, successor, and exit point, but
/// it is only returned for further expansion when its content lets walkers
/// through. Hard terrain lets them through when `allow_hard_terrain` is set.
pub(crate) fn grow_path_to(
    tiles: &mut [Tile],
    from: usize,
    toward: Direction,
    allow_hard_terrain: bool,
) -> Option<usize> {
    let source = &tiles[from];
    if !source.has_path() {
        return None;
    }
    let neighbor = source.neighbor(Neighbor::from_direction(toward))?;
    if tiles[neighbor].has_path() {
        return None;
    }

    let distance = tiles[from].distance + 1;
    let heading = toward.opposite();
    let target = &mut tiles[neighbor];
    target.distance = distance;
    target.next_on_path = Some(from);
    target.exit_point = target.center + heading.half_vector();
    target.path_direction = heading;

    let content = target.content.content();
    let passable = !content.blocks_path() || (allow_hard_terrain && content.is_hard_terrain());
    passable.then_some(neighbor)
}

/// Whether walkers can ever stand on the content.
pub(crate) const fn is_walkable(content: TileContent) -> bool {
    !content.blocks_path()
}
