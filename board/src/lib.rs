#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state for Tile Defence.
//!
//! The board owns the tile grid and every piece of content placed on it. Each
//! edit tentatively swaps a tile's content, rebuilds the path field, and rolls
//! the swap back when the new field would strand a spawn point or seal every
//! destination. Entities read the settled field through [`query`].

mod adaptation;
mod content;
mod pathfinding;
mod tile;

use std::collections::VecDeque;

use tile_defence_core::{
    BoardSize, Command, ContentType, DemolitionError, DestinationKind, Event, GeneratorParams,
    GroundKind, MapData, Neighbor, PathError, PlacementError, TileContent, TileCoord,
};
use tile_defence_system_map_generation::MapGenerator;
use tracing::{debug, info, warn};

pub use adaptation::{terrain_shape, Adaptation, TerrainShape};
pub use content::PlacedContent;
pub use tile::Tile;

use adaptation::Neighborhood;
use content::ContentFactory;
use pathfinding::SearchReport;
use tile::{connect_diagonals, connect_east_west, connect_north_south, is_walkable};

/// Contents swapped by a successful demolition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Demolition {
    /// Content that occupied the tile.
    pub previous: TileContent,
    /// Content the tile reverted to.
    pub replacement: TileContent,
}

/// Grid of tiles, their content, and the path field grown over them.
#[derive(Debug)]
pub struct Board {
    size: BoardSize,
    tiles: Vec<Tile>,
    factory: ContentFactory,
    spawn_points: Vec<TileCoord>,
    updating: Vec<TileCoord>,
    frontier: VecDeque<usize>,
    second_search: bool,
}

impl Board {
    /// Creates a board of plain ground with every neighbour link in place.
    ///
    /// The board has no destination yet, so no tile has a path.
    #[must_use]
    pub fn new(size: BoardSize) -> Self {
        let mut factory = ContentFactory::new();
        let columns = size.columns() as usize;
        let mut tiles: Vec<Tile> = Vec::with_capacity(size.tile_count());
        for row in 0..size.rows() {
            for column in 0..size.columns() {
                let coord = TileCoord::new(column, row);
                let index = tiles.len();
                tiles.push(Tile::new(
                    coord,
                    size.center_of(coord),
                    factory.get(TileContent::PLAIN),
                ));
                if column > 0 {
                    connect_east_west(&mut tiles, index, index - 1);
                }
                if row > 0 {
                    connect_north_south(&mut tiles, index, index - columns);
                    connect_diagonals(&mut tiles, index, index - columns);
                }
            }
        }

        Self {
            size,
            tiles,
            factory,
            spawn_points: Vec::new(),
            updating: Vec::new(),
            frontier: VecDeque::new(),
            second_search: false,
        }
    }

    /// Rebuilds a board from persisted tile contents in row-major order.
    ///
    /// No edit validation runs; the path field is recomputed once at the end.
    ///
    /// # Panics
    ///
    /// Panics if `contents` does not hold exactly one entry per tile.
    #[must_use]
    pub fn restore(size: BoardSize, contents: &[TileContent]) -> Self {
        assert_eq!(
            contents.len(),
            size.tile_count(),
            "restored contents do not cover the board"
        );
        let mut board = Self::new(size);
        for (index, content) in contents.iter().enumerate() {
            if *content != TileContent::PLAIN {
                let _ = board.replace_content(index, *content);
            }
        }
        board.refresh();
        board
    }

    /// Puts the spawn point and updating lists back into a recorded order.
    ///
    /// [`Board::restore`] lists both in row-major order; a save that
    /// remembers the order the player built things in hands it back here.
    /// Returns `false`, leaving the board untouched, when either order is not
    /// a permutation of the list it would replace.
    #[must_use]
    pub fn restore_order(&mut self, spawn_points: &[TileCoord], updating: &[TileCoord]) -> bool {
        if !same_members(&self.spawn_points, spawn_points)
            || !same_members(&self.updating, updating)
        {
            return false;
        }
        self.spawn_points = spawn_points.to_vec();
        self.updating = updating.to_vec();
        true
    }

    /// Resets every tile to plain ground.
    pub fn clear(&mut self) {
        for index in 0..self.tiles.len() {
            let _ = self.replace_content(index, TileContent::PLAIN);
        }
        self.spawn_points.clear();
        self.updating.clear();
        self.refresh();
    }

    /// Generates a fresh map, populates the board with it, and returns it.
    pub fn generate_map(&mut self, params: &GeneratorParams) -> Vec<MapData> {
        self.clear();
        let map = MapGenerator::new(params.clone()).generate(self.size);
        self.populate(&map);
        map
    }

    /// Places generated terrain, the capital, and the border spawn points.
    ///
    /// The capital replaces whatever the map holds at tile `len / 2`, and
    /// every plain ground tile on the outermost ring becomes a spawn point.
    ///
    /// # Panics
    ///
    /// Panics if `map` does not hold exactly one cell per tile.
    pub fn populate(&mut self, map: &[MapData]) {
        assert_eq!(map.len(), self.tiles.len(), "map does not cover the board");
        for (index, cell) in map.iter().enumerate() {
            let content = cell.content().unwrap_or_else(|| {
                warn!(?cell, index, "unknown map cell, placing plain ground");
                TileContent::PLAIN
            });
            let _ = self.replace_content(index, content);
        }

        if !self.tiles.is_empty() {
            let capital = self.tiles.len() / 2;
            let _ = self.replace_content(capital, TileContent::Destination(DestinationKind::Capital));
        }

        let (columns, rows) = (self.size.columns(), self.size.rows());
        for index in 0..self.tiles.len() {
            let coord = self.tiles[index].coord();
            let on_ring = coord.column() == 0
                || coord.row() == 0
                || coord.column() + 1 == columns
                || coord.row() + 1 == rows;
            if on_ring && self.tiles[index].content().content() == TileContent::PLAIN {
                let _ = self.replace_content(index, TileContent::SpawnPoint);
            }
        }

        self.refresh();
        info!(
            columns,
            rows,
            spawn_points = self.spawn_points.len(),
            "board populated"
        );
    }

    /// Constructs a wall, tower, farm, or camp on a plain ground tile.
    ///
    /// # Errors
    ///
    /// Fails without changing the board when the tile is off the board or
    /// occupied, when the content cannot be built, or when the new path field
    /// would strand a spawn point or seal every destination.
    pub fn place_building(
        &mut self,
        tile: TileCoord,
        content: TileContent,
    ) -> Result<(), PlacementError> {
        let index = self.size.index_of(tile).ok_or(PlacementError::OutOfBounds)?;
        if !content.is_buildable() {
            return Err(PlacementError::NotBuildable);
        }
        if self.tiles[index].content().content() != TileContent::PLAIN {
            return Err(PlacementError::Occupied);
        }
        let _ = self
            .commit_edit(index, content)
            .map_err(PlacementError::Path)?;
        debug!(?tile, ?content, "building placed");
        Ok(())
    }

    /// Tears down the content of a tile.
    ///
    /// Bridges collapse back into water; everything else reverts to plain
    /// ground.
    ///
    /// # Errors
    ///
    /// Fails without changing the board when the tile is off the board, holds
    /// plain ground or permanent content, or when removal would leave the
    /// board without a usable destination.
    pub fn demolish(&mut self, tile: TileCoord) -> Result<Demolition, DemolitionError> {
        let index = self
            .size
            .index_of(tile)
            .ok_or(DemolitionError::OutOfBounds)?;
        let current = self.tiles[index].content().content();
        if current == TileContent::PLAIN {
            return Err(DemolitionError::NothingToDemolish);
        }
        if current.is_permanent() {
            return Err(DemolitionError::Permanent);
        }

        let replacement = match current {
            TileContent::Ground(GroundKind::Bridge) => TileContent::Water,
            _ => TileContent::PLAIN,
        };
        let previous = self
            .commit_edit(index, replacement)
            .map_err(DemolitionError::Path)?;
        debug!(?tile, ?previous, "content demolished");
        Ok(Demolition {
            previous,
            replacement,
        })
    }

    /// Spans a one-tile-wide straight water crossing with a bridge.
    ///
    /// # Errors
    ///
    /// Fails when the tile is off the board, is not water, or does not have
    /// water on one axis and land on the other.
    pub fn place_bridge(&mut self, tile: TileCoord) -> Result<(), PlacementError> {
        let index = self.size.index_of(tile).ok_or(PlacementError::OutOfBounds)?;
        if self.tiles[index].content().content() != TileContent::Water || !self.is_crossing(index) {
            return Err(PlacementError::NotBridgeable);
        }
        let _ = self
            .commit_edit(index, TileContent::Ground(GroundKind::Bridge))
            .map_err(PlacementError::Path)?;
        debug!(?tile, "bridge placed");
        Ok(())
    }

    /// Turns plain ground into a spawn point or a spawn point back into
    /// ground, returning whether the tile is a spawn point afterwards.
    ///
    /// # Errors
    ///
    /// Fails when the tile is off the board, holds any other content, or the
    /// board has no destination.
    pub fn toggle_spawn_point(&mut self, tile: TileCoord) -> Result<bool, PlacementError> {
        let index = self.size.index_of(tile).ok_or(PlacementError::OutOfBounds)?;
        let replacement = match self.tiles[index].content().content() {
            TileContent::SpawnPoint => TileContent::PLAIN,
            content if content == TileContent::PLAIN => TileContent::SpawnPoint,
            _ => return Err(PlacementError::Occupied),
        };
        let _ = self
            .commit_edit(index, replacement)
            .map_err(PlacementError::Path)?;
        Ok(replacement == TileContent::SpawnPoint)
    }

    /// Recomputes the path field without validating it.
    ///
    /// Returns whether the hard-terrain fallback ran, or the reason no field
    /// could be grown.
    ///
    /// # Errors
    ///
    /// Fails with [`PathError::NoDestination`] when the board holds no
    /// destination; every tile is left without a path.
    pub fn find_paths(&mut self) -> Result<bool, PathError> {
        self.recompute().map(|report| report.second_search)
    }

    fn refresh(&mut self) {
        if let Err(error) = self.recompute() {
            debug!(%error, "board has no path field");
        }
    }

    fn recompute(&mut self) -> Result<SearchReport, PathError> {
        let result = pathfinding::find_paths(&mut self.tiles, &mut self.frontier);
        self.second_search = result.map_or(false, |report| report.second_search);
        self.adapt_contents();
        result
    }

    fn neighborhood(&self, index: usize) -> Neighborhood {
        let tile = &self.tiles[index];
        Neighbor::ALL.map(|neighbor| {
            tile.neighbor(neighbor)
                .map(|other| self.tiles[other].content().content())
        })
    }

    fn adapt_contents(&mut self) {
        let adaptations: Vec<Adaptation> = (0..self.tiles.len())
            .map(|index| {
                adaptation::adapt(
                    self.tiles[index].content().content(),
                    &self.neighborhood(index),
                )
            })
            .collect();
        for (tile, adaptation) in self.tiles.iter_mut().zip(adaptations) {
            tile.content.adapt(adaptation);
        }
    }

    fn is_crossing(&self, index: usize) -> bool {
        let neighborhood = self.neighborhood(index);
        let water = |neighbor: Neighbor| neighborhood[neighbor.slot()] == Some(TileContent::Water);
        let land = |neighbor: Neighbor| {
            neighborhood[neighbor.slot()].is_some_and(|content| {
                !matches!(
                    content.content_type(),
                    ContentType::Water | ContentType::Mountain
                )
            })
        };
        let east_west = land(Neighbor::East)
            && land(Neighbor::West)
            && water(Neighbor::North)
            && water(Neighbor::South);
        let north_south = land(Neighbor::North)
            && land(Neighbor::South)
            && water(Neighbor::East)
            && water(Neighbor::West);
        east_west || north_south
    }

    /// Swaps the content of a tile, returning the replaced content to the
    /// factory and keeping the spawn point and updating lists in sync.
    fn replace_content(&mut self, index: usize, content: TileContent) -> TileContent {
        let fresh = self.factory.get(content);
        let old = std::mem::replace(&mut self.tiles[index].content, fresh);
        let previous = old.content();
        self.factory.reclaim(old);

        let coord = self.tiles[index].coord();
        if previous == TileContent::SpawnPoint {
            self.spawn_points.retain(|point| *point != coord);
        }
        if matches!(previous, TileContent::Tower(_)) {
            self.updating.retain(|point| *point != coord);
        }
        if content == TileContent::SpawnPoint {
            self.spawn_points.push(coord);
        }
        if matches!(content, TileContent::Tower(_)) {
            self.updating.push(coord);
        }
        previous
    }

    /// Applies a tentative edit and keeps it only if the new path field is
    /// acceptable; otherwise restores the previous content and field.
    fn commit_edit(&mut self, index: usize, content: TileContent) -> Result<TileContent, PathError> {
        let connected: Vec<usize> = self
            .spawn_points
            .iter()
            .filter_map(|point| self.size.index_of(*point))
            .filter(|&spawn| self.tiles[spawn].reached_directly())
            .collect();

        let previous = self.replace_content(index, content);
        let outcome = self
            .recompute()
            .and_then(|_| self.validate(&connected));
        if let Err(error) = outcome {
            let _ = self.replace_content(index, previous);
            self.refresh();
            debug!(tile = ?self.tiles[index].coord(), %error, "edit rolled back");
            return Err(error);
        }
        Ok(previous)
    }

    fn validate(&self, connected: &[usize]) -> Result<(), PathError> {
        for &index in connected {
            let tile = &self.tiles[index];
            if tile.content().content() == TileContent::SpawnPoint && !tile.reached_directly() {
                return Err(PathError::SpawnPointCutOff(tile.coord()));
            }
        }

        let mut walkable = self
            .tiles
            .iter()
            .filter(|tile| {
                let content = tile.content().content();
                is_walkable(content) && !content.is_destination()
            })
            .peekable();
        if walkable.peek().is_some() && !walkable.any(Tile::reached_directly) {
            return Err(PathError::DestinationSealed);
        }
        Ok(())
    }
}

fn same_members(current: &[TileCoord], recorded: &[TileCoord]) -> bool {
    let mut current = current.to_vec();
    let mut recorded = recorded.to_vec();
    current.sort_unstable();
    recorded.sort_unstable();
    current == recorded
}

/// Applies a board edit command, reporting the outcome through events.
///
/// Commands that do not edit the board are ignored.
pub fn apply(board: &mut Board, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceBuilding { tile, content } => match board.place_building(tile, content) {
            Ok(()) => {
                out_events.push(Event::BuildingPlaced { tile, content });
                out_events.push(Event::PathsRecomputed {
                    second_search: board.second_search,
                });
            }
            Err(reason) => out_events.push(Event::PlacementRejected {
                tile,
                content,
                reason,
            }),
        },
        Command::PlaceBridge { tile } => match board.place_bridge(tile) {
            Ok(()) => {
                out_events.push(Event::BridgePlaced { tile });
                out_events.push(Event::PathsRecomputed {
                    second_search: board.second_search,
                });
            }
            Err(reason) => out_events.push(Event::PlacementRejected {
                tile,
                content: TileContent::Ground(GroundKind::Bridge),
                reason,
            }),
        },
        Command::Demolish { tile } => match board.demolish(tile) {
            Ok(Demolition {
                previous,
                replacement,
            }) => {
                out_events.push(Event::Demolished {
                    tile,
                    previous,
                    replacement,
                });
                out_events.push(Event::PathsRecomputed {
                    second_search: board.second_search,
                });
            }
            Err(reason) => out_events.push(Event::DemolitionRejected { tile, reason }),
        },
        Command::ToggleSpawnPoint { tile } => match board.toggle_spawn_point(tile) {
            Ok(active) => out_events.push(Event::SpawnPointToggled { tile, active }),
            Err(reason) => out_events.push(Event::PlacementRejected {
                tile,
                content: TileContent::SpawnPoint,
                reason,
            }),
        },
        Command::Tick { .. } | Command::SetGameSpeed { .. } | Command::SpawnEnemy { .. } => {}
    }
}

/// Query functions that provide read-only access to the board.
pub mod query {
    use glam::Vec2;
    use tile_defence_core::{BoardSize, Direction, Stock, TileContent, TileCoord};

    use super::{Adaptation, Board, Tile};

    /// Dimensions of the board.
    #[must_use]
    pub fn size(board: &Board) -> BoardSize {
        board.size
    }

    /// Every tile in row-major order.
    #[must_use]
    pub fn tiles(board: &Board) -> &[Tile] {
        &board.tiles
    }

    /// Tile at the provided coordinate.
    #[must_use]
    pub fn tile(board: &Board, coord: TileCoord) -> Option<&Tile> {
        board
            .size
            .index_of(coord)
            .and_then(|index| board.tiles.get(index))
    }

    /// Content placed at the provided coordinate.
    #[must_use]
    pub fn content(board: &Board, coord: TileCoord) -> Option<TileContent> {
        tile(board, coord).map(|tile| tile.content().content())
    }

    /// Contents of every tile in row-major order.
    pub fn contents(board: &Board) -> impl Iterator<Item = TileContent> + '_ {
        board.tiles.iter().map(|tile| tile.content().content())
    }

    /// Tile under a board-space point, as picked by an external ray cast.
    #[must_use]
    pub fn tile_at_point(board: &Board, point: Vec2) -> Option<TileCoord> {
        board.size.tile_at_point(point)
    }

    /// Spawn points in the order they were added.
    #[must_use]
    pub fn spawn_points(board: &Board) -> &[TileCoord] {
        &board.spawn_points
    }

    /// Tiles whose content needs a per-tick update, in placement order.
    #[must_use]
    pub fn updating_tiles(board: &Board) -> &[TileCoord] {
        &board.updating
    }

    /// Whether the last recomputation needed the hard-terrain fallback.
    #[must_use]
    pub fn second_search(board: &Board) -> bool {
        board.second_search
    }

    /// Number of content instances built since the board was created.
    #[must_use]
    pub fn contents_created(board: &Board) -> u64 {
        board.factory.created()
    }

    /// Step a walker standing on `coord` takes next.
    #[must_use]
    pub fn path_step(board: &Board, coord: TileCoord) -> Option<PathStep> {
        let tile = tile(board, coord)?;
        let next = board.tiles.get(tile.next_on_path()?)?;
        Some(PathStep {
            next: next.coord(),
            direction: tile.path_direction(),
            exit_point: tile.exit_point(),
        })
    }

    /// Tiles visited when following the path from `coord` to its
    /// destination, starting with `coord` itself.
    ///
    /// The walk stops after visiting every tile once, so a corrupted field
    /// can never loop forever.
    #[must_use]
    pub fn path_from(board: &Board, coord: TileCoord) -> Vec<TileCoord> {
        let mut route = Vec::new();
        let Some(mut index) = board.size.index_of(coord) else {
            return route;
        };
        for _ in 0..board.tiles.len() {
            let tile = &board.tiles[index];
            route.push(tile.coord());
            match tile.next_on_path() {
                Some(next) => index = next,
                None => break,
            }
        }
        route
    }

    /// Stocks gathered by every destination, with the contributing count.
    #[must_use]
    pub fn gathering(board: &Board) -> Vec<(TileCoord, Stock, u32)> {
        board
            .tiles
            .iter()
            .filter_map(|tile| match tile.content().adaptation() {
                Adaptation::Gathering { stock, count } => Some((tile.coord(), stock, count)),
                _ => None,
            })
            .collect()
    }

    /// Next tile, heading, and exit point of a walker's current tile.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct PathStep {
        /// Tile the walker moves onto.
        pub next: TileCoord,
        /// Heading taken when leaving the current tile.
        pub direction: Direction,
        /// Point on the current tile's edge where the walker leaves it.
        pub exit_point: Vec2,
    }
}
