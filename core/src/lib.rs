#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tile Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative board, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the board and the game context execute those
//! commands via their `apply` entry points, and then broadcast [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Tile Defence.";

/// Sentinel distance carried by tiles that have no path to a destination.
pub const INFINITE_DISTANCE: u32 = u32::MAX;

/// Simulation speed selected by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameSpeed {
    /// Entities are frozen while board edits remain available.
    Paused,
    /// Entities advance at real time.
    Playing,
    /// Entities advance at twice the real time.
    Fast,
}

impl GameSpeed {
    /// Multiplier applied to elapsed time before entities consume it.
    #[must_use]
    pub const fn time_scale(self) -> f32 {
        match self {
            Self::Paused => 0.0,
            Self::Playing => 1.0,
            Self::Fast => 2.0,
        }
    }
}

/// Commands that express all permissible board and simulation mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the simulation switch to the provided speed.
    SetGameSpeed {
        /// Speed the simulation should adopt.
        speed: GameSpeed,
    },
    /// Requests construction of a building on a plain ground tile.
    PlaceBuilding {
        /// Tile receiving the building.
        tile: TileCoord,
        /// Content to construct.
        content: TileContent,
    },
    /// Requests that a straight water crossing be turned into a bridge.
    PlaceBridge {
        /// Water tile that should carry the bridge.
        tile: TileCoord,
    },
    /// Requests that the content of a tile be torn down.
    Demolish {
        /// Tile whose content should be removed.
        tile: TileCoord,
    },
    /// Toggles a plain ground tile into a spawn point and back.
    ToggleSpawnPoint {
        /// Tile that should gain or lose its spawn point.
        tile: TileCoord,
    },
    /// Requests that an enemy enter the board on the provided spawn point.
    SpawnEnemy {
        /// Spawn point the enemy emerges from.
        spawn_point: TileCoord,
        /// Kind of enemy to spawn.
        kind: EnemyKind,
        /// Appearance assigned to the enemy.
        tint: Tint,
    },
}

/// Events broadcast after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the simulation adopted a new speed.
    GameSpeedChanged {
        /// Speed that became active.
        speed: GameSpeed,
    },
    /// Confirms that a building was constructed.
    BuildingPlaced {
        /// Tile that received the building.
        tile: TileCoord,
        /// Content that now occupies the tile.
        content: TileContent,
    },
    /// Reports that a construction request was rejected and rolled back.
    PlacementRejected {
        /// Tile targeted by the request.
        tile: TileCoord,
        /// Content requested for construction.
        content: TileContent,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a bridge now spans a water tile.
    BridgePlaced {
        /// Tile carrying the bridge.
        tile: TileCoord,
    },
    /// Confirms that the content of a tile was torn down.
    Demolished {
        /// Tile that was cleared.
        tile: TileCoord,
        /// Content that occupied the tile before demolition.
        previous: TileContent,
        /// Content the tile reverted to.
        replacement: TileContent,
    },
    /// Reports that a demolition request was rejected and rolled back.
    DemolitionRejected {
        /// Tile targeted by the request.
        tile: TileCoord,
        /// Specific reason the demolition failed.
        reason: DemolitionError,
    },
    /// Confirms that a spawn point was added or removed.
    SpawnPointToggled {
        /// Tile whose spawn point changed.
        tile: TileCoord,
        /// Whether the tile is a spawn point after the toggle.
        active: bool,
    },
    /// Announces that the path field was rebuilt after an edit.
    PathsRecomputed {
        /// Whether the hard-terrain fallback search had to run.
        second_search: bool,
    },
    /// Confirms that an enemy entered the board.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        entity: EntityId,
        /// Kind of enemy that spawned.
        kind: EnemyKind,
        /// Spawn point the enemy emerged from.
        tile: TileCoord,
    },
    /// Reports that a spawn request could not be honoured.
    SpawnRejected {
        /// Spawn point named in the request.
        spawn_point: TileCoord,
    },
    /// Reports that an enemy walked into a destination.
    EnemyReachedDestination {
        /// Identifier of the enemy.
        entity: EntityId,
    },
    /// Reports that an enemy ran out of health.
    EnemyKilled {
        /// Identifier of the enemy.
        entity: EntityId,
        /// Kind of the enemy that died.
        kind: EnemyKind,
    },
    /// Announces that the scenario released the first enemy of a wave.
    WaveStarted {
        /// Zero-based pass through the scenario's waves.
        cycle: u32,
        /// Zero-based wave within the cycle.
        wave: u32,
    },
    /// Reports that the scenario is over and its last enemy left the board.
    ScenarioCompleted,
}

/// Visual tint applied to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tint {
    red: u8,
    green: u8,
    blue: u8,
}

impl Tint {
    /// Tint used when no explicit appearance was requested.
    pub const NEUTRAL: Tint = Tint::from_rgb(0xff, 0xff, 0xff);

    /// Creates a new tint from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the tint.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the tint.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the tint.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Cardinal directions used by the path field and by moving entities.
///
/// North points toward increasing row indices so that the board's world-space
/// layout keeps row zero at the bottom edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward increasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward decreasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Clockwise index of the direction, north being zero.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Resolves a direction from its clockwise index.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::North),
            1 => Some(Self::East),
            2 => Some(Self::South),
            3 => Some(Self::West),
            _ => None,
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Column and row delta of a single step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }

    /// Heading of the direction in degrees, clockwise from north.
    #[must_use]
    pub fn angle(self) -> f32 {
        f32::from(self.index()) * 90.0
    }

    /// Vector from a tile centre to the middle of the edge faced by the direction.
    #[must_use]
    pub fn half_vector(self) -> Vec2 {
        let (column, row) = self.offset();
        Vec2::new(column as f32, row as f32) * 0.5
    }

    /// Classifies the turn required to go from this direction to `next`.
    #[must_use]
    pub fn change_to(self, next: Direction) -> DirectionChange {
        let delta = (next.index() + 4 - self.index()) % 4;
        match delta {
            0 => DirectionChange::None,
            1 => DirectionChange::TurnRight,
            3 => DirectionChange::TurnLeft,
            _ => DirectionChange::TurnAround,
        }
    }
}

/// Turn an entity performs when its heading changes between two tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectionChange {
    /// Heading is unchanged.
    None,
    /// Heading rotates a quarter turn clockwise.
    TurnRight,
    /// Heading rotates a quarter turn counter-clockwise.
    TurnLeft,
    /// Heading flips to the opposite direction.
    TurnAround,
}

/// One of the eight neighbours surrounding a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Neighbor {
    /// Tile above.
    North,
    /// Tile above and to the right.
    NorthEast,
    /// Tile to the right.
    East,
    /// Tile below and to the right.
    SouthEast,
    /// Tile below.
    South,
    /// Tile below and to the left.
    SouthWest,
    /// Tile to the left.
    West,
    /// Tile above and to the left.
    NorthWest,
}

impl Neighbor {
    /// All neighbours in clockwise order starting at north.
    pub const ALL: [Neighbor; 8] = [
        Neighbor::North,
        Neighbor::NorthEast,
        Neighbor::East,
        Neighbor::SouthEast,
        Neighbor::South,
        Neighbor::SouthWest,
        Neighbor::West,
        Neighbor::NorthWest,
    ];

    /// Clockwise slot of the neighbour, north being zero.
    #[must_use]
    pub const fn slot(self) -> usize {
        match self {
            Self::North => 0,
            Self::NorthEast => 1,
            Self::East => 2,
            Self::SouthEast => 3,
            Self::South => 4,
            Self::SouthWest => 5,
            Self::West => 6,
            Self::NorthWest => 7,
        }
    }

    /// Bit representing the neighbour inside an eight-bit adjacency mask.
    #[must_use]
    pub const fn bit(self) -> u8 {
        1 << self.slot()
    }

    /// Column and row delta from the centre tile to the neighbour.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::NorthEast => (1, 1),
            Self::East => (1, 0),
            Self::SouthEast => (1, -1),
            Self::South => (0, -1),
            Self::SouthWest => (-1, -1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, 1),
        }
    }

    /// Neighbour that lies along the provided cardinal direction.
    #[must_use]
    pub const fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::North => Self::North,
            Direction::East => Self::East,
            Direction::South => Self::South,
            Direction::West => Self::West,
        }
    }
}

/// Location of a single tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Coordinate displaced by the provided column and row delta, if non-negative.
    #[must_use]
    pub fn offset_by(self, column_delta: i32, row_delta: i32) -> Option<TileCoord> {
        let column = self.column.checked_add_signed(column_delta)?;
        let row = self.row.checked_add_signed(row_delta)?;
        Some(TileCoord::new(column, row))
    }
}

/// Dimensions of the board measured in whole tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardSize {
    columns: u32,
    rows: u32,
}

impl BoardSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of tiles on the board.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        let columns = usize::try_from(self.columns).unwrap_or(0);
        let rows = usize::try_from(self.rows).unwrap_or(0);
        columns.saturating_mul(rows)
    }

    /// Reports whether the coordinate lies on the board.
    #[must_use]
    pub const fn contains(&self, tile: TileCoord) -> bool {
        tile.column() < self.columns && tile.row() < self.rows
    }

    /// Row-major index of the coordinate, if it lies on the board.
    #[must_use]
    pub fn index_of(&self, tile: TileCoord) -> Option<usize> {
        if !self.contains(tile) {
            return None;
        }
        let column = usize::try_from(tile.column()).ok()?;
        let row = usize::try_from(tile.row()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Coordinate stored at the provided row-major index.
    #[must_use]
    pub fn coord_of(&self, index: usize) -> Option<TileCoord> {
        if index >= self.tile_count() {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(TileCoord::new(column, row))
    }

    /// Board-space centre of the tile; the board itself is centred on the origin.
    #[must_use]
    pub fn center_of(&self, tile: TileCoord) -> Vec2 {
        let offset = Vec2::new(
            (self.columns as f32 - 1.0) * 0.5,
            (self.rows as f32 - 1.0) * 0.5,
        );
        Vec2::new(tile.column() as f32, tile.row() as f32) - offset
    }

    /// Tile containing the provided board-space point.
    #[must_use]
    pub fn tile_at_point(&self, point: Vec2) -> Option<TileCoord> {
        let column = (point.x + self.columns as f32 * 0.5).floor();
        let row = (point.y + self.rows as f32 * 0.5).floor();
        if column < 0.0 || row < 0.0 {
            return None;
        }
        let tile = TileCoord::new(column as u32, row as u32);
        self.contains(tile).then_some(tile)
    }
}

/// Discriminant of the content stored on a tile.
///
/// The numeric identifiers are persisted in save files and must never be
/// reassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentType {
    /// Walkable terrain.
    Ground,
    /// Impassable water.
    Water,
    /// Impassable mountain.
    Mountain,
    /// Walkable resource deposit.
    Resource,
    /// Player-built obstacle.
    Wall,
    /// Path root enemies walk toward.
    Destination,
    /// Tile enemies enter the board from.
    SpawnPoint,
    /// Player-built attacking structure.
    Tower,
}

impl ContentType {
    /// All content types in identifier order.
    pub const ALL: [ContentType; 8] = [
        ContentType::Ground,
        ContentType::Water,
        ContentType::Mountain,
        ContentType::Resource,
        ContentType::Wall,
        ContentType::Destination,
        ContentType::SpawnPoint,
        ContentType::Tower,
    ];

    /// Stable numeric identifier of the content type.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Ground => 0,
            Self::Water => 1,
            Self::Mountain => 2,
            Self::Resource => 3,
            Self::Wall => 4,
            Self::Destination => 5,
            Self::SpawnPoint => 6,
            Self::Tower => 7,
        }
    }

    /// Resolves a content type from its numeric identifier.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Ground),
            1 => Some(Self::Water),
            2 => Some(Self::Mountain),
            3 => Some(Self::Resource),
            4 => Some(Self::Wall),
            5 => Some(Self::Destination),
            6 => Some(Self::SpawnPoint),
            7 => Some(Self::Tower),
            _ => None,
        }
    }
}

/// Flavours of walkable ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroundKind {
    /// Open terrain available for construction.
    Plain,
    /// Walkable crossing built over water.
    Bridge,
}

/// Flavours of resource deposits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Trees growing near water.
    Forest,
    /// Ore veins growing near mountains.
    Metal,
    /// Crystals found away from water and mountains.
    Crystal,
}

impl ResourceKind {
    /// Stock yielded when the deposit is harvested.
    #[must_use]
    pub const fn stock(self) -> Stock {
        match self {
            Self::Forest => Stock::Wood,
            Self::Metal => Stock::Metal,
            Self::Crystal => Stock::Crystal,
        }
    }
}

/// Flavours of destinations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestinationKind {
    /// Win-condition destination that can never be demolished.
    Capital,
    /// Gathers food from surrounding ground.
    Farm,
    /// Gathers whichever raw material dominates its surroundings.
    Camp,
}

/// Types of towers that can be constructed on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Continuous beam dealing damage per second to a tracked target.
    Laser,
    /// Launches projectiles that deal blast damage on impact.
    Archer,
}

impl TowerKind {
    /// Returns the tower's targeting range measured in tiles.
    #[must_use]
    pub const fn range_in_tiles(self) -> f32 {
        match self {
            Self::Laser => 2.5,
            Self::Archer => 3.5,
        }
    }
}

/// Types of enemies that walk the path field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Fast, fragile enemy.
    Small,
    /// Balanced enemy.
    Medium,
    /// Slow, resilient enemy.
    Large,
}

impl EnemyKind {
    /// All enemy kinds in identifier order.
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Small, EnemyKind::Medium, EnemyKind::Large];

    /// Stable numeric identifier of the enemy kind.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Small => 0,
            Self::Medium => 1,
            Self::Large => 2,
        }
    }

    /// Resolves an enemy kind from its numeric identifier.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Small),
            1 => Some(Self::Medium),
            2 => Some(Self::Large),
            _ => None,
        }
    }
}

/// Payload held by a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileContent {
    /// Walkable terrain.
    Ground(GroundKind),
    /// Impassable water.
    Water,
    /// Impassable mountain.
    Mountain,
    /// Walkable resource deposit.
    Resource(ResourceKind),
    /// Player-built obstacle.
    Wall,
    /// Path root.
    Destination(DestinationKind),
    /// Enemy entry tile.
    SpawnPoint,
    /// Attacking structure.
    Tower(TowerKind),
}

impl TileContent {
    /// Plain ground, the content every tile starts with.
    pub const PLAIN: TileContent = TileContent::Ground(GroundKind::Plain);

    /// Discriminant of the content.
    #[must_use]
    pub const fn content_type(self) -> ContentType {
        match self {
            Self::Ground(_) => ContentType::Ground,
            Self::Water => ContentType::Water,
            Self::Mountain => ContentType::Mountain,
            Self::Resource(_) => ContentType::Resource,
            Self::Wall => ContentType::Wall,
            Self::Destination(_) => ContentType::Destination,
            Self::SpawnPoint => ContentType::SpawnPoint,
            Self::Tower(_) => ContentType::Tower,
        }
    }

    /// Sub-index distinguishing flavours within one content type.
    #[must_use]
    pub const fn variation(self) -> u8 {
        match self {
            Self::Ground(kind) => match kind {
                GroundKind::Plain => 0,
                GroundKind::Bridge => 1,
            },
            Self::Resource(kind) => match kind {
                ResourceKind::Forest => 0,
                ResourceKind::Metal => 1,
                ResourceKind::Crystal => 2,
            },
            Self::Destination(kind) => match kind {
                DestinationKind::Capital => 0,
                DestinationKind::Farm => 1,
                DestinationKind::Camp => 2,
            },
            Self::Tower(kind) => match kind {
                TowerKind::Laser => 0,
                TowerKind::Archer => 1,
            },
            Self::Water | Self::Mountain | Self::Wall | Self::SpawnPoint => 0,
        }
    }

    /// Rebuilds content from its persisted type and variation.
    #[must_use]
    pub const fn from_parts(content_type: ContentType, variation: u8) -> Option<Self> {
        let content = match (content_type, variation) {
            (ContentType::Ground, 0) => Self::Ground(GroundKind::Plain),
            (ContentType::Ground, 1) => Self::Ground(GroundKind::Bridge),
            (ContentType::Water, 0) => Self::Water,
            (ContentType::Mountain, 0) => Self::Mountain,
            (ContentType::Resource, 0) => Self::Resource(ResourceKind::Forest),
            (ContentType::Resource, 1) => Self::Resource(ResourceKind::Metal),
            (ContentType::Resource, 2) => Self::Resource(ResourceKind::Crystal),
            (ContentType::Wall, 0) => Self::Wall,
            (ContentType::Destination, 0) => Self::Destination(DestinationKind::Capital),
            (ContentType::Destination, 1) => Self::Destination(DestinationKind::Farm),
            (ContentType::Destination, 2) => Self::Destination(DestinationKind::Camp),
            (ContentType::SpawnPoint, 0) => Self::SpawnPoint,
            (ContentType::Tower, 0) => Self::Tower(TowerKind::Laser),
            (ContentType::Tower, 1) => Self::Tower(TowerKind::Archer),
            _ => return None,
        };
        Some(content)
    }

    /// Whether enemies are unable to walk across the content.
    #[must_use]
    pub const fn blocks_path(self) -> bool {
        matches!(
            self,
            Self::Wall | Self::Tower(_) | Self::Water | Self::Mountain
        )
    }

    /// Whether the content is a player-built obstacle the fallback search may cross.
    #[must_use]
    pub const fn is_hard_terrain(self) -> bool {
        matches!(self, Self::Wall | Self::Tower(_))
    }

    /// Whether the content can never be demolished.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(
            self,
            Self::Water | Self::Mountain | Self::Destination(DestinationKind::Capital)
        )
    }

    /// Whether the content is a path root.
    #[must_use]
    pub const fn is_destination(self) -> bool {
        matches!(self, Self::Destination(_))
    }

    /// Whether the player may construct the content on plain ground.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        matches!(
            self,
            Self::Wall
                | Self::Tower(_)
                | Self::Destination(DestinationKind::Farm)
                | Self::Destination(DestinationKind::Camp)
        )
    }
}

/// Type and variation of a single generated cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapData {
    /// Discriminant of the generated content.
    pub content_type: ContentType,
    /// Sub-index of the generated content.
    pub variation: u8,
}

impl MapData {
    /// Creates a map cell from its type and variation.
    #[must_use]
    pub const fn new(content_type: ContentType, variation: u8) -> Self {
        Self {
            content_type,
            variation,
        }
    }

    /// Map cell describing the provided content.
    #[must_use]
    pub const fn of(content: TileContent) -> Self {
        Self::new(content.content_type(), content.variation())
    }

    /// Content described by the cell, if the pair is known.
    #[must_use]
    pub const fn content(self) -> Option<TileContent> {
        TileContent::from_parts(self.content_type, self.variation)
    }
}

/// Tuning knobs consumed by the procedural map generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorParams {
    /// Seed driving every random decision of the generator.
    pub seed: u64,
    /// Chance, in percent, of an interior cell starting out as ground.
    pub ground_fill_percent: u32,
    /// Chance, in percent, of ground on the far edge becoming mountain.
    pub mountain_fill_percent: u32,
    /// Chance, in percent, of ground on the far edge becoming a resource.
    pub resource_fill_percent: u32,
    /// Terrain smoothing iterations.
    pub iterations: u32,
    /// Mountain smoothing iterations.
    pub mountain_iterations: u32,
    /// Resource smoothing iterations.
    pub resource_iterations: u32,
    /// Water neighbour count separating water from ground.
    pub water_count_threshold: u32,
    /// Mountain neighbour count separating mountain from ground.
    pub mountain_count_threshold: u32,
    /// Water-or-resource neighbour count separating resources from ground.
    pub resource_count_threshold: u32,
    /// Radius around a cell that must be free of water for mountains to grow.
    pub mountain_distance_to_water: u32,
    /// Regions smaller than this many cells are merged into their surroundings.
    pub region_threshold: usize,
    /// Width of the ground padding wrapped around the generated interior.
    pub border_size: u32,
    /// Whether smoothing reads from a snapshot of the previous iteration.
    pub use_backlog: bool,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            seed: 0,
            ground_fill_percent: 60,
            mountain_fill_percent: 30,
            resource_fill_percent: 25,
            iterations: 5,
            mountain_iterations: 3,
            resource_iterations: 2,
            water_count_threshold: 4,
            mountain_count_threshold: 4,
            resource_count_threshold: 4,
            mountain_distance_to_water: 2,
            region_threshold: 50,
            border_size: 2,
            use_backlog: true,
        }
    }
}

/// Raw materials tracked by the wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stock {
    /// Grown on farms and gathered near water.
    Food,
    /// Gathered from forests.
    Wood,
    /// Gathered from ore veins.
    Metal,
    /// Gathered from crystal deposits.
    Crystal,
    /// Earned by defeating enemies.
    Gold,
}

impl Stock {
    /// All stocks in wallet order.
    pub const ALL: [Stock; 5] = [
        Stock::Food,
        Stock::Wood,
        Stock::Metal,
        Stock::Crystal,
        Stock::Gold,
    ];

    /// Position of the stock inside wallet arrays.
    #[must_use]
    pub const fn slot(self) -> usize {
        match self {
            Self::Food => 0,
            Self::Wood => 1,
            Self::Metal => 2,
            Self::Crystal => 3,
            Self::Gold => 4,
        }
    }
}

/// Unique identifier assigned to a pooled entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of the factory an instance originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactoryId(u32);

impl FactoryId {
    /// Creates a new factory identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Reasons a path recomputation refused to accept the current board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PathError {
    /// The board holds no destination to grow paths from.
    #[error("the board has no destination")]
    NoDestination,
    /// A spawn point that used to reach a destination no longer does.
    #[error("spawn point {0:?} would lose its path")]
    SpawnPointCutOff(TileCoord),
    /// Walkable tiles exist but every destination is sealed off from them.
    #[error("every destination would be sealed off")]
    DestinationSealed,
}

/// Reasons a construction request may be rejected by the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The requested tile lies beyond the board.
    #[error("tile lies outside the board")]
    OutOfBounds,
    /// The requested content cannot be built by the player.
    #[error("content cannot be built")]
    NotBuildable,
    /// The tile does not hold plain ground.
    #[error("tile is occupied")]
    Occupied,
    /// The tile is not a water tile spanning a straight crossing.
    #[error("tile cannot carry a bridge")]
    NotBridgeable,
    /// The edit would break the path field and was rolled back.
    #[error("placement rejected: {0}")]
    Path(PathError),
    /// The wallet cannot cover the construction cost.
    #[error("insufficient resources")]
    InsufficientFunds,
}

/// Reasons a demolition request may be rejected by the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum DemolitionError {
    /// The requested tile lies beyond the board.
    #[error("tile lies outside the board")]
    OutOfBounds,
    /// The tile holds plain ground, so there is nothing to remove.
    #[error("nothing to demolish")]
    NothingToDemolish,
    /// The tile holds water, mountain, or the capital.
    #[error("content is permanent")]
    Permanent,
    /// The edit would break the path field and was rolled back.
    #[error("demolition rejected: {0}")]
    Path(PathError),
}

#[cfg(test)]
mod tests {
    use super::{
        BoardSize, ContentType, DemolitionError, Direction, DirectionChange, EnemyKind,
        GeneratorParams, MapData, Neighbor, PathError, PlacementError, TileContent, TileCoord,
    };
    use glam::Vec2;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = TileCoord::new(1, 1);
        let destination = TileCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn tile_content_round_trips_through_bincode() {
        assert_round_trip(&TileContent::PLAIN);
        assert_round_trip(&TileContent::Tower(super::TowerKind::Archer));
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::Path(PathError::SpawnPointCutOff(
            TileCoord::new(3, 0),
        )));
    }

    #[test]
    fn demolition_error_round_trips_through_bincode() {
        assert_round_trip(&DemolitionError::Permanent);
    }

    #[test]
    fn content_parts_are_inverse_of_from_parts() {
        for content_type in ContentType::ALL {
            for variation in 0..4 {
                if let Some(content) = TileContent::from_parts(content_type, variation) {
                    assert_eq!(content.content_type(), content_type);
                    assert_eq!(content.variation(), variation);
                    assert_eq!(MapData::of(content).content(), Some(content));
                }
            }
        }
        assert_eq!(TileContent::from_parts(ContentType::Wall, 1), None);
    }

    #[test]
    fn content_type_ids_are_stable() {
        for content_type in ContentType::ALL {
            assert_eq!(ContentType::from_id(content_type.id()), Some(content_type));
        }
        assert_eq!(ContentType::from_id(8), None);
        for kind in EnemyKind::ALL {
            assert_eq!(EnemyKind::from_id(kind.id()), Some(kind));
        }
    }

    #[test]
    fn blocking_predicates_follow_content_type() {
        assert!(TileContent::Water.blocks_path());
        assert!(TileContent::Mountain.blocks_path());
        assert!(TileContent::Wall.is_hard_terrain());
        assert!(!TileContent::Water.is_hard_terrain());
        assert!(!TileContent::SpawnPoint.blocks_path());
        assert!(!TileContent::Resource(super::ResourceKind::Forest).blocks_path());
        assert!(TileContent::Destination(super::DestinationKind::Capital).is_permanent());
        assert!(!TileContent::Destination(super::DestinationKind::Farm).is_permanent());
    }

    #[test]
    fn direction_changes_cover_every_turn() {
        assert_eq!(
            Direction::North.change_to(Direction::North),
            DirectionChange::None
        );
        assert_eq!(
            Direction::North.change_to(Direction::East),
            DirectionChange::TurnRight
        );
        assert_eq!(
            Direction::North.change_to(Direction::West),
            DirectionChange::TurnLeft
        );
        assert_eq!(
            Direction::West.change_to(Direction::North),
            DirectionChange::TurnRight
        );
        assert_eq!(
            Direction::East.change_to(Direction::West),
            DirectionChange::TurnAround
        );
    }

    #[test]
    fn half_vectors_point_at_tile_edges() {
        assert_eq!(Direction::North.half_vector(), Vec2::new(0.0, 0.5));
        assert_eq!(Direction::West.half_vector(), Vec2::new(-0.5, 0.0));
        assert!((Direction::South.angle() - 180.0).abs() < f32::EPSILON);
    }

    #[test]
    fn neighbor_bits_are_unique() {
        let combined = Neighbor::ALL
            .iter()
            .fold(0u8, |mask, neighbor| mask | neighbor.bit());
        assert_eq!(combined, u8::MAX);
    }

    #[test]
    fn board_size_maps_points_to_tiles() {
        let size = BoardSize::new(5, 4);
        let tile = TileCoord::new(3, 1);
        let centre = size.center_of(tile);
        assert_eq!(size.tile_at_point(centre), Some(tile));
        assert_eq!(size.tile_at_point(Vec2::new(-10.0, 0.0)), None);
        assert_eq!(size.index_of(tile), Some(8));
        assert_eq!(size.coord_of(8), Some(tile));
        assert_eq!(size.index_of(TileCoord::new(5, 0)), None);
    }

    #[test]
    fn generator_params_fill_missing_fields_from_defaults() {
        let params: GeneratorParams = toml::from_str("seed = 7\niterations = 2\n").expect("parse");
        assert_eq!(params.seed, 7);
        assert_eq!(params.iterations, 2);
        assert_eq!(params.region_threshold, GeneratorParams::default().region_threshold);
    }
}
