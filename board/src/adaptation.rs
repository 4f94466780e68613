//! Cosmetic and economic reactions of tile content to its neighbourhood.
//!
//! Adaptations never influence pathfinding; they are recomputed for every
//! tile after each path search so renderers and the economy can read a
//! settled view of the board.

use tile_defence_core::{ContentType, DestinationKind, Neighbor, ResourceKind, Stock, TileContent};
use tracing::warn;

/// Mesh family selected for water and mountain tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerrainShape {
    /// Surrounded on all eight sides.
    Filled,
    /// Straight channel running north to south.
    Straight,
    /// Bend joining north and west.
    Bend,
    /// Junction of north, east, and west.
    Junction,
    /// Four-way crossing without corners.
    Crossing,
    /// Open bend joining south and west.
    OpenBend,
    /// Shore with land on the east side.
    Shore,
    /// Filled bend joining north and west.
    FilledBend,
    /// Shore with a missing south-east and south-west corner.
    Peninsula,
    /// Filled except for the south-east corner.
    InnerCorner,
    /// Junction with its north-east corner filled.
    FilledJunction,
    /// Junction with its north-west corner filled.
    HalfJunction,
    /// Fallback for neighbourhoods without a dedicated shape.
    Default,
}

/// Result of adapting a tile's content to its neighbours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Adaptation {
    /// Content that does not react to its surroundings.
    None,
    /// Terrain mesh and clockwise quarter turns applied to it.
    Terrain {
        /// Selected mesh family.
        shape: TerrainShape,
        /// Quarter turns applied to the base orientation.
        quarter_turns: u8,
    },
    /// Wall segments joining neighbouring walls.
    Wall {
        /// Neighbour bits of adjacent walls.
        connections: u8,
    },
    /// Bridge deck orientation.
    Bridge {
        /// Whether the deck is rotated to span water to the north.
        rotated: bool,
    },
    /// Stock gathered by a destination from its surroundings.
    Gathering {
        /// Stock the destination produces.
        stock: Stock,
        /// Number of neighbours contributing to the income.
        count: u32,
    },
}

const N: u8 = 1;
const NE: u8 = 2;
const E: u8 = 4;
const SE: u8 = 8;
const S: u8 = 16;
const SW: u8 = 32;
const W: u8 = 64;
const NW: u8 = 128;

/// Neighbourhood masks accepted by each shape in its base orientation.
const SHAPES: [(TerrainShape, &[u8]); 12] = [
    (TerrainShape::Filled, &[0xff]),
    (
        TerrainShape::Straight,
        &[
            N | S,
            N | NE | S,
            N | SE | S,
            N | S | SW,
            N | NW | S,
            N | NE | S | SE,
            N | NE | S | SW,
            N | NE | S | NW,
            N | SE | S | SW,
            N | SE | S | NW,
            N | SW | S | NW,
            N | NE | S | SE | SW,
            N | NE | S | SE | NW,
            N | NE | S | SW | NW,
        ],
    ),
    (
        TerrainShape::Bend,
        &[N | W, N | NE | W, N | W | SW, N | NE | W | SW],
    ),
    (
        TerrainShape::Junction,
        &[N | E | W, N | E | SE | W, N | E | W | SW, N | E | SE | W | SW],
    ),
    (TerrainShape::Crossing, &[N | E | S | W]),
    (TerrainShape::OpenBend, &[S | W]),
    (
        TerrainShape::Shore,
        &[
            N | S | SW | W | NW,
            N | NE | S | SW | W | NW,
            N | S | SE | SW | W | NW,
            N | NE | S | SE | SW | W | NW,
        ],
    ),
    (
        TerrainShape::FilledBend,
        &[N | W | NW, N | NE | W | NW, N | SW | W | NW, N | NE | SW | W | NW],
    ),
    (TerrainShape::Peninsula, &[N | NE | E | S | W | NW]),
    (TerrainShape::InnerCorner, &[N | NE | E | S | SW | W | NW]),
    (
        TerrainShape::FilledJunction,
        &[
            N | NE | E | W,
            N | NE | E | SE | W,
            N | NE | E | W | SW,
            N | NE | E | SE | W | SW,
        ],
    ),
    (
        TerrainShape::HalfJunction,
        &[
            N | E | W | NW,
            N | E | SE | W | NW,
            N | E | SW | W | NW,
            N | E | SE | SW | W | NW,
        ],
    ),
];

fn shape_of(mask: u8) -> Option<TerrainShape> {
    SHAPES
        .iter()
        .find(|(_, masks)| masks.contains(&mask))
        .map(|(shape, _)| *shape)
}

/// Rotates a neighbour mask a quarter turn so east lands on north.
const fn rotate(mask: u8) -> u8 {
    mask.rotate_right(2)
}

/// Picks the terrain shape for a neighbourhood mask, trying every rotation.
///
/// Masks without a dedicated shape log a warning and fall back to
/// [`TerrainShape::Default`].
#[must_use]
pub fn terrain_shape(mask: u8) -> (TerrainShape, u8) {
    let mut rotated = mask;
    for quarter_turns in 0..4 {
        if let Some(shape) = shape_of(rotated) {
            return (shape, quarter_turns);
        }
        rotated = rotate(rotated);
    }
    warn!(mask = format_args!("{mask:#010b}"), "unsupported terrain neighbourhood");
    (TerrainShape::Default, 0)
}

/// Content held by each of the eight neighbours, `None` beyond the edge.
pub(crate) type Neighborhood = [Option<TileContent>; 8];

fn mask_where<F>(neighborhood: &Neighborhood, mut predicate: F) -> u8
where
    F: FnMut(TileContent) -> bool,
{
    Neighbor::ALL
        .into_iter()
        .filter(|neighbor| neighborhood[neighbor.slot()].is_some_and(&mut predicate))
        .fold(0, |mask, neighbor| mask | neighbor.bit())
}

/// Computes the adaptation of `content` given its surroundings.
pub(crate) fn adapt(content: TileContent, neighborhood: &Neighborhood) -> Adaptation {
    match content {
        TileContent::Water | TileContent::Mountain => {
            let kind = content.content_type();
            let mask = mask_where(neighborhood, |other| other.content_type() == kind);
            let (shape, quarter_turns) = terrain_shape(mask);
            Adaptation::Terrain {
                shape,
                quarter_turns,
            }
        }
        TileContent::Wall => Adaptation::Wall {
            connections: mask_where(neighborhood, |other| other == TileContent::Wall),
        },
        TileContent::Ground(tile_defence_core::GroundKind::Bridge) => Adaptation::Bridge {
            rotated: neighborhood[Neighbor::North.slot()] == Some(TileContent::Water),
        },
        TileContent::Destination(kind) => gathering(kind, neighborhood),
        _ => Adaptation::None,
    }
}

fn gathering(kind: DestinationKind, neighborhood: &Neighborhood) -> Adaptation {
    let count = |predicate: &dyn Fn(TileContent) -> bool| {
        neighborhood
            .iter()
            .flatten()
            .filter(|content| predicate(**content))
            .count() as u32
    };

    if kind == DestinationKind::Farm {
        return Adaptation::Gathering {
            stock: Stock::Food,
            count: count(&|content| content.content_type() == ContentType::Ground),
        };
    }

    let mut stock = Stock::Food;
    let mut best = count(&|content| content == TileContent::Water);
    for resource in [
        ResourceKind::Forest,
        ResourceKind::Metal,
        ResourceKind::Crystal,
    ] {
        let found = count(&|content| content == TileContent::Resource(resource));
        if found > best {
            best = found;
            stock = resource.stock();
        }
    }
    Adaptation::Gathering { stock, count: best }
}
