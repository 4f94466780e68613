use proptest::prelude::*;
use tile_defence_board::{query, Board};
use tile_defence_core::{
    BoardSize, DemolitionError, DestinationKind, PathError, PlacementError, TileContent,
    TileCoord, TowerKind,
};

/// Builds a board from text rows, top row first.
fn board_from_rows(rows: &[&str]) -> Board {
    let height = rows.len() as u32;
    let width = rows[0].len() as u32;
    let size = BoardSize::new(width, height);
    let mut contents = vec![TileContent::PLAIN; size.tile_count()];
    for (line, text) in rows.iter().enumerate() {
        let row = height - 1 - line as u32;
        for (column, symbol) in text.chars().enumerate() {
            let content = match symbol {
                'C' => TileContent::Destination(DestinationKind::Capital),
                'F' => TileContent::Destination(DestinationKind::Farm),
                '#' => TileContent::Wall,
                'T' => TileContent::Tower(TowerKind::Laser),
                '~' => TileContent::Water,
                '^' => TileContent::Mountain,
                'S' => TileContent::SpawnPoint,
                _ => TileContent::PLAIN,
            };
            let index = size
                .index_of(TileCoord::new(column as u32, row))
                .expect("row fits the board");
            contents[index] = content;
        }
    }
    Board::restore(size, &contents)
}

fn path_snapshot(board: &Board) -> Vec<(u32, Option<usize>, tile_defence_core::Direction, [u32; 2])> {
    query::tiles(board)
        .iter()
        .map(|tile| {
            let exit = tile.exit_point();
            (
                tile.distance(),
                tile.next_on_path(),
                tile.path_direction(),
                [exit.x.to_bits(), exit.y.to_bits()],
            )
        })
        .collect()
}

#[test]
fn open_board_distances_match_manhattan_distance() {
    let board = board_from_rows(&[".....", ".....", "..C..", ".....", "....."]);
    let capital = TileCoord::new(2, 2);
    for tile in query::tiles(&board) {
        assert_eq!(
            tile.distance(),
            tile.coord().manhattan_distance(capital),
            "tile {:?}",
            tile.coord()
        );
    }
    let reached = query::tiles(&board)
        .iter()
        .filter(|tile| tile.distance() > 0 && tile.has_path())
        .count();
    assert_eq!(reached, 24);
}

#[test]
fn paths_lead_to_a_destination() {
    let board = board_from_rows(&["S....", ".###.", "...#.", "C..#.", "....."]);
    let route = query::path_from(&board, TileCoord::new(0, 4));
    assert_eq!(route.first(), Some(&TileCoord::new(0, 4)));
    assert_eq!(route.last(), Some(&TileCoord::new(0, 1)));
    assert_eq!(route.len(), 4, "straight down the west edge");

    let step = query::path_step(&board, TileCoord::new(0, 4)).expect("spawn point has a path");
    assert_eq!(step.next, TileCoord::new(0, 3));
    assert_eq!(step.direction, tile_defence_core::Direction::South);
}

#[test]
fn encircling_the_destination_is_rejected() {
    let mut board = board_from_rows(&[".....", ".....", "..C..", ".....", "....."]);
    let ring = [
        (1, 1),
        (2, 1),
        (3, 1),
        (1, 2),
        (3, 2),
        (1, 3),
        (3, 3),
    ];
    for (column, row) in ring {
        board
            .place_building(TileCoord::new(column, row), TileContent::Wall)
            .expect("a gap remains open");
    }

    let last = TileCoord::new(2, 3);
    assert_eq!(
        board.place_building(last, TileContent::Wall),
        Err(PlacementError::Path(PathError::DestinationSealed))
    );
    assert_eq!(query::content(&board, last), Some(TileContent::PLAIN));
    assert!(query::tile(&board, TileCoord::new(0, 0)).unwrap().has_path());
}

#[test]
fn removing_the_last_destination_is_rejected() {
    let mut board = board_from_rows(&["...", ".F.", "..."]);
    let farm = TileCoord::new(1, 1);
    assert_eq!(
        board.demolish(farm),
        Err(DemolitionError::Path(PathError::NoDestination))
    );
    assert_eq!(
        query::content(&board, farm),
        Some(TileContent::Destination(DestinationKind::Farm))
    );
    assert_eq!(query::tile(&board, TileCoord::new(0, 0)).unwrap().distance(), 2);
}

#[test]
fn permanent_content_cannot_be_demolished() {
    let mut board = board_from_rows(&["~^.", ".C."]);
    for (column, row) in [(0, 1), (1, 1), (1, 0)] {
        assert_eq!(
            board.demolish(TileCoord::new(column, row)),
            Err(DemolitionError::Permanent)
        );
    }
    assert_eq!(
        board.demolish(TileCoord::new(2, 1)),
        Err(DemolitionError::NothingToDemolish)
    );
}

#[test]
fn placing_then_demolishing_restores_the_field() {
    let mut board = board_from_rows(&["S.....", "..#...", "....C.", ".#....", "......"]);
    let before = path_snapshot(&board);
    let tile = TileCoord::new(3, 2);
    board
        .place_building(tile, TileContent::Tower(TowerKind::Laser))
        .unwrap();
    assert_ne!(path_snapshot(&board), before, "the tower reroutes paths");
    let _ = board.demolish(tile).unwrap();
    assert_eq!(path_snapshot(&board), before);
}

#[test]
fn cutting_off_a_spawn_point_is_rejected() {
    let mut board = board_from_rows(&["....", "....", ".C..", "S..."]);
    board
        .place_building(TileCoord::new(1, 0), TileContent::Wall)
        .unwrap();
    assert_eq!(
        board.place_building(TileCoord::new(0, 1), TileContent::Wall),
        Err(PlacementError::Path(PathError::SpawnPointCutOff(
            TileCoord::new(0, 0)
        )))
    );
    assert_eq!(query::content(&board, TileCoord::new(0, 1)), Some(TileContent::PLAIN));
}

#[test]
fn stranded_ground_is_reached_through_hard_terrain() {
    let mut board = board_from_rows(&[".....", ".....", "..C..", ".....", "....."]);
    board
        .place_building(TileCoord::new(1, 0), TileContent::Wall)
        .unwrap();
    assert!(!query::second_search(&board));
    board
        .place_building(TileCoord::new(0, 1), TileContent::Tower(TowerKind::Archer))
        .unwrap();

    assert!(query::second_search(&board));
    let corner = query::tile(&board, TileCoord::new(0, 0)).unwrap();
    assert!(corner.has_path());
    assert!(corner.caused_second_search());
    assert!(!corner.reached_directly());

    let route = query::path_from(&board, TileCoord::new(0, 0));
    assert_eq!(route.last(), Some(&TileCoord::new(2, 2)));
    let through = route[1];
    assert!(
        through == TileCoord::new(1, 0) || through == TileCoord::new(0, 1),
        "walks through the wall or tower, got {through:?}"
    );
}

#[test]
fn water_and_mountains_never_trigger_the_fallback() {
    let board = board_from_rows(&["..~..", "..~..", "C.~.."]);
    assert!(!query::second_search(&board), "stranded side is only fenced by water");
    assert!(!query::tile(&board, TileCoord::new(4, 0)).unwrap().has_path());

    let board = board_from_rows(&["#.~..", "..~..", "C.~.."]);
    assert!(query::second_search(&board), "a wall on the board arms the fallback");
    assert!(
        !query::tile(&board, TileCoord::new(4, 0)).unwrap().has_path(),
        "the fallback never crosses water"
    );
}

#[test]
fn populate_places_the_capital_and_spawn_points() {
    let size = BoardSize::new(5, 4);
    let mut board = Board::new(size);
    let map = vec![tile_defence_core::MapData::of(TileContent::PLAIN); size.tile_count()];
    board.populate(&map);

    assert_eq!(
        query::content(&board, TileCoord::new(0, 2)),
        Some(TileContent::Destination(DestinationKind::Capital)),
        "capital sits at index len / 2"
    );
    assert_eq!(query::spawn_points(&board).len(), 13, "outer ring minus the capital");
    for spawn in query::spawn_points(&board) {
        assert!(query::tile(&board, *spawn).unwrap().has_path());
    }
}

#[test]
fn generated_boards_are_reproducible() {
    let params = tile_defence_core::GeneratorParams {
        seed: 17,
        ..Default::default()
    };
    let mut first = Board::new(BoardSize::new(24, 20));
    let mut second = Board::new(BoardSize::new(24, 20));
    assert_eq!(first.generate_map(&params), second.generate_map(&params));
    assert!(query::contents(&first).eq(query::contents(&second)));
    assert!(query::tiles(&first)
        .iter()
        .any(|tile| tile.content().content().is_destination()));
}

#[derive(Clone, Debug)]
enum Edit {
    Wall(u32, u32),
    Tower(u32, u32),
    Demolish(u32, u32),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0u32..7, 0u32..7).prop_map(|(column, row)| Edit::Wall(column, row)),
        (0u32..7, 0u32..7).prop_map(|(column, row)| Edit::Tower(column, row)),
        (0u32..7, 0u32..7).prop_map(|(column, row)| Edit::Demolish(column, row)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn edits_keep_the_field_consistent(edits in proptest::collection::vec(edit(), 1..40)) {
        let mut board = board_from_rows(&[
            "S......",
            ".......",
            "...~...",
            "...C...",
            ".......",
            ".^.....",
            "......S",
        ]);
        for edit in edits {
            let _ = match edit {
                Edit::Wall(column, row) => board
                    .place_building(TileCoord::new(column, row), TileContent::Wall)
                    .is_ok(),
                Edit::Tower(column, row) => board
                    .place_building(TileCoord::new(column, row), TileContent::Tower(TowerKind::Laser))
                    .is_ok(),
                Edit::Demolish(column, row) => board.demolish(TileCoord::new(column, row)).is_ok(),
            };

            let tiles = query::tiles(&board);
            for spawn in query::spawn_points(&board) {
                prop_assert!(query::tile(&board, *spawn).unwrap().reached_directly());
            }
            for tile in tiles {
                let content = tile.content().content();
                prop_assert_eq!(tile.distance() == 0, content.is_destination());
                if content.blocks_path() || !tile.has_path() {
                    continue;
                }
                if let Some(next) = tile.next_on_path() {
                    prop_assert_eq!(tiles[next].distance() + 1, tile.distance());
                }
                let route = query::path_from(&board, tile.coord());
                let end = route.last().copied().unwrap();
                prop_assert!(query::content(&board, end).unwrap().is_destination());
                for direction in tile_defence_core::Direction::ALL {
                    let (dc, dr) = direction.offset();
                    let Some(other) = tile.coord().offset_by(dc, dr).and_then(|c| query::tile(&board, c)) else {
                        continue;
                    };
                    if !other.content().content().blocks_path() {
                        prop_assert!(other.has_path(), "walkable neighbour {:?} of {:?} has no path", other.coord(), tile.coord());
                    }
                }
            }
        }
    }
}
