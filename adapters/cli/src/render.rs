//! Plain-text views of a game for the terminal.

use std::fmt::Write;

use tile_defence_board::{query as board_query, Board};
use tile_defence_core::{
    DestinationKind, GroundKind, ResourceKind, Stock, TileContent, TileCoord, TowerKind,
};
use tile_defence_game::{query, Game};

/// Character drawn for a tile's content.
pub(crate) const fn glyph(content: TileContent) -> char {
    match content {
        TileContent::Ground(GroundKind::Plain) => '.',
        TileContent::Ground(GroundKind::Bridge) => '=',
        TileContent::Water => '~',
        TileContent::Mountain => '^',
        TileContent::Resource(ResourceKind::Forest) => 'f',
        TileContent::Resource(ResourceKind::Metal) => 'm',
        TileContent::Resource(ResourceKind::Crystal) => 'c',
        TileContent::Wall => '#',
        TileContent::Destination(DestinationKind::Capital) => 'C',
        TileContent::Destination(DestinationKind::Farm) => 'F',
        TileContent::Destination(DestinationKind::Camp) => 'K',
        TileContent::SpawnPoint => 'S',
        TileContent::Tower(TowerKind::Laser) => 'L',
        TileContent::Tower(TowerKind::Archer) => 'A',
    }
}

/// Draws the board with the top row first, one line per row.
pub(crate) fn board(board: &Board) -> String {
    let size = board_query::size(board);
    let mut out = String::with_capacity(size.tile_count() + size.rows() as usize);
    for row in (0..size.rows()).rev() {
        for column in 0..size.columns() {
            let content = board_query::content(board, TileCoord::new(column, row))
                .unwrap_or(TileContent::PLAIN);
            out.push(glyph(content));
        }
        out.push('\n');
    }
    out
}

/// Multi-line summary of the running state of a game.
pub(crate) fn summary(game: &Game) -> String {
    let board = query::board(game);
    let size = board_query::size(board);
    let statistics = query::statistics(game);
    let wallet = query::wallet(game);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "tick {} | speed {:?} | board {}x{}",
        query::tick(game),
        query::speed(game),
        size.columns(),
        size.rows()
    );
    let _ = writeln!(
        out,
        "spawn points {} | towers {} | enemies {} | arrows {}",
        board_query::spawn_points(board).len(),
        query::towers(game).len(),
        query::enemies(game).count(),
        query::projectiles(game).count()
    );
    let stocks: Vec<String> = Stock::ALL
        .iter()
        .map(|stock| {
            format!(
                "{stock:?} {:.1} (+{:.2}/s)",
                wallet.amount(*stock),
                wallet.income(*stock)
            )
        })
        .collect();
    let _ = writeln!(out, "stocks {}", stocks.join(", "));
    if let Some(scenario) = query::scenario(game) {
        let status = if query::scenario_completed(game) {
            "completed"
        } else if scenario.is_exhausted() {
            "exhausted"
        } else {
            "running"
        };
        let _ = writeln!(
            out,
            "scenario {status} | cycle {} wave {} | time scale {:.2}",
            scenario.cycle(),
            scenario.wave(),
            scenario.time_scale()
        );
    }
    let _ = writeln!(
        out,
        "spawned {} | killed {} | arrived {} | arrows launched {}",
        statistics.enemies_spawned,
        statistics.enemies_killed,
        statistics.enemies_arrived,
        statistics.arrows_launched
    );
    out
}
