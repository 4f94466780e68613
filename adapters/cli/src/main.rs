#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates, simulates, and inspects Tile Defence games.

mod render;
mod transfer;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tile_defence_board::{query as board_query, Board};
use tile_defence_core::{
    Command, DestinationKind, Event, GameSpeed, GroundKind, TileContent, TileCoord, TowerKind,
    WELCOME_BANNER,
};
use tile_defence_game::{apply, query, Game, GameConfig, ScenarioConfig, CURRENT_VERSION};
use tile_defence_system_builder::{Builder, BuilderInput, PlacementMode, Selection};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::transfer::SaveTransfer;

#[derive(Debug, Parser)]
#[command(name = "tile-defence", version, about = "Headless Tile Defence engine")]
struct Cli {
    /// TOML file overriding the default game configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Seed replacing the configured one.
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generates a fresh map and prints it.
    Generate {
        /// Writes the fresh game to this save file.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Runs the simulation headlessly and reports what happened.
    Simulate(SimulateArgs),
    /// Prints the board and state stored in a save file.
    Inspect {
        /// Save file to read.
        save: PathBuf,
    },
    /// Prints a save file as a transfer string.
    Export {
        /// Save file to read.
        save: PathBuf,
    },
    /// Writes the save carried by a transfer string.
    Import {
        /// Transfer string produced by `export`.
        transfer: String,
        /// Save file to write.
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Simulated seconds to run.
    #[arg(long, default_value_t = 60.0)]
    seconds: f64,
    /// Real-time length of one tick in milliseconds.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,
    /// Spawn points to open when the board has none.
    #[arg(long, default_value_t = 2)]
    spawn_points: usize,
    /// Edits applied before the first tick, as `kind@col,row`, `kind@col,row-col,row`
    /// for a line, or `kind@col,row:col,row` for a filled rectangle.
    #[arg(long = "place", value_parser = parse_placement)]
    placements: Vec<Placement>,
    /// Runs entities at double speed.
    #[arg(long)]
    fast: bool,
    /// Resumes from this save file instead of generating a map.
    #[arg(long)]
    load: Option<PathBuf>,
    /// Writes the final state to this save file.
    #[arg(long)]
    save: Option<PathBuf>,
}

/// One requested edit, replayed through the builder as a press and a release.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Placement {
    selection: Selection,
    mode: PlacementMode,
    from: TileCoord,
    to: TileCoord,
}

impl Placement {
    /// Frame holding the action down on the first tile, then the frame
    /// releasing it over the last.
    fn frames(&self) -> [BuilderInput; 2] {
        [
            BuilderInput {
                cursor_tile: Some(self.from),
                place_action: true,
                confirm_action: false,
            },
            BuilderInput {
                cursor_tile: Some(self.to),
                place_action: false,
                confirm_action: true,
            },
        ]
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.seed)?;

    match cli.command {
        Commands::Generate { output } => {
            let game = Game::new(config);
            print!("{}", render::board(query::board(&game)));
            if let Some(path) = output {
                write_save(&game, &path)?;
            }
        }
        Commands::Simulate(args) => {
            println!("{WELCOME_BANNER}");
            let game = simulate(config, &args)?;
            print!("{}", render::board(query::board(&game)));
            print!("{}", render::summary(&game));
            if let Some(path) = &args.save {
                write_save(&game, path)?;
            }
        }
        Commands::Inspect { save } => {
            let game = read_save(config, &save)?;
            print!("{}", render::board(query::board(&game)));
            print!("{}", render::summary(&game));
        }
        Commands::Export { save } => {
            let game = read_save(config, &save)?;
            println!("{}", export(&game)?);
        }
        Commands::Import { transfer, output } => {
            let game = import(config, &transfer)?;
            write_save(&game, &output)?;
            info!(path = %output.display(), "imported save");
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str::<GameConfig>(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    Ok(config)
}

fn read_save(config: GameConfig, path: &Path) -> Result<Game> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Game::load(config, bytes.as_slice())
        .with_context(|| format!("failed to load save {}", path.display()))
}

fn write_save(game: &Game, path: &Path) -> Result<()> {
    let bytes = game.save(Vec::new()).context("failed to encode save")?;
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote save");
    Ok(())
}

fn export(game: &Game) -> Result<String> {
    let size = board_query::size(query::board(game));
    let save = game.save(Vec::new()).context("failed to encode save")?;
    Ok(SaveTransfer {
        version: CURRENT_VERSION,
        columns: size.columns(),
        rows: size.rows(),
        save,
    }
    .encode())
}

fn import(config: GameConfig, value: &str) -> Result<Game> {
    let transfer = SaveTransfer::decode(value, CURRENT_VERSION)?;
    let game = Game::load(config, transfer.save.as_slice())
        .context("transfer string carries a broken save")?;
    let size = board_query::size(query::board(&game));
    if (size.columns(), size.rows()) != (transfer.columns, transfer.rows) {
        bail!(
            "transfer string declares a {}x{} board but the save holds {}x{}",
            transfer.columns,
            transfer.rows,
            size.columns(),
            size.rows()
        );
    }
    Ok(game)
}

fn simulate(mut config: GameConfig, args: &SimulateArgs) -> Result<Game> {
    let _ = config.scenario.get_or_insert_with(ScenarioConfig::default);
    let mut game = match &args.load {
        Some(path) => read_save(config, path)?,
        None => Game::new(config),
    };

    let mut events = Vec::new();
    for tile in spawn_candidates(query::board(&game), args.spawn_points) {
        apply(&mut game, Command::ToggleSpawnPoint { tile }, &mut events);
    }
    let mut builder = Builder::new();
    for placement in &args.placements {
        place(&mut game, &mut builder, placement, &mut events);
    }
    if args.fast {
        apply(
            &mut game,
            Command::SetGameSpeed {
                speed: GameSpeed::Fast,
            },
            &mut events,
        );
    }
    report_rejections(&events);

    let dt = Duration::from_millis(args.tick_ms);
    let millis = (args.seconds.max(0.0) * 1000.0).ceil() as u64;
    let ticks = millis.div_ceil(args.tick_ms);
    info!(ticks, "simulating");

    for _ in 0..ticks {
        let mut events = Vec::new();
        apply(&mut game, Command::Tick { dt }, &mut events);
        report_rejections(&events);
        report_progress(&events);
    }

    let statistics = query::statistics(&game);
    info!(
        spawned = statistics.enemies_spawned,
        killed = statistics.enemies_killed,
        arrived = statistics.enemies_arrived,
        "simulation finished"
    );
    Ok(game)
}

/// Feeds one placement to the builder and applies the edits it asks for.
fn place(game: &mut Game, builder: &mut Builder, placement: &Placement, events: &mut Vec<Event>) {
    builder.select(placement.selection);
    builder.set_mode(placement.mode);
    let mut fresh = Vec::new();
    for input in placement.frames() {
        let mut commands = Vec::new();
        builder.handle(&fresh, input, &mut commands);
        fresh.clear();
        for command in commands {
            apply(game, command, &mut fresh);
        }
        events.extend(fresh.iter().cloned());
    }
}

/// Plain tiles with a path that become spawn points when the board has none,
/// farthest from any destination first.
fn spawn_candidates(board: &Board, wanted: usize) -> Vec<TileCoord> {
    if !board_query::spawn_points(board).is_empty() {
        return Vec::new();
    }
    let mut candidates: Vec<_> = board_query::tiles(board)
        .iter()
        .filter(|tile| tile.content().content() == TileContent::PLAIN && tile.has_path())
        .map(|tile| (tile.distance(), tile.coord()))
        .collect();
    candidates.sort_by(|left, right| right.0.cmp(&left.0).then(left.1.cmp(&right.1)));
    candidates
        .into_iter()
        .take(wanted)
        .map(|(_, coord)| coord)
        .collect()
}

fn report_rejections(events: &[Event]) {
    for event in events {
        match event {
            Event::PlacementRejected {
                tile,
                content,
                reason,
            } => warn!(?tile, ?content, %reason, "placement rejected"),
            Event::DemolitionRejected { tile, reason } => {
                warn!(?tile, %reason, "demolition rejected");
            }
            Event::SpawnRejected { spawn_point } => warn!(?spawn_point, "spawn rejected"),
            _ => {}
        }
    }
}

fn report_progress(events: &[Event]) {
    for event in events {
        match event {
            Event::WaveStarted { cycle, wave } => info!(cycle, wave, "wave started"),
            Event::ScenarioCompleted => info!("scenario completed"),
            _ => {}
        }
    }
}

fn parse_placement(value: &str) -> Result<Placement, String> {
    let (name, area) = value
        .split_once('@')
        .ok_or_else(|| format!("expected `kind@col,row`, found `{value}`"))?;
    let selection = parse_selection(name)?;
    let (mode, from, to) = if let Some((from, to)) = area.split_once(':') {
        (PlacementMode::Square, parse_coord(from)?, parse_coord(to)?)
    } else if let Some((from, to)) = area.split_once('-') {
        (PlacementMode::Line, parse_coord(from)?, parse_coord(to)?)
    } else {
        let tile = parse_coord(area)?;
        (PlacementMode::Single, tile, tile)
    };
    Ok(Placement {
        selection,
        mode,
        from,
        to,
    })
}

fn parse_selection(name: &str) -> Result<Selection, String> {
    let content = match name.to_ascii_lowercase().as_str() {
        "demolish" => return Ok(Selection::Demolish),
        "wall" => TileContent::Wall,
        "laser" => TileContent::Tower(TowerKind::Laser),
        "archer" => TileContent::Tower(TowerKind::Archer),
        "farm" => TileContent::Destination(DestinationKind::Farm),
        "camp" => TileContent::Destination(DestinationKind::Camp),
        "bridge" => TileContent::Ground(GroundKind::Bridge),
        "spawn" => TileContent::SpawnPoint,
        _ => return Err(format!("unknown building `{name}`")),
    };
    Ok(Selection::Build(content))
}

fn parse_coord(value: &str) -> Result<TileCoord, String> {
    let invalid = || format!("expected `col,row`, found `{value}`");
    let (column, row) = value.split_once(',').ok_or_else(invalid)?;
    let column = column.trim().parse::<u32>().map_err(|_| invalid())?;
    let row = row.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok(TileCoord::new(column, row))
}

#[cfg(test)]
mod tests {
    use tile_defence_core::BoardSize;

    use super::*;

    fn corridor() -> Game {
        let size = BoardSize::new(6, 1);
        let mut contents = vec![TileContent::PLAIN; size.tile_count()];
        contents[5] = TileContent::Destination(DestinationKind::Capital);
        Game::with_board(GameConfig::default(), Board::restore(size, &contents))
    }

    #[test]
    fn placements_cover_single_tiles_lines_and_rectangles() {
        let single = parse_placement("archer@2,3").unwrap();
        assert_eq!(
            single,
            Placement {
                selection: Selection::Build(TileContent::Tower(TowerKind::Archer)),
                mode: PlacementMode::Single,
                from: TileCoord::new(2, 3),
                to: TileCoord::new(2, 3),
            }
        );
        assert_eq!(parse_placement("wall@0,0-3,0").unwrap().mode, PlacementMode::Line);
        let square = parse_placement("Demolish@1,1:2,3").unwrap();
        assert_eq!(square.selection, Selection::Demolish);
        assert_eq!(square.mode, PlacementMode::Square);
        assert_eq!(square.to, TileCoord::new(2, 3));
        assert!(parse_placement("moat@1,1").is_err());
        assert!(parse_placement("wall").is_err());
        assert!(parse_placement("wall@one,2").is_err());
    }

    #[test]
    fn placements_are_built_through_the_builder() {
        let size = BoardSize::new(6, 3);
        let mut contents = vec![TileContent::PLAIN; size.tile_count()];
        contents[size.index_of(TileCoord::new(0, 1)).unwrap()] = TileContent::SpawnPoint;
        contents[size.index_of(TileCoord::new(5, 1)).unwrap()] =
            TileContent::Destination(DestinationKind::Capital);
        let mut game = Game::with_board(GameConfig::default(), Board::restore(size, &contents));

        let mut builder = Builder::new();
        let mut events = Vec::new();
        for text in ["wall@1,2-3,2", "archer@4,0", "demolish@2,2"] {
            let placement = parse_placement(text).unwrap();
            place(&mut game, &mut builder, &placement, &mut events);
        }

        let board = query::board(&game);
        let content = |column, row| board_query::content(board, TileCoord::new(column, row));
        assert_eq!(content(1, 2), Some(TileContent::Wall));
        assert_eq!(content(2, 2), Some(TileContent::PLAIN));
        assert_eq!(content(3, 2), Some(TileContent::Wall));
        assert_eq!(content(4, 0), Some(TileContent::Tower(TowerKind::Archer)));
        assert_eq!(
            events
                .iter()
                .filter(|event| matches!(event, Event::BuildingPlaced { .. }))
                .count(),
            4
        );
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::Demolished { .. })));
    }

    #[test]
    fn spawn_points_open_far_from_the_capital() {
        let game = corridor();
        assert_eq!(
            spawn_candidates(query::board(&game), 2),
            vec![TileCoord::new(0, 0), TileCoord::new(1, 0)]
        );
    }

    #[test]
    fn exported_games_import_unchanged() {
        let mut game = corridor();
        let mut events = Vec::new();
        apply(
            &mut game,
            Command::ToggleSpawnPoint {
                tile: TileCoord::new(0, 0),
            },
            &mut events,
        );
        let text = export(&game).unwrap();
        assert!(text.starts_with(&format!("tiledef:v{CURRENT_VERSION}:6x1:")));

        let imported = import(GameConfig::default(), &text).unwrap();
        assert!(board_query::contents(query::board(&imported))
            .eq(board_query::contents(query::board(&game))));
    }

    #[test]
    fn imports_check_the_declared_dimensions() {
        let text = export(&corridor()).unwrap().replacen(":6x1:", ":3x2:", 1);
        assert!(import(GameConfig::default(), &text).is_err());
    }

    #[test]
    fn short_simulations_spawn_enemies() {
        // Too small for terrain, so the board is plain ground ringed by spawn points.
        let config = GameConfig {
            columns: 6,
            rows: 6,
            scenario: Some(ScenarioConfig {
                initial_delay: 0.5,
                ..ScenarioConfig::default()
            }),
            ..GameConfig::default()
        };
        let args = SimulateArgs {
            seconds: 3.0,
            tick_ms: 50,
            spawn_points: 1,
            placements: Vec::new(),
            fast: false,
            load: None,
            save: None,
        };
        let game = simulate(config, &args).unwrap();
        assert_eq!(query::tick(&game), 60);
        assert!(query::statistics(&game).enemies_spawned > 0);
        assert_eq!(
            query::scenario(&game).map(|scenario| scenario.wave()),
            Some(0),
            "still inside the first wave"
        );
    }

    #[test]
    fn simulations_fall_back_to_the_default_scenario() {
        let config = GameConfig {
            columns: 6,
            rows: 6,
            ..GameConfig::default()
        };
        let args = SimulateArgs {
            seconds: 1.0,
            tick_ms: 100,
            spawn_points: 1,
            placements: Vec::new(),
            fast: false,
            load: None,
            save: None,
        };
        let game = simulate(config, &args).unwrap();
        assert_eq!(
            query::config(&game).scenario,
            Some(ScenarioConfig::default())
        );
        assert_eq!(query::statistics(&game).enemies_spawned, 0, "still in the initial delay");
    }

    #[test]
    fn config_files_override_defaults() {
        let path = std::env::temp_dir().join(format!("tile-defence-{}.toml", std::process::id()));
        fs::write(&path, "columns = 9\nseed = 4\n").unwrap();
        let config = load_config(Some(&path), Some(11)).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.columns, 9);
        assert_eq!(config.rows, GameConfig::default().rows);
        assert_eq!(config.seed, 11);
    }
}
