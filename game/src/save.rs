//! Binary save format of a [`Game`].
//!
//! Version history:
//!
//! 1. tick counter, board contents, enemies
//! 2. enemy age and tint, wallet stocks
//! 3. entity counter and speed, projectiles, tower state, random stream,
//!    statistics
//! 4. build order of spawn points and towers, a factory id leading every
//!    enemy and projectile record, scenario progress

use std::io::{Read, Write};

use tile_defence_board::{query as board_query, Board};
use tile_defence_core::{
    BoardSize, ContentType, Direction, DirectionChange, EnemyKind, EntityId, FactoryId, GameSpeed,
    TileContent, TileCoord,
};
use tile_defence_system_economy::Wallet;
use tile_defence_system_persistence::{GameDataReader, GameDataWriter, SaveError};
use tile_defence_system_pool::{Origin, Roster};
use tile_defence_system_spawning::Scenario;
use tracing::{info, warn};

use crate::{
    enemy::Enemy, projectile::Projectile, Game, GameConfig, Statistics, ENEMY_FACTORY,
    PROJECTILE_FACTORY,
};

/// Newest save format this build writes and reads.
pub const CURRENT_VERSION: u32 = 4;

type Section = GameDataWriter<Vec<u8>>;

impl Game {
    /// Writes the game in the current format and hands the stream back.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying stream.
    pub fn save<W: Write>(&self, out: W) -> Result<W, SaveError> {
        self.save_as(out, CURRENT_VERSION)
    }

    /// Writes the game in an older format, dropping the fields it lacks.
    ///
    /// # Errors
    ///
    /// Fails with [`SaveError::UnsupportedVersion`] for version zero or a
    /// version newer than [`CURRENT_VERSION`], and propagates failures of the
    /// underlying stream.
    pub fn save_as<W: Write>(&self, out: W, version: u32) -> Result<W, SaveError> {
        if version == 0 || version > CURRENT_VERSION {
            return Err(SaveError::UnsupportedVersion {
                found: version,
                supported: CURRENT_VERSION,
            });
        }

        let mut writer = GameDataWriter::new(out, version)?;
        writer.write_section(|header| {
            header.write_u64(self.tick)?;
            if header.version() >= 3 {
                header.write_u32(self.next_entity)?;
                header.write_u8(speed_id(self.speed))?;
            }
            Ok(())
        })?;
        writer.write_section(|section| write_board(section, &self.board))?;
        writer.write_section(|section| write_enemies(section, &self.enemies))?;
        if version >= 2 {
            writer.write_section(|section| {
                for amount in self.wallet.stocks() {
                    section.write_f32(amount)?;
                }
                Ok(())
            })?;
        }
        if version >= 3 {
            writer.write_section(|section| write_projectiles(section, &self.projectiles))?;
            writer.write_section(|section| self.write_towers(section))?;
            writer.write_rng(&self.rng)?;
            writer.write_section(|section| {
                section.write_u64(self.statistics.enemies_spawned)?;
                section.write_u64(self.statistics.enemies_killed)?;
                section.write_u64(self.statistics.enemies_arrived)?;
                section.write_u64(self.statistics.arrows_launched)
            })?;
        }
        if version >= 4 {
            writer.write_section(|section| {
                section.write_bool(self.scenario.is_some())?;
                if let Some(scenario) = &self.scenario {
                    scenario.save(section)?;
                }
                section.write_bool(self.scenario_completed)
            })?;
        }

        info!(
            version,
            tick = self.tick,
            enemies = self.enemies.len(),
            "game saved"
        );
        Ok(writer.into_inner())
    }

    fn write_towers(&self, out: &mut Section) -> Result<(), SaveError> {
        out.write_u32(count(self.towers.len())?)?;
        for tower in &self.towers {
            write_coord(out, tower.coord)?;
            out.write_f32(tower.launch_progress)?;
            out.write_bool(tower.target.is_some())?;
            if let Some(target) = tower.target {
                out.write_u32(target.get())?;
            }
        }
        Ok(())
    }

    /// Reads a game saved in any supported format.
    ///
    /// Fields the save predates keep the values a fresh game built from
    /// `config` would have.
    ///
    /// # Errors
    ///
    /// Fails with [`SaveError::UnsupportedVersion`] when the save is newer
    /// than [`CURRENT_VERSION`], with [`SaveError::Corrupt`] when it decodes
    /// into an impossible game, and with [`SaveError::Io`] when it ends
    /// early.
    pub fn load<R: Read>(config: GameConfig, input: R) -> Result<Self, SaveError> {
        let mut reader = GameDataReader::new(input, CURRENT_VERSION)?;

        let mut header = reader.read_section()?;
        let tick = header.read_u64()?;
        let (next_entity, speed) = if header.since(3) {
            let next_entity = header.read_u32()?;
            (Some(next_entity), speed_from_id(header.read_u8()?)?)
        } else {
            (None, GameSpeed::Playing)
        };

        let board = read_board(&mut reader.read_section()?)?;
        let size = board_query::size(&board);
        let mut game = Self::with_board(config, board);
        game.tick = tick;
        game.speed = speed;

        let mut section = reader.read_section()?;
        let enemies = section.read_u32()?;
        for _ in 0..enemies {
            let enemy = read_enemy(&mut section, size)?;
            let _ = game.enemies.push(enemy);
        }

        if reader.since(2) {
            let mut section = reader.read_section()?;
            let mut stocks = [0.0; 5];
            for amount in &mut stocks {
                *amount = section.read_f32()?;
            }
            game.wallet = Wallet::from_parts(stocks, game.wallet.incomes());
        }

        if reader.since(3) {
            let mut section = reader.read_section()?;
            let projectiles = section.read_u32()?;
            for _ in 0..projectiles {
                let arrow = read_projectile(&mut section)?;
                let _ = game.projectiles.push(arrow);
            }
            game.read_towers(&mut reader.read_section()?, size)?;
            game.rng = reader.read_rng()?;
            let mut section = reader.read_section()?;
            game.statistics = Statistics {
                enemies_spawned: section.read_u64()?,
                enemies_killed: section.read_u64()?,
                enemies_arrived: section.read_u64()?,
                arrows_launched: section.read_u64()?,
            };
        }

        if reader.since(4) {
            let mut section = reader.read_section()?;
            if section.read_bool()? {
                match game.config.scenario.clone() {
                    Some(config) => game.scenario = Some(Scenario::load(config, &mut section)?),
                    None => warn!("save carries scenario progress but no scenario is configured"),
                }
            }
            game.scenario_completed = game.scenario.is_some() && section.read_bool()?;
        }

        game.next_entity = next_entity.unwrap_or_else(|| {
            game.enemies
                .iter()
                .map(|enemy| enemy.id.get())
                .chain(game.projectiles.iter().map(|arrow| arrow.id.get()))
                .max()
                .map_or(1, |highest| highest.wrapping_add(1))
        });

        info!(
            version = reader.version(),
            tick = game.tick,
            enemies = game.enemies.len(),
            "game loaded"
        );
        Ok(game)
    }

    /// Replaces this game with one read from `input`, keeping the current
    /// configuration.
    ///
    /// # Errors
    ///
    /// Fails like [`Game::load`]; the game is left untouched on failure.
    pub fn load_into<R: Read>(&mut self, input: R) -> Result<(), SaveError> {
        *self = Self::load(self.config.clone(), input)?;
        Ok(())
    }

    fn read_towers<R: Read>(
        &mut self,
        input: &mut GameDataReader<R>,
        size: BoardSize,
    ) -> Result<(), SaveError> {
        let towers = input.read_u32()?;
        for _ in 0..towers {
            let coord = read_coord(input, size)?;
            let launch_progress = input.read_f32()?;
            let target = if input.read_bool()? {
                Some(EntityId::new(input.read_u32()?))
            } else {
                None
            };
            let Some(tower) = self.towers.iter_mut().find(|tower| tower.coord == coord) else {
                return Err(SaveError::corrupt(format_args!(
                    "tower state for {coord:?} has no tower on the board"
                )));
            };
            tower.launch_progress = launch_progress;
            tower.target = target;
        }
        Ok(())
    }
}

fn count(len: usize) -> Result<u32, SaveError> {
    u32::try_from(len).map_err(|_| SaveError::corrupt("collection too large to save"))
}

fn speed_id(speed: GameSpeed) -> u8 {
    match speed {
        GameSpeed::Paused => 0,
        GameSpeed::Playing => 1,
        GameSpeed::Fast => 2,
    }
}

fn speed_from_id(id: u8) -> Result<GameSpeed, SaveError> {
    match id {
        0 => Ok(GameSpeed::Paused),
        1 => Ok(GameSpeed::Playing),
        2 => Ok(GameSpeed::Fast),
        other => Err(SaveError::corrupt(format_args!("unknown game speed {other}"))),
    }
}

fn change_id(change: DirectionChange) -> u8 {
    match change {
        DirectionChange::None => 0,
        DirectionChange::TurnRight => 1,
        DirectionChange::TurnLeft => 2,
        DirectionChange::TurnAround => 3,
    }
}

fn change_from_id(id: u8) -> Result<DirectionChange, SaveError> {
    match id {
        0 => Ok(DirectionChange::None),
        1 => Ok(DirectionChange::TurnRight),
        2 => Ok(DirectionChange::TurnLeft),
        3 => Ok(DirectionChange::TurnAround),
        other => Err(SaveError::corrupt(format_args!(
            "unknown direction change {other}"
        ))),
    }
}

fn expect_factory<R: Read>(
    input: &mut GameDataReader<R>,
    factory: FactoryId,
) -> Result<(), SaveError> {
    let found = input.read_u32()?;
    if found != factory.get() {
        return Err(SaveError::corrupt(format_args!(
            "record of factory {found} where factory {} was expected",
            factory.get()
        )));
    }
    Ok(())
}

fn write_coord(out: &mut Section, coord: TileCoord) -> Result<(), SaveError> {
    out.write_u32(coord.column())?;
    out.write_u32(coord.row())
}

fn read_coord<R: Read>(
    input: &mut GameDataReader<R>,
    size: BoardSize,
) -> Result<TileCoord, SaveError> {
    let column = input.read_u32()?;
    let row = input.read_u32()?;
    let coord = TileCoord::new(column, row);
    if !size.contains(coord) {
        return Err(SaveError::corrupt(format_args!(
            "tile {coord:?} lies outside the board"
        )));
    }
    Ok(coord)
}

fn write_board(out: &mut Section, board: &Board) -> Result<(), SaveError> {
    let size = board_query::size(board);
    out.write_u32(size.columns())?;
    out.write_u32(size.rows())?;
    let cells: Vec<u8> = board_query::contents(board)
        .flat_map(|content| [content.content_type().id(), content.variation()])
        .collect();
    out.write_bytes(&cells)?;
    if out.version() >= 4 {
        write_coords(out, board_query::spawn_points(board))?;
        write_coords(out, board_query::updating_tiles(board))?;
    }
    Ok(())
}

fn write_coords(out: &mut Section, coords: &[TileCoord]) -> Result<(), SaveError> {
    out.write_u32(count(coords.len())?)?;
    for coord in coords {
        write_coord(out, *coord)?;
    }
    Ok(())
}

fn read_coords<R: Read>(
    input: &mut GameDataReader<R>,
    size: BoardSize,
) -> Result<Vec<TileCoord>, SaveError> {
    let len = input.read_u32()?;
    if len as usize > size.tile_count() {
        return Err(SaveError::corrupt(format_args!(
            "{len} tiles listed on a board of {}",
            size.tile_count()
        )));
    }
    (0..len).map(|_| read_coord(input, size)).collect()
}

fn read_board<R: Read>(input: &mut GameDataReader<R>) -> Result<Board, SaveError> {
    let columns = input.read_u32()?;
    let rows = input.read_u32()?;
    let cells = input.read_bytes()?;
    if columns == 0 || rows == 0 {
        return Err(SaveError::corrupt("board has no tiles"));
    }
    if u64::from(columns) * u64::from(rows) * 2 != cells.len() as u64 {
        return Err(SaveError::corrupt(format_args!(
            "{} content bytes cannot cover a {columns}x{rows} board",
            cells.len()
        )));
    }

    let contents = cells
        .chunks_exact(2)
        .map(|pair| {
            ContentType::from_id(pair[0])
                .and_then(|content_type| TileContent::from_parts(content_type, pair[1]))
                .ok_or_else(|| {
                    SaveError::corrupt(format_args!(
                        "unknown content {} with variation {}",
                        pair[0], pair[1]
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let size = BoardSize::new(columns, rows);
    let mut board = Board::restore(size, &contents);
    if input.since(4) {
        let spawn_points = read_coords(input, size)?;
        let updating = read_coords(input, size)?;
        if !board.restore_order(&spawn_points, &updating) {
            return Err(SaveError::corrupt(
                "recorded build order does not match the board contents",
            ));
        }
    }
    Ok(board)
}

fn write_enemies(out: &mut Section, enemies: &Roster<Enemy>) -> Result<(), SaveError> {
    out.write_u32(count(enemies.len())?)?;
    for enemy in enemies.iter() {
        if out.version() >= 4 {
            out.write_u32(ENEMY_FACTORY.get())?;
        }
        out.write_u8(enemy.kind.id())?;
        out.write_u32(enemy.id.get())?;
        out.write_f32(enemy.health)?;
        out.write_f32(enemy.scale)?;
        out.write_f32(enemy.speed)?;
        out.write_f32(enemy.path_offset)?;
        write_coord(out, enemy.tile_from)?;
        out.write_bool(enemy.tile_to.is_some())?;
        if let Some(tile_to) = enemy.tile_to {
            write_coord(out, tile_to)?;
        }
        out.write_vec2(enemy.position_from)?;
        out.write_vec2(enemy.position_to)?;
        out.write_f32(enemy.progress)?;
        out.write_f32(enemy.progress_factor)?;
        out.write_u8(enemy.direction.index())?;
        out.write_u8(change_id(enemy.direction_change))?;
        if out.version() >= 2 {
            out.write_f32(enemy.age)?;
            out.write_tint(enemy.tint)?;
        }
    }
    Ok(())
}

fn read_enemy<R: Read>(
    input: &mut GameDataReader<R>,
    size: BoardSize,
) -> Result<Enemy, SaveError> {
    if input.since(4) {
        expect_factory(input, ENEMY_FACTORY)?;
    }
    let kind_id = input.read_u8()?;
    let kind = EnemyKind::from_id(kind_id)
        .ok_or_else(|| SaveError::corrupt(format_args!("unknown enemy kind {kind_id}")))?;
    let mut enemy = Enemy::new(kind);
    enemy.origin = Origin::bound(ENEMY_FACTORY);
    enemy.id = EntityId::new(input.read_u32()?);
    enemy.health = input.read_f32()?;
    enemy.scale = input.read_f32()?;
    enemy.speed = input.read_f32()?;
    enemy.path_offset = input.read_f32()?;
    enemy.tile_from = read_coord(input, size)?;
    enemy.tile_to = if input.read_bool()? {
        Some(read_coord(input, size)?)
    } else {
        None
    };
    enemy.position_from = input.read_vec2()?;
    enemy.position_to = input.read_vec2()?;
    enemy.progress = input.read_f32()?;
    enemy.progress_factor = input.read_f32()?;
    let direction = input.read_u8()?;
    enemy.direction = Direction::from_index(direction)
        .ok_or_else(|| SaveError::corrupt(format_args!("unknown direction {direction}")))?;
    enemy.direction_change = change_from_id(input.read_u8()?)?;
    if input.since(2) {
        enemy.age = input.read_f32()?;
        enemy.tint = input.read_tint()?;
    }
    Ok(enemy)
}

fn write_projectiles(out: &mut Section, projectiles: &Roster<Projectile>) -> Result<(), SaveError> {
    out.write_u32(count(projectiles.len())?)?;
    for arrow in projectiles.iter() {
        if out.version() >= 4 {
            out.write_u32(PROJECTILE_FACTORY.get())?;
        }
        out.write_u32(arrow.id.get())?;
        out.write_vec2(arrow.launch_point)?;
        out.write_vec2(arrow.target_point)?;
        out.write_f32(arrow.age)?;
        out.write_f32(arrow.flight_time)?;
        out.write_f32(arrow.blast_radius)?;
        out.write_f32(arrow.damage)?;
    }
    Ok(())
}

fn read_projectile<R: Read>(input: &mut GameDataReader<R>) -> Result<Projectile, SaveError> {
    if input.since(4) {
        expect_factory(input, PROJECTILE_FACTORY)?;
    }
    let mut arrow = Projectile::new();
    arrow.origin = Origin::bound(PROJECTILE_FACTORY);
    arrow.id = EntityId::new(input.read_u32()?);
    arrow.launch_point = input.read_vec2()?;
    arrow.target_point = input.read_vec2()?;
    arrow.age = input.read_f32()?;
    arrow.flight_time = input.read_f32()?;
    arrow.blast_radius = input.read_f32()?;
    arrow.damage = input.read_f32()?;
    Ok(arrow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_defence_core::DestinationKind;

    #[test]
    fn unknown_speeds_and_turns_are_corrupt() {
        assert!(matches!(speed_from_id(7), Err(SaveError::Corrupt(_))));
        assert!(matches!(change_from_id(4), Err(SaveError::Corrupt(_))));
        for change in [
            DirectionChange::None,
            DirectionChange::TurnRight,
            DirectionChange::TurnLeft,
            DirectionChange::TurnAround,
        ] {
            assert_eq!(change_from_id(change_id(change)).unwrap(), change);
        }
    }

    #[test]
    fn records_name_the_factory_they_came_from() {
        let mut enemies = Roster::new();
        let _ = enemies.push(Enemy::new(EnemyKind::Large));
        let mut writer = GameDataWriter::new(Vec::new(), CURRENT_VERSION).unwrap();
        write_enemies(&mut writer, &enemies).unwrap();
        let mut bytes = writer.into_inner();
        assert_eq!(&bytes[8..12], &ENEMY_FACTORY.get().to_le_bytes());

        let size = BoardSize::new(4, 4);
        let mut reader = GameDataReader::new(bytes.as_slice(), CURRENT_VERSION).unwrap();
        assert_eq!(reader.read_u32().unwrap(), 1);
        assert_eq!(read_enemy(&mut reader, size).unwrap().kind, EnemyKind::Large);

        bytes[8..12].copy_from_slice(&PROJECTILE_FACTORY.get().to_le_bytes());
        let mut reader = GameDataReader::new(bytes.as_slice(), CURRENT_VERSION).unwrap();
        assert_eq!(reader.read_u32().unwrap(), 1);
        assert!(matches!(
            read_enemy(&mut reader, size),
            Err(SaveError::Corrupt(_))
        ));
    }

    #[test]
    fn third_version_records_carry_no_factory_id() {
        let mut projectiles = Roster::new();
        let _ = projectiles.push(Projectile::new());
        let mut writer = GameDataWriter::new(Vec::new(), 3).unwrap();
        write_projectiles(&mut writer, &projectiles).unwrap();
        let bytes = writer.into_inner();

        let mut reader = GameDataReader::new(bytes.as_slice(), CURRENT_VERSION).unwrap();
        assert_eq!(reader.read_u32().unwrap(), 1);
        let arrow = read_projectile(&mut reader).unwrap();
        assert_eq!(arrow.id, Projectile::new().id);
    }

    #[test]
    fn build_orders_must_match_the_contents() {
        let size = BoardSize::new(3, 1);
        let board = Board::restore(
            size,
            &[
                TileContent::SpawnPoint,
                TileContent::PLAIN,
                TileContent::Destination(DestinationKind::Capital),
            ],
        );
        let mut writer = GameDataWriter::new(Vec::new(), CURRENT_VERSION).unwrap();
        write_board(&mut writer, &board).unwrap();
        let mut bytes = writer.into_inner();
        // The spawn point list trails the cells; point its entry at the capital.
        let column = bytes.len() - 4 - 8;
        bytes[column..column + 4].copy_from_slice(&2u32.to_le_bytes());

        let mut reader = GameDataReader::new(bytes.as_slice(), CURRENT_VERSION).unwrap();
        assert!(matches!(read_board(&mut reader), Err(SaveError::Corrupt(_))));
    }

    #[test]
    fn boards_with_unknown_content_are_corrupt() {
        let mut writer = GameDataWriter::new(Vec::new(), CURRENT_VERSION).unwrap();
        writer.write_u32(1).unwrap();
        writer.write_u32(1).unwrap();
        writer.write_bytes(&[200, 0]).unwrap();
        let bytes = writer.into_inner();

        let mut reader = GameDataReader::new(bytes.as_slice(), CURRENT_VERSION).unwrap();
        assert!(matches!(read_board(&mut reader), Err(SaveError::Corrupt(_))));
    }

    #[test]
    fn board_contents_survive_the_byte_block() {
        let size = BoardSize::new(3, 1);
        let contents = [
            TileContent::SpawnPoint,
            TileContent::PLAIN,
            TileContent::Destination(DestinationKind::Capital),
        ];
        let board = Board::restore(size, &contents);
        let mut writer = GameDataWriter::new(Vec::new(), CURRENT_VERSION).unwrap();
        write_board(&mut writer, &board).unwrap();
        let bytes = writer.into_inner();

        let mut reader = GameDataReader::new(bytes.as_slice(), CURRENT_VERSION).unwrap();
        let restored = read_board(&mut reader).unwrap();
        assert!(board_query::contents(&restored).eq(contents));
        assert_eq!(board_query::spawn_points(&restored), &[TileCoord::new(0, 0)]);
    }
}
