#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation context for Tile Defence.
//!
//! A [`Game`] owns the board, the wallet, every live entity, and the random
//! stream that drives spawning and targeting. All mutation flows through
//! [`apply`]; collaborators read the state through [`query`].
//!
//! A tick runs its phases in a fixed order: towers aim and fire, enemies walk,
//! arrows land, the deferred removals are committed, the wallet collects
//! income, and finally the scenario releases the enemies that came due. Board
//! edits run between ticks, so entities always read a settled path field.

mod config;
mod enemy;
mod projectile;
mod save;
mod tower;

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tile_defence_board::{query as board_query, Board};
use tile_defence_core::{
    BoardSize, Command, EnemyKind, EntityId, Event, FactoryId, GameSpeed, GroundKind,
    PlacementError, Stock, TileContent, TileCoord, Tint,
};
use tile_defence_system_economy::{Cost, Wallet};
use tile_defence_system_pool::{Factory, Roster};
use tile_defence_system_spawning::{Milestone, Scenario};
use tracing::{debug, info};

pub use config::{ArcherStats, EnemyStats, EnemyTable, GameConfig, LaserStats, TowerTable};
pub use enemy::Enemy;
pub use projectile::Projectile;
pub use save::CURRENT_VERSION;
pub use tile_defence_system_persistence::SaveError;
pub use tile_defence_system_spawning::ScenarioConfig;
pub use tower::TowerState;

use enemy::Step;
use projectile::ARROW;

const ENEMY_FACTORY: FactoryId = FactoryId::new(2);
const PROJECTILE_FACTORY: FactoryId = FactoryId::new(3);

/// Running totals kept for reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Enemies that entered the board.
    pub enemies_spawned: u64,
    /// Enemies whose health ran out.
    pub enemies_killed: u64,
    /// Enemies that walked into a destination.
    pub enemies_arrived: u64,
    /// Arrows launched by archer towers.
    pub arrows_launched: u64,
}

/// Complete simulation state.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    board: Board,
    enemy_factory: Factory<Enemy>,
    projectile_factory: Factory<Projectile>,
    enemies: Roster<Enemy>,
    projectiles: Roster<Projectile>,
    towers: Vec<TowerState>,
    wallet: Wallet,
    rng: ChaCha8Rng,
    speed: GameSpeed,
    tick: u64,
    next_entity: u32,
    statistics: Statistics,
    scenario: Option<Scenario>,
    scenario_completed: bool,
}

impl Game {
    /// Creates a game on a freshly generated map.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        let mut board = Board::new(BoardSize::new(config.columns, config.rows));
        let _ = board.generate_map(&config.generator);
        Self::with_board(config, board)
    }

    /// Creates a game around an existing board.
    ///
    /// The wallet starts with the configured stocks and the random stream
    /// with the configured seed.
    #[must_use]
    pub fn with_board(config: GameConfig, board: Board) -> Self {
        let mut game = Self {
            board,
            enemy_factory: Factory::new(ENEMY_FACTORY),
            projectile_factory: Factory::new(PROJECTILE_FACTORY),
            enemies: Roster::new(),
            projectiles: Roster::new(),
            towers: Vec::new(),
            wallet: Wallet::new(config.economy.starting),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            speed: GameSpeed::Playing,
            tick: 0,
            next_entity: 1,
            statistics: Statistics::default(),
            scenario: config.scenario.clone().map(Scenario::new),
            scenario_completed: false,
            config,
        };
        game.refresh_board_state();
        game
    }

    fn refresh_board_state(&mut self) {
        tower::sync(&mut self.towers, &self.board);
        let gathering = board_query::gathering(&self.board);
        self.wallet.set_income(
            gathering.into_iter().map(|(_, stock, count)| (stock, count)),
            self.config.economy.gathering_rate,
        );
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.wrapping_add(1);
        id
    }

    fn edit(&mut self, command: Command, out_events: &mut Vec<Event>) {
        let purchase = match command {
            Command::PlaceBuilding { tile, content } if content.is_buildable() => {
                Some((tile, content))
            }
            Command::PlaceBridge { tile } => Some((tile, TileContent::Ground(GroundKind::Bridge))),
            _ => None,
        };
        let price = purchase.and_then(|(tile, content)| {
            self.config
                .economy
                .costs
                .cost_of(content)
                .map(|cost| (tile, content, cost))
        });
        if let Some((tile, content, cost)) = price {
            if !self.wallet.can_afford(&cost) {
                debug!(?tile, ?content, ?cost, "construction unaffordable");
                out_events.push(Event::PlacementRejected {
                    tile,
                    content,
                    reason: PlacementError::InsufficientFunds,
                });
                return;
            }
        }

        let first = out_events.len();
        tile_defence_board::apply(&mut self.board, command, out_events);

        let mut changed = false;
        for event in &out_events[first..] {
            match *event {
                Event::BuildingPlaced { .. } | Event::BridgePlaced { .. } => {
                    if let Some((_, _, cost)) = price {
                        let paid = self.wallet.spend(&cost);
                        debug_assert!(paid.is_ok(), "price was checked before the edit");
                    }
                    changed = true;
                }
                Event::Demolished { previous, .. } => {
                    let salvage = self.config.economy.salvage(previous);
                    self.wallet.earn(&salvage);
                    changed = true;
                }
                _ => {}
            }
        }
        if changed {
            self.refresh_board_state();
        }
    }

    fn spawn_enemy(
        &mut self,
        spawn_point: TileCoord,
        kind: EnemyKind,
        tint: Tint,
        out_events: &mut Vec<Event>,
    ) {
        let is_spawn_point =
            board_query::content(&self.board, spawn_point) == Some(TileContent::SpawnPoint);
        if !is_spawn_point || board_query::path_step(&self.board, spawn_point).is_none() {
            debug!(?spawn_point, "spawn point cannot release enemies");
            out_events.push(Event::SpawnRejected { spawn_point });
            return;
        }

        let stats = *self.config.enemies.stats(kind);
        let variance = stats.speed_variance.clamp(0.0, 0.9);
        let speed =
            (stats.speed * self.rng.gen_range(1.0 - variance..=1.0 + variance)).max(0.01);
        let offset_limit = stats.path_offset.abs().min(enemy::MAX_PATH_OFFSET);
        let path_offset = self.rng.gen_range(-offset_limit..=offset_limit);

        let id = self.allocate_id();
        let mut enemy = self.enemy_factory.get_with(kind.id(), || Enemy::new(kind));
        enemy.initialize(id, tint, stats.scale, speed, path_offset, stats.health);
        if !enemy.spawn_on(&self.board, spawn_point) {
            self.enemy_factory.reclaim(enemy);
            out_events.push(Event::SpawnRejected { spawn_point });
            return;
        }
        let _ = self.enemies.push(enemy);
        self.statistics.enemies_spawned += 1;
        debug!(entity = id.get(), ?kind, ?spawn_point, speed, "enemy spawned");
        out_events.push(Event::EnemySpawned {
            entity: id,
            kind,
            tile: spawn_point,
        });
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let scaled = dt.mul_f64(f64::from(self.speed.time_scale()));
        self.tick += 1;
        out_events.push(Event::TimeAdvanced { dt: scaled });
        let seconds = scaled.as_secs_f32();
        if seconds <= 0.0 {
            return;
        }

        let mut launches = Vec::new();
        tower::update(
            &mut self.towers,
            &mut self.enemies,
            &self.config.towers,
            &mut self.rng,
            seconds,
            &mut launches,
        );
        let archer = self.config.towers.archer;
        for launch in launches {
            let id = self.allocate_id();
            let mut arrow = self.projectile_factory.get_with(ARROW, Projectile::new);
            arrow.launch(
                id,
                launch.from,
                launch.to,
                archer.shell_speed,
                archer.blast_radius,
                archer.shell_damage,
            );
            let _ = self.projectiles.push(arrow);
            self.statistics.arrows_launched += 1;
        }

        for index in 0..self.enemies.len() {
            let Some(enemy) = self.enemies.get_mut(index) else {
                continue;
            };
            match enemy.advance(&self.board, seconds) {
                Step::Walking => {}
                Step::Arrived => {
                    let entity = enemy.id();
                    self.enemies.mark_for_removal(index);
                    self.statistics.enemies_arrived += 1;
                    debug!(entity = entity.get(), "enemy reached a destination");
                    out_events.push(Event::EnemyReachedDestination { entity });
                }
                Step::Died => {
                    let (entity, kind) = (enemy.id(), enemy.kind());
                    self.enemies.mark_for_removal(index);
                    let bounty = self.config.economy.bounties.for_kind(kind);
                    self.wallet.earn(&Cost::of(Stock::Gold, bounty));
                    self.statistics.enemies_killed += 1;
                    debug!(entity = entity.get(), ?kind, bounty, "enemy killed");
                    out_events.push(Event::EnemyKilled { entity, kind });
                }
            }
        }

        for index in 0..self.projectiles.len() {
            let Some(arrow) = self.projectiles.get_mut(index) else {
                continue;
            };
            if arrow.advance(seconds) {
                let (point, radius, damage) = (arrow.target_point, arrow.blast_radius, arrow.damage);
                projectile::explode(&mut self.enemies, point, radius, damage);
                self.projectiles.mark_for_removal(index);
            }
        }

        for enemy in self.enemies.commit() {
            self.enemy_factory.reclaim(enemy);
        }
        for arrow in self.projectiles.commit() {
            self.projectile_factory.reclaim(arrow);
        }
        self.wallet.collect(seconds);
        self.run_scenario(scaled, out_events);
    }

    fn run_scenario(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(scenario) = self.scenario.as_mut() else {
            return;
        };
        let mut commands = Vec::new();
        let mut milestones = Vec::new();
        scenario.handle(
            &[Event::TimeAdvanced { dt }],
            board_query::spawn_points(&self.board),
            &mut commands,
            &mut milestones,
        );
        let exhausted = scenario.is_exhausted();

        for milestone in milestones {
            if let Milestone::WaveStarted { cycle, wave } = milestone {
                out_events.push(Event::WaveStarted { cycle, wave });
            }
        }
        for command in commands {
            if let Command::SpawnEnemy {
                spawn_point,
                kind,
                tint,
            } = command
            {
                self.spawn_enemy(spawn_point, kind, tint, out_events);
            }
        }

        if exhausted && !self.scenario_completed && self.enemies.is_empty() {
            self.scenario_completed = true;
            info!(tick = self.tick, "scenario completed");
            out_events.push(Event::ScenarioCompleted);
        }
    }
}

/// Applies a command to the game, reporting the outcome through events.
pub fn apply(game: &mut Game, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => game.advance(dt, out_events),
        Command::SetGameSpeed { speed } => {
            game.speed = speed;
            out_events.push(Event::GameSpeedChanged { speed });
        }
        Command::SpawnEnemy {
            spawn_point,
            kind,
            tint,
        } => game.spawn_enemy(spawn_point, kind, tint, out_events),
        edit @ (Command::PlaceBuilding { .. }
        | Command::PlaceBridge { .. }
        | Command::Demolish { .. }
        | Command::ToggleSpawnPoint { .. }) => game.edit(edit, out_events),
    }
}

/// Query functions that provide read-only access to the game.
pub mod query {
    use tile_defence_board::Board;
    use tile_defence_core::{EntityId, GameSpeed};
    use tile_defence_system_economy::Wallet;

    use tile_defence_system_spawning::Scenario;

    use super::{Enemy, Game, GameConfig, Projectile, Statistics, TowerState};

    /// Board the game is played on.
    #[must_use]
    pub fn board(game: &Game) -> &Board {
        &game.board
    }

    /// Configuration the game was started with.
    #[must_use]
    pub fn config(game: &Game) -> &GameConfig {
        &game.config
    }

    /// Live enemies in roster order.
    pub fn enemies(game: &Game) -> impl Iterator<Item = &Enemy> + '_ {
        game.enemies.iter()
    }

    /// Live enemy with the provided identifier.
    #[must_use]
    pub fn enemy(game: &Game, id: EntityId) -> Option<&Enemy> {
        game.enemies.iter().find(|enemy| enemy.id() == id)
    }

    /// Arrows in flight in roster order.
    pub fn projectiles(game: &Game) -> impl Iterator<Item = &Projectile> + '_ {
        game.projectiles.iter()
    }

    /// Towers standing on the board in placement order.
    #[must_use]
    pub fn towers(game: &Game) -> &[TowerState] {
        &game.towers
    }

    /// Stocks and income of the player.
    #[must_use]
    pub fn wallet(game: &Game) -> &Wallet {
        &game.wallet
    }

    /// Active simulation speed.
    #[must_use]
    pub fn speed(game: &Game) -> GameSpeed {
        game.speed
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick(game: &Game) -> u64 {
        game.tick
    }

    /// Running totals of the session.
    #[must_use]
    pub fn statistics(game: &Game) -> Statistics {
        game.statistics
    }

    /// Wave scenario driving the spawns, if the game runs one.
    #[must_use]
    pub fn scenario(game: &Game) -> Option<&Scenario> {
        game.scenario.as_ref()
    }

    /// Whether the scenario ran out and its last enemy left the board.
    #[must_use]
    pub fn scenario_completed(game: &Game) -> bool {
        game.scenario_completed
    }

    /// Enemy instances constructed rather than reused from the pool.
    #[must_use]
    pub fn enemies_created(game: &Game) -> u64 {
        game.enemy_factory.created()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_defence_core::{DestinationKind, TowerKind};

    fn corridor_game(config: GameConfig) -> Game {
        let size = BoardSize::new(6, 1);
        let mut contents = vec![TileContent::PLAIN; 6];
        contents[0] = TileContent::SpawnPoint;
        contents[5] = TileContent::Destination(DestinationKind::Capital);
        Game::with_board(config, Board::restore(size, &contents))
    }

    fn tick(game: &mut Game, seconds: f32) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            game,
            Command::Tick {
                dt: Duration::from_secs_f32(seconds),
            },
            &mut events,
        );
        events
    }

    fn spawn(game: &mut Game, kind: EnemyKind) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            game,
            Command::SpawnEnemy {
                spawn_point: TileCoord::new(0, 0),
                kind,
                tint: Tint::NEUTRAL,
            },
            &mut events,
        );
        events
    }

    #[test]
    fn paused_ticks_count_but_freeze_entities() {
        let mut game = corridor_game(GameConfig::default());
        let _ = spawn(&mut game, EnemyKind::Medium);
        let before = query::enemies(&game).next().unwrap().position();

        let mut events = Vec::new();
        apply(
            &mut game,
            Command::SetGameSpeed {
                speed: GameSpeed::Paused,
            },
            &mut events,
        );
        let events = tick(&mut game, 1.0);
        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                dt: Duration::ZERO
            }]
        );
        assert_eq!(query::tick(&game), 1);
        assert_eq!(query::enemies(&game).next().unwrap().position(), before);
    }

    #[test]
    fn spawning_requires_a_spawn_point_with_a_path() {
        let mut game = corridor_game(GameConfig::default());
        let mut events = Vec::new();
        apply(
            &mut game,
            Command::SpawnEnemy {
                spawn_point: TileCoord::new(2, 0),
                kind: EnemyKind::Small,
                tint: Tint::NEUTRAL,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SpawnRejected {
                spawn_point: TileCoord::new(2, 0)
            }]
        );

        let events = spawn(&mut game, EnemyKind::Small);
        assert!(matches!(
            events.as_slice(),
            [Event::EnemySpawned {
                kind: EnemyKind::Small,
                ..
            }]
        ));
        assert_eq!(query::statistics(&game).enemies_spawned, 1);
    }

    #[test]
    fn enemies_walk_into_the_capital_and_return_to_the_pool() {
        let mut game = corridor_game(GameConfig::default());
        let _ = spawn(&mut game, EnemyKind::Medium);
        let mut arrived = false;
        for _ in 0..200 {
            let events = tick(&mut game, 0.1);
            if events
                .iter()
                .any(|event| matches!(event, Event::EnemyReachedDestination { .. }))
            {
                arrived = true;
                break;
            }
        }
        assert!(arrived);
        assert_eq!(query::enemies(&game).count(), 0);
        assert_eq!(query::statistics(&game).enemies_arrived, 1);

        let _ = spawn(&mut game, EnemyKind::Medium);
        assert_eq!(query::enemies_created(&game), 1, "the dead enemy was reused");
    }

    #[test]
    fn unaffordable_buildings_are_rejected_before_the_board_is_touched() {
        let mut config = GameConfig::default();
        config.economy.starting = Cost::FREE;
        let mut game = corridor_game(config);
        let mut events = Vec::new();
        apply(
            &mut game,
            Command::PlaceBuilding {
                tile: TileCoord::new(2, 0),
                content: TileContent::Tower(TowerKind::Laser),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::PlacementRejected {
                tile: TileCoord::new(2, 0),
                content: TileContent::Tower(TowerKind::Laser),
                reason: PlacementError::InsufficientFunds,
            }]
        );
        assert_eq!(
            board_query::content(query::board(&game), TileCoord::new(2, 0)),
            Some(TileContent::PLAIN)
        );
    }

    #[test]
    fn lasers_kill_enemies_for_gold_and_demolition_refunds_half() {
        let mut config = GameConfig::default();
        config.enemies.small.health = 0.5;
        let size = BoardSize::new(6, 2);
        let mut contents = vec![TileContent::PLAIN; size.tile_count()];
        contents[0] = TileContent::SpawnPoint;
        contents[5] = TileContent::Destination(DestinationKind::Capital);
        let mut game = Game::with_board(config, Board::restore(size, &contents));

        let tower = TileCoord::new(2, 1);
        let mut events = Vec::new();
        apply(
            &mut game,
            Command::PlaceBuilding {
                tile: tower,
                content: TileContent::Tower(TowerKind::Laser),
            },
            &mut events,
        );
        assert!(matches!(events[0], Event::BuildingPlaced { .. }));
        assert_eq!(query::towers(&game).len(), 1);
        assert_eq!(query::wallet(&game).amount(Stock::Metal), 16.0);

        let _ = spawn(&mut game, EnemyKind::Small);
        let events = tick(&mut game, 0.1);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::EnemyKilled { kind: EnemyKind::Small, .. })));
        assert_eq!(query::wallet(&game).amount(Stock::Gold), 1.0);
        assert_eq!(query::statistics(&game).enemies_killed, 1);

        let mut events = Vec::new();
        apply(&mut game, Command::Demolish { tile: tower }, &mut events);
        assert!(matches!(events[0], Event::Demolished { .. }));
        assert!(query::towers(&game).is_empty());
        assert_eq!(query::wallet(&game).amount(Stock::Metal), 18.0);
    }
}
