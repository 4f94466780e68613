//! Enemies walking the path field.

use std::f32::consts::PI;

use glam::Vec2;
use tile_defence_board::{query as board_query, Board};
use tile_defence_core::{Direction, DirectionChange, EnemyKind, EntityId, Tint, TileCoord};
use tile_defence_system_pool::{Indexed, Origin, Recyclable};

/// Sideways offset beyond which turning speeds stop making sense.
pub(crate) const MAX_PATH_OFFSET: f32 = 0.45;
/// Extra reach per unit of scale when testing whether an enemy is hit.
const TARGET_RADIUS_PER_SCALE: f32 = 0.125;

/// Pooled enemy and its motion between tile exit points.
///
/// An enemy always walks from `position_from` to `position_to` while
/// `progress` runs from zero to one. Whenever it arrives it re-reads the path
/// field of the tile it entered, so edits made mid-walk take effect at the
/// next tile boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub(crate) id: EntityId,
    pub(crate) kind: EnemyKind,
    pub(crate) origin: Origin,
    pub(crate) save_index: usize,
    pub(crate) incarnation: u32,
    pub(crate) age: f32,
    pub(crate) health: f32,
    pub(crate) tint: Tint,
    pub(crate) scale: f32,
    pub(crate) speed: f32,
    pub(crate) path_offset: f32,
    pub(crate) tile_from: TileCoord,
    pub(crate) tile_to: Option<TileCoord>,
    pub(crate) position_from: Vec2,
    pub(crate) position_to: Vec2,
    pub(crate) progress: f32,
    pub(crate) progress_factor: f32,
    pub(crate) direction: Direction,
    pub(crate) direction_change: DirectionChange,
}

/// Outcome of advancing an enemy by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// Still walking.
    Walking,
    /// Walked into a destination.
    Arrived,
    /// Ran out of health.
    Died,
}

impl Enemy {
    pub(crate) fn new(kind: EnemyKind) -> Self {
        Self {
            id: EntityId::new(0),
            kind,
            origin: Origin::default(),
            save_index: 0,
            incarnation: 0,
            age: 0.0,
            health: 0.0,
            tint: Tint::NEUTRAL,
            scale: 1.0,
            speed: 1.0,
            path_offset: 0.0,
            tile_from: TileCoord::new(0, 0),
            tile_to: None,
            position_from: Vec2::ZERO,
            position_to: Vec2::ZERO,
            progress: 0.0,
            progress_factor: 0.0,
            direction: Direction::North,
            direction_change: DirectionChange::None,
        }
    }

    /// Identifier assigned when the enemy spawned.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Kind of the enemy.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Position inside its roster.
    #[must_use]
    pub const fn save_index(&self) -> usize {
        self.save_index
    }

    /// Number of times the instance went back to its factory.
    #[must_use]
    pub const fn incarnation(&self) -> u32 {
        self.incarnation
    }

    /// Seconds since the enemy spawned.
    #[must_use]
    pub const fn age(&self) -> f32 {
        self.age
    }

    /// Remaining health; zero or less means the enemy is dying.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Appearance assigned at spawn.
    #[must_use]
    pub const fn tint(&self) -> Tint {
        self.tint
    }

    /// Body size.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Tile the enemy is leaving.
    #[must_use]
    pub const fn tile_from(&self) -> TileCoord {
        self.tile_from
    }

    /// Tile the enemy is heading for, `None` while it walks into a destination.
    #[must_use]
    pub const fn tile_to(&self) -> Option<TileCoord> {
        self.tile_to
    }

    /// Current heading.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Turn performed on the current leg.
    #[must_use]
    pub const fn direction_change(&self) -> DirectionChange {
        self.direction_change
    }

    /// Fraction of the current leg already walked.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Board-space position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position_from.lerp(self.position_to, self.progress)
    }

    /// Board-space displacement per second along the current leg.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        (self.position_to - self.position_from) * self.progress_factor
    }

    /// Whether towers may aim at the enemy.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Whether the enemy's body overlaps a circle around `point`.
    #[must_use]
    pub fn within(&self, point: Vec2, radius: f32) -> bool {
        let reach = radius + TARGET_RADIUS_PER_SCALE * self.scale;
        self.position().distance_squared(point) <= reach * reach
    }

    pub(crate) fn initialize(
        &mut self,
        id: EntityId,
        tint: Tint,
        scale: f32,
        speed: f32,
        path_offset: f32,
        health: f32,
    ) {
        self.id = id;
        self.tint = tint;
        self.scale = scale;
        self.speed = speed;
        self.path_offset = path_offset.clamp(-MAX_PATH_OFFSET, MAX_PATH_OFFSET);
        self.health = health;
        self.age = 0.0;
    }

    /// Places the enemy on a tile and aims it at that tile's exit point.
    ///
    /// Returns `false` without moving the enemy when the tile has no path.
    pub(crate) fn spawn_on(&mut self, board: &Board, tile: TileCoord) -> bool {
        let (Some(step), Some(start)) = (
            board_query::path_step(board, tile),
            board_query::tile(board, tile),
        ) else {
            return false;
        };
        self.tile_from = tile;
        self.tile_to = Some(step.next);
        self.progress = 0.0;
        self.position_from = start.center();
        self.position_to = step.exit_point;
        self.direction = step.direction;
        self.direction_change = DirectionChange::None;
        self.progress_factor = 2.0 * self.speed;
        true
    }

    pub(crate) fn apply_damage(&mut self, damage: f32) {
        debug_assert!(damage >= 0.0, "negative damage applied");
        self.health -= damage;
    }

    /// Advances the enemy by `dt` seconds of simulated time.
    pub(crate) fn advance(&mut self, board: &Board, dt: f32) -> Step {
        self.age += dt;
        if !self.is_alive() {
            return Step::Died;
        }

        self.progress += dt * self.progress_factor;
        while self.progress >= 1.0 {
            if self.tile_to.is_none() {
                return Step::Arrived;
            }
            self.progress = (self.progress - 1.0) / self.progress_factor;
            self.prepare_next_leg(board);
            self.progress *= self.progress_factor;
        }
        Step::Walking
    }

    fn prepare_next_leg(&mut self, board: &Board) {
        let Some(entered) = self.tile_to else {
            return;
        };
        self.tile_from = entered;
        self.position_from = self.position_to;

        let Some(step) = board_query::path_step(board, entered) else {
            self.prepare_outro(board);
            return;
        };
        self.tile_to = Some(step.next);
        self.position_to = step.exit_point;
        self.direction_change = self.direction.change_to(step.direction);
        self.direction = step.direction;

        let offset = self.path_offset;
        self.progress_factor = match self.direction_change {
            DirectionChange::None => self.speed,
            DirectionChange::TurnRight => self.speed / (PI * 0.5 * (0.5 - offset)),
            DirectionChange::TurnLeft => self.speed / (PI * 0.5 * (0.5 + offset)),
            DirectionChange::TurnAround => self.speed / (PI * offset.abs().max(0.2)),
        };
    }

    fn prepare_outro(&mut self, board: &Board) {
        self.tile_to = None;
        self.position_to = board_query::tile(board, self.tile_from)
            .map_or(self.position_from, |tile| tile.center());
        self.direction_change = DirectionChange::None;
        self.progress_factor = 2.0 * self.speed;
    }
}

impl Recyclable for Enemy {
    type Key = u8;

    fn key(&self) -> u8 {
        self.kind.id()
    }

    fn origin(&self) -> &Origin {
        &self.origin
    }

    fn origin_mut(&mut self) -> &mut Origin {
        &mut self.origin
    }

    fn recycle(&mut self) {
        self.age = 0.0;
        self.health = 0.0;
        self.tile_to = None;
        self.progress = 0.0;
        self.incarnation = self.incarnation.wrapping_add(1);
    }
}

impl Indexed for Enemy {
    fn save_index(&self) -> usize {
        self.save_index
    }

    fn set_save_index(&mut self, index: usize) {
        self.save_index = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_defence_core::{BoardSize, DestinationKind, TileContent};

    fn corridor() -> Board {
        let size = BoardSize::new(4, 1);
        let mut contents = vec![TileContent::PLAIN; 4];
        contents[3] = TileContent::Destination(DestinationKind::Capital);
        contents[0] = TileContent::SpawnPoint;
        Board::restore(size, &contents)
    }

    fn walker(board: &Board, speed: f32) -> Enemy {
        let mut enemy = Enemy::new(EnemyKind::Medium);
        enemy.initialize(EntityId::new(1), Tint::NEUTRAL, 1.0, speed, 0.0, 10.0);
        assert!(enemy.spawn_on(board, TileCoord::new(0, 0)));
        enemy
    }

    #[test]
    fn spawning_aims_at_the_exit_point() {
        let board = corridor();
        let enemy = walker(&board, 1.0);
        assert_eq!(enemy.tile_to(), Some(TileCoord::new(1, 0)));
        assert_eq!(enemy.direction(), Direction::East);
        assert_eq!(enemy.position(), BoardSize::new(4, 1).center_of(TileCoord::new(0, 0)));
        assert_eq!(enemy.velocity(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn walking_the_corridor_reaches_the_capital() {
        let board = corridor();
        let mut enemy = walker(&board, 1.0);
        // Half a tile to the exit, two full tiles, then half a tile into the
        // capital: three seconds at one tile per second.
        assert_eq!(enemy.advance(&board, 1.0), Step::Walking);
        assert_eq!(enemy.tile_from(), TileCoord::new(1, 0));
        assert_eq!(enemy.advance(&board, 1.0), Step::Walking);
        assert_eq!(enemy.tile_from(), TileCoord::new(2, 0));
        assert_eq!(enemy.advance(&board, 0.9), Step::Walking);
        assert_eq!(enemy.tile_to(), None);
        assert_eq!(enemy.advance(&board, 0.2), Step::Arrived);
    }

    #[test]
    fn dying_enemies_stop_walking() {
        let board = corridor();
        let mut enemy = walker(&board, 1.0);
        enemy.apply_damage(10.0);
        let before = enemy.position();
        assert_eq!(enemy.advance(&board, 0.5), Step::Died);
        assert_eq!(enemy.position(), before);
    }

    #[test]
    fn turns_use_their_own_progress_factor() {
        let size = BoardSize::new(2, 2);
        let mut contents = vec![TileContent::PLAIN; 4];
        contents[3] = TileContent::Destination(DestinationKind::Capital);
        contents[2] = TileContent::Wall;
        let board = Board::restore(size, &contents);

        let mut enemy = Enemy::new(EnemyKind::Small);
        enemy.initialize(EntityId::new(2), Tint::NEUTRAL, 1.0, 1.0, 0.1, 10.0);
        assert!(enemy.spawn_on(&board, TileCoord::new(0, 0)));
        assert_eq!(enemy.direction(), Direction::East);

        assert_eq!(enemy.advance(&board, 0.5), Step::Walking);
        assert_eq!(enemy.tile_from(), TileCoord::new(1, 0));
        assert_eq!(enemy.direction_change(), DirectionChange::TurnLeft);
        assert_eq!(enemy.direction(), Direction::North);
        assert!((enemy.progress_factor - 1.0 / (PI * 0.5 * 0.6)).abs() < 1e-5);
    }

    #[test]
    fn recycling_resets_transient_state() {
        let board = corridor();
        let mut enemy = walker(&board, 1.0);
        let _ = enemy.advance(&board, 0.3);
        enemy.recycle();
        assert_eq!(enemy.age(), 0.0);
        assert_eq!(enemy.health(), 0.0);
        assert_eq!(enemy.incarnation(), 1);
    }
}
