//! Per-tower targeting and firing state.

use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tile_defence_board::{query as board_query, Board};
use tile_defence_core::{EntityId, TileContent, TileCoord, TowerKind};
use tile_defence_system_pool::Roster;

use crate::{config::TowerTable, enemy::Enemy};

/// Launch progress kept while an archer waits for a target.
const READY_TO_FIRE: f32 = 0.999;

/// Live state of a tower standing on the board.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerState {
    pub(crate) coord: TileCoord,
    pub(crate) kind: TowerKind,
    pub(crate) center: Vec2,
    pub(crate) target: Option<EntityId>,
    pub(crate) launch_progress: f32,
}

impl TowerState {
    fn new(board: &Board, coord: TileCoord, kind: TowerKind) -> Self {
        Self {
            coord,
            kind,
            center: board_query::size(board).center_of(coord),
            target: None,
            launch_progress: 0.0,
        }
    }

    /// Tile the tower stands on.
    #[must_use]
    pub const fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Kind of the tower.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Enemy the tower keeps tracking between ticks.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Fraction of the next archer shot that has been loaded.
    #[must_use]
    pub const fn launch_progress(&self) -> f32 {
        self.launch_progress
    }
}

/// Arrow requested by an archer during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Launch {
    pub(crate) from: Vec2,
    pub(crate) to: Vec2,
}

fn acquire(
    center: Vec2,
    range: f32,
    enemies: &Roster<Enemy>,
    rng: &mut ChaCha8Rng,
) -> Option<usize> {
    let candidates: Vec<usize> = enemies
        .iter()
        .filter(|enemy| enemy.is_alive() && enemy.within(center, range))
        .map(Enemy::save_index)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}

fn track(tower: &mut TowerState, range: f32, enemies: &Roster<Enemy>) -> Option<usize> {
    let id = tower.target?;
    let tracked = enemies
        .iter()
        .find(|enemy| enemy.id() == id)
        .filter(|enemy| enemy.is_alive() && enemy.within(tower.center, range))
        .map(Enemy::save_index);
    if tracked.is_none() {
        tower.target = None;
    }
    tracked
}

/// Lets every tower aim and fire for `dt` seconds.
///
/// Lasers burn their tracked target directly; archers queue launches for the
/// caller to turn into projectiles.
pub(crate) fn update(
    towers: &mut [TowerState],
    enemies: &mut Roster<Enemy>,
    table: &TowerTable,
    rng: &mut ChaCha8Rng,
    dt: f32,
    launches: &mut Vec<Launch>,
) {
    for tower in towers {
        match tower.kind {
            TowerKind::Laser => {
                let range = table.laser.range;
                let target = track(tower, range, enemies)
                    .or_else(|| acquire(tower.center, range, enemies, rng));
                let Some(index) = target else {
                    continue;
                };
                let Some(enemy) = enemies.get_mut(index) else {
                    continue;
                };
                tower.target = Some(enemy.id());
                enemy.apply_damage(table.laser.damage_per_second * dt);
            }
            TowerKind::Archer => {
                let stats = &table.archer;
                tower.launch_progress += stats.shots_per_second * dt;
                while tower.launch_progress >= 1.0 {
                    let aimed = acquire(tower.center, stats.range, enemies, rng);
                    let Some(enemy) = aimed.and_then(|index| enemies.get(index)) else {
                        tower.launch_progress = READY_TO_FIRE;
                        break;
                    };
                    let position = enemy.position();
                    let flight = tower.center.distance(position) / stats.shell_speed.max(f32::EPSILON);
                    launches.push(Launch {
                        from: tower.center,
                        to: position + enemy.velocity() * flight,
                    });
                    tower.launch_progress -= 1.0;
                }
            }
        }
    }
}

/// Matches the tower list to the towers standing on the board, keeping the
/// state of towers that survived the edit.
pub(crate) fn sync(towers: &mut Vec<TowerState>, board: &Board) {
    let mut previous = std::mem::take(towers);
    for &coord in board_query::updating_tiles(board) {
        let Some(TileContent::Tower(kind)) = board_query::content(board, coord) else {
            continue;
        };
        let state = previous
            .iter()
            .position(|state| state.coord == coord && state.kind == kind)
            .map(|index| previous.swap_remove(index))
            .unwrap_or_else(|| TowerState::new(board, coord, kind));
        towers.push(state);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use tile_defence_core::{BoardSize, DestinationKind, EnemyKind, Tint};

    use super::*;

    fn board() -> Board {
        let size = BoardSize::new(5, 3);
        let mut contents = vec![TileContent::PLAIN; size.tile_count()];
        contents[4] = TileContent::Destination(DestinationKind::Capital);
        contents[0] = TileContent::SpawnPoint;
        contents[7] = TileContent::Tower(TowerKind::Laser);
        contents[12] = TileContent::Tower(TowerKind::Archer);
        Board::restore(size, &contents)
    }

    fn enemies_on(board: &Board, health: f32) -> Roster<Enemy> {
        let mut roster = Roster::new();
        let mut enemy = Enemy::new(EnemyKind::Medium);
        enemy.initialize(EntityId::new(9), Tint::NEUTRAL, 1.0, 1.0, 0.0, health);
        assert!(enemy.spawn_on(board, TileCoord::new(0, 0)));
        let _ = roster.push(enemy);
        roster
    }

    #[test]
    fn towers_follow_the_board() {
        let board = board();
        let mut towers = Vec::new();
        sync(&mut towers, &board);
        assert_eq!(towers.len(), 2);
        towers[0].launch_progress = 0.5;
        let kept = towers[0].coord;

        sync(&mut towers, &board);
        let same = towers.iter().find(|tower| tower.coord == kept).unwrap();
        assert_eq!(same.launch_progress, 0.5);
    }

    #[test]
    fn lasers_track_and_burn_their_target() {
        let board = board();
        let mut towers = Vec::new();
        sync(&mut towers, &board);
        let mut enemies = enemies_on(&board, 30.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut launches = Vec::new();
        let table = TowerTable::default();

        update(&mut towers, &mut enemies, &table, &mut rng, 0.5, &mut launches);
        let laser = towers.iter().find(|tower| tower.kind == TowerKind::Laser).unwrap();
        assert_eq!(laser.target, Some(EntityId::new(9)));
        assert!((enemies.get(0).unwrap().health() - 25.0).abs() < 1e-4);
        assert_eq!(launches.len(), 1, "two shots per second fill one launch in half a second");
    }

    #[test]
    fn idle_archers_hold_their_shot() {
        let board = board();
        let mut towers = Vec::new();
        sync(&mut towers, &board);
        let mut enemies = Roster::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut launches = Vec::new();

        update(&mut towers, &mut enemies, &TowerTable::default(), &mut rng, 3.0, &mut launches);
        let archer = towers.iter().find(|tower| tower.kind == TowerKind::Archer).unwrap();
        assert_eq!(archer.launch_progress, READY_TO_FIRE);
        assert!(launches.is_empty());
    }
}
