//! Tuning tables read from configuration files.

use serde::{Deserialize, Serialize};
use tile_defence_core::{EnemyKind, GeneratorParams, TowerKind};
use tile_defence_system_economy::EconomyConfig;
use tile_defence_system_spawning::ScenarioConfig;

/// Everything needed to start a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board width in tiles.
    pub columns: u32,
    /// Board height in tiles.
    pub rows: u32,
    /// Seed of the simulation's random stream.
    pub seed: u64,
    /// Map generator tuning.
    pub generator: GeneratorParams,
    /// Wallet, prices, and refunds.
    pub economy: EconomyConfig,
    /// Per-kind enemy statistics.
    pub enemies: EnemyTable,
    /// Per-kind tower statistics.
    pub towers: TowerTable,
    /// Waves released by the game itself; without one, enemies only enter
    /// through explicit spawn commands.
    pub scenario: Option<ScenarioConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            columns: 24,
            rows: 20,
            seed: 0,
            generator: GeneratorParams::default(),
            economy: EconomyConfig::default(),
            enemies: EnemyTable::default(),
            towers: TowerTable::default(),
            scenario: None,
        }
    }
}

/// Statistics rolled for a freshly spawned enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyStats {
    /// Body size; larger enemies are easier to keep tracked.
    pub scale: f32,
    /// Tiles walked per second.
    pub speed: f32,
    /// Relative spread applied to the speed of each spawn.
    pub speed_variance: f32,
    /// Largest sideways offset from the path centre line, in tiles.
    pub path_offset: f32,
    /// Starting health.
    pub health: f32,
}

impl Default for EnemyStats {
    fn default() -> Self {
        Self {
            scale: 1.0,
            speed: 1.0,
            speed_variance: 0.1,
            path_offset: 0.25,
            health: 30.0,
        }
    }
}

/// Statistics of every enemy kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    /// Small enemies.
    pub small: EnemyStats,
    /// Medium enemies.
    pub medium: EnemyStats,
    /// Large enemies.
    pub large: EnemyStats,
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            small: EnemyStats {
                scale: 0.5,
                speed: 1.5,
                health: 10.0,
                ..EnemyStats::default()
            },
            medium: EnemyStats::default(),
            large: EnemyStats {
                scale: 1.2,
                speed: 0.6,
                health: 80.0,
                ..EnemyStats::default()
            },
        }
    }
}

impl EnemyTable {
    /// Statistics of the provided kind.
    #[must_use]
    pub const fn stats(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Small => &self.small,
            EnemyKind::Medium => &self.medium,
            EnemyKind::Large => &self.large,
        }
    }
}

/// Laser tower tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserStats {
    /// Targeting range in tiles.
    pub range: f32,
    /// Damage dealt to the tracked target per second.
    pub damage_per_second: f32,
}

impl Default for LaserStats {
    fn default() -> Self {
        Self {
            range: TowerKind::Laser.range_in_tiles(),
            damage_per_second: 10.0,
        }
    }
}

/// Archer tower tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcherStats {
    /// Targeting range in tiles.
    pub range: f32,
    /// Arrows launched per second while a target is in range.
    pub shots_per_second: f32,
    /// Radius around the impact point that takes damage.
    pub blast_radius: f32,
    /// Damage dealt to every enemy caught in the blast.
    pub shell_damage: f32,
    /// Tiles an arrow covers per second.
    pub shell_speed: f32,
}

impl Default for ArcherStats {
    fn default() -> Self {
        Self {
            range: TowerKind::Archer.range_in_tiles(),
            shots_per_second: 2.0,
            blast_radius: 0.5,
            shell_damage: 3.0,
            shell_speed: 6.0,
        }
    }
}

/// Statistics of every tower kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerTable {
    /// Laser towers.
    pub laser: LaserStats,
    /// Archer towers.
    pub archer: ArcherStats,
}

impl TowerTable {
    /// Targeting range of the provided kind.
    #[must_use]
    pub const fn range(&self, kind: TowerKind) -> f32 {
        match kind {
            TowerKind::Laser => self.laser.range,
            TowerKind::Archer => self.archer.range,
        }
    }
}
