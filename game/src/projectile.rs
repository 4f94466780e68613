//! Arrows launched by archer towers.

use glam::Vec2;
use tile_defence_core::EntityId;
use tile_defence_system_pool::{Indexed, Origin, Recyclable, Roster};

use crate::enemy::Enemy;

/// Pool key shared by every arrow.
pub(crate) const ARROW: u8 = 0;

/// Pooled arrow flying from its tower toward an impact point.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub(crate) id: EntityId,
    pub(crate) origin: Origin,
    pub(crate) save_index: usize,
    pub(crate) incarnation: u32,
    pub(crate) age: f32,
    pub(crate) launch_point: Vec2,
    pub(crate) target_point: Vec2,
    pub(crate) flight_time: f32,
    pub(crate) blast_radius: f32,
    pub(crate) damage: f32,
}

impl Projectile {
    pub(crate) fn new() -> Self {
        Self {
            id: EntityId::new(0),
            origin: Origin::default(),
            save_index: 0,
            incarnation: 0,
            age: 0.0,
            launch_point: Vec2::ZERO,
            target_point: Vec2::ZERO,
            flight_time: 0.0,
            blast_radius: 0.0,
            damage: 0.0,
        }
    }

    pub(crate) fn launch(
        &mut self,
        id: EntityId,
        launch_point: Vec2,
        target_point: Vec2,
        speed: f32,
        blast_radius: f32,
        damage: f32,
    ) {
        self.id = id;
        self.age = 0.0;
        self.launch_point = launch_point;
        self.target_point = target_point;
        self.flight_time = launch_point.distance(target_point) / speed.max(f32::EPSILON);
        self.blast_radius = blast_radius;
        self.damage = damage;
    }

    /// Identifier assigned at launch.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Seconds since launch.
    #[must_use]
    pub const fn age(&self) -> f32 {
        self.age
    }

    /// Point the arrow explodes at.
    #[must_use]
    pub const fn target_point(&self) -> Vec2 {
        self.target_point
    }

    /// Board-space position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        if self.flight_time <= 0.0 {
            return self.target_point;
        }
        self.launch_point
            .lerp(self.target_point, (self.age / self.flight_time).min(1.0))
    }

    /// Advances the flight, returning whether the arrow has landed.
    pub(crate) fn advance(&mut self, dt: f32) -> bool {
        self.age += dt;
        self.age >= self.flight_time
    }
}

/// Damages every living enemy caught in the blast around `point`.
pub(crate) fn explode(enemies: &mut Roster<Enemy>, point: Vec2, radius: f32, damage: f32) {
    for enemy in enemies.iter_mut() {
        if enemy.is_alive() && enemy.within(point, radius) {
            enemy.apply_damage(damage);
        }
    }
}

impl Recyclable for Projectile {
    type Key = u8;

    fn key(&self) -> u8 {
        ARROW
    }

    fn origin(&self) -> &Origin {
        &self.origin
    }

    fn origin_mut(&mut self) -> &mut Origin {
        &mut self.origin
    }

    fn recycle(&mut self) {
        self.age = 0.0;
        self.incarnation = self.incarnation.wrapping_add(1);
    }
}

impl Indexed for Projectile {
    fn save_index(&self) -> usize {
        self.save_index
    }

    fn set_save_index(&mut self, index: usize) {
        self.save_index = index;
    }
}
