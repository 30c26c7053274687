//! Short-lived shots spawned by weapons.
//!
//! A weapon builds one template [`Projectile`] at construction; every launch
//! clones it, positions the clone and reseeds its private RNG. Projectiles
//! never share a random source with anything else, so a parallel
//! per-entity update pass would not contend on randomness.

use std::f64::consts::PI;

use glam::{DVec2, DVec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityState};
use crate::math::{angle_distance, approach, clamp_angle, direction, random_range, ray_endpoint};
use crate::weapon::WeaponFamily;

/// Lifespan sentinel set by [`Projectile::destroy`].
pub const DESTROYED_LIFESPAN: f64 = -1.0;

/// Missile guidance parameters, already in world units and ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockOn {
    /// Whether the launcher refuses to fire without a target.
    pub required: bool,
    /// Max heading/pitch change per tick, radians.
    pub turn_rate: f64,
    /// Aim-point spread radius, world units.
    pub group_radius: f64,
}

/// What fired a projectile, kept for classification and guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponTag {
    /// Weapon family.
    pub family: WeaponFamily,
    /// Short weapon name.
    pub short_name: String,
    /// Guidance, for lock-on missiles.
    pub lock_on: Option<LockOn>,
}

/// A projectile in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    /// Spatial record. `velocity` is distance per tick.
    pub entity: EntityState,
    /// Damage before extreme-range falloff.
    base_damage: f64,
    /// Speed cap for accelerating projectiles.
    pub max_velocity: f64,
    /// Speed gained per tick.
    pub acceleration: f64,
    /// Ticks remaining. Exactly [`DESTROYED_LIFESPAN`] once destroyed.
    lifespan: f64,
    /// Ticks of extended flight granted when the lifespan first runs out.
    extreme_lifespan: f64,
    in_extreme_range: bool,
    /// Owning team, for friendly-fire exclusion.
    pub team: u32,
    /// Originating weapon.
    pub weapon: Option<WeaponTag>,
    /// Guidance target.
    pub target: Option<EntityId>,
    lock_on_offset: Option<DVec3>,
    rng: ChaCha8Rng,
}

impl Projectile {
    /// Create a projectile with the given damage, speed and lifespans (ticks).
    #[must_use]
    pub fn new(damage: f64, velocity: f64, lifespan: f64, extreme_lifespan: f64) -> Self {
        let entity = EntityState {
            velocity,
            ..Default::default()
        };
        Self {
            entity,
            base_damage: damage,
            max_velocity: velocity,
            acceleration: 0.0,
            lifespan,
            extreme_lifespan: extreme_lifespan.max(0.0),
            in_extreme_range: false,
            team: 0,
            weapon: None,
            target: None,
            lock_on_offset: None,
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }

    /// Builder method to set collision geometry.
    #[must_use]
    pub fn with_collision(mut self, radius: f64, height: f64) -> Self {
        self.entity = self.entity.with_collision(radius, height);
        self
    }

    /// Builder method to set acceleration and top speed.
    #[must_use]
    pub fn with_acceleration(mut self, acceleration: f64, max_velocity: f64) -> Self {
        self.acceleration = acceleration;
        self.max_velocity = max_velocity;
        self
    }

    /// Builder method to tag the originating weapon.
    #[must_use]
    pub fn with_weapon(mut self, weapon: WeaponTag) -> Self {
        self.weapon = Some(weapon);
        self
    }

    /// Replace the private random source.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.lock_on_offset = None;
    }

    /// Ticks remaining.
    #[must_use]
    pub fn lifespan(&self) -> f64 {
        self.lifespan
    }

    /// Extended flight ticks.
    #[must_use]
    pub fn extreme_lifespan(&self) -> f64 {
        self.extreme_lifespan
    }

    /// Whether the projectile has entered extreme range.
    #[must_use]
    pub fn in_extreme_range(&self) -> bool {
        self.in_extreme_range
    }

    /// Damage before falloff.
    #[must_use]
    pub fn base_damage(&self) -> f64 {
        self.base_damage
    }

    /// Count down the lifespan.
    ///
    /// The first time it runs out, the extreme lifespan is added back and the
    /// projectile enters extreme range for good. Results never drop below 0.
    pub fn decrease_lifespan(&mut self, amount: f64) {
        if self.lifespan <= 0.0 || amount <= 0.0 {
            return;
        }
        self.lifespan -= amount;
        if self.lifespan <= 0.0 && self.extreme_lifespan > 0.0 && !self.in_extreme_range {
            self.lifespan += self.extreme_lifespan;
            self.in_extreme_range = true;
        }
        if self.lifespan < 0.0 {
            self.lifespan = 0.0;
        }
    }

    /// Damage on impact, decaying linearly to zero across extreme range.
    #[must_use]
    pub fn damage(&self) -> f64 {
        if self.in_extreme_range && self.lifespan >= 0.0 && self.extreme_lifespan > 0.0 {
            (self.lifespan / self.extreme_lifespan * self.base_damage).max(0.0)
        } else {
            self.base_damage
        }
    }

    /// Mark as destroyed. Distinct from natural expiry at 0.
    pub fn destroy(&mut self) {
        self.lifespan = DESTROYED_LIFESPAN;
    }

    /// True after [`destroy`](Self::destroy).
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.lifespan == DESTROYED_LIFESPAN
    }

    /// True once the projectile should leave the battle.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.lifespan <= 0.0
    }

    /// Guidance parameters when this is a lock-on missile.
    #[must_use]
    pub fn lock_on(&self) -> Option<LockOn> {
        self.weapon
            .as_ref()
            .filter(|w| w.family == WeaponFamily::Missile)
            .and_then(|w| w.lock_on)
    }

    /// Random aim-point perturbation, computed on first use and memoized.
    ///
    /// Zero for anything that is not a lock-on missile.
    pub fn lock_on_offset(&mut self) -> DVec3 {
        if let Some(offset) = self.lock_on_offset {
            return offset;
        }
        let offset = match self.lock_on() {
            Some(lock) => {
                let radius = random_range(&mut self.rng, -lock.group_radius, lock.group_radius);
                let heading = random_range(&mut self.rng, -PI, PI);
                let pitch = random_range(&mut self.rng, -PI, PI);
                ray_endpoint(radius, heading, pitch)
            }
            None => DVec3::ZERO,
        };
        self.lock_on_offset = Some(offset);
        offset
    }

    /// Advance one tick: accelerate, steer toward `target` if guided, move,
    /// then spend one tick of lifespan.
    pub fn update(&mut self, target: Option<DVec3>) {
        if self.acceleration > 0.0 {
            self.entity.velocity =
                approach(self.entity.velocity, self.max_velocity, self.acceleration);
        }

        if let (Some(lock), Some(target)) = (self.lock_on(), target) {
            let aim = target + self.lock_on_offset();
            self.steer_toward(aim, lock.turn_rate);
        }

        let v = self.entity.velocity;
        let pitch = self.entity.pitch;
        let horizontal = direction(self.entity.heading) * (v * pitch.cos());
        self.entity.position += horizontal;
        self.entity.position_z += v * pitch.sin();

        self.decrease_lifespan(1.0);
    }

    fn steer_toward(&mut self, aim: DVec3, turn_rate: f64) {
        let delta = aim - self.entity.position_3d();
        let flat = DVec2::new(delta.x, delta.y);
        if flat.length_squared() > 0.0 {
            let want = delta.y.atan2(delta.x);
            let turn = angle_distance(self.entity.heading, want).clamp(-turn_rate, turn_rate);
            self.entity.set_heading(self.entity.heading + turn);
        }
        let want_pitch = delta.z.atan2(flat.length());
        let climb = (want_pitch - self.entity.pitch).clamp(-turn_rate, turn_rate);
        self.entity.pitch = clamp_angle(self.entity.pitch + climb);
    }
}

impl Entity for Projectile {
    fn entity(&self) -> &EntityState {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut EntityState {
        &mut self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missile(group_radius: f64) -> Projectile {
        Projectile::new(2.0, 1.0, 60.0, 60.0).with_weapon(WeaponTag {
            family: WeaponFamily::Missile,
            short_name: "LRM-5".into(),
            lock_on: Some(LockOn {
                required: false,
                turn_rate: 0.05,
                group_radius,
            }),
        })
    }

    #[test]
    fn test_lifespan_enters_extreme_range_once() {
        let mut p = Projectile::new(10.0, 1.0, 50.0, 100.0);
        p.decrease_lifespan(50.0);
        assert_eq!(p.lifespan(), 100.0);
        assert!(p.in_extreme_range());

        p.decrease_lifespan(100.0);
        assert_eq!(p.lifespan(), 0.0);
        assert!(p.in_extreme_range());

        p.decrease_lifespan(1.0);
        assert_eq!(p.lifespan(), 0.0);
    }

    #[test]
    fn test_overshoot_carries_into_extreme_range() {
        let mut p = Projectile::new(10.0, 1.0, 5.0, 100.0);
        p.decrease_lifespan(7.0);
        assert_eq!(p.lifespan(), 98.0);
    }

    #[test]
    fn test_no_extreme_range_clamps_to_zero() {
        let mut p = Projectile::new(10.0, 1.0, 5.0, 0.0);
        p.decrease_lifespan(7.0);
        assert_eq!(p.lifespan(), 0.0);
        assert!(!p.in_extreme_range());
        assert!(p.is_spent());
        assert!(!p.is_destroyed());
    }

    #[test]
    fn test_extreme_range_damage_falloff() {
        let mut p = Projectile::new(10.0, 1.0, 50.0, 100.0);
        assert_eq!(p.damage(), 10.0);

        p.decrease_lifespan(50.0);
        assert_eq!(p.damage(), 10.0);

        p.decrease_lifespan(50.0);
        assert_eq!(p.damage(), 5.0);

        p.decrease_lifespan(50.0);
        assert_eq!(p.damage(), 0.0);
    }

    #[test]
    fn test_destroy_sentinel() {
        let mut p = Projectile::new(10.0, 1.0, 50.0, 100.0);
        p.destroy();
        assert_eq!(p.lifespan(), DESTROYED_LIFESPAN);
        assert!(p.is_destroyed());
        assert!(p.is_spent());

        // destroyed projectiles no longer count down
        p.decrease_lifespan(1.0);
        assert_eq!(p.lifespan(), DESTROYED_LIFESPAN);
    }

    #[test]
    fn test_lock_on_offset_is_memoized_and_bounded() {
        let mut p = missile(3.0);
        p.reseed(42);
        let first = p.lock_on_offset();
        assert!(first.length() <= 3.0 + 1e-9);
        assert_eq!(p.lock_on_offset(), first);
    }

    #[test]
    fn test_lock_on_offset_depends_only_on_own_seed() {
        let mut a = missile(3.0);
        let mut b = missile(3.0);
        a.reseed(7);
        b.reseed(7);
        assert_eq!(a.lock_on_offset(), b.lock_on_offset());

        let mut c = missile(3.0);
        c.reseed(8);
        assert_ne!(a.lock_on_offset(), c.lock_on_offset());
    }

    #[test]
    fn test_non_missile_offset_is_zero() {
        let mut p = Projectile::new(5.0, 1.0, 10.0, 10.0);
        assert_eq!(p.lock_on_offset(), DVec3::ZERO);

        let mut laser = Projectile::new(5.0, 1.0, 10.0, 10.0).with_weapon(WeaponTag {
            family: WeaponFamily::Energy,
            short_name: "ML".into(),
            lock_on: None,
        });
        assert_eq!(laser.lock_on_offset(), DVec3::ZERO);
    }

    #[test]
    fn test_update_moves_along_heading() {
        let mut p = Projectile::new(5.0, 2.0, 10.0, 0.0);
        p.entity.set_heading(PI / 2.0);
        p.update(None);
        assert!(p.entity.position.x.abs() < 1e-9);
        assert!((p.entity.position.y - 2.0).abs() < 1e-9);
        assert_eq!(p.lifespan(), 9.0);
    }

    #[test]
    fn test_update_accelerates_to_cap() {
        let mut p = Projectile::new(5.0, 1.0, 10.0, 0.0).with_acceleration(0.75, 2.0);
        p.update(None);
        assert_eq!(p.entity.velocity, 1.75);
        p.update(None);
        assert_eq!(p.entity.velocity, 2.0);
    }

    #[test]
    fn test_guided_missile_turns_toward_target() {
        let mut p = missile(0.0);
        p.reseed(1);
        let target = DVec3::new(0.0, 100.0, 0.0);
        p.update(Some(target));
        assert!((p.entity.heading - 0.05).abs() < 1e-9);
    }
}
