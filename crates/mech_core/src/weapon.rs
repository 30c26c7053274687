//! Mounted weapons: cooldown, salvo timing, missile tubes and the projectile
//! template each launch is cloned from.
//!
//! Projectile kinematics are derived once, in [`Weapon::from_data`]:
//!
//! ```text
//! velocity per tick  = velocity / meters_per_unit / tick_rate
//! lifespan (ticks)   = distance / velocity × tick_rate
//! extreme lifespan   = (extreme − distance) / velocity × tick_rate   energy
//!                    =  extreme             / velocity × tick_rate   ballistic, missile
//! damage per shot    = damage / projectile_count
//! ```
//!
//! Energy weapons store the extra flight time past optimal range, while
//! ballistic and missile weapons store the full extreme-range flight time.
//! The two are kept as-is per family.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::data::{WeaponAmmoData, WeaponData};
use crate::entity::EntityId;
use crate::error::{Result, SimError};
use crate::projectile::{LockOn, Projectile, WeaponTag};

/// Weapon family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponFamily {
    /// Lasers, PPCs. No ammunition.
    Energy,
    /// Autocannons, gauss rifles, machine guns.
    Ballistic,
    /// Missile launchers.
    Missile,
}

/// Technology base a weapon belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TechBase {
    /// Clan technology.
    Clan,
    /// Inner Sphere technology.
    InnerSphere,
    /// Usable by both.
    #[default]
    Common,
}

/// Family-specific weapon state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Energy weapon.
    Energy,
    /// Ballistic weapon.
    Ballistic,
    /// Missile launcher with its tube grid.
    Missile(MissileLauncher),
}

impl WeaponKind {
    /// The family this state belongs to.
    #[must_use]
    pub fn family(&self) -> WeaponFamily {
        match self {
            Self::Energy => WeaponFamily::Energy,
            Self::Ballistic => WeaponFamily::Ballistic,
            Self::Missile(_) => WeaponFamily::Missile,
        }
    }
}

/// Missile tubes and lock-on settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissileLauncher {
    /// Guidance, when the launcher fires lock-on missiles.
    pub lock_on: Option<LockOn>,
    tube_offsets: Vec<DVec2>,
    missile_tube: usize,
}

impl MissileLauncher {
    /// Lay out `count` tubes `spacing` apart, centered on the mount point.
    #[must_use]
    pub fn new(count: u32, spacing: f64, lock_on: Option<LockOn>) -> Self {
        Self {
            lock_on,
            tube_offsets: tube_grid(count, spacing),
            missile_tube: 0,
        }
    }

    /// Precomputed tube offsets, row-major.
    #[must_use]
    pub fn tube_offsets(&self) -> &[DVec2] {
        &self.tube_offsets
    }

    /// Index of the tube the next missile launches from.
    #[must_use]
    pub fn missile_tube(&self) -> usize {
        self.missile_tube
    }

    /// Offset of the next tube, then advance, wrapping to the first tube.
    pub fn next_tube(&mut self) -> DVec2 {
        let Some(&offset) = self.tube_offsets.get(self.missile_tube) else {
            return DVec2::ZERO;
        };
        self.missile_tube += 1;
        if self.missile_tube >= self.tube_offsets.len() {
            self.missile_tube = 0;
        }
        offset
    }
}

/// Rows used to arrange `count` missile tubes.
#[must_use]
pub fn tube_rows(count: u32) -> u32 {
    match count {
        2 => 1,
        4..=9 => 2,
        19 => 3,
        c if c >= 20 => 4,
        c => f64::from(c).sqrt().ceil() as u32,
    }
}

/// Tube offsets for a launcher, centered on (0, 0). Empty for single tubes.
///
/// `x` is lateral, `y` is vertical.
#[must_use]
pub fn tube_grid(count: u32, spacing: f64) -> Vec<DVec2> {
    if count <= 1 {
        return Vec::new();
    }
    let rows = tube_rows(count);
    let cols = count.div_ceil(rows);
    let center_col = f64::from(cols - 1) / 2.0;
    let center_row = f64::from(rows - 1) / 2.0;

    let mut offsets = Vec::with_capacity(count as usize);
    'rows: for row in 0..rows {
        for col in 0..cols {
            if offsets.len() == count as usize {
                break 'rows;
            }
            offsets.push(DVec2::new(
                (f64::from(col) - center_col) * spacing,
                (center_row - f64::from(row)) * spacing,
            ));
        }
    }
    offsets
}

/// Projectiles still to launch from the current trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Salvo {
    remaining: u32,
    delay: f64,
}

/// Where and for whom a projectile is launched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    /// Cockpit position in world units.
    pub origin: DVec2,
    /// Cockpit elevation.
    pub origin_z: f64,
    /// Firing heading.
    pub heading: f64,
    /// Firing pitch.
    pub pitch: f64,
    /// Firing unit.
    pub parent: EntityId,
    /// Firing unit's team.
    pub team: u32,
    /// Guidance target.
    pub target: Option<EntityId>,
    /// Seed for the projectile's private RNG.
    pub seed: u64,
}

/// One mounted weapon instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    /// Display name.
    pub name: String,
    /// Short display name.
    pub short_name: String,
    /// Technology base.
    pub tech_base: TechBase,
    /// Mass in tons.
    pub tonnage: f64,
    /// Damage per trigger, before division across projectiles.
    pub damage: f64,
    /// Heat added to the firing unit per trigger.
    pub heat: f64,
    /// Optimal range in meters.
    pub distance: f64,
    /// Extreme range in meters.
    pub extreme_distance: f64,
    /// Projectile speed in meters per second.
    pub velocity: f64,
    /// Mount offset relative to the cockpit (lateral, vertical), world units.
    pub offset: DVec2,
    /// Projectiles per trigger.
    pub projectile_count: u32,
    /// Ticks between projectiles of one salvo.
    pub projectile_delay: f64,
    /// Ammunition drawn per projectile.
    pub ammo: Option<WeaponAmmoData>,
    cooldown: f64,
    max_cooldown: f64,
    kind: WeaponKind,
    projectile: Projectile,
    salvo: Option<Salvo>,
}

impl Weapon {
    /// Build a weapon and its projectile template from a resource description.
    ///
    /// `offset` is the mount point relative to the cockpit, in meters.
    pub fn from_data(data: &WeaponData, offset: [f64; 2], config: &SimConfig) -> Result<Self> {
        if data.projectile_count == 0 {
            return Err(SimError::invalid_resource(&data.name, "projectile_count is 0"));
        }
        if data.velocity <= 0.0 {
            return Err(SimError::invalid_resource(&data.name, "velocity must be positive"));
        }
        if data.distance <= 0.0 {
            return Err(SimError::invalid_resource(&data.name, "distance must be positive"));
        }

        let extreme_distance = data.effective_extreme_distance();
        let lifespan = config.ticks(data.distance / data.velocity);
        let extreme_lifespan = match data.family {
            WeaponFamily::Energy => {
                config.ticks((extreme_distance - data.distance).max(0.0) / data.velocity)
            }
            WeaponFamily::Ballistic | WeaponFamily::Missile => {
                config.ticks(extreme_distance / data.velocity)
            }
        };
        let damage = if data.projectile_count > 1 {
            data.damage / f64::from(data.projectile_count)
        } else {
            data.damage
        };

        let velocity = config.velocity_per_tick(data.velocity);
        let max_velocity = config.velocity_per_tick(data.max_velocity.unwrap_or(data.velocity));
        let acceleration = config.velocity_per_tick(data.acceleration) / f64::from(config.tick_rate);
        let radius = config.meters_to_units(data.projectile_radius);
        let height = config.meters_to_units(data.projectile_height);

        let lock_on = data.lock_on.map(|l| LockOn {
            required: l.required,
            turn_rate: l.turn_rate.to_radians() / f64::from(config.tick_rate),
            group_radius: config.meters_to_units(l.group_radius),
        });
        let kind = match data.family {
            WeaponFamily::Energy => WeaponKind::Energy,
            WeaponFamily::Ballistic => WeaponKind::Ballistic,
            WeaponFamily::Missile => {
                WeaponKind::Missile(MissileLauncher::new(data.projectile_count, 2.0 * radius, lock_on))
            }
        };

        let projectile = Projectile::new(damage, velocity, lifespan, extreme_lifespan)
            .with_collision(radius, height)
            .with_acceleration(acceleration, max_velocity.max(velocity))
            .with_weapon(WeaponTag {
                family: data.family,
                short_name: data.short_name.clone(),
                lock_on: if data.family == WeaponFamily::Missile {
                    lock_on
                } else {
                    None
                },
            });

        Ok(Self {
            name: data.name.clone(),
            short_name: data.short_name.clone(),
            tech_base: data.tech_base,
            tonnage: data.tonnage,
            damage: data.damage,
            heat: data.heat,
            distance: data.distance,
            extreme_distance,
            velocity: data.velocity,
            offset: DVec2::from(offset) / config.meters_per_unit,
            projectile_count: data.projectile_count,
            projectile_delay: config.ticks(data.projectile_delay.max(0.0)),
            ammo: data.ammo.filter(|_| data.uses_ammo()),
            cooldown: 0.0,
            max_cooldown: config.ticks(data.cooldown.max(0.0)),
            kind,
            projectile,
            salvo: None,
        })
    }

    /// Weapon family.
    #[must_use]
    pub fn family(&self) -> WeaponFamily {
        self.kind.family()
    }

    /// Family-specific state.
    #[must_use]
    pub fn kind(&self) -> &WeaponKind {
        &self.kind
    }

    /// Missile launcher state, for missile weapons.
    #[must_use]
    pub fn launcher(&self) -> Option<&MissileLauncher> {
        match &self.kind {
            WeaponKind::Missile(launcher) => Some(launcher),
            _ => None,
        }
    }

    /// Guidance settings, for lock-on missile weapons.
    #[must_use]
    pub fn lock_on(&self) -> Option<LockOn> {
        self.launcher().and_then(|l| l.lock_on)
    }

    /// The template every launch is cloned from.
    #[must_use]
    pub fn projectile(&self) -> &Projectile {
        &self.projectile
    }

    /// Ticks until the weapon can fire again.
    #[must_use]
    pub fn cooldown(&self) -> f64 {
        self.cooldown
    }

    /// Cooldown applied on each trigger.
    #[must_use]
    pub fn max_cooldown(&self) -> f64 {
        self.max_cooldown
    }

    /// Remaining cooldown as a fraction, for HUD bars.
    #[must_use]
    pub fn cooldown_ratio(&self) -> f64 {
        if self.max_cooldown <= 0.0 {
            0.0
        } else {
            self.cooldown / self.max_cooldown
        }
    }

    /// True when the weapon can be triggered.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    /// Start a firing cycle. Fails with no side effect while cooling down.
    ///
    /// Heat is the firing unit's concern; see
    /// [`Unit::trigger_weapon`](crate::units::Unit::trigger_weapon).
    pub fn trigger(&mut self) -> bool {
        if self.cooldown > 0.0 {
            return false;
        }
        self.cooldown = self.max_cooldown;
        self.salvo = Some(Salvo {
            remaining: self.projectile_count,
            delay: 0.0,
        });
        true
    }

    /// Count the cooldown down, clamped at 0.
    pub fn decrease_cooldown(&mut self, amount: f64) {
        if self.cooldown > 0.0 && amount > 0.0 {
            self.cooldown = (self.cooldown - amount).max(0.0);
        }
    }

    /// True while a salvo still has projectiles to launch.
    #[must_use]
    pub fn salvo_pending(&self) -> bool {
        self.salvo.is_some()
    }

    /// Projectiles left and ticks until the next launch, while a salvo runs.
    #[must_use]
    pub fn salvo(&self) -> Option<(u32, f64)> {
        self.salvo.as_ref().map(|s| (s.remaining, s.delay))
    }

    /// Drop any unlaunched projectiles of the current salvo.
    pub fn cancel_salvo(&mut self) {
        self.salvo = None;
    }

    /// Number of projectiles due to launch this tick. Call once per tick.
    pub fn due_launches(&mut self) -> u32 {
        let Some(salvo) = self.salvo.as_mut() else {
            return 0;
        };
        let mut due = 0;
        while salvo.remaining > 0 && salvo.delay <= 0.0 {
            due += 1;
            salvo.remaining -= 1;
            salvo.delay += self.projectile_delay;
        }
        salvo.delay -= 1.0;
        if salvo.remaining == 0 {
            self.salvo = None;
        }
        due
    }

    /// Clone the template into a live projectile at the next mount point.
    pub fn spawn_projectile(&mut self, launch: &Launch) -> Projectile {
        let mut mount = self.offset;
        if let WeaponKind::Missile(launcher) = &mut self.kind {
            mount += launcher.next_tube();
        }

        // lateral offset runs to the right of the heading
        let right = DVec2::new(launch.heading.sin(), -launch.heading.cos());

        let mut projectile = self.projectile.clone();
        projectile.entity.position = launch.origin + right * mount.x;
        projectile.entity.position_z = launch.origin_z + mount.y;
        projectile.entity.set_heading(launch.heading);
        projectile.entity.pitch = launch.pitch;
        projectile.entity.parent = Some(launch.parent);
        projectile.team = launch.team;
        projectile.target = launch.target;
        projectile.reseed(launch.seed);
        projectile
    }
}
