//! Spatial and vital-stats record shared by every simulated object.
//!
//! Units and projectiles embed an [`EntityState`] by value and expose it
//! through the [`Entity`] trait. References to other entities (`parent`,
//! `target`) are plain [`EntityId`] handles resolved through the battle
//! arena, so holding one never keeps the referenced entity alive.

use std::fmt;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::math::clamp_angle;

/// Non-owning handle to an entity in the battle arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How an entity's collision volume hangs off its elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Anchor {
    /// Volume starts at the elevation and extends upward.
    #[default]
    Bottom,
    /// Volume is centered on the elevation.
    Center,
    /// Volume hangs below the elevation.
    Top,
}

/// Position, orientation, motion and damage state common to all entities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityState {
    /// Horizontal position in world units.
    pub position: DVec2,
    /// Elevation above ground in world units.
    pub position_z: f64,
    /// Vertical alignment of the collision volume.
    pub anchor: Anchor,
    /// Facing in radians, (-π, π].
    pub heading: f64,
    /// Pitch in radians, positive up.
    pub pitch: f64,
    /// Speed along `heading` in world units per tick.
    pub velocity: f64,
    /// Vertical speed in world units per tick.
    pub velocity_z: f64,
    /// Collision cylinder radius.
    pub collision_radius: f64,
    /// Collision cylinder height.
    pub collision_height: f64,
    /// Armor points, kept within `[0, max_armor]`.
    pub armor: f64,
    /// Armor capacity.
    pub max_armor: f64,
    /// Internal structure. May go negative; callers judge destruction.
    pub structure: f64,
    /// Structure capacity.
    pub max_structure: f64,
    /// Entity that spawned this one, if any.
    pub parent: Option<EntityId>,
}

impl EntityState {
    /// Create an entity at full armor and structure.
    #[must_use]
    pub fn new(position: DVec2, armor: f64, structure: f64) -> Self {
        Self {
            position,
            armor,
            max_armor: armor,
            structure,
            max_structure: structure,
            ..Default::default()
        }
    }

    /// Builder method to set collision geometry.
    #[must_use]
    pub fn with_collision(mut self, radius: f64, height: f64) -> Self {
        self.collision_radius = radius.max(0.0);
        self.collision_height = height.max(0.0);
        self
    }

    /// Builder method to set the anchor.
    #[must_use]
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Apply damage armor-first; any overflow past zero armor lands on structure.
    ///
    /// Structure is not floored. A unit with 5 armor hit for 8 ends with
    /// 0 armor and 3 less structure.
    pub fn apply_damage(&mut self, amount: f64) {
        if self.armor > 0.0 {
            self.armor -= amount;
            if self.armor < 0.0 {
                self.structure += self.armor;
                self.armor = 0.0;
            }
        } else {
            self.structure -= amount;
        }
    }

    /// Set heading, wrapped into (-π, π].
    pub fn set_heading(&mut self, heading: f64) {
        self.heading = clamp_angle(heading);
    }

    /// Position including elevation.
    #[must_use]
    pub fn position_3d(&self) -> DVec3 {
        self.position.extend(self.position_z)
    }

    /// Lowest and highest elevation covered by the collision volume.
    #[must_use]
    pub fn vertical_extent(&self) -> (f64, f64) {
        let z = self.position_z;
        let h = self.collision_height;
        match self.anchor {
            Anchor::Bottom => (z, z + h),
            Anchor::Center => (z - h / 2.0, z + h / 2.0),
            Anchor::Top => (z - h, z),
        }
    }

    /// Armor remaining as a fraction of capacity.
    #[must_use]
    pub fn armor_ratio(&self) -> f64 {
        if self.max_armor <= 0.0 {
            0.0
        } else {
            self.armor / self.max_armor
        }
    }

    /// Structure remaining as a fraction of capacity (may be negative).
    #[must_use]
    pub fn structure_ratio(&self) -> f64 {
        if self.max_structure <= 0.0 {
            0.0
        } else {
            self.structure / self.max_structure
        }
    }

    /// True once structure has reached zero.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.structure <= 0.0
    }
}

/// Capability set of anything that lives in the battle space.
pub trait Entity {
    /// Shared entity record.
    fn entity(&self) -> &EntityState;

    /// Mutable shared entity record.
    fn entity_mut(&mut self) -> &mut EntityState;

    /// Apply damage armor-first. See [`EntityState::apply_damage`].
    fn apply_damage(&mut self, amount: f64) {
        self.entity_mut().apply_damage(amount);
    }

    /// Horizontal position.
    fn position(&self) -> DVec2 {
        self.entity().position
    }

    /// Elevation.
    fn position_z(&self) -> f64 {
        self.entity().position_z
    }

    /// Facing.
    fn heading(&self) -> f64 {
        self.entity().heading
    }

    /// Parent handle.
    fn parent(&self) -> Option<EntityId> {
        self.entity().parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_entity(armor: f64, structure: f64) -> EntityState {
        EntityState::new(DVec2::ZERO, armor, structure)
    }

    #[test]
    fn test_damage_within_armor() {
        let mut e = test_entity(10.0, 20.0);
        e.apply_damage(4.0);
        assert_eq!(e.armor, 6.0);
        assert_eq!(e.structure, 20.0);
    }

    #[test]
    fn test_damage_overflows_to_structure() {
        let mut e = test_entity(5.0, 20.0);
        e.apply_damage(8.0);
        assert_eq!(e.armor, 0.0);
        assert_eq!(e.structure, 17.0);
    }

    #[test]
    fn test_damage_without_armor_hits_structure() {
        let mut e = test_entity(0.0, 3.0);
        e.apply_damage(5.0);
        assert_eq!(e.armor, 0.0);
        assert_eq!(e.structure, -2.0);
        assert!(e.is_destroyed());
    }

    #[test]
    fn test_vertical_extent_by_anchor() {
        let mut e = test_entity(1.0, 1.0).with_collision(0.5, 2.0);
        e.position_z = 1.0;
        assert_eq!(e.vertical_extent(), (1.0, 3.0));
        e.anchor = Anchor::Center;
        assert_eq!(e.vertical_extent(), (0.0, 2.0));
        e.anchor = Anchor::Top;
        assert_eq!(e.vertical_extent(), (-1.0, 1.0));
    }

    #[test]
    fn test_ratios() {
        let mut e = test_entity(40.0, 20.0);
        e.apply_damage(50.0);
        assert_eq!(e.armor_ratio(), 0.0);
        assert_eq!(e.structure_ratio(), 0.5);
    }

    #[test]
    fn test_clone_keeps_parent_handle() {
        let mut e = test_entity(1.0, 1.0);
        e.parent = Some(EntityId(9));
        let mut copy = e.clone();
        copy.apply_damage(1.0);
        assert_eq!(copy.parent, Some(EntityId(9)));
        assert_eq!(e.armor, 1.0);
    }
}
