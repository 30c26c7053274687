//! Error types for the combat simulation.
//!
//! The tick itself never fails. Errors only come from construction-time
//! resource inconsistencies, bad handles passed in by callers, the pathing
//! collaborator and snapshot encoding.

use thiserror::Error;

use crate::entity::EntityId;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Mech-only command sent to another unit kind.
    #[error("Unit {0} is not a mech")]
    NotAMech(EntityId),

    /// Weapon index outside the unit's armament list.
    #[error("Unit '{unit}' has {count} weapons, no weapon at index {index}")]
    InvalidWeaponIndex {
        /// Name of the unit that was asked to fire.
        unit: String,
        /// Requested armament index.
        index: usize,
        /// Number of mounted weapons.
        count: usize,
    },

    /// A resource description cannot produce a working unit or weapon.
    #[error("Invalid resource '{name}': {reason}")]
    InvalidResource {
        /// Resource name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Position outside the navigation grid.
    #[error("Position ({x:.2}, {y:.2}) is outside the navigation grid")]
    OutsideGrid {
        /// World x.
        x: f64,
        /// World y.
        y: f64,
    },

    /// Start or goal cell cannot be walked on.
    #[error("Cell ({x}, {y}) is blocked")]
    BlockedCell {
        /// Grid x.
        x: u32,
        /// Grid y.
        y: u32,
    },

    /// A* exhausted the open set.
    #[error("No path from ({from_x}, {from_y}) to ({to_x}, {to_y})")]
    NoPath {
        /// Start grid x.
        from_x: u32,
        /// Start grid y.
        from_y: u32,
        /// Goal grid x.
        to_x: u32,
        /// Goal grid y.
        to_y: u32,
    },

    /// Snapshot encode/decode failure.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl SimError {
    /// Shorthand for [`SimError::InvalidResource`].
    pub fn invalid_resource(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResource {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
