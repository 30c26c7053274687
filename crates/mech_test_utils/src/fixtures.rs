//! Test fixtures and helpers.
//!
//! A small standard catalog of weapons and units in RON, plus pre-built
//! battles for consistent testing.

use std::f64::consts::PI;

use glam::DVec2;
use mech_core::battle::{Battle, SpawnParams, TickEvents};
use mech_core::config::SimConfig;
use mech_core::data::{ArmamentData, UnitData, WeaponData};
use mech_core::entity::{Entity, EntityId};
use mech_core::units::Unit;

/// Standard weapons.
pub const WEAPON_CATALOG: &str = r#"[
    WeaponData(
        name: "Medium Laser",
        short_name: "ML",
        tech_base: InnerSphere,
        family: Energy,
        tonnage: 1.0,
        damage: 5.0,
        heat: 3.0,
        distance: 270.0,
        velocity: 1200.0,
        cooldown: 3.0,
    ),
    WeaponData(
        name: "Large Laser",
        short_name: "LL",
        tech_base: InnerSphere,
        family: Energy,
        tonnage: 5.0,
        damage: 8.0,
        heat: 8.0,
        distance: 450.0,
        velocity: 1200.0,
        cooldown: 4.0,
        projectile_radius: 0.2,
    ),
    WeaponData(
        name: "Machine Gun",
        short_name: "MG",
        family: Ballistic,
        tonnage: 0.5,
        damage: 2.0,
        heat: 0.0,
        distance: 90.0,
        velocity: 400.0,
        cooldown: 0.5,
        ammo: Some(WeaponAmmoData(ammo_type: MachineGun, per_ton: 200)),
    ),
    WeaponData(
        name: "Autocannon 5",
        short_name: "AC5",
        tech_base: InnerSphere,
        family: Ballistic,
        tonnage: 8.0,
        damage: 5.0,
        heat: 1.0,
        distance: 540.0,
        velocity: 620.0,
        cooldown: 1.5,
        ammo: Some(WeaponAmmoData(ammo_type: Autocannon5, per_ton: 20)),
    ),
    WeaponData(
        name: "Autocannon 20",
        short_name: "AC20",
        tech_base: InnerSphere,
        family: Ballistic,
        tonnage: 14.0,
        damage: 20.0,
        heat: 6.0,
        distance: 270.0,
        velocity: 650.0,
        cooldown: 4.0,
        projectile_radius: 0.25,
        ammo: Some(WeaponAmmoData(ammo_type: Autocannon20, per_ton: 5)),
    ),
    WeaponData(
        name: "Short Range Missile 6",
        short_name: "SRM6",
        family: Missile,
        tonnage: 3.0,
        damage: 12.0,
        heat: 4.0,
        distance: 270.0,
        extreme_distance: Some(300.0),
        velocity: 200.0,
        cooldown: 4.0,
        projectile_count: 6,
        ammo: Some(WeaponAmmoData(ammo_type: Srm, per_ton: 90)),
        lock_on: Some(LockOnData(turn_rate: 60.0, group_radius: 2.0)),
    ),
    WeaponData(
        name: "Streak Short Range Missile 2",
        short_name: "SSRM2",
        tech_base: InnerSphere,
        family: Missile,
        tonnage: 1.5,
        damage: 4.0,
        heat: 2.0,
        distance: 270.0,
        velocity: 200.0,
        cooldown: 3.0,
        projectile_count: 2,
        projectile_delay: 0.1,
        ammo: Some(WeaponAmmoData(ammo_type: StreakSrm, per_ton: 50)),
        lock_on: Some(LockOnData(required: true, turn_rate: 90.0, group_radius: 1.0)),
    ),
    WeaponData(
        name: "Long Range Missile 10",
        short_name: "LRM10",
        family: Missile,
        tonnage: 5.0,
        damage: 10.0,
        heat: 4.0,
        distance: 630.0,
        velocity: 120.0,
        max_velocity: Some(300.0),
        acceleration: 120.0,
        cooldown: 4.5,
        projectile_count: 10,
        projectile_delay: 0.05,
        ammo: Some(WeaponAmmoData(ammo_type: Lrm, per_ton: 120)),
        lock_on: Some(LockOnData(required: true, turn_rate: 30.0, group_radius: 4.0)),
    ),
]"#;

/// Standard units, unarmed. Weapons are mounted with [`arm`].
pub const UNIT_CATALOG: &str = r#"[
    UnitData(
        name: "Hunchback HBK-4G",
        unit_type: Mech,
        tonnage: 50.0,
        armor: 160.0,
        structure: 83.0,
        speed: 64.8,
        turn_rate: 90.0,
        heat_sinks: 13,
        collision_radius: 3.0,
        collision_height: 10.0,
        cockpit_offset: (0.0, 8.0),
        ammo: [AmmoData(ammo_type: Autocannon20, tons: 2.0)],
    ),
    UnitData(
        name: "Shadow Hawk SHD-2H",
        unit_type: Mech,
        tonnage: 55.0,
        armor: 152.0,
        structure: 91.0,
        speed: 86.4,
        turn_rate: 100.0,
        heat_sinks: 12,
        jump_jets: 3,
        collision_radius: 3.0,
        collision_height: 10.0,
        cockpit_offset: (0.0, 8.0),
        ammo: [
            AmmoData(ammo_type: Autocannon5, tons: 1.0),
            AmmoData(ammo_type: Lrm, tons: 1.0),
        ],
    ),
    UnitData(
        name: "Demolisher",
        unit_type: Vehicle,
        tonnage: 80.0,
        armor: 200.0,
        structure: 80.0,
        speed: 43.2,
        turn_rate: 45.0,
        collision_radius: 3.5,
        collision_height: 4.0,
        cockpit_offset: (0.0, 3.0),
        has_turret: true,
        ammo: [AmmoData(ammo_type: Autocannon20, tons: 2.0)],
    ),
    UnitData(
        name: "Warrior H-7",
        unit_type: Vtol,
        tonnage: 21.0,
        armor: 40.0,
        structure: 21.0,
        speed: 129.6,
        vertical_speed: 36.0,
        collision_radius: 2.5,
        collision_height: 3.0,
        anchor: Center,
        has_turret: true,
        ammo: [
            AmmoData(ammo_type: MachineGun, tons: 0.5),
            AmmoData(ammo_type: StreakSrm, tons: 1.0),
        ],
    ),
    UnitData(
        name: "Foot Platoon",
        unit_type: Infantry,
        tonnage: 3.0,
        armor: 0.0,
        structure: 20.0,
        speed: 10.8,
        turn_rate: 180.0,
        collision_radius: 1.5,
        collision_height: 2.0,
        cockpit_offset: (0.0, 1.5),
        ammo: [AmmoData(ammo_type: MachineGun, tons: 0.5)],
    ),
    UnitData(
        name: "Gun Turret",
        unit_type: Emplacement,
        tonnage: 40.0,
        armor: 120.0,
        structure: 60.0,
        heat_sinks: 10,
        heat_sink_type: Double,
        collision_radius: 2.0,
        collision_height: 5.0,
        cockpit_offset: (0.0, 4.0),
        has_turret: true,
        ammo: [AmmoData(ammo_type: Autocannon5, tons: 1.0)],
    ),
]"#;

/// Parse the standard weapon catalog.
///
/// # Panics
///
/// Panics if the catalog is malformed.
#[must_use]
pub fn weapon_catalog() -> Vec<WeaponData> {
    ron::from_str(WEAPON_CATALOG).expect("weapon catalog should parse")
}

/// Parse the standard unit catalog.
///
/// # Panics
///
/// Panics if the catalog is malformed.
#[must_use]
pub fn unit_catalog() -> Vec<UnitData> {
    ron::from_str(UNIT_CATALOG).expect("unit catalog should parse")
}

/// Look up a catalog weapon by short name.
///
/// # Panics
///
/// Panics if no such weapon exists.
#[must_use]
pub fn weapon(short_name: &str) -> WeaponData {
    weapon_catalog()
        .into_iter()
        .find(|w| w.short_name == short_name)
        .unwrap_or_else(|| panic!("no catalog weapon '{short_name}'"))
}

/// Look up a catalog unit by name, with its standard loadout mounted.
///
/// # Panics
///
/// Panics if no such unit exists.
#[must_use]
pub fn unit(name: &str) -> UnitData {
    let data = unit_catalog()
        .into_iter()
        .find(|u| u.name == name)
        .unwrap_or_else(|| panic!("no catalog unit '{name}'"));
    let loadout: &[(&str, [f64; 2])] = match name {
        "Hunchback HBK-4G" => &[("AC20", [1.5, 0.5]), ("ML", [-1.5, 0.0]), ("ML", [-1.5, -0.5])],
        "Shadow Hawk SHD-2H" => &[("AC5", [1.5, 0.0]), ("LRM10", [-1.0, 1.0]), ("ML", [1.0, -1.0])],
        "Demolisher" => &[("AC20", [-0.5, 0.0]), ("AC20", [0.5, 0.0])],
        "Warrior H-7" => &[("MG", [0.0, -1.0]), ("SSRM2", [0.5, 0.0])],
        "Foot Platoon" => &[("MG", [0.0, 0.0])],
        "Gun Turret" => &[("LL", [-0.5, 0.0]), ("AC5", [0.5, 0.0])],
        _ => &[],
    };
    arm(data, loadout)
}

/// Mount catalog weapons on a unit at the given offsets.
#[must_use]
pub fn arm(mut data: UnitData, loadout: &[(&str, [f64; 2])]) -> UnitData {
    data.armament.extend(loadout.iter().map(|&(short_name, offset)| ArmamentData {
        weapon: weapon(short_name),
        offset,
    }));
    data
}

/// Spawn parameters at a point.
#[must_use]
pub fn placed(x: f64, y: f64, heading: f64, team: u32) -> SpawnParams {
    SpawnParams {
        position: DVec2::new(x, y),
        heading,
        team,
        ..Default::default()
    }
}

/// Two mechs 150 units apart, facing and targeting each other.
///
/// # Panics
///
/// Panics if the catalog units fail to build.
#[must_use]
pub fn duel(seed: u64) -> (Battle, EntityId, EntityId) {
    let mut battle = Battle::new(SimConfig::default(), seed);
    let a = battle
        .spawn_from_data(&unit("Hunchback HBK-4G"), placed(0.0, 0.0, 0.0, 1))
        .expect("hunchback");
    let b = battle
        .spawn_from_data(&unit("Shadow Hawk SHD-2H"), placed(150.0, 0.0, PI, 2))
        .expect("shadow hawk");
    battle.set_target(a, Some(b)).expect("attacker exists");
    battle.set_target(b, Some(a)).expect("defender exists");
    (battle, a, b)
}

/// Every unit kind on two teams, each targeting its nearest enemy.
///
/// # Panics
///
/// Panics if the catalog units fail to build.
#[must_use]
pub fn skirmish(seed: u64) -> Battle {
    let mut battle = Battle::new(SimConfig::default(), seed);
    let roster = [
        ("Hunchback HBK-4G", placed(0.0, 0.0, 0.0, 1)),
        ("Demolisher", placed(0.0, 25.0, 0.0, 1)),
        ("Foot Platoon", placed(20.0, -20.0, 0.0, 1)),
        ("Shadow Hawk SHD-2H", placed(200.0, 0.0, PI, 2)),
        ("Warrior H-7", placed(180.0, 30.0, PI, 2)),
        ("Gun Turret", placed(220.0, -30.0, PI, 2)),
    ];
    for (name, params) in roster {
        battle.spawn_from_data(&unit(name), params).expect(name);
    }
    retarget(&mut battle);
    battle
}

/// Point every unit without a live target at its nearest enemy.
pub fn retarget(battle: &mut Battle) {
    for id in battle.units().sorted_ids() {
        let Some(unit) = battle.unit(id) else {
            continue;
        };
        if unit.target().is_some_and(|t| battle.unit(t).is_some()) {
            continue;
        }
        let team = unit.unit().team;
        let position = unit.position();
        let nearest = battle
            .units()
            .sorted_ids()
            .into_iter()
            .filter_map(|other| battle.unit(other).map(|u| (other, u)))
            .filter(|(_, u)| u.unit().team != team)
            .min_by(|(_, a), (_, b)| {
                a.position()
                    .distance_squared(position)
                    .total_cmp(&b.position().distance_squared(position))
            })
            .map(|(other, _)| other);
        let _ = battle.set_target(id, nearest);
    }
}

/// Retarget, aim, queue every ready weapon, then advance one tick.
pub fn fire_at_will(battle: &mut Battle) -> TickEvents {
    retarget(battle);
    for id in battle.units().sorted_ids() {
        aim_at_target(battle, id);
        let _ = battle.queue_ready_weapons(id);
    }
    battle.tick()
}

/// Turn a unit (or its turret) toward its target.
pub fn aim_at_target(battle: &mut Battle, id: EntityId) {
    let Some(target) = battle.unit(id).and_then(Unit::target) else {
        return;
    };
    let Some(aim) = battle.unit(target).map(Entity::position) else {
        return;
    };
    let Some(unit) = battle.unit_mut(id) else {
        return;
    };
    let bearing = mech_core::math::heading_to(unit.position(), aim);
    let turn = mech_core::math::angle_distance(unit.heading(), bearing);
    if unit.unit().has_turret {
        unit.set_turret_angle(turn);
    } else {
        unit.set_target_relative_heading(turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mech_core::units::UnitType;

    #[test]
    fn test_catalogs_parse() {
        assert_eq!(weapon_catalog().len(), 8);
        let units = unit_catalog();
        assert_eq!(units.len(), 6);
        assert!(units.iter().any(|u| u.unit_type == UnitType::Emplacement));
    }

    #[test]
    fn test_every_catalog_unit_builds() {
        let config = SimConfig::default();
        for data in unit_catalog() {
            let armed = unit(&data.name);
            assert!(!armed.armament.is_empty(), "{} is unarmed", data.name);
            mech_core::units::UnitVariant::from_data(&armed, &config)
                .unwrap_or_else(|e| panic!("{}: {e}", data.name));
        }
    }

    #[test]
    fn test_duel_setup() {
        let (battle, a, b) = duel(1);
        assert_eq!(battle.unit(a).unwrap().target(), Some(b));
        assert_eq!(battle.unit(b).unwrap().target(), Some(a));
    }

    #[test]
    fn test_skirmish_targets_enemies() {
        let battle = skirmish(1);
        for (_, unit) in battle.units().iter() {
            let target = battle.unit(unit.target().unwrap()).unwrap();
            assert_ne!(target.unit().team, unit.unit().team);
        }
    }
}
