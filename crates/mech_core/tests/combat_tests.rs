//! Battle-level combat tests using the standard catalog.
//!
//! Unit tests cover each state machine in isolation; these drive whole
//! battles through the public API and check the rules still hold when
//! everything runs together.

use std::collections::BTreeMap;

use mech_core::prelude::*;
use mech_test_utils::determinism::apply_order;
use mech_test_utils::determinism::strategies::{arb_armor, arb_damage, arb_order_sequence};
use mech_test_utils::fixtures::{duel, fire_at_will, skirmish};
use proptest::prelude::*;

fn teams(battle: &Battle) -> BTreeMap<EntityId, u32> {
    battle
        .units()
        .iter()
        .map(|(&id, unit)| (id, unit.unit().team))
        .collect()
}

// =============================================================================
// Damage
// =============================================================================

proptest! {
    #[test]
    fn test_damage_hits_armor_before_structure(
        armor in arb_armor(),
        structure in 1.0f64..500.0,
        damage in arb_damage(),
    ) {
        let mut entity = EntityState::new(Default::default(), armor, structure);
        entity.apply_damage(damage);

        prop_assert!(entity.armor >= 0.0);
        if armor > 0.0 {
            prop_assert_eq!(entity.armor, (armor - damage).max(0.0));
            let overflow = (damage - armor).max(0.0);
            prop_assert!((entity.structure - (structure - overflow)).abs() < 1e-9);
        } else {
            prop_assert_eq!(entity.structure, structure - damage);
        }
    }
}

// =============================================================================
// Full battles
// =============================================================================

#[test]
fn test_duel_trades_fire() {
    let (mut battle, a, b) = duel(3);
    let teams = teams(&battle);
    let mut shots = 0;
    let mut hits = Vec::new();

    for _ in 0..900 {
        let events = fire_at_will(&mut battle);
        shots += events.shots.len();
        hits.extend(events.hits);
    }

    assert!(shots > 0);
    assert!(!hits.is_empty());
    for hit in &hits {
        assert!(hit.damage > 0.0);
        let source = hit.source.and_then(|s| teams.get(&s));
        assert_ne!(source, teams.get(&hit.target), "friendly fire: {hit:?}");
    }

    let hurt = |id| {
        battle
            .entity(id)
            .map_or(true, |e| e.armor < e.max_armor || e.structure < e.max_structure)
    };
    assert!(hurt(a) || hurt(b));
}

#[test]
fn test_shot_ids_never_collide_with_units() {
    let mut battle = skirmish(9);
    let units: Vec<EntityId> = battle.units().sorted_ids();

    for _ in 0..300 {
        let events = fire_at_will(&mut battle);
        for shot in events.shots {
            assert!(!units.contains(&shot.projectile));
            assert!(shot.projectile > *units.last().unwrap_or(&EntityId(0)));
        }
    }
}

#[test]
fn test_manual_power_cycle_timeline() {
    let (mut battle, a, _) = duel(1);
    let config = battle.config().clone();
    battle.power_off(a).unwrap();

    let mut transitions = Vec::new();
    for _ in 0..config.power_off_ticks() {
        transitions.extend(battle.tick().power_transitions);
    }
    assert_eq!(
        transitions,
        vec![PowerTransition {
            unit: a,
            from: PowerState::On,
            to: PowerState::Off,
        }]
    );

    // Manual shutdown stays down until asked
    for _ in 0..60 {
        assert!(battle.tick().power_transitions.is_empty());
    }

    battle.power_on(a).unwrap();
    for _ in 1..config.power_on_ticks() {
        assert!(battle.tick().power_transitions.is_empty());
    }
    let events = battle.tick();
    assert_eq!(events.power_transitions.len(), 1);
    assert_eq!(events.power_transitions[0].to, PowerState::On);
    assert_eq!(battle.unit(a).and_then(Unit::power_state), Some(PowerState::On));
}

#[test]
fn test_unpowered_mech_holds_fire() {
    let (mut battle, a, _) = duel(1);
    battle.power_off(a).unwrap();
    for _ in 0..battle.config().power_off_ticks() {
        battle.tick();
    }

    for _ in 0..120 {
        battle.queue_ready_weapons(a).unwrap();
        let events = battle.tick();
        assert!(events.shots.iter().all(|s| s.unit != a));
    }
}

#[test]
fn test_power_orders_need_a_mech() {
    let battle = skirmish(2);
    let vehicle = battle
        .units()
        .sorted_ids()
        .into_iter()
        .find(|&id| battle.unit(id).is_some_and(|u| u.unit_type() == UnitType::Vehicle))
        .unwrap();

    let mut battle = battle;
    assert!(matches!(battle.power_off(vehicle), Err(SimError::NotAMech(_))));
    assert!(matches!(battle.set_jump_jets(vehicle, true), Err(SimError::NotAMech(_))));
}

// =============================================================================
// Invariants under random orders
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_invariants_hold_under_random_orders(
        seed in any::<u64>(),
        orders in arb_order_sequence(120),
    ) {
        let mut battle = skirmish(seed);
        let teams = teams(&battle);

        for order in &orders {
            apply_order(&mut battle, order);
            let events = fire_at_will(&mut battle);

            for hit in &events.hits {
                let source = hit.source.and_then(|s| teams.get(&s));
                prop_assert_ne!(source, teams.get(&hit.target));
            }
            for (_, unit) in battle.units().iter() {
                let e = unit.entity();
                prop_assert!(e.armor >= 0.0 && e.armor <= e.max_armor);
                prop_assert!(e.structure > 0.0);
                prop_assert!(e.position_z >= 0.0);
                prop_assert!(e.heading > -std::f64::consts::PI - 1e-9);
                prop_assert!(e.heading <= std::f64::consts::PI + 1e-9);
                prop_assert!(unit.heat() >= 0.0);
            }
            for (_, projectile) in battle.projectiles().iter() {
                prop_assert!(projectile.lifespan() > 0.0);
                prop_assert!(projectile.damage() >= 0.0);
            }
        }
    }
}
