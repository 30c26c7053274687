//! Replay determinism for complete battles.

use mech_core::battle::Battle;
use mech_test_utils::determinism::strategies::{arb_order_sequence, Order};
use mech_test_utils::determinism::{
    apply_order, find_first_divergence, run_parallel_battles, verify_determinism,
    verify_snapshot_determinism,
};
use mech_test_utils::fixtures::{fire_at_will, skirmish};
use proptest::prelude::*;

fn step(battle: &mut Battle) {
    fire_at_will(battle);
}

#[test]
fn test_long_skirmish_is_reproducible() {
    let result = verify_determinism(3, 1800, || skirmish(2024), step, Battle::state_hash);
    result.assert_deterministic();
}

#[test]
fn test_skirmish_never_diverges() {
    assert_eq!(find_first_divergence(|| skirmish(77), step, 900), None);
}

#[test]
fn test_threads_agree() {
    let hashes = run_parallel_battles(|| skirmish(5), step, 4, 600);
    assert!(hashes.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_snapshot_mid_battle() {
    assert!(verify_snapshot_determinism(|| skirmish(31), step, 400));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_restored_snapshot_follows_the_same_script(
        seed in any::<u64>(),
        orders in arb_order_sequence(200),
    ) {
        let play = |battle: &mut Battle, orders: &[Order]| {
            for order in orders {
                apply_order(battle, order);
                fire_at_will(battle);
            }
        };
        let (head, tail) = orders.split_at(orders.len() / 2);

        let mut battle = skirmish(seed);
        play(&mut battle, head);
        let mut restored = Battle::restore(&battle.snapshot().unwrap()).unwrap();

        play(&mut battle, tail);
        play(&mut restored, tail);
        prop_assert_eq!(battle.state_hash(), restored.state_hash());
        prop_assert_eq!(battle.get_tick(), restored.get_tick());
    }
}
