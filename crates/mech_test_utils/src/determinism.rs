//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a battle produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and save games depend on the simulation being reproducible.
//! Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The battle always iterates in sorted entity ID order.
//!
//! - **System randomness**: every projectile owns a `ChaCha8Rng` seeded from
//!   the battle seed and its own id. Nothing else draws random numbers.
//!
//! - **Floating-point math**: the core uses `f64` throughout. Results are
//!   reproducible on one platform and build; cross-platform lockstep is not
//!   a goal.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual state machines (power, salvo, lifespan)
//! 2. **Property tests**: random orders must still produce deterministic outputs
//! 3. **Integration tests**: full battles are reproducible
//! 4. **Parallel tests**: running N battles on threads all match

use std::thread;

use mech_core::battle::Battle;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use mech_test_utils::determinism::verify_determinism;
/// use mech_test_utils::fixtures::{duel, fire_at_will};
///
/// let result = verify_determinism(
///     3,
///     120,
///     || duel(7).0,
///     |battle| {
///         fire_at_will(battle);
///     },
///     |battle| battle.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run two identical battles with `step` and compare final state hashes.
pub fn verify_battle_determinism<F, S>(setup_fn: F, step: S, num_ticks: u64) -> bool
where
    F: Fn() -> Battle,
    S: Fn(&mut Battle),
{
    verify_determinism(2, num_ticks, setup_fn, step, Battle::state_hash).is_deterministic
}

/// Run N battles on scoped threads and collect their final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_battles<F, S>(setup_fn: F, step: S, num_battles: usize, num_ticks: u64) -> Vec<u64>
where
    F: Fn() -> Battle + Sync,
    S: Fn(&mut Battle) + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| {
                s.spawn(|| {
                    let mut battle = setup_fn();
                    for _ in 0..num_ticks {
                        step(&mut battle);
                    }
                    battle.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("battle thread panicked"))
            .collect()
    })
}

/// Compare two battles tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the battles stay identical, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F, S>(setup_fn: F, step: S, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Battle,
    S: Fn(&mut Battle),
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        step(&mut a);
        step(&mut b);

        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a snapshot taken mid-battle resumes exactly.
///
/// Runs `num_ticks`, snapshots, then advances both the live battle and the
/// restored copy another `num_ticks` and compares.
pub fn verify_snapshot_determinism<F, S>(setup_fn: F, step: S, num_ticks: u64) -> bool
where
    F: Fn() -> Battle,
    S: Fn(&mut Battle),
{
    let mut battle = setup_fn();
    for _ in 0..num_ticks {
        step(&mut battle);
    }

    let Ok(bytes) = battle.snapshot() else {
        return false;
    };
    let Ok(mut restored) = Battle::restore(&bytes) else {
        return false;
    };
    if restored.state_hash() != battle.state_hash() {
        return false;
    }

    for _ in 0..num_ticks {
        step(&mut battle);
        step(&mut restored);
    }
    restored.state_hash() == battle.state_hash()
}

/// Proptest strategies for battle testing.
pub mod strategies {
    use std::f64::consts::PI;

    use glam::DVec2;
    use proptest::prelude::*;

    /// An order issued to a unit, addressed by index into sorted unit ids.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Order {
        /// Trigger a weapon.
        Fire {
            /// Unit index.
            unit: usize,
            /// Weapon index, wrapped to the unit's armament.
            weapon: usize,
        },
        /// Set speed as a fraction of top speed.
        Throttle {
            /// Unit index.
            unit: usize,
            /// Fraction in [-1, 1].
            fraction: f64,
        },
        /// Queue a heading change.
        Turn {
            /// Unit index.
            unit: usize,
            /// Radians.
            angle: f64,
        },
        /// Fire or cut jump jets.
        JumpJets {
            /// Unit index.
            unit: usize,
            /// Jets on.
            active: bool,
        },
        /// Manual shutdown.
        PowerOff {
            /// Unit index.
            unit: usize,
        },
        /// Power up.
        PowerOn {
            /// Unit index.
            unit: usize,
        },
        /// Do nothing this tick.
        Wait,
    }

    /// Position within a square arena of half-size `extent`.
    pub fn arb_position(extent: f64) -> impl Strategy<Value = DVec2> {
        (-extent..extent, -extent..extent).prop_map(|(x, y)| DVec2::new(x, y))
    }

    /// Heading in [-π, π).
    pub fn arb_heading() -> impl Strategy<Value = f64> {
        -PI..PI
    }

    /// Armor values, including none.
    pub fn arb_armor() -> impl Strategy<Value = f64> {
        prop_oneof![Just(0.0), 0.5f64..500.0]
    }

    /// Damage values (0.1-100).
    pub fn arb_damage() -> impl Strategy<Value = f64> {
        0.1f64..100.0
    }

    /// Any single order.
    pub fn arb_order() -> impl Strategy<Value = Order> {
        prop_oneof![
            (0usize..8, 0usize..4).prop_map(|(unit, weapon)| Order::Fire { unit, weapon }),
            (0usize..8, -1.0f64..1.0).prop_map(|(unit, fraction)| Order::Throttle { unit, fraction }),
            (0usize..8, -PI..PI).prop_map(|(unit, angle)| Order::Turn { unit, angle }),
            (0usize..8, any::<bool>()).prop_map(|(unit, active)| Order::JumpJets { unit, active }),
            (0usize..8).prop_map(|unit| Order::PowerOff { unit }),
            (0usize..8).prop_map(|unit| Order::PowerOn { unit }),
            Just(Order::Wait),
        ]
    }

    /// A per-tick order script.
    pub fn arb_order_sequence(max_len: usize) -> impl Strategy<Value = Vec<Order>> {
        proptest::collection::vec(arb_order(), 0..max_len)
    }
}

/// Apply an [`Order`](strategies::Order). Orders to missing units, bad
/// weapon indices or non-mechs are ignored.
pub fn apply_order(battle: &mut Battle, order: &strategies::Order) {
    use mech_core::units::Unit;
    use strategies::Order;

    let ids = battle.units().sorted_ids();
    if ids.is_empty() {
        return;
    }
    let pick = |unit: usize| ids[unit % ids.len()];

    match *order {
        Order::Fire { unit, weapon } => {
            let id = pick(unit);
            let count = battle.unit(id).map_or(0, |u| u.armament().len());
            if count > 0 {
                let _ = battle.queue_trigger(id, weapon % count);
            }
        }
        Order::Throttle { unit, fraction } => {
            if let Some(u) = battle.unit_mut(pick(unit)) {
                let top = u.unit().max_velocity;
                u.set_target_velocity(fraction * top);
            }
        }
        Order::Turn { unit, angle } => {
            if let Some(u) = battle.unit_mut(pick(unit)) {
                u.set_target_relative_heading(angle);
            }
        }
        Order::JumpJets { unit, active } => {
            let _ = battle.set_jump_jets(pick(unit), active);
        }
        Order::PowerOff { unit } => {
            let _ = battle.power_off(pick(unit));
        }
        Order::PowerOn { unit } => {
            let _ = battle.power_on(pick(unit));
        }
        Order::Wait => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{duel, fire_at_will, skirmish};
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_non_determinism() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let counter = AtomicU64::new(0);
        let result = verify_determinism(
            2,
            1,
            || counter.fetch_add(1, Ordering::Relaxed),
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_empty_battle_determinism() {
        let step = |b: &mut Battle| {
            b.tick();
        };
        assert!(verify_battle_determinism(Battle::default, step, 100));
    }

    #[test]
    fn test_duel_determinism() {
        assert!(verify_battle_determinism(
            || duel(11).0,
            |b| {
                fire_at_will(b);
            },
            600,
        ));
    }

    #[test]
    fn test_skirmish_has_no_divergence() {
        let divergence = find_first_divergence(
            || skirmish(5),
            |b| {
                fire_at_will(b);
            },
            300,
        );
        assert!(divergence.is_none(), "diverged at tick {divergence:?}");
    }

    #[test]
    fn test_seed_changes_missile_spread() {
        let run = |seed| {
            let mut battle = skirmish(seed);
            for _ in 0..300 {
                fire_at_will(&mut battle);
            }
            battle.state_hash()
        };
        assert_ne!(run(1), run(2));
    }

    #[test]
    fn test_snapshot_resumes_exactly() {
        assert!(verify_snapshot_determinism(
            || skirmish(3),
            |b| {
                fire_at_will(b);
            },
            150,
        ));
    }

    #[test]
    fn test_parallel_battles_match() {
        let hashes = run_parallel_battles(
            || skirmish(9),
            |b| {
                fire_at_will(b);
            },
            4,
            200,
        );
        assert_eq!(hashes.len(), 4);
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_order_scripts_are_deterministic(
            orders in strategies::arb_order_sequence(120),
            seed in any::<u64>(),
        ) {
            let result = verify_determinism(
                2,
                orders.len() as u64,
                || (skirmish(seed), 0usize),
                |state: &mut (Battle, usize)| {
                    let (battle, next) = state;
                    apply_order(battle, &orders[*next]);
                    battle.tick();
                    *next += 1;
                },
                |state: &(Battle, usize)| state.0.state_hash(),
            );
            prop_assert!(result.is_deterministic);
        }
    }
}
