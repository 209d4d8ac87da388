//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replaying the same seed with the same deploy and `dt` sequence must give
//! a bit-identical match. Sources of non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`arena_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Units are kept in creation order per side
//!   and sides are always processed P1 then P2.
//!
//! - **System randomness**: Jitter and hand cycling use the match's seeded
//!   PCG; agents own their own seeded PCG.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual phase determinism (movement, combat, etc.)
//! 2. **Property tests**: Random scripts must still replay identically
//! 3. **Parallel tests**: Running N matches on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use arena_core::facade::DeployCommand;
use arena_core::math::Fixed;
use arena_core::simulation::Match;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps applied per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance by one step
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
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

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// One scripted input to a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Submit a deploy command.
    Deploy(DeployCommand),
    /// Advance the match.
    Tick(Fixed),
}

/// Apply one step to a match.
pub fn apply_step(game: &mut Match, step: &ScriptStep) {
    match step {
        ScriptStep::Deploy(command) => {
            game.deploy(command.side, &command.card_id, command.position);
        }
        ScriptStep::Tick(dt) => {
            game.tick(*dt);
        }
    }
}

/// Replay `script` on a fresh match and return the final state hash.
pub fn run_script<F>(setup_fn: F, script: &[ScriptStep]) -> u64
where
    F: Fn() -> Match,
{
    let mut game = setup_fn();
    for step in script {
        apply_step(&mut game, step);
    }
    game.state_hash()
}

/// Replay `script` twice and compare final hashes.
pub fn verify_script_determinism<F>(setup_fn: F, script: &[ScriptStep]) -> bool
where
    F: Fn() -> Match,
{
    run_script(&setup_fn, script) == run_script(&setup_fn, script)
}

/// Replay `script` on `num_runs` scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a replay thread panics.
pub fn run_parallel_scripts<F>(setup_fn: F, script: &[ScriptStep], num_runs: usize) -> Vec<u64>
where
    F: Fn() -> Match + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| s.spawn(|| run_script(&setup_fn, script)))
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Replay `script` on two matches step by step, finding the first step
/// after which they differ.
///
/// # Returns
///
/// `None` if both replays agree throughout, `Some(index)` of the first
/// diverging step otherwise.
pub fn find_first_divergence<F>(setup_fn: F, script: &[ScriptStep]) -> Option<usize>
where
    F: Fn() -> Match,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for (index, step) in script.iter().enumerate() {
        apply_step(&mut first, step);
        apply_step(&mut second, step);

        if first.state_hash() != second.state_hash() {
            return Some(index + 1);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for match scripts.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the simulation.
pub mod strategies {
    use proptest::prelude::*;

    use arena_core::components::SideId;
    use arena_core::facade::DeployCommand;
    use arena_core::math::{seconds_from_millis, Fixed, Vec2Fixed};

    use super::ScriptStep;
    use crate::fixtures::standard_deck;

    /// Generate a side.
    pub fn arb_side() -> impl Strategy<Value = SideId> {
        prop_oneof![Just(SideId::P1), Just(SideId::P2)]
    }

    /// Generate a coordinate, deliberately including some off-field values.
    ///
    /// Range: -4 to 36 in quarter tiles.
    pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
        (-16i32..144i32).prop_map(|quarters| Fixed::from_num(quarters) / Fixed::from_num(4))
    }

    /// Generate a deploy position.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate a tick length between 1 ms and 0.5 s.
    pub fn arb_dt() -> impl Strategy<Value = Fixed> {
        (1u32..=500u32).prop_map(seconds_from_millis)
    }

    /// Generate a card id from the standard deck.
    pub fn arb_card_id() -> impl Strategy<Value = String> {
        prop::sample::select(standard_deck())
    }

    /// Generate a deploy command.
    pub fn arb_deploy() -> impl Strategy<Value = DeployCommand> {
        (arb_side(), arb_card_id(), arb_position())
            .prop_map(|(side, card_id, position)| DeployCommand::new(side, card_id, position))
    }

    /// Generate a single script step, weighted toward ticks.
    pub fn arb_step() -> impl Strategy<Value = ScriptStep> {
        prop_oneof![
            3 => arb_dt().prop_map(ScriptStep::Tick),
            1 => arb_deploy().prop_map(ScriptStep::Deploy),
        ]
    }

    /// Generate a script.
    pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<ScriptStep>> {
        proptest::collection::vec(arb_step(), 0..max_len)
    }

    /// Generate damage values (1-1000).
    pub fn arb_damage() -> impl Strategy<Value = u32> {
        1u32..1000u32
    }

    /// Generate a splash radius between 0.25 and 5.0.
    pub fn arb_radius() -> impl Strategy<Value = Fixed> {
        (1i32..=20i32).prop_map(|quarters| Fixed::from_num(quarters) / Fixed::from_num(4))
    }
}
