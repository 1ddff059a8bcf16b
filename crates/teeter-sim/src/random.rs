//! Seeded random input for soak runs.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use teeter_core::types::ControlInputState;

/// Per-step toggle chance used by the CLI.
pub const DEFAULT_TOGGLE_PROBABILITY: f64 = 0.05;

/// Random button mashing: each step, each control flips with a fixed
/// probability.
///
/// The RNG is reseeded from `seed + run` whenever the run number changes,
/// so a given run replays identically regardless of what came before it.
#[derive(Debug, Clone)]
pub struct RandomInput {
    seed: u64,
    toggle_probability: f64,
    rng: ChaCha8Rng,
    state: ControlInputState,
    run: u32,
}

impl RandomInput {
    /// `toggle_probability` is clamped to `[0, 1]`; NaN counts as 0.
    pub fn new(seed: u64, toggle_probability: f64) -> Self {
        let toggle_probability = if toggle_probability.is_nan() {
            0.0
        } else {
            toggle_probability.clamp(0.0, 1.0)
        };
        Self {
            seed,
            toggle_probability,
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: ControlInputState::IDLE,
            run: 0,
        }
    }

    pub const fn seed(&self) -> u64 {
        self.seed
    }

    pub const fn toggle_probability(&self) -> f64 {
        self.toggle_probability
    }

    /// Controls for the next step of `run`.
    pub fn sample(&mut self, run: u32) -> ControlInputState {
        if run != self.run {
            self.run = run;
            self.rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(u64::from(run)));
            self.state = ControlInputState::IDLE;
        }
        let p = self.toggle_probability;
        let s = &mut self.state;
        for held in [
            &mut s.left_thigh_drive,
            &mut s.right_thigh_drive,
            &mut s.left_calf_extend,
            &mut s.right_calf_extend,
        ] {
            if self.rng.random_bool(p) {
                *held = !*held;
            }
        }
        self.state
    }
}

impl Default for RandomInput {
    fn default() -> Self {
        Self::new(0, DEFAULT_TOGGLE_PROBABILITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(input: &mut RandomInput, run: u32, steps: usize) -> Vec<ControlInputState> {
        (0..steps).map(|_| input.sample(run)).collect()
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = trace(&mut RandomInput::new(7, 0.3), 1, 50);
        let b = trace(&mut RandomInput::new(7, 0.3), 1, 50);
        assert_eq!(a, b);
    }

    #[test]
    fn run_replays_independently_of_history() {
        let mut warm = RandomInput::new(7, 0.3);
        trace(&mut warm, 1, 37);
        let replay = trace(&mut warm, 2, 20);
        let fresh = trace(&mut RandomInput::new(7, 0.3), 2, 20);
        assert_eq!(replay, fresh);
    }

    #[test]
    fn zero_probability_stays_idle() {
        let mut input = RandomInput::new(3, 0.0);
        assert!(trace(&mut input, 1, 100).iter().all(|s| !s.any()));
    }

    #[test]
    fn certain_toggle_alternates() {
        let mut input = RandomInput::new(3, 1.0);
        let steps = trace(&mut input, 1, 4);
        assert!(steps[0].left_thigh_drive && steps[0].right_calf_extend);
        assert!(!steps[1].any());
        assert_eq!(steps[0], steps[2]);
    }

    #[test]
    fn probability_is_clamped() {
        assert!((RandomInput::new(0, 4.0).toggle_probability() - 1.0).abs() < f64::EPSILON);
        assert!(RandomInput::new(0, f64::NAN).toggle_probability().abs() < f64::EPSILON);
    }
}
