//! Per-step orchestration of one biped.
//!
//! ```text
//! step(input):
//!   sequencer.advance† ─► gate.tick ─► motors.apply* ─► adapter.step
//!     ─► balance.apply* ─► fall.update ─► StepReport
//!
//! * only once settled and still running
//! † only while still running
//! ```

use std::time::Duration;

use teeter_core::config::CharacterConfig;
use teeter_core::error::{ConfigError, SimError};
use teeter_core::time::SimTime;
use teeter_core::types::{ControlInputState, LinkId, LinkMap, Pose2};
use teeter_physics::PhysicsAdapter;
use tracing::{info, warn};

use crate::balance::{BalanceController, BalanceOutput};
use crate::fall::{FallDetector, FallState};
use crate::gate::ImpulseGate;
use crate::motor::JointMotorController;
use crate::skeleton::{Skeleton, SkeletonLayout};
use crate::stabilize::{StabilizationPhase, StabilizationSequencer};

// ---------------------------------------------------------------------------
// StepReport
// ---------------------------------------------------------------------------

/// Outcome of one fixed step, for UI and logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Run number, starting at 1 with the first reset.
    pub run: u32,
    /// Simulated time since the last reset.
    pub time: SimTime,
    pub phase: StabilizationPhase,
    pub fall_state: FallState,
    /// Torso x travelled since spawn. Frozen once fallen.
    pub distance: f32,
    /// Kicks fired this step.
    pub kicks: u32,
    pub balance: Option<BalanceOutput>,
    /// Final score, set only on the step the character fell.
    pub fell: Option<f32>,
}

// ---------------------------------------------------------------------------
// CharacterController
// ---------------------------------------------------------------------------

/// Owns one biped's skeleton and every piece of per-run control state.
///
/// The controller is engine-agnostic: every call takes the
/// [`PhysicsAdapter`] the skeleton lives in.
#[derive(Debug, Clone)]
pub struct CharacterController {
    config: CharacterConfig,
    layout: SkeletonLayout,
    timestep: Duration,
    motors: JointMotorController,
    balance: BalanceController,

    skeleton: Option<Skeleton>,
    gate: ImpulseGate,
    sequencer: StabilizationSequencer,
    fall: FallDetector,
    run: u32,
    time: SimTime,
    distance: f32,
    final_score: Option<f32>,
}

impl CharacterController {
    /// Validate `config` and prepare a controller. Nothing is spawned until
    /// [`reset`](Self::reset).
    pub fn new(config: CharacterConfig, timestep: Duration) -> Result<Self, ConfigError> {
        config.validate()?;
        if timestep.is_zero() {
            return Err(ConfigError::InvalidTimestep(timestep.as_secs_f64()));
        }
        let layout = SkeletonLayout::from_config(&config)?;
        let motors = JointMotorController::new(&config.motors, &config.impulses);
        let balance = BalanceController::new(&config)?;
        let sequencer = StabilizationSequencer::new(&config, motors.knee_rest());

        Ok(Self {
            gate: ImpulseGate::new(config.impulses.gate_period()),
            fall: FallDetector::new(&config),
            config,
            layout,
            timestep,
            motors,
            balance,
            skeleton: None,
            sequencer,
            run: 0,
            time: SimTime::ZERO,
            distance: 0.0,
            final_score: None,
        })
    }

    /// Tear down the current skeleton (if any) and spawn a fresh one.
    ///
    /// The new skeleton is at rest at the spawn pose with the stand holds
    /// engaged. Gate, sequencer and fall state are rebuilt, so nothing
    /// scheduled by the previous run can touch the new one.
    pub fn reset<P: PhysicsAdapter + ?Sized>(&mut self, adapter: &mut P) {
        self.despawn(adapter);

        let mut skeleton = Skeleton::build(adapter, &self.layout);
        self.gate = ImpulseGate::new(self.config.impulses.gate_period());
        self.sequencer = StabilizationSequencer::new(&self.config, self.motors.knee_rest());
        self.fall = FallDetector::new(&self.config);
        self.sequencer.engage(adapter, &mut skeleton);

        self.run += 1;
        self.time = SimTime::ZERO;
        self.distance = 0.0;
        self.final_score = None;

        if !skeleton.is_intact() {
            warn!(
                run = self.run,
                issues = skeleton.issues().len(),
                "skeleton built with failures, affected limbs are passive"
            );
        }
        info!(
            run = self.run,
            links = adapter.link_count(),
            joints = adapter.joint_count(),
            "character reset"
        );
        self.skeleton = Some(skeleton);
    }

    /// Remove the current skeleton from `adapter`, if any.
    pub fn despawn<P: PhysicsAdapter + ?Sized>(&mut self, adapter: &mut P) {
        if let Some(old) = self.skeleton.take() {
            old.destroy(adapter);
        }
    }

    /// Advance one fixed step with `input`.
    ///
    /// After a fall the world keeps stepping so the body can settle, but no
    /// motor or balance commands are issued.
    pub fn step<P: PhysicsAdapter + ?Sized>(
        &mut self,
        adapter: &mut P,
        input: ControlInputState,
    ) -> Result<StepReport, SimError> {
        let Some(skeleton) = self.skeleton.as_mut() else {
            return Err(SimError::NotSpawned);
        };
        self.time += self.timestep;

        // A fall ends the stabilization sequence where it stands.
        if !self.fall.is_fallen() {
            self.sequencer.advance(adapter, skeleton, self.timestep);
        }
        self.gate.tick(self.timestep);

        let active = self.sequencer.is_settled() && !self.fall.is_fallen();
        let kicks = if active {
            self.motors.apply(adapter, skeleton, &mut self.gate, input)
        } else {
            0
        };

        adapter.step();

        let balance = if active {
            self.balance.apply(adapter, skeleton, &mut self.gate)
        } else {
            None
        };

        let mut fell = None;
        if let Some(torso) = skeleton.link_pose(&*adapter, LinkId::Torso) {
            if !self.fall.is_fallen() && torso.position.x.is_finite() {
                self.distance = torso.position.x - self.layout.root().position.x;
            }
            if self.fall.update(torso) {
                info!(run = self.run, score = self.distance, time = %self.time, "run over");
                self.final_score = Some(self.distance);
                fell = self.final_score;
            }
        }

        Ok(StepReport {
            run: self.run,
            time: self.time,
            phase: self.sequencer.phase(),
            fall_state: self.fall.state(),
            distance: self.distance,
            kicks,
            balance,
            fell,
        })
    }

    /// `(position, rotation)` of every live link, for rendering.
    pub fn link_poses<P: PhysicsAdapter + ?Sized>(&self, adapter: &P) -> LinkMap<Option<Pose2>> {
        LinkMap::from_fn(|link| {
            self.skeleton
                .as_ref()
                .and_then(|skeleton| skeleton.link_pose(adapter, link))
        })
    }

    // -- Accessors --

    pub const fn config(&self) -> &CharacterConfig {
        &self.config
    }

    pub const fn layout(&self) -> &SkeletonLayout {
        &self.layout
    }

    pub const fn timestep(&self) -> Duration {
        self.timestep
    }

    pub const fn skeleton(&self) -> Option<&Skeleton> {
        self.skeleton.as_ref()
    }

    pub const fn phase(&self) -> StabilizationPhase {
        self.sequencer.phase()
    }

    pub const fn fall_state(&self) -> FallState {
        self.fall.state()
    }

    /// Number of resets so far.
    pub const fn run(&self) -> u32 {
        self.run
    }

    pub const fn time(&self) -> SimTime {
        self.time
    }

    pub const fn distance(&self) -> f32 {
        self.distance
    }

    pub const fn final_score(&self) -> Option<f32> {
        self.final_score
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
