use std::f32::consts::{FRAC_PI_2, FRAC_PI_8};
use std::path::Path;
use std::time::Duration;

use bevy::math::Vec2;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{JointId, JointLimits, LinkShape};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_timestep() -> f64 {
    1.0 / 60.0
}
const fn default_gravity() -> [f32; 2] {
    [0.0, -9.81]
}
const fn default_ground_level() -> f32 {
    -4.9
}
const fn default_ground_friction() -> f32 {
    0.9
}
const fn default_max_steps_per_frame() -> u32 {
    8
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// World and stepping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct SimConfig {
    /// Fixed physics timestep in seconds (default: 1/60).
    #[serde(default = "default_timestep")]
    pub timestep: f64,

    /// Gravity `[x, y]` in m/s^2.
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 2],

    /// Height of the ground's top surface.
    #[serde(default = "default_ground_level")]
    pub ground_level: f32,

    /// Ground friction coefficient.
    #[serde(default = "default_ground_friction")]
    pub ground_friction: f32,

    /// Cap on fixed steps dispensed per rendered frame.
    #[serde(default = "default_max_steps_per_frame")]
    pub max_steps_per_frame: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            timestep: default_timestep(),
            gravity: default_gravity(),
            ground_level: default_ground_level(),
            ground_friction: default_ground_friction(),
            max_steps_per_frame: default_max_steps_per_frame(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match Duration::try_from_secs_f64(self.timestep) {
            Ok(step) if !step.is_zero() => {}
            _ => return Err(ConfigError::InvalidTimestep(self.timestep)),
        }
        if self.max_steps_per_frame == 0 {
            return Err(ConfigError::invalid(
                "simulation.max_steps_per_frame",
                "must be at least 1",
            ));
        }
        if !self.gravity.iter().all(|g| g.is_finite()) || !self.ground_level.is_finite() {
            return Err(ConfigError::invalid(
                "simulation",
                "gravity and ground_level must be finite",
            ));
        }
        Ok(())
    }

    /// Timestep as a [`Duration`]. Zero if the config has not been validated
    /// and the timestep is unrepresentable.
    pub fn step_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.timestep).unwrap_or(Duration::ZERO)
    }

    pub fn gravity_vec(&self) -> Vec2 {
        Vec2::from_array(self.gravity)
    }

    /// Step rate in Hz.
    pub fn step_hz(&self) -> f64 {
        1.0 / self.timestep
    }
}

// ---------------------------------------------------------------------------
// BodyConfig
// ---------------------------------------------------------------------------

/// Link dimensions, densities and joint ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub torso: LinkShape,
    pub thigh: LinkShape,
    pub calf: LinkShape,
    pub foot: LinkShape,
    pub arm: LinkShape,
    pub torso_density: f32,
    pub limb_density: f32,
    pub friction: f32,
    /// Initial knee flexion at spawn (rad).
    pub knee_prebend: f32,
    pub hip_limits: [f32; 2],
    pub knee_limits: [f32; 2],
    pub ankle_limits: [f32; 2],
    pub shoulder_limits: [f32; 2],
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            torso: LinkShape::Box {
                width: 0.3,
                height: 0.6,
            },
            thigh: LinkShape::Capsule {
                radius: 0.07,
                length: 0.5,
            },
            calf: LinkShape::Capsule {
                radius: 0.07,
                length: 0.5,
            },
            foot: LinkShape::Box {
                width: 0.25,
                height: 0.1,
            },
            arm: LinkShape::Capsule {
                radius: 0.05,
                length: 0.5,
            },
            torso_density: 50.0,
            limb_density: 30.0,
            friction: 0.9,
            knee_prebend: 0.03,
            hip_limits: [-0.6, 1.4],
            knee_limits: [-0.1, 1.6],
            ankle_limits: [-0.5, 0.5],
            shoulder_limits: [-FRAC_PI_2, FRAC_PI_2],
        }
    }
}

impl BodyConfig {
    /// Validated limits of `joint`.
    pub fn limits(&self, joint: JointId) -> Result<JointLimits, ConfigError> {
        let (name, range) = match joint {
            JointId::LeftHip | JointId::RightHip => ("hip", self.hip_limits),
            JointId::LeftKnee | JointId::RightKnee => ("knee", self.knee_limits),
            JointId::LeftAnkle | JointId::RightAnkle => ("ankle", self.ankle_limits),
            JointId::LeftShoulder | JointId::RightShoulder => ("shoulder", self.shoulder_limits),
        };
        JointLimits::try_from(range).map_err(|source| ConfigError::InvalidLimits {
            joint: name,
            source,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let shapes = [
            ("torso", self.torso),
            ("thigh", self.thigh),
            ("calf", self.calf),
            ("foot", self.foot),
            ("arm", self.arm),
        ];
        for (name, shape) in shapes {
            if !shape.is_valid() {
                return Err(ConfigError::invalid(
                    format!("character.body.{name}"),
                    "dimensions must be finite and positive",
                ));
            }
        }
        for (name, density) in [
            ("torso_density", self.torso_density),
            ("limb_density", self.limb_density),
        ] {
            if !density.is_finite() || density <= 0.0 {
                return Err(ConfigError::invalid(
                    format!("character.body.{name}"),
                    "must be positive",
                ));
            }
        }
        for joint in JointId::ALL {
            self.limits(joint)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MotorConfig
// ---------------------------------------------------------------------------

/// Joint motor constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// Velocity-drive target magnitude (rad/s).
    pub max_velocity: f32,
    /// Velocity-drive force bound.
    pub max_force: f32,
    /// Knee target while its extend input is released (rad).
    pub knee_rest_angle: f32,
    pub knee_stiffness: f32,
    pub knee_damping: f32,
    pub ankle_stiffness: f32,
    pub ankle_damping: f32,
    pub shoulder_stiffness: f32,
    pub shoulder_damping: f32,
    /// Forward offset of the arms at rest (rad).
    pub shoulder_rest_angle: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            max_velocity: 6.0,
            max_force: 120.0,
            knee_rest_angle: 0.1,
            knee_stiffness: 40.0,
            knee_damping: 4.0,
            ankle_stiffness: 30.0,
            ankle_damping: 3.0,
            shoulder_stiffness: 25.0,
            shoulder_damping: 2.0,
            shoulder_rest_angle: FRAC_PI_8,
        }
    }
}

// ---------------------------------------------------------------------------
// ImpulseConfig
// ---------------------------------------------------------------------------

/// Gated kick impulses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpulseConfig {
    /// Refractory period between kicks on the same limb (ms).
    pub gate_period_ms: u64,
    /// Impulse applied to a thigh when its drive engages `[x, y]`.
    pub thigh_kick: [f32; 2],
    /// Impulse applied to a calf when its extend engages `[x, y]`.
    pub calf_kick: [f32; 2],
    /// Horizontal arm-swing impulse magnitude.
    pub arm_swing: f32,
}

impl Default for ImpulseConfig {
    fn default() -> Self {
        Self {
            gate_period_ms: 80,
            thigh_kick: [0.6, 0.3],
            calf_kick: [0.4, 0.2],
            arm_swing: 0.25,
        }
    }
}

impl ImpulseConfig {
    pub const fn gate_period(&self) -> Duration {
        Duration::from_millis(self.gate_period_ms)
    }
}

// ---------------------------------------------------------------------------
// BalanceConfig
// ---------------------------------------------------------------------------

/// Shoulder counterbalance gains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Gain on torso angle.
    pub angle_gain: f32,
    /// Gain on torso angular velocity.
    pub rate_gain: f32,
    /// Multiplier on the nominal shoulder stiffness.
    pub stiffness_scale: f32,
    /// Multiplier on the nominal shoulder damping.
    pub damping_scale: f32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            angle_gain: -3.0,
            rate_gain: -2.0,
            stiffness_scale: 2.0,
            damping_scale: 1.5,
        }
    }
}

// ---------------------------------------------------------------------------
// StabilizationConfig
// ---------------------------------------------------------------------------

/// Post-spawn settling schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizationConfig {
    pub hold_stiffness: f32,
    pub hold_damping: f32,
    /// Knee target while settling (rad).
    pub stand_knee_angle: f32,
    /// `[linear, angular]` damping per phase.
    pub torso_damping: [f32; 2],
    pub limb_damping: [f32; 2],
    pub relaxed_torso_damping: [f32; 2],
    pub relaxed_limb_damping: [f32; 2],
    pub nominal_damping: [f32; 2],
    /// One-shot torso impulse `[x, y]`.
    pub lift_impulse: [f32; 2],
    pub corrective_angular_impulse: f32,
    pub initial_ms: u64,
    pub relaxing_ms: u64,
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self {
            hold_stiffness: 200.0,
            hold_damping: 20.0,
            stand_knee_angle: -0.05,
            torso_damping: [8.0, 12.0],
            limb_damping: [4.0, 6.0],
            relaxed_torso_damping: [2.0, 3.0],
            relaxed_limb_damping: [1.0, 1.5],
            nominal_damping: [0.0, 0.05],
            lift_impulse: [0.0, 1.5],
            corrective_angular_impulse: -0.02,
            initial_ms: 300,
            relaxing_ms: 400,
        }
    }
}

impl StabilizationConfig {
    pub const fn initial_duration(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    pub const fn relaxing_duration(&self) -> Duration {
        Duration::from_millis(self.relaxing_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let dampings = [
            self.torso_damping,
            self.limb_damping,
            self.relaxed_torso_damping,
            self.relaxed_limb_damping,
            self.nominal_damping,
        ];
        if dampings.iter().flatten().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(ConfigError::invalid(
                "character.stabilization",
                "damping values must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FallConfig
// ---------------------------------------------------------------------------

/// Analytic head model for the fall check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallConfig {
    pub neck_length: f32,
    pub head_radius: f32,
    /// World height the head's lowest point must stay above.
    pub threshold: f32,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            neck_length: 0.1,
            head_radius: 0.15,
            threshold: -4.8,
        }
    }
}

// ---------------------------------------------------------------------------
// CharacterConfig
// ---------------------------------------------------------------------------

/// Everything needed to build and control one biped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct CharacterConfig {
    /// Torso centre at spawn `[x, y]`.
    pub spawn: [f32; 2],
    pub body: BodyConfig,
    pub motors: MotorConfig,
    pub impulses: ImpulseConfig,
    pub balance: BalanceConfig,
    pub stabilization: StabilizationConfig,
    pub fall: FallConfig,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            spawn: [0.0, -3.5],
            body: BodyConfig::default(),
            motors: MotorConfig::default(),
            impulses: ImpulseConfig::default(),
            balance: BalanceConfig::default(),
            stabilization: StabilizationConfig::default(),
            fall: FallConfig::default(),
        }
    }
}

impl CharacterConfig {
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::from_array(self.spawn)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.spawn.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::invalid("character.spawn", "must be finite"));
        }
        self.body.validate()?;
        if self.impulses.gate_period_ms == 0 {
            return Err(ConfigError::invalid(
                "character.impulses.gate_period_ms",
                "must be positive",
            ));
        }
        if !self.fall.head_radius.is_finite() || self.fall.head_radius < 0.0 {
            return Err(ConfigError::invalid(
                "character.fall.head_radius",
                "must be non-negative",
            ));
        }
        self.stabilization.validate()
    }
}

// ---------------------------------------------------------------------------
// SceneConfig
// ---------------------------------------------------------------------------

/// Complete configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Resource)]
pub struct SceneConfig {
    #[serde(default)]
    pub simulation: SimConfig,
    #[serde(default)]
    pub character: CharacterConfig,
}

impl SceneConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.character.validate()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
