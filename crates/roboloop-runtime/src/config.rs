//! Runtime configuration for [`RobotLifecycle`][crate::lifecycle::RobotLifecycle].

use std::time::Duration;

use roboloop_kernel::DEFAULT_SHUTOFF_DURATION;

/// Fixed tick period of the execution host (50 Hz).
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(20);

/// Which routines this robot carries.  A disabled routine becomes an empty
/// slot: every lifecycle call on it is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineToggles {
    pub teleop_drive: bool,
    pub intake: bool,
    pub elevator: bool,
    pub compressor_shutoff: bool,
}

impl Default for RoutineToggles {
    fn default() -> Self {
        Self {
            teleop_drive: true,
            intake: true,
            elevator: true,
            compressor_shutoff: true,
        }
    }
}

/// Drivetrain feel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveTuning {
    /// Axis magnitudes at or below this are treated as zero.
    pub deadband: f32,
    /// Power scale seeded into the telemetry store at boot and used whenever
    /// the live slider cannot be read.
    pub default_power_scale: f64,
}

impl Default for DriveTuning {
    fn default() -> Self {
        Self {
            deadband: 0.05,
            default_power_scale: 1.0,
        }
    }
}

/// Configuration bundle for the robot lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleConfig {
    /// Period at which the host calls `on_tick`.
    pub tick_period: Duration,
    /// How long the compressor rests per brownout engagement.
    pub shutoff_duration: Duration,
    pub routines: RoutineToggles,
    pub drive: DriveTuning,
    /// Intake roller power while a button is held.
    pub intake_speed: f32,
    /// Elevator power at full axis deflection.
    pub elevator_speed: f32,
    /// Number of lifecycle events retained for operator review.
    pub event_history: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            shutoff_duration: DEFAULT_SHUTOFF_DURATION,
            routines: RoutineToggles::default(),
            drive: DriveTuning::default(),
            intake_speed: 0.8,
            elevator_speed: 0.6,
            event_history: 64,
        }
    }
}
