//! The mode-owned control routines.
//!
//! Each routine reads the operator controls once per step, commands its own
//! subsystem and zeroes its motors in `end`.  Actuator failures are logged
//! and the step carries on.

pub mod elevator;
pub mod intake;
pub mod teleop_drive;

pub use elevator::Elevator;
pub use intake::Intake;
pub use teleop_drive::TeleopDrive;

use roboloop_types::RobotError;
use tracing::warn;

/// Zero `value` when its magnitude is within `deadband`.
pub(crate) fn apply_deadband(value: f32, deadband: f32) -> f32 {
    if value.abs() <= deadband { 0.0 } else { value }
}

/// Log a failed fire-and-forget actuator command.
pub(crate) fn log_fault(command: &str, result: Result<(), RobotError>) {
    if let Err(e) = result {
        warn!(command, error = %e, "actuator command failed");
    }
}

/// Rising-edge detector for a held button.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Edge {
    held: bool,
}

impl Edge {
    /// Treat the button's current state as already seen, so a button held
    /// across a restart does not fire.
    pub(crate) fn prime(&mut self, held: bool) {
        self.held = held;
    }

    /// `true` exactly once per press.
    pub(crate) fn rising(&mut self, held: bool) -> bool {
        let pressed = held && !self.held;
        self.held = held;
        pressed
    }
}
