//! [`TeleopDrive`] – operator arcade drive.
//!
//! Every step:
//!
//! 1. a press of the shift button toggles both gearboxes and publishes
//!    `Current Gear`;
//! 2. a press of the direction button flips the heading convention and
//!    publishes `Driving Direction`;
//! 3. the forward/turn axes, deadbanded and scaled by the live
//!    `Power Slider`, are mixed into left/right drive power.  Reverse
//!    direction inverts the forward axis.

use std::time::Duration;

use roboloop_hal::{ActuatorGateway, Hardware, OperatorInput, TelemetryStore};
use roboloop_kernel::{ControlRoutine, RoutineStatus};
use roboloop_types::{GearSide, Motor, RoutineId, keys};
use tracing::{debug, info};

use super::{Edge, apply_deadband, log_fault};
use crate::config::DriveTuning;

pub struct TeleopDrive {
    tuning: DriveTuning,
    shift: Edge,
    direction: Edge,
}

impl TeleopDrive {
    pub fn new(tuning: DriveTuning) -> Self {
        Self {
            tuning,
            shift: Edge::default(),
            direction: Edge::default(),
        }
    }

    fn shift_gear(&self, hw: &mut Hardware) {
        let gear = hw.gateway.gear(GearSide::Left).toggled();
        for side in [GearSide::Left, GearSide::Right] {
            log_fault("set_gear", hw.gateway.set_gear(side, gear));
        }
        if let Err(e) = hw.telemetry.put_text(keys::CURRENT_GEAR, gear.label()) {
            debug!(error = %e, "could not publish current gear");
        }
        info!(gear = gear.label(), "gear shifted");
    }

    fn flip_direction(&self, hw: &mut Hardware) {
        let direction = hw.gateway.drive_direction().toggled();
        log_fault("set_drive_direction", hw.gateway.set_drive_direction(direction));
        if let Err(e) = hw.telemetry.put_text(keys::DRIVING_DIRECTION, direction.label()) {
            debug!(error = %e, "could not publish driving direction");
        }
        info!(direction = direction.label(), "driving direction flipped");
    }
}

/// Mix arcade axes into `(left, right)` power, normalised into `[-1, 1]`.
pub(crate) fn arcade(forward: f32, turn: f32) -> (f32, f32) {
    let left = forward + turn;
    let right = forward - turn;
    let scale = left.abs().max(right.abs()).max(1.0);
    (left / scale, right / scale)
}

impl ControlRoutine for TeleopDrive {
    fn id(&self) -> RoutineId {
        RoutineId::TeleopDrive
    }

    fn initialize(&mut self, hw: &mut Hardware) {
        let controls = hw.operator.read();
        self.shift.prime(controls.shift_gear);
        self.direction.prime(controls.toggle_direction);
    }

    fn execute(&mut self, hw: &mut Hardware, _dt: Duration) -> RoutineStatus {
        let controls = hw.operator.read();

        if self.shift.rising(controls.shift_gear) {
            self.shift_gear(hw);
        }
        if self.direction.rising(controls.toggle_direction) {
            self.flip_direction(hw);
        }

        let scale = hw
            .telemetry
            .get_number_or(keys::POWER_SLIDER, self.tuning.default_power_scale)
            .clamp(0.0, 1.0) as f32;
        let sign = hw.gateway.drive_direction().sign();
        let forward = apply_deadband(controls.forward, self.tuning.deadband) * sign * scale;
        let turn = apply_deadband(controls.turn, self.tuning.deadband) * scale;
        let (left, right) = arcade(forward, turn);

        log_fault("drive_left", hw.gateway.set_motor_power(Motor::DriveLeft, left));
        log_fault("drive_right", hw.gateway.set_motor_power(Motor::DriveRight, right));
        RoutineStatus::Continue
    }

    fn end(&mut self, hw: &mut Hardware) {
        log_fault("drive_left", hw.gateway.set_motor_power(Motor::DriveLeft, 0.0));
        log_fault("drive_right", hw.gateway.set_motor_power(Motor::DriveRight, 0.0));
    }
}
