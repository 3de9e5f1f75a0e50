//! [`Elevator`] – elevator winch and the front/rear climbing lifts.

use std::time::Duration;

use roboloop_hal::{ActuatorGateway, Hardware, OperatorInput};
use roboloop_kernel::{ControlRoutine, RoutineStatus};
use roboloop_types::{Mechanism, Motor, RoutineId};

use super::{Edge, apply_deadband, log_fault};

pub struct Elevator {
    speed: f32,
    deadband: f32,
    front_lift: Edge,
    rear_lift: Edge,
}

impl Elevator {
    pub fn new(speed: f32, deadband: f32) -> Self {
        Self {
            speed: speed.abs().min(1.0),
            deadband,
            front_lift: Edge::default(),
            rear_lift: Edge::default(),
        }
    }

    fn toggle(hw: &mut Hardware, mechanism: Mechanism) {
        let position = hw.gateway.mechanism_position(mechanism).toggled();
        log_fault(
            "lift",
            hw.gateway.set_mechanism_position(mechanism, position),
        );
    }
}

impl ControlRoutine for Elevator {
    fn id(&self) -> RoutineId {
        RoutineId::Elevator
    }

    fn initialize(&mut self, hw: &mut Hardware) {
        let controls = hw.operator.read();
        self.front_lift.prime(controls.toggle_front_lift);
        self.rear_lift.prime(controls.toggle_rear_lift);
    }

    fn execute(&mut self, hw: &mut Hardware, _dt: Duration) -> RoutineStatus {
        let controls = hw.operator.read();

        let power = apply_deadband(controls.elevator, self.deadband) * self.speed;
        log_fault("elevator", hw.gateway.set_motor_power(Motor::Elevator, power));

        if self.front_lift.rising(controls.toggle_front_lift) {
            Self::toggle(hw, Mechanism::FrontLift);
        }
        if self.rear_lift.rising(controls.toggle_rear_lift) {
            Self::toggle(hw, Mechanism::RearLift);
        }
        RoutineStatus::Continue
    }

    fn end(&mut self, hw: &mut Hardware) {
        log_fault("elevator", hw.gateway.set_motor_power(Motor::Elevator, 0.0));
    }
}
