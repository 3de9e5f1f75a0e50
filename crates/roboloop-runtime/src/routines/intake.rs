//! [`Intake`] – roller intake and hatch-panel clutch.

use std::time::Duration;

use roboloop_hal::{ActuatorGateway, Hardware, OperatorInput};
use roboloop_kernel::{ControlRoutine, RoutineStatus};
use roboloop_types::{Mechanism, Motor, RoutineId};

use super::{Edge, log_fault};

/// Runs the intake roller while the in/out buttons are held and toggles the
/// panel clutch on each clutch-button press.
pub struct Intake {
    speed: f32,
    clutch: Edge,
}

impl Intake {
    pub fn new(speed: f32) -> Self {
        Self {
            speed: speed.abs().min(1.0),
            clutch: Edge::default(),
        }
    }
}

impl ControlRoutine for Intake {
    fn id(&self) -> RoutineId {
        RoutineId::Intake
    }

    fn initialize(&mut self, hw: &mut Hardware) {
        self.clutch.prime(hw.operator.read().toggle_clutch);
    }

    fn execute(&mut self, hw: &mut Hardware, _dt: Duration) -> RoutineStatus {
        let controls = hw.operator.read();

        // Both buttons held cancel each other out.
        let power = match (controls.intake_in, controls.intake_out) {
            (true, false) => self.speed,
            (false, true) => -self.speed,
            _ => 0.0,
        };
        log_fault("intake", hw.gateway.set_motor_power(Motor::Intake, power));

        if self.clutch.rising(controls.toggle_clutch) {
            let position = hw.gateway.mechanism_position(Mechanism::PanelClutch).toggled();
            log_fault(
                "panel_clutch",
                hw.gateway.set_mechanism_position(Mechanism::PanelClutch, position),
            );
        }
        RoutineStatus::Continue
    }

    fn end(&mut self, hw: &mut Hardware) {
        log_fault("intake", hw.gateway.set_motor_power(Motor::Intake, 0.0));
    }
}
