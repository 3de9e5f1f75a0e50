//! Driver-station controls as seen by the control routines.

/// One sample of the operator's controls.
///
/// Axes are in `[-1.0, 1.0]`.  Buttons report their *held* state; routines
/// that toggle on a press do their own edge detection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OperatorCommands {
    /// Forward/backward drive axis (positive drives forward).
    pub forward: f32,
    /// Turn axis (positive turns right).
    pub turn: f32,
    pub shift_gear: bool,
    pub toggle_direction: bool,
    pub intake_in: bool,
    pub intake_out: bool,
    pub toggle_clutch: bool,
    /// Elevator axis (positive raises).
    pub elevator: f32,
    pub toggle_front_lift: bool,
    pub toggle_rear_lift: bool,
}

/// Source of [`OperatorCommands`], read by routines during their step.
pub trait OperatorInput: Send {
    fn read(&self) -> OperatorCommands;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_commands_are_neutral() {
        let cmd = OperatorCommands::default();
        assert_eq!(cmd.forward, 0.0);
        assert_eq!(cmd.turn, 0.0);
        assert_eq!(cmd.elevator, 0.0);
        assert!(!cmd.shift_gear && !cmd.intake_in && !cmd.intake_out);
    }
}
