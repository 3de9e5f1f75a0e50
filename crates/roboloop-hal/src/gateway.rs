//! Generic `ActuatorGateway` trait for the robot's pneumatic, drive and
//! compressor outputs.
//!
//! Drivers implement this trait and are handed to the control core inside a
//! [`Hardware`][crate::context::Hardware] context.  The core only ever talks
//! to the trait, so the physical drivers can be swapped without touching
//! mode or interlock logic.

use roboloop_types::{
    DriveDirection, Gear, GearSide, Mechanism, MechanismPosition, Motor, RobotError,
};

/// The set of actuator outputs the control core commands.
///
/// Every call is fire-and-forget: callers log a returned error and carry on,
/// except during boot where a failure aborts startup.
pub trait ActuatorGateway: Send {
    /// Shift the gearbox on `side` to `gear`.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::HardwareFault`] if the solenoid cannot be driven.
    fn set_gear(&mut self, side: GearSide, gear: Gear) -> Result<(), RobotError>;

    /// Return the most recently commanded gear on `side`.
    fn gear(&self, side: GearSide) -> Gear;

    /// Drive a double-acting pneumatic mechanism to `position`.
    fn set_mechanism_position(
        &mut self,
        mechanism: Mechanism,
        position: MechanismPosition,
    ) -> Result<(), RobotError>;

    /// Return the most recently commanded position of `mechanism`.
    fn mechanism_position(&self, mechanism: Mechanism) -> MechanismPosition;

    /// Enable or disable the compressor's closed-loop (pressure switch)
    /// control.
    fn set_compressor_enabled(&mut self, enabled: bool) -> Result<(), RobotError>;

    /// Set the drivetrain heading convention.
    fn set_drive_direction(&mut self, direction: DriveDirection) -> Result<(), RobotError>;

    /// Return the current drivetrain heading convention.
    fn drive_direction(&self) -> DriveDirection;

    /// Command an open-loop motor output in `[-1.0, 1.0]`.
    fn set_motor_power(&mut self, motor: Motor, power: f32) -> Result<(), RobotError>;
}
