//! Signalling channel to the vision co-processor.

use roboloop_types::RobotError;

/// One-way link to the vision co-processor.
pub trait VisionLink: Send {
    /// Switch the co-processor's driver-camera mode on or off.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::Vision`] when the signal cannot be delivered.
    /// Callers log the failure and do not retry.
    fn set_driver_mode(&mut self, enabled: bool) -> Result<(), RobotError>;
}
