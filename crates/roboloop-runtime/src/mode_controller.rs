//! [`ModeController`] – start/cancel authority over the mode-owned routines.
//!
//! Transition rules:
//!
//! | Event | Effect |
//! |---|---|
//! | enter Autonomous | vision driver mode on, heading forward, start all |
//! | enter Teleop | start all |
//! | enter Disabled | cancel all |
//! | Autonomous ↔ Teleop | enter the new mode; running routines keep running |
//! | re-entry of the current mode | ignored |
//!
//! Starts are issued unconditionally; [`RoutineSlot::start`] is idempotent so
//! a routine that is already running is never initialized twice.
//!
//! [`RoutineSlot::start`]: roboloop_kernel::RoutineSlot::start

use roboloop_hal::{ActuatorGateway, Hardware, TelemetryStore, VisionLink};
use roboloop_kernel::ModeRoutines;
use roboloop_types::{DriveDirection, Mode, keys};
use tracing::{info, warn};

/// Tracks the active [`Mode`] and applies the enter/exit hooks.
#[derive(Debug, Default)]
pub struct ModeController {
    mode: Mode,
}

impl ModeController {
    /// A controller in [`Mode::Disabled`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Entry hook for Autonomous and Teleop.  Entering Disabled delegates to
    /// [`on_mode_exit`][Self::on_mode_exit].
    pub fn on_mode_enter(&mut self, mode: Mode, routines: &mut ModeRoutines, hw: &mut Hardware) {
        let from = self.mode;
        match mode {
            Mode::Disabled => self.on_mode_exit(from, routines, hw),
            Mode::Autonomous => {
                Self::autonomous_side_effects(hw);
                let started = routines.start_all();
                info!(started, "autonomous routines started");
            }
            Mode::Teleop => {
                let started = routines.start_all();
                info!(started, "teleop routines started");
            }
        }
        self.mode = mode;
    }

    /// Leave an enabled mode: cancel every mode-owned routine.  Cancelling an
    /// idle routine is a no-op, so this is safe from any state.
    pub fn on_mode_exit(&mut self, from: Mode, routines: &mut ModeRoutines, hw: &mut Hardware) {
        let cancelled = routines.cancel_all(hw);
        info!(%from, cancelled, "mode-owned routines cancelled");
        self.mode = Mode::Disabled;
    }

    /// Apply the host's `prev → next` notification.
    ///
    /// Returns the effective `(from, to)` pair, or `None` when the event was
    /// a re-entry of the current mode.  `from` is always the tracked mode,
    /// which wins over a disagreeing `prev`.
    pub fn transition(
        &mut self,
        prev: Mode,
        next: Mode,
        routines: &mut ModeRoutines,
        hw: &mut Hardware,
    ) -> Option<(Mode, Mode)> {
        let from = self.mode;
        if prev != from {
            warn!(reported = %prev, tracked = %from, "host reported a stale previous mode");
        }
        if from == next {
            info!(mode = %next, "mode re-entry ignored");
            return None;
        }

        if from.is_enabled() && next.is_enabled() {
            warn!(%from, to = %next, "direct enabled-to-enabled transition; running routines kept");
        }
        self.on_mode_enter(next, routines, hw);
        info!(%from, to = %next, "mode changed");
        Some((from, next))
    }

    fn autonomous_side_effects(hw: &mut Hardware) {
        if let Err(e) = hw.vision.set_driver_mode(true) {
            warn!(error = %e, "vision driver-mode signal failed");
        }
        if let Err(e) = hw
            .telemetry
            .put_text(keys::DRIVING_DIRECTION, DriveDirection::Forward.label())
        {
            warn!(error = %e, "could not publish driving direction");
        }
        if let Err(e) = hw.gateway.set_drive_direction(DriveDirection::Forward) {
            warn!(error = %e, "could not set drive direction");
        }
    }
}
